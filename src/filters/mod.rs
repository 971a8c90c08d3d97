//! Filter set model (noun module)
//!
//! Client-submitted filter state: at most one filter per widget id
//! (category accept/reject sets or a numeric range) plus an optional
//! bounding box. A filter set lives for a single widget request.

mod bbox;
mod error;
mod filter;

pub use bbox::BoundingBox;
pub use error::FilterError;
pub use filter::{CategoryFilter, Filter, FilterSet, RangeFilter};
