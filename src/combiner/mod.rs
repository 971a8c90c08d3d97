//! Predicate combinator (verb module)
//!
//! Combines cross-widget filter state and bounding-box scoping into the
//! single restriction applied to a widget's data source before its result
//! is computed.

mod combine;

pub use combine::combine;
