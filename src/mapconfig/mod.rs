//! Map configuration model (noun module)
//!
//! Typed representation of a registered map configuration: layers, analysis
//! nodes (source query definitions) and the widget map. Both the current
//! form (top-level `dataviews` referencing analyses) and the legacy form
//! (widgets inlined on a layer with inline SQL) normalize to the same
//! internal `MapConfig`.

mod config;
mod error;
mod layer;
mod widget;

pub use config::{MapConfig, SourceRef, DEFAULT_GEOMETRY_COLUMN};
pub use error::ConfigError;
pub use layer::{AnalysisNode, Layer, LayerType};
pub use widget::{Aggregation, Widget, WidgetKind};
