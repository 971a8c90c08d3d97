//! tilestats - Widget filter composition and aggregation for map backends
//!
//! This library provides:
//! - Map configuration types (MapConfig, Layer, AnalysisNode, Widget)
//! - Configuration parsing and validation from JSON
//! - Cross-widget filter combination with own-filter exclusion
//! - Per-widget query planning and SQL emission
//! - Result shaping (category / histogram / formula / list)
//! - Deterministic configuration tokens with single-flight compilation
//!
//! # Architecture
//!
//! **Noun modules** (data structures):
//! - `mapconfig/` - configuration concepts (MapConfig, Layer, AnalysisNode, Widget)
//! - `filters/` - client filter state (FilterSet, Filter, BoundingBox)
//! - `plan/` - logical plan types (PlanNode, Expr, Column)
//!
//! **Verb modules** (transformations):
//! - `combiner/` - MapConfig + FilterSet + target widget → restriction Expr
//! - `planner/` - widget options + restriction → PlanNode
//! - `emitter/` - PlanNode → SQL
//! - `dataview/` - SQL → query engine → shaped WidgetResult
//!
//! **Infrastructure**:
//! - `engine/` - the external query-engine contract
//! - `registry/` - token derivation, compiled-configuration cache, single-flight
//! - `service` - the facade the routing layer consumes
//!
//! # Example
//!
//! ```ignore
//! use tilestats::{WidgetService, FilterSet, MemoryStore};
//!
//! let service = WidgetService::new(engine, MemoryStore::new());
//! let token = service.register_configuration("localhost", &map_config).await?;
//! let filters = FilterSet::parse(&raw_filters)?;
//! let result = service.widget_result(token.as_str(), "country_places_count", &filters, true).await?;
//! ```

pub mod combiner;
pub mod dataview;
pub mod emitter;
pub mod engine;
pub mod filters;
pub mod mapconfig;
pub mod plan;
pub mod planner;
pub mod registry;
pub mod service;

// Re-export commonly used types
pub use combiner::combine;
pub use dataview::{
    CategoriesResult, CategoryEntry, ComputeError, ComputeOptions, FormulaResult, HistogramBin,
    HistogramResult, ListResult, WidgetResult,
};
pub use emitter::{emit_sql, EmitError};
pub use engine::{EngineError, QueryEngine, Row};
pub use filters::{BoundingBox, CategoryFilter, Filter, FilterError, FilterSet, RangeFilter};
pub use mapconfig::{Aggregation, AnalysisNode, ConfigError, Layer, MapConfig, Widget, WidgetKind};
pub use planner::PlanError;
pub use registry::{
    CompiledConfig, ConfigRegistry, ConfigStore, MemoryStore, RegistryError, StoreError, Token,
};
pub use service::{ServiceError, WidgetService};
