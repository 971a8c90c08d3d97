//! Exposed service facade
//!
//! The surface consumed by the routing/API layer: register a map
//! configuration, then request widget results against its token. Requests
//! share only the registry and the query engine; everything else is
//! per-request and immutable, so concurrent widget requests never affect
//! each other and a failure stays confined to its own request.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::combiner::combine;
use crate::dataview::{self, ComputeError, ComputeOptions, WidgetResult};
use crate::engine::QueryEngine;
use crate::filters::{BoundingBox, FilterError, FilterSet};
use crate::mapconfig::ConfigError;
use crate::registry::{ConfigRegistry, ConfigStore, RegistryError, Token};

/// Widget analytics service over a query engine and a configuration store
pub struct WidgetService<E, S> {
    engine: Arc<E>,
    registry: ConfigRegistry<S>,
    options: ComputeOptions,
}

impl<E, S> WidgetService<E, S>
where
    E: QueryEngine,
    S: ConfigStore + 'static,
{
    pub fn new(engine: E, store: S) -> Self {
        Self::with_options(engine, store, ComputeOptions::default())
    }

    pub fn with_options(engine: E, store: S, options: ComputeOptions) -> Self {
        Self {
            engine: Arc::new(engine),
            registry: ConfigRegistry::new(store),
            options,
        }
    }

    pub fn registry(&self) -> &ConfigRegistry<S> {
        &self.registry
    }

    /// Register a configuration under a caller scope, returning its token
    pub async fn register_configuration(
        &self,
        scope: &str,
        raw: &Value,
    ) -> Result<Token, ServiceError> {
        Ok(self.registry.register(scope, raw).await?)
    }

    /// Compute one widget's result.
    ///
    /// With `include_own_filter` false the target widget's own filter is
    /// left out of the restriction while every sibling filter and the
    /// bounding box still apply.
    pub async fn widget_result(
        &self,
        token: &str,
        widget_id: &str,
        filters: &FilterSet,
        include_own_filter: bool,
    ) -> Result<WidgetResult, ServiceError> {
        let compiled = self.registry.resolve(token).await?;
        let config = &compiled.config;

        let widget = config
            .widget(widget_id)
            .ok_or_else(|| ServiceError::WidgetNotFound(widget_id.to_string()))?;
        let source = config.resolve_source(widget_id)?;
        let predicate = combine(config, filters, widget_id, include_own_filter);

        dataview::compute(self.engine.as_ref(), widget, &source, predicate, &self.options)
            .await
            .map_err(|e| compute_error(widget_id, e))
    }

    /// Like [`widget_result`](Self::widget_result), but parsing the raw
    /// filter document and bounding-box string the API layer receives.
    pub async fn widget_result_raw(
        &self,
        token: &str,
        widget_id: &str,
        raw_filters: Option<&Value>,
        bbox: Option<&str>,
        include_own_filter: bool,
    ) -> Result<WidgetResult, ServiceError> {
        let mut filters = match raw_filters {
            Some(raw) => FilterSet::parse(raw)?,
            None => FilterSet::empty(),
        };
        if let Some(bbox) = bbox {
            filters.bbox = Some(bbox.parse::<BoundingBox>()?);
        }
        self.widget_result(token, widget_id, &filters, include_own_filter)
            .await
    }
}

/// Service-level error taxonomy.
///
/// Callers can distinguish configuration faults (fix the input), filter
/// validation faults, missing tokens or widgets (re-register or correct
/// the name), computation failures (the whole request may be retried) and
/// an unreachable configuration store.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    Configuration(ConfigError),
    Validation(FilterError),
    TokenNotFound(String),
    WidgetNotFound(String),
    Computation(ComputeError),
    CacheUnavailable(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Configuration(e) => write!(f, "{}", e),
            ServiceError::Validation(e) => write!(f, "{}", e),
            ServiceError::TokenNotFound(token) => {
                write!(f, "No configuration for token '{}'", token)
            }
            ServiceError::WidgetNotFound(widget) => {
                write!(f, "Widget '{}' does not exist", widget)
            }
            ServiceError::Computation(e) => write!(f, "{}", e),
            ServiceError::CacheUnavailable(detail) => {
                write!(f, "Configuration store unavailable: {}", detail)
            }
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Configuration(e) => Some(e),
            ServiceError::Validation(e) => Some(e),
            ServiceError::Computation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RegistryError> for ServiceError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Config(e) => ServiceError::Configuration(e),
            RegistryError::NotFound(token) => ServiceError::TokenNotFound(token),
            RegistryError::StoreUnavailable(detail) => ServiceError::CacheUnavailable(detail),
        }
    }
}

impl From<FilterError> for ServiceError {
    fn from(err: FilterError) -> Self {
        ServiceError::Validation(err)
    }
}

impl From<ConfigError> for ServiceError {
    fn from(err: ConfigError) -> Self {
        ServiceError::Configuration(err)
    }
}

/// Plan-level faults are configuration faults that escaped parse-time
/// validation; everything else is a computation failure.
fn compute_error(widget_id: &str, err: ComputeError) -> ServiceError {
    match err {
        ComputeError::Plan(crate::planner::PlanError::MissingAggregationColumn(_)) => {
            ServiceError::Configuration(ConfigError::MissingOption {
                widget: widget_id.to_string(),
                option: "aggregationColumn".to_string(),
            })
        }
        ComputeError::Plan(crate::planner::PlanError::EmptyProjection) => {
            ServiceError::Configuration(ConfigError::MissingOption {
                widget: widget_id.to_string(),
                option: "columns".to_string(),
            })
        }
        other => ServiceError::Computation(other),
    }
}
