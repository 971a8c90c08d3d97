//! Root configuration parsing and normalization

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::error::ConfigError;
use super::layer::{AnalysisNode, Layer, LayerType};
use super::widget::{Aggregation, Widget, WidgetKind};

/// Geometry column assumed when an analysis node does not name one
pub const DEFAULT_GEOMETRY_COLUMN: &str = "the_geom";

/// A parsed, validated map configuration.
///
/// Layers, analyses and widgets are immutable once constructed; concurrent
/// requests read them without locking. Widgets live in a `BTreeMap` so
/// every traversal sees them in id order, which keeps downstream query
/// generation deterministic for identical input.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub version: Option<String>,
    pub layers: Vec<Layer>,
    pub analyses: Vec<AnalysisNode>,
    widgets: BTreeMap<String, Widget>,
}

/// A widget's resolved data source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRef<'a> {
    pub sql: &'a str,
    pub geometry_column: &'a str,
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawConfig {
    version: Option<String>,
    #[serde(default)]
    layers: Vec<RawLayer>,
    #[serde(default)]
    analyses: Vec<AnalysisNode>,
    #[serde(default)]
    dataviews: BTreeMap<String, RawWidget>,
}

#[derive(Deserialize)]
struct RawLayer {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    options: RawLayerOptions,
}

#[derive(Deserialize, Default)]
struct RawLayerOptions {
    sql: Option<String>,
    cartocss: Option<String>,
    cartocss_version: Option<String>,
    #[serde(default)]
    interactivity: Vec<String>,
    source: Option<RawSource>,
    /// Legacy inline widgets, implicitly sourced from the layer's SQL
    #[serde(default)]
    widgets: BTreeMap<String, RawWidget>,
}

#[derive(Deserialize)]
struct RawWidget {
    #[serde(rename = "type")]
    kind: String,
    source: Option<RawSource>,
    #[serde(default)]
    options: RawWidgetOptions,
}

#[derive(Deserialize)]
struct RawSource {
    id: String,
}

#[derive(Deserialize, Default)]
struct RawWidgetOptions {
    column: Option<String>,
    aggregation: Option<String>,
    #[serde(rename = "aggregationColumn")]
    aggregation_column: Option<String>,
    operation: Option<String>,
    bins: Option<usize>,
    columns: Option<Vec<String>>,
    #[serde(rename = "orderBy")]
    order_by: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl MapConfig {
    /// Parse and validate a raw configuration document.
    ///
    /// Pure and deterministic for identical input; the registry relies on
    /// this when deriving tokens from content digests.
    pub fn parse(raw: &Value) -> Result<MapConfig, ConfigError> {
        let raw: RawConfig =
            serde_json::from_value(raw.clone()).map_err(|e| ConfigError::Json(e.to_string()))?;

        let mut analyses = raw.analyses;
        let mut layers = Vec::with_capacity(raw.layers.len());
        let mut widgets: BTreeMap<String, Widget> = BTreeMap::new();

        for (index, layer) in raw.layers.into_iter().enumerate() {
            let kind = parse_layer_type(index, &layer.kind)?;
            let options = layer.options;

            // Legacy form: inline widgets read from the layer's own SQL via
            // a synthesized analysis node.
            if !options.widgets.is_empty() {
                let Some(sql) = options.sql.clone() else {
                    let widget = options.widgets.keys().next().cloned().unwrap_or_default();
                    return Err(ConfigError::MissingSource { widget });
                };
                let source_id = format!("layer{}", index);
                analyses.push(AnalysisNode {
                    id: source_id.clone(),
                    sql,
                    geometry_column: None,
                });
                for (id, widget) in &options.widgets {
                    insert_widget(&mut widgets, id, widget, Some(&source_id))?;
                }
            }

            layers.push(Layer {
                kind,
                sql: options.sql,
                source_id: options.source.map(|s| s.id),
                cartocss: options.cartocss,
                cartocss_version: options.cartocss_version,
                interactivity: options.interactivity,
            });
        }

        for (id, widget) in &raw.dataviews {
            insert_widget(&mut widgets, id, widget, None)?;
        }

        let config = MapConfig {
            version: raw.version,
            layers,
            analyses,
            widgets,
        };
        config.check_sources()?;
        Ok(config)
    }

    fn check_sources(&self) -> Result<(), ConfigError> {
        for widget in self.widgets.values() {
            if !self.analyses.iter().any(|a| a.id == widget.source_id) {
                return Err(ConfigError::UnknownSource {
                    widget: widget.id.clone(),
                    source: widget.source_id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Get a widget by id
    pub fn widget(&self, id: &str) -> Option<&Widget> {
        self.widgets.get(id)
    }

    /// All widgets, in id order
    pub fn widgets(&self) -> impl Iterator<Item = &Widget> {
        self.widgets.values()
    }

    /// Resolve a widget's data source to its query text and geometry column
    pub fn resolve_source(&self, widget_id: &str) -> Result<SourceRef<'_>, ConfigError> {
        let widget = self
            .widgets
            .get(widget_id)
            .ok_or_else(|| ConfigError::MissingSource {
                widget: widget_id.to_string(),
            })?;
        let analysis = self
            .analyses
            .iter()
            .find(|a| a.id == widget.source_id)
            .ok_or_else(|| ConfigError::UnknownSource {
                widget: widget.id.clone(),
                source: widget.source_id.clone(),
            })?;
        Ok(SourceRef {
            sql: &analysis.sql,
            geometry_column: analysis
                .geometry_column
                .as_deref()
                .unwrap_or(DEFAULT_GEOMETRY_COLUMN),
        })
    }
}

fn parse_layer_type(index: usize, kind: &str) -> Result<LayerType, ConfigError> {
    match kind {
        "mapnik" => Ok(LayerType::Mapnik),
        "http" => Ok(LayerType::Http),
        "cartodb" => Ok(LayerType::Cartodb),
        other => Err(ConfigError::UnknownLayerType {
            layer: index,
            kind: other.to_string(),
        }),
    }
}

fn insert_widget(
    widgets: &mut BTreeMap<String, Widget>,
    id: &str,
    raw: &RawWidget,
    layer_source: Option<&str>,
) -> Result<(), ConfigError> {
    if widgets.contains_key(id) {
        return Err(ConfigError::DuplicateWidget {
            widget: id.to_string(),
        });
    }

    let source_id = match (&raw.source, layer_source) {
        (Some(source), _) => source.id.clone(),
        (None, Some(layer_source)) => layer_source.to_string(),
        (None, None) => {
            return Err(ConfigError::MissingSource {
                widget: id.to_string(),
            })
        }
    };

    let kind = parse_widget_kind(id, raw)?;
    widgets.insert(
        id.to_string(),
        Widget {
            id: id.to_string(),
            kind,
            source_id,
        },
    );
    Ok(())
}

fn parse_widget_kind(id: &str, raw: &RawWidget) -> Result<WidgetKind, ConfigError> {
    let options = &raw.options;
    match raw.kind.as_str() {
        "aggregation" | "category" => {
            let column = require(id, "column", &options.column)?;
            let aggregation = parse_aggregation(id, require(id, "aggregation", &options.aggregation)?)?;
            if aggregation != Aggregation::Count && options.aggregation_column.is_none() {
                return Err(ConfigError::MissingOption {
                    widget: id.to_string(),
                    option: "aggregationColumn".to_string(),
                });
            }
            Ok(WidgetKind::Aggregation {
                column: column.to_string(),
                aggregation,
                aggregation_column: options.aggregation_column.clone(),
            })
        }
        "histogram" | "range" => {
            let column = require(id, "column", &options.column)?;
            if options.bins == Some(0) {
                return Err(ConfigError::InvalidOption {
                    widget: id.to_string(),
                    option: "bins".to_string(),
                    reason: "must be positive".to_string(),
                });
            }
            Ok(WidgetKind::Histogram {
                column: column.to_string(),
                bins: options.bins,
            })
        }
        "formula" => {
            let operation = parse_aggregation(id, require(id, "operation", &options.operation)?)?;
            let column = require(id, "column", &options.column)?;
            Ok(WidgetKind::Formula {
                operation,
                column: column.to_string(),
            })
        }
        "list" => {
            let columns = options.columns.clone().unwrap_or_default();
            if columns.is_empty() {
                return Err(ConfigError::MissingOption {
                    widget: id.to_string(),
                    option: "columns".to_string(),
                });
            }
            Ok(WidgetKind::List {
                columns,
                order_by: options.order_by.clone(),
            })
        }
        other => Err(ConfigError::UnknownWidgetType {
            widget: id.to_string(),
            kind: other.to_string(),
        }),
    }
}

fn require<'a>(id: &str, option: &str, value: &'a Option<String>) -> Result<&'a str, ConfigError> {
    value.as_deref().ok_or_else(|| ConfigError::MissingOption {
        widget: id.to_string(),
        option: option.to_string(),
    })
}

fn parse_aggregation(id: &str, value: &str) -> Result<Aggregation, ConfigError> {
    Aggregation::parse(value).ok_or_else(|| ConfigError::UnknownAggregation {
        widget: id.to_string(),
        value: value.to_string(),
    })
}
