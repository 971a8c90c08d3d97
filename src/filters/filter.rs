//! Filter types and wire-format parsing

use std::collections::BTreeMap;

use serde_json::Value;

use super::bbox::BoundingBox;
use super::error::FilterError;

/// Filter over a widget's category column.
///
/// `accept` and `reject` may both be present; `accept` narrows the universe
/// first, so a category outside `accept` is excluded regardless of
/// `reject`. An accept list that is present but *empty* means "accept
/// nothing", which is distinct from having no filter at all.
///
/// Values stay JSON scalars so numeric category columns keep their type
/// through literal translation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CategoryFilter {
    pub accept: Option<Vec<Value>>,
    pub reject: Option<Vec<Value>>,
}

/// Filter over a widget's numeric column; open-ended when a bound is absent
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangeFilter {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Per-widget filter state
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Category(CategoryFilter),
    Range(RangeFilter),
}

/// All filter state submitted with one widget request.
///
/// Entries may name widgets the configuration does not define (filters are
/// routinely shared across sibling layers); those entries become no-ops at
/// combination time, never errors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSet {
    filters: BTreeMap<String, Filter>,
    pub bbox: Option<BoundingBox>,
}

impl FilterSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the wire form: `{"layers": [{widget_id: spec, ...}, ...]}`
    /// (legacy, merged left to right) or `{"dataviews": {widget_id: spec}}`.
    pub fn parse(raw: &Value) -> Result<FilterSet, FilterError> {
        let Some(object) = raw.as_object() else {
            return Err(FilterError::Invalid("expected an object".to_string()));
        };

        let mut filters = BTreeMap::new();

        if let Some(layers) = object.get("layers") {
            let Some(layers) = layers.as_array() else {
                return Err(FilterError::Invalid("'layers' must be an array".to_string()));
            };
            for layer in layers {
                let Some(entries) = layer.as_object() else {
                    return Err(FilterError::Invalid(
                        "'layers' entries must be objects".to_string(),
                    ));
                };
                for (widget_id, spec) in entries {
                    filters.insert(widget_id.clone(), parse_filter(widget_id, spec)?);
                }
            }
        }

        if let Some(dataviews) = object.get("dataviews") {
            let Some(entries) = dataviews.as_object() else {
                return Err(FilterError::Invalid(
                    "'dataviews' must be an object".to_string(),
                ));
            };
            for (widget_id, spec) in entries {
                filters.insert(widget_id.clone(), parse_filter(widget_id, spec)?);
            }
        }

        Ok(FilterSet {
            filters,
            bbox: None,
        })
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Add or replace the filter for a widget (test and builder use)
    pub fn insert(&mut self, widget_id: impl Into<String>, filter: Filter) {
        self.filters.insert(widget_id.into(), filter);
    }

    /// Remove the filter for a widget, returning it if present
    pub fn remove(&mut self, widget_id: &str) -> Option<Filter> {
        self.filters.remove(widget_id)
    }

    pub fn get(&self, widget_id: &str) -> Option<&Filter> {
        self.filters.get(widget_id)
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.bbox.is_none()
    }

    /// Filter entries in widget-id order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Filter)> {
        self.filters.iter().map(|(id, f)| (id.as_str(), f))
    }
}

fn parse_filter(widget_id: &str, spec: &Value) -> Result<Filter, FilterError> {
    let Some(object) = spec.as_object() else {
        return Err(FilterError::InvalidEntry {
            widget: widget_id.to_string(),
        });
    };

    let has_category = object.contains_key("accept") || object.contains_key("reject");
    let has_range = object.contains_key("min") || object.contains_key("max");

    match (has_category, has_range) {
        (true, true) => Err(FilterError::Mixed {
            widget: widget_id.to_string(),
        }),
        (true, false) => {
            let accept = parse_category_list(widget_id, "accept", object.get("accept"))?;
            let reject = parse_category_list(widget_id, "reject", object.get("reject"))?;
            Ok(Filter::Category(CategoryFilter { accept, reject }))
        }
        (false, true) => {
            let min = parse_bound(widget_id, "min", object.get("min"))?;
            let max = parse_bound(widget_id, "max", object.get("max"))?;
            if let (Some(min), Some(max)) = (min, max) {
                if min > max {
                    return Err(FilterError::InvertedRange {
                        widget: widget_id.to_string(),
                        min,
                        max,
                    });
                }
            }
            Ok(Filter::Range(RangeFilter { min, max }))
        }
        (false, false) => Err(FilterError::Empty {
            widget: widget_id.to_string(),
        }),
    }
}

fn parse_category_list(
    widget_id: &str,
    field: &str,
    value: Option<&Value>,
) -> Result<Option<Vec<Value>>, FilterError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let Some(items) = value.as_array() else {
        return Err(FilterError::InvalidCategoryList {
            widget: widget_id.to_string(),
            field: field.to_string(),
        });
    };
    for item in items {
        if !(item.is_string() || item.is_number() || item.is_boolean()) {
            return Err(FilterError::InvalidCategoryList {
                widget: widget_id.to_string(),
                field: field.to_string(),
            });
        }
    }
    Ok(Some(items.clone()))
}

fn parse_bound(
    widget_id: &str,
    field: &str,
    value: Option<&Value>,
) -> Result<Option<f64>, FilterError> {
    let Some(value) = value else {
        return Ok(None);
    };
    value
        .as_f64()
        .map(Some)
        .ok_or_else(|| FilterError::InvalidBound {
            widget: widget_id.to_string(),
            field: field.to_string(),
        })
}
