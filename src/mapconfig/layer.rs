//! Layer and analysis node types

use serde::{Deserialize, Serialize};

/// Supported layer kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Mapnik,
    Http,
    Cartodb,
}

/// A map layer.
///
/// Rendering options (cartocss, interactivity) are carried through but not
/// interpreted here; tile rendering is an external collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub kind: LayerType,
    /// Inline SQL (legacy form); current-form layers reference an analysis
    pub sql: Option<String>,
    /// Analysis node reference (current form)
    pub source_id: Option<String>,
    pub cartocss: Option<String>,
    pub cartocss_version: Option<String>,
    pub interactivity: Vec<String>,
}

/// A source query definition widgets read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisNode {
    pub id: String,
    /// Query text handed to the query engine as the scan source
    pub sql: String,
    /// Geometry column used for bounding-box scoping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry_column: Option<String>,
}
