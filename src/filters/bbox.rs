//! Bounding box scoping

use std::fmt;
use std::str::FromStr;

use super::error::FilterError;

/// A longitude/latitude bounding box in the dataset's reference system.
///
/// The wire form is the `west,south,east,north` query string used by tile
/// clients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// SQL predicate testing intersection with the given geometry column
    pub fn intersects_sql(&self, geometry_column: &str) -> String {
        format!(
            "{} && ST_MakeEnvelope({}, {}, {}, {}, 4326)",
            geometry_column, self.west, self.south, self.east, self.north
        )
    }
}

impl FromStr for BoundingBox {
    type Err = FilterError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.split(',').collect();
        if parts.len() != 4 {
            return Err(FilterError::InvalidBoundingBox(raw.to_string()));
        }
        let mut coords = [0.0f64; 4];
        for (slot, part) in coords.iter_mut().zip(&parts) {
            *slot = part
                .trim()
                .parse()
                .map_err(|_| FilterError::InvalidBoundingBox(raw.to_string()))?;
        }
        Ok(BoundingBox::new(coords[0], coords[1], coords[2], coords[3]))
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}
