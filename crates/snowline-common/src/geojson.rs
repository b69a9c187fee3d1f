//! GeoJSON types for published snow boundaries.
//!
//! Each detected snow cluster becomes one `Feature` with a `Polygon`
//! geometry. The first ring of a polygon is the exterior boundary, the
//! remaining rings are holes.
//!
//! See: <https://datatracker.ietf.org/doc/html/rfc7946>

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of decimals kept for published coordinates.
pub const COORDINATE_PRECISION: i32 = 6;

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureCollection {
    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    /// Array of features.
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Create a new empty FeatureCollection.
    pub fn new() -> Self {
        Self {
            type_: "FeatureCollection".to_string(),
            features: Vec::new(),
        }
    }

    /// Build a collection with one polygon feature per ring group.
    ///
    /// Coordinates are rounded to [`COORDINATE_PRECISION`] decimals for
    /// stable output.
    pub fn from_polygons(polygons: &[Vec<Vec<[f64; 2]>>]) -> Self {
        let features = polygons
            .iter()
            .map(|rings| {
                let rounded = rings
                    .iter()
                    .map(|ring| ring.iter().map(|p| round_coordinate(*p)).collect())
                    .collect();
                Feature::polygon(rounded)
            })
            .collect();

        Self {
            type_: "FeatureCollection".to_string(),
            features,
        }
    }

    /// Extract the polygon rings of every feature, in feature order.
    ///
    /// Non-polygon geometries are skipped.
    pub fn to_polygons(&self) -> Vec<Vec<Vec<[f64; 2]>>> {
        self.features
            .iter()
            .filter_map(|feature| match &feature.geometry {
                Geometry::Polygon { coordinates } => Some(coordinates.clone()),
                _ => None,
            })
            .collect()
    }

    /// Add a feature to the collection.
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new()
    }
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,

    /// Free-form properties (empty for boundaries).
    #[serde(default)]
    pub properties: Map<String, Value>,

    /// The geometry of this feature.
    pub geometry: Geometry,
}

impl Feature {
    /// Create a new feature with a polygon geometry.
    pub fn polygon(coordinates: Vec<Vec<[f64; 2]>>) -> Self {
        Self {
            type_: "Feature".to_string(),
            properties: Map::new(),
            geometry: Geometry::Polygon { coordinates },
        }
    }

    /// Set a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// GeoJSON geometry types produced or consumed here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A point geometry.
    Point {
        /// Coordinates as [longitude, latitude].
        coordinates: [f64; 2],
    },

    /// A polygon geometry.
    Polygon {
        /// Array of linear rings (first is exterior, rest are holes).
        coordinates: Vec<Vec<[f64; 2]>>,
    },
}

fn round_coordinate(p: [f64; 2]) -> [f64; 2] {
    let factor = 10f64.powi(COORDINATE_PRECISION);
    [
        (p[0] * factor).round() / factor,
        (p[1] * factor).round() / factor,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_serialization() {
        let fc = FeatureCollection::from_polygons(&[vec![vec![
            [5.123456789, 45.0],
            [5.2, 45.1],
            [5.3, 45.0],
            [5.123456789, 45.0],
        ]]]);

        let json = serde_json::to_value(&fc).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"][0]["type"], "Feature");
        assert_eq!(json["features"][0]["geometry"]["type"], "Polygon");
        assert_eq!(
            json["features"][0]["geometry"]["coordinates"][0][0][0],
            5.123457
        );
        assert!(json["features"][0]["properties"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_polygons_roundtrip_through_json() {
        let polygons = vec![
            vec![vec![[1.0, 2.0], [3.0, 2.0], [3.0, 4.0], [1.0, 2.0]]],
            vec![
                vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 0.0]],
                vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 1.0]],
            ],
        ];
        let fc = FeatureCollection::from_polygons(&polygons);
        let text = serde_json::to_string(&fc).unwrap();
        let parsed: FeatureCollection = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.to_polygons(), polygons);
    }
}
