//! Area-of-interest loading.
//!
//! Accepts the GeoJSON layouts drawing tools commonly emit: a feature
//! collection (the first feature's geometry wins), a single feature, or a
//! bare geometry object. The geometry is rendered to WKT for the provider
//! query.

use crate::types::{InsarError, InsarResult};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Supported GeoJSON geometries. Positions may carry an altitude; only
/// the first two ordinates are used.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    Point { coordinates: Vec<f64> },
}

/// A loaded area of interest.
#[derive(Debug, Clone)]
pub struct Aoi {
    pub geometry: Geometry,
}

impl Aoi {
    /// Load an AOI from a GeoJSON file.
    pub fn from_geojson_file(path: &Path) -> InsarResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            InsarError::Configuration(format!("cannot read AOI file {}: {}", path.display(), e))
        })?;
        Self::from_geojson_str(&text)
    }

    /// Parse an AOI from GeoJSON text.
    pub fn from_geojson_str(text: &str) -> InsarResult<Self> {
        let doc: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| InsarError::Configuration(format!("AOI file is not valid JSON: {}", e)))?;

        let doc_type = doc
            .get("type")
            .and_then(|t| t.as_str())
            .map(str::to_owned);
        let geometry_value = match doc_type.as_deref() {
            Some("FeatureCollection") => doc
                .get("features")
                .and_then(|f| f.get(0))
                .and_then(|f| f.get("geometry"))
                .cloned()
                .ok_or_else(|| {
                    InsarError::Configuration("feature collection contains no features".to_string())
                })?,
            Some("Feature") => doc.get("geometry").cloned().ok_or_else(|| {
                InsarError::Configuration("feature carries no geometry".to_string())
            })?,
            Some(_) => doc,
            None => {
                return Err(InsarError::Configuration(
                    "AOI document has no GeoJSON 'type' field".to_string(),
                ))
            }
        };

        let geometry: Geometry = serde_json::from_value(geometry_value).map_err(|e| {
            InsarError::Configuration(format!("unsupported AOI geometry: {}", e))
        })?;
        Ok(Aoi { geometry })
    }

    /// Render the geometry as well-known text.
    pub fn to_wkt(&self) -> InsarResult<String> {
        match &self.geometry {
            Geometry::Point { coordinates } => Ok(format!("POINT ({})", position(coordinates)?)),
            Geometry::Polygon { coordinates } => {
                Ok(format!("POLYGON ({})", rings(coordinates)?))
            }
            Geometry::MultiPolygon { coordinates } => {
                let polygons = coordinates
                    .iter()
                    .map(|polygon| Ok(format!("({})", rings(polygon)?)))
                    .collect::<InsarResult<Vec<_>>>()?;
                Ok(format!("MULTIPOLYGON ({})", polygons.join(", ")))
            }
        }
    }
}

fn rings(rings: &[Vec<Vec<f64>>]) -> InsarResult<String> {
    if rings.is_empty() {
        return Err(InsarError::Configuration(
            "polygon has no coordinate rings".to_string(),
        ));
    }
    let parts = rings
        .iter()
        .map(|ring| {
            let positions = ring
                .iter()
                .map(|p| position(p))
                .collect::<InsarResult<Vec<_>>>()?;
            Ok(format!("({})", positions.join(", ")))
        })
        .collect::<InsarResult<Vec<_>>>()?;
    Ok(parts.join(", "))
}

fn position(p: &[f64]) -> InsarResult<String> {
    if p.len() < 2 {
        return Err(InsarError::Configuration(format!(
            "coordinate position has {} ordinate(s), need lon/lat",
            p.len()
        )));
    }
    Ok(format!("{} {}", p[0], p[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[10.0, 45.0], [10.5, 45.0], [10.5, 45.5], [10.0, 45.5], [10.0, 45.0]]]
                }
            }
        ]
    }"#;

    #[test]
    fn test_feature_collection_takes_first_feature() {
        let aoi = Aoi::from_geojson_str(COLLECTION).expect("parse collection");
        assert_eq!(
            aoi.to_wkt().expect("wkt"),
            "POLYGON ((10 45, 10.5 45, 10.5 45.5, 10 45.5, 10 45))"
        );
    }

    #[test]
    fn test_bare_polygon() {
        let aoi = Aoi::from_geojson_str(
            r#"{"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]}"#,
        )
        .expect("parse polygon");
        assert_eq!(
            aoi.to_wkt().expect("wkt"),
            "POLYGON ((0 0, 1 0, 1 1, 0 0))"
        );
    }

    #[test]
    fn test_single_feature_and_point() {
        let aoi = Aoi::from_geojson_str(
            r#"{"type": "Feature", "properties": null, "geometry": {"type": "Point", "coordinates": [11.25, 46.5]}}"#,
        )
        .expect("parse feature");
        assert_eq!(aoi.to_wkt().expect("wkt"), "POINT (11.25 46.5)");
    }

    #[test]
    fn test_multipolygon_and_altitude_positions() {
        let aoi = Aoi::from_geojson_str(
            r#"{"type": "MultiPolygon", "coordinates": [
                [[[0.0, 0.0, 120.0], [1.0, 0.0, 121.0], [0.0, 1.0, 119.0], [0.0, 0.0, 120.0]]],
                [[[5.0, 5.0], [6.0, 5.0], [5.0, 6.0], [5.0, 5.0]]]
            ]}"#,
        )
        .expect("parse multipolygon");
        assert_eq!(
            aoi.to_wkt().expect("wkt"),
            "MULTIPOLYGON (((0 0, 1 0, 0 1, 0 0)), ((5 5, 6 5, 5 6, 5 5)))"
        );
    }

    #[test]
    fn test_unsupported_geometry_type() {
        let err = Aoi::from_geojson_str(
            r#"{"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, InsarError::Configuration(_)));
    }

    #[test]
    fn test_empty_feature_collection() {
        let err = Aoi::from_geojson_str(r#"{"type": "FeatureCollection", "features": []}"#)
            .unwrap_err();
        assert!(matches!(err, InsarError::Configuration(_)));
    }

    #[test]
    fn test_malformed_json_and_short_position() {
        assert!(Aoi::from_geojson_str("{not json").is_err());

        let aoi = Aoi::from_geojson_str(
            r#"{"type": "Polygon", "coordinates": [[[1.0], [2.0, 2.0]]]}"#,
        )
        .expect("parses structurally");
        assert!(aoi.to_wkt().is_err());
    }
}
