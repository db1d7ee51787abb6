use crate::types::{BoundaryFeature, ComplaintRecord};
use anyhow::{Context, Result, anyhow};
use geo::algorithm::bounding_rect::BoundingRect;
use geo::{MultiPolygon, Point};
use geojson::GeoJson;
use rayon::prelude::*;
use reqwest::Client;
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
struct RawComplaint {
    complaint_type: Option<String>,
    descriptor: Option<String>,
    borough: Option<String>,
    location: Option<serde_json::Value>,
}

/// Turns raw dataset rows into typed records.
///
/// Rows that are not objects are dropped. A missing or malformed `location`
/// is kept as a record without a point.
pub fn normalize_complaints(rows: Vec<serde_json::Value>) -> Vec<ComplaintRecord> {
    rows.into_par_iter()
        .filter_map(|row| match serde_json::from_value::<RawComplaint>(row) {
            Ok(raw) => Some(ComplaintRecord {
                complaint_type: raw.complaint_type.unwrap_or_default(),
                descriptor: raw.descriptor.unwrap_or_default(),
                borough: raw.borough,
                point: raw.location.as_ref().and_then(location_point),
            }),
            Err(e) => {
                tracing::debug!("skipping malformed complaint row: {}", e);
                None
            }
        })
        .collect()
}

// `location.coordinates` is ordered [longitude, latitude].
fn location_point(location: &serde_json::Value) -> Option<Point<f64>> {
    let coords = location.get("coordinates")?.as_array()?;
    match coords.as_slice() {
        [lon, lat] => {
            let (lon, lat) = (lon.as_f64()?, lat.as_f64()?);
            (lon.is_finite() && lat.is_finite()).then(|| Point::new(lon, lat))
        }
        _ => None,
    }
}

/// Loads the neighborhood boundary collection from a URL or a local file.
pub async fn load_boundaries(client: &Client, source: &str) -> Result<Vec<BoundaryFeature>> {
    let text = if source.starts_with("http://") || source.starts_with("https://") {
        tracing::info!(url = source, "requesting boundaries");
        client
            .get(source)
            .send()
            .await
            .with_context(|| format!("Failed to reach boundary file: {}", source))?
            .error_for_status()
            .with_context(|| format!("Boundary file request failed: {}", source))?
            .text()
            .await
            .with_context(|| format!("Failed to read boundary file body: {}", source))?
    } else {
        tracing::info!(path = source, "reading boundaries");
        fs::read_to_string(source)
            .with_context(|| format!("Failed to open GeoJSON file: {}", source))?
    };

    let geojson: GeoJson = text.parse().context("Failed to parse GeoJSON")?;
    let boundaries = parse_boundaries(geojson)?;
    tracing::info!(features = boundaries.len(), "boundaries loaded");
    Ok(boundaries)
}

pub fn parse_boundaries(geojson: GeoJson) -> Result<Vec<BoundaryFeature>> {
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("Boundary GeoJSON must be a FeatureCollection")),
    };

    let mut boundaries = Vec::new();

    for feature in collection.features {
        let text_prop = |key: &str| {
            feature.properties.as_ref()
                .and_then(|props| props.get(key))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        };
        let neighborhood = text_prop("neighborhood").unwrap_or_default();
        let borough = text_prop("borough");

        let Some(geometry) = feature.geometry.and_then(|geom| polygon_geometry(geom.value)) else {
            tracing::debug!(neighborhood = %neighborhood, "skipping boundary feature without usable polygon");
            continue;
        };

        boundaries.push(BoundaryFeature { neighborhood, borough, geometry });
    }

    Ok(boundaries)
}

// Polygon or MultiPolygon with at least one coordinate, otherwise `None`.
fn polygon_geometry(value: geojson::Value) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = match value.try_into() {
        Ok(g) => g,
        Err(e) => {
            tracing::warn!("failed to convert boundary geometry: {:?}", e);
            return None;
        }
    };

    let mp = match geo_geom {
        geo::Geometry::MultiPolygon(mp) => mp,
        geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
        _ => return None, // Skip points/lines
    };
    mp.bounding_rect().is_some().then_some(mp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_points_and_missing_locations() {
        let rows = vec![
            json!({
                "complaint_type": "Noise - Residential",
                "descriptor": "Loud Music/Party",
                "borough": "BROOKLYN",
                "location": { "type": "Point", "coordinates": [-73.95, 40.65] }
            }),
            json!({ "complaint_type": "Noise - Residential", "descriptor": "Banging" }),
            json!({ "descriptor": "Bad coords", "location": { "coordinates": ["x", 40.0] } }),
            json!({ "descriptor": "Short coords", "location": { "coordinates": [-73.9] } }),
            json!("not an object"),
        ];

        let records = normalize_complaints(rows);
        assert_eq!(records.len(), 4);

        assert_eq!(records[0].point, Some(Point::new(-73.95, 40.65)));
        assert_eq!(records[0].borough.as_deref(), Some("BROOKLYN"));
        assert_eq!(records[1].point, None);
        assert_eq!(records[1].borough, None);
        assert_eq!(records[2].point, None);
        assert_eq!(records[3].point, None);
    }

    #[test]
    fn parses_polygon_features() {
        let geojson: GeoJson = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "neighborhood": "Astoria", "borough": "Queens" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[-73.93, 40.76], [-73.91, 40.76], [-73.91, 40.78], [-73.93, 40.76]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "neighborhood": "Somewhere" },
                    "geometry": { "type": "Point", "coordinates": [-73.9, 40.7] }
                },
                {
                    "type": "Feature",
                    "properties": { "neighborhood": "Nowhere", "borough": "Bronx" },
                    "geometry": null
                }
            ]
        })
        .to_string()
        .parse()
        .unwrap();

        let boundaries = parse_boundaries(geojson).unwrap();
        assert_eq!(boundaries.len(), 1);
        assert_eq!(boundaries[0].neighborhood, "Astoria");
        assert_eq!(boundaries[0].borough.as_deref(), Some("Queens"));
        assert_eq!(boundaries[0].geometry.0.len(), 1);
    }

    #[test]
    fn unusable_geometry_skips_only_that_feature() {
        let geojson: GeoJson = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "neighborhood": "Empty", "borough": "Bronx" },
                    "geometry": { "type": "Polygon", "coordinates": [] }
                },
                {
                    "type": "Feature",
                    "properties": { "neighborhood": "Empty Parts", "borough": "Bronx" },
                    "geometry": { "type": "MultiPolygon", "coordinates": [] }
                },
                {
                    "type": "Feature",
                    "properties": { "neighborhood": "Astoria", "borough": "Queens" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[-73.93, 40.76], [-73.91, 40.76], [-73.91, 40.78], [-73.93, 40.76]]]
                    }
                }
            ]
        })
        .to_string()
        .parse()
        .unwrap();

        let boundaries = parse_boundaries(geojson).unwrap();
        assert_eq!(boundaries.len(), 1);
        assert_eq!(boundaries[0].neighborhood, "Astoria");
    }

    #[test]
    fn rejects_non_collections() {
        let geojson: GeoJson = r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#.parse().unwrap();
        assert!(parse_boundaries(geojson).is_err());
    }

    #[tokio::test]
    async fn missing_local_file_is_an_error() {
        let err = load_boundaries(&Client::new(), "does/not/exist.geojson").await.unwrap_err();
        assert!(format!("{:#}", err).contains("does/not/exist.geojson"));
    }
}
