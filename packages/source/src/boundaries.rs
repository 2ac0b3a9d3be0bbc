//! Boundary polygon loader.
//!
//! Reads a `GeoJSON` `FeatureCollection` of place or county polygons. The
//! coordinate reference system comes from the legacy `crs` member that
//! TIGER/Line conversions still emit, falling back to the caller's default
//! (RFC 7946 files are always WGS 84).

use std::io::Read;
use std::path::Path;

use geo::MultiPolygon;
use geojson::GeoJson;
use rhna_geography_models::Crs;
use rhna_source_models::{BoundaryColumns, BoundaryFeature, BoundaryLayer};

use crate::{SourceError, open};

/// Loads a boundary `GeoJSON` file at `path`.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be read or parsed, declares an
/// unsupported CRS, or a feature lacks its name or GEOID property.
pub fn load_boundaries(
    path: &Path,
    columns: &BoundaryColumns,
    default_crs: Crs,
) -> Result<BoundaryLayer, SourceError> {
    let file = open(path)?;
    let label = path.display().to_string();
    let layer = read_boundaries(file, &label, columns, default_crs)?;
    log::info!(
        "Loaded {} boundary features ({}) from {label}",
        layer.features.len(),
        layer.crs
    );
    Ok(layer)
}

/// Reads a boundary layer from any reader. `label` identifies the source in
/// error messages.
///
/// Features whose geometry is missing or not polygonal are skipped with a
/// warning.
///
/// # Errors
///
/// See [`load_boundaries`].
pub fn read_boundaries<R: Read>(
    mut reader: R,
    label: &str,
    columns: &BoundaryColumns,
    default_crs: Crs,
) -> Result<BoundaryLayer, SourceError> {
    let mut body = String::new();
    reader
        .read_to_string(&mut body)
        .map_err(|source| SourceError::Io {
            path: label.into(),
            source,
        })?;

    let GeoJson::FeatureCollection(collection) = body.parse::<GeoJson>()? else {
        return Err(SourceError::NotFeatureCollection {
            file: label.to_string(),
        });
    };

    let crs = match declared_crs(collection.foreign_members.as_ref()) {
        Some(name) => Crs::parse(&name).ok_or_else(|| SourceError::UnsupportedCrs {
            file: label.to_string(),
            name,
        })?,
        None => default_crs,
    };

    let mut features = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        let name = property_string(&feature, &columns.name).ok_or_else(|| {
            SourceError::MissingProperty {
                file: label.to_string(),
                index,
                property: columns.name.clone(),
            }
        })?;
        let geoid = property_string(&feature, &columns.geoid).ok_or_else(|| {
            SourceError::MissingProperty {
                file: label.to_string(),
                index,
                property: columns.geoid.clone(),
            }
        })?;

        let Some(geometry) = feature.geometry.and_then(to_multipolygon) else {
            log::warn!("{label}: feature {index} ({name}) has no polygon geometry, skipping");
            continue;
        };

        features.push(BoundaryFeature {
            name,
            geoid,
            geometry,
        });
    }

    Ok(BoundaryLayer { crs, features })
}

/// Extracts `crs.properties.name` from a feature collection's foreign
/// members.
fn declared_crs(foreign: Option<&geojson::JsonObject>) -> Option<String> {
    foreign?
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()
        .map(str::to_string)
}

/// Reads a string or numeric property as a trimmed string.
fn property_string(feature: &geojson::Feature, key: &str) -> Option<String> {
    let value = match feature.property(key)? {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!value.is_empty()).then_some(value)
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`], accepting both
/// `Polygon` and `MultiPolygon`.
fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn read(json: &str) -> Result<BoundaryLayer, SourceError> {
        read_boundaries(
            Cursor::new(json.to_string()),
            "places.geojson",
            &BoundaryColumns::default(),
            Crs::Wgs84,
        )
    }

    const PLACES: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::4269" } },
        "features": [
            {
                "type": "Feature",
                "properties": { "NAME": "Oakland", "GEOID": "0653000" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "NAME": "Alameda", "GEOID": 600562 },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[2.0, 0.0], [3.0, 0.0], [3.0, 1.0], [2.0, 0.0]]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "NAME": "Somewhere", "GEOID": "0699999" },
                "geometry": { "type": "Point", "coordinates": [0.5, 0.5] }
            }
        ]
    }"#;

    #[test]
    fn reads_polygons_and_declared_crs() {
        let layer = read(PLACES).unwrap();
        assert_eq!(layer.crs, Crs::Nad83);
        assert_eq!(layer.features.len(), 2);
        assert_eq!(layer.features[0].name, "Oakland");
        assert_eq!(layer.features[0].geometry.0.len(), 1);
        assert_eq!(layer.features[1].geoid, "600562");
    }

    #[test]
    fn defaults_crs_when_undeclared() {
        let json = r#"{ "type": "FeatureCollection", "features": [] }"#;
        assert_eq!(read(json).unwrap().crs, Crs::Wgs84);
    }

    #[test]
    fn rejects_unsupported_crs() {
        let json = r#"{
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "EPSG:2227" } },
            "features": []
        }"#;
        assert!(matches!(read(json), Err(SourceError::UnsupportedCrs { .. })));
    }

    #[test]
    fn missing_name_is_fatal() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "GEOID": "0653000" },
                "geometry": null
            }]
        }"#;
        assert!(matches!(read(json), Err(SourceError::MissingProperty { .. })));
    }

    #[test]
    fn rejects_bare_geometry() {
        let json = r#"{ "type": "Point", "coordinates": [0.0, 0.0] }"#;
        assert!(matches!(
            read(json),
            Err(SourceError::NotFeatureCollection { .. })
        ));
    }
}
