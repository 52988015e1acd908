use std::{fs, path::Path};

use ahash::AHashMap;
use geo::{Coord, LineString};
use serde_json::Value;

use super::{FeatureError, ParseError, PrecinctGeometry, PrecinctId};

impl PrecinctGeometry {
    /// Normalize one GeoJSON feature into a precinct.
    ///
    /// `Polygon` yields one ring (its first coordinate array); `MultiPolygon` yields one
    /// ring per part, each the part's first array. Holes are dropped.
    pub fn from_feature(feature: &Value, id_field: &str) -> Result<Self, FeatureError> {
        let raw = feature.get("properties")
            .and_then(|properties| properties.get(id_field))
            .filter(|value| !value.is_null())
            .ok_or_else(|| FeatureError::MissingIdentifier { field: id_field.to_string() })?;
        let id = PrecinctId::from_json(raw)
            .ok_or_else(|| FeatureError::InvalidIdentifier { field: id_field.to_string(), value: raw.to_string() })?;

        let geometry = feature.get("geometry")
            .filter(|geometry| !geometry.is_null())
            .ok_or(FeatureError::MissingGeometry)?;

        let kind = geometry.get("type").and_then(Value::as_str).unwrap_or_default();
        let coords = || geometry.get("coordinates")
            .and_then(Value::as_array)
            .ok_or(FeatureError::InvalidCoordinates("missing coordinates array"));

        let rings = match kind {
            "Polygon" => coords()?.first()
                .map(parse_ring)
                .transpose()?
                .into_iter()
                .collect(),
            "MultiPolygon" => coords()?.iter()
                .map(|part| {
                    let part = part.as_array()
                        .ok_or(FeatureError::InvalidCoordinates("polygon part is not an array"))?;
                    part.first().map(parse_ring).unwrap_or(Err(FeatureError::EmptyGeometry))
                })
                .collect::<Result<Vec<_>, _>>()?,
            other => return Err(FeatureError::UnsupportedGeometryKind(other.to_string())),
        };

        Self::new(id, rings)
    }
}

/// Parse a ring: `[[x, y], [x, y], ...]`. Extra ordinates (z, m) are ignored.
fn parse_ring(value: &Value) -> Result<LineString<f64>, FeatureError> {
    let positions = value.as_array()
        .ok_or(FeatureError::InvalidCoordinates("ring is not an array"))?;

    positions.iter()
        .map(|position| {
            let pair = position.as_array()
                .filter(|pair| pair.len() >= 2)
                .ok_or(FeatureError::InvalidCoordinates("position needs at least two numbers"))?;
            let x = pair[0].as_f64().ok_or(FeatureError::InvalidCoordinates("x must be a number"))?;
            let y = pair[1].as_f64().ok_or(FeatureError::InvalidCoordinates("y must be a number"))?;
            Ok(Coord { x, y })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(LineString)
}

/// Parse a GeoJSON FeatureCollection into precincts, in feature order.
///
/// The first malformed feature aborts the whole read: a silently skipped precinct would
/// leave a hole in the graph. Identifiers key the output object, so they must be unique
/// in written form: `17` and `"17"` collide.
pub fn read_collection(bytes: &[u8], id_field: &str) -> Result<Vec<PrecinctGeometry>, ParseError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let features = value.get("features")
        .and_then(Value::as_array)
        .ok_or(ParseError::NotACollection)?;

    let mut seen: AHashMap<String, usize> = AHashMap::with_capacity(features.len());
    let mut precincts = Vec::with_capacity(features.len());

    for (index, feature) in features.iter().enumerate() {
        let precinct = PrecinctGeometry::from_feature(feature, id_field)
            .map_err(|source| ParseError::Feature { index, source })?;

        if let Some(&first) = seen.get(&precinct.id().to_string()) {
            return Err(ParseError::DuplicateIdentifier { id: precinct.id().clone(), first, second: index });
        }
        seen.insert(precinct.id().to_string(), index);
        precincts.push(precinct);
    }

    tracing::info!(count = precincts.len(), id_field, "loaded precinct geometries");
    Ok(precincts)
}

/// Read and parse a GeoJSON FeatureCollection from disk.
pub fn read_collection_file(path: &Path, id_field: &str) -> Result<Vec<PrecinctGeometry>, ParseError> {
    let bytes = fs::read(path)
        .map_err(|source| ParseError::Io { path: path.to_path_buf(), source })?;
    read_collection(&bytes, id_field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(x: f64, y: f64) -> Value {
        json!([[x, y], [x + 1.0, y], [x + 1.0, y + 1.0], [x, y + 1.0], [x, y]])
    }

    #[test]
    fn polygon_keeps_only_outer_ring() {
        let feature = json!({
            "type": "Feature",
            "properties": { "GEOID10": 510010001 },
            "geometry": { "type": "Polygon", "coordinates": [square(0.0, 0.0), square(0.25, 0.25)] },
        });
        let precinct = PrecinctGeometry::from_feature(&feature, "GEOID10").unwrap();

        assert_eq!(precinct.id(), &PrecinctId::Int(510010001));
        assert_eq!(precinct.rings().len(), 1);
        assert_eq!(precinct.rings()[0].0[1], Coord { x: 1.0, y: 0.0 });
    }

    #[test]
    fn multipolygon_takes_first_ring_of_each_part() {
        let feature = json!({
            "properties": { "GEOID10": "A-1" },
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [[square(0.0, 0.0), square(0.5, 0.5)], [square(3.0, 3.0)]],
            },
        });
        let precinct = PrecinctGeometry::from_feature(&feature, "GEOID10").unwrap();

        assert_eq!(precinct.id(), &PrecinctId::from("A-1"));
        assert_eq!(precinct.rings().len(), 2);
        assert_eq!(precinct.rings()[1].0[0], Coord { x: 3.0, y: 3.0 });
    }

    #[test]
    fn third_ordinate_is_ignored() {
        let feature = json!({
            "properties": { "id": 1 },
            "geometry": { "type": "Polygon", "coordinates": [[[0.0, 0.0, 9.0], [1.0, 0.0, 9.0], [0.0, 1.0, 9.0]]] },
        });
        let precinct = PrecinctGeometry::from_feature(&feature, "id").unwrap();
        assert_eq!(precinct.vertex_count(), 3);
    }

    #[test]
    fn rejects_unsupported_kinds() {
        let feature = json!({
            "properties": { "GEOID10": 1 },
            "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] },
        });
        let err = PrecinctGeometry::from_feature(&feature, "GEOID10").unwrap_err();
        assert!(matches!(err, FeatureError::UnsupportedGeometryKind(kind) if kind == "LineString"));
    }

    #[test]
    fn rejects_missing_identifier() {
        let feature = json!({
            "properties": { "NAME10": "Precinct 1" },
            "geometry": { "type": "Polygon", "coordinates": [square(0.0, 0.0)] },
        });
        let err = PrecinctGeometry::from_feature(&feature, "GEOID10").unwrap_err();
        assert!(matches!(err, FeatureError::MissingIdentifier { field } if field == "GEOID10"));
    }

    #[test]
    fn identifier_values_are_checked() {
        let feature = |id: Value| json!({
            "properties": { "GEOID10": id },
            "geometry": { "type": "Polygon", "coordinates": [square(0.0, 0.0)] },
        });

        let precinct = PrecinctGeometry::from_feature(&feature(json!(510010001.0)), "GEOID10").unwrap();
        assert_eq!(precinct.id(), &PrecinctId::Int(510010001));

        let err = PrecinctGeometry::from_feature(&feature(json!(12.5)), "GEOID10").unwrap_err();
        assert!(matches!(err, FeatureError::InvalidIdentifier { ref value, .. } if value == "12.5"));

        let err = PrecinctGeometry::from_feature(&feature(json!(null)), "GEOID10").unwrap_err();
        assert!(matches!(err, FeatureError::MissingIdentifier { .. }));
    }

    #[test]
    fn rejects_empty_polygons() {
        for coordinates in [json!([]), json!([[]])] {
            let feature = json!({
                "properties": { "GEOID10": 1 },
                "geometry": { "type": "Polygon", "coordinates": coordinates },
            });
            let err = PrecinctGeometry::from_feature(&feature, "GEOID10").unwrap_err();
            assert!(matches!(err, FeatureError::EmptyGeometry));
        }

        let feature = json!({
            "properties": { "GEOID10": 1 },
            "geometry": { "type": "MultiPolygon", "coordinates": [[square(0.0, 0.0)], []] },
        });
        let err = PrecinctGeometry::from_feature(&feature, "GEOID10").unwrap_err();
        assert!(matches!(err, FeatureError::EmptyGeometry));
    }

    #[test]
    fn rejects_null_geometry_and_bad_positions() {
        let feature = json!({ "properties": { "GEOID10": 1 }, "geometry": null });
        let err = PrecinctGeometry::from_feature(&feature, "GEOID10").unwrap_err();
        assert!(matches!(err, FeatureError::MissingGeometry));

        let feature = json!({
            "properties": { "GEOID10": 1 },
            "geometry": { "type": "Polygon", "coordinates": [[[0.0], [1.0, "y"]]] },
        });
        let err = PrecinctGeometry::from_feature(&feature, "GEOID10").unwrap_err();
        assert!(matches!(err, FeatureError::InvalidCoordinates(_)));
    }

    #[test]
    fn collection_reports_feature_index() {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                { "properties": { "GEOID10": 1 }, "geometry": { "type": "Polygon", "coordinates": [square(0.0, 0.0)] } },
                { "properties": { "GEOID10": 2 }, "geometry": { "type": "Point", "coordinates": [0.0, 0.0] } },
            ],
        });
        let err = read_collection(collection.to_string().as_bytes(), "GEOID10").unwrap_err();
        assert!(matches!(err, ParseError::Feature { index: 1, .. }));
    }

    #[test]
    fn collection_rejects_duplicate_identifiers() {
        let feature = json!({ "properties": { "GEOID10": 7 }, "geometry": { "type": "Polygon", "coordinates": [square(0.0, 0.0)] } });
        let collection = json!({ "type": "FeatureCollection", "features": [feature.clone(), feature] });

        let err = read_collection(collection.to_string().as_bytes(), "GEOID10").unwrap_err();
        assert!(matches!(err, ParseError::DuplicateIdentifier { first: 0, second: 1, .. }));
    }

    #[test]
    fn collection_requires_features_array() {
        let err = read_collection(br#"{"type": "Feature"}"#, "GEOID10").unwrap_err();
        assert!(matches!(err, ParseError::NotACollection));

        let err = read_collection(b"not json", "GEOID10").unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
    }
}
