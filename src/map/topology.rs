//! Decoding of TopoJSON topology documents into GeoJSON features.
//!
//! A topology stores every shared boundary once as an "arc"; polygons refer to
//! arcs by index, with `~i` (that is `-i - 1`) meaning arc `i` reversed. Arc
//! positions are usually quantized and delta-encoded against a `transform`.

use std::collections::HashMap;

use geojson::feature::Id;
use geojson::{
    Feature, Geometry, JsonObject, JsonValue, LineStringType, PolygonType, Position, Value,
};
use serde::Deserialize;

use crate::error::LoadError;

#[derive(Debug, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<Transform>,
    pub arcs: Vec<Vec<Vec<f64>>>,
    pub objects: HashMap<String, TopoGeometry>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

/// A geometry object inside a topology. `kind` is `None` for the null
/// geometries some topologies use as placeholders.
#[derive(Debug, Deserialize)]
pub struct TopoGeometry {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub arcs: JsonValue,
    #[serde(default)]
    pub coordinates: JsonValue,
    #[serde(default)]
    pub geometries: Vec<TopoGeometry>,
    #[serde(default)]
    pub id: Option<JsonValue>,
    #[serde(default)]
    pub properties: Option<JsonObject>,
}

impl Topology {
    /// Parse a topology document. The buffer is used as scratch space by the
    /// SIMD parser.
    pub fn from_slice(bytes: &mut [u8], location: &str) -> Result<Self, LoadError> {
        simd_json::serde::from_slice(bytes).map_err(|source| LoadError::Json {
            location: location.to_string(),
            source,
        })
    }

    /// Convert the named object to features: one feature per member of a
    /// geometry collection, or a single feature otherwise.
    pub fn features(&self, object: &str) -> Result<Vec<Feature>, LoadError> {
        let geometry = self
            .objects
            .get(object)
            .ok_or_else(|| LoadError::MissingObject(object.to_string()))?;

        let arcs = self.decode_arcs();
        match geometry.kind.as_deref() {
            Some("GeometryCollection") => geometry
                .geometries
                .iter()
                .map(|g| to_feature(g, &arcs, self.transform.as_ref()))
                .collect(),
            _ => Ok(vec![to_feature(geometry, &arcs, self.transform.as_ref())?]),
        }
    }

    /// Absolute arc coordinates, undoing quantization and delta encoding.
    fn decode_arcs(&self) -> Vec<Vec<Position>> {
        let Some(transform) = self.transform else {
            return self
                .arcs
                .iter()
                .map(|arc| arc.iter().map(|p| p.iter().take(2).copied().collect()).collect())
                .collect();
        };

        self.arcs
            .iter()
            .map(|arc| {
                let (mut x, mut y) = (0.0, 0.0);
                arc.iter()
                    .map(|p| {
                        x += p.first().copied().unwrap_or(0.0);
                        y += p.get(1).copied().unwrap_or(0.0);
                        vec![
                            x * transform.scale[0] + transform.translate[0],
                            y * transform.scale[1] + transform.translate[1],
                        ]
                    })
                    .collect()
            })
            .collect()
    }
}

fn to_feature(
    geometry: &TopoGeometry,
    arcs: &[Vec<Position>],
    transform: Option<&Transform>,
) -> Result<Feature, LoadError> {
    let value = geometry_value(geometry, arcs, transform)?;
    Ok(Feature {
        bbox: None,
        geometry: value.map(Geometry::new),
        id: geometry.id.as_ref().and_then(feature_id),
        properties: geometry.properties.clone(),
        foreign_members: None,
    })
}

fn feature_id(id: &JsonValue) -> Option<Id> {
    match id {
        JsonValue::String(s) => Some(Id::String(s.clone())),
        JsonValue::Number(n) => Some(Id::Number(n.clone())),
        _ => None,
    }
}

fn geometry_value(
    geometry: &TopoGeometry,
    arcs: &[Vec<Position>],
    transform: Option<&Transform>,
) -> Result<Option<Value>, LoadError> {
    let Some(kind) = geometry.kind.as_deref() else {
        return Ok(None);
    };

    let value = match kind {
        "Point" => Value::Point(point(&parse::<Vec<f64>>(&geometry.coordinates, kind)?, transform)),
        "MultiPoint" => Value::MultiPoint(
            parse::<Vec<Vec<f64>>>(&geometry.coordinates, kind)?
                .iter()
                .map(|p| point(p, transform))
                .collect(),
        ),
        "LineString" => Value::LineString(line(&parse::<Vec<i64>>(&geometry.arcs, kind)?, arcs)?),
        "MultiLineString" => Value::MultiLineString(
            parse::<Vec<Vec<i64>>>(&geometry.arcs, kind)?
                .iter()
                .map(|refs| line(refs, arcs))
                .collect::<Result<_, _>>()?,
        ),
        "Polygon" => Value::Polygon(polygon(&parse::<Vec<Vec<i64>>>(&geometry.arcs, kind)?, arcs)?),
        "MultiPolygon" => Value::MultiPolygon(
            parse::<Vec<Vec<Vec<i64>>>>(&geometry.arcs, kind)?
                .iter()
                .map(|rings| polygon(rings, arcs))
                .collect::<Result<_, _>>()?,
        ),
        "GeometryCollection" => Value::GeometryCollection(
            geometry
                .geometries
                .iter()
                .filter_map(|g| geometry_value(g, arcs, transform).transpose())
                .map(|v| v.map(Geometry::new))
                .collect::<Result<_, _>>()?,
        ),
        other => return Err(LoadError::Topology(format!("unknown geometry type `{other}`"))),
    };

    Ok(Some(value))
}

fn parse<T: serde::de::DeserializeOwned>(value: &JsonValue, kind: &str) -> Result<T, LoadError> {
    serde_json::from_value(value.clone())
        .map_err(|e| LoadError::Topology(format!("bad {kind} geometry: {e}")))
}

/// Points are quantized but not delta-encoded.
fn point(p: &[f64], transform: Option<&Transform>) -> Position {
    let x = p.first().copied().unwrap_or(0.0);
    let y = p.get(1).copied().unwrap_or(0.0);
    match transform {
        Some(t) => vec![x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]],
        None => vec![x, y],
    }
}

/// Concatenate the referenced arcs, dropping the duplicated junction point.
fn line(refs: &[i64], arcs: &[Vec<Position>]) -> Result<LineStringType, LoadError> {
    let mut points: LineStringType = Vec::new();
    for &r in refs {
        let (index, reversed) = if r < 0 { ((!r) as usize, true) } else { (r as usize, false) };
        let arc = arcs
            .get(index)
            .ok_or_else(|| LoadError::Topology(format!("arc index {r} out of range")))?;

        points.pop();
        if reversed {
            points.extend(arc.iter().rev().cloned());
        } else {
            points.extend(arc.iter().cloned());
        }
    }

    if points.len() < 2 {
        if let Some(first) = points.first().cloned() {
            points.push(first);
        }
    }
    Ok(points)
}

fn ring(refs: &[i64], arcs: &[Vec<Position>]) -> Result<LineStringType, LoadError> {
    let mut points = line(refs, arcs)?;
    // Degenerate rings still need four positions to be valid
    while !points.is_empty() && points.len() < 4 {
        points.push(points[0].clone());
    }
    Ok(points)
}

fn polygon(rings: &[Vec<i64>], arcs: &[Vec<Position>]) -> Result<PolygonType, LoadError> {
    rings.iter().map(|refs| ring(refs, arcs)).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two unit squares sharing their middle edge, quantized, plus one
    /// MultiPolygon made of both.
    pub(crate) const TWO_SQUARES: &str = r#"{
        "type": "Topology",
        "transform": {"scale": [1, 1], "translate": [0, 0]},
        "objects": {
            "countries": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "id": 4, "arcs": [[0, 1]]},
                    {"type": "Polygon", "id": "008", "arcs": [[-1, 2]]},
                    {"type": "MultiPolygon", "id": 12, "arcs": [[[0, 1]], [[-1, 2]]]}
                ]
            }
        },
        "arcs": [
            [[1, 0], [0, 1]],
            [[1, 1], [-1, 0], [0, -1], [1, 0]],
            [[1, 0], [1, 0], [0, 1], [-1, 0]]
        ]
    }"#;

    fn topology(json: &str) -> Topology {
        let mut bytes = json.as_bytes().to_vec();
        Topology::from_slice(&mut bytes, "fixture").unwrap()
    }

    #[test]
    fn test_feature_per_collection_member() {
        let features = topology(TWO_SQUARES).features("countries").unwrap();
        assert_eq!(features.len(), 3);
        assert!(matches!(features[0].id, Some(Id::Number(_))));
        assert_eq!(features[1].id, Some(Id::String("008".to_string())));
    }

    #[test]
    fn test_delta_decoding_and_arc_joining() {
        let features = topology(TWO_SQUARES).features("countries").unwrap();
        let geometry = features[0].geometry.as_ref().map(|g| g.value.clone());
        let Some(Value::Polygon(rings)) = geometry else {
            panic!("expected polygon");
        };
        assert_eq!(
            rings[0],
            vec![vec![1.0, 0.0], vec![1.0, 1.0], vec![0.0, 1.0], vec![0.0, 0.0], vec![1.0, 0.0]]
        );
    }

    #[test]
    fn test_reversed_arc() {
        let features = topology(TWO_SQUARES).features("countries").unwrap();
        let geometry = features[1].geometry.as_ref().map(|g| g.value.clone());
        let Some(Value::Polygon(rings)) = geometry else {
            panic!("expected polygon");
        };
        assert_eq!(
            rings[0],
            vec![vec![1.0, 1.0], vec![1.0, 0.0], vec![2.0, 0.0], vec![2.0, 1.0], vec![1.0, 1.0]]
        );
    }

    #[test]
    fn test_multipolygon() {
        let features = topology(TWO_SQUARES).features("countries").unwrap();
        let geometry = features[2].geometry.as_ref().map(|g| g.value.clone());
        let Some(Value::MultiPolygon(polygons)) = geometry else {
            panic!("expected multipolygon");
        };
        assert_eq!(polygons.len(), 2);
    }

    #[test]
    fn test_missing_object() {
        let err = topology(TWO_SQUARES).features("land").unwrap_err();
        assert!(matches!(err, LoadError::MissingObject(name) if name == "land"));
    }

    #[test]
    fn test_null_geometry_kept_as_feature() {
        let json = r#"{"type": "Topology", "arcs": [],
            "objects": {"countries": {"type": "GeometryCollection",
                "geometries": [{"type": null, "id": -99}]}}}"#;
        let features = topology(json).features("countries").unwrap();
        assert_eq!(features.len(), 1);
        assert!(features[0].geometry.is_none());
    }

    #[test]
    fn test_bad_arc_index() {
        let json = r#"{"type": "Topology", "arcs": [],
            "objects": {"countries": {"type": "Polygon", "arcs": [[3]]}}}"#;
        assert!(matches!(
            topology(json).features("countries"),
            Err(LoadError::Topology(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        let mut bytes = b"{\"arcs\": [".to_vec();
        assert!(matches!(
            Topology::from_slice(&mut bytes, "fixture"),
            Err(LoadError::Json { .. })
        ));
    }
}
