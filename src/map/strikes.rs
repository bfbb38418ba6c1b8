use geojson::{Feature, JsonValue, Value};

use crate::geo::lonlat_to_vec3;
use crate::map::projection::Orthographic;
use crate::map::scale::{Linear, Quantize};
use crate::map::spatial::PointIndex;

/// Marker fill colours, lightest mass first
pub const PALETTE: [(u8, u8, u8); 5] = [
    (0x25, 0x40, 0xA3),
    (0x58, 0x64, 0x36),
    (0xFC, 0xD3, 0x2D),
    (0xE9, 0x55, 0x17),
    (0xC6, 0x13, 0x09),
];

/// Largest marker radius in logical units
pub const MAX_RADIUS: f64 = 12.0;

/// Pointer slack for hovering tiny markers, in logical units
const MIN_HIT_RADIUS: f64 = 4.0;

/// A meteorite strike ready for plotting
#[derive(Clone, Debug, PartialEq)]
pub struct Strike {
    pub name: String,
    /// Mass in grams (0 when unknown)
    pub mass: f64,
    pub year: Option<String>,
    pub class: Option<String>,
    pub lon: f64,
    pub lat: f64,
}

impl Strike {
    /// Extract a strike from a feature with Point geometry.
    pub fn from_feature(feature: &Feature) -> Option<Self> {
        let geometry = feature.geometry.as_ref()?;
        let Value::Point(coords) = &geometry.value else {
            return None;
        };
        if coords.len() < 2 {
            return None;
        }

        let props = feature.properties.as_ref();
        let text = |key: &str| {
            props
                .and_then(|p| p.get(key))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        Some(Self {
            name: text("name").unwrap_or_else(|| "Unknown".to_string()),
            mass: props.and_then(|p| p.get("mass")).and_then(number).unwrap_or(0.0),
            // "1880-01-01T00:00:00.000" -> "1880"
            year: text("year").map(|y| y.chars().take(4).collect()),
            class: text("recclass"),
            lon: coords[0],
            lat: coords[1],
        })
    }
}

/// The dataset ships numbers as strings
fn number(v: &JsonValue) -> Option<f64> {
    match v {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Screen-space marker for one strike
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Marker {
    /// `None` when the strike is behind the horizon
    pub center: Option<(f64, f64)>,
    pub radius: f64,
    /// Index into [`PALETTE`]
    pub bucket: usize,
}

/// Strikes plus the scales and index used to draw and hover them
pub struct StrikeLayer {
    index: PointIndex<Strike>,
    radius: Linear,
    color: Quantize<(u8, u8, u8)>,
    markers: Vec<Marker>,
}

impl StrikeLayer {
    pub fn new(strikes: Vec<Strike>) -> Self {
        let max_mass = strikes.iter().map(|s| s.mass).fold(0.0, f64::max);

        let mut index = PointIndex::new(5.0);
        for strike in strikes {
            index.insert(strike.lon, strike.lat, strike);
        }

        Self {
            index,
            radius: Linear::new((0.0, max_mass), (0.0, MAX_RADIUS)),
            color: Quantize::new((0.0, max_mass), PALETTE.to_vec()),
            markers: Vec::new(),
        }
    }

    pub fn strikes(&self) -> &[Strike] {
        self.index.items()
    }

    /// Markers from the most recent projection, aligned with [`Self::strikes`]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn color(&self, bucket: usize) -> (u8, u8, u8) {
        PALETTE[bucket.min(PALETTE.len() - 1)]
    }

    /// Recompute every marker for `projection`.
    pub(crate) fn project(&mut self, projection: &Orthographic) {
        self.markers = self
            .index
            .items()
            .iter()
            .map(|s| Marker {
                center: projection.project(s.lon, s.lat),
                radius: self.radius.apply(s.mass).max(0.0),
                bucket: self.color.bin(s.mass),
            })
            .collect();
    }

    /// The strike whose marker is under canvas point `(x, y)`, nearest first.
    pub fn hit_test(&self, projection: &Orthographic, x: f64, y: f64) -> Option<&Strike> {
        let (lon, lat) = projection.invert(x, y)?;
        let reach = MAX_RADIUS.max(MIN_HIT_RADIUS);
        let radius_deg = search_radius(projection, lon, lat, reach);

        self.index
            .query_radius(lon, lat, radius_deg)
            .into_iter()
            .filter_map(|i| {
                let marker = self.markers.get(i)?;
                let (mx, my) = marker.center?;
                let dist = ((mx - x).powi(2) + (my - y).powi(2)).sqrt();
                (dist <= marker.radius.max(MIN_HIT_RADIUS)).then_some((i, dist))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .and_then(|(i, _)| self.index.get(i))
    }
}

/// Angular radius in degrees that covers every visible point within `reach`
/// canvas units of the pointer at `(lon, lat)`.
///
/// Foreshortening grows toward the limb, so a step outward from the disc
/// centre spans the most degrees; a sideways step spans at most
/// `reach / scale` radians. The sum of both bounds any direction.
fn search_radius(projection: &Orthographic, lon: f64, lat: f64, reach: f64) -> f64 {
    let scale = projection.scale();
    let depth = projection.rotate(lonlat_to_vec3(lon, lat)).x.clamp(-1.0, 1.0);
    let from_centre = (1.0 - depth * depth).sqrt();
    let outward = (from_centre + reach / scale).min(1.0).asin() - from_centre.asin();
    (outward + reach / scale).to_degrees() + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::Geometry;

    fn strike(name: &str, mass: f64, lon: f64, lat: f64) -> Strike {
        Strike {
            name: name.to_string(),
            mass,
            year: None,
            class: None,
            lon,
            lat,
        }
    }

    fn feature(props: JsonValue, geometry: Option<Value>) -> Feature {
        Feature {
            bbox: None,
            geometry: geometry.map(Geometry::new),
            id: None,
            properties: props.as_object().cloned(),
            foreign_members: None,
        }
    }

    #[test]
    fn test_from_feature_parses_string_fields() {
        let f = feature(
            serde_json::json!({
                "name": "Aachen",
                "mass": "21",
                "year": "1880-01-01T00:00:00.000",
                "recclass": "L5"
            }),
            Some(Value::Point(vec![6.08333, 50.775])),
        );
        let s = Strike::from_feature(&f).unwrap();
        assert_eq!(s.name, "Aachen");
        assert_eq!(s.mass, 21.0);
        assert_eq!(s.year.as_deref(), Some("1880"));
        assert_eq!(s.class.as_deref(), Some("L5"));
        assert_eq!((s.lon, s.lat), (6.08333, 50.775));
    }

    #[test]
    fn test_from_feature_requires_point() {
        let f = feature(serde_json::json!({"name": "x"}), None);
        assert!(Strike::from_feature(&f).is_none());
        let line = Value::LineString(vec![vec![0.0, 0.0], vec![1.0, 1.0]]);
        let f = feature(serde_json::json!({}), Some(line));
        assert!(Strike::from_feature(&f).is_none());
    }

    #[test]
    fn test_markers_scale_with_mass() {
        let mut layer = StrikeLayer::new(vec![
            strike("small", 0.0, 0.0, 0.0),
            strike("big", 1000.0, 10.0, 0.0),
            strike("hidden", 500.0, 180.0, 0.0),
        ]);
        layer.project(&Orthographic::new(250.0, (480.0, 250.0)));

        let markers = layer.markers();
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].radius, 0.0);
        assert_eq!(markers[0].bucket, 0);
        assert_eq!(markers[1].radius, MAX_RADIUS);
        assert_eq!(markers[1].bucket, PALETTE.len() - 1);
        assert!(markers[2].center.is_none());
    }

    #[test]
    fn test_hit_test_finds_marker_under_pointer() {
        let proj = Orthographic::new(250.0, (480.0, 250.0));
        let mut layer = StrikeLayer::new(vec![
            strike("centre", 10.0, 0.0, 0.0),
            strike("elsewhere", 10.0, 40.0, 20.0),
        ]);
        layer.project(&proj);

        let hit = layer.hit_test(&proj, 481.0, 251.0).unwrap();
        assert_eq!(hit.name, "centre");
        assert!(layer.hit_test(&proj, 600.0, 100.0).is_none());
    }

    #[test]
    fn test_hit_test_near_limb() {
        let proj = Orthographic::new(250.0, (480.0, 250.0));
        let mut layer = StrikeLayer::new(vec![strike("limb", 1000.0, 88.0, 0.0)]);
        layer.project(&proj);

        let (mx, my) = layer.markers()[0].center.unwrap();
        assert!(mx > 729.0);
        // 8 units inward, still inside the 12-unit disc
        let hit = layer.hit_test(&proj, mx - 8.0, my).unwrap();
        assert_eq!(hit.name, "limb");
    }

    #[test]
    fn test_hit_test_near_pole() {
        let proj = Orthographic::new(250.0, (480.0, 250.0)).with_rotation(0.0, -90.0);
        let mut layer = StrikeLayer::new(vec![strike("polar", 1000.0, 120.0, 88.0)]);
        layer.project(&proj);

        let (mx, my) = layer.markers()[0].center.unwrap();
        let hit = layer.hit_test(&proj, mx + 6.0, my).unwrap();
        assert_eq!(hit.name, "polar");
    }
}
