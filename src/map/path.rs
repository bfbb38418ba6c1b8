use std::fmt::Write;

use geojson::{PolygonType, Position, Value};
use glam::DVec3;

use crate::geo::{lonlat_to_vec3, walk_great_circle};
use crate::map::projection::Orthographic;

/// Maximum great-circle step before projecting, in degrees.
const RESAMPLE_STEP_DEG: f64 = 2.0;

/// A run of connected canvas points
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polyline {
    pub points: Vec<(f64, f64)>,
    pub closed: bool,
}

/// Screen-space outline of one geometry under the current projection
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectedPath {
    pub lines: Vec<Polyline>,
}

impl ProjectedPath {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// SVG path data (`M x,y L x,y … Z`) for this path.
    pub fn to_svg(&self) -> String {
        let mut d = String::new();
        for line in &self.lines {
            for (i, &(x, y)) in line.points.iter().enumerate() {
                d.push(if i == 0 { 'M' } else { 'L' });
                let _ = write!(d, "{},{}", fmt_coord(x), fmt_coord(y));
            }
            if line.closed {
                d.push('Z');
            }
        }
        d
    }
}

/// Round to three decimals, folding negative zero.
fn fmt_coord(v: f64) -> String {
    let rounded = (v * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        rounded.to_string()
    }
}

/// Project a GeoJSON geometry, resampling along great circles and clipping at
/// the projection's horizon. Point geometries produce no path.
pub fn project_geometry(value: &Value, projection: &Orthographic) -> ProjectedPath {
    let mut path = ProjectedPath::default();
    append_geometry(value, projection, &mut path);
    path
}

fn append_geometry(value: &Value, projection: &Orthographic, path: &mut ProjectedPath) {
    match value {
        Value::LineString(coords) => append_line(coords, false, projection, path),
        Value::MultiLineString(lines) => {
            for coords in lines {
                append_line(coords, false, projection, path);
            }
        }
        Value::Polygon(rings) => append_polygon(rings, projection, path),
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                append_polygon(rings, projection, path);
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                append_geometry(&g.value, projection, path);
            }
        }
        Value::Point(_) | Value::MultiPoint(_) => {}
    }
}

fn append_polygon(rings: &PolygonType, projection: &Orthographic, path: &mut ProjectedPath) {
    for ring in rings {
        append_line(ring, true, projection, path);
    }
}

/// Densify, rotate and clip one line or ring.
fn append_line(
    coords: &[Position],
    ring: bool,
    projection: &Orthographic,
    path: &mut ProjectedPath,
) {
    if coords.len() < 2 {
        return;
    }

    let mut runs: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    let mut clipped_any = false;

    let mut prev_geo = position_vec(&coords[0]);
    let mut prev = projection.rotate(prev_geo);
    if projection.is_visible(prev) {
        current.push(projection.to_screen(prev));
    } else {
        clipped_any = true;
    }

    for position in &coords[1..] {
        let target = position_vec(position);
        walk_great_circle(prev_geo, target, RESAMPLE_STEP_DEG, |p| {
            let r = projection.rotate(p);
            match (projection.is_visible(prev), projection.is_visible(r)) {
                (true, true) => current.push(projection.to_screen(r)),
                (true, false) => {
                    clipped_any = true;
                    current.push(projection.to_screen(projection.horizon_crossing(prev, r)));
                    flush(&mut current, &mut runs);
                }
                (false, true) => {
                    current.push(projection.to_screen(projection.horizon_crossing(r, prev)));
                    current.push(projection.to_screen(r));
                }
                (false, false) => {}
            }
            prev = r;
        });
        prev_geo = target;
    }
    flush(&mut current, &mut runs);

    if ring && !clipped_any {
        if let Some(mut points) = runs.pop() {
            // Closing vertex repeats the first one; `Z` draws that edge
            if points.len() > 1 && points.first() == points.last() {
                points.pop();
            }
            path.lines.push(Polyline { points, closed: true });
        }
        return;
    }

    // A ring clipped in its middle re-enters at its start: stitch the tail
    // run onto the head run.
    if ring && runs.len() > 1 && starts_visible(coords, projection) {
        let tail = runs.pop().unwrap_or_default();
        let head = std::mem::take(&mut runs[0]);
        let mut stitched = tail;
        stitched.extend(head.into_iter().skip(1));
        runs[0] = stitched;
    }

    path.lines.extend(
        runs.into_iter()
            .map(|points| Polyline { points, closed: false }),
    );
}

fn flush(current: &mut Vec<(f64, f64)>, runs: &mut Vec<Vec<(f64, f64)>>) {
    if current.len() > 1 {
        runs.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

fn starts_visible(coords: &[Position], projection: &Orthographic) -> bool {
    projection.is_visible(projection.rotate(position_vec(&coords[0])))
}

#[inline]
fn position_vec(position: &Position) -> DVec3 {
    let lon = position.first().copied().unwrap_or(0.0);
    let lat = position.get(1).copied().unwrap_or(0.0);
    lonlat_to_vec3(lon, lat)
}
