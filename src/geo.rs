use glam::DVec3;

/// Convert lon/lat (degrees) to a unit sphere vector.
/// x points at (0°, 0°), y at (90°E, 0°), z at the north pole.
#[inline(always)]
pub fn lonlat_to_vec3(lon: f64, lat: f64) -> DVec3 {
    let lon_rad = lon.to_radians();
    let lat_rad = lat.to_radians();
    DVec3::new(
        lat_rad.cos() * lon_rad.cos(),
        lat_rad.cos() * lon_rad.sin(),
        lat_rad.sin(),
    )
}

/// Convert a unit sphere vector back to lon/lat (degrees).
#[inline(always)]
pub fn vec3_to_lonlat(p: DVec3) -> (f64, f64) {
    let lat = p.z.clamp(-1.0, 1.0).asin().to_degrees();
    let lon = p.y.atan2(p.x).to_degrees();
    (lon, lat)
}

/// Wrap longitude into [-180, 180).
#[inline(always)]
pub fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Interpolate along the great circle arc from `a` to `b` and call a visitor for
/// each subdivision point, `b` included and `a` excluded.
/// Subdivides into segments of at most `max_step_deg` degrees.
#[inline]
pub fn walk_great_circle(a: DVec3, b: DVec3, max_step_deg: f64, mut visitor: impl FnMut(DVec3)) {
    let dot = a.dot(b).clamp(-1.0, 1.0);
    let angle = dot.acos();

    let steps = ((angle.to_degrees() / max_step_deg).ceil() as usize).max(1);
    if steps == 1 {
        visitor(b);
        return;
    }

    let sin_angle = angle.sin();
    if sin_angle.abs() < 1e-10 {
        // Identical or antipodal: no unique great circle
        visitor(b);
        return;
    }

    for i in 1..=steps {
        let t = i as f64 / steps as f64;
        let sa = ((1.0 - t) * angle).sin() / sin_angle;
        let sb = (t * angle).sin() / sin_angle;
        visitor(a * sa + b * sb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_lonlat() {
        let (lon, lat) = vec3_to_lonlat(lonlat_to_vec3(-73.5, 45.25));
        assert!((lon + 73.5).abs() < 1e-9);
        assert!((lat - 45.25).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_lon() {
        assert_eq!(wrap_lon(190.0), -170.0);
        assert_eq!(wrap_lon(-190.0), 170.0);
        assert_eq!(wrap_lon(180.0), -180.0);
        assert_eq!(wrap_lon(45.0), 45.0);
    }

    #[test]
    fn test_walk_subdivides_long_arcs() {
        let a = lonlat_to_vec3(0.0, 0.0);
        let b = lonlat_to_vec3(90.0, 0.0);
        let mut points = Vec::new();
        walk_great_circle(a, b, 2.0, |p| points.push(p));
        assert_eq!(points.len(), 45);
        let (lon, lat) = vec3_to_lonlat(*points.last().unwrap());
        assert!((lon - 90.0).abs() < 1e-9);
        assert!(lat.abs() < 1e-9);
    }

    #[test]
    fn test_walk_short_arc_emits_endpoint() {
        let a = lonlat_to_vec3(10.0, 10.0);
        let b = lonlat_to_vec3(11.0, 10.0);
        let mut count = 0;
        walk_great_circle(a, b, 2.0, |_| count += 1);
        assert_eq!(count, 1);
    }
}
