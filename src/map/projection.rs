use glam::DVec3;

use crate::geo::{lonlat_to_vec3, vec3_to_lonlat, wrap_lon};

/// Points this close to the clip edge still count as visible.
const HORIZON_EPSILON: f64 = 1e-9;

/// Bisection steps when locating a horizon crossing (~1e-7 of the segment).
const CROSSING_ITERATIONS: usize = 24;

/// Orthographic projection of a rotatable sphere onto the logical canvas.
///
/// Rotation is `[λ, φ]` in degrees: the globe is first spun by λ around the
/// polar axis, then tilted by φ. Rotating by `[0, -20]` brings latitude 20°N
/// to the centre of the disc. Points farther than `clip_angle` degrees from
/// the view centre are clipped (90° clips exactly the far hemisphere).
#[derive(Clone, Debug, PartialEq)]
pub struct Orthographic {
    rotation: (f64, f64),
    scale: f64,
    translate: (f64, f64),
    center: (f64, f64),
    clip_angle: f64,
}

impl Orthographic {
    /// Projection with the disc of radius `scale` centred on `translate`.
    pub fn new(scale: f64, translate: (f64, f64)) -> Self {
        Self {
            rotation: (0.0, 0.0),
            scale,
            translate,
            center: (0.0, 0.0),
            clip_angle: 90.0,
        }
    }

    pub fn with_rotation(mut self, lambda: f64, phi: f64) -> Self {
        self.set_rotation(lambda, phi);
        self
    }

    pub fn with_center(mut self, lon: f64, lat: f64) -> Self {
        self.center = (lon, lat);
        self
    }

    pub fn with_clip_angle(mut self, degrees: f64) -> Self {
        self.clip_angle = degrees.clamp(0.0, 180.0);
        self
    }

    pub fn rotation(&self) -> (f64, f64) {
        self.rotation
    }

    pub fn set_rotation(&mut self, lambda: f64, phi: f64) {
        self.rotation = (lambda, phi);
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    /// Project a geographic point to canvas coordinates.
    /// Returns `None` for clipped points (behind the visible hemisphere).
    pub fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let r = self.rotate(lonlat_to_vec3(lon, lat));
        self.is_visible(r).then(|| self.to_screen(r))
    }

    /// Unproject canvas coordinates back to lon/lat.
    /// Returns `None` outside the disc or beyond the clip angle.
    pub fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let (ox, oy) = self.offset();
        let sx = (x - ox) / self.scale;
        let sy = -(y - oy) / self.scale;

        let r2 = sx * sx + sy * sy;
        if r2 > 1.0 {
            return None;
        }

        let r = DVec3::new((1.0 - r2).sqrt(), sx, sy);
        if !self.is_visible(r) {
            return None;
        }

        let (lon, lat) = vec3_to_lonlat(self.inverse_rotate(r));
        Some((wrap_lon(lon), lat))
    }

    /// Apply the view rotation. In the result, x is depth toward the viewer,
    /// y is screen-right and z is screen-up.
    pub(crate) fn rotate(&self, p: DVec3) -> DVec3 {
        let (sin_l, cos_l) = self.rotation.0.to_radians().sin_cos();
        let (sin_p, cos_p) = self.rotation.1.to_radians().sin_cos();

        let x = p.x * cos_l - p.y * sin_l;
        let y = p.x * sin_l + p.y * cos_l;
        let z = p.z;

        DVec3::new(x * cos_p - z * sin_p, y, x * sin_p + z * cos_p)
    }

    fn inverse_rotate(&self, r: DVec3) -> DVec3 {
        let (sin_l, cos_l) = self.rotation.0.to_radians().sin_cos();
        let (sin_p, cos_p) = self.rotation.1.to_radians().sin_cos();

        let x = r.x * cos_p + r.z * sin_p;
        let z = -r.x * sin_p + r.z * cos_p;
        let y = r.y;

        DVec3::new(x * cos_l + y * sin_l, -x * sin_l + y * cos_l, z)
    }

    #[inline]
    pub(crate) fn is_visible(&self, r: DVec3) -> bool {
        r.x > self.clip_angle.to_radians().cos() - HORIZON_EPSILON
    }

    /// Canvas position of a rotated unit vector.
    #[inline]
    pub(crate) fn to_screen(&self, r: DVec3) -> (f64, f64) {
        let (ox, oy) = self.offset();
        (ox + r.y * self.scale, oy - r.z * self.scale)
    }

    /// Canvas position of the projection origin, shifted so that `center`
    /// lands on `translate`.
    fn offset(&self) -> (f64, f64) {
        let lon = self.center.0.to_radians();
        let lat = self.center.1.to_radians();
        let raw_x = lat.cos() * lon.sin();
        let raw_y = lat.sin();
        (
            self.translate.0 - raw_x * self.scale,
            self.translate.1 + raw_y * self.scale,
        )
    }

    /// Locate the clip edge between a visible and a clipped rotated point.
    pub(crate) fn horizon_crossing(&self, inside: DVec3, outside: DVec3) -> DVec3 {
        let mut lo = 0.0;
        let mut hi = 1.0;
        for _ in 0..CROSSING_ITERATIONS {
            let mid = (lo + hi) / 2.0;
            if self.is_visible(inside.lerp(outside, mid).normalize()) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        inside.lerp(outside, lo).normalize()
    }
}
