use geojson::{LineStringType, Value};

const EPSILON: f64 = 1e-6;

/// Generator for the mesh of meridians and parallels.
///
/// Major lines (every 90° of longitude, plus the equator) run the full
/// extent; minor lines every 10° stop at ±80° so they do not crowd the poles.
#[derive(Clone, Debug)]
pub struct Graticule {
    major_extent: [[f64; 2]; 2],
    minor_extent: [[f64; 2]; 2],
    major_step: [f64; 2],
    minor_step: [f64; 2],
    precision: f64,
}

impl Default for Graticule {
    fn default() -> Self {
        Self {
            major_extent: [[-180.0, -90.0 - EPSILON], [180.0, 90.0 + EPSILON]],
            minor_extent: [[-180.0, -80.0 - EPSILON], [180.0, 80.0 + EPSILON]],
            major_step: [90.0, 360.0],
            minor_step: [10.0, 10.0],
            precision: 2.5,
        }
    }
}

impl Graticule {
    /// All graticule lines as one MultiLineString geometry.
    pub fn geometry(&self) -> Value {
        Value::MultiLineString(self.lines())
    }

    pub fn lines(&self) -> Vec<LineStringType> {
        let [[big_x0, big_y0], [big_x1, big_y1]] = self.major_extent;
        let [[x0, y0], [x1, y1]] = self.minor_extent;
        let [big_dx, big_dy] = self.major_step;
        let [dx, dy] = self.minor_step;

        let mut lines = Vec::new();

        for x in stepped(big_x0, big_x1, big_dx) {
            lines.push(self.meridian(x, big_y0, big_y1));
        }
        for y in stepped(big_y0, big_y1, big_dy) {
            lines.push(self.parallel(y, big_x0, big_x1));
        }
        for x in stepped(x0, x1, dx).filter(|x| (x % big_dx).abs() > EPSILON) {
            lines.push(self.meridian(x, y0, y1));
        }
        for y in stepped(y0, y1, dy).filter(|y| (y % big_dy).abs() > EPSILON) {
            lines.push(self.parallel(y, x0, x1));
        }

        lines
    }

    fn meridian(&self, x: f64, y0: f64, y1: f64) -> LineStringType {
        sampled(y0, y1, self.precision)
            .map(|y| vec![x, y])
            .collect()
    }

    fn parallel(&self, y: f64, x0: f64, x1: f64) -> LineStringType {
        sampled(x0, x1, self.precision)
            .map(|x| vec![x, y])
            .collect()
    }
}

/// Multiples of `step` in `[start, stop)`, starting from the first multiple
/// at or above `start`.
fn stepped(start: f64, stop: f64, step: f64) -> impl Iterator<Item = f64> {
    let first = (start / step).ceil() * step;
    let count = ((stop - first) / step).ceil().max(0.0) as usize;
    (0..count).map(move |i| first + i as f64 * step)
}

/// `start`, `start + step`, … below `stop`, then `stop` itself.
fn sampled(start: f64, stop: f64, step: f64) -> impl Iterator<Item = f64> {
    let count = ((stop - start) / step).ceil().max(0.0) as usize;
    (0..count)
        .map(move |i| start + i as f64 * step)
        .chain(std::iter::once(stop))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_counts() {
        let lines = Graticule::default().lines();
        // 4 major meridians, the equator, 32 minor meridians, 16 minor parallels
        assert_eq!(lines.len(), 4 + 1 + 32 + 16);
    }

    #[test]
    fn test_major_meridian_reaches_poles() {
        let lines = Graticule::default().lines();
        let first = &lines[0];
        assert_eq!(first[0][0], -180.0);
        assert!(first[0][1] < -90.0);
        assert!(first.last().unwrap()[1] > 90.0);
    }

    #[test]
    fn test_minor_lines_stop_at_eighty() {
        let lines = Graticule::default().lines();
        let minor_meridian = &lines[5];
        assert_eq!(minor_meridian[0][0], -170.0);
        assert!(minor_meridian.iter().all(|p| p[1].abs() <= 80.0 + 1e-5));
    }

    #[test]
    fn test_equator_present() {
        let lines = Graticule::default().lines();
        assert!(lines[4].iter().all(|p| p[1] == 0.0));
    }

    #[test]
    fn test_stepped_range() {
        let xs: Vec<f64> = stepped(-180.0, 180.0, 90.0).collect();
        assert_eq!(xs, vec![-180.0, -90.0, 0.0, 90.0]);
    }
}
