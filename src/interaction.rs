use crate::map::scale::Linear;

/// Wheel notch in line mode: 3 lines at 0.05 per line, as a power of two
const WHEEL_STEP: f64 = 0.15;

/// Cumulative drag offset in logical pixels.
///
/// The offset persists between gestures; each gesture only remembers where
/// it started so moves are applied relative to that anchor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DragAccumulator {
    pub x: f64,
    pub y: f64,
    anchor: Option<Anchor>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Anchor {
    pointer: (f64, f64),
    offset: (f64, f64),
}

impl DragAccumulator {
    /// Start a gesture with the pointer at `(px, py)`.
    pub fn begin(&mut self, px: f64, py: f64) {
        self.anchor = Some(Anchor {
            pointer: (px, py),
            offset: (self.x, self.y),
        });
    }

    /// Move the pointer within a gesture. Returns the new offset, or `None`
    /// when no gesture is active.
    pub fn moved(&mut self, px: f64, py: f64) -> Option<(f64, f64)> {
        let anchor = self.anchor?;
        self.x = anchor.offset.0 + (px - anchor.pointer.0);
        self.y = anchor.offset.1 + (py - anchor.pointer.1);
        Some((self.x, self.y))
    }

    /// Shift the offset directly, as a self-contained drag step.
    pub fn nudge(&mut self, dx: f64, dy: f64) -> (f64, f64) {
        self.x += dx;
        self.y += dy;
        if let Some(anchor) = self.anchor.as_mut() {
            anchor.offset.0 += dx;
            anchor.offset.1 += dy;
        }
        (self.x, self.y)
    }

    pub fn end(&mut self) {
        self.anchor = None;
    }

    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }
}

/// Maps a drag offset to a rotation delta: the canvas width spans a full
/// turn of longitude, the height a half turn of latitude (dragging down
/// tilts the view up).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragRotation {
    lambda: Linear,
    phi: Linear,
}

impl DragRotation {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            lambda: Linear::new((0.0, width), (-180.0, 180.0)),
            phi: Linear::new((0.0, height), (90.0, -90.0)),
        }
    }

    /// Rotation for offset `(x, y)` applied on top of `origin`.
    pub fn rotation(&self, origin: (f64, f64), x: f64, y: f64) -> (f64, f64) {
        (origin.0 + self.lambda.apply(x), origin.1 + self.phi.apply(y))
    }
}

/// Cumulative zoom factor, bounded to `[min, max]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomTransform {
    k: f64,
    min: f64,
    max: f64,
}

impl ZoomTransform {
    pub fn new(min: f64, max: f64) -> Self {
        Self { k: 1.0, min, max }
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    /// Set the factor outright, clamped to the bounds.
    pub fn set(&mut self, k: f64) -> f64 {
        if k.is_finite() {
            self.k = k.clamp(self.min, self.max);
        }
        self.k
    }

    pub fn scale_by(&mut self, factor: f64) -> f64 {
        self.set(self.k * factor)
    }

    /// One wheel notch; positive `notches` zoom in.
    pub fn wheel(&mut self, notches: f64) -> f64 {
        self.scale_by(2f64.powf(notches * WHEEL_STEP))
    }
}
