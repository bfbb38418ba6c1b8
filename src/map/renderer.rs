use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_circle, draw_line, draw_ring};
use crate::map::path::ProjectedPath;
use crate::map::scene::{Scene, ShapeKind};
use crate::map::strikes::PALETTE;

/// Uniform fit of the logical canvas into a Braille pixel grid, centred
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fit {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Target grid in Braille pixels
    pub width: usize,
    pub height: usize,
}

impl Fit {
    pub fn new(logical_width: f64, logical_height: f64, width: usize, height: usize) -> Self {
        let scale = (width as f64 / logical_width)
            .min(height as f64 / logical_height)
            .max(f64::MIN_POSITIVE);
        Self {
            scale,
            offset_x: (width as f64 - logical_width * scale) / 2.0,
            offset_y: (height as f64 - logical_height * scale) / 2.0,
            width,
            height,
        }
    }

    #[inline]
    pub fn to_pixel(&self, x: f64, y: f64) -> (i32, i32) {
        (
            (self.offset_x + x * self.scale).round() as i32,
            (self.offset_y + y * self.scale).round() as i32,
        )
    }

    #[inline]
    pub fn to_logical(&self, px: f64, py: f64) -> (f64, f64) {
        ((px - self.offset_x) / self.scale, (py - self.offset_y) / self.scale)
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0
            && min_x < self.width as i32
            && max_y >= 0
            && min_y < self.height as i32
    }
}

/// Rasterized scene, one canvas per colour
pub struct MapLayers {
    pub outline: BrailleCanvas,
    pub countries: BrailleCanvas,
    pub graticule: BrailleCanvas,
    /// One canvas per palette bucket, lightest first
    pub strikes: Vec<BrailleCanvas>,
}

/// Rasterize the last render of `scene` into canvases of `cols × rows`
/// characters.
pub fn render_layers(scene: &Scene, fit: &Fit, cols: usize, rows: usize) -> MapLayers {
    let mut layers = MapLayers {
        outline: BrailleCanvas::new(cols, rows),
        countries: BrailleCanvas::new(cols, rows),
        graticule: BrailleCanvas::new(cols, rows),
        strikes: (0..PALETTE.len()).map(|_| BrailleCanvas::new(cols, rows)).collect(),
    };

    let outline = scene.outline();
    let (cx, cy) = fit.to_pixel(outline.cx, outline.cy);
    draw_ring(&mut layers.outline, cx, cy, (outline.r * fit.scale).round() as i32);

    for shape in scene.shapes() {
        let canvas = match shape.kind {
            ShapeKind::Country { .. } => &mut layers.countries,
            ShapeKind::Graticule => &mut layers.graticule,
        };
        draw_path(canvas, shape.path(), fit);
    }

    if let Some(strikes) = scene.strikes() {
        for marker in strikes.markers() {
            let Some((x, y)) = marker.center else {
                continue;
            };
            let (px, py) = fit.to_pixel(x, y);
            let radius = (marker.radius * fit.scale).round() as i32;
            if let Some(canvas) = layers.strikes.get_mut(marker.bucket) {
                draw_circle(canvas, px, py, radius);
            }
        }
    }

    layers
}

/// Draw a projected path with viewport culling
fn draw_path(canvas: &mut BrailleCanvas, path: &ProjectedPath, fit: &Fit) {
    for line in &path.lines {
        let pixels: Vec<(i32, i32)> =
            line.points.iter().map(|&(x, y)| fit.to_pixel(x, y)).collect();

        for pair in pixels.windows(2) {
            draw_segment(canvas, pair[0], pair[1], fit);
        }
        if line.closed && pixels.len() > 2 {
            if let (Some(&last), Some(&first)) = (pixels.last(), pixels.first()) {
                draw_segment(canvas, last, first, fit);
            }
        }
    }
}

#[inline]
fn draw_segment(canvas: &mut BrailleCanvas, a: (i32, i32), b: (i32, i32), fit: &Fit) {
    if fit.line_might_be_visible(a, b) {
        draw_line(canvas, a.0, a.1, b.0, b.1);
    }
}
