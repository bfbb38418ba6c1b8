use std::fs;

use tracing::{error, info, warn};

use crate::config::GlobeConfig;
use crate::data::LoadEvent;
use crate::interaction::{DragAccumulator, DragRotation, ZoomTransform};
use crate::map::{svg, Fit, Globe, Strike};

/// Keyboard drag step in logical pixels (~3.75° of longitude)
pub const NUDGE_STEP: f64 = 10.0;

/// Terminal rows outside the map block's inner area: two border rows, the
/// tooltip line and the status bar.
const CHROME_ROWS: usize = 4;
const CHROME_COLS: usize = 2;

/// Progress of one dataset
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    Pending,
    Loaded(usize),
    Failed,
}

impl LoadStatus {
    pub fn label(&self) -> String {
        match self {
            LoadStatus::Pending => "loading".to_string(),
            LoadStatus::Loaded(n) => n.to_string(),
            LoadStatus::Failed => "failed".to_string(),
        }
    }
}

/// Everything the main loop feeds into the app. Pointer coordinates are in
/// logical canvas units.
#[derive(Debug)]
pub enum GlobeEvent {
    DragStart { x: f64, y: f64 },
    Drag { x: f64, y: f64 },
    DragEnd,
    /// Keyboard drag step
    Nudge { dx: f64, dy: f64 },
    /// Wheel notches, positive zooms in
    Wheel(f64),
    ZoomTo(f64),
    Hover(Option<(f64, f64)>),
    Loaded(LoadEvent),
    Export,
    Reset,
    /// Terminal size in cells
    Resize { width: u16, height: u16 },
    Quit,
}

/// Application state
pub struct App {
    pub config: GlobeConfig,
    pub globe: Globe,
    pub drag: DragAccumulator,
    pub zoom: ZoomTransform,
    drag_rotation: DragRotation,
    pub world: LoadStatus,
    pub strikes: LoadStatus,
    /// Strike under the pointer
    pub hovered: Option<Strike>,
    /// Last one-off notice (export result)
    pub message: Option<String>,
    pub should_quit: bool,
    fit: Fit,
    /// Map inner area in terminal cells
    cols: usize,
    rows: usize,
}

impl App {
    pub fn new(config: GlobeConfig, width: u16, height: u16) -> Self {
        let globe = Globe::new(&config);
        let (cols, rows) = map_cells(width, height);
        Self {
            drag_rotation: DragRotation::new(config.width, config.height),
            zoom: ZoomTransform::new(config.min_zoom, config.max_zoom),
            fit: Fit::new(config.width, config.height, cols * 2, rows * 4),
            globe,
            drag: DragAccumulator::default(),
            world: LoadStatus::Pending,
            strikes: LoadStatus::Pending,
            hovered: None,
            message: None,
            should_quit: false,
            cols,
            rows,
            config,
        }
    }

    /// Map inner area in terminal cells
    pub fn map_size(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Logical canvas point under terminal cell `(col, row)`, or `None`
    /// outside the map area.
    pub fn cell_to_logical(&self, col: u16, row: u16) -> Option<(f64, f64)> {
        let (col, row) = (col as usize, row as usize);
        if col == 0 || row == 0 || col > self.cols || row > self.rows {
            return None;
        }
        // Centre of the cell in Braille pixels; the border offsets by one
        let px = (col - 1) as f64 * 2.0 + 1.0;
        let py = (row - 1) as f64 * 4.0 + 2.0;
        Some(self.fit.to_logical(px, py))
    }

    /// Same as [`App::cell_to_logical`] but extrapolates past the map edge,
    /// so a drag that leaves the canvas keeps tracking.
    pub fn cell_to_logical_unbounded(&self, col: u16, row: u16) -> (f64, f64) {
        let px = (col as f64 - 1.0) * 2.0 + 1.0;
        let py = (row as f64 - 1.0) * 4.0 + 2.0;
        self.fit.to_logical(px, py)
    }

    /// Apply one event to completion.
    pub fn dispatch(&mut self, event: GlobeEvent) {
        match event {
            GlobeEvent::DragStart { x, y } => self.drag.begin(x, y),
            GlobeEvent::Drag { x, y } => {
                if let Some((ax, ay)) = self.drag.moved(x, y) {
                    self.rotate_to(ax, ay);
                }
            }
            GlobeEvent::DragEnd => self.drag.end(),
            GlobeEvent::Nudge { dx, dy } => {
                let (ax, ay) = self.drag.nudge(dx, dy);
                self.rotate_to(ax, ay);
            }
            GlobeEvent::Wheel(notches) => {
                let k = self.zoom.wheel(notches);
                self.zoom_to(k);
            }
            GlobeEvent::ZoomTo(k) => {
                let k = self.zoom.set(k);
                self.zoom_to(k);
            }
            GlobeEvent::Hover(point) => self.hover(point),
            GlobeEvent::Loaded(event) => self.loaded(event),
            GlobeEvent::Export => self.export(),
            GlobeEvent::Reset => self.reset(),
            GlobeEvent::Resize { width, height } => self.resize(width, height),
            GlobeEvent::Quit => self.should_quit = true,
        }
    }

    fn rotate_to(&mut self, x: f64, y: f64) {
        let (lambda, phi) = self.drag_rotation.rotation(self.config.origin, x, y);
        self.globe.projection_mut().set_rotation(lambda, phi);
        self.globe.render();
    }

    fn zoom_to(&mut self, k: f64) {
        self.globe.projection_mut().set_scale(self.config.scale * k);
        self.globe.render();
    }

    fn hover(&mut self, point: Option<(f64, f64)>) {
        self.hovered = point.and_then(|(x, y)| {
            let strikes = self.globe.scene().strikes()?;
            strikes.hit_test(self.globe.projection(), x, y).cloned()
        });
    }

    fn loaded(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::World(Ok(features)) => {
                let count = self.globe.scene_mut().insert_countries(features);
                self.globe.render();
                self.world = LoadStatus::Loaded(count);
                info!(countries = count, "countries added to scene");
            }
            LoadEvent::World(Err(e)) => {
                error!(error = %e, "world unavailable, globe stays empty");
                self.world = LoadStatus::Failed;
            }
            LoadEvent::Strikes(Ok(strikes)) => {
                if !matches!(self.world, LoadStatus::Loaded(_)) {
                    warn!("strike data arrived before the world, ignoring");
                    return;
                }
                let count = strikes.len();
                self.globe.scene_mut().set_strikes(strikes);
                self.globe.render();
                self.strikes = LoadStatus::Loaded(count);
                info!(strikes = count, "strikes plotted");
            }
            LoadEvent::Strikes(Err(e)) => {
                error!(error = %e, "strike data unavailable");
                self.strikes = LoadStatus::Failed;
            }
        }
    }

    fn export(&mut self) {
        let path = &self.config.svg_path;
        let document = svg::document(self.globe.scene());
        self.message = Some(match fs::write(path, document) {
            Ok(()) => {
                info!(path = %path.display(), "scene exported");
                format!("saved {}", path.display())
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "svg export failed");
                format!("export failed: {e}")
            }
        });
    }

    /// Back to the initial rotation and zoom. Loaded data stays.
    fn reset(&mut self) {
        self.drag = DragAccumulator::default();
        self.zoom.set(1.0);
        let (lambda, phi) = self.config.origin;
        let projection = self.globe.projection_mut();
        projection.set_rotation(lambda, phi);
        projection.set_scale(self.config.scale);
        self.globe.render();
        self.hovered = None;
    }

    /// Update the fit when the terminal resizes. The logical canvas is
    /// unchanged, so nothing is re-rendered.
    fn resize(&mut self, width: u16, height: u16) {
        let (cols, rows) = map_cells(width, height);
        self.cols = cols;
        self.rows = rows;
        self.fit = Fit::new(self.config.width, self.config.height, cols * 2, rows * 4);
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.2}x", self.zoom.k())
    }

    pub fn rotation_label(&self) -> String {
        let (lambda, phi) = self.globe.projection().rotation();
        format!("λ {lambda:.1}° φ {phi:.1}°")
    }
}

fn map_cells(width: u16, height: u16) -> (usize, usize) {
    (
        (width as usize).saturating_sub(CHROME_COLS),
        (height as usize).saturating_sub(CHROME_ROWS),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::map::scene::tests::fixture_countries;

    fn app() -> App {
        App::new(GlobeConfig::default(), 122, 54)
    }

    fn world_failure() -> LoadEvent {
        LoadEvent::World(Err(LoadError::Topology("truncated arcs".to_string())))
    }

    fn strike(lon: f64, lat: f64) -> Strike {
        Strike {
            name: "Aachen".to_string(),
            mass: 21.0,
            year: Some("1880".to_string()),
            class: None,
            lon,
            lat,
        }
    }

    #[test]
    fn test_one_render_per_drag_move() {
        let mut app = app();
        let before = app.globe.renders();

        app.dispatch(GlobeEvent::DragStart { x: 100.0, y: 100.0 });
        assert_eq!(app.globe.renders(), before);

        for (i, x) in [120.0, 140.0, 160.0].into_iter().enumerate() {
            app.dispatch(GlobeEvent::Drag { x, y: 90.0 });
            assert_eq!(app.globe.renders(), before + i as u64 + 1);
            assert_eq!(app.globe.scene().outline().r, app.globe.projection().scale());
        }

        app.dispatch(GlobeEvent::DragEnd);
        app.dispatch(GlobeEvent::Drag { x: 500.0, y: 90.0 });
        assert_eq!(app.globe.renders(), before + 3);
    }

    #[test]
    fn test_one_render_per_zoom_event() {
        let mut app = app();
        let before = app.globe.renders();
        app.dispatch(GlobeEvent::Wheel(1.0));
        app.dispatch(GlobeEvent::Wheel(-1.0));
        app.dispatch(GlobeEvent::Nudge { dx: NUDGE_STEP, dy: 0.0 });
        assert_eq!(app.globe.renders(), before + 3);
        assert_eq!(app.globe.scene().outline().r, app.globe.projection().scale());
    }

    #[test]
    fn test_zoom_to_two_doubles_scale() {
        let mut app = app();
        app.dispatch(GlobeEvent::ZoomTo(2.0));
        assert_eq!(app.globe.projection().scale(), 500.0);
        assert_eq!(app.globe.scene().outline().r, 500.0);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut app = app();
        app.dispatch(GlobeEvent::ZoomTo(50.0));
        assert_eq!(app.globe.projection().scale(), 250.0 * 8.0);
        for _ in 0..100 {
            app.dispatch(GlobeEvent::Wheel(-1.0));
        }
        assert_eq!(app.globe.projection().scale(), 250.0 * 0.25);
    }

    #[test]
    fn test_drag_across_canvas_from_rest() {
        let mut app = app();
        app.dispatch(GlobeEvent::DragStart { x: 0.0, y: 0.0 });
        app.dispatch(GlobeEvent::Drag { x: 960.0, y: 250.0 });
        assert_eq!(app.globe.projection().rotation(), (180.0, -20.0));
    }

    #[test]
    fn test_failed_world_never_adds_countries() {
        let mut app = app();
        for _ in 0..3 {
            app.dispatch(GlobeEvent::Loaded(world_failure()));
            assert_eq!(app.globe.scene().country_count(), 0);
        }
        assert_eq!(app.world, LoadStatus::Failed);
        assert_eq!(app.strikes, LoadStatus::Pending);
        assert_eq!(app.globe.scene().shapes().len(), 1);
    }

    #[test]
    fn test_world_then_strikes() {
        let mut app = app();
        app.dispatch(GlobeEvent::Loaded(LoadEvent::World(Ok(fixture_countries()))));
        assert_eq!(app.world, LoadStatus::Loaded(3));
        assert_eq!(app.globe.scene().country_count(), 3);

        app.dispatch(GlobeEvent::Loaded(LoadEvent::Strikes(Ok(vec![strike(0.0, 20.0)]))));
        assert_eq!(app.strikes, LoadStatus::Loaded(1));
        let layer = app.globe.scene().strikes().unwrap();
        assert!(layer.markers()[0].center.is_some());
    }

    #[test]
    fn test_strikes_without_world_ignored() {
        let mut app = app();
        app.dispatch(GlobeEvent::Loaded(world_failure()));
        app.dispatch(GlobeEvent::Loaded(LoadEvent::Strikes(Ok(vec![strike(0.0, 0.0)]))));
        assert!(app.globe.scene().strikes().is_none());
        assert_eq!(app.strikes, LoadStatus::Pending);
    }

    #[test]
    fn test_hover_finds_strike_without_rendering() {
        let mut app = app();
        app.dispatch(GlobeEvent::Loaded(LoadEvent::World(Ok(fixture_countries()))));
        app.dispatch(GlobeEvent::Loaded(LoadEvent::Strikes(Ok(vec![strike(0.0, 20.0)]))));
        let renders = app.globe.renders();

        // Initial tilt puts latitude 20 at the disc centre
        app.dispatch(GlobeEvent::Hover(Some((480.0, 250.0))));
        assert_eq!(app.hovered.as_ref().map(|s| s.name.as_str()), Some("Aachen"));

        app.dispatch(GlobeEvent::Hover(Some((100.0, 100.0))));
        assert!(app.hovered.is_none());
        assert_eq!(app.globe.renders(), renders);
    }

    #[test]
    fn test_reset_restores_view() {
        let mut app = app();
        app.dispatch(GlobeEvent::Nudge { dx: 40.0, dy: 40.0 });
        app.dispatch(GlobeEvent::ZoomTo(3.0));
        app.dispatch(GlobeEvent::Reset);
        assert_eq!(app.globe.projection().rotation(), (0.0, -20.0));
        assert_eq!(app.globe.projection().scale(), 250.0);
        assert_eq!(app.zoom.k(), 1.0);
        assert_eq!((app.drag.x, app.drag.y), (0.0, 0.0));
    }

    #[test]
    fn test_cell_mapping() {
        let app = app();
        // 120x50 cells -> 240x200 pixels; width-bound fit of 960x500
        assert_eq!(app.map_size(), (120, 50));
        assert!(app.cell_to_logical(0, 10).is_none());
        assert!(app.cell_to_logical(121, 10).is_none());

        let (x, _) = app.cell_to_logical(1, 1).unwrap();
        assert!((x - 4.0).abs() < 1e-9);
        let (x, _) = app.cell_to_logical_unbounded(130, 10);
        assert!(x > 960.0);
    }

    #[test]
    fn test_resize_keeps_render_count() {
        let mut app = app();
        let renders = app.globe.renders();
        app.dispatch(GlobeEvent::Resize { width: 82, height: 30 });
        assert_eq!(app.map_size(), (80, 26));
        assert_eq!(app.globe.renders(), renders);
    }

    #[test]
    fn test_export_writes_svg() {
        let path =
            std::env::temp_dir().join(format!("meteor-globe-export-{}.svg", std::process::id()));
        let config = GlobeConfig {
            svg_path: path.clone(),
            ..GlobeConfig::default()
        };
        let mut app = App::new(config, 122, 54);
        app.dispatch(GlobeEvent::Export);

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<svg"));
        assert!(app.message.as_deref().unwrap().starts_with("saved"));
        let _ = fs::remove_file(path);
    }
}
