use geojson::feature::Id;
use geojson::{Feature, Value};
use rayon::prelude::*;

use crate::config::GlobeConfig;
use crate::map::graticule::Graticule;
use crate::map::path::{project_geometry, ProjectedPath};
use crate::map::projection::Orthographic;
use crate::map::strikes::{Strike, StrikeLayer};

/// What a path shape depicts
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Country { id: Option<String> },
    Graticule,
}

/// One path element: fixed geography plus its latest screen-space outline
#[derive(Clone, Debug)]
pub struct Shape {
    pub kind: ShapeKind,
    /// `None` for placeholder features, which draw nothing
    pub geometry: Option<Value>,
    path: ProjectedPath,
    d: String,
}

impl Shape {
    fn new(kind: ShapeKind, geometry: Option<Value>) -> Self {
        Self {
            kind,
            geometry,
            path: ProjectedPath::default(),
            d: String::new(),
        }
    }

    pub fn is_country(&self) -> bool {
        matches!(self.kind, ShapeKind::Country { .. })
    }

    /// Projected outline from the last render
    pub fn path(&self) -> &ProjectedPath {
        &self.path
    }

    /// SVG path data from the last render
    pub fn d(&self) -> &str {
        &self.d
    }

    fn reproject(&mut self, projection: &Orthographic) {
        self.path = match &self.geometry {
            Some(value) => project_geometry(value, projection),
            None => ProjectedPath::default(),
        };
        self.d = self.path.to_svg();
    }
}

/// Circle marking the edge of the visible disc
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Outline {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

/// Everything drawn on the logical canvas, in draw order: outline, path
/// shapes (countries below the graticule), then strike markers.
pub struct Scene {
    pub width: f64,
    pub height: f64,
    outline: Outline,
    shapes: Vec<Shape>,
    strikes: Option<StrikeLayer>,
}

impl Scene {
    /// Static scene: outline and graticule, no data yet.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            outline: Outline {
                cx: width / 2.0,
                cy: height / 2.0,
                r: 0.0,
            },
            shapes: vec![Shape::new(ShapeKind::Graticule, Some(Graticule::default().geometry()))],
            strikes: None,
        }
    }

    pub fn outline(&self) -> Outline {
        self.outline
    }

    /// Path shapes in draw order
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn countries(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter().filter(|s| s.is_country())
    }

    pub fn country_count(&self) -> usize {
        self.countries().count()
    }

    pub fn graticule(&self) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.kind == ShapeKind::Graticule)
    }

    pub fn strikes(&self) -> Option<&StrikeLayer> {
        self.strikes.as_ref()
    }

    /// Add one country shape per feature, directly below the graticule so
    /// grid lines stay visible over land. Returns the number inserted.
    pub fn insert_countries(&mut self, features: Vec<Feature>) -> usize {
        let at = self
            .shapes
            .iter()
            .position(|s| s.kind == ShapeKind::Graticule)
            .unwrap_or(self.shapes.len());

        let countries: Vec<Shape> = features
            .into_iter()
            .map(|f| {
                let id = f.id.map(|id| match id {
                    Id::String(s) => s,
                    Id::Number(n) => n.to_string(),
                });
                Shape::new(ShapeKind::Country { id }, f.geometry.map(|g| g.value))
            })
            .collect();

        let count = countries.len();
        self.shapes.splice(at..at, countries);
        count
    }

    pub fn set_strikes(&mut self, strikes: Vec<Strike>) {
        self.strikes = Some(StrikeLayer::new(strikes));
    }
}

/// The projection state and the scene it drives. `render` is the only place
/// screen-space geometry is computed.
pub struct Globe {
    projection: Orthographic,
    scene: Scene,
    renders: u64,
}

impl Globe {
    pub fn new(config: &GlobeConfig) -> Self {
        let projection = Orthographic::new(config.scale, (config.width / 2.0, config.height / 2.0))
            .with_rotation(config.origin.0, config.origin.1)
            .with_center(0.0, 0.0)
            .with_clip_angle(config.clip_angle);

        let mut globe = Self {
            projection,
            scene: Scene::new(config.width, config.height),
            renders: 0,
        };
        globe.render();
        globe
    }

    pub fn projection(&self) -> &Orthographic {
        &self.projection
    }

    /// Mutate the projection. Callers follow up with [`Globe::render`].
    pub fn projection_mut(&mut self) -> &mut Orthographic {
        &mut self.projection
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Number of completed renders
    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Re-project every shape, the outline radius and the strike markers
    /// from the current projection.
    pub fn render(&mut self) {
        let projection = &self.projection;
        self.scene
            .shapes
            .par_iter_mut()
            .for_each(|shape| shape.reproject(projection));

        self.scene.outline.r = projection.scale();

        if let Some(strikes) = self.scene.strikes.as_mut() {
            strikes.project(projection);
        }

        self.renders += 1;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::map::topology::tests::TWO_SQUARES;
    use crate::map::topology::Topology;

    pub(crate) fn fixture_countries() -> Vec<Feature> {
        let mut bytes = TWO_SQUARES.as_bytes().to_vec();
        Topology::from_slice(&mut bytes, "fixture")
            .unwrap()
            .features("countries")
            .unwrap()
    }

    fn globe() -> Globe {
        Globe::new(&GlobeConfig::default())
    }

    #[test]
    fn test_static_scene() {
        let g = globe();
        assert_eq!(g.renders(), 1);
        assert_eq!(g.scene().shapes().len(), 1);
        assert!(!g.scene().graticule().unwrap().d().is_empty());
        assert_eq!(
            g.scene().outline(),
            Outline { cx: 480.0, cy: 250.0, r: 250.0 }
        );
    }

    #[test]
    fn test_countries_inserted_below_graticule() {
        let mut g = globe();
        let features = fixture_countries();
        let n = features.len();
        assert_eq!(g.scene_mut().insert_countries(features), n);
        g.render();

        let shapes = g.scene().shapes();
        assert_eq!(g.scene().country_count(), n);
        let graticule_at = shapes
            .iter()
            .position(|s| s.kind == ShapeKind::Graticule)
            .unwrap();
        assert_eq!(graticule_at, n);
        assert!(shapes[..graticule_at].iter().all(Shape::is_country));
    }

    #[test]
    fn test_country_ids() {
        let mut g = globe();
        g.scene_mut().insert_countries(fixture_countries());
        let ids: Vec<_> = g
            .scene()
            .countries()
            .map(|s| s.kind.clone())
            .collect();
        assert_eq!(ids[0], ShapeKind::Country { id: Some("4".to_string()) });
        assert_eq!(ids[1], ShapeKind::Country { id: Some("008".to_string()) });
    }

    #[test]
    fn test_render_idempotent() {
        let mut g = globe();
        g.scene_mut().insert_countries(fixture_countries());
        g.render();
        let first: Vec<String> = g.scene().shapes().iter().map(|s| s.d().to_string()).collect();
        g.render();
        let second: Vec<String> = g.scene().shapes().iter().map(|s| s.d().to_string()).collect();
        assert_eq!(first, second);
        assert!(first.iter().all(|d| !d.is_empty()));
    }

    #[test]
    fn test_outline_tracks_scale() {
        let mut g = globe();
        g.projection_mut().set_scale(612.5);
        g.render();
        assert_eq!(g.scene().outline().r, 612.5);
    }

    #[test]
    fn test_rotation_changes_paths() {
        let mut g = globe();
        g.scene_mut().insert_countries(fixture_countries());
        g.render();
        let before = g.scene().shapes()[0].d().to_string();
        g.projection_mut().set_rotation(30.0, -20.0);
        g.render();
        assert_ne!(g.scene().shapes()[0].d(), before);
    }

    #[test]
    fn test_strike_markers_follow_render() {
        let mut g = globe();
        g.scene_mut().set_strikes(vec![Strike {
            name: "Aachen".to_string(),
            mass: 21.0,
            year: Some("1880".to_string()),
            class: None,
            lon: 0.0,
            lat: 20.0,
        }]);
        assert!(g.scene().strikes().unwrap().markers().is_empty());
        g.render();
        let marker = g.scene().strikes().unwrap().markers()[0];
        let (x, y) = marker.center.unwrap();
        assert!((x - 480.0).abs() < 1e-6);
        assert!((y - 250.0).abs() < 1e-6);
    }
}
