mod geometry;
pub mod graticule;
pub mod path;
pub mod projection;
pub mod renderer;
pub mod scale;
pub mod scene;
pub mod spatial;
pub mod strikes;
pub mod svg;
pub mod topology;

pub use projection::Orthographic;
pub use renderer::{render_layers, Fit, MapLayers};
pub use scene::{Globe, Scene, Shape, ShapeKind};
pub use strikes::{Strike, StrikeLayer, PALETTE};
