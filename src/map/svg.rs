use std::fmt::Write;

use crate::map::scene::{Scene, ShapeKind};

/// Serialize the scene as it was last rendered into a standalone SVG
/// document.
pub fn document(scene: &Scene) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = scene.width,
        h = scene.height
    );
    svg.push_str(
        "<style>.graticule-outline{fill:#0b1d3a;stroke:#4a6fa5}\
         .country{fill:#3b5b3b;stroke:#9fbf9f;stroke-width:0.5}\
         .graticule{fill:none;stroke:#7f8fa6;stroke-opacity:0.4;stroke-width:0.5}\
         .strike{fill-opacity:0.75;stroke:#111;stroke-width:0.3}</style>\n",
    );
    svg.push_str("<g>\n");

    let outline = scene.outline();
    let _ = writeln!(
        svg,
        r#"<circle class="graticule-outline" cx="{}" cy="{}" r="{}"/>"#,
        outline.cx, outline.cy, outline.r
    );

    for shape in scene.shapes() {
        let class = match shape.kind {
            ShapeKind::Country { .. } => "country",
            ShapeKind::Graticule => "graticule",
        };
        let id = match &shape.kind {
            ShapeKind::Country { id: Some(id) } => format!(r#" data-id="{}""#, escape(id)),
            _ => String::new(),
        };
        let _ = writeln!(svg, r#"<path class="{class}"{id} d="{}"/>"#, shape.d());
    }

    if let Some(strikes) = scene.strikes() {
        for (strike, marker) in strikes.strikes().iter().zip(strikes.markers()) {
            let Some((x, y)) = marker.center else {
                continue;
            };
            let (r, g, b) = strikes.color(marker.bucket);
            let _ = writeln!(
                svg,
                "<circle class=\"strike\" cx=\"{x:.3}\" cy=\"{y:.3}\" r=\"{:.3}\" \
                 fill=\"#{r:02X}{g:02X}{b:02X}\"><title>{}</title></circle>",
                marker.radius,
                escape(&strike.name)
            );
        }
    }

    svg.push_str("</g>\n</svg>\n");
    svg
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
