use crate::app::{App, LoadStatus};
use crate::braille::BrailleCanvas;
use crate::map::{render_layers, Fit, MapLayers, PALETTE};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};

const OUTLINE_COLOR: Color = Color::Rgb(74, 111, 165);
const COUNTRY_COLOR: Color = Color::Rgb(159, 191, 159);
const GRATICULE_COLOR: Color = Color::DarkGray;

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Globe
            Constraint::Length(1), // Tooltip
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0]);
    render_tooltip(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Meteorite Strikes ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Braille gives 2x4 resolution per character
    let cols = inner.width as usize;
    let rows = inner.height as usize;
    let scene = app.globe.scene();
    let fit = Fit::new(scene.width, scene.height, cols * 2, rows * 4);
    let layers = render_layers(scene, &fit, cols, rows);

    frame.render_widget(MapWidget { layers }, inner);
}

/// Braille globe, one colour per layer
struct MapWidget {
    layers: MapLayers,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (col, row, ch) in canvas.glyphs() {
            if col >= area.width as usize || row >= area.height as usize {
                continue;
            }
            let x = area.x + col as u16;
            let y = area.y + row as u16;
            buf[(x, y)].set_char(ch).set_fg(color);
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front, matching the scene's draw order
        Self::render_layer(&self.layers.outline, OUTLINE_COLOR, area, buf);
        Self::render_layer(&self.layers.countries, COUNTRY_COLOR, area, buf);
        Self::render_layer(&self.layers.graticule, GRATICULE_COLOR, area, buf);

        // Heavier strikes last so they stay on top
        for (canvas, &(r, g, b)) in self.layers.strikes.iter().zip(PALETTE.iter()) {
            Self::render_layer(canvas, Color::Rgb(r, g, b), area, buf);
        }
    }
}

fn render_tooltip(frame: &mut Frame, app: &App, area: Rect) {
    let line = match (&app.hovered, &app.message) {
        (Some(strike), _) => {
            let mut spans = vec![
                Span::styled(" ☄ ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    strike.name.clone(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  {} g", strike.mass), Style::default().fg(Color::Cyan)),
            ];
            if let Some(year) = &strike.year {
                spans.push(Span::styled(
                    format!("  {year}"),
                    Style::default().fg(Color::Magenta),
                ));
            }
            if let Some(class) = &strike.class {
                spans.push(Span::styled(
                    format!("  {class}"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            Line::from(spans)
        }
        (None, Some(message)) => Line::from(Span::styled(
            format!(" {message}"),
            Style::default().fg(Color::Green),
        )),
        (None, None) => Line::default(),
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status_color = |failed: bool| if failed { Color::Red } else { Color::Green };

    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.rotation_label(), Style::default().fg(Color::Cyan)),
        Span::styled(" | countries: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.world.label(),
            Style::default().fg(status_color(app.world == LoadStatus::Failed)),
        ),
        Span::styled(" strikes: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.strikes.label(),
            Style::default().fg(status_color(app.strikes == LoadStatus::Failed)),
        ),
        Span::styled(
            " | drag/hjkl:rotate +/-:zoom e:svg r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(status);
    frame.render_widget(paragraph, area);
}
