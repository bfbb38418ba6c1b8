use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use meteor_globe::app::{App, GlobeEvent, LoadStatus, NUDGE_STEP};
use meteor_globe::config::GlobeConfig;
use meteor_globe::data::{spawn_loader, HttpFetcher, LoadEvent, LoadPlan};
use meteor_globe::ui;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_logging(&GlobeConfig::log_file_from_env());
    let config = GlobeConfig::from_env();
    info!(?config, "starting");

    // Detached on quit; its events are drained by the main loop
    let (tx, rx) = mpsc::channel();
    let _loader = spawn_loader(
        HttpFetcher::new(config.fetch_timeout),
        LoadPlan::from_config(&config),
        tx,
    )?;

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, config, rx);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Log to a file; the terminal belongs to the UI. Without a writable file
/// logging stays off.
fn init_logging(path: &Path) {
    let Ok(file) = File::create(path) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

/// Translate mouse events into globe events
fn handle_mouse(app: &App, mouse: MouseEvent) -> Option<GlobeEvent> {
    match mouse.kind {
        MouseEventKind::ScrollUp => Some(GlobeEvent::Wheel(1.0)),
        MouseEventKind::ScrollDown => Some(GlobeEvent::Wheel(-1.0)),
        MouseEventKind::Down(MouseButton::Left) => app
            .cell_to_logical(mouse.column, mouse.row)
            .map(|(x, y)| GlobeEvent::DragStart { x, y }),
        MouseEventKind::Drag(MouseButton::Left) => {
            let (x, y) = app.cell_to_logical_unbounded(mouse.column, mouse.row);
            Some(GlobeEvent::Drag { x, y })
        }
        MouseEventKind::Up(MouseButton::Left) => Some(GlobeEvent::DragEnd),
        MouseEventKind::Moved => Some(GlobeEvent::Hover(
            app.cell_to_logical(mouse.column, mouse.row),
        )),
        _ => None,
    }
}

fn handle_key(code: KeyCode) -> Option<GlobeEvent> {
    let event = match code {
        KeyCode::Char('q') | KeyCode::Esc => GlobeEvent::Quit,

        // Rotate with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => GlobeEvent::Nudge { dx: -NUDGE_STEP, dy: 0.0 },
        KeyCode::Right | KeyCode::Char('l') => GlobeEvent::Nudge { dx: NUDGE_STEP, dy: 0.0 },
        KeyCode::Up | KeyCode::Char('k') => GlobeEvent::Nudge { dx: 0.0, dy: -NUDGE_STEP },
        KeyCode::Down | KeyCode::Char('j') => GlobeEvent::Nudge { dx: 0.0, dy: NUDGE_STEP },

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => GlobeEvent::Wheel(1.0),
        KeyCode::Char('-') | KeyCode::Char('_') => GlobeEvent::Wheel(-1.0),

        KeyCode::Char('e') | KeyCode::Char('E') => GlobeEvent::Export,
        KeyCode::Char('r') | KeyCode::Char('0') => GlobeEvent::Reset,
        _ => return None,
    };
    Some(event)
}

fn run(terminal: &mut DefaultTerminal, config: GlobeConfig, rx: Receiver<LoadEvent>) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(config, size.width, size.height);

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            let globe_event = match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(key.code),
                Event::Mouse(mouse) => handle_mouse(&app, mouse),
                Event::Resize(width, height) => Some(GlobeEvent::Resize { width, height }),
                _ => None,
            };
            if let Some(globe_event) = globe_event {
                app.dispatch(globe_event);
            }
        }

        // Apply finished loads; each one is its own event
        while let Ok(load) = rx.try_recv() {
            app.dispatch(GlobeEvent::Loaded(load));
        }

        if app.should_quit {
            break;
        }
    }

    if app.world == LoadStatus::Pending {
        warn!("quit before the world finished loading");
    }
    Ok(())
}
