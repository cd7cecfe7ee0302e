mod app;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tui_polymap::config::{FileConfig, Overrides};
use tui_polymap::data;
use tui_polymap::map::{Polygon, PolygonLayer};

const LOG_FILE: &str = "tui-polymap.log";

#[derive(Parser, Debug)]
#[command(name = "tui-polymap", version, about = "Terminal viewer for filled GeoJSON polygons")]
struct Args {
    /// Config file (default: tui-polymap.toml or .tui-polymap.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory with *.geojson / *.json files
    #[arg(long)]
    data: Option<PathBuf>,

    /// Draw every polygon regardless of the viewport
    #[arg(long)]
    no_culling: bool,

    /// Draw full-resolution rings at every zoom
    #[arg(long)]
    no_simplify: bool,

    /// Skip the radial-distance pre-pass when simplifying
    #[arg(long)]
    high_quality: bool,

    /// Initial centre longitude
    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Initial centre latitude
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Initial zoom level (0-19)
    #[arg(long)]
    zoom: Option<f64>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            data_dir: self.data.clone(),
            no_culling: self.no_culling,
            no_simplify: self.no_simplify,
            high_quality: self.high_quality,
            lon: self.lon,
            lat: self.lat,
            zoom: self.zoom,
        }
    }
}

/// Log to a file only when RUST_LOG is set; the terminal belongs to the UI
fn init_tracing() -> Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }

    let file = std::fs::File::create(LOG_FILE).with_context(|| format!("failed to create {LOG_FILE}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_polygons(config: &FileConfig) -> Vec<Polygon> {
    let polygons = if config.data_dir.exists() {
        data::load_all_geojson(&config.data_dir).unwrap_or_else(|e| {
            warn!(error = %e, "failed to read data directory");
            Vec::new()
        })
    } else {
        Vec::new()
    };

    // Fall back to demo polygons if no data loaded
    if polygons.is_empty() {
        info!("no polygon data found, using demo set");
        return data::generate_demo_polygons();
    }
    polygons
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing()?;

    let mut config = FileConfig::load(args.config.as_deref()).context("failed to load config")?;
    config.apply(&args.overrides());

    let mut layer = PolygonLayer::new(load_polygons(&config), config.render);
    layer.settings = config.display.clone();

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear().context("failed to clear terminal")?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture).context("failed to enable mouse capture")?;

    let size = terminal.size()?;
    let mut app = App::new(size.width as usize, size.height as usize, layer, config.view.clone());

    // Run the app
    let result = run(&mut terminal, &mut app);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-8, 0),
        MouseEventKind::ScrollRight => app.pan(8, 0),
        // Click and drag to pan
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                            // Pan with hjkl or arrow keys
                            KeyCode::Left | KeyCode::Char('h') => app.pan(-8, 0),
                            KeyCode::Right | KeyCode::Char('l') => app.pan(8, 0),
                            KeyCode::Up | KeyCode::Char('k') => app.pan(0, -4),
                            KeyCode::Down | KeyCode::Char('j') => app.pan(0, 4),

                            // Zoom
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            // Pipeline toggles
                            KeyCode::Char('c') | KeyCode::Char('C') => app.layer.toggle_culling(),
                            KeyCode::Char('s') | KeyCode::Char('S') => app.layer.toggle_simplify(),
                            KeyCode::Char('H') => app.layer.toggle_high_quality(),

                            // Display toggles
                            KeyCode::Char('f') | KeyCode::Char('F') => app.layer.toggle_fill(),
                            KeyCode::Char('b') | KeyCode::Char('B') => app.layer.toggle_borders(),
                            KeyCode::Char('L') => app.layer.toggle_labels(),

                            // Reset view
                            KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse(app, mouse);
                }
                Event::Resize(width, height) => {
                    app.resize(width as usize, height as usize);
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
