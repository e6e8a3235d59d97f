// Binary includes library modules - some public API items are only for library consumers
#![allow(unused)]

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use serde::Deserialize;
use tracing::info;

mod app;
mod backend;
mod data;
mod events;
mod pipeline;
mod source;
mod ui;

use app::{App, Mode};
use backend::BackendHandle;
use source::{FileSource, SnapshotSource};

#[derive(Parser, Debug)]
#[command(name = "export-panel")]
#[command(about = "Interactive TUI for managing metrics export tracking")]
struct Args {
    /// Path to the state snapshot file pushed by the host
    #[arg(short, long, default_value = "snapshot.json")]
    feed: PathBuf,

    /// Connect to an exporter backend over TCP (host:port)
    #[arg(short, long, conflicts_with = "store")]
    connect: Option<String>,

    /// Persist the export configuration in a local JSON file
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Path to a settings file (TOML); EXPORT_PANEL_* env vars override it
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Snapshot file poll interval in milliseconds
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Write diagnostic logs to this file (stdout is owned by the TUI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

/// Settings loadable from a file and the environment. CLI flags win over
/// both.
#[derive(Debug, Deserialize)]
#[serde(default)]
struct Settings {
    /// Local configuration store path.
    store: PathBuf,
    /// Snapshot file poll interval in milliseconds.
    refresh_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: PathBuf::from("export_config.json"),
            refresh_ms: 100,
        }
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path.as_path()));
    }
    let config = builder
        .add_source(Environment::with_prefix("EXPORT_PANEL"))
        .build()
        .context("loading settings")?;
    Ok(config.try_deserialize().unwrap_or_default())
}

fn init_logging(path: Option<&PathBuf>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "export_panel=debug".into()),
        )
        .with_writer(file)
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let settings = load_settings(args.settings.as_ref())?;
    let refresh = Duration::from_millis(args.refresh.unwrap_or(settings.refresh_ms));

    // The TUI loop is synchronous; the runtime stays alive in the
    // background to drive the backend task.
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let backend = if let Some(ref addr) = args.connect {
        info!("using remote backend at {}", addr);
        rt.block_on(backend::remote::connect(addr))
            .with_context(|| format!("connecting to backend at {}", addr))?
    } else {
        let store = args.store.clone().unwrap_or(settings.store);
        info!("using local backend at {}", store.display());
        backend::local::spawn(store)
    };

    let source = Box::new(FileSource::new(&args.feed));
    run_tui(source, backend, refresh)
}

/// Run the TUI over the given snapshot source and backend connection
fn run_tui(
    source: Box<dyn SnapshotSource>,
    backend: BackendHandle,
    refresh: Duration,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(terminal_backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let mut app = App::new(source, backend);

    // Run the main loop
    let result = run_app(&mut terminal, &mut app, refresh);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh: Duration,
) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    // Redraw at least this often so elapsed-time displays stay current.
    const HEARTBEAT: Duration = Duration::from_secs(1);

    let mut last_draw = Instant::now() - HEARTBEAT;

    while app.running {
        app.tick(Instant::now());

        if app.dirty || last_draw.elapsed() >= HEARTBEAT {
            terminal.draw(|frame| {
                let area = frame.area();

                // Check for minimum terminal size
                if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                    let msg = format!(
                        "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                        area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                    );
                    let paragraph = ratatui::widgets::Paragraph::new(msg)
                        .alignment(ratatui::layout::Alignment::Center)
                        .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                    let centered = ratatui::layout::Rect::new(0, area.height / 2 - 2, area.width, 5);
                    frame.render_widget(paragraph, centered);
                    return;
                }

                let chunks = Layout::vertical([
                    Constraint::Length(1), // Header bar
                    Constraint::Min(8),    // Tracked entity table
                    Constraint::Length(1), // Status bar
                ])
                .split(area);

                ui::common::render_header(frame, app, chunks[0]);
                ui::table::render(frame, app, chunks[1]);
                ui::common::render_status_bar(frame, app, chunks[2]);

                // Modal overlays
                if app.mode == Mode::Search {
                    ui::search::render(frame, app, area);
                }
                if app.show_detail {
                    ui::detail::render(frame, app, area);
                }
                if app.show_help {
                    ui::common::render_help(frame, app, area);
                }
            })?;
            app.dirty = false;
            last_draw = Instant::now();
        }

        // Poll for events with a short timeout; snapshot and backend
        // polling happens on every pass through tick()
        if let Some(event) = events::poll_event(refresh.min(Duration::from_millis(100)))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key, Instant::now()),
                Event::Resize(_, _) => {
                    app.dirty = true;
                }
                _ => {}
            }
        }
    }

    Ok(())
}
