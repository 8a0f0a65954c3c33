mod app;
mod config;
mod dashboard;
mod event;
mod server;
mod source;
mod status;
mod ui;
mod util;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::App;
use config::{Command, Config};
use dashboard::Dashboard;
use source::sqlite::SqliteSource;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let config = Config::parse();

    match &config.command {
        Some(Command::Serve { db, bind }) => {
            init_stderr_logging();
            let source = SqliteSource::open(db)
                .wrap_err_with(|| format!("failed to open {}", db.display()))?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(Arc::new(source), config.alert_limit, *bind))
        }
        None => run_monitor(&config),
    }
}

fn run_monitor(config: &Config) -> color_eyre::Result<()> {
    init_file_logging(&config.log_file)?;

    // Everything that can fail at startup happens before the terminal
    // switches to raw mode, so errors print normally.
    let settings = config.dashboard_settings()?;
    let source = config.open_source()?;
    let dashboard =
        Dashboard::connect(source, settings).wrap_err("failed to load initial dashboard data")?;
    info!(
        source = %dashboard.source_label(),
        refresh_ms = config.refresh_rate,
        "monitor starting"
    );
    let mut app = App::new(dashboard, config.refresh_interval());

    let mut terminal = ratatui::init();
    in_session(
        || execute!(std::io::stdout(), EnableMouseCapture),
        || app.run(&mut terminal),
        || {
            let _ = execute!(std::io::stdout(), DisableMouseCapture);
            ratatui::restore();
        },
    )
}

/// Runs `body` between `enter` and `leave`. `leave` runs on every path,
/// including a failed `enter`, since raw mode is already on by then.
fn in_session<T>(
    enter: impl FnOnce() -> std::io::Result<()>,
    body: impl FnOnce() -> color_eyre::Result<T>,
    leave: impl FnOnce(),
) -> color_eyre::Result<T> {
    let result = enter()
        .map_err(color_eyre::Report::from)
        .and_then(|()| body());
    leave();
    result
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

// The terminal UI owns stdout, so the monitor logs to a file.
fn init_file_logging(path: &Path) -> color_eyre::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("failed to open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}
