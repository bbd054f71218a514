use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod app;
mod backend;
mod config;
mod conversation;
mod error;
mod handler;
mod tui;
mod ui;

use app::App;
use backend::BackendClient;
use config::Config;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "sanchai")]
#[command(version, about = "Terminal chat client for the SanchAI weather assistant")]
struct Cli {
    /// Chat endpoint of the answering service
    #[arg(short, long, env = "SANCHAI_ENDPOINT")]
    endpoint: Option<String>,

    /// Remember the resolved endpoint in the config file
    #[arg(long)]
    save_config: bool,

    /// Where to write logs (the terminal belongs to the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = match cli.log_file {
        Some(path) => path,
        None => default_log_path()?,
    };
    init_logging(&log_path)?;

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not read config, using defaults");
        Config::default()
    });
    let endpoint = config.resolve_endpoint(cli.endpoint.as_deref());

    if cli.save_config {
        let saved = Config {
            endpoint: Some(endpoint.clone()),
            ..config.clone()
        };
        let path = saved.save()?;
        info!(path = %path.display(), "saved config");
    }

    let client = BackendClient::new(&endpoint)?;
    info!(endpoint = client.endpoint(), "starting chat client");

    let mut events = EventHandler::new(Duration::from_millis(config.tick_rate_ms.max(16)));
    let mut app = App::new(Arc::new(client), endpoint, events.sender());
    app.check_health();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;

    info!("exiting");
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await,
            None => break,
        }
    }
    Ok(())
}

fn default_log_path() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;
    Ok(data_dir.join("sanchai").join("sanchai.log"))
}

fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sanchai=info")))
        .try_init()?;

    Ok(())
}
