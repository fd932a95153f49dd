mod app;
mod backend;
mod config;
mod handler;
mod interviewer;
mod tui;
mod ui;

use std::sync::Arc;
use anyhow::{Result, anyhow};
use tracing::{error, info};
use crate::app::App;
use crate::backend::BackendClient;
use crate::config::Config;
use crate::interviewer::ScriptedInterviewer;
use crate::tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging()?;

    let config = Config::load().unwrap_or_else(|_| Config::new());

    // Environment variables override the config file
    let mut settings = config.backend.clone().unwrap_or_default();
    if let Ok(project_id) = std::env::var("INTERVIEW_PROJECT_ID") {
        settings.project_id = project_id;
    }
    if let Ok(api_key) = std::env::var("INTERVIEW_API_KEY") {
        settings.api_key = api_key;
    }
    let backend = BackendClient::initialize(&settings)?;

    let interviewer = Arc::new(ScriptedInterviewer::new(
        config.interview_kind.as_deref().unwrap_or("general"),
        config.think_delay(),
    ));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(&config, interviewer, backend, events.sender());

    let result = run(&mut terminal, &mut events, &mut app).await;

    app.shutdown();
    // Keep the run loop's error if restore fails too; the restore failure
    // only goes to the log
    if let Err(e) = tui::restore() {
        error!("terminal restore failed: {e}");
    }
    result
}

async fn run(terminal: &mut tui::Tui, events: &mut EventHandler, app: &mut App) -> Result<()> {
    info!("entering main loop");
    loop {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => return Ok(()),
        }

        if app.should_quit {
            info!("quitting");
            return Ok(());
        }
    }
}

/// Logging goes to a file under the config directory; the terminal itself
/// belongs to ratatui
fn init_logging() -> Result<()> {
    let log_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("interview-cli");
    std::fs::create_dir_all(&log_dir)?;
    let log_file = std::fs::File::create(log_dir.join("interview.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();

    Ok(())
}
