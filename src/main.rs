use anyhow::Result;
use clap::Parser;

mod app;
mod client;
mod config;
mod handler;
mod logging;
mod message;
mod tui;
mod ui;

use app::App;
use client::BackendClient;
use config::Config;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "sqlchat")]
#[command(about = "Chat with a natural-language-to-SQL translation service", version)]
struct Cli {
    /// Backend endpoint URL (overrides SQLCHAT_ENDPOINT and the config file)
    #[arg(long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing config file falls back to defaults inside load(); a corrupt
    // one is a real error and aborts startup
    let config = Config::load()?;
    let endpoint = config.resolve_endpoint(cli.endpoint.as_deref());

    logging::init()?;
    tracing::info!(%endpoint, "starting sqlchat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let app = App::new(BackendClient::new(&endpoint));
    let result = run(&mut terminal, app).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, mut app: App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        // Reap a finished request before drawing; tick events guarantee this
        // runs even when the user is idle
        app.poll_pending().await;

        terminal.draw(|frame| ui::draw(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event),
            None => break,
        }
    }

    tracing::info!("session ended");
    Ok(())
}
