//! authgate - a terminal client demonstrating JWT session auth.
//!
//! Talks to an identity service for login, registration, and token
//! refresh, persists the session in a namespaced key/value store, and
//! gates the dashboard screen behind an active session.

mod api;
mod app;
mod auth;
mod config;
mod ui;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use api::ApiClient;
use app::{App, AppState, STORE_NAMESPACE};
use auth::{SessionController, SessionState, SessionStore};
use config::Config;
use ui::input::handle_input;
use ui::render::render;

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn store_path() -> PathBuf {
    Config::store_path().unwrap_or_else(|_| PathBuf::from("./store.json"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        match args[1].as_str() {
            "--login" => return cli_login().await,
            "--status" => return cli_status(),
            "--logout" => return cli_logout(),
            other => {
                eprintln!("Unknown option: {}", other);
                eprintln!("Usage: authgate [--login | --status | --logout]");
                std::process::exit(2);
            }
        }
    }

    info!("authgate starting");

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });

    let mut app = App::new(config, store_path())?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Remember the last username for the next run
    if let Err(e) = app.config.save() {
        tracing::warn!(error = %e, "Failed to save config");
    }

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("authgate shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Poll with a timeout so background auth results keep flowing
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

// ============================================================================
// CLI commands
// ============================================================================

fn cli_controller() -> Result<SessionController> {
    let store = SessionStore::new(store_path(), STORE_NAMESPACE);
    let mut controller = SessionController::new(store);
    controller.check_status()?;
    Ok(controller)
}

/// Interactive login from the terminal, bypassing the TUI
async fn cli_login() -> Result<()> {
    let mut config = Config::load().unwrap_or_default();

    let username = {
        let mut prompt = String::from("Username");
        if let Some(ref last) = config.last_username {
            prompt = format!("Username [{}]", last);
        }
        print!("{}: ", prompt);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        if input.is_empty() {
            config
                .last_username
                .clone()
                .ok_or_else(|| anyhow::anyhow!("Username required"))?
        } else {
            input.to_string()
        }
    };

    let password = rpassword::prompt_password("Password: ")?;

    println!("Authenticating...");
    let api = ApiClient::new(&config.base_url)
        .map_err(|e| anyhow::anyhow!("Failed to create API client: {}", e))?;
    let pair = api
        .login(&username, &password)
        .await
        .map_err(|e| anyhow::anyhow!("Login failed: {}", e))?;

    let mut controller = cli_controller()?;
    controller.login(&pair.access, &pair.refresh, &username)?;

    config.last_username = Some(username.clone());
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "Failed to save config");
    }

    println!("Logged in as {}", username);
    Ok(())
}

fn cli_status() -> Result<()> {
    let controller = cli_controller()?;
    match controller.state() {
        SessionState::Authenticated { username, .. } => {
            println!("Logged in as {}", username);
        }
        SessionState::Anonymous => {
            println!("Not logged in");
        }
    }
    Ok(())
}

fn cli_logout() -> Result<()> {
    let mut controller = cli_controller()?;
    let was_authenticated = controller.is_authenticated();
    controller.logout()?;
    if was_authenticated {
        println!("Logged out");
    } else {
        println!("Already logged out");
    }
    Ok(())
}
