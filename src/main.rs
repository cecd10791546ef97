use std::fs::OpenOptions;
use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use flipbot_dashboard::api::ApiClient;
use flipbot_dashboard::config::{Config, CHANNEL_CAPACITY, UI_TICK_MS};
use flipbot_dashboard::dashboard::state::{execute, Dashboard, Outcome, Request, Ticket};
use flipbot_dashboard::db::{LocalStore, SavedVehicles};
use flipbot_dashboard::error::Result;
use flipbot_dashboard::tui::{self, render::render, Command, UiState};

type Completions = mpsc::Sender<(Ticket, Outcome)>;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    let log_file = match OpenOptions::new().create(true).append(true).open(&cfg.log_file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Cannot open log file {}: {e}", cfg.log_file);
            std::process::exit(1);
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        eprintln!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let store = LocalStore::open(&cfg.store_path).await?;
    let saved = SavedVehicles::load(store).await;
    let api = ApiClient::new(&cfg.api_url, cfg.request_timeout, cfg.scrape_timeout)?;
    info!(api = %api.base_url(), saved = saved.len(), "FlipBot dashboard starting");

    let mut dash = Dashboard::new(saved);
    let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);

    for request in [Request::Deals, Request::Trending, Request::Stats] {
        spawn_request(&mut dash, &api, &tx, request);
    }

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run_loop(&mut terminal, &mut dash, &api, &tx, &mut rx).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("FlipBot dashboard stopped");
    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    dash: &mut Dashboard,
    api: &ApiClient,
    tx: &Completions,
    rx: &mut mpsc::Receiver<(Ticket, Outcome)>,
) -> Result<()> {
    let tick = Duration::from_millis(UI_TICK_MS);
    let mut ui = UiState::new();

    loop {
        terminal.draw(|f| render(f, dash, &mut ui))?;

        if event::poll(tick)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    for command in tui::handle_key(&mut ui, dash, key) {
                        match command {
                            Command::Quit => return Ok(()),
                            Command::Send(request) => spawn_request(dash, api, tx, request),
                            Command::ToggleSaved(id) => dash.toggle_saved(&id).await,
                        }
                    }
                }
            }
        }

        while let Ok((ticket, outcome)) = rx.try_recv() {
            for follow_up in dash.complete(ticket, outcome) {
                spawn_request(dash, api, tx, follow_up);
            }
        }

        dash.tick(Instant::now());
        ui.clamp_selection(dash.visible_vehicles().len());
    }
}

/// Stamp `request` on the dashboard and run it off the UI loop.
fn spawn_request(dash: &mut Dashboard, api: &ApiClient, tx: &Completions, request: Request) {
    let pending = dash.dispatch(request);
    let api = api.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let outcome = execute(&api, pending.request).await;
        if tx.send((pending.ticket, outcome)).await.is_err() {
            tracing::debug!("UI loop gone, dropping completion");
        }
    });
}
