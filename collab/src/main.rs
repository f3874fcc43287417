//! `collab`: terminal chat for the brand/creator marketplace.
//!
//! Signs in with a bearer token issued by the relay and opens a chat view
//! over the partner list. Configuration via CLI flags, environment
//! variables, or config file (`~/.config/collab/config.toml`).
//!
//! ```bash
//! # Issue a token on the relay host
//! cargo run --bin collab-relay -- --issue-token 1
//!
//! # Connect as user 1
//! cargo run --bin collab -- --user-id 1 --token <token>
//!
//! # Or via environment variables
//! COLLAB_USER_ID=1 COLLAB_TOKEN=<token> cargo run --bin collab
//! ```

use std::io;
use std::path::Path;
use std::time::Instant;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use collab::app::App;
use collab::config::{CliArgs, ClientConfig};
use collab::net::{self, NetCommand, NetEvent};
use collab::ui;
use collab_proto::models::UserId;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > env > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("collab starting");

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &config);

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("collab exiting");
    result
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the terminal).
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("collab.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Main application loop.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &ClientConfig,
) -> io::Result<()> {
    let mut app = App::new(
        config.user_id.unwrap_or(UserId::new(0)),
        config.typing_timeout,
    )
    .with_username(config.username.clone())
    .with_timestamp_format(&config.timestamp_format);

    let (cmd_tx, mut evt_rx) = match config.to_net_config() {
        Some(net_config) => match net::spawn_net(net_config) {
            Ok((tx, rx)) => (Some(tx), Some(rx)),
            Err(e) => {
                app.push_system_message(format!("Could not start networking: {e}"));
                (None, None)
            }
        },
        None => {
            app.push_system_message("Not signed in: pass --user-id and --token to connect");
            (None, None)
        }
    };

    loop {
        // Step 1: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Step 2: Drain all pending NetEvents (non-blocking).
        if let Some(ref mut rx) = evt_rx {
            drain_net_events(&mut app, rx);
        }

        // Step 3: Tick the typing debounce.
        if let Some(cmd) = app.tick(Instant::now()) {
            dispatch(&mut app, cmd_tx.as_ref(), vec![cmd]);
        }

        // Step 4: Poll for terminal input events.
        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let commands = app.handle_key_event(key, Instant::now());
            dispatch(&mut app, cmd_tx.as_ref(), commands);
        }

        if app.should_quit {
            if let Some(ref tx) = cmd_tx {
                let _ = tx.try_send(NetCommand::Shutdown);
            }
            return Ok(());
        }
    }
}

/// Hand commands to the session task without blocking the draw loop.
fn dispatch(app: &mut App, tx: Option<&mpsc::Sender<NetCommand>>, commands: Vec<NetCommand>) {
    let Some(tx) = tx else {
        if !commands.is_empty() {
            tracing::debug!(count = commands.len(), "no session, dropping commands");
        }
        return;
    };
    for cmd in commands {
        match tx.try_send(cmd) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                app.push_system_message("Network busy, try again");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                app.push_system_message("Network disconnected");
                return;
            }
        }
    }
}

/// Drain all pending `NetEvent`s from the receiver and apply them to the app.
fn drain_net_events(app: &mut App, rx: &mut mpsc::Receiver<NetEvent>) {
    while let Ok(event) = rx.try_recv() {
        app.apply_net_event(event);
    }
}
