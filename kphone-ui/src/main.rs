//! kphone-ui - Console client for the KeplerPhone sonification service
//!
//! Loads the object and scale lists from the server, lets the user pick an
//! object, scale and speed on stdin, and plays the generated MIDI.

use std::fs::OpenOptions;
use std::io::Stdout;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use kphone_common::config::{load_config, LoggingConfig};
use kphone_common::PersistedSelection;
use kphone_ui::console::{parse_command, Command, ConsoleView};
use kphone_ui::midi_player::MidiPlayer;
use kphone_ui::{
    CatalogClient, CatalogList, Controller, ControllerSettings, UiError, UiEvent, View,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};

type App = Controller<ConsoleView<Stdout>, MidiPlayer>;

/// Command-line arguments for kphone-ui
#[derive(Parser, Debug)]
#[command(name = "kphone-ui")]
#[command(about = "Console client for the KeplerPhone sonification service")]
#[command(version)]
struct Args {
    /// Config file (overrides KPHONE_CONFIG and the platform default)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// KeplerPhone server base URL
    #[arg(short, long, env = "KPHONE_SERVER")]
    server: Option<String>,

    /// Deep link to restore, e.g. http://host/12345/blues/4 or /12345/blues/4
    #[arg(short, long)]
    link: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging settings live in the config, so the source is reported after init
    let (mut config, config_source) =
        load_config(args.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging)?;

    info!(
        "Starting KeplerPhone console (kphone-ui) v{}",
        env!("CARGO_PKG_VERSION")
    );
    config_source.log();

    if let Some(server) = args.server {
        config.server_url = server;
    }
    config.validate().context("Invalid configuration")?;
    info!(server = %config.server_url, origin = %config.origin(), "Configuration ready");

    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<UiEvent>();

    let client = CatalogClient::new(&config.server_url, config.request_timeout())
        .context("Failed to build HTTP client")?;
    let player = MidiPlayer::new(&config, events_tx.clone())
        .context("Failed to initialize MIDI player")?;
    let view = ConsoleView::new(std::io::stdout());
    let mut app: App = Controller::new(view, player, ControllerSettings::from_config(&config));

    let persisted = args.link.as_deref().and_then(|link| {
        let persisted = PersistedSelection::from_link(link);
        if persisted.is_none() {
            warn!("Deep link {} names no object, ignoring", link);
        }
        persisted
    });
    app.initialize(persisted);

    // Independent loads; either may finish first
    spawn_load(&client, CatalogList::Scales, &events_tx);
    spawn_load(&client, CatalogList::Ids, &events_tx);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(event) = events_rx.recv() => handle_event(&mut app, event),
            line = lines.next_line() => {
                match line.context("Failed to read input")? {
                    Some(line) => {
                        if !run_line(&mut app, &client, &events_tx, &line) {
                            break;
                        }
                    }
                    None => {
                        info!("Input closed, shutting down");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    app.stop();
    info!("Shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn spawn_load(client: &CatalogClient, list: CatalogList, events: &UnboundedSender<UiEvent>) {
    let client = client.clone();
    let events = events.clone();
    tokio::spawn(async move {
        client.load_into(list, &events).await;
    });
}

fn handle_event(app: &mut App, event: UiEvent) {
    match app.handle(event) {
        Ok(()) => {}
        // Not surfaced by the controller itself
        Err(e @ UiError::UnknownOption { .. }) => app.view_mut().notify(&e.to_string()),
        Err(e) => debug!("Event rejected: {}", e),
    }
}

/// Run one input line. Returns `false` when the user asked to quit.
fn run_line(
    app: &mut App,
    client: &CatalogClient,
    events: &UnboundedSender<UiEvent>,
    line: &str,
) -> bool {
    let command = match parse_command(line) {
        Ok(Some(command)) => command,
        Ok(None) => return true,
        Err(e) => {
            app.view_mut().notify(&e.to_string());
            return true;
        }
    };

    match command {
        Command::Quit => return false,
        Command::Help => app.view_mut().print_help(),
        Command::List => {
            let controls = app.controls().clone();
            app.view_mut().print_objects(&controls);
        }
        Command::Scales => {
            let controls = app.controls().clone();
            app.view_mut().print_scales(&controls);
        }
        Command::Status => {
            let selection = app.selection();
            let playback = app.playback_state();
            let share = app.share_state();
            app.view_mut().print_status(&selection, playback, share.as_ref());
        }
        Command::Retry => {
            let failed = app.failed_lists();
            if failed.is_empty() {
                app.view_mut().notify("Nothing to retry");
            }
            for list in failed {
                info!(%list, "Retrying load");
                spawn_load(client, list, events);
            }
        }
        other => match other.to_event(app.controls()) {
            Ok(Some(event)) => handle_event(app, event),
            Ok(None) => {}
            Err(e) => app.view_mut().notify(&e.to_string()),
        },
    }
    true
}
