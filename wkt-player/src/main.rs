//! Workout player (wkt-player) - terminal driver
//!
//! Plays one workout from the workout library: the status line is rewritten
//! on every tick, and each Enter advances to the next phase.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use wkt_common::config::{PlayerConfig, CONFIG_ENV_VAR};
use wkt_common::store::{InMemoryWorkoutStore, WorkoutStore};
use wkt_common::ShareCode;
use wkt_player::display::{control_hint, status_line};
use wkt_player::events::{EventBus, PlaybackEvent};
use wkt_player::{PlaybackEngine, SharedPlayerState};

/// Command-line arguments for wkt-player
#[derive(Parser, Debug)]
#[command(name = "wkt-player")]
#[command(about = "Rest/work timer for workouts")]
#[command(version)]
struct Args {
    /// Config file (defaults to $WKT_CONFIG, then the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Workout library JSON document
    #[arg(short, long, env = "WKT_LIBRARY")]
    library: Option<PathBuf>,

    /// Share code of the workout to play (defaults to the first playable one)
    #[arg(short, long)]
    workout: Option<String>,

    /// List playable workouts with their share codes and exit
    #[arg(long)]
    list: bool,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, env = "WKT_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = PlayerConfig::resolve(args.config.as_deref(), CONFIG_ENV_VAR)
        .context("Failed to load configuration")?;

    // Initialize tracing (stderr, so stdout carries only the timer)
    let level = args.log_level.clone().unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("wkt_player={level},wkt_common={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let library_path = args
        .library
        .clone()
        .unwrap_or_else(|| config.library_path_or_default());
    let store = InMemoryWorkoutStore::load(&library_path)
        .with_context(|| format!("Failed to load workout library {}", library_path.display()))?;

    if args.list {
        for workout in store.list_playable() {
            println!("{}  {}", workout.share_code(), workout.name);
        }
        return Ok(());
    }

    let workout_id = select_workout(&store, args.workout.as_deref())?;

    let events = EventBus::new(config.event_capacity);
    let render_rx = events.subscribe();
    let state = Arc::new(SharedPlayerState::new());
    let listener = Arc::clone(&state).spawn_listener(events.subscribe());

    let engine = PlaybackEngine::from_store(&store, workout_id, events)
        .context("Failed to start playback")?;
    let renderer = tokio::spawn(render(render_rx));

    let mut lines = spawn_stdin_reader();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.recv() => match line {
                Some(line) => {
                    line.context("Failed to read stdin")?;
                    engine.advance();
                    if engine.is_finished() {
                        break;
                    }
                }
                None => {
                    info!("stdin closed, leaving workout");
                    break;
                }
            },
            _ = &mut shutdown => break,
        }
    }

    engine.stop();
    if let Err(e) = renderer.await {
        warn!("Renderer task failed: {}", e);
    }
    if let Err(e) = listener.await {
        warn!("State listener task failed: {}", e);
    }

    if let Some(last) = state.latest().await {
        info!(
            "Session ended at exercise {} ({}), {} ticks, {} events missed",
            last.exercise_index,
            last.phase,
            state.ticks_seen(),
            state.events_missed()
        );
    }
    Ok(())
}

/// Resolve the workout to play from a share code or the first playable entry
fn select_workout(store: &InMemoryWorkoutStore, share_code: Option<&str>) -> Result<Uuid> {
    match share_code {
        Some(code) => {
            let code: ShareCode = code.parse()?;
            match store.find_by_share_code(&code) {
                Some(workout) => Ok(workout.id),
                None => bail!("No workout with share code {}", code),
            }
        }
        None => match store.list_playable().first() {
            Some(workout) => Ok(workout.id),
            None => bail!("Workout library has no playable workouts"),
        },
    }
}

/// Forward stdin lines from a plain thread
///
/// A blocking read cannot be cancelled, so it stays off the runtime; the
/// thread is detached and does not hold up process exit.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let failed = line.is_err();
            if tx.send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

/// Rewrite the status line on every event until the session stops
async fn render(mut rx: broadcast::Receiver<PlaybackEvent>) {
    let mut stdout = std::io::stdout();
    loop {
        match rx.recv().await {
            Ok(event) => {
                let snapshot = event.snapshot();
                let hint = control_hint(snapshot).unwrap_or("");
                // \x1b[K clears what is left of a longer previous line
                let _ = write!(stdout, "\r{}  {}\x1b[K", status_line(snapshot), hint);
                let _ = stdout.flush();
                if event.is_terminal() || snapshot.finished {
                    let _ = writeln!(stdout);
                    break;
                }
            }
            Err(RecvError::Lagged(n)) => warn!("Renderer lagged, {} updates skipped", n),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, leaving workout");
        },
        _ = terminate => {
            info!("Received terminate signal, leaving workout");
        },
    }
}
