//! Foreground run loop.
//!
//! Drives a [`TimerApp`] from the terminal: timer events redraw the title,
//! single-key commands on stdin control the session and Ctrl-C or `q`
//! saves it for the next launch.

use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::app::TimerApp;
use crate::engine::{TimerEngine, TimerEvent};
use crate::persistence::{FileGateway, PersistenceGateway, ProfileStore};
use crate::recovery::RecoveryOutcome;
use crate::types::Mode;

use super::commands::RunArgs;
use super::display::Display;

// ============================================================================
// RunCommand
// ============================================================================

/// Command typed on stdin while the timer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunCommand {
    Pause,
    Resume,
    Reset,
    /// Start the current mode again from its full duration
    Restart,
    Switch(Mode),
    Quit,
}

/// Unrecognised stdin command.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown command '{0}'")]
pub struct UnknownCommand(pub String);

impl FromStr for RunCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Ok(RunCommand::Pause),
            "r" | "resume" => Ok(RunCommand::Resume),
            "x" | "reset" => Ok(RunCommand::Reset),
            "s" | "start" => Ok(RunCommand::Restart),
            "w" | "work" => Ok(RunCommand::Switch(Mode::Work)),
            "e" | "rest_eyes" => Ok(RunCommand::Switch(Mode::RestEyes)),
            "l" | "long_rest" => Ok(RunCommand::Switch(Mode::LongRest)),
            "q" | "quit" => Ok(RunCommand::Quit),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

// ============================================================================
// Run loop
// ============================================================================

/// Runs the timer in the foreground until it completes or the user quits.
///
/// # Errors
///
/// Returns an error if the engine cannot be created.
pub async fn run(args: &RunArgs, data_dir: &Path) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let engine = TimerEngine::new(event_tx).context("failed to create timer engine")?;
    engine.set_on_completion(|_session| {
        // Terminal bell.
        print!("\x07");
        let _ = std::io::stdout().flush();
    });

    let gateway = FileGateway::new(data_dir);
    let mut app = TimerApp::open(engine, gateway, ProfileStore::new(data_dir)).await;

    let resumed = if args.fresh {
        if let Err(err) = app.gateway().clear().await {
            tracing::warn!(error = %err, "failed to discard saved session");
        }
        false
    } else {
        match app.restore().await {
            RecoveryOutcome::Restored(recovered) if recovered.completed_while_away => {
                Display::show_completed_while_away(recovered.session.mode());
                false
            }
            RecoveryOutcome::Restored(recovered) if recovered.session.state().is_resumable() => {
                Display::show_restored(&recovered.session);
                true
            }
            RecoveryOutcome::Restored(_) => false,
            RecoveryOutcome::Absent | RecoveryOutcome::Discarded { .. } => false,
        }
    };

    if !resumed {
        let mode = args.mode.unwrap_or(app.profile().last_selected_mode);
        start(&mut app, mode, args.duration_override()).await;
    }

    Display::show_controls();
    Display::show_title(&app.session());

    let mut lines = spawn_stdin_reader();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            Some(event) = event_rx.recv() => {
                match event {
                    TimerEvent::Completed { mode, .. } => {
                        Display::show_completed(mode);
                        break;
                    }
                    _ => Display::show_title(&app.session()),
                }
            }
            line = lines.recv(), if stdin_open => {
                match line {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => match line.parse::<RunCommand>() {
                        Ok(RunCommand::Quit) => break,
                        Ok(command) => apply(&mut app, command).await,
                        Err(err) => Display::show_error(&err.to_string()),
                    },
                    None => {
                        stdin_open = false;
                        // Nothing can resume a stopped countdown once stdin is gone.
                        if !app.session().is_running() {
                            break;
                        }
                    }
                }
            }
            _ = &mut ctrl_c => {
                tracing::debug!("interrupted");
                break;
            }
        }
    }

    let session = app.session();
    if app.persist().await {
        Display::show_saved(&session);
    } else if !session.is_completed() {
        Display::show_not_saved();
    }
    Ok(())
}

/// Forwards stdin lines from a detached thread.
///
/// A blocking stdin read cannot be cancelled, so it must not hold up runtime
/// shutdown. The channel closes at EOF or on a read error.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to read stdin");
                    break;
                }
            }
        }
    });
    rx
}

async fn start(app: &mut TimerApp<FileGateway>, mode: Mode, duration_override: Option<u32>) {
    match duration_override {
        Some(seconds) => app.start_mode_for(mode, seconds).await,
        None => app.start_mode(mode).await,
    }
    Display::show_started(&app.session());
}

async fn apply(app: &mut TimerApp<FileGateway>, command: RunCommand) {
    match command {
        RunCommand::Pause => {
            app.pause();
        }
        RunCommand::Resume => {
            app.resume();
        }
        RunCommand::Reset => app.reset(),
        RunCommand::Restart => {
            let mode = app.session().mode();
            app.start_mode(mode).await;
        }
        RunCommand::Switch(mode) => app.switch_mode(mode).await,
        RunCommand::Quit => {}
    }
}
