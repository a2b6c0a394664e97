//! Display utilities for the Sharp Timer CLI.
//!
//! This module provides formatted output for:
//! - The live menu-bar style title
//! - Session transitions and completion
//! - Saved session status and the profile
//! - Error messages

use std::io::Write;

use crate::recovery::RecoveryOutcome;
use crate::types::{Mode, ModeDurationResolver, Session, SessionState, TimerProfile};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Formats seconds as zero-padded `MM:SS`.
    pub fn format_time(total_seconds: u32) -> String {
        format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
    }

    /// Menu-bar title for a session, e.g. `💼 24:59`.
    pub fn title(session: &Session) -> String {
        format!(
            "{} {}",
            session.mode().icon(),
            Self::format_time(session.remaining_seconds())
        )
    }

    /// Human-readable state label.
    pub fn state_label(state: SessionState) -> &'static str {
        match state {
            SessionState::Idle => "Idle",
            SessionState::Running => "Running",
            SessionState::Paused => "Paused",
            SessionState::Completed => "Completed",
        }
    }

    /// Redraws the live title line in place.
    pub fn show_title(session: &Session) {
        let suffix = match session.state() {
            SessionState::Paused => " (paused)",
            SessionState::Idle => " (idle)",
            _ => "",
        };
        print!("\r{}{}    ", Self::title(session), suffix);
        let _ = std::io::stdout().flush();
    }

    /// Shows the key bindings of the run loop.
    pub fn show_controls() {
        println!("Controls: [p]ause [r]esume [x] reset [s]tart again  [w]ork r[e]st-eyes [l]ong-rest  [q]uit");
    }

    pub fn show_started(session: &Session) {
        println!(
            "> {} started ({})",
            session.mode().display_name(),
            Self::format_time(session.configured_seconds())
        );
    }

    pub fn show_restored(session: &Session) {
        println!(
            "> Restored {} session, {} ({} left)",
            session.mode().display_name(),
            Self::state_label(session.state()).to_lowercase(),
            Self::format_time(session.remaining_seconds())
        );
    }

    pub fn show_completed_while_away(mode: Mode) {
        println!("* {} finished while Sharp Timer was closed", mode.display_name());
    }

    pub fn show_completed(mode: Mode) {
        println!("\n* {} complete", mode.display_name());
    }

    pub fn show_saved(session: &Session) {
        println!(
            "\n[] Session saved with {} left",
            Self::format_time(session.remaining_seconds())
        );
    }

    pub fn show_not_saved() {
        println!("\n[] Nothing to save");
    }

    pub fn show_cleared() {
        println!("[] Saved session deleted");
    }

    /// Shows what recovery would produce right now.
    pub fn show_status(outcome: &RecoveryOutcome) {
        println!("Sharp Timer status");
        println!("─────────────────────────────");

        match outcome {
            RecoveryOutcome::Absent => println!("No saved session"),
            RecoveryOutcome::Discarded { reason } => {
                println!("Saved session is unusable and will be discarded");
                println!("Reason: {}", reason);
            }
            RecoveryOutcome::Restored(recovered) => {
                let session = &recovered.session;
                println!("Mode: {} {}", session.mode().icon(), session.mode().display_name());
                println!("State: {}", Self::state_label(session.state()));
                println!("Remaining: {}", Self::format_time(session.remaining_seconds()));
                println!("Duration: {}", Self::format_time(session.configured_seconds()));
                if recovered.completed_while_away {
                    println!("Finished while closed");
                }
            }
        }
    }

    pub fn show_profile(profile: &TimerProfile) {
        println!("Sharp Timer profile");
        println!("─────────────────────────────");
        for mode in Mode::ALL {
            println!(
                "{} {:<15} {:>3} min",
                mode.icon(),
                mode.display_name(),
                profile.duration_for(mode) / 60
            );
        }
        println!("Last mode: {}", profile.last_selected_mode.display_name());
        println!("On mode switch: {}", profile.mode_switch_policy.as_str());
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }
}

// ============================================================================
// Tests
// ============================================================================
