//! Command definitions for the Sharp Timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::{Mode, ModeSwitchPolicy};

// ============================================================================
// CLI Structure
// ============================================================================

/// Sharp Timer - work / rest-eyes / long-rest interval timer
#[derive(Parser, Debug)]
#[command(
    name = "sharp-timer",
    version,
    about = "Work, rest-your-eyes and long-rest interval timer",
    long_about = "A single-session interval timer.\n\
                  Running or paused sessions are saved on exit and picked up again on the next run,\n\
                  accounting for the time that passed in between.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding timer state (defaults to $SHARP_TIMER_DATA_DIR or the user data dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the timer in the foreground, resuming a saved session if there is one
    Run(RunArgs),

    /// Show the saved session as it would be restored now
    Status,

    /// Delete the saved session
    Clear,

    /// Show or change the per-mode durations
    Profile(ProfileArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Run Command Arguments
// ============================================================================

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Mode to start: work, rest_eyes or long_rest (defaults to the last one used)
    #[arg(short, long, value_parser = parse_mode)]
    pub mode: Option<Mode>,

    /// Duration in minutes, overriding the profile (1-240)
    #[arg(
        short = 't',
        long,
        value_parser = clap::value_parser!(u32).range(1..=240)
    )]
    pub minutes: Option<u32>,

    /// Duration in seconds, overriding --minutes
    #[arg(long, hide = true, value_parser = clap::value_parser!(u32).range(1..))]
    pub seconds: Option<u32>,

    /// Ignore and discard any saved session
    #[arg(short, long)]
    pub fresh: bool,
}

impl RunArgs {
    /// Explicit duration requested on the command line, in seconds.
    pub fn duration_override(&self) -> Option<u32> {
        self.seconds.or(self.minutes.map(|m| m * 60))
    }
}

// ============================================================================
// Profile Command Arguments
// ============================================================================

/// Arguments for the profile command
#[derive(Args, Debug, Clone, Default)]
pub struct ProfileArgs {
    /// Work duration in minutes (1-240)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=240))]
    pub work: Option<u32>,

    /// Rest-your-eyes duration in minutes (1-240)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=240))]
    pub rest_eyes: Option<u32>,

    /// Long rest duration in minutes (1-240)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=240))]
    pub long_rest: Option<u32>,

    /// What a mode switch does while running: continue or idle
    #[arg(short, long, value_parser = parse_policy)]
    pub policy: Option<ModeSwitchPolicy>,
}

impl ProfileArgs {
    /// Returns true if any setting is being changed.
    pub fn has_changes(&self) -> bool {
        self.work.is_some()
            || self.rest_eyes.is_some()
            || self.long_rest.is_some()
            || self.policy.is_some()
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

fn parse_mode(s: &str) -> Result<Mode, String> {
    s.parse::<Mode>().map_err(|e| e.to_string())
}

fn parse_policy(s: &str) -> Result<ModeSwitchPolicy, String> {
    match s {
        "continue" => Ok(ModeSwitchPolicy::ContinueRunning),
        "idle" => Ok(ModeSwitchPolicy::StayIdle),
        other => Err(format!("unknown policy '{other}' (expected continue or idle)")),
    }
}

// ============================================================================
// Tests
// ============================================================================
