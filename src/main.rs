//! Sharp Timer CLI - work / rest-your-eyes / long-rest interval timer
//!
//! One countdown session at a time:
//! - 25 minutes of work
//! - 2 minutes to rest your eyes
//! - 15 minutes of long rest
//!
//! A running or paused session is saved on exit and recovered on the next
//! `run`, with the time spent in between already counted down.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{CommandFactory, Parser};

use sharp_timer::cli::{self, Cli, Commands, Display, ProfileArgs};
use sharp_timer::persistence::{default_data_dir, FileGateway, PersistenceGateway, ProfileStore};
use sharp_timer::recovery;
use sharp_timer::types::{Mode, TimerProfile};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins; otherwise `--verbose` selects debug and the default is warn.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Resolves the data directory from `--data-dir`, the environment or the platform default.
fn resolve_data_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    match flag {
        Some(dir) => Ok(dir),
        None => default_data_dir().context("could not determine a data directory"),
    }
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let Some(command) = cli.command else {
        // No command specified, show help
        Cli::command().print_help()?;
        return Ok(());
    };

    if let Commands::Completions { shell } = command {
        generate_completions(shell);
        return Ok(());
    }

    let data_dir = resolve_data_dir(cli.data_dir)?;
    tracing::debug!(dir = %data_dir.display(), "using data directory");

    match command {
        Commands::Run(args) => cli::run(&args, &data_dir).await?,
        Commands::Status => {
            let gateway = FileGateway::new(&data_dir);
            let report = recovery::peek(&gateway, Utc::now()).await;
            if let Some(err) = &report.load_error {
                tracing::warn!(error = %err, "failed to read saved session");
            }
            Display::show_status(&report.outcome);
        }
        Commands::Clear => {
            let gateway = FileGateway::new(&data_dir);
            gateway
                .clear()
                .await
                .context("failed to delete saved session")?;
            Display::show_cleared();
        }
        Commands::Profile(args) => {
            let profile = update_profile(&ProfileStore::new(&data_dir), &args).await?;
            Display::show_profile(&profile);
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Loads the profile and stores any changes requested in `args`.
async fn update_profile(store: &ProfileStore, args: &ProfileArgs) -> Result<TimerProfile> {
    let mut profile = match store.load().await {
        Ok(profile) => profile.unwrap_or_default(),
        Err(err) if err.is_bad_record() => {
            tracing::warn!(error = %err, "profile unreadable, starting from defaults");
            TimerProfile::default()
        }
        Err(err) => return Err(err).context("failed to read profile"),
    };

    if !args.has_changes() {
        return Ok(profile);
    }

    let changes = [
        (Mode::Work, args.work),
        (Mode::RestEyes, args.rest_eyes),
        (Mode::LongRest, args.long_rest),
    ];
    for (mode, minutes) in changes {
        if let Some(minutes) = minutes {
            profile.set_minutes(mode, minutes);
        }
    }
    if let Some(policy) = args.policy {
        profile.mode_switch_policy = policy;
    }

    store.save(&profile).await.context("failed to save profile")
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sharp_timer::types::ModeSwitchPolicy;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["sharp-timer"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["sharp-timer", "run"]);
        assert!(matches!(cli.command, Some(Commands::Run(_))));
    }

    #[test]
    fn test_resolve_data_dir_prefers_flag() {
        let dir = resolve_data_dir(Some(PathBuf::from("/tmp/sharp"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/sharp"));
    }

    #[tokio::test]
    async fn test_update_profile_without_changes_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());

        let profile = update_profile(&store, &ProfileArgs::default()).await.unwrap();

        assert_eq!(profile.work_minutes, 25);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_update_profile_applies_changes() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        let args = ProfileArgs {
            work: Some(50),
            long_rest: Some(30),
            policy: Some(ModeSwitchPolicy::StayIdle),
            ..ProfileArgs::default()
        };

        update_profile(&store, &args).await.unwrap();

        let stored = store.load().await.unwrap().unwrap();
        assert_eq!(stored.work_minutes, 50);
        assert_eq!(stored.rest_eyes_minutes, 2);
        assert_eq!(stored.long_rest_minutes, 30);
        assert_eq!(stored.mode_switch_policy, ModeSwitchPolicy::StayIdle);
    }

    #[tokio::test]
    async fn test_update_profile_recovers_from_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        std::fs::write(store.path(), "not json").unwrap();
        let args = ProfileArgs {
            rest_eyes: Some(4),
            ..ProfileArgs::default()
        };

        let profile = update_profile(&store, &args).await.unwrap();

        assert_eq!(profile.rest_eyes_minutes, 4);
        assert_eq!(profile.work_minutes, 25);
    }
}
