//! Host-side coordinator.
//!
//! `TimerApp` is the glue a UI layer talks to: it resolves durations from
//! the user's profile, drives the engine, runs startup recovery and saves
//! the session at shutdown. Persistence failures never interrupt the timer;
//! they are logged here and the app carries on.

use chrono::Utc;

use crate::engine::TimerEngine;
use crate::persistence::{PersistenceGateway, PersistenceError, ProfileStore};
use crate::recovery::{self, RecoveryOutcome};
use crate::types::{Mode, ModeDurationResolver, Session, TimerProfile};

/// Coordinates the timer engine, the profile and the snapshot gateway.
pub struct TimerApp<G> {
    engine: TimerEngine,
    gateway: G,
    profiles: ProfileStore,
    profile: TimerProfile,
}

impl<G: PersistenceGateway> TimerApp<G> {
    /// Loads the profile (falling back to defaults) and applies its policy to `engine`.
    pub async fn open(engine: TimerEngine, gateway: G, profiles: ProfileStore) -> Self {
        let profile = match profiles.load().await {
            Ok(Some(profile)) => profile,
            Ok(None) => Self::write_default_profile(&profiles).await,
            Err(err) => {
                tracing::warn!(error = %err, path = %profiles.path().display(), "profile unreadable, using defaults");
                Self::write_default_profile(&profiles).await
            }
        };
        engine.set_policy(profile.mode_switch_policy);

        Self {
            engine,
            gateway,
            profiles,
            profile,
        }
    }

    async fn write_default_profile(profiles: &ProfileStore) -> TimerProfile {
        let profile = TimerProfile::default();
        match profiles.save(&profile).await {
            Ok(written) => written,
            Err(err) => {
                tracing::warn!(error = %err, "failed to write default profile");
                profile
            }
        }
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn profile(&self) -> &TimerProfile {
        &self.profile
    }

    pub fn session(&self) -> Session {
        self.engine.session()
    }

    /// Recovers the persisted session, seeding the engine when one is restored.
    pub async fn restore(&self) -> RecoveryOutcome {
        let report = recovery::recover(&self.gateway, Utc::now()).await;

        if let Some(err) = &report.load_error {
            tracing::warn!(error = %err, "failed to read persisted session");
        }
        if let Some(err) = &report.clear_error {
            tracing::warn!(error = %err, "failed to clear persisted session");
        }

        match &report.outcome {
            RecoveryOutcome::Absent => tracing::debug!("no persisted session"),
            RecoveryOutcome::Discarded { reason } => {
                tracing::warn!(error = %reason, "discarded persisted session");
            }
            RecoveryOutcome::Restored(recovered) => {
                tracing::info!(
                    mode = recovered.session.mode().id(),
                    state = recovered.session.state().as_str(),
                    remaining = recovered.session.remaining_seconds(),
                    elapsed = recovered.elapsed_seconds,
                    "restored persisted session"
                );
                self.engine.seed(recovered.session);
            }
        }

        report.outcome
    }

    /// Starts `mode` at its profile duration and remembers it as the last selection.
    pub async fn start_mode(&mut self, mode: Mode) {
        self.engine.start(mode, self.profile.duration_for(mode));
        self.remember_mode(mode).await;
    }

    /// Starts `mode` for an explicit duration, bypassing the profile.
    pub async fn start_mode_for(&mut self, mode: Mode, duration_seconds: u32) {
        self.engine.start(mode, duration_seconds);
        self.remember_mode(mode).await;
    }

    /// Switches to `mode` following the profile's mode switch policy.
    pub async fn switch_mode(&mut self, mode: Mode) {
        self.engine.change_mode(mode, self.profile.duration_for(mode));
        self.remember_mode(mode).await;
    }

    pub fn pause(&self) -> bool {
        self.engine.pause()
    }

    pub fn resume(&self) -> bool {
        self.engine.resume()
    }

    pub fn reset(&self) {
        self.engine.reset();
    }

    /// Applies `update` to the profile and stores it.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be written; the in-memory
    /// profile is left unchanged in that case.
    pub async fn update_profile<F>(&mut self, update: F) -> Result<&TimerProfile, PersistenceError>
    where
        F: FnOnce(&mut TimerProfile),
    {
        let mut candidate = self.profile.clone();
        update(&mut candidate);
        self.profile = self.profiles.save(&candidate).await?;
        self.engine.set_policy(self.profile.mode_switch_policy);
        Ok(&self.profile)
    }

    /// Saves the session for the next launch. Returns true if a snapshot was written.
    ///
    /// Idle and Completed sessions are not worth keeping, so any older
    /// snapshot is cleared instead.
    pub async fn persist(&self) -> bool {
        match self.engine.snapshot(Utc::now()) {
            Some(snapshot) => match self.gateway.save(&snapshot).await {
                Ok(()) => {
                    tracing::debug!(remaining = snapshot.remaining_seconds, "session saved");
                    true
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to save session");
                    false
                }
            },
            None => {
                if let Err(err) = self.gateway.clear().await {
                    tracing::warn!(error = %err, "failed to clear persisted session");
                }
                false
            }
        }
    }

    async fn remember_mode(&mut self, mode: Mode) {
        if self.profile.last_selected_mode == mode {
            return;
        }
        if let Err(err) = self.update_profile(|p| p.last_selected_mode = mode).await {
            tracing::warn!(error = %err, "failed to record last selected mode");
        }
    }
}
