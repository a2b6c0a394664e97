//! User-configured durations and mode switching behaviour.
//!
//! The profile is persisted separately from any running session. Missing
//! fields fall back to their defaults so older profile files keep loading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Mode;

/// Shortest duration a mode can be configured to, in minutes.
pub const MIN_MINUTES: u32 = 1;

/// Longest duration a mode can be configured to, in minutes.
pub const MAX_MINUTES: u32 = 240;

/// Supplies the configured duration for a mode.
pub trait ModeDurationResolver {
    /// Returns the full duration of `mode` in seconds.
    fn duration_for(&self, mode: Mode) -> u32;
}

/// What happens to a running countdown when the user switches modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSwitchPolicy {
    /// Start the new mode at full duration and keep counting down
    #[default]
    ContinueRunning,
    /// Select the new mode but leave it idle until started
    StayIdle,
}

impl ModeSwitchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeSwitchPolicy::ContinueRunning => "continue",
            ModeSwitchPolicy::StayIdle => "idle",
        }
    }
}

fn default_work_minutes() -> u32 {
    Mode::Work.default_minutes()
}

fn default_rest_eyes_minutes() -> u32 {
    Mode::RestEyes.default_minutes()
}

fn default_long_rest_minutes() -> u32 {
    Mode::LongRest.default_minutes()
}

/// Per-mode durations and preferences chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerProfile {
    /// Work duration in minutes (1-240)
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    /// Rest-eyes duration in minutes (1-240)
    #[serde(default = "default_rest_eyes_minutes")]
    pub rest_eyes_minutes: u32,
    /// Long rest duration in minutes (1-240)
    #[serde(default = "default_long_rest_minutes")]
    pub long_rest_minutes: u32,
    /// Mode most recently started by the user
    #[serde(default)]
    pub last_selected_mode: Mode,
    /// Behaviour of a mode switch while running
    #[serde(default)]
    pub mode_switch_policy: ModeSwitchPolicy,
    /// Last time the profile was written
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Default for TimerProfile {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            rest_eyes_minutes: default_rest_eyes_minutes(),
            long_rest_minutes: default_long_rest_minutes(),
            last_selected_mode: Mode::Work,
            mode_switch_policy: ModeSwitchPolicy::default(),
            updated_at: Utc::now(),
        }
    }
}

impl TimerProfile {
    /// Returns the configured minutes for `mode`.
    pub fn minutes_for(&self, mode: Mode) -> u32 {
        match mode {
            Mode::Work => self.work_minutes,
            Mode::RestEyes => self.rest_eyes_minutes,
            Mode::LongRest => self.long_rest_minutes,
        }
    }

    /// Sets the minutes for `mode`. Call [`TimerProfile::validating`] before saving.
    pub fn set_minutes(&mut self, mode: Mode, minutes: u32) {
        match mode {
            Mode::Work => self.work_minutes = minutes,
            Mode::RestEyes => self.rest_eyes_minutes = minutes,
            Mode::LongRest => self.long_rest_minutes = minutes,
        }
    }

    /// Returns a copy with every duration clamped into the supported range.
    #[must_use]
    pub fn validating(&self) -> Self {
        let clamp = |minutes: u32| minutes.clamp(MIN_MINUTES, MAX_MINUTES);
        Self {
            work_minutes: clamp(self.work_minutes),
            rest_eyes_minutes: clamp(self.rest_eyes_minutes),
            long_rest_minutes: clamp(self.long_rest_minutes),
            ..self.clone()
        }
    }
}

impl ModeDurationResolver for TimerProfile {
    fn duration_for(&self, mode: Mode) -> u32 {
        self.minutes_for(mode).clamp(MIN_MINUTES, MAX_MINUTES) * 60
    }
}
