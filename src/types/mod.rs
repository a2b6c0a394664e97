//! Core data types for Sharp Timer.
//!
//! This module defines the data structures used for:
//! - The mode catalog (work / rest-eyes / long-rest)
//! - The timer session and its pure state transitions
//! - The user profile that supplies per-mode durations

mod profile;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use profile::{ModeDurationResolver, ModeSwitchPolicy, TimerProfile};

// ============================================================================
// Mode
// ============================================================================

/// The three interval kinds a session can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Focused work interval
    Work,
    /// Short break to rest the eyes
    RestEyes,
    /// Long break
    LongRest,
}

impl Mode {
    /// Every mode, in menu order.
    pub const ALL: [Mode; 3] = [Mode::Work, Mode::RestEyes, Mode::LongRest];

    /// Returns the stable identifier stored in snapshots.
    pub fn id(&self) -> &'static str {
        match self {
            Mode::Work => "work",
            Mode::RestEyes => "rest_eyes",
            Mode::LongRest => "long_rest",
        }
    }

    /// Returns the human-readable name of the mode.
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Work => "Work",
            Mode::RestEyes => "Rest Your Eyes",
            Mode::LongRest => "Long Rest",
        }
    }

    /// Returns the menu-bar icon of the mode.
    pub fn icon(&self) -> &'static str {
        match self {
            Mode::Work => "💼",
            Mode::RestEyes => "👁️",
            Mode::LongRest => "🌟",
        }
    }

    /// Default duration in minutes.
    pub fn default_minutes(&self) -> u32 {
        match self {
            Mode::Work => 25,
            Mode::RestEyes => 2,
            Mode::LongRest => 15,
        }
    }

    /// Default duration in seconds.
    pub fn default_seconds(&self) -> u32 {
        self.default_minutes() * 60
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Work
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Error returned when a mode identifier is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mode '{0}' (expected work, rest_eyes or long_rest)")]
pub struct ParseModeError(pub String);

impl FromStr for Mode {
    type Err = ParseModeError;

    /// Accepts the snake_case ids plus the camelCase ids of older records.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(Mode::Work),
            "rest_eyes" | "restEyes" => Ok(Mode::RestEyes),
            "long_rest" | "longRest" => Ok(Mode::LongRest),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

// ============================================================================
// SessionState
// ============================================================================

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Reset to the full configured duration, not counting down
    Idle,
    /// Counting down
    Running,
    /// Countdown stopped, can be resumed
    Paused,
    /// Countdown reached zero
    Completed,
}

impl SessionState {
    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Paused => "paused",
            SessionState::Completed => "completed",
        }
    }

    /// Returns true for the states worth persisting across restarts.
    pub fn is_resumable(&self) -> bool {
        matches!(self, SessionState::Running | SessionState::Paused)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}

// ============================================================================
// Session
// ============================================================================

/// One timer instance: its configuration and countdown state.
///
/// Sessions are values. Every transition returns a new `Session` and never
/// performs I/O; callers are expected to check the source state first (the
/// transitions assume a valid precondition and do not fail).
///
/// Invariants kept by every constructor and transition:
/// - `configured_seconds >= 1`
/// - `remaining_seconds <= configured_seconds`
/// - `state == Idle` implies `remaining_seconds == configured_seconds`
/// - `remaining_seconds == 0` if and only if `state == Completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    mode: Mode,
    configured_seconds: u32,
    remaining_seconds: u32,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    paused_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates an idle session at full duration. A zero duration is raised to one second.
    pub fn new(mode: Mode, configured_seconds: u32) -> Self {
        let configured_seconds = configured_seconds.max(1);
        Self {
            mode,
            configured_seconds,
            remaining_seconds: configured_seconds,
            state: SessionState::Idle,
            started_at: None,
            paused_at: None,
        }
    }

    /// Rebuilds a session from persisted parts, restoring the invariants.
    ///
    /// Returns `None` when the parts cannot describe a consistent session.
    pub(crate) fn from_parts(
        mode: Mode,
        configured_seconds: u32,
        remaining_seconds: u32,
        state: SessionState,
        started_at: Option<DateTime<Utc>>,
        paused_at: Option<DateTime<Utc>>,
    ) -> Option<Self> {
        if configured_seconds == 0 || remaining_seconds > configured_seconds {
            return None;
        }

        let session = Self {
            mode,
            configured_seconds,
            remaining_seconds,
            state,
            started_at,
            paused_at,
        };

        let session = match state {
            SessionState::Idle => session.resetting(),
            SessionState::Completed => session.completing(),
            SessionState::Running | SessionState::Paused if remaining_seconds == 0 => {
                session.completing()
            }
            SessionState::Running => Self {
                paused_at: None,
                ..session
            },
            SessionState::Paused => session,
        };
        Some(session)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn configured_seconds(&self) -> u32 {
        self.configured_seconds
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn paused_at(&self) -> Option<DateTime<Utc>> {
        self.paused_at
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }

    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }

    /// Seconds already counted down in this run.
    pub fn elapsed_seconds(&self) -> u32 {
        self.configured_seconds - self.remaining_seconds
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Idle → Running. Remaining time is left untouched.
    #[must_use]
    pub fn starting(self, now: DateTime<Utc>) -> Self {
        Self {
            state: SessionState::Running,
            started_at: Some(now),
            paused_at: None,
            ..self
        }
    }

    /// Running → Paused.
    #[must_use]
    pub fn pausing(self, now: DateTime<Utc>) -> Self {
        Self {
            state: SessionState::Paused,
            paused_at: Some(now),
            ..self
        }
    }

    /// Paused → Running. Keeps the original `started_at`.
    #[must_use]
    pub fn resuming(self) -> Self {
        Self {
            state: SessionState::Running,
            paused_at: None,
            ..self
        }
    }

    /// Any state → Idle at full duration.
    #[must_use]
    pub fn resetting(self) -> Self {
        Self {
            remaining_seconds: self.configured_seconds,
            state: SessionState::Idle,
            started_at: None,
            paused_at: None,
            ..self
        }
    }

    /// Counts down by `seconds`, floored at zero. Reaching zero forces `Completed`.
    #[must_use]
    pub fn advancing(self, seconds: u32) -> Self {
        let remaining_seconds = self.remaining_seconds.saturating_sub(seconds);
        if remaining_seconds == 0 {
            return self.completing();
        }
        Self {
            remaining_seconds,
            ..self
        }
    }

    fn completing(self) -> Self {
        Self {
            remaining_seconds: 0,
            state: SessionState::Completed,
            paused_at: None,
            ..self
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new(Mode::default(), Mode::default().default_seconds())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 17, 12, 0, 0).unwrap()
    }

    fn running(configured: u32) -> Session {
        Session::new(Mode::Work, configured).starting(fixed_now())
    }

    // ------------------------------------------------------------------------
    // Mode Tests
    // ------------------------------------------------------------------------

    mod mode_tests {
        use super::*;

        #[test]
        fn test_default_minutes() {
            assert_eq!(Mode::Work.default_minutes(), 25);
            assert_eq!(Mode::RestEyes.default_minutes(), 2);
            assert_eq!(Mode::LongRest.default_minutes(), 15);
            assert_eq!(Mode::RestEyes.default_seconds(), 120);
        }

        #[test]
        fn test_id_round_trips_through_from_str() {
            for mode in Mode::ALL {
                assert_eq!(mode.id().parse::<Mode>().unwrap(), mode);
            }
        }

        #[test]
        fn test_from_str_accepts_legacy_camel_case() {
            assert_eq!("restEyes".parse::<Mode>().unwrap(), Mode::RestEyes);
            assert_eq!("longRest".parse::<Mode>().unwrap(), Mode::LongRest);
        }

        #[test]
        fn test_from_str_unknown() {
            let err = "nap".parse::<Mode>().unwrap_err();
            assert_eq!(err, ParseModeError("nap".to_string()));
            assert!(err.to_string().contains("nap"));
        }

        #[test]
        fn test_serde_uses_ids() {
            let json = serde_json::to_string(&Mode::RestEyes).unwrap();
            assert_eq!(json, "\"rest_eyes\"");
        }

        #[test]
        fn test_display() {
            assert_eq!(Mode::RestEyes.to_string(), "Rest Your Eyes");
            assert_eq!(Mode::LongRest.icon(), "🌟");
        }
    }

    // ------------------------------------------------------------------------
    // Session Tests
    // ------------------------------------------------------------------------

    mod session_tests {
        use super::*;

        #[test]
        fn test_new_session_is_idle_at_full_duration() {
            let session = Session::new(Mode::LongRest, 900);
            assert_eq!(session.state(), SessionState::Idle);
            assert_eq!(session.remaining_seconds(), 900);
            assert_eq!(session.started_at(), None);
            assert_eq!(session.paused_at(), None);
        }

        #[test]
        fn test_new_session_raises_zero_duration() {
            let session = Session::new(Mode::Work, 0);
            assert_eq!(session.configured_seconds(), 1);
            assert_eq!(session.remaining_seconds(), 1);
        }

        #[test]
        fn test_default_session() {
            let session = Session::default();
            assert_eq!(session.mode(), Mode::Work);
            assert_eq!(session.configured_seconds(), 25 * 60);
        }

        #[test]
        fn test_starting() {
            let session = Session::new(Mode::Work, 60).starting(fixed_now());
            assert_eq!(session.state(), SessionState::Running);
            assert_eq!(session.started_at(), Some(fixed_now()));
            assert_eq!(session.paused_at(), None);
            assert_eq!(session.remaining_seconds(), 60);
        }

        #[test]
        fn test_pausing_keeps_remaining() {
            let later = fixed_now() + Duration::seconds(5);
            let session = running(60).advancing(5).pausing(later);
            assert_eq!(session.state(), SessionState::Paused);
            assert_eq!(session.paused_at(), Some(later));
            assert_eq!(session.remaining_seconds(), 55);
        }

        #[test]
        fn test_resuming_keeps_started_at() {
            let later = fixed_now() + Duration::seconds(30);
            let session = running(60).pausing(later).resuming();
            assert_eq!(session.state(), SessionState::Running);
            assert_eq!(session.started_at(), Some(fixed_now()));
            assert_eq!(session.paused_at(), None);
        }

        #[test]
        fn test_resetting_from_every_state() {
            let base = running(90).advancing(30);
            let candidates = [
                Session::new(Mode::Work, 90),
                base,
                base.pausing(fixed_now()),
                base.advancing(1000),
            ];
            for session in candidates {
                let reset = session.resetting();
                assert_eq!(reset.state(), SessionState::Idle);
                assert_eq!(reset.remaining_seconds(), 90);
                assert_eq!(reset.started_at(), None);
                assert_eq!(reset.paused_at(), None);
            }
        }

        #[test]
        fn test_advancing_partial() {
            let session = running(100).advancing(30);
            assert_eq!(session.state(), SessionState::Running);
            assert_eq!(session.remaining_seconds(), 70);
            assert_eq!(session.elapsed_seconds(), 30);
        }

        #[test]
        fn test_advancing_exactly_to_zero_completes() {
            let session = running(10).advancing(10);
            assert_eq!(session.state(), SessionState::Completed);
            assert_eq!(session.remaining_seconds(), 0);
        }

        #[test]
        fn test_advancing_past_zero_floors() {
            for overshoot in [1, 7, u32::MAX - 10] {
                let session = running(10).advancing(10 + overshoot);
                assert_eq!(session.state(), SessionState::Completed);
                assert_eq!(session.remaining_seconds(), 0);
            }
        }

        #[test]
        fn test_advancing_by_zero_is_identity() {
            let session = running(10);
            assert_eq!(session.advancing(0), session);
        }
    }

    // ------------------------------------------------------------------------
    // from_parts Tests
    // ------------------------------------------------------------------------

    mod from_parts_tests {
        use super::*;

        #[test]
        fn test_rejects_remaining_above_configured() {
            let parts = Session::from_parts(
                Mode::Work,
                60,
                61,
                SessionState::Paused,
                None,
                None,
            );
            assert!(parts.is_none());
        }

        #[test]
        fn test_rejects_zero_configured() {
            assert!(Session::from_parts(Mode::Work, 0, 0, SessionState::Idle, None, None).is_none());
        }

        #[test]
        fn test_idle_is_normalised_to_full_duration() {
            let session =
                Session::from_parts(Mode::Work, 60, 20, SessionState::Idle, Some(fixed_now()), None)
                    .unwrap();
            assert_eq!(session.remaining_seconds(), 60);
            assert_eq!(session.started_at(), None);
        }

        #[test]
        fn test_running_with_zero_remaining_is_completed() {
            let session =
                Session::from_parts(Mode::Work, 60, 0, SessionState::Running, None, None).unwrap();
            assert_eq!(session.state(), SessionState::Completed);
        }

        #[test]
        fn test_paused_verbatim() {
            let session = Session::from_parts(
                Mode::RestEyes,
                120,
                42,
                SessionState::Paused,
                Some(fixed_now()),
                Some(fixed_now()),
            )
            .unwrap();
            assert_eq!(session.state(), SessionState::Paused);
            assert_eq!(session.remaining_seconds(), 42);
            assert_eq!(session.paused_at(), Some(fixed_now()));
        }
    }
}
