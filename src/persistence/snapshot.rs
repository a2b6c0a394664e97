//! Durable projection of a timer session.
//!
//! Snapshots are written as camelCase JSON. Version 1 records predate the
//! explicit `state` field (they carry `isRunning`) and may omit
//! `configuredSeconds`; they are upgraded while decoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Mode, Session, SessionState};

use super::PersistenceError;

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 2;

/// Oldest schema version this build can read.
pub const MIN_SCHEMA_VERSION: u32 = 1;

/// Smallest remaining time worth persisting, in seconds.
pub const MIN_REMAINING_SECONDS: u32 = 1;

/// Largest remaining time accepted in a snapshot (one hour).
pub const MAX_REMAINING_SECONDS: u32 = 3600;

/// Snapshot of a session plus the time it was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SnapshotRecord")]
pub struct PersistenceSnapshot {
    pub mode_id: String,
    pub configured_seconds: u32,
    pub remaining_seconds: u32,
    pub state: SessionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<DateTime<Utc>>,
    pub saved_at: DateTime<Utc>,
    pub schema_version: u32,
}

impl PersistenceSnapshot {
    /// Captures `session` at `saved_at`.
    ///
    /// Returns `None` for sessions not worth persisting: Idle and Completed
    /// ones, and any whose snapshot would fail validation.
    pub fn capture(session: &Session, saved_at: DateTime<Utc>) -> Option<Self> {
        if !session.state().is_resumable() {
            return None;
        }

        let snapshot = Self {
            mode_id: session.mode().id().to_string(),
            configured_seconds: session.configured_seconds(),
            remaining_seconds: session.remaining_seconds(),
            state: session.state(),
            started_at: session.started_at(),
            paused_at: session.paused_at(),
            saved_at,
            schema_version: SCHEMA_VERSION,
        };
        snapshot.is_valid().then_some(snapshot)
    }

    /// Remaining time within `[1, 3600]` and a readable schema version.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Like [`PersistenceSnapshot::is_valid`], explaining the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::UnsupportedSchema`] or
    /// [`PersistenceError::InvalidSnapshot`].
    pub fn validate(&self) -> Result<(), PersistenceError> {
        if !(MIN_SCHEMA_VERSION..=SCHEMA_VERSION).contains(&self.schema_version) {
            return Err(PersistenceError::UnsupportedSchema {
                found: self.schema_version,
                min: MIN_SCHEMA_VERSION,
                max: SCHEMA_VERSION,
            });
        }
        if !(MIN_REMAINING_SECONDS..=MAX_REMAINING_SECONDS).contains(&self.remaining_seconds) {
            return Err(PersistenceError::InvalidSnapshot(format!(
                "remaining {}s outside {MIN_REMAINING_SECONDS}..={MAX_REMAINING_SECONDS}",
                self.remaining_seconds
            )));
        }
        Ok(())
    }

    /// Reconstructs the session exactly as it was saved.
    ///
    /// # Errors
    ///
    /// Fails when the snapshot is invalid, names an unknown mode, or
    /// describes an inconsistent session.
    pub fn to_session(&self) -> Result<Session, PersistenceError> {
        self.validate()?;

        let mode: Mode = self
            .mode_id
            .parse()
            .map_err(|e: crate::types::ParseModeError| {
                PersistenceError::InvalidSnapshot(e.to_string())
            })?;

        Session::from_parts(
            mode,
            self.configured_seconds,
            self.remaining_seconds,
            self.state,
            self.started_at,
            self.paused_at,
        )
        .ok_or_else(|| {
            PersistenceError::InvalidSnapshot(format!(
                "remaining {}s exceeds configured {}s",
                self.remaining_seconds, self.configured_seconds
            ))
        })
    }

    /// Encodes the snapshot as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Encode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        serde_json::to_string_pretty(self).map_err(|source| PersistenceError::Encode {
            what: "timer snapshot",
            source,
        })
    }

    /// Decodes a snapshot from JSON without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Decode`] for malformed input.
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        serde_json::from_str(json).map_err(|source| PersistenceError::Decode {
            what: "timer snapshot",
            source,
        })
    }
}

fn legacy_schema_version() -> u32 {
    MIN_SCHEMA_VERSION
}

/// Wire form accepted on read, covering every readable schema version.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRecord {
    #[serde(alias = "modeID")]
    mode_id: String,
    #[serde(default)]
    configured_seconds: Option<u32>,
    remaining_seconds: u32,
    #[serde(default)]
    state: Option<SessionState>,
    #[serde(default)]
    is_running: Option<bool>,
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    paused_at: Option<DateTime<Utc>>,
    saved_at: DateTime<Utc>,
    #[serde(default = "legacy_schema_version")]
    schema_version: u32,
}

impl From<SnapshotRecord> for PersistenceSnapshot {
    fn from(record: SnapshotRecord) -> Self {
        let state = record.state.unwrap_or(match record.is_running {
            Some(true) => SessionState::Running,
            _ => SessionState::Paused,
        });

        Self {
            mode_id: record.mode_id,
            configured_seconds: record.configured_seconds.unwrap_or(record.remaining_seconds),
            remaining_seconds: record.remaining_seconds,
            state,
            started_at: record.started_at,
            paused_at: record.paused_at,
            saved_at: record.saved_at,
            schema_version: record.schema_version,
        }
    }
}
