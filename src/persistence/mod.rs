//! Persistence for Sharp Timer.
//!
//! The timer core never performs I/O itself. The host asks the engine for a
//! [`PersistenceSnapshot`] at shutdown and hands it to a
//! [`PersistenceGateway`]; at startup the recovery module reads it back.
//!
//! # Layout on disk
//!
//! ```text
//! <data dir>/sharp-timer/
//! ├── timer-state.json   ← last Running/Paused session (one-shot)
//! └── profile.json       ← per-mode durations and preferences
//! ```

mod error;
mod file;
mod profile;
pub mod snapshot;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub use error::PersistenceError;
pub use file::{default_data_dir, FileGateway, DATA_DIR_ENV, SNAPSHOT_FILE_NAME};
pub use profile::{ProfileStore, PROFILE_FILE_NAME};
pub use snapshot::{PersistenceSnapshot, MAX_REMAINING_SECONDS, SCHEMA_VERSION};

/// Durable store for the last session snapshot.
///
/// Implementations may fail; callers log failures and treat them as
/// "nothing persisted".
#[allow(async_fn_in_trait)]
pub trait PersistenceGateway {
    /// Stores `snapshot`, replacing any previous one.
    async fn save(&self, snapshot: &PersistenceSnapshot) -> Result<(), PersistenceError>;

    /// Reads the stored snapshot, if any. The result is not validated.
    async fn load(&self) -> Result<Option<PersistenceSnapshot>, PersistenceError>;

    /// Removes the stored snapshot. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<(), PersistenceError>;
}

/// In-memory gateway for tests and embedding.
///
/// Snapshots are kept as encoded JSON, so a corrupt record can be injected
/// with [`MemoryGateway::set_raw`].
#[derive(Debug, Default)]
pub struct MemoryGateway {
    stored: Mutex<Option<String>>,
    save_calls: AtomicUsize,
    load_calls: AtomicUsize,
    clear_calls: AtomicUsize,
    should_fail_save: AtomicBool,
    should_fail_load: AtomicBool,
}

impl MemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway already holding `snapshot`, bypassing validation.
    #[must_use]
    pub fn with_snapshot(snapshot: &PersistenceSnapshot) -> Self {
        let gateway = Self::new();
        gateway.set_raw(serde_json::to_string(snapshot).ok());
        gateway
    }

    /// Replaces the stored record with raw JSON (or nothing).
    pub fn set_raw(&self, raw: Option<String>) {
        *self.stored.lock().unwrap_or_else(|e| e.into_inner()) = raw;
    }

    pub fn raw(&self) -> Option<String> {
        self.stored.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_should_fail_save(&self, should_fail: bool) {
        self.should_fail_save.store(should_fail, Ordering::SeqCst);
    }

    pub fn set_should_fail_load(&self, should_fail: bool) {
        self.should_fail_load.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn save_call_count(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn load_call_count(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn clear_call_count(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    fn simulated_failure() -> PersistenceError {
        PersistenceError::io(
            "memory",
            std::io::Error::other("simulated failure"),
        )
    }
}

impl PersistenceGateway for MemoryGateway {
    async fn save(&self, snapshot: &PersistenceSnapshot) -> Result<(), PersistenceError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail_save.load(Ordering::SeqCst) {
            return Err(Self::simulated_failure());
        }
        snapshot.validate()?;
        self.set_raw(Some(snapshot.to_json()?));
        Ok(())
    }

    async fn load(&self) -> Result<Option<PersistenceSnapshot>, PersistenceError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail_load.load(Ordering::SeqCst) {
            return Err(Self::simulated_failure());
        }
        self.raw()
            .map(|raw| PersistenceSnapshot::from_json(&raw))
            .transpose()
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        self.set_raw(None);
        Ok(())
    }
}
