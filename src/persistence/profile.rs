//! Profile storage.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::types::TimerProfile;

use super::file::{read_optional, write_atomic};
use super::PersistenceError;

/// File name of the persisted profile.
pub const PROFILE_FILE_NAME: &str = "profile.json";

/// Reads and writes `profile.json` in a data directory.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(PROFILE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored profile, clamped into valid ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub async fn load(&self) -> Result<Option<TimerProfile>, PersistenceError> {
        let Some(raw) = read_optional(&self.path).await? else {
            return Ok(None);
        };
        let profile: TimerProfile =
            serde_json::from_str(&raw).map_err(|source| PersistenceError::Decode {
                what: "timer profile",
                source,
            })?;
        Ok(Some(profile.validating()))
    }

    /// Validates, stamps and stores `profile`, returning what was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, profile: &TimerProfile) -> Result<TimerProfile, PersistenceError> {
        let mut validated = profile.validating();
        validated.updated_at = Utc::now();

        let json =
            serde_json::to_string_pretty(&validated).map_err(|source| PersistenceError::Encode {
                what: "timer profile",
                source,
            })?;
        write_atomic(&self.path, &json).await?;
        Ok(validated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Mode, ModeSwitchPolicy};

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());

        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        let profile = TimerProfile {
            work_minutes: 30,
            rest_eyes_minutes: 5,
            long_rest_minutes: 20,
            last_selected_mode: Mode::LongRest,
            mode_switch_policy: ModeSwitchPolicy::StayIdle,
            ..TimerProfile::default()
        };

        let written = store.save(&profile).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();

        assert_eq!(loaded, written);
        assert_eq!(loaded.work_minutes, 30);
        assert_eq!(loaded.last_selected_mode, Mode::LongRest);
        assert_eq!(loaded.mode_switch_policy, ModeSwitchPolicy::StayIdle);
    }

    #[tokio::test]
    async fn test_save_clamps_durations() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        let profile = TimerProfile {
            work_minutes: 1000,
            ..TimerProfile::default()
        };

        let written = store.save(&profile).await.unwrap();

        assert_eq!(written.work_minutes, 240);
    }

    #[tokio::test]
    async fn test_load_clamps_hand_edited_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        std::fs::write(store.path(), r#"{"workMinutes": 0, "restEyesMinutes": 3}"#).unwrap();

        let loaded = store.load().await.unwrap().unwrap();

        assert_eq!(loaded.work_minutes, 1);
        assert_eq!(loaded.rest_eyes_minutes, 3);
        assert_eq!(loaded.long_rest_minutes, 15);
    }

    #[tokio::test]
    async fn test_load_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProfileStore::new(dir.path());
        std::fs::write(store.path(), "[]").unwrap();

        assert!(store.load().await.unwrap_err().is_bad_record());
    }
}
