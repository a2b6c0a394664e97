//! JSON file gateway.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{PersistenceError, PersistenceGateway, PersistenceSnapshot};

/// File name of the persisted session snapshot.
pub const SNAPSHOT_FILE_NAME: &str = "timer-state.json";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "SHARP_TIMER_DATA_DIR";

/// Resolves the data directory: `$SHARP_TIMER_DATA_DIR`, else `<data dir>/sharp-timer`.
///
/// # Errors
///
/// Returns [`PersistenceError::NoDataDir`] when neither is available.
pub fn default_data_dir() -> Result<PathBuf, PersistenceError> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|dir| dir.join("sharp-timer"))
        .ok_or(PersistenceError::NoDataDir)
}

/// Writes `contents` to `path` via a sibling temp file and a rename.
pub(super) async fn write_atomic(path: &Path, contents: &str) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PersistenceError::io(parent, e))?;
    }

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, contents)
        .await
        .map_err(|e| PersistenceError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| PersistenceError::io(path, e))
}

/// Reads `path`, mapping a missing file to `None`.
pub(super) async fn read_optional(path: &Path) -> Result<Option<String>, PersistenceError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PersistenceError::io(path, e)),
    }
}

/// Gateway storing the snapshot as `timer-state.json` in a directory.
#[derive(Debug, Clone)]
pub struct FileGateway {
    dir: PathBuf,
}

impl FileGateway {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates a gateway in [`default_data_dir`].
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::NoDataDir`] if no directory can be resolved.
    pub fn from_default_dir() -> Result<Self, PersistenceError> {
        default_data_dir().map(Self::new)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE_NAME)
    }
}

impl PersistenceGateway for FileGateway {
    async fn save(&self, snapshot: &PersistenceSnapshot) -> Result<(), PersistenceError> {
        snapshot.validate()?;
        write_atomic(&self.snapshot_path(), &snapshot.to_json()?).await
    }

    async fn load(&self) -> Result<Option<PersistenceSnapshot>, PersistenceError> {
        read_optional(&self.snapshot_path())
            .await?
            .map(|raw| PersistenceSnapshot::from_json(&raw))
            .transpose()
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        let path = self.snapshot_path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistenceError::io(path, e)),
        }
    }
}
