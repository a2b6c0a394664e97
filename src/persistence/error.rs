//! Persistence error types.
//!
//! Every error here is recoverable from the timer's point of view: the
//! caller logs it and carries on as if nothing had been persisted.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing persisted state.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading, writing or removing a file failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted record could not be decoded.
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be encoded.
    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot was written by a schema this reader does not understand.
    #[error("snapshot schema version {found} is not supported (readable: {min}..={max})")]
    UnsupportedSchema { found: u32, min: u32, max: u32 },

    /// The snapshot decoded but fails validation.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// No data directory is available on this system.
    #[error("could not determine a data directory for timer state")]
    NoDataDir,
}

impl PersistenceError {
    /// Returns true when the stored record itself is unusable (as opposed to the storage).
    #[must_use]
    pub fn is_bad_record(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::UnsupportedSchema { .. } | Self::InvalidSnapshot(_)
        )
    }

    /// Returns true if this error came from the filesystem.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
