//! Sharp Timer Library
//!
//! This library provides the core functionality for the Sharp Timer CLI.
//! It includes:
//! - Session model and per-mode duration profile
//! - Timer engine driving a single countdown session
//! - Snapshot persistence and startup recovery
//! - A host coordinator tying the engine to storage
//! - CLI command parsing and display utilities

pub mod app;
pub mod cli;
pub mod engine;
pub mod persistence;
pub mod recovery;
pub mod types;

// Re-export commonly used types for convenience
pub use app::TimerApp;
pub use engine::{CompletionHandler, EngineError, TimerEngine, TimerEvent};
pub use persistence::{
    FileGateway, MemoryGateway, PersistenceError, PersistenceGateway, PersistenceSnapshot,
    ProfileStore,
};
pub use recovery::{Recovered, RecoveryOutcome, RecoveryReport};
pub use types::{Mode, ModeDurationResolver, ModeSwitchPolicy, Session, SessionState, TimerProfile};
