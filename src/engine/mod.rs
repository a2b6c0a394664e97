//! Engine module for Sharp Timer.
//!
//! This module contains the countdown machinery:
//! - `timer`: Timer engine with state transitions and completion delivery
//! - `ticker`: Drift-free periodic tick source

pub mod ticker;
pub mod timer;

pub use timer::{CompletionHandler, EngineError, TimerEngine, TimerEvent};
