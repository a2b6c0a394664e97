//! CLI module for Sharp Timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and display logic
//! - `run`: Foreground run loop driven by stdin commands

pub mod commands;
pub mod display;
pub mod run;

pub use commands::{Cli, Commands, ProfileArgs, RunArgs};
pub use display::Display;
pub use run::{run, RunCommand};
