//! muxnotify command-line adapter.
//!
//! Wraps the notification engine from `mn-core` for hosts that run an
//! external program per message or stream events over a pipe.

mod cli;
pub mod commands;
mod config;
pub mod record;
pub mod store;

pub use cli::{Cli, Commands, ConfigAction};
pub use config::Config;
