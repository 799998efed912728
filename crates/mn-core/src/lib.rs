//! Core logic for multiplexer-aware chat notifications.
//!
//! This crate contains:
//! - Options: the host-persisted option store and its typed view
//! - Probes: multiplexer detection, window focus and tmux pane activity
//! - Engine: the notify/suppress decision for each chat message
//! - Notify: asynchronous `notify-send` dispatch

pub mod engine;
pub mod event;
pub mod notify;
pub mod options;
pub mod probe;
mod types;

pub use engine::{ChatEventSink, Decision, Notifier, SuppressReason, decide};
pub use event::{BufferView, ChatEvent, is_buffer_current_view, split_tags};
pub use notify::{
    CommandDispatcher, DispatchError, Dispatcher, Notification, NotifyCommand, Urgency,
};
pub use options::{ConfigError, ConfigStore, MemoryStore, Settings, SettingsStore, StoreError};
pub use probe::{Multiplexer, ProbeError, Probes, SystemProbes};
pub use types::{BufferId, BufferKind, ValidationError};
