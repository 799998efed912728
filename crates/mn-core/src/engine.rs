//! The attention decision: should this message become a desktop
//! notification?
//!
//! The rules, in order:
//!
//! 1. Gate: notifications disabled, no display, or no focus tool installed.
//! 2. Relevance: only private buffers and highlighted channel lines.
//! 3. Self-echo: lines tagged with our own nick never notify.
//! 4. Highlight fast path: with `on_highlight`, a highlight always notifies.
//! 5. Focus: the user is away if the terminal window is not focused, the
//!    tmux pane is not active, or the buffer is not the one displayed.
//!
//! Probe failures in step 5 suppress the notification (fail closed).

use std::fmt;
use std::path::PathBuf;

use crate::event::{BufferView, ChatEvent, is_buffer_current_view};
use crate::notify::{DEFAULT_NOTIFY_PROGRAM, Dispatcher, Notification, NotifyCommand};
use crate::options::Settings;
use crate::probe::{Multiplexer, ProbeError, Probes, window_title_matches};
use crate::types::BufferKind;

/// Why a message did not produce a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuppressReason {
    /// The `enabled` option is off.
    Disabled,
    /// No display to show notifications on.
    NoDisplay,
    /// The focus query tool is not installed.
    FocusToolMissing,
    /// Neither a private message nor a highlighted channel line.
    NotRelevant,
    /// We sent the message ourselves.
    OwnMessage,
    /// The user is looking at the buffer.
    Attending,
    /// Focus could not be determined.
    ProbeFailed,
}

impl SuppressReason {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::NoDisplay => "no display",
            Self::FocusToolMissing => "focus tool missing",
            Self::NotRelevant => "not relevant",
            Self::OwnMessage => "own message",
            Self::Attending => "attending",
            Self::ProbeFailed => "probe failed",
        }
    }
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome for a single message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Suppress(SuppressReason),
    Notify(Notification),
}

impl Decision {
    pub const fn is_notify(&self) -> bool {
        matches!(self, Self::Notify(_))
    }

    pub const fn suppress_reason(&self) -> Option<SuppressReason> {
        match self {
            Self::Suppress(reason) => Some(*reason),
            Self::Notify(_) => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Suppress(reason) => write!(f, "suppress ({reason})"),
            Self::Notify(n) => write!(f, "notify {:?} {:?}", n.title, n.body),
        }
    }
}

/// Decides whether `event` should notify.
pub fn decide<V, P>(settings: &Settings, event: &ChatEvent, view: &V, probes: &P) -> Decision
where
    V: BufferView + ?Sized,
    P: Probes + ?Sized,
{
    if !settings.enabled {
        return Decision::Suppress(SuppressReason::Disabled);
    }
    if !probes.display_available() {
        return Decision::Suppress(SuppressReason::NoDisplay);
    }
    if !probes.focus_tool_exists(&settings.xdotool_path) {
        return Decision::Suppress(SuppressReason::FocusToolMissing);
    }

    let relevant = match view.kind(&event.buffer) {
        BufferKind::Private => true,
        BufferKind::Channel => event.highlight,
        BufferKind::Other => false,
    };
    if !relevant {
        return Decision::Suppress(SuppressReason::NotRelevant);
    }

    if let Some(nick) = view.local_nick(&event.buffer) {
        if event.is_from(&nick) {
            return Decision::Suppress(SuppressReason::OwnMessage);
        }
    }

    let notify = || {
        let name = view.short_name(&event.buffer);
        Decision::Notify(Notification::for_buffer(&name, &event.message))
    };

    if event.highlight && settings.on_highlight {
        return notify();
    }

    match user_is_away(settings, event, view, probes) {
        Ok(true) => notify(),
        Ok(false) => Decision::Suppress(SuppressReason::Attending),
        Err(e) => {
            tracing::warn!(buffer = %event.buffer, error = %e, "cannot determine focus, suppressing");
            Decision::Suppress(SuppressReason::ProbeFailed)
        }
    }
}

fn user_is_away<V, P>(
    settings: &Settings,
    event: &ChatEvent,
    view: &V,
    probes: &P,
) -> Result<bool, ProbeError>
where
    V: BufferView + ?Sized,
    P: Probes + ?Sized,
{
    let title = probes.focused_window_title(&settings.xdotool_path)?;
    let multiplexer = probes.multiplexer();
    tracing::debug!(%multiplexer, title = %title, "focus probe");

    if !window_title_matches(&settings.term_title, &title) {
        return Ok(true);
    }
    if multiplexer == Multiplexer::Tmux && !probes.is_pane_active()? {
        return Ok(true);
    }
    // Screen cannot report pane activity, so only the buffer is left to check.
    let current = view.current_buffer();
    Ok(!is_buffer_current_view(&event.buffer, current.as_ref()))
}

/// Host-facing capability: the host calls this for every printed message.
pub trait ChatEventSink {
    fn on_message(&mut self, event: &ChatEvent, view: &dyn BufferView) -> Decision;
}

/// Decides on every message and dispatches the notifications.
#[derive(Debug)]
pub struct Notifier<P, D> {
    settings: Settings,
    probes: P,
    dispatcher: D,
    notify_program: PathBuf,
}

impl<P: Probes, D: Dispatcher> Notifier<P, D> {
    pub fn new(settings: Settings, probes: P, dispatcher: D) -> Self {
        Self {
            settings,
            probes,
            dispatcher,
            notify_program: PathBuf::from(DEFAULT_NOTIFY_PROGRAM),
        }
    }

    /// Uses `program` instead of `notify-send`.
    #[must_use]
    pub fn with_notify_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.notify_program = program.into();
        self
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replaces the settings after the host store was refreshed.
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub const fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub const fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }
}

impl<P: Probes, D: Dispatcher> ChatEventSink for Notifier<P, D> {
    fn on_message(&mut self, event: &ChatEvent, view: &dyn BufferView) -> Decision {
        let decision = decide(&self.settings, event, view, &self.probes);
        match &decision {
            Decision::Notify(notification) => {
                tracing::info!(buffer = %event.buffer, title = %notification.title, "notifying");
                self.dispatcher.dispatch(NotifyCommand::new(
                    &self.notify_program,
                    &self.settings.icon,
                    self.settings.urgency,
                    notification,
                ));
            }
            Decision::Suppress(reason) => {
                tracing::debug!(buffer = %event.buffer, %reason, "suppressed");
            }
        }
        decision
    }
}
