//! Handle command: one message, described by flags.
//!
//! Meant for hosts that shell out per message, e.g. a WeeChat print hook
//! running `muxnotify handle --buffer ${buffer} ...`.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use mn_core::{
    BufferId, BufferKind, ChatEvent, ChatEventSink, CommandDispatcher, Notifier, decide,
    split_tags,
};

use crate::Config;
use crate::commands::util;
use crate::record::EventRecord;

#[derive(Debug, Args)]
pub struct HandleArgs {
    /// Host buffer handle the message was printed to.
    #[arg(long)]
    pub buffer: String,

    /// Short name of the buffer (channel or query partner).
    #[arg(long)]
    pub name: String,

    /// Buffer type: private, channel, or anything else.
    #[arg(long = "type", default_value = "private")]
    pub kind: BufferKind,

    /// Host buffer handle currently displayed.
    #[arg(long)]
    pub current_buffer: Option<String>,

    /// Our nick on the buffer's server.
    #[arg(long)]
    pub nick: Option<String>,

    /// Comma-separated line tags.
    #[arg(long, default_value = "")]
    pub tags: String,

    /// The host flagged the line as a highlight.
    #[arg(long)]
    pub highlight: bool,

    /// Sender prefix.
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Display date (ISO 8601); defaults to now.
    #[arg(long)]
    pub date: Option<String>,

    /// Message body.
    #[arg(long)]
    pub message: String,

    /// Compare the active tmux pane against this pid (default: parent process).
    #[arg(long)]
    pub host_pid: Option<u32>,

    /// Decide and print, but do not send the notification.
    #[arg(long)]
    pub dry_run: bool,
}

impl HandleArgs {
    fn to_record(&self) -> Result<EventRecord> {
        let date = match &self.date {
            None => Utc::now(),
            Some(s) => DateTime::parse_from_rfc3339(s)
                .with_context(|| {
                    format!("invalid --date {s:?}, expected ISO 8601 (e.g., 2025-01-29T12:00:00Z)")
                })?
                .with_timezone(&Utc),
        };
        let current_buffer = self
            .current_buffer
            .as_deref()
            .filter(|b| !b.is_empty())
            .map(BufferId::new)
            .transpose()
            .context("invalid --current-buffer")?;

        Ok(EventRecord {
            event: ChatEvent {
                buffer: BufferId::new(self.buffer.as_str()).context("invalid --buffer")?,
                date,
                tags: split_tags(&self.tags),
                displayed: true,
                highlight: self.highlight,
                prefix: self.prefix.clone(),
                message: self.message.clone(),
            },
            buffer_name: self.name.clone(),
            buffer_kind: self.kind,
            nick: self.nick.clone().filter(|n| !n.is_empty()),
            current_buffer,
        })
    }
}

/// Runs the handle command, printing the decision.
pub fn run<W: Write>(writer: &mut W, args: &HandleArgs, config: &Config) -> Result<()> {
    let record = args.to_record()?;
    let settings = util::load_settings(config)?;
    let probes = util::system_probes(config, args.host_pid);

    if args.dry_run {
        let decision = decide(&settings, &record.event, &record, &probes);
        writeln!(writer, "{decision}")?;
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let dispatcher =
        CommandDispatcher::new(runtime.handle().clone()).with_timeout(config.notify_timeout());
    let mut notifier = Notifier::new(settings, probes, dispatcher)
        .with_notify_program(&config.notify_program);

    let decision = notifier.on_message(&record.event, &record);
    writeln!(writer, "{decision}")?;

    // The process exits after this message, so wait for delivery here.
    // Failures were already logged by the dispatch task.
    runtime.block_on(notifier.dispatcher_mut().wait_idle());

    Ok(())
}
