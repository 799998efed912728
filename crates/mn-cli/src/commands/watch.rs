//! Watch command: a stream of JSONL event records on stdin.
//!
//! Decisions happen on the reading thread in arrival order; notifications
//! are delivered on runtime workers so a slow notification daemon never
//! holds up the next message.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use mn_core::{ChatEventSink, CommandDispatcher, Notifier};

use crate::Config;
use crate::commands::util;
use crate::record::read_records;

/// Counters reported when the stream ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WatchSummary {
    pub events: usize,
    pub notified: usize,
    pub skipped: usize,
}

/// Runs the watch command on stdin.
pub fn run<W: Write>(
    writer: &mut W,
    config: &Config,
    host_pid: Option<u32>,
) -> Result<WatchSummary> {
    let stdin = io::stdin();
    watch(stdin.lock(), writer, config, host_pid)
}

/// Decides on every record of `reader`, writing one decision line per event.
pub fn watch<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    config: &Config,
    host_pid: Option<u32>,
) -> Result<WatchSummary> {
    let settings = util::load_settings(config)?;
    let probes = util::system_probes(config, host_pid);

    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let dispatcher =
        CommandDispatcher::new(runtime.handle().clone()).with_timeout(config.notify_timeout());
    let mut notifier = Notifier::new(settings, probes, dispatcher)
        .with_notify_program(&config.notify_program);

    let mut summary = WatchSummary::default();
    for (line_no, record) in read_records(reader) {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(line = line_no, error = ?e, "skipping event record");
                summary.skipped += 1;
                continue;
            }
        };

        summary.events += 1;
        let decision = notifier.on_message(&record.event, &record);
        if decision.is_notify() {
            summary.notified += 1;
        }
        writeln!(writer, "{}\t{decision}", record.event.buffer)?;
        writer.flush()?;
    }

    let pending = notifier.dispatcher().in_flight();
    if pending > 0 {
        tracing::debug!(pending, "waiting for notifications");
    }
    runtime.block_on(notifier.dispatcher_mut().wait_idle());

    tracing::info!(
        events = summary.events,
        notified = summary.notified,
        skipped = summary.skipped,
        "event stream closed"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const EVENT: &str = r#"{"buffer":"0x1","buffer_name":"bob","buffer_type":"private","date":"2025-01-29T12:00:00Z","tags":["nick_bob"],"prefix":"bob","message":"hi"}"#;

    #[test]
    fn test_disabled_stream_suppresses_and_skips_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let settings_path = dir.path().join("settings.json");
        std::fs::write(&settings_path, r#"{"options":{"enabled":"off"}}"#).unwrap();
        let config = Config {
            settings_path,
            ..Config::default()
        };

        let input = format!("{EVENT}\n{{broken\n\n{EVENT}\n");
        let mut output = Vec::new();
        let summary = watch(Cursor::new(input), &mut output, &config, Some(1)).unwrap();

        assert_eq!(
            summary,
            WatchSummary {
                events: 2,
                notified: 0,
                skipped: 1,
            }
        );
        let output = String::from_utf8(output).unwrap();
        insta::assert_snapshot!(output, @r"
        0x1	suppress (disabled)
        0x1	suppress (disabled)
        ");
    }
}
