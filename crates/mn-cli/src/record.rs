//! Event records exchanged with the host.
//!
//! A record is one chat event plus the slice of the host's buffer model the
//! engine needs to judge it, so an out-of-process host can describe the
//! situation in a single JSON line:
//!
//! ```json
//! {"buffer":"0x55d1","buffer_name":"bob","buffer_type":"private","nick":"me",
//!  "current_buffer":"0x55d2","date":"2025-01-29T12:00:00Z",
//!  "tags":["irc_privmsg","nick_bob"],"highlight":false,"prefix":"bob","message":"hi"}
//! ```

use std::io::BufRead;

use anyhow::{Context, Result};
use mn_core::{BufferId, BufferKind, BufferView, ChatEvent};
use serde::{Deserialize, Serialize};

/// A chat event with the host buffer snapshot taken when it was printed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(flatten)]
    pub event: ChatEvent,
    /// Short name of the event's buffer.
    pub buffer_name: String,
    /// The buffer's `localvar_type`.
    #[serde(rename = "buffer_type")]
    pub buffer_kind: BufferKind,
    /// Our nick on the buffer's server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nick: Option<String>,
    /// The buffer displayed when the event arrived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_buffer: Option<BufferId>,
}

impl BufferView for EventRecord {
    fn kind(&self, buffer: &BufferId) -> BufferKind {
        if *buffer == self.event.buffer {
            self.buffer_kind
        } else {
            BufferKind::Other
        }
    }

    fn short_name(&self, buffer: &BufferId) -> String {
        if *buffer == self.event.buffer {
            self.buffer_name.clone()
        } else {
            buffer.to_string()
        }
    }

    fn local_nick(&self, buffer: &BufferId) -> Option<String> {
        (*buffer == self.event.buffer).then(|| self.nick.clone()).flatten()
    }

    fn current_buffer(&self) -> Option<BufferId> {
        self.current_buffer.clone()
    }
}

/// Parses one JSONL line; blank lines yield `None`.
pub fn parse_record(line: &str) -> Result<Option<EventRecord>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let record = serde_json::from_str(trimmed).context("invalid event record")?;
    Ok(Some(record))
}

/// Iterates over the records of a JSONL stream, numbering lines from 1.
pub fn read_records<R: BufRead>(reader: R) -> impl Iterator<Item = (usize, Result<EventRecord>)> {
    reader.lines().enumerate().filter_map(|(idx, line)| {
        let line_no = idx + 1;
        let parsed = line
            .with_context(|| format!("failed to read line {line_no}"))
            .and_then(|line| parse_record(&line));
        match parsed {
            Ok(None) => None,
            Ok(Some(record)) => Some((line_no, Ok(record))),
            Err(e) => Some((line_no, Err(e))),
        }
    })
}
