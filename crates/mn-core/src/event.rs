//! Chat events delivered by the host and its buffer model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BufferId, BufferKind};

/// A message the host printed into one of its buffers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    /// The buffer the message was printed to.
    pub buffer: BufferId,
    /// Display timestamp.
    pub date: DateTime<Utc>,
    /// Host line tags (e.g. `irc_privmsg`, `nick_alice`).
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the line was displayed (not filtered).
    #[serde(default = "default_displayed")]
    pub displayed: bool,
    /// Whether the host flagged the line as a highlight.
    #[serde(default)]
    pub highlight: bool,
    /// Sender prefix, usually the nick.
    #[serde(default)]
    pub prefix: String,
    /// Message body.
    pub message: String,
}

const fn default_displayed() -> bool {
    true
}

impl ChatEvent {
    /// Whether the line carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether the line was sent by the local user, judged by the
    /// `nick_<nick>` tag the host attaches to every message.
    pub fn is_from(&self, local_nick: &str) -> bool {
        !local_nick.is_empty() && self.has_tag(&format!("nick_{local_nick}"))
    }
}

/// Read access to the host's buffer model.
pub trait BufferView {
    /// The buffer's `localvar_type`.
    fn kind(&self, buffer: &BufferId) -> BufferKind;

    /// The buffer's short name (channel or query partner).
    fn short_name(&self, buffer: &BufferId) -> String;

    /// Our nick on the buffer's server, if the buffer has one.
    fn local_nick(&self, buffer: &BufferId) -> Option<String>;

    /// The buffer currently rendered in the active window.
    fn current_buffer(&self) -> Option<BufferId>;
}

/// Whether `buffer` is the one the user is looking at.
pub fn is_buffer_current_view(buffer: &BufferId, current: Option<&BufferId>) -> bool {
    current == Some(buffer)
}

/// Parses a host tag string (`irc_privmsg,notify_private,nick_bob`).
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(tags: &[&str]) -> ChatEvent {
        ChatEvent {
            buffer: BufferId::new("0x1").unwrap(),
            date: Utc::now(),
            tags: tags.iter().map(ToString::to_string).collect(),
            displayed: true,
            highlight: false,
            prefix: "bob".to_string(),
            message: "hi".to_string(),
        }
    }

    #[test]
    fn test_is_from_matches_nick_tag() {
        let e = event(&["irc_privmsg", "nick_me"]);
        assert!(e.is_from("me"));
        assert!(!e.is_from("bob"));
        assert!(!e.is_from(""));
    }

    #[test]
    fn test_is_buffer_current_view() {
        let a = BufferId::new("0xa").unwrap();
        let b = BufferId::new("0xb").unwrap();
        assert!(is_buffer_current_view(&a, Some(&a)));
        assert!(!is_buffer_current_view(&a, Some(&b)));
        assert!(!is_buffer_current_view(&a, None));
    }

    #[test]
    fn test_split_tags() {
        assert_eq!(
            split_tags("irc_privmsg, notify_private,,nick_bob"),
            ["irc_privmsg", "notify_private", "nick_bob"]
        );
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn test_event_deserialize_defaults() {
        let json = r#"{
            "buffer": "0x55d1",
            "date": "2025-01-29T12:00:00Z",
            "message": "ping"
        }"#;
        let e: ChatEvent = serde_json::from_str(json).unwrap();
        assert!(e.displayed);
        assert!(!e.highlight);
        assert!(e.tags.is_empty());
        assert_eq!(e.buffer.as_str(), "0x55d1");
    }
}
