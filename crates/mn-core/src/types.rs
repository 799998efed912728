//! Core type definitions with validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
}

/// An opaque host buffer handle.
///
/// Hosts identify buffers by pointer strings (e.g. `0x55d1c2a0`); the only
/// operation the engine needs is equality against the currently displayed
/// buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BufferId(String);

impl BufferId {
    /// Creates a new buffer ID after validation.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::Empty { field: "buffer ID" });
        }
        Ok(Self(id))
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BufferId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BufferId> for String {
    fn from(id: BufferId) -> Self {
        id.0
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BufferId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Kind of conversation a buffer holds, as reported by the host's
/// `localvar_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferKind {
    /// One-to-one conversation.
    Private,
    /// Multi-user channel.
    Channel,
    /// Server, core or script buffers.
    #[serde(other)]
    Other,
}

impl BufferKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Channel => "channel",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BufferKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "private" => Self::Private,
            "channel" => Self::Channel,
            _ => Self::Other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_id_rejects_empty() {
        let err = BufferId::new("").unwrap_err();
        assert_eq!(err.to_string(), "buffer ID cannot be empty");
    }

    #[test]
    fn buffer_id_deserialize_rejects_empty() {
        let result: Result<BufferId, _> = serde_json::from_str(r#""""#);
        assert!(result.is_err());
    }

    #[test]
    fn buffer_kind_unknown_values_are_other() {
        assert_eq!("server".parse::<BufferKind>().unwrap(), BufferKind::Other);
        assert_eq!("".parse::<BufferKind>().unwrap(), BufferKind::Other);

        let kind: BufferKind = serde_json::from_str(r#""server""#).unwrap();
        assert_eq!(kind, BufferKind::Other);
    }

    #[test]
    fn buffer_kind_known_values() {
        assert_eq!("private".parse::<BufferKind>().unwrap(), BufferKind::Private);
        assert_eq!("channel".parse::<BufferKind>().unwrap(), BufferKind::Channel);
    }
}
