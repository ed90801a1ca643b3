//! Core session types
//!
//! Defines the session identifier and the typed view of one session log line.

use std::fmt;
use std::path::PathBuf;

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SessionError;

/// File extension of session logs
pub const SESSION_LOG_EXTENSION: &str = "jsonl";

/// Identifier of a recorded session, used as the log file stem
///
/// Only emptiness is checked; path separators are the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Create a session ID, rejecting the empty string
    pub fn new(id: impl Into<String>) -> Result<Self, SessionError> {
        let id = id.into();
        if id.is_empty() {
            return Err(SessionError::InvalidId);
        }
        Ok(Self(id))
    }

    /// Get the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the log file for this session (`<id>.jsonl`)
    pub fn log_file_name(&self) -> String {
        format!("{}.{}", self.0, SESSION_LOG_EXTENSION)
    }
}

impl TryFrom<String> for SessionId {
    type Error = SessionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SessionId {
    type Error = SessionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Speaker of a logged message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    /// Any other role string (e.g. "system")
    #[serde(other)]
    Other,
}

impl Role {
    /// Whether this role marks a genuine conversational turn
    pub fn is_conversational(&self) -> bool {
        matches!(self, Self::User | Self::Assistant)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// The `message` object of a log line; only the role is inspected
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageHeader {
    #[serde(default, deserialize_with = "lenient")]
    pub role: Option<Role>,
}

/// One line of a session log
///
/// Fields of an unexpected JSON type decode as absent rather than failing the
/// whole line, so `{"type":"summary","leafUuid":"x","message":"text"}` is still
/// a summary record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionRecord {
    #[serde(default, deserialize_with = "lenient_object")]
    pub message: Option<MessageHeader>,

    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<String>,

    #[serde(rename = "leafUuid", default, deserialize_with = "lenient")]
    pub leaf_uuid: Option<String>,
}

impl SessionRecord {
    /// Decode one log line.
    ///
    /// Only JSON syntax errors fail. Valid JSON that is not an object decodes
    /// as an empty record. Unpaired `\uD800`-`\uDFFF` escapes (truncated
    /// emoji) are legal JSON and decode as U+FFFD.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        let value = match serde_json::from_str::<Value>(line) {
            Ok(value) => value,
            Err(e) => match replace_lone_surrogates(line) {
                Some(repaired) => serde_json::from_str(&repaired)?,
                None => return Err(e),
            },
        };

        match value {
            value @ Value::Object(_) => serde_json::from_value(value),
            _ => Ok(Self::default()),
        }
    }

    /// Role of a user or assistant turn, if this line is one
    pub fn conversational_role(&self) -> Option<Role> {
        self.message
            .as_ref()
            .and_then(|m| m.role)
            .filter(Role::is_conversational)
    }

    /// Leaf identifier of a summary checkpoint, if this line is one
    pub fn summary_leaf(&self) -> Option<&str> {
        if self.kind.as_deref() != Some("summary") {
            return None;
        }
        self.leaf_uuid.as_deref().filter(|leaf| !leaf.is_empty())
    }

    /// Resume point this record provides when found at `line` (1-based)
    pub fn resume_point(&self, line: usize) -> Option<ResumePoint> {
        if let Some(role) = self.conversational_role() {
            return Some(ResumePoint::Conversation { line, role });
        }
        self.summary_leaf().map(|leaf| ResumePoint::Summary {
            line,
            leaf_uuid: leaf.to_string(),
        })
    }
}

/// Deserialize a field, treating a value of the wrong shape as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Like [`lenient`], but only a JSON object may fill the field.
/// Derived struct visitors also accept arrays, which would read
/// `["user"]` as `{"role":"user"}`.
fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => Ok(serde_json::from_value(value).ok()),
        _ => Ok(None),
    }
}

/// Rewrite unpaired surrogate escapes as `\ufffd`; `None` if there are none
fn replace_lone_surrogates(line: &str) -> Option<String> {
    let bytes = line.as_bytes();
    let mut repaired = String::with_capacity(line.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\\' {
            i += 1;
            continue;
        }
        let Some(unit) = unicode_escape(bytes, i) else {
            // `\\`, `\"`, `\n`, ...: skip the escaped byte too
            i += 2;
            continue;
        };
        match unit {
            0xD800..=0xDBFF if matches!(unicode_escape(bytes, i + 6), Some(0xDC00..=0xDFFF)) => {
                i += 12;
            }
            0xD800..=0xDFFF => {
                repaired.push_str(&line[copied..i]);
                repaired.push_str("\\ufffd");
                i += 6;
                copied = i;
            }
            _ => i += 6,
        }
    }

    if copied == 0 {
        return None;
    }
    repaired.push_str(&line[copied..]);
    Some(repaired)
}

/// Code unit of a `\uXXXX` escape starting at `at`
fn unicode_escape(bytes: &[u8], at: usize) -> Option<u16> {
    match bytes.get(at..at + 6)? {
        [b'\\', b'u', hex @ ..] if hex.iter().all(u8::is_ascii_hexdigit) => {
            u16::from_str_radix(std::str::from_utf8(hex).ok()?, 16).ok()
        }
        _ => None,
    }
}

/// The line that makes a session resumable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumePoint {
    /// A user or assistant message
    Conversation { line: usize, role: Role },
    /// A summary checkpoint referencing a prior leaf message
    Summary { line: usize, leaf_uuid: String },
}

impl ResumePoint {
    /// 1-based line number within the session log
    pub fn line(&self) -> usize {
        match self {
            Self::Conversation { line, .. } | Self::Summary { line, .. } => *line,
        }
    }
}

/// Outcome of checking one session log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCheck {
    /// Session that was checked
    pub session_id: SessionId,
    /// Log file that was looked up
    pub path: PathBuf,
    /// Whether the log file existed
    pub found: bool,
    /// First line that makes the session resumable
    pub resume_point: Option<ResumePoint>,
    /// 1-based numbers of lines that were not valid JSON, up to the stop point
    pub malformed_lines: Vec<usize>,
}

impl SessionCheck {
    /// Whether the session can be resumed
    pub fn is_resumable(&self) -> bool {
        self.resume_point.is_some()
    }
}
