//! Line-level decoding of simulation log records.

use log::debug;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::io::BufRead;

use crate::quality::DataQuality;

/// Kind of a log record, from the wire field `event`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub enum EventKind {
    GameInitialized,
    GameOver,
    TrickCompleted,
    AttackingTeamVictory,
    DefendingTeamVictory,
    KittyPickup,
    AiLeadingDecision,
    AiFollowingDecision,
    Other(String),
}

impl EventKind {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "game_initialized" => Self::GameInitialized,
            "game_over" => Self::GameOver,
            "trick_completed" => Self::TrickCompleted,
            "attacking_team_victory" => Self::AttackingTeamVictory,
            "defending_team_victory" => Self::DefendingTeamVictory,
            "kitty_pickup" => Self::KittyPickup,
            "ai_leading_decision" => Self::AiLeadingDecision,
            "ai_following_decision" => Self::AiFollowingDecision,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::GameInitialized => "game_initialized",
            Self::GameOver => "game_over",
            Self::TrickCompleted => "trick_completed",
            Self::AttackingTeamVictory => "attacking_team_victory",
            Self::DefendingTeamVictory => "defending_team_victory",
            Self::KittyPickup => "kitty_pickup",
            Self::AiLeadingDecision => "ai_leading_decision",
            Self::AiFollowingDecision => "ai_following_decision",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// One parsed log line. Immutable once produced by the reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(deserialize_with = "timestamp_text")]
    pub timestamp: String,
    #[serde(rename = "event")]
    pub kind: EventKind,
    #[serde(rename = "appVersion", default, deserialize_with = "lenient")]
    pub build_version: Option<String>,
    #[serde(rename = "gameId", default, deserialize_with = "lenient_id")]
    pub game_id: Option<String>,
    #[serde(rename = "sequenceNumber", default, deserialize_with = "lenient")]
    pub sequence_number: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub level: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<String>,
    #[serde(rename = "data", default, deserialize_with = "payload_map")]
    pub payload: Map<String, Value>,
}

impl LogEvent {
    /// Decode one line; `None` for anything that is not a valid record.
    #[must_use]
    pub fn parse_line(line: &str) -> Option<Self> {
        serde_json::from_str(line.trim()).ok()
    }
}

/// Deserialize an optional field, treating a wrong JSON type as absent.
///
/// # Errors
///
/// Only fails if the underlying input is not valid JSON.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Deserialize an identifier that may be written as a string or a number.
///
/// # Errors
///
/// Only fails if the underlying input is not valid JSON.
pub fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(id_text(&Value::deserialize(deserializer)?))
}

/// Text form of an identifier value; `None` for empty strings and non-scalars.
#[must_use]
pub fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn timestamp_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(text) if !text.trim().is_empty() => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(de::Error::custom(format!("unusable timestamp {other}"))),
    }
}

fn payload_map<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Map<String, Value>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

/// Lazily turns a stream of lines into [`LogEvent`]s, skipping bad lines.
///
/// Counters land in the borrowed [`DataQuality`] as lines are consumed. A
/// line that is not valid UTF-8 is malformed like any other undecodable
/// line; only an I/O error ends the stream.
pub struct EventReader<'q, R> {
    source: String,
    reader: R,
    buf: Vec<u8>,
    quality: &'q mut DataQuality,
    finished: bool,
}

impl<'q, R: BufRead> EventReader<'q, R> {
    pub fn new(source: impl Into<String>, reader: R, quality: &'q mut DataQuality) -> Self {
        Self {
            source: source.into(),
            reader,
            buf: Vec::new(),
            quality,
            finished: false,
        }
    }
}

/// Strip the line terminator the way `BufRead::lines` does.
fn trim_line_end(mut raw: &[u8]) -> &[u8] {
    if let Some(rest) = raw.strip_suffix(b"\n") {
        raw = rest;
        if let Some(rest) = raw.strip_suffix(b"\r") {
            raw = rest;
        }
    }
    raw
}

impl<R: BufRead> Iterator for EventReader<'_, R> {
    type Item = LogEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.finished = true;
                    return None;
                }
                Ok(_) => {}
                Err(err) => {
                    debug!("{}: stopped reading after I/O error: {err}", self.source);
                    self.quality.read_failures += 1;
                    self.finished = true;
                    return None;
                }
            }
            self.quality.lines_read += 1;
            let Ok(line) = std::str::from_utf8(trim_line_end(&self.buf)) else {
                self.quality.malformed_lines += 1;
                continue;
            };
            if line.trim().is_empty() {
                self.quality.blank_lines += 1;
                continue;
            }
            if let Some(event) = LogEvent::parse_line(line) {
                self.quality.events_parsed += 1;
                return Some(event);
            }
            self.quality.malformed_lines += 1;
        }
    }
}
