//! Sequence stamping for raw simulation logs.

use log::debug;
use serde_json::{Map, Value};

/// Field written onto every stamped record.
pub const SEQUENCE_FIELD: &str = "sequenceNumber";

/// Result of stamping one file's worth of lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StampedLog {
    /// Re-serialized records, one JSON object per entry.
    pub lines: Vec<String>,
    pub blank_lines: usize,
    pub malformed_lines: usize,
}

impl StampedLog {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Stamped lines joined with a trailing newline, ready to write back.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

#[derive(Debug, Default)]
struct Stamper {
    stamped: StampedLog,
    sequence: u64,
}

impl Stamper {
    fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            self.stamped.blank_lines += 1;
            return;
        }
        let Ok(mut record) = serde_json::from_str::<Map<String, Value>>(line) else {
            self.stamped.malformed_lines += 1;
            return;
        };
        self.sequence += 1;
        record.insert(SEQUENCE_FIELD.to_string(), Value::from(self.sequence));
        self.stamped.lines.push(Value::Object(record).to_string());
    }

    fn finish(self) -> StampedLog {
        debug!(
            "stamped {} records, dropped {} malformed and {} blank lines",
            self.stamped.lines.len(),
            self.stamped.malformed_lines,
            self.stamped.blank_lines
        );
        self.stamped
    }
}

/// Number every JSON object line from 1 in file order.
///
/// Blank lines and lines that are not a JSON object are dropped and counted.
/// An existing `sequenceNumber` is overwritten, so stamping twice yields the
/// same numbers.
pub fn stamp_sequence_numbers<I, S>(lines: I) -> StampedLog
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut stamper = Stamper::default();
    for line in lines {
        stamper.push_line(line.as_ref());
    }
    stamper.finish()
}

/// Like [`stamp_sequence_numbers`] over a whole file's raw bytes. Lines that
/// are not valid UTF-8 are dropped as malformed.
#[must_use]
pub fn stamp_log_bytes(bytes: &[u8]) -> StampedLog {
    let mut stamper = Stamper::default();
    if !bytes.is_empty() {
        let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
        for raw in body.split(|&byte| byte == b'\n') {
            match std::str::from_utf8(raw) {
                Ok(line) => stamper.push_line(line),
                Err(_) => stamper.stamped.malformed_lines += 1,
            }
        }
    }
    stamper.finish()
}
