use std::convert::Infallible;
use std::io::{BufRead, Cursor};

/// One named stream of log lines, usually a file.
pub struct LogStream {
    pub name: String,
    pub reader: Box<dyn BufRead>,
}

impl LogStream {
    pub fn new(name: impl Into<String>, reader: impl BufRead + 'static) -> Self {
        Self {
            name: name.into(),
            reader: Box::new(reader),
        }
    }
}

impl std::fmt::Debug for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStream").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Where log lines come from.
/// Platform-specific implementations decide discovery and ordering.
pub trait LogSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open every stream this source knows about, in a stable order.
    ///
    /// # Errors
    ///
    /// Returns an error if the streams cannot be discovered or opened.
    fn open_streams(&self) -> Result<Vec<LogStream>, Self::Error>;
}

/// In-memory log text, mainly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    streams: Vec<(String, String)>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_stream(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.push(name, text);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.streams.push((name.into(), text.into()));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl LogSource for MemorySource {
    type Error = Infallible;

    fn open_streams(&self) -> Result<Vec<LogStream>, Self::Error> {
        Ok(self
            .streams
            .iter()
            .map(|(name, text)| LogStream::new(name.clone(), Cursor::new(text.clone().into_bytes())))
            .collect())
    }
}
