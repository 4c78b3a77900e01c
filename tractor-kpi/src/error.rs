use thiserror::Error;

use crate::config::ConfigError;
use crate::export::ExportError;

/// Failures that stop an aggregation run.
///
/// Bad lines, missing fields and invariant violations are not errors; they
/// are tallied in [`crate::DataQuality`] and the run continues.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no parseable log events found ({lines_read} lines read)")]
    NoData { lines_read: usize },
    #[error("invalid analysis configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to open log source: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl AnalysisError {
    pub(crate) fn source_error<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Source(Box::new(err))
    }
}
