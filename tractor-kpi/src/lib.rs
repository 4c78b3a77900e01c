//! Tractor KPI Engine
//!
//! Turns JSON-lines logs from Tractor AI simulations into one row of KPIs per
//! build version. The stages run in order: read lines into [`LogEvent`]s,
//! route them into typed record sets, flatten tricks into per-seat
//! observations, compute seven grouped views, and left-join those views onto
//! the per-version game counts.
//!
//! The crate does no file discovery and no rendering beyond CSV; see
//! [`LogSource`] for plugging in where lines come from.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod flatten;
pub mod merge;
pub mod normalize;
pub mod numbers;
pub mod pipeline;
pub mod quality;
pub mod records;
pub mod source;

pub use aggregate::AggregateViews;
pub use classify::ClassifiedEvents;
pub use config::{AnalysisConfig, ConfigError, RoundBasis};
pub use error::AnalysisError;
pub use event::{EventKind, EventReader, LogEvent};
pub use export::{ExportError, KpiValue};
pub use flatten::{PlayObservation, flatten_tricks};
pub use merge::{KpiReport, KpiRow, PositionColumns, merge_views};
pub use normalize::{StampedLog, stamp_log_bytes, stamp_sequence_numbers};
pub use pipeline::{Analysis, KpiPipeline};
pub use quality::{DataQuality, DataWarning};
pub use source::{LogSource, LogStream, MemorySource};
