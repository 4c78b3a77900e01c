//! Data-quality bookkeeping for an aggregation run.
//!
//! Malformed lines and missing fields are expected noise in simulation logs
//! and are only counted. Invariant violations point at upstream corruption and
//! are kept as [`DataWarning`] values so callers can surface them.

use log::warn;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Recoverable invariant violation found while aggregating.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataWarning {
    #[error(
        "trick in game {} ({}) has {matches} plays matching winner {winner}, expected exactly one",
        display_id(.game_id.as_deref()),
        display_id(.build_version.as_deref())
    )]
    WinnerMismatch {
        build_version: Option<String>,
        game_id: Option<String>,
        winner: String,
        matches: usize,
    },
    #[error("game {game_id} reports conflicting winners {winners:?}")]
    ConflictingGameOutcome {
        game_id: String,
        winners: Vec<String>,
    },
}

impl DataWarning {
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::WinnerMismatch { .. } => "winner_mismatch",
            Self::ConflictingGameOutcome { .. } => "conflicting_game_outcome",
        }
    }
}

fn display_id(value: Option<&str>) -> &str {
    value.unwrap_or("<unknown>")
}

/// Counters and warnings collected across every stage of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataQuality {
    pub lines_read: usize,
    pub events_parsed: usize,
    pub malformed_lines: usize,
    pub blank_lines: usize,
    pub read_failures: usize,
    pub unversioned_events: usize,
    pub unrouted_events: usize,
    /// `"<event kind>.<field>"` → number of records missing it.
    pub missing_fields: BTreeMap<String, usize>,
    pub warnings: Vec<DataWarning>,
    #[serde(skip)]
    warn_limit: Option<usize>,
    #[serde(skip)]
    warn_counts: BTreeMap<&'static str, usize>,
}

impl DataQuality {
    /// Tracker that logs at most `limit` messages per warning key.
    #[must_use]
    pub fn with_warn_limit(limit: usize) -> Self {
        Self {
            warn_limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn record_missing(&mut self, kind: &str, field: &str) {
        *self
            .missing_fields
            .entry(format!("{kind}.{field}"))
            .or_insert(0) += 1;
    }

    #[must_use]
    pub fn missing(&self, kind: &str, field: &str) -> usize {
        self.missing_fields
            .get(&format!("{kind}.{field}"))
            .copied()
            .unwrap_or(0)
    }

    /// Record an invariant violation, logging it unless its key is saturated.
    pub fn push_warning(&mut self, warning: DataWarning) {
        let limit = self.warn_limit.unwrap_or(usize::MAX);
        let counter = self.warn_counts.entry(warning.key()).or_insert(0);
        if *counter < limit {
            warn!("{warning}");
        } else if *counter == limit {
            warn!(
                "further {} warnings suppressed; all occurrences are still counted",
                warning.key()
            );
        }
        *counter += 1;
        self.warnings.push(warning);
    }

    #[must_use]
    pub fn warning_count(&self, key: &str) -> usize {
        self.warnings.iter().filter(|w| w.key() == key).count()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
