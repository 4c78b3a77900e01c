//! Flat, column-oriented views of a [`KpiReport`] and CSV output.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::io::Write;
use thiserror::Error;

use crate::merge::{KpiReport, KpiRow, PositionColumns};
use crate::records::TRICK_POSITION_LABELS;

/// One cell of the flat report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KpiValue {
    Text(String),
    Int(u64),
    Float(f64),
    Null,
}

impl KpiValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(crate::numbers::u64_to_f64(*value)),
            Self::Text(_) | Self::Null => None,
        }
    }
}

impl From<Option<f64>> for KpiValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Null, Self::Float)
    }
}

impl From<Option<u64>> for KpiValue {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Self::Null, Self::Int)
    }
}

impl fmt::Display for KpiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Null => Ok(()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write CSV report: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush report output: {0}")]
    Io(#[from] std::io::Error),
}

type Accessor = fn(&KpiRow) -> KpiValue;

const LEADING_COLUMNS: &[(&str, Accessor)] = &[
    ("build_version", |r| KpiValue::Text(r.build_version.clone())),
    ("total_games", |r| KpiValue::Int(r.total_games)),
    ("attacking_team_win_rate", |r| r.attacking_team_win_rate.into()),
    ("defending_team_win_rate", |r| r.defending_team_win_rate.into()),
    ("total_rounds", |r| r.total_rounds.into()),
    ("avg_final_points", |r| r.avg_final_points.into()),
    ("attacking_round_win_rate", |r| r.attacking_round_win_rate.into()),
    ("avg_attacking_win_points", |r| r.avg_attacking_win_points.into()),
    ("avg_defending_win_points", |r| r.avg_defending_win_points.into()),
    ("avg_rounds_per_game", |r| r.avg_rounds_per_game.into()),
];

const MIDDLE_COLUMNS: &[(&str, Accessor)] = &[
    ("avg_player_win_rate", |r| r.avg_player_win_rate.into()),
    ("avg_points_per_trick", |r| r.avg_points_per_trick.into()),
    ("kitty_events", |r| r.kitty_events.into()),
    ("avg_kitty_points", |r| r.avg_kitty_points.into()),
    ("total_decisions", |r| r.total_decisions.into()),
    ("avg_decision_score", |r| r.avg_decision_score.into()),
    ("reasoning_rate", |r| r.reasoning_rate.into()),
    ("attacking_decision_rate", |r| r.attacking_decision_rate.into()),
    ("leading_decision_rate", |r| r.leading_decision_rate.into()),
];

/// Seat metrics in pivot order: metric-major, then seat.
const POSITION_METRICS: [(&str, fn(&PositionColumns) -> Option<f64>); 3] = [
    ("win_rate", |p| p.win_rate),
    ("avg_points", |p| p.avg_points),
    ("points_per_round", |p| p.points_per_round),
];

#[derive(Clone, Copy)]
enum Column {
    Field(&'static str, Accessor),
    Position {
        seat: u32,
        metric: &'static str,
        value: fn(&PositionColumns) -> Option<f64>,
    },
    PositionScore(&'static str),
}

impl Column {
    fn name(&self) -> String {
        match self {
            Self::Field(name, _) => (*name).to_string(),
            Self::Position { seat, metric, .. } => format!("position_{seat}_{metric}"),
            Self::PositionScore(label) => format!("{label}_position_score"),
        }
    }

    fn cell(&self, row: &KpiRow) -> KpiValue {
        match self {
            Self::Field(_, accessor) => accessor(row),
            Self::Position { seat, value, .. } => row.position(*seat).and_then(|p| value(p)).into(),
            Self::PositionScore(label) => row.position_scores.get(*label).copied().flatten().into(),
        }
    }
}

impl KpiReport {
    /// Columns present in at least one row, in a fixed order.
    fn layout(&self) -> Vec<Column> {
        let seats: BTreeSet<u32> = self
            .rows
            .iter()
            .flat_map(|row| row.positions.keys().copied())
            .collect();
        let mut layout: Vec<Column> = LEADING_COLUMNS
            .iter()
            .map(|&(name, accessor)| Column::Field(name, accessor))
            .collect();
        for &(metric, value) in &POSITION_METRICS {
            layout.extend(seats.iter().map(|&seat| Column::Position { seat, metric, value }));
        }
        layout.extend(
            MIDDLE_COLUMNS
                .iter()
                .map(|&(name, accessor)| Column::Field(name, accessor)),
        );
        layout.extend(
            TRICK_POSITION_LABELS
                .iter()
                .copied()
                .filter(|label| {
                    self.rows
                        .iter()
                        .any(|row| row.position_scores.contains_key(*label))
                })
                .map(Column::PositionScore),
        );
        layout
    }

    /// Ordered column union across every row.
    #[must_use]
    pub fn columns(&self) -> Vec<String> {
        self.layout().iter().map(Column::name).collect()
    }

    /// Rows as cells aligned with [`KpiReport::columns`].
    #[must_use]
    pub fn table(&self) -> Vec<Vec<KpiValue>> {
        let layout = self.layout();
        self.rows
            .iter()
            .map(|row| layout.iter().map(|column| column.cell(row)).collect())
            .collect()
    }

    /// Write a header line plus one line per version. Empty cells mean the
    /// metric had no data.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` when the underlying writer fails.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(self.columns())?;
        for cells in self.table() {
            csv.write_record(cells.iter().map(ToString::to_string))?;
        }
        csv.flush()?;
        Ok(())
    }
}
