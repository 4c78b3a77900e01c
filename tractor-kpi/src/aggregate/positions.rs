use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::flatten::PlayObservation;
use crate::numbers::{MeanAccumulator, count_to_f64, ratio, round_to, rounded_ratio, u64_to_f64};

/// Trick outcomes for one seat position of one build version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionStats {
    pub build_version: String,
    pub seat_position: u32,
    pub total_tricks: u64,
    pub tricks_won: u64,
    pub points_won: f64,
    pub win_rate: Option<f64>,
    pub avg_points_when_winning: Option<f64>,
    pub points_per_round: Option<f64>,
}

#[derive(Debug, Default)]
struct PositionBuilder {
    total: usize,
    won: usize,
    /// Points of won tricks that logged `trickPoints`.
    won_points: MeanAccumulator,
}

impl PositionBuilder {
    fn ingest(&mut self, observation: &PlayObservation) {
        self.total += 1;
        if observation.won_trick {
            self.won += 1;
            self.won_points.add_opt(observation.trick_points);
        }
    }

    fn finish(self, build_version: String, seat_position: u32, rounds: Option<f64>) -> PositionStats {
        PositionStats {
            build_version,
            seat_position,
            total_tricks: u64::try_from(self.total).unwrap_or(u64::MAX),
            tricks_won: u64::try_from(self.won).unwrap_or(u64::MAX),
            points_won: self.won_points.sum(),
            win_rate: rounded_ratio(self.won, self.total, 3),
            avg_points_when_winning: self.won_points.rounded_mean(2),
            points_per_round: rounds
                .and_then(|rounds| ratio(self.won_points.sum(), rounds))
                .map(|v| round_to(v, 2)),
        }
    }
}

/// Rough round count shared by every version: versioned observations divided
/// by seats per trick and by the number of distinct versions.
///
/// This is an estimate that keeps earlier reports comparable, not a count of
/// completed rounds; see [`crate::config::RoundBasis`].
#[must_use]
pub fn approximate_round_count(observations: &[PlayObservation], seats_per_trick: u32) -> Option<f64> {
    let versioned: Vec<&str> = observations
        .iter()
        .filter_map(|o| o.build_version.as_deref())
        .collect();
    let versions: BTreeSet<&str> = versioned.iter().copied().collect();
    let per_seat = ratio(count_to_f64(versioned.len()), f64::from(seats_per_trick))?;
    ratio(per_seat, count_to_f64(versions.len()))
}

/// Per-version round counts taken from round outcome events.
#[must_use]
pub fn exact_round_counts(counts: &BTreeMap<String, u64>) -> impl Fn(&str) -> Option<f64> + '_ {
    move |version: &str| counts.get(version).map(|&n| u64_to_f64(n))
}

/// Group observations by version and seat position.
///
/// `round_count` supplies the `points_per_round` denominator for a version;
/// `None` or zero leaves that metric empty.
pub fn position_stats<F>(observations: &[PlayObservation], round_count: F) -> Vec<PositionStats>
where
    F: Fn(&str) -> Option<f64>,
{
    let mut builders: BTreeMap<(&str, u32), PositionBuilder> = BTreeMap::new();
    for observation in observations {
        let Some(version) = observation.build_version.as_deref() else {
            continue;
        };
        builders
            .entry((version, observation.seat_position))
            .or_default()
            .ingest(observation);
    }
    builders
        .into_iter()
        .map(|((version, seat), builder)| builder.finish(version.to_string(), seat, round_count(version)))
        .collect()
}
