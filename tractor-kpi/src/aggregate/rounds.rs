use serde::Serialize;
use std::collections::BTreeMap;

use crate::numbers::MeanAccumulator;
use crate::records::{RoundOutcome, RoundSide};

/// How rounds end for one build version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundEfficiency {
    pub build_version: String,
    pub total_rounds: u64,
    pub avg_final_points: Option<f64>,
    pub attacking_round_win_rate: Option<f64>,
    pub avg_attacking_win_points: Option<f64>,
    pub avg_defending_win_points: Option<f64>,
}

#[derive(Debug, Default)]
struct RoundBuilder {
    total: u64,
    final_points: MeanAccumulator,
    attacking_won: MeanAccumulator,
    attacking_points: MeanAccumulator,
    defending_points: MeanAccumulator,
}

impl RoundBuilder {
    fn ingest(&mut self, round: &RoundOutcome) {
        self.total += 1;
        self.final_points.add_opt(round.final_points);
        self.attacking_won
            .add_flag(round.side == RoundSide::Attacking);
        match round.side {
            RoundSide::Attacking => self.attacking_points.add_opt(round.final_points),
            RoundSide::Defending => self.defending_points.add_opt(round.final_points),
        }
    }

    fn finish(self, build_version: String) -> RoundEfficiency {
        RoundEfficiency {
            build_version,
            total_rounds: self.total,
            avg_final_points: self.final_points.rounded_mean(1),
            attacking_round_win_rate: self.attacking_won.rounded_mean(3),
            avg_attacking_win_points: self.attacking_points.rounded_mean(1),
            avg_defending_win_points: self.defending_points.rounded_mean(1),
        }
    }
}

/// Summarize round outcomes per version.
///
/// A round without a points field still counts towards `total_rounds` and the
/// win rate but not towards any points average.
#[must_use]
pub fn round_efficiency(rounds: &[RoundOutcome]) -> Vec<RoundEfficiency> {
    let mut builders: BTreeMap<&str, RoundBuilder> = BTreeMap::new();
    for round in rounds {
        if let Some(version) = round.build_version.as_deref() {
            builders.entry(version).or_default().ingest(round);
        }
    }
    builders
        .into_iter()
        .map(|(version, builder)| builder.finish(version.to_string()))
        .collect()
}

/// Number of round outcome events per version, for the exact round basis.
#[must_use]
pub fn round_counts(rounds: &[RoundOutcome]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for version in rounds.iter().filter_map(|r| r.build_version.as_deref()) {
        *counts.entry(version.to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(side: RoundSide, points: Option<f64>) -> RoundOutcome {
        RoundOutcome {
            build_version: Some("1.0".to_string()),
            game_id: Some("g1".to_string()),
            side,
            final_points: points,
        }
    }

    #[test]
    fn one_win_per_side() {
        let rounds = vec![
            round(RoundSide::Attacking, Some(95.0)),
            round(RoundSide::Defending, Some(40.0)),
        ];
        let view = round_efficiency(&rounds);
        assert_eq!(
            view,
            vec![RoundEfficiency {
                build_version: "1.0".to_string(),
                total_rounds: 2,
                avg_final_points: Some(67.5),
                attacking_round_win_rate: Some(0.5),
                avg_attacking_win_points: Some(95.0),
                avg_defending_win_points: Some(40.0),
            }]
        );
    }

    #[test]
    fn missing_points_count_as_rounds_only() {
        let rounds = vec![
            round(RoundSide::Attacking, None),
            round(RoundSide::Attacking, Some(80.0)),
            round(RoundSide::Attacking, Some(85.0)),
        ];
        let view = round_efficiency(&rounds);
        assert_eq!(view[0].total_rounds, 3);
        assert_eq!(view[0].avg_final_points, Some(82.5));
        assert_eq!(view[0].attacking_round_win_rate, Some(1.0));
        assert_eq!(view[0].avg_defending_win_points, None);
    }

    #[test]
    fn unversioned_rounds_are_skipped() {
        let mut orphan = round(RoundSide::Defending, Some(10.0));
        orphan.build_version = None;
        assert!(round_efficiency(&[orphan.clone()]).is_empty());
        assert!(round_counts(&[orphan]).is_empty());
    }

    #[test]
    fn counts_rounds_per_version() {
        let mut other = round(RoundSide::Defending, Some(10.0));
        other.build_version = Some("2.0".to_string());
        let rounds = vec![round(RoundSide::Attacking, Some(90.0)), round(RoundSide::Defending, None), other];
        let counts = round_counts(&rounds);
        assert_eq!(counts.get("1.0"), Some(&2));
        assert_eq!(counts.get("2.0"), Some(&1));
    }
}
