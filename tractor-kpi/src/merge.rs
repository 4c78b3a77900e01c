//! Left-join of the aggregate views into one KPI row per build version.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::aggregate::{
    AggregateViews, AiDecisionQuality, KittyEfficiency, PlayerStats, PositionStats,
    RoundEfficiency, StrategyUsage, TeamWinRate,
};
use crate::numbers::{MeanAccumulator, ratio, round_to, u64_to_f64};
use crate::quality::DataQuality;
use crate::records::TRICK_POSITION_LABELS;

/// Seat metrics pivoted onto a KPI row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PositionColumns {
    pub win_rate: Option<f64>,
    pub avg_points: Option<f64>,
    pub points_per_round: Option<f64>,
}

/// One merged row. Fields stay `None` when the view that supplies them has
/// no entry for the version.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiRow {
    pub build_version: String,
    pub total_games: u64,
    pub attacking_team_win_rate: Option<f64>,
    pub defending_team_win_rate: Option<f64>,
    pub total_rounds: Option<u64>,
    pub avg_final_points: Option<f64>,
    pub attacking_round_win_rate: Option<f64>,
    pub avg_attacking_win_points: Option<f64>,
    pub avg_defending_win_points: Option<f64>,
    pub avg_rounds_per_game: Option<f64>,
    /// Keyed by 1-based seat position.
    pub positions: BTreeMap<u32, PositionColumns>,
    pub avg_player_win_rate: Option<f64>,
    pub avg_points_per_trick: Option<f64>,
    pub kitty_events: Option<u64>,
    pub avg_kitty_points: Option<f64>,
    pub total_decisions: Option<u64>,
    pub avg_decision_score: Option<f64>,
    pub reasoning_rate: Option<f64>,
    pub attacking_decision_rate: Option<f64>,
    pub leading_decision_rate: Option<f64>,
    /// Mean AI score for the canonical trick positions that were reported.
    pub position_scores: BTreeMap<String, Option<f64>>,
    /// Most used decision points; reported alongside the row, not as columns.
    pub strategies: StrategyUsage,
}

impl KpiRow {
    fn new(build_version: String, total_games: u64) -> Self {
        Self {
            build_version,
            total_games,
            ..Self::default()
        }
    }

    /// Seat metrics for a 1-based seat, when any trick was observed there.
    #[must_use]
    pub fn position(&self, seat: u32) -> Option<&PositionColumns> {
        self.positions.get(&seat)
    }

    fn join_team(&mut self, team: &TeamWinRate) {
        self.attacking_team_win_rate = team.attacking_team_win_rate;
        self.defending_team_win_rate = team.defending_team_win_rate;
    }

    fn join_rounds(&mut self, rounds: &RoundEfficiency) {
        self.total_rounds = Some(rounds.total_rounds);
        self.avg_final_points = rounds.avg_final_points;
        self.attacking_round_win_rate = rounds.attacking_round_win_rate;
        self.avg_attacking_win_points = rounds.avg_attacking_win_points;
        self.avg_defending_win_points = rounds.avg_defending_win_points;
        self.avg_rounds_per_game = ratio(u64_to_f64(rounds.total_rounds), u64_to_f64(self.total_games))
            .map(|v| round_to(v, 1));
    }

    fn join_position(&mut self, stats: &PositionStats) {
        self.positions.insert(
            stats.seat_position,
            PositionColumns {
                win_rate: stats.win_rate,
                avg_points: stats.avg_points_when_winning,
                points_per_round: stats.points_per_round,
            },
        );
    }

    fn join_players(&mut self, players: &PlayerAverages) {
        self.avg_player_win_rate = players.win_rate.rounded_mean(3);
        self.avg_points_per_trick = players.points_per_trick.rounded_mean(2);
    }

    fn join_kitty(&mut self, kitty: &KittyEfficiency) {
        self.kitty_events = Some(kitty.kitty_events);
        self.avg_kitty_points = kitty.avg_kitty_points;
    }

    fn join_ai(&mut self, ai: &AiDecisionQuality) {
        self.total_decisions = Some(ai.total_decisions);
        self.avg_decision_score = ai.avg_decision_score;
        self.reasoning_rate = ai.reasoning_rate;
        self.attacking_decision_rate = ai.attacking_decision_rate;
        self.leading_decision_rate = ai.leading_decision_rate;
        self.position_scores = TRICK_POSITION_LABELS
            .iter()
            .filter_map(|label| {
                ai.position_scores
                    .get(*label)
                    .map(|score| ((*label).to_string(), *score))
            })
            .collect();
        self.strategies = ai.strategies.clone();
    }
}

#[derive(Debug, Default)]
struct PlayerAverages {
    win_rate: MeanAccumulator,
    points_per_trick: MeanAccumulator,
}

fn player_averages(players: &[PlayerStats]) -> BTreeMap<&str, PlayerAverages> {
    let mut averages: BTreeMap<&str, PlayerAverages> = BTreeMap::new();
    for player in players {
        let entry = averages.entry(player.build_version.as_str()).or_default();
        entry.win_rate.add_opt(player.win_rate);
        entry.points_per_trick.add_opt(player.avg_points_per_trick);
    }
    averages
}

/// The final report: merged rows in ascending version order plus the data
/// quality summary of the run that produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiReport {
    pub rows: Vec<KpiRow>,
    pub quality: DataQuality,
}

impl KpiReport {
    #[must_use]
    pub fn row(&self, build_version: &str) -> Option<&KpiRow> {
        self.rows.iter().find(|row| row.build_version == build_version)
    }

    #[must_use]
    pub fn total_games(&self) -> u64 {
        self.rows.iter().map(|row| row.total_games).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Left-join every view onto the game counts.
///
/// Join order is team, rounds, positions, players, kitty, then AI. Versions
/// that never logged a `game_over` are dropped.
#[must_use]
pub fn merge_views(views: &AggregateViews, quality: DataQuality) -> KpiReport {
    let mut rows: BTreeMap<&str, KpiRow> = views
        .game_counts
        .iter()
        .map(|count| {
            (
                count.build_version.as_str(),
                KpiRow::new(count.build_version.clone(), count.total_games),
            )
        })
        .collect();

    for team in &views.team_win_rates {
        if let Some(row) = rows.get_mut(team.build_version.as_str()) {
            row.join_team(team);
        }
    }
    for rounds in &views.round_efficiency {
        if let Some(row) = rows.get_mut(rounds.build_version.as_str()) {
            row.join_rounds(rounds);
        }
    }
    for stats in &views.position_stats {
        if let Some(row) = rows.get_mut(stats.build_version.as_str()) {
            row.join_position(stats);
        }
    }
    for (version, averages) in player_averages(&views.player_stats) {
        if let Some(row) = rows.get_mut(version) {
            row.join_players(&averages);
        }
    }
    for kitty in &views.kitty_efficiency {
        if let Some(row) = rows.get_mut(kitty.build_version.as_str()) {
            row.join_kitty(kitty);
        }
    }
    for ai in &views.ai_decisions {
        if let Some(row) = rows.get_mut(ai.build_version.as_str()) {
            row.join_ai(ai);
        }
    }

    KpiReport {
        rows: rows.into_values().collect(),
        quality,
    }
}
