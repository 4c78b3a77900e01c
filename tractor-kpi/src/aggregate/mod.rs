//! The seven grouped views computed from classified events and play
//! observations. Every view is keyed on build version and ordered by its key.

pub mod ai;
pub mod games;
pub mod kitty;
pub mod players;
pub mod positions;
pub mod rounds;
pub mod teams;

use log::debug;
use serde::Serialize;

pub use ai::{AiDecisionQuality, StrategyUsage, ai_decision_quality};
pub use games::{GameCount, game_counts};
pub use kitty::{KittyEfficiency, kitty_efficiency};
pub use players::{PlayerStats, player_stats};
pub use positions::{PositionStats, approximate_round_count, exact_round_counts, position_stats};
pub use rounds::{RoundEfficiency, round_counts, round_efficiency};
pub use teams::{TeamWinRate, team_win_rates};

use crate::classify::ClassifiedEvents;
use crate::config::{AnalysisConfig, RoundBasis};
use crate::flatten::PlayObservation;
use crate::quality::DataQuality;

/// All views for one run, before merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateViews {
    pub game_counts: Vec<GameCount>,
    pub team_win_rates: Vec<TeamWinRate>,
    pub position_stats: Vec<PositionStats>,
    pub player_stats: Vec<PlayerStats>,
    pub round_efficiency: Vec<RoundEfficiency>,
    pub ai_decisions: Vec<AiDecisionQuality>,
    pub kitty_efficiency: Vec<KittyEfficiency>,
}

impl AggregateViews {
    /// Compute every view. Views are independent; an empty input set yields
    /// an empty view rather than an error.
    pub fn compute(
        classified: &ClassifiedEvents,
        observations: &[PlayObservation],
        config: &AnalysisConfig,
        quality: &mut DataQuality,
    ) -> Self {
        let position_stats = match config.round_basis {
            RoundBasis::Approximate => {
                let rounds = approximate_round_count(observations, config.seats_per_trick);
                position_stats(observations, |_| rounds)
            }
            RoundBasis::Exact => {
                let counts = round_counts(&classified.rounds);
                position_stats(observations, exact_round_counts(&counts))
            }
        };
        let views = Self {
            game_counts: game_counts(&classified.game_ends),
            team_win_rates: team_win_rates(&classified.game_starts, &classified.game_ends, quality),
            position_stats,
            player_stats: player_stats(observations),
            round_efficiency: round_efficiency(&classified.rounds),
            ai_decisions: ai_decision_quality(&classified.ai_decisions),
            kitty_efficiency: kitty_efficiency(&classified.kitty_pickups),
        };
        debug!(
            "aggregated {} versions, {} seat rows, {} player rows",
            views.game_counts.len(),
            views.position_stats.len(),
            views.player_stats.len()
        );
        views
    }
}
