use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::numbers::MeanAccumulator;
use crate::quality::{DataQuality, DataWarning};
use crate::records::{GameEnd, GameStart};

/// Attacking vs defending team win rates per build version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamWinRate {
    pub build_version: String,
    pub total_games_with_roles: u64,
    pub attacking_team_win_rate: Option<f64>,
    pub defending_team_win_rate: Option<f64>,
}

#[derive(Debug, Default)]
struct TeamBuilder {
    joined: u64,
    attacking_won: MeanAccumulator,
    defending_won: MeanAccumulator,
}

impl TeamBuilder {
    fn ingest(&mut self, start: &GameStart, winner: Option<&str>) {
        self.joined += 1;
        let won_by = |team: Option<&str>| matches!((team, winner), (Some(t), Some(w)) if t == w);
        self.attacking_won
            .add_flag(won_by(start.attacking_team.as_deref()));
        self.defending_won
            .add_flag(won_by(start.defending_team.as_deref()));
    }

    fn finish(self, build_version: String) -> TeamWinRate {
        TeamWinRate {
            build_version,
            total_games_with_roles: self.joined,
            attacking_team_win_rate: self.attacking_won.rounded_mean(3),
            defending_team_win_rate: self.defending_won.rounded_mean(3),
        }
    }
}

/// Join `game_initialized` to `game_over` on game id and average who won.
///
/// The join is pairwise like a SQL inner join, so duplicated events scale
/// every pair uniformly and leave the rates unchanged. Games whose
/// `game_over` events disagree on the winner raise a warning.
pub fn team_win_rates(
    starts: &[GameStart],
    ends: &[GameEnd],
    quality: &mut DataQuality,
) -> Vec<TeamWinRate> {
    let mut winners_by_game: BTreeMap<&str, Vec<Option<&str>>> = BTreeMap::new();
    for end in ends {
        if let Some(game_id) = end.game_id.as_deref() {
            winners_by_game
                .entry(game_id)
                .or_default()
                .push(end.winner.as_deref());
        }
    }
    for (game_id, winners) in &winners_by_game {
        let distinct: BTreeSet<&str> = winners.iter().flatten().copied().collect();
        if distinct.len() > 1 {
            quality.push_warning(DataWarning::ConflictingGameOutcome {
                game_id: (*game_id).to_string(),
                winners: distinct.into_iter().map(str::to_string).collect(),
            });
        }
    }

    let mut builders: BTreeMap<&str, TeamBuilder> = BTreeMap::new();
    for start in starts {
        let (Some(version), Some(game_id)) = (start.build_version.as_deref(), start.game_id.as_deref())
        else {
            continue;
        };
        let Some(winners) = winners_by_game.get(game_id) else {
            continue;
        };
        let builder = builders.entry(version).or_default();
        for winner in winners {
            builder.ingest(start, *winner);
        }
    }

    builders
        .into_iter()
        .map(|(version, builder)| builder.finish(version.to_string()))
        .collect()
}
