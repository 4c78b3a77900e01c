use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::records::GameEnd;

/// Completed games per build version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameCount {
    pub build_version: String,
    pub total_games: u64,
}

/// Count distinct `gameId`s among `game_over` events, per version.
///
/// Duplicated events do not change the count. A version whose `game_over`
/// events all lack a game id still appears, with zero games.
#[must_use]
pub fn game_counts(game_ends: &[GameEnd]) -> Vec<GameCount> {
    let mut games: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for end in game_ends {
        let Some(version) = end.build_version.as_deref() else {
            continue;
        };
        let ids = games.entry(version).or_default();
        if let Some(game_id) = end.game_id.as_deref() {
            ids.insert(game_id);
        }
    }
    games
        .into_iter()
        .map(|(version, ids)| GameCount {
            build_version: version.to_string(),
            total_games: u64::try_from(ids.len()).unwrap_or(u64::MAX),
        })
        .collect()
}
