use serde::Serialize;
use std::collections::BTreeMap;

use crate::flatten::PlayObservation;
use crate::numbers::{MeanAccumulator, rounded_ratio};

/// Trick outcomes for one player of one build version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStats {
    pub build_version: String,
    pub player_id: String,
    pub total_tricks: u64,
    pub tricks_won: u64,
    pub total_points_won: f64,
    pub win_rate: Option<f64>,
    pub avg_points_per_trick: Option<f64>,
}

#[derive(Debug, Default)]
struct PlayerBuilder {
    total: usize,
    won: usize,
    /// Points each trick earned the player: 0 when lost, absent when a won
    /// trick did not log `trickPoints`.
    points_per_trick: MeanAccumulator,
}

/// Group observations by version and player id; plays without a player id
/// are left out.
#[must_use]
pub fn player_stats(observations: &[PlayObservation]) -> Vec<PlayerStats> {
    let mut builders: BTreeMap<(&str, &str), PlayerBuilder> = BTreeMap::new();
    for observation in observations {
        let (Some(version), Some(player)) = (
            observation.build_version.as_deref(),
            observation.player_id.as_deref(),
        ) else {
            continue;
        };
        let builder = builders.entry((version, player)).or_default();
        builder.total += 1;
        if observation.won_trick {
            builder.won += 1;
            builder.points_per_trick.add_opt(observation.trick_points);
        } else {
            builder.points_per_trick.add(0.0);
        }
    }
    builders
        .into_iter()
        .map(|((version, player), b)| PlayerStats {
            build_version: version.to_string(),
            player_id: player.to_string(),
            total_tricks: u64::try_from(b.total).unwrap_or(u64::MAX),
            tricks_won: u64::try_from(b.won).unwrap_or(u64::MAX),
            total_points_won: b.points_per_trick.sum(),
            win_rate: rounded_ratio(b.won, b.total, 3),
            avg_points_per_trick: b.points_per_trick.rounded_mean(2),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(player: Option<&str>, won: bool, points: Option<f64>) -> PlayObservation {
        PlayObservation {
            build_version: Some("1.0".to_string()),
            game_id: Some("g1".to_string()),
            player_id: player.map(str::to_string),
            seat_position: 1,
            won_trick: won,
            trick_points: points,
        }
    }

    #[test]
    fn per_player_rates_and_points() {
        let observations = vec![
            observation(Some("alice"), true, Some(20.0)),
            observation(Some("alice"), false, Some(5.0)),
            observation(Some("alice"), true, None),
            observation(Some("bob"), false, Some(20.0)),
            observation(None, true, Some(10.0)),
        ];
        let stats = player_stats(&observations);
        assert_eq!(stats.len(), 2);
        let alice = &stats[0];
        assert_eq!(alice.player_id, "alice");
        assert_eq!(alice.total_tricks, 3);
        assert_eq!(alice.tricks_won, 2);
        assert_eq!(alice.win_rate, Some(0.667));
        assert_eq!(alice.total_points_won, 20.0);
        // The won trick without points is left out: (20 + 0) / 2.
        assert_eq!(alice.avg_points_per_trick, Some(10.0));
        let bob = &stats[1];
        assert_eq!(bob.win_rate, Some(0.0));
        assert_eq!(bob.avg_points_per_trick, Some(0.0));
    }

    #[test]
    fn empty_observations_give_empty_view() {
        assert!(player_stats(&[]).is_empty());
    }
}
