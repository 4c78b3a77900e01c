use serde::Serialize;

use crate::quality::{DataQuality, DataWarning};
use crate::records::TrickRecord;

/// One play of one trick, seen from the seat it was made from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayObservation {
    pub build_version: Option<String>,
    pub game_id: Option<String>,
    pub player_id: Option<String>,
    /// 1-based index into the logged play order, not a rule-based seat.
    pub seat_position: u32,
    pub won_trick: bool,
    pub trick_points: Option<f64>,
}

/// Expand every trick into one observation per logged play.
///
/// Tricks with no plays contribute nothing. A trick whose winner matches
/// zero or several plays is reported as a [`DataWarning::WinnerMismatch`] and
/// flattened as-is.
pub fn flatten_tricks(tricks: &[TrickRecord], quality: &mut DataQuality) -> Vec<PlayObservation> {
    let total_plays = tricks.iter().map(|trick| trick.plays.len()).sum();
    let mut observations = Vec::with_capacity(total_plays);
    for trick in tricks {
        flatten_trick(trick, &mut observations, quality);
    }
    observations
}

fn flatten_trick(
    trick: &TrickRecord,
    observations: &mut Vec<PlayObservation>,
    quality: &mut DataQuality,
) {
    if trick.plays.is_empty() {
        return;
    }
    let mut winners = 0_usize;
    for (seat_position, play) in (1_u32..).zip(trick.plays.iter()) {
        let won_trick = match (&play.player_id, &trick.winning_player) {
            (Some(player), Some(winner)) => player == winner,
            _ => false,
        };
        if won_trick {
            winners += 1;
        }
        observations.push(PlayObservation {
            build_version: trick.build_version.clone(),
            game_id: trick.game_id.clone(),
            player_id: play.player_id.clone(),
            seat_position,
            won_trick,
            trick_points: trick.trick_points,
        });
    }
    // A missing winner is already tallied as a missing field.
    if let Some(winner) = &trick.winning_player
        && winners != 1
    {
        quality.push_warning(DataWarning::WinnerMismatch {
            build_version: trick.build_version.clone(),
            game_id: trick.game_id.clone(),
            winner: winner.clone(),
            matches: winners,
        });
    }
}
