use log::debug;

use crate::event::{EventKind, LogEvent};
use crate::quality::DataQuality;
use crate::records::{
    AiDecision, DecisionStyle, GameEnd, GameStart, KittyPickup, RoundOutcome, RoundSide,
    TrickRecord, decode_decision, decode_game_end, decode_game_start, decode_kitty, decode_round,
    decode_trick,
};

/// Log events partitioned into typed record sets by event kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedEvents {
    pub game_starts: Vec<GameStart>,
    pub game_ends: Vec<GameEnd>,
    pub tricks: Vec<TrickRecord>,
    pub rounds: Vec<RoundOutcome>,
    pub kitty_pickups: Vec<KittyPickup>,
    pub ai_decisions: Vec<AiDecision>,
    /// Events of kinds no view consumes, kept as read.
    pub unrouted: Vec<LogEvent>,
}

impl ClassifiedEvents {
    /// Route every event by kind. Unknown kinds land in `unrouted`.
    pub fn classify<I>(events: I, quality: &mut DataQuality) -> Self
    where
        I: IntoIterator<Item = LogEvent>,
    {
        let mut classified = Self::default();
        for event in events {
            classified.push(event, quality);
        }
        debug!(
            "classified {} routed and {} unrouted events",
            classified.routed_len(),
            classified.unrouted.len()
        );
        classified
    }

    pub fn push(&mut self, event: LogEvent, quality: &mut DataQuality) {
        if !matches!(event.kind, EventKind::Other(_)) {
            if event.build_version.is_none() {
                quality.unversioned_events += 1;
            }
            if event.game_id.is_none() {
                quality.record_missing(event.kind.as_str(), "gameId");
            }
        }
        match event.kind {
            EventKind::GameInitialized => self.game_starts.push(decode_game_start(event, quality)),
            EventKind::GameOver => self.game_ends.push(decode_game_end(event, quality)),
            EventKind::TrickCompleted => self.tricks.push(decode_trick(event, quality)),
            EventKind::AttackingTeamVictory => {
                self.rounds
                    .push(decode_round(event, RoundSide::Attacking, quality));
            }
            EventKind::DefendingTeamVictory => {
                self.rounds
                    .push(decode_round(event, RoundSide::Defending, quality));
            }
            EventKind::KittyPickup => self.kitty_pickups.push(decode_kitty(event, quality)),
            EventKind::AiLeadingDecision => {
                self.ai_decisions
                    .push(decode_decision(event, DecisionStyle::Leading, quality));
            }
            EventKind::AiFollowingDecision => {
                self.ai_decisions
                    .push(decode_decision(event, DecisionStyle::Following, quality));
            }
            EventKind::Other(_) => {
                quality.unrouted_events += 1;
                self.unrouted.push(event);
            }
        }
    }

    #[must_use]
    pub fn routed_len(&self) -> usize {
        self.game_starts.len()
            + self.game_ends.len()
            + self.tricks.len()
            + self.rounds.len()
            + self.kitty_pickups.len()
            + self.ai_decisions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routed_len() == 0 && self.unrouted.is_empty()
    }
}
