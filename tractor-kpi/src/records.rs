//! Typed payload records, one per routed event kind.
//!
//! Each kind has its own decoder so no loosely-typed payload map travels past
//! classification. Absent or wrongly-typed fields decode as `None` and are
//! tallied as missing fields; they never reject the record.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smallvec::SmallVec;

use crate::event::{EventKind, LogEvent, id_text, lenient, lenient_id};
use crate::quality::DataQuality;

/// `game_initialized`: team roles for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameStart {
    pub build_version: Option<String>,
    pub game_id: Option<String>,
    pub attacking_team: Option<String>,
    pub defending_team: Option<String>,
}

/// `game_over`: the winning team of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameEnd {
    pub build_version: Option<String>,
    pub game_id: Option<String>,
    pub winner: Option<String>,
}

/// One play inside a trick, in the order it was logged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Play {
    pub player_id: Option<String>,
}

/// `trick_completed`: the winner, the points, and the ordered plays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrickRecord {
    pub build_version: Option<String>,
    pub game_id: Option<String>,
    pub winning_player: Option<String>,
    pub trick_points: Option<f64>,
    pub plays: SmallVec<[Play; 4]>,
}

/// Which team took the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundSide {
    Attacking,
    Defending,
}

/// Field that supplies `final_points` for each round outcome kind.
///
/// Attacking victories log the final tally as `finalPoints`; defending
/// victories log what the attackers did collect as `attackingTeamPoints`.
/// Both feed one column.
pub const ROUND_POINT_FIELDS: [(RoundSide, &str); 2] = [
    (RoundSide::Attacking, "finalPoints"),
    (RoundSide::Defending, "attackingTeamPoints"),
];

impl RoundSide {
    #[must_use]
    pub fn from_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::AttackingTeamVictory => Some(Self::Attacking),
            EventKind::DefendingTeamVictory => Some(Self::Defending),
            _ => None,
        }
    }

    #[must_use]
    pub fn points_field(self) -> &'static str {
        ROUND_POINT_FIELDS
            .iter()
            .find_map(|&(side, field)| (side == self).then_some(field))
            .unwrap_or("finalPoints")
    }

    #[must_use]
    pub const fn kind_name(self) -> &'static str {
        match self {
            Self::Attacking => "attacking_team_victory",
            Self::Defending => "defending_team_victory",
        }
    }
}

/// `attacking_team_victory` / `defending_team_victory`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundOutcome {
    pub build_version: Option<String>,
    pub game_id: Option<String>,
    pub side: RoundSide,
    pub final_points: Option<f64>,
}

/// `kitty_pickup`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KittyPickup {
    pub build_version: Option<String>,
    pub game_id: Option<String>,
    pub kitty_points: Option<f64>,
}

/// Whether the AI was leading the trick or following.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStyle {
    Leading,
    Following,
}

/// `ai_leading_decision` / `ai_following_decision`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiDecision {
    pub build_version: Option<String>,
    pub game_id: Option<String>,
    pub style: DecisionStyle,
    pub player: Option<String>,
    pub decision_point: Option<String>,
    pub is_attacking_team: Option<bool>,
    pub trick_position: Option<String>,
    pub point_pressure: Option<String>,
    pub score: Option<f64>,
    pub has_reasoning: bool,
}

/// Canonical labels for trick positions reported by the AI.
pub const TRICK_POSITION_LABELS: [&str; 4] = ["first", "second", "third", "fourth"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameStartPayload {
    #[serde(default, deserialize_with = "lenient_id")]
    attacking_team: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    defending_team: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GameEndPayload {
    #[serde(default, deserialize_with = "lenient_id")]
    winner: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrickPayload {
    #[serde(default, deserialize_with = "lenient_id")]
    winning_player: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    trick_points: Option<f64>,
    #[serde(default, alias = "plays", deserialize_with = "lenient")]
    all_plays: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KittyPayload {
    #[serde(default, deserialize_with = "lenient")]
    kitty_points: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecisionContext {
    #[serde(default, deserialize_with = "lenient")]
    is_attacking_team: Option<bool>,
    #[serde(default)]
    trick_position: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    point_pressure: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DecisionPayload {
    #[serde(default, deserialize_with = "lenient_id")]
    player: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    decision_point: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    context: Option<DecisionContext>,
    #[serde(default)]
    reasoning: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    score: Option<f64>,
}

fn decode<T: DeserializeOwned + Default>(payload: Map<String, Value>) -> T {
    T::deserialize(Value::Object(payload)).unwrap_or_default()
}

fn note_missing<T>(value: &Option<T>, kind: &str, field: &str, quality: &mut DataQuality) {
    if value.is_none() {
        quality.record_missing(kind, field);
    }
}

/// Map a trick position written as a label or a 1-based number to a label.
#[must_use]
pub fn trick_position_label(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let label = text.trim().to_ascii_lowercase();
            (!label.is_empty()).then_some(label)
        }
        Value::Number(number) => {
            let label = number
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .and_then(|n| n.checked_sub(1))
                .and_then(|idx| TRICK_POSITION_LABELS.get(idx))
                .map_or_else(|| number.to_string(), |label| (*label).to_string());
            Some(label)
        }
        _ => None,
    }
}

fn reasoning_present(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        _ => false,
    }
}

pub(crate) fn decode_game_start(event: LogEvent, quality: &mut DataQuality) -> GameStart {
    let kind = event.kind.as_str().to_string();
    let payload: GameStartPayload = decode(event.payload);
    note_missing(&payload.attacking_team, &kind, "attackingTeam", quality);
    note_missing(&payload.defending_team, &kind, "defendingTeam", quality);
    GameStart {
        build_version: event.build_version,
        game_id: event.game_id,
        attacking_team: payload.attacking_team,
        defending_team: payload.defending_team,
    }
}

pub(crate) fn decode_game_end(event: LogEvent, quality: &mut DataQuality) -> GameEnd {
    let payload: GameEndPayload = decode(event.payload);
    note_missing(&payload.winner, "game_over", "winner", quality);
    GameEnd {
        build_version: event.build_version,
        game_id: event.game_id,
        winner: payload.winner,
    }
}

pub(crate) fn decode_trick(event: LogEvent, quality: &mut DataQuality) -> TrickRecord {
    const KIND: &str = "trick_completed";
    let payload: TrickPayload = decode(event.payload);
    note_missing(&payload.winning_player, KIND, "winningPlayer", quality);
    note_missing(&payload.trick_points, KIND, "trickPoints", quality);
    note_missing(&payload.all_plays, KIND, "allPlays", quality);
    let plays = payload
        .all_plays
        .unwrap_or_default()
        .iter()
        .map(|play| Play {
            player_id: play.get("playerId").and_then(id_text),
        })
        .collect();
    TrickRecord {
        build_version: event.build_version,
        game_id: event.game_id,
        winning_player: payload.winning_player,
        trick_points: payload.trick_points,
        plays,
    }
}

pub(crate) fn decode_round(
    event: LogEvent,
    side: RoundSide,
    quality: &mut DataQuality,
) -> RoundOutcome {
    let field = side.points_field();
    let final_points = event.payload.get(field).and_then(Value::as_f64);
    note_missing(&final_points, side.kind_name(), field, quality);
    RoundOutcome {
        build_version: event.build_version,
        game_id: event.game_id,
        side,
        final_points,
    }
}

pub(crate) fn decode_kitty(event: LogEvent, quality: &mut DataQuality) -> KittyPickup {
    let payload: KittyPayload = decode(event.payload);
    note_missing(&payload.kitty_points, "kitty_pickup", "kittyPoints", quality);
    KittyPickup {
        build_version: event.build_version,
        game_id: event.game_id,
        kitty_points: payload.kitty_points,
    }
}

pub(crate) fn decode_decision(
    event: LogEvent,
    style: DecisionStyle,
    quality: &mut DataQuality,
) -> AiDecision {
    let kind = event.kind.as_str().to_string();
    let payload: DecisionPayload = decode(event.payload);
    let context = payload.context.unwrap_or_default();
    let trick_position = context.trick_position.as_ref().and_then(trick_position_label);
    note_missing(&payload.score, &kind, "score", quality);
    note_missing(&payload.reasoning, &kind, "reasoning", quality);
    note_missing(&context.is_attacking_team, &kind, "context.isAttackingTeam", quality);
    note_missing(&trick_position, &kind, "context.trickPosition", quality);
    AiDecision {
        build_version: event.build_version,
        game_id: event.game_id,
        style,
        player: payload.player,
        decision_point: payload.decision_point,
        is_attacking_team: context.is_attacking_team,
        trick_position,
        point_pressure: context.point_pressure,
        score: payload.score,
        has_reasoning: reasoning_present(payload.reasoning.as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(line: &str) -> LogEvent {
        LogEvent::parse_line(line).expect("valid test line")
    }

    #[test]
    fn round_points_follow_the_field_table() {
        assert_eq!(RoundSide::Attacking.points_field(), "finalPoints");
        assert_eq!(RoundSide::Defending.points_field(), "attackingTeamPoints");

        let mut quality = DataQuality::default();
        let attacking = decode_round(
            event(r#"{"timestamp":"t","event":"attacking_team_victory","appVersion":"v","data":{"finalPoints":95,"attackingTeamPoints":10}}"#),
            RoundSide::Attacking,
            &mut quality,
        );
        assert_eq!(attacking.final_points, Some(95.0));

        let defending = decode_round(
            event(r#"{"timestamp":"t","event":"defending_team_victory","appVersion":"v","data":{"finalPoints":120,"attackingTeamPoints":40}}"#),
            RoundSide::Defending,
            &mut quality,
        );
        assert_eq!(defending.final_points, Some(40.0));
        assert!(quality.missing_fields.is_empty());
    }

    #[test]
    fn round_without_points_is_kept_and_counted() {
        let mut quality = DataQuality::default();
        let round = decode_round(
            event(r#"{"timestamp":"t","event":"defending_team_victory","data":{"finalPoints":80}}"#),
            RoundSide::Defending,
            &mut quality,
        );
        assert_eq!(round.final_points, None);
        assert_eq!(
            quality.missing("defending_team_victory", "attackingTeamPoints"),
            1
        );
    }

    #[test]
    fn trick_decoder_keeps_play_order_and_numeric_ids() {
        let mut quality = DataQuality::default();
        let trick = decode_trick(
            event(r#"{"timestamp":"t","event":"trick_completed","gameId":"g","data":{"winningPlayer":"B","trickPoints":15,"allPlays":[{"playerId":"A"},{"playerId":"B"},{"cards":[]},{"playerId":4}]}}"#),
            &mut quality,
        );
        let ids: Vec<_> = trick.plays.iter().map(|p| p.player_id.as_deref()).collect();
        assert_eq!(ids, vec![Some("A"), Some("B"), None, Some("4")]);
        assert_eq!(trick.trick_points, Some(15.0));
        assert!(!trick.plays.spilled());
    }

    #[test]
    fn trick_decoder_accepts_plays_alias_and_wrong_types() {
        let mut quality = DataQuality::default();
        let trick = decode_trick(
            event(r#"{"timestamp":"t","event":"trick_completed","data":{"winningPlayer":["B"],"trickPoints":"ten","plays":[{"playerId":"A"}]}}"#),
            &mut quality,
        );
        assert_eq!(trick.plays.len(), 1);
        assert_eq!(trick.winning_player, None);
        assert_eq!(trick.trick_points, None);
        assert_eq!(quality.missing("trick_completed", "winningPlayer"), 1);
        assert_eq!(quality.missing("trick_completed", "trickPoints"), 1);
        assert_eq!(quality.missing("trick_completed", "allPlays"), 0);
    }

    #[test]
    fn decision_decoder_reads_nested_context() {
        let mut quality = DataQuality::default();
        let decision = decode_decision(
            event(r#"{"timestamp":"t","event":"ai_following_decision","appVersion":"v","data":{"player":"bot_2","decisionPoint":"follow_trump","score":0.8,"reasoning":["cheap trump"],"context":{"isAttackingTeam":true,"trickPosition":3,"pointPressure":"high"}}}"#),
            DecisionStyle::Following,
            &mut quality,
        );
        assert_eq!(decision.trick_position.as_deref(), Some("third"));
        assert_eq!(decision.is_attacking_team, Some(true));
        assert_eq!(decision.score, Some(0.8));
        assert!(decision.has_reasoning);
        assert!(quality.missing_fields.is_empty());
    }

    #[test]
    fn decision_decoder_tolerates_missing_context() {
        let mut quality = DataQuality::default();
        let decision = decode_decision(
            event(r#"{"timestamp":"t","event":"ai_leading_decision","data":{"reasoning":[]}}"#),
            DecisionStyle::Leading,
            &mut quality,
        );
        assert!(!decision.has_reasoning);
        assert_eq!(decision.trick_position, None);
        assert_eq!(quality.missing("ai_leading_decision", "score"), 1);
        assert_eq!(
            quality.missing("ai_leading_decision", "context.isAttackingTeam"),
            1
        );
    }

    #[test]
    fn trick_position_labels_normalize() {
        assert_eq!(
            trick_position_label(&Value::from("  First ")).as_deref(),
            Some("first")
        );
        assert_eq!(trick_position_label(&Value::from(4)).as_deref(), Some("fourth"));
        assert_eq!(trick_position_label(&Value::from(6)).as_deref(), Some("6"));
        assert_eq!(trick_position_label(&Value::Null), None);
    }
}
