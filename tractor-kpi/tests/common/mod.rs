#![allow(dead_code)]

use serde_json::{Value, json};
use tractor_kpi::{AnalysisConfig, KpiPipeline, KpiReport, MemorySource};

pub fn line(event: &str, version: &str, game: &str, data: Value) -> String {
    json!({
        "timestamp": "2025-07-01T10:00:00.000Z",
        "event": event,
        "appVersion": version,
        "gameId": game,
        "level": "info",
        "message": event,
        "data": data,
    })
    .to_string()
}

pub fn trick(version: &str, game: &str, players: &[&str], winner: &str, points: u32) -> String {
    let plays: Vec<Value> = players
        .iter()
        .map(|player| json!({"playerId": player, "cards": []}))
        .collect();
    line(
        "trick_completed",
        version,
        game,
        json!({"winningPlayer": winner, "trickPoints": points, "allPlays": plays}),
    )
}

pub fn game_start(version: &str, game: &str, attacking: &str, defending: &str) -> String {
    line(
        "game_initialized",
        version,
        game,
        json!({"attackingTeam": attacking, "defendingTeam": defending}),
    )
}

pub fn game_over(version: &str, game: &str, winner: &str) -> String {
    line("game_over", version, game, json!({"winner": winner}))
}

pub fn attacking_win(version: &str, game: &str, final_points: u32) -> String {
    line(
        "attacking_team_victory",
        version,
        game,
        json!({"finalPoints": final_points}),
    )
}

pub fn defending_win(version: &str, game: &str, attacking_points: u32) -> String {
    line(
        "defending_team_victory",
        version,
        game,
        json!({"attackingTeamPoints": attacking_points}),
    )
}

pub fn kitty(version: &str, game: &str, points: u32) -> String {
    line("kitty_pickup", version, game, json!({"kittyPoints": points}))
}

pub fn decision(
    event: &str,
    version: &str,
    game: &str,
    point: &str,
    position: Value,
    attacking: bool,
    score: f64,
) -> String {
    line(
        event,
        version,
        game,
        json!({
            "player": "bot_1",
            "decisionPoint": point,
            "context": {
                "isAttackingTeam": attacking,
                "trickPosition": position,
                "pointPressure": "low",
            },
            "reasoning": ["holding trump"],
            "score": score,
        }),
    )
}

pub fn analyze(lines: &[String]) -> KpiReport {
    analyze_with(lines, AnalysisConfig::default())
}

pub fn analyze_with(lines: &[String], config: AnalysisConfig) -> KpiReport {
    let pipeline = KpiPipeline::new(config).expect("valid config");
    let source = MemorySource::new().with_stream("sim.log", lines.join("\n"));
    pipeline.run(&source).expect("report")
}
