mod common;

use std::hash::Hasher;

use common::{
    analyze, attacking_win, decision, defending_win, game_over, game_start, kitty, trick,
};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tractor_kpi::{AnalysisConfig, KpiPipeline, KpiReport, KpiValue, MemorySource};
use twox_hash::XxHash64;

const VERSIONS: [&str; 3] = ["1.0.0", "1.1.0", "1.2.0+dev.abc"];
const PLAYERS: [&str; 4] = ["p1", "p2", "p3", "p4"];

/// A seeded simulation log: a handful of games per version with tricks,
/// rounds, kitty pickups and AI decisions.
fn simulated_log(seed: u64) -> Vec<String> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut lines = Vec::new();
    for version in VERSIONS {
        for game in 0..rng.gen_range(2..5) {
            let game_id = format!("{version}-g{game}");
            let (attacking, defending) = if rng.gen_bool(0.5) {
                ("team_1", "team_2")
            } else {
                ("team_2", "team_1")
            };
            lines.push(game_start(version, &game_id, attacking, defending));
            for _ in 0..rng.gen_range(1..4) {
                lines.push(kitty(version, &game_id, rng.gen_range(0..6) * 5));
                let mut order = PLAYERS;
                for _ in 0..rng.gen_range(3..9) {
                    order.rotate_left(rng.gen_range(0..4));
                    let winner = order[rng.gen_range(0..4)];
                    lines.push(trick(version, &game_id, &order, winner, rng.gen_range(0..5) * 5));
                }
                for (idx, position) in ["first", "second", "third", "fourth"].iter().enumerate() {
                    let event = if idx == 0 {
                        "ai_leading_decision"
                    } else {
                        "ai_following_decision"
                    };
                    let point = ["trump_lead", "point_dump", "safe_follow"][rng.gen_range(0..3)];
                    let score = f64::from(rng.gen_range(0..5_u8)) * 0.25;
                    lines.push(decision(event, version, &game_id, point, json!(position), rng.gen_bool(0.5), score));
                }
                if rng.gen_bool(0.5) {
                    lines.push(attacking_win(version, &game_id, rng.gen_range(80..200)));
                } else {
                    lines.push(defending_win(version, &game_id, rng.gen_range(0..80)));
                }
            }
            let winner = if rng.gen_bool(0.5) { attacking } else { defending };
            lines.push(game_over(version, &game_id, winner));
        }
    }
    lines
}

fn csv_bytes(report: &KpiReport) -> Vec<u8> {
    let mut buffer = Vec::new();
    report.write_csv(&mut buffer).expect("write csv");
    buffer
}

fn snapshot_hash(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

fn is_rate_column(name: &str) -> bool {
    name.ends_with("_rate")
}

#[test]
fn rates_are_fractions_or_empty() {
    for seed in [1, 7, 42, 1234] {
        let report = analyze(&simulated_log(seed));
        let columns = report.columns();
        for cells in report.table() {
            for (name, cell) in columns.iter().zip(&cells) {
                if !is_rate_column(name) {
                    continue;
                }
                match cell {
                    KpiValue::Null => {}
                    KpiValue::Float(rate) => assert!(
                        (0.0..=1.0).contains(rate),
                        "{name} out of range: {rate}"
                    ),
                    other => panic!("{name} has non-rate value {other:?}"),
                }
            }
        }
    }
}

#[test]
fn every_play_becomes_one_observation() {
    let lines = simulated_log(99);
    let tricks = lines.iter().filter(|l| l.contains("trick_completed")).count();
    let pipeline = KpiPipeline::new(AnalysisConfig::default()).expect("valid config");
    let analysis = pipeline
        .run_detailed(&MemorySource::new().with_stream("sim.log", lines.join("\n")))
        .expect("analysis");
    let observed: u64 = analysis
        .views
        .position_stats
        .iter()
        .map(|s| s.total_tricks)
        .sum();
    assert_eq!(observed, u64::try_from(tricks * PLAYERS.len()).expect("fits"));
    assert!(!analysis.report.quality.has_warnings());
}

#[test]
fn duplicating_every_line_keeps_rates() {
    let lines = simulated_log(5);
    let doubled: Vec<String> = lines.iter().chain(lines.iter()).cloned().collect();
    let pipeline = KpiPipeline::new(AnalysisConfig::default()).expect("valid config");
    let single = pipeline
        .run_detailed(&MemorySource::new().with_stream("a.log", lines.join("\n")))
        .expect("analysis");
    let double = pipeline
        .run_detailed(&MemorySource::new().with_stream("a.log", doubled.join("\n")))
        .expect("analysis");

    for (one, two) in single.report.rows.iter().zip(&double.report.rows) {
        assert_eq!(one.total_games, two.total_games);
        assert_eq!(one.attacking_team_win_rate, two.attacking_team_win_rate);
        assert_eq!(one.defending_team_win_rate, two.defending_team_win_rate);
        assert_eq!(one.attacking_round_win_rate, two.attacking_round_win_rate);
        assert_eq!(one.reasoning_rate, two.reasoning_rate);
        assert_eq!(one.avg_kitty_points, two.avg_kitty_points);
        assert_eq!(one.total_rounds.map(|n| n * 2), two.total_rounds);
        assert_eq!(one.kitty_events.map(|n| n * 2), two.kitty_events);
        assert_eq!(one.total_decisions.map(|n| n * 2), two.total_decisions);
        for (seat, columns) in &one.positions {
            assert_eq!(Some(columns.win_rate), two.position(*seat).map(|c| c.win_rate));
        }
    }
    for (one, two) in single.views.position_stats.iter().zip(&double.views.position_stats) {
        assert_eq!(one.total_tricks * 2, two.total_tricks);
        assert_eq!(one.tricks_won * 2, two.tricks_won);
    }
    assert_eq!(
        single.report.quality.events_parsed * 2,
        double.report.quality.events_parsed
    );
}

#[test]
fn csv_is_stable_across_runs_and_line_order() {
    let lines = simulated_log(2024);
    let baseline = snapshot_hash(&csv_bytes(&analyze(&lines)));
    assert_eq!(baseline, snapshot_hash(&csv_bytes(&analyze(&lines))));

    let mut shuffled = lines.clone();
    shuffled.shuffle(&mut SmallRng::seed_from_u64(7));
    assert_eq!(baseline, snapshot_hash(&csv_bytes(&analyze(&shuffled))));

    let (head, tail) = lines.split_at(lines.len() / 2);
    let pipeline = KpiPipeline::new(AnalysisConfig::default()).expect("valid config");
    let split = pipeline
        .run(
            &MemorySource::new()
                .with_stream("b.log", tail.join("\n"))
                .with_stream("a.log", head.join("\n")),
        )
        .expect("report");
    assert_eq!(baseline, snapshot_hash(&csv_bytes(&split)));
}
