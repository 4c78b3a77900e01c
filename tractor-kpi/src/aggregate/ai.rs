use serde::Serialize;
use std::collections::BTreeMap;

use crate::numbers::MeanAccumulator;
use crate::records::{AiDecision, DecisionStyle};

/// Decision quality of the AI players for one build version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiDecisionQuality {
    pub build_version: String,
    pub total_decisions: u64,
    pub avg_decision_score: Option<f64>,
    pub reasoning_rate: Option<f64>,
    /// Share of decisions made by the attacking team, over decisions that
    /// reported a side.
    pub attacking_decision_rate: Option<f64>,
    pub leading_decision_rate: Option<f64>,
    /// Mean score keyed by trick position label.
    pub position_scores: BTreeMap<String, Option<f64>>,
    pub strategies: StrategyUsage,
}

/// Most used decision points, split by leading and following.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StrategyUsage {
    pub leading: Vec<(String, u64)>,
    pub following: Vec<(String, u64)>,
}

impl StrategyUsage {
    /// Decision points kept per style.
    pub const TOP_N: usize = 5;

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.following.is_empty()
    }
}

/// Highest counts first, ties broken by name.
fn top_counts(counts: BTreeMap<&str, u64>, limit: usize) -> Vec<(String, u64)> {
    let mut ranked: Vec<(&str, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(name, count)| (name.to_string(), count))
        .collect()
}

impl AiDecisionQuality {
    /// Mean score for a trick position label, if any decision reported it.
    #[must_use]
    pub fn position_score(&self, label: &str) -> Option<f64> {
        self.position_scores.get(label).copied().flatten()
    }
}

#[derive(Debug, Default)]
struct DecisionBuilder<'a> {
    total: u64,
    score: MeanAccumulator,
    reasoning: MeanAccumulator,
    attacking: MeanAccumulator,
    leading: MeanAccumulator,
    by_position: BTreeMap<&'a str, MeanAccumulator>,
    leading_points: BTreeMap<&'a str, u64>,
    following_points: BTreeMap<&'a str, u64>,
}

impl<'a> DecisionBuilder<'a> {
    fn ingest(&mut self, decision: &'a AiDecision) {
        self.total += 1;
        self.score.add_opt(decision.score);
        self.reasoning.add_flag(decision.has_reasoning);
        if let Some(attacking) = decision.is_attacking_team {
            self.attacking.add_flag(attacking);
        }
        self.leading
            .add_flag(decision.style == DecisionStyle::Leading);
        if let Some(position) = decision.trick_position.as_deref() {
            self.by_position
                .entry(position)
                .or_default()
                .add_opt(decision.score);
        }
        if let Some(point) = decision.decision_point.as_deref() {
            let usage = match decision.style {
                DecisionStyle::Leading => &mut self.leading_points,
                DecisionStyle::Following => &mut self.following_points,
            };
            *usage.entry(point).or_insert(0) += 1;
        }
    }

    fn finish(self, build_version: String) -> AiDecisionQuality {
        AiDecisionQuality {
            build_version,
            total_decisions: self.total,
            avg_decision_score: self.score.rounded_mean(3),
            reasoning_rate: self.reasoning.rounded_mean(3),
            attacking_decision_rate: self.attacking.rounded_mean(3),
            leading_decision_rate: self.leading.rounded_mean(3),
            position_scores: self
                .by_position
                .into_iter()
                .map(|(label, scores)| (label.to_string(), scores.rounded_mean(3)))
                .collect(),
            strategies: StrategyUsage {
                leading: top_counts(self.leading_points, StrategyUsage::TOP_N),
                following: top_counts(self.following_points, StrategyUsage::TOP_N),
            },
        }
    }
}

/// Aggregate leading and following decisions per version.
#[must_use]
pub fn ai_decision_quality(decisions: &[AiDecision]) -> Vec<AiDecisionQuality> {
    let mut builders: BTreeMap<&str, DecisionBuilder<'_>> = BTreeMap::new();
    for decision in decisions {
        if let Some(version) = decision.build_version.as_deref() {
            builders.entry(version).or_default().ingest(decision);
        }
    }
    builders
        .into_iter()
        .map(|(version, builder)| builder.finish(version.to_string()))
        .collect()
}
