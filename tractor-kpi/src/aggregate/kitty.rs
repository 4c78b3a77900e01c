use serde::Serialize;
use std::collections::BTreeMap;

use crate::numbers::MeanAccumulator;
use crate::records::KittyPickup;

/// Kitty pickups per build version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KittyEfficiency {
    pub build_version: String,
    pub kitty_events: u64,
    pub avg_kitty_points: Option<f64>,
}

#[must_use]
pub fn kitty_efficiency(pickups: &[KittyPickup]) -> Vec<KittyEfficiency> {
    let mut builders: BTreeMap<&str, (u64, MeanAccumulator)> = BTreeMap::new();
    for pickup in pickups {
        let Some(version) = pickup.build_version.as_deref() else {
            continue;
        };
        let (events, points) = builders.entry(version).or_default();
        *events += 1;
        points.add_opt(pickup.kitty_points);
    }
    builders
        .into_iter()
        .map(|(version, (kitty_events, points))| KittyEfficiency {
            build_version: version.to_string(),
            kitty_events,
            avg_kitty_points: points.rounded_mean(2),
        })
        .collect()
}
