use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::UsageSample;

const MS_PER_MINUTE: u64 = 60_000;

/// Per-package totals over one query window. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageAggregate {
    pub package_id: String,
    pub total_foreground_ms: u64,
    /// Latest `last_used_at_ms` among contributing samples, 0 if none usable.
    pub last_used_at_ms: u64,
}

/// Fold samples into one entry per package, most used first.
///
/// Samples with no positive foreground time are dropped before grouping, so
/// a package appears only if at least one of its samples counted. Equal
/// totals keep the order in which their packages were first seen.
pub fn aggregate(samples: &[UsageSample]) -> Vec<UsageAggregate> {
    let mut by_package: IndexMap<&str, UsageAggregate> = IndexMap::new();

    for sample in samples.iter().filter(|s| s.total_foreground_ms > 0) {
        let entry = by_package
            .entry(sample.package_id.as_str())
            .or_insert_with(|| UsageAggregate {
                package_id: sample.package_id.clone(),
                total_foreground_ms: 0,
                last_used_at_ms: 0,
            });
        entry.total_foreground_ms = entry
            .total_foreground_ms
            .saturating_add(sample.total_foreground_ms as u64);
        entry.last_used_at_ms = entry.last_used_at_ms.max(sample.last_used_at_ms.max(0) as u64);
    }

    let mut aggregates: Vec<UsageAggregate> = by_package.into_values().collect();
    // sort_by is stable
    aggregates.sort_by(|a, b| b.total_foreground_ms.cmp(&a.total_foreground_ms));
    aggregates
}

pub fn total_foreground_ms(aggregates: &[UsageAggregate]) -> u64 {
    aggregates
        .iter()
        .fold(0u64, |acc, a| acc.saturating_add(a.total_foreground_ms))
}

/// Whole minutes, rounding half up.
pub fn total_minutes(total_ms: u64) -> u64 {
    total_ms.saturating_add(MS_PER_MINUTE / 2) / MS_PER_MINUTE
}
