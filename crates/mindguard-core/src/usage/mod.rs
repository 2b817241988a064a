//! Usage statistics: raw per-interval samples and their aggregation.
//!
//! Nothing here performs I/O. Callers fetch the window's samples from a
//! [`UsageStatsSource`](crate::platform::UsageStatsSource) and hand them in.

mod aggregate;
mod window;

pub use aggregate::{aggregate, total_foreground_ms, total_minutes, UsageAggregate};
pub use window::{clamp_days_back, UsageWindow};

use serde::{Deserialize, Serialize};

/// One OS-reported record for a package within a daily bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSample {
    pub package_id: String,
    /// Foreground time in this bucket. Non-positive values carry no signal.
    pub total_foreground_ms: i64,
    #[serde(default)]
    pub last_used_at_ms: i64,
}

impl UsageSample {
    pub fn new(package_id: impl Into<String>, total_foreground_ms: i64, last_used_at_ms: i64) -> Self {
        Self {
            package_id: package_id.into(),
            total_foreground_ms,
            last_used_at_ms,
        }
    }
}

/// Row returned to the host by `get_usage_stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStatEntry {
    pub package_id: String,
    pub display_name: String,
    pub total_foreground_ms: u64,
    pub last_used_at: u64,
}
