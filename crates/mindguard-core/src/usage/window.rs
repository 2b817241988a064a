use chrono::{DateTime, Duration, Utc};

/// Half-open query interval handed to the usage source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl UsageWindow {
    /// The `length` immediately preceding `now`.
    pub fn trailing(length: std::time::Duration, now: DateTime<Utc>) -> Self {
        let length = Duration::from_std(length).unwrap_or_else(|_| Duration::hours(1));
        Self {
            start: now.checked_sub_signed(length).unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: now,
        }
    }

    /// Whole days back from `now`, clamped to at least one day.
    pub fn days_back(days_back: f64, now: DateTime<Utc>) -> Self {
        let days = i64::from(clamp_days_back(days_back));
        Self {
            start: now
                .checked_sub_signed(Duration::days(days))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: now,
        }
    }

    pub fn start_ms(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_ms(&self) -> i64 {
        self.end.timestamp_millis()
    }
}

/// Floor to whole days; anything below one (negative, NaN) becomes one.
pub fn clamp_days_back(days_back: f64) -> u32 {
    if days_back.is_nan() || days_back < 1.0 {
        1
    } else if days_back >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        days_back.floor() as u32
    }
}
