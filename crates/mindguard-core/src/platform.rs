//! Capabilities the host platform provides to the core.
//!
//! The engine, reporter and control surface only see these traits, so tests
//! and headless hosts can substitute synthetic implementations.

use tokio::sync::mpsc;

use crate::enforcement::BlockPrompt;
use crate::error::{CoreError, ServiceUnavailableError};
use crate::events::PlatformEvent;
use crate::usage::{UsageSample, UsageWindow};

/// Side effects of an intervention.
pub trait PlatformActions: Send + Sync {
    /// Leave the foreground app (platform "return to home").
    fn navigate_home(&self) -> Result<(), CoreError>;

    /// Schedule a modal prompt on the UI context and return immediately.
    /// Must not wait for the user to dismiss it.
    fn present_prompt(&self, prompt: &BlockPrompt) -> Result<(), CoreError>;
}

/// Source of foreground-change events.
pub trait ForegroundEventSource: Send + Sync {
    /// Start delivering events. Each call yields a fresh receiver; the feed
    /// ends when the sender side is dropped.
    fn subscribe(&self) -> Result<mpsc::Receiver<PlatformEvent>, CoreError>;
}

/// Source of OS-reported per-interval usage samples.
pub trait UsageStatsSource: Send + Sync {
    /// Samples for every daily bucket overlapping `window`.
    ///
    /// # Errors
    /// `ServiceUnavailableError::UsageStats` when the device has no usage
    /// statistics service.
    fn query(&self, window: &UsageWindow) -> Result<Vec<UsageSample>, CoreError>;
}

/// OS permission checks and the settings screens that grant them.
pub trait PermissionChecker: Send + Sync {
    fn has_blocking_permission(&self) -> bool;

    fn open_blocking_settings(&self) -> Result<(), CoreError>;

    fn has_usage_access(&self) -> bool;

    fn open_usage_access_settings(&self) -> Result<(), CoreError>;
}

/// Installed-app label lookup, used for display only.
pub trait AppLabelProvider: Send + Sync {
    fn label(&self, package_id: &str) -> Option<String>;
}

/// Event source for devices without one; `subscribe` always fails.
pub struct NoEventSource;

impl ForegroundEventSource for NoEventSource {
    fn subscribe(&self) -> Result<mpsc::Receiver<PlatformEvent>, CoreError> {
        Err(ServiceUnavailableError::EventSource.into())
    }
}

/// Usage source for devices without usage statistics.
pub struct NoUsageSource;

impl UsageStatsSource for NoUsageSource {
    fn query(&self, _window: &UsageWindow) -> Result<Vec<UsageSample>, CoreError> {
        Err(ServiceUnavailableError::UsageStats.into())
    }
}
