//! # MindGuard Core Library
//!
//! This library provides the core logic for MindGuard: keeping a
//! user-chosen list of apps out of the foreground and reporting aggregate
//! screen time to a remote service. The host shell (mobile bridge, CLI)
//! supplies the platform primitives and calls the control surface.
//!
//! ## Architecture
//!
//! - **Enforcement Engine**: reacts to foreground-change events, consults the
//!   block list and drives the intervention (home action plus prompt)
//! - **Usage Aggregation**: pure fold of per-interval samples into per-app
//!   totals, most used first
//! - **Usage Reporter**: cancellable periodic task that posts trailing-hour
//!   screen time with a bearer token
//! - **Storage**: key-value persistence (SQLite or memory) and TOML
//!   configuration
//!
//! ## Key Components
//!
//! - [`ControlSurface`]: every operation the host shell calls
//! - [`EnforcementEngine`]: foreground event state machine
//! - [`BlockListStore`]: durable blocked-app set
//! - [`AppIdentityResolver`]: package id to display name table
//! - [`UsageReporter`]: periodic screen-time reporting

pub mod blocklist;
pub mod control;
pub mod credentials;
pub mod enforcement;
pub mod error;
pub mod events;
pub mod identity;
pub mod platform;
pub mod reporter;
pub mod storage;
pub mod task;
pub mod usage;

pub use blocklist::BlockListStore;
pub use control::{ControlSurface, Platform};
pub use credentials::{CredentialStore, Credentials};
pub use enforcement::{BlockPrompt, Decision, EnforcementEngine, EnforcementState, EnforcementStats};
pub use error::{
    ConfigError, CoreError, NetworkError, PermissionError, ServiceUnavailableError, StorageError,
    ValidationError,
};
pub use events::{PlatformEvent, PromptAction};
pub use identity::AppIdentityResolver;
pub use platform::{
    AppLabelProvider, ForegroundEventSource, PermissionChecker, PlatformActions, UsageStatsSource,
};
pub use reporter::{ReportOutcome, UsageReporter};
pub use storage::{Config, KeyValueStore, MemoryKvStore, SqliteKvStore};
pub use task::TaskHandle;
pub use usage::{aggregate, UsageAggregate, UsageSample, UsageStatEntry, UsageWindow};
