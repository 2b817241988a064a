//! Operations exposed to the host application shell.
//!
//! `ControlSurface` owns one instance of every component and the handles of
//! the two background loops. Storage and permission errors are returned to
//! the caller; usage-service outages degrade to empty results.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tracing::{info, warn};

use crate::blocklist::BlockListStore;
use crate::credentials::{CredentialStore, Credentials};
use crate::enforcement::{EnforcementEngine, EnforcementState, EnforcementStats};
use crate::error::{CoreError, PermissionError, Result, ServiceUnavailableError};
use crate::identity::AppIdentityResolver;
use crate::platform::{
    AppLabelProvider, ForegroundEventSource, PermissionChecker, PlatformActions, UsageStatsSource,
};
use crate::reporter::{ReportOutcome, UsageReporter};
use crate::storage::{Config, KeyValueStore};
use crate::task::TaskHandle;
use crate::usage::{aggregate, UsageStatEntry, UsageWindow};

/// Platform capabilities supplied by the host.
#[derive(Clone)]
pub struct Platform {
    pub actions: Arc<dyn PlatformActions>,
    pub events: Arc<dyn ForegroundEventSource>,
    pub usage: Arc<dyn UsageStatsSource>,
    pub permissions: Arc<dyn PermissionChecker>,
    pub labels: Option<Arc<dyn AppLabelProvider>>,
}

pub struct ControlSurface {
    resolver: Arc<AppIdentityResolver>,
    blocklist: Arc<BlockListStore>,
    credentials: Arc<CredentialStore>,
    engine: Arc<EnforcementEngine>,
    reporter: Arc<UsageReporter>,
    platform: Platform,
    enforcement_task: Mutex<Option<TaskHandle>>,
    reporter_task: Mutex<Option<TaskHandle>>,
}

impl ControlSurface {
    /// Build every component from `config`, reading persisted state from `kv`.
    ///
    /// # Errors
    /// Fails if the identity table cannot be loaded, persisted state cannot
    /// be read, or the HTTP client cannot be built.
    pub fn new(config: &Config, kv: Arc<dyn KeyValueStore>, platform: Platform) -> Result<Self> {
        let resolver = Arc::new(AppIdentityResolver::from_config(&config.identity)?);
        let blocklist = Arc::new(BlockListStore::load(kv.clone(), resolver.clone())?);
        let credentials = Arc::new(CredentialStore::load(
            kv,
            config.reporter.default_base_url.clone(),
        )?);
        let engine = Arc::new(EnforcementEngine::new(
            blocklist.clone(),
            resolver.clone(),
            platform.actions.clone(),
        ));
        let reporter = Arc::new(UsageReporter::new(
            platform.usage.clone(),
            credentials.clone(),
            &config.reporter,
        )?);

        Ok(Self {
            resolver,
            blocklist,
            credentials,
            engine,
            reporter,
            platform,
            enforcement_task: Mutex::new(None),
            reporter_task: Mutex::new(None),
        })
    }

    pub fn resolver(&self) -> &AppIdentityResolver {
        &self.resolver
    }

    pub fn engine(&self) -> &Arc<EnforcementEngine> {
        &self.engine
    }

    // ── Permissions ──────────────────────────────────────────────────

    pub fn has_blocking_permission(&self) -> bool {
        self.platform.permissions.has_blocking_permission()
    }

    pub fn open_blocking_permission_settings(&self) -> Result<()> {
        self.platform.permissions.open_blocking_settings()
    }

    pub fn has_usage_access_permission(&self) -> bool {
        self.platform.permissions.has_usage_access()
    }

    pub fn open_usage_access_settings(&self) -> Result<()> {
        self.platform.permissions.open_usage_access_settings()
    }

    // ── Usage ────────────────────────────────────────────────────────

    /// Per-app totals over the last `days_back` days (at least one), most
    /// used first.
    pub fn get_usage_stats(&self, days_back: f64) -> Result<Vec<UsageStatEntry>> {
        if !self.has_usage_access_permission() {
            return Err(PermissionError::UsageAccessNotGranted.into());
        }

        let window = UsageWindow::days_back(days_back, Utc::now());
        let samples = match self.platform.usage.query(&window) {
            Ok(samples) => samples,
            Err(CoreError::ServiceUnavailable(e)) => {
                warn!(error = %e, "Usage statistics unavailable; returning no data");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        Ok(aggregate(&samples)
            .into_iter()
            .map(|agg| UsageStatEntry {
                display_name: self.display_name(&agg.package_id),
                package_id: agg.package_id,
                total_foreground_ms: agg.total_foreground_ms,
                last_used_at: agg.last_used_at_ms,
            })
            .collect())
    }

    /// Installed label, then identity table, then the id itself.
    fn display_name(&self, package_id: &str) -> String {
        self.platform
            .labels
            .as_ref()
            .and_then(|labels| labels.label(package_id))
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| self.resolver.resolve(package_id).to_string())
    }

    // ── Block list ───────────────────────────────────────────────────

    pub fn block_app(&self, app_id: &str) -> Result<()> {
        self.blocklist.add(app_id).map(|_| ())
    }

    pub fn unblock_app(&self, app_id: &str) -> Result<()> {
        self.blocklist.remove(app_id).map(|_| ())
    }

    pub fn get_blocked_apps(&self) -> BTreeSet<String> {
        self.blocklist.list()
    }

    pub fn is_blocked(&self, app_id: &str) -> bool {
        self.blocklist.contains(app_id)
    }

    // ── Enforcement ──────────────────────────────────────────────────

    /// Subscribe to foreground events and start the engine loop. Calling it
    /// while already running is a no-op.
    pub fn start_enforcement(&self) -> Result<()> {
        if !self.has_blocking_permission() {
            return Err(PermissionError::BlockingNotGranted.into());
        }

        let mut task = self
            .enforcement_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(TaskHandle::is_running) {
            return Ok(());
        }

        let events = self.platform.events.subscribe()?;
        *task = Some(self.engine.spawn(events)?);
        info!("Enforcement enabled");
        Ok(())
    }

    pub fn stop_enforcement(&self) {
        let task = self
            .enforcement_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.stop();
            self.engine.reset();
            info!("Enforcement disabled");
        }
    }

    pub fn is_enforcement_running(&self) -> bool {
        self.enforcement_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(TaskHandle::is_running)
    }

    pub fn enforcement_state(&self) -> EnforcementState {
        self.engine.state()
    }

    pub fn enforcement_stats(&self) -> EnforcementStats {
        self.engine.stats()
    }

    // ── Reporting ────────────────────────────────────────────────────

    pub fn set_auth_token(&self, token: &str) -> Result<()> {
        self.credentials.set_token(token)
    }

    pub fn clear_auth_token(&self) -> Result<()> {
        self.credentials.clear_token()
    }

    pub fn set_base_url(&self, url: &str) -> Result<()> {
        self.credentials.set_base_url(url)
    }

    pub fn credentials(&self) -> Credentials {
        self.credentials.snapshot()
    }

    /// Start the periodic reporter. Calling it while already running is a
    /// no-op.
    pub fn start_usage_reporting(&self) -> Result<()> {
        if !self.has_usage_access_permission() {
            return Err(PermissionError::UsageAccessNotGranted.into());
        }

        let mut task = self.reporter_task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(TaskHandle::is_running) {
            return Ok(());
        }

        *task = Some(self.reporter.spawn()?);
        Ok(())
    }

    /// Cancel the pending tick; no new tick starts after this returns.
    pub fn stop_usage_reporting(&self) {
        let task = self
            .reporter_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.stop();
        }
    }

    pub fn is_reporting_running(&self) -> bool {
        self.reporter_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(TaskHandle::is_running)
    }

    /// Run one report cycle now, outside the schedule.
    pub async fn report_now(&self) -> ReportOutcome {
        self.reporter.tick().await
    }
}

impl Drop for ControlSurface {
    fn drop(&mut self) {
        self.stop_enforcement();
        self.stop_usage_reporting();
    }
}
