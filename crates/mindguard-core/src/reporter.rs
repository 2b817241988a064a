//! Periodic screen-time reporter.
//!
//! Each tick samples the trailing window, sums foreground time into whole
//! minutes and POSTs `{"screenTimeMinutes": n}` with the stored bearer
//! token. Ticks never fail: every problem is logged and the next attempt
//! happens on the next scheduled tick. There is no retry or backoff.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::credentials::{CredentialStore, Credentials};
use crate::error::{CoreError, NetworkError, ServiceUnavailableError};
use crate::platform::UsageStatsSource;
use crate::storage::ReporterConfig;
use crate::task::TaskHandle;
use crate::usage::{aggregate, total_foreground_ms, total_minutes, UsageWindow};

/// Longest response body excerpt kept in error logs.
const MAX_ERROR_BODY: usize = 512;

/// Request body understood by the productivity endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenTimeReport {
    pub screen_time_minutes: u64,
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Sent { minutes: u64 },
    SkippedUnauthenticated { minutes: u64 },
    SkippedUnavailable,
    Failed(String),
}

/// HTTP client for the productivity endpoint.
pub struct ReportClient {
    http_client: Client,
    endpoint_path: String,
}

impl ReportClient {
    pub fn new(endpoint_path: impl Into<String>, timeout: Duration) -> Result<Self, NetworkError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            endpoint_path: endpoint_path.into(),
        })
    }

    /// `{base_url}{endpoint_path}` with exactly one slash between them.
    pub fn endpoint_url(&self, base_url: &str) -> Result<url::Url, NetworkError> {
        let joined = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            self.endpoint_path.trim_start_matches('/')
        );
        url::Url::parse(&joined).map_err(|e| NetworkError::InvalidUrl {
            url: joined,
            message: e.to_string(),
        })
    }

    /// POST the report. Any non-2xx status is an error carrying the body.
    pub async fn send(
        &self,
        base_url: &str,
        token: &str,
        report: &ScreenTimeReport,
    ) -> Result<(), NetworkError> {
        let url = self.endpoint_url(base_url)?;
        let resp = self
            .http_client
            .post(url)
            .bearer_auth(token)
            .json(report)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = resp.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(NetworkError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

pub struct UsageReporter {
    usage: Arc<dyn UsageStatsSource>,
    credentials: Arc<CredentialStore>,
    client: ReportClient,
    interval: Duration,
    window: Duration,
}

impl UsageReporter {
    pub fn new(
        usage: Arc<dyn UsageStatsSource>,
        credentials: Arc<CredentialStore>,
        config: &ReporterConfig,
    ) -> Result<Self, NetworkError> {
        Ok(Self {
            usage,
            credentials,
            client: ReportClient::new(&config.endpoint_path, config.request_timeout())?,
            interval: config.interval(),
            window: config.window(),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one report cycle.
    pub async fn tick(&self) -> ReportOutcome {
        let window = UsageWindow::trailing(self.window, Utc::now());
        // Platform usage queries may block on IPC.
        let usage = Arc::clone(&self.usage);
        let queried = tokio::task::spawn_blocking(move || usage.query(&window)).await;
        let samples = match queried {
            Ok(Ok(samples)) => samples,
            Ok(Err(CoreError::ServiceUnavailable(ServiceUnavailableError::UsageStats))) => {
                warn!("Usage statistics unavailable; skipping report");
                return ReportOutcome::SkippedUnavailable;
            }
            Ok(Err(e)) => {
                error!(error = %e, "Failed to query usage statistics");
                return ReportOutcome::Failed(e.to_string());
            }
            Err(e) => {
                error!(error = %e, "Usage query task failed");
                return ReportOutcome::Failed(e.to_string());
            }
        };

        let minutes = total_minutes(total_foreground_ms(&aggregate(&samples)));
        let Credentials { token, base_url } = self.credentials.snapshot();
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            debug!(minutes, "No auth token; report skipped");
            return ReportOutcome::SkippedUnauthenticated { minutes };
        };

        let report = ScreenTimeReport {
            screen_time_minutes: minutes,
        };
        match self.client.send(&base_url, &token, &report).await {
            Ok(()) => {
                info!(minutes, "Screen time reported");
                ReportOutcome::Sent { minutes }
            }
            Err(NetworkError::Status { status, body }) => {
                warn!(status, body = %body, "Backend rejected screen time report");
                ReportOutcome::Failed(format!("HTTP {status}"))
            }
            Err(e) => {
                error!(error = %e, "Screen time report failed");
                ReportOutcome::Failed(e.to_string())
            }
        }
    }

    /// Tick immediately, then every `interval`, until stopped.
    pub fn spawn(self: &Arc<Self>) -> Result<TaskHandle, ServiceUnavailableError> {
        let reporter = Arc::clone(self);
        TaskHandle::spawn("usage-reporter", move |mut shutdown| async move {
            let mut interval = tokio::time::interval(reporter.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = reporter.interval.as_secs(), "Usage reporting started");

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let start = Instant::now();
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    outcome = reporter.tick() => {
                        debug!(
                            outcome = ?outcome,
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "Report tick finished"
                        );
                    }
                }
            }
            info!("Usage reporting stopped");
        })
    }
}
