//! Synthetic platform shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use mindguard_core::{
    BlockPrompt, CoreError, ForegroundEventSource, PermissionChecker, Platform, PlatformActions,
    PlatformEvent, ServiceUnavailableError, UsageSample, UsageStatsSource, UsageWindow,
};
use tokio::sync::mpsc;

/// Records every home action and prompt.
#[derive(Default)]
pub struct RecordingActions {
    pub homes: Mutex<usize>,
    pub prompts: Mutex<Vec<BlockPrompt>>,
}

impl RecordingActions {
    pub fn home_count(&self) -> usize {
        *self.homes.lock().unwrap()
    }

    pub fn prompt_names(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.display_name.clone())
            .collect()
    }
}

impl PlatformActions for RecordingActions {
    fn navigate_home(&self) -> Result<(), CoreError> {
        *self.homes.lock().unwrap() += 1;
        Ok(())
    }

    fn present_prompt(&self, prompt: &BlockPrompt) -> Result<(), CoreError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        Ok(())
    }
}

/// Hands out one pre-built receiver.
pub struct SyntheticFeed {
    rx: Mutex<Option<mpsc::Receiver<PlatformEvent>>>,
}

impl SyntheticFeed {
    pub fn new() -> (mpsc::Sender<PlatformEvent>, Self) {
        let (tx, rx) = mpsc::channel(32);
        (
            tx,
            Self {
                rx: Mutex::new(Some(rx)),
            },
        )
    }
}

impl ForegroundEventSource for SyntheticFeed {
    fn subscribe(&self) -> Result<mpsc::Receiver<PlatformEvent>, CoreError> {
        self.rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ServiceUnavailableError::EventSource.into())
    }
}

/// Opens a fresh channel on every subscribe and keeps the senders.
#[derive(Default)]
pub struct ReopeningFeed {
    pub senders: Mutex<Vec<mpsc::Sender<PlatformEvent>>>,
}

impl ForegroundEventSource for ReopeningFeed {
    fn subscribe(&self) -> Result<mpsc::Receiver<PlatformEvent>, CoreError> {
        let (tx, rx) = mpsc::channel(32);
        self.senders.lock().unwrap().push(tx);
        Ok(rx)
    }
}

/// Returns the same samples for every window and remembers the windows asked for.
#[derive(Default)]
pub struct FixedUsage {
    pub samples: Mutex<Vec<UsageSample>>,
    pub windows: Mutex<Vec<UsageWindow>>,
}

impl FixedUsage {
    pub fn with(samples: Vec<UsageSample>) -> Self {
        Self {
            samples: Mutex::new(samples),
            windows: Mutex::new(Vec::new()),
        }
    }
}

impl UsageStatsSource for FixedUsage {
    fn query(&self, window: &UsageWindow) -> Result<Vec<UsageSample>, CoreError> {
        self.windows.lock().unwrap().push(*window);
        Ok(self.samples.lock().unwrap().clone())
    }
}

pub struct Granted;

impl PermissionChecker for Granted {
    fn has_blocking_permission(&self) -> bool {
        true
    }
    fn open_blocking_settings(&self) -> Result<(), CoreError> {
        Ok(())
    }
    fn has_usage_access(&self) -> bool {
        true
    }
    fn open_usage_access_settings(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

pub fn platform(
    actions: Arc<RecordingActions>,
    events: Arc<dyn ForegroundEventSource>,
    usage: Arc<dyn UsageStatsSource>,
) -> Platform {
    Platform {
        actions,
        events,
        usage,
        permissions: Arc::new(Granted),
        labels: None,
    }
}

/// Poll `check` until it holds or a second passes.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    check()
}
