//! Headless platform for running the core from a terminal.
//!
//! Interventions are printed instead of performed, foreground events are
//! read line by line from stdin or a file, and usage samples come from a
//! JSON file. Permissions are always reported as granted.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use mindguard_core::{
    BlockPrompt, CoreError, ForegroundEventSource, PermissionChecker, Platform, PlatformActions,
    PlatformEvent, ServiceUnavailableError, UsageSample, UsageStatsSource, UsageWindow,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const EVENT_BUFFER: usize = 64;

/// Where foreground events come from.
#[derive(Debug, Clone, Default)]
pub enum EventInput {
    #[default]
    None,
    Stdin,
    File(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessPlatform {
    /// JSON array of usage samples; no file means no usage service.
    pub samples: Option<PathBuf>,
    pub events: EventInput,
}

pub fn build(options: HeadlessPlatform) -> Platform {
    let permissions = Arc::new(GrantedPermissions);
    Platform {
        actions: Arc::new(ConsoleActions),
        events: Arc::new(LineEventSource::new(options.events)),
        usage: Arc::new(JsonUsageSource {
            path: options.samples,
        }),
        permissions,
        labels: None,
    }
}

struct ConsoleActions;

impl PlatformActions for ConsoleActions {
    fn navigate_home(&self) -> Result<(), CoreError> {
        println!("home");
        Ok(())
    }

    fn present_prompt(&self, prompt: &BlockPrompt) -> Result<(), CoreError> {
        println!("prompt: {} - {}", prompt.title, prompt.message);
        Ok(())
    }
}

/// One event per line: a JSON `PlatformEvent`, or a bare package id meaning
/// that package came to the foreground. Blank lines and `#` comments are
/// skipped.
struct LineEventSource {
    input: Mutex<Option<EventInput>>,
}

impl LineEventSource {
    fn new(input: EventInput) -> Self {
        Self {
            input: Mutex::new(Some(input)),
        }
    }
}

impl ForegroundEventSource for LineEventSource {
    fn subscribe(&self) -> Result<mpsc::Receiver<PlatformEvent>, CoreError> {
        let input = self
            .input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let reader: Box<dyn BufRead + Send> = match input {
            None | Some(EventInput::None) => {
                return Err(ServiceUnavailableError::EventSource.into())
            }
            Some(EventInput::Stdin) => Box::new(BufReader::new(std::io::stdin())),
            Some(EventInput::File(path)) => Box::new(BufReader::new(File::open(path)?)),
        };

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        std::thread::spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(error = %e, "Event feed read failed");
                        break;
                    }
                };
                let Some(event) = parse_event(&line) else {
                    continue;
                };
                if tx.blocking_send(event).is_err() {
                    break;
                }
            }
            debug!("Event feed exhausted");
        });
        Ok(rx)
    }
}

fn parse_event(line: &str) -> Option<PlatformEvent> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    if !line.starts_with('{') {
        return Some(PlatformEvent::foreground(line));
    }
    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(line = %line, error = %e, "Skipping malformed event");
            None
        }
    }
}

/// Samples whose last use falls inside the queried window.
struct JsonUsageSource {
    path: Option<PathBuf>,
}

impl UsageStatsSource for JsonUsageSource {
    fn query(&self, window: &UsageWindow) -> Result<Vec<UsageSample>, CoreError> {
        let Some(path) = &self.path else {
            return Err(ServiceUnavailableError::UsageStats.into());
        };
        let content = std::fs::read_to_string(path)?;
        let samples: Vec<UsageSample> = serde_json::from_str(&content)
            .map_err(|e| CoreError::Platform(format!("{}: {e}", path.display())))?;
        let start = window.start_ms();
        Ok(samples
            .into_iter()
            .filter(|s| s.last_used_at_ms >= start)
            .collect())
    }
}

struct GrantedPermissions;

impl PermissionChecker for GrantedPermissions {
    fn has_blocking_permission(&self) -> bool {
        true
    }

    fn open_blocking_settings(&self) -> Result<(), CoreError> {
        println!("Blocking needs no extra permission on this host.");
        Ok(())
    }

    fn has_usage_access(&self) -> bool {
        true
    }

    fn open_usage_access_settings(&self) -> Result<(), CoreError> {
        println!("Pass a samples file with --samples to provide usage data.");
        Ok(())
    }
}
