//! Enforcement engine implementation.
//!
//! `handle_event` is synchronous and never waits on the user: the prompt
//! primitive only schedules the dialog. The same entry point serves hosts
//! that deliver events through a callback and the channel loop started by
//! [`EnforcementEngine::spawn`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::prompt::BlockPrompt;
use crate::blocklist::BlockListStore;
use crate::error::ServiceUnavailableError;
use crate::events::PlatformEvent;
use crate::identity::AppIdentityResolver;
use crate::platform::PlatformActions;
use crate::task::TaskHandle;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum EnforcementState {
    Idle,
    /// A prompt is up for `package`; repeated events for it only re-issue
    /// the home action.
    Intervening {
        package: String,
        display_name: String,
    },
}

/// Outcome of handling one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Not a foreground change.
    Ignored,
    /// Foreground package is not blocked.
    Allowed,
    /// Home action issued; `prompt_shown` is false when a prompt was
    /// already up or presenting it failed.
    Intervened { prompt_shown: bool },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementStats {
    pub foreground_events: u64,
    pub interventions: u64,
    pub prompt_failures: u64,
}

pub struct EnforcementEngine {
    blocklist: Arc<BlockListStore>,
    resolver: Arc<AppIdentityResolver>,
    actions: Arc<dyn PlatformActions>,
    state: Mutex<EnforcementState>,
    foreground_events: AtomicU64,
    interventions: AtomicU64,
    prompt_failures: AtomicU64,
}

impl EnforcementEngine {
    pub fn new(
        blocklist: Arc<BlockListStore>,
        resolver: Arc<AppIdentityResolver>,
        actions: Arc<dyn PlatformActions>,
    ) -> Self {
        Self {
            blocklist,
            resolver,
            actions,
            state: Mutex::new(EnforcementState::Idle),
            foreground_events: AtomicU64::new(0),
            interventions: AtomicU64::new(0),
            prompt_failures: AtomicU64::new(0),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> EnforcementState {
        self.lock_state().clone()
    }

    pub fn stats(&self) -> EnforcementStats {
        EnforcementStats {
            foreground_events: self.foreground_events.load(Ordering::Relaxed),
            interventions: self.interventions.load(Ordering::Relaxed),
            prompt_failures: self.prompt_failures.load(Ordering::Relaxed),
        }
    }

    // ── Event handling ───────────────────────────────────────────────

    /// Evaluate one platform event. Every foreground change is checked
    /// against the current block list; nothing is cached between events.
    pub fn handle_event(&self, event: &PlatformEvent) -> Decision {
        match event {
            PlatformEvent::ForegroundChanged { package } => self.on_foreground_changed(package),
            PlatformEvent::PromptDismissed { package, action } => {
                let mut state = self.lock_state();
                if matches!(&*state, EnforcementState::Intervening { package: p, .. } if p == package)
                {
                    debug!(package = %package, action = ?action, "Prompt dismissed");
                    *state = EnforcementState::Idle;
                }
                Decision::Ignored
            }
            PlatformEvent::Other { .. } => Decision::Ignored,
        }
    }

    /// Return to idle without touching the platform.
    pub fn reset(&self) {
        *self.lock_state() = EnforcementState::Idle;
    }

    fn on_foreground_changed(&self, package: &str) -> Decision {
        self.foreground_events.fetch_add(1, Ordering::Relaxed);

        if !self.blocklist.contains(package) {
            let mut state = self.lock_state();
            if let EnforcementState::Intervening { package: blocked, .. } = &*state {
                if blocked != package {
                    debug!(from = %blocked, to = %package, "Foreground moved away from blocked app");
                    *state = EnforcementState::Idle;
                }
            }
            return Decision::Allowed;
        }

        let display_name = self.resolver.resolve(package).to_string();
        info!(package = %package, display_name = %display_name, "Blocking app");
        self.interventions.fetch_add(1, Ordering::Relaxed);

        // Claim the prompt under the lock; host callbacks run without it.
        let already_prompted = {
            let mut state = self.lock_state();
            let prompted = matches!(&*state, EnforcementState::Intervening { package: p, .. } if p == package);
            if !prompted {
                *state = EnforcementState::Intervening {
                    package: package.to_string(),
                    display_name: display_name.clone(),
                };
            }
            prompted
        };

        // Navigation is the authoritative block and always goes first.
        if let Err(e) = self.actions.navigate_home() {
            error!(package = %package, error = %e, "Home action failed");
        }

        if already_prompted {
            return Decision::Intervened {
                prompt_shown: false,
            };
        }

        let prompt = BlockPrompt::new(package, display_name);
        match self.actions.present_prompt(&prompt) {
            Ok(()) => Decision::Intervened { prompt_shown: true },
            Err(e) => {
                self.prompt_failures.fetch_add(1, Ordering::Relaxed);
                warn!(package = %package, error = %e, "Blocking prompt could not be shown");
                let mut state = self.lock_state();
                if matches!(&*state, EnforcementState::Intervening { package: p, .. } if p == package) {
                    *state = EnforcementState::Idle;
                }
                Decision::Intervened {
                    prompt_shown: false,
                }
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, EnforcementState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Event loop ───────────────────────────────────────────────────

    /// Consume `events` on the current runtime until stopped or the feed closes.
    /// The loop leaves `state` alone on exit; whoever stops it resets.
    pub fn spawn(
        self: &Arc<Self>,
        mut events: mpsc::Receiver<PlatformEvent>,
    ) -> Result<TaskHandle, ServiceUnavailableError> {
        let engine = Arc::clone(self);
        TaskHandle::spawn("enforcement", move |mut shutdown| async move {
            info!(blocked = engine.blocklist.len(), "Enforcement started");
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    event = events.recv() => match event {
                        Some(event) => {
                            engine.handle_event(&event);
                        }
                        None => {
                            warn!("Foreground event feed closed");
                            break;
                        }
                    }
                }
            }
            info!("Enforcement stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::events::PromptAction;
    use crate::storage::MemoryKvStore;

    #[derive(Default)]
    struct RecordingActions {
        homes: Mutex<usize>,
        prompts: Mutex<Vec<BlockPrompt>>,
        fail_prompt: bool,
    }

    impl PlatformActions for RecordingActions {
        fn navigate_home(&self) -> Result<(), CoreError> {
            *self.homes.lock().unwrap() += 1;
            Ok(())
        }

        fn present_prompt(&self, prompt: &BlockPrompt) -> Result<(), CoreError> {
            if self.fail_prompt {
                return Err(CoreError::Platform("display not ready".into()));
            }
            self.prompts.lock().unwrap().push(prompt.clone());
            Ok(())
        }
    }

    fn engine_with(blocked: &[&str], actions: Arc<dyn PlatformActions>) -> EnforcementEngine {
        let resolver = Arc::new(AppIdentityResolver::builtin());
        let blocklist = Arc::new(
            BlockListStore::load(Arc::new(MemoryKvStore::new()), resolver.clone()).unwrap(),
        );
        for app in blocked {
            blocklist.add(app).unwrap();
        }
        EnforcementEngine::new(blocklist, resolver, actions)
    }

    #[test]
    fn blocked_display_name_triggers_intervention() {
        let actions = Arc::new(RecordingActions::default());
        let engine = engine_with(&["Instagram"], actions.clone());

        let decision = engine.handle_event(&PlatformEvent::foreground("com.instagram.android"));

        assert_eq!(decision, Decision::Intervened { prompt_shown: true });
        assert_eq!(*actions.homes.lock().unwrap(), 1);
        let prompts = actions.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].display_name, "Instagram");
        assert_eq!(
            engine.state(),
            EnforcementState::Intervening {
                package: "com.instagram.android".into(),
                display_name: "Instagram".into(),
            }
        );
    }

    #[test]
    fn unknown_package_is_allowed() {
        let actions = Arc::new(RecordingActions::default());
        let engine = engine_with(&["Instagram"], actions.clone());

        let decision = engine.handle_event(&PlatformEvent::foreground("com.unknown.app"));

        assert_eq!(decision, Decision::Allowed);
        assert_eq!(*actions.homes.lock().unwrap(), 0);
        assert_eq!(engine.state(), EnforcementState::Idle);
    }

    #[test]
    fn other_events_are_ignored() {
        let actions = Arc::new(RecordingActions::default());
        let engine = engine_with(&["com.discord"], actions.clone());

        let decision = engine.handle_event(&PlatformEvent::Other {
            kind: "com.discord".into(),
        });

        assert_eq!(decision, Decision::Ignored);
        assert_eq!(*actions.homes.lock().unwrap(), 0);
        assert_eq!(engine.stats().foreground_events, 0);
    }

    #[test]
    fn repeated_events_reissue_home_without_stacking_prompts() {
        let actions = Arc::new(RecordingActions::default());
        let engine = engine_with(&["com.discord"], actions.clone());

        engine.handle_event(&PlatformEvent::foreground("com.discord"));
        let second = engine.handle_event(&PlatformEvent::foreground("com.discord"));

        assert_eq!(second, Decision::Intervened { prompt_shown: false });
        assert_eq!(*actions.homes.lock().unwrap(), 2);
        assert_eq!(actions.prompts.lock().unwrap().len(), 1);
        assert_eq!(engine.stats().interventions, 2);
    }

    #[test]
    fn leaving_or_dismissing_returns_to_idle() {
        let actions = Arc::new(RecordingActions::default());
        let engine = engine_with(&["com.discord"], actions.clone());

        engine.handle_event(&PlatformEvent::foreground("com.discord"));
        engine.handle_event(&PlatformEvent::foreground("com.android.launcher"));
        assert_eq!(engine.state(), EnforcementState::Idle);

        engine.handle_event(&PlatformEvent::foreground("com.discord"));
        engine.handle_event(&PlatformEvent::PromptDismissed {
            package: "com.discord".into(),
            action: PromptAction::Cancel,
        });
        assert_eq!(engine.state(), EnforcementState::Idle);
        assert_eq!(actions.prompts.lock().unwrap().len(), 2);
    }

    #[test]
    fn prompt_failure_still_navigates_home() {
        let actions = Arc::new(RecordingActions {
            fail_prompt: true,
            ..Default::default()
        });
        let engine = engine_with(&["WhatsApp"], actions.clone());

        let decision = engine.handle_event(&PlatformEvent::foreground("com.whatsapp"));

        assert_eq!(decision, Decision::Intervened { prompt_shown: false });
        assert_eq!(*actions.homes.lock().unwrap(), 1);
        assert_eq!(engine.stats().prompt_failures, 1);
        assert_eq!(engine.state(), EnforcementState::Idle);
    }

    #[test]
    fn unblocking_takes_effect_on_next_event() {
        let actions = Arc::new(RecordingActions::default());
        let engine = engine_with(&["com.discord"], actions.clone());

        engine.handle_event(&PlatformEvent::foreground("com.discord"));
        engine.blocklist.remove("com.discord").unwrap();
        let decision = engine.handle_event(&PlatformEvent::foreground("com.discord"));

        assert_eq!(decision, Decision::Allowed);
        assert_eq!(*actions.homes.lock().unwrap(), 1);
    }

    /// Reads the engine state from inside the host callbacks.
    #[derive(Default)]
    struct InspectingActions {
        engine: std::sync::OnceLock<Arc<EnforcementEngine>>,
        seen: Mutex<Vec<EnforcementState>>,
    }

    impl PlatformActions for InspectingActions {
        fn navigate_home(&self) -> Result<(), CoreError> {
            if let Some(engine) = self.engine.get() {
                self.seen.lock().unwrap().push(engine.state());
            }
            Ok(())
        }

        fn present_prompt(&self, _prompt: &BlockPrompt) -> Result<(), CoreError> {
            if let Some(engine) = self.engine.get() {
                self.seen.lock().unwrap().push(engine.state());
            }
            Ok(())
        }
    }

    #[test]
    fn host_callbacks_run_without_the_state_lock() {
        let actions = Arc::new(InspectingActions::default());
        let engine = Arc::new(engine_with(&["com.discord"], actions.clone()));
        let _ = actions.engine.set(engine.clone());

        let decision = engine.handle_event(&PlatformEvent::foreground("com.discord"));

        assert_eq!(decision, Decision::Intervened { prompt_shown: true });
        let seen = actions.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen
            .iter()
            .all(|s| matches!(s, EnforcementState::Intervening { package, .. } if package == "com.discord")));
    }
}
