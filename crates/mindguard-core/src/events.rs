use serde::{Deserialize, Serialize};

/// How the user closed a blocking prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptAction {
    Unlock,
    Cancel,
}

/// Everything the platform event feed can deliver.
/// Only `ForegroundChanged` drives detection; the engine ignores the rest
/// apart from using `PromptDismissed` to leave the intervening state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlatformEvent {
    /// A different application became visible.
    ForegroundChanged { package: String },
    /// The user closed the blocking prompt shown for `package`.
    PromptDismissed {
        package: String,
        action: PromptAction,
    },
    /// Any other platform notification (content changes, scrolls, ...).
    Other { kind: String },
}

impl PlatformEvent {
    pub fn foreground(package: impl Into<String>) -> Self {
        Self::ForegroundChanged {
            package: package.into(),
        }
    }
}
