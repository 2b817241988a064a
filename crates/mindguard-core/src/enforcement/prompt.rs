use serde::{Deserialize, Serialize};

use crate::events::PromptAction;

/// Modal shown while a blocked app is being pushed out of the foreground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPrompt {
    pub package: String,
    pub display_name: String,
    pub title: String,
    pub message: String,
    pub actions: Vec<PromptAction>,
    /// Tapping outside the prompt does not close it.
    pub cancelable: bool,
}

impl BlockPrompt {
    pub fn new(package: impl Into<String>, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            package: package.into(),
            title: "App Blocked".to_string(),
            message: format!(
                "{display_name} is currently blocked. Enter your app password to unlock."
            ),
            display_name,
            actions: vec![PromptAction::Unlock, PromptAction::Cancel],
            cancelable: false,
        }
    }
}
