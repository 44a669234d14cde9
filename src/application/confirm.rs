//! Confirmation prompts raised before destructive actions.

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub description: String,
    pub confirm_label: String,
    pub cancel_label: String,
}

impl ConfirmPrompt {
    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            confirm_label: "Delete".to_string(),
            cancel_label: "Cancel".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmDecision {
    Accepted,
    Cancelled,
}

/// Asks the user to accept or cancel. Cancelling must leave no side effects.
#[async_trait]
pub trait ConfirmationService: Send + Sync {
    async fn confirm(&self, prompt: ConfirmPrompt) -> ConfirmDecision;
}
