use thiserror::Error;

/// Why a launch did not (fully) happen.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("Claude CLI not found ({0}). Install with: npm install -g @anthropic-ai/claude-code")]
    AssistantNotFound(String),

    #[error("Unknown terminal \"{0}\"; pick one in settings or use \"custom\"")]
    InvalidTerminalSelected(String),

    #[error("Failed to open terminal: {0}")]
    PrimarySpawnFailed(String),

    #[error("Custom command failed: {0}")]
    CustomCommandFailed(String),

    /// The editor window is already open; only the typed command failed.
    #[error("Editor opened, but typing the command failed: {0}")]
    SecondaryAutomationFailed(String),
}

impl LaunchError {
    /// Secondary failures leave the primary window open and are shown as warnings.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::SecondaryAutomationFailed(_))
    }
}
