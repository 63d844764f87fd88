//! Session and conversation-window configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::GatewaySettings;

/// Greeting that opens every new or cleared session.
pub const DEFAULT_WELCOME: &str =
    "Welcome to Sleep Better! I'm Frodo, your personal sleep consultant. How may I assist you today?";

/// Session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Prior turns shown to the classifier
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Prior turns sent to a handler's model call
    #[serde(default = "default_reply_history_window")]
    pub reply_history_window: usize,

    /// Seconds without an inbound message before a connection closes
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Seconds the classifier may take before routing falls back
    #[serde(default = "default_classification_timeout")]
    pub classification_timeout_secs: u64,

    /// System turn seeded into new and cleared sessions; empty disables it
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    /// Stored turns replayed to a resuming connection
    #[serde(default = "default_replay_limit")]
    pub replay_limit: usize,

    #[serde(default = "default_inbound_capacity")]
    pub inbound_queue_capacity: usize,

    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn classification_timeout(&self) -> Duration {
        Duration::from_secs(self.classification_timeout_secs)
    }

    pub fn welcome(&self) -> Option<String> {
        let text = self.welcome_message.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Turns of context a message needs: enough for both windows.
    pub fn context_turns(&self) -> usize {
        self.history_window.max(self.reply_history_window)
    }

    pub fn gateway_settings(&self) -> GatewaySettings {
        GatewaySettings {
            idle_timeout: self.idle_timeout(),
            replay_limit: self.replay_limit,
            inbound_capacity: self.inbound_queue_capacity,
            outbound_capacity: self.outbound_capacity,
        }
    }

    /// Validate session configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=100).contains(&self.history_window) {
            return Err(ValidationError::InvalidHistoryWindow);
        }
        if self.idle_timeout_secs == 0 {
            return Err(ValidationError::ZeroSessionSetting("idle_timeout_secs"));
        }
        if self.classification_timeout_secs == 0 {
            return Err(ValidationError::ZeroSessionSetting("classification_timeout_secs"));
        }
        if self.inbound_queue_capacity == 0 {
            return Err(ValidationError::ZeroSessionSetting("inbound_queue_capacity"));
        }
        if self.outbound_capacity == 0 {
            return Err(ValidationError::ZeroSessionSetting("outbound_capacity"));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            reply_history_window: default_reply_history_window(),
            idle_timeout_secs: default_idle_timeout(),
            classification_timeout_secs: default_classification_timeout(),
            welcome_message: default_welcome_message(),
            replay_limit: default_replay_limit(),
            inbound_queue_capacity: default_inbound_capacity(),
            outbound_capacity: default_outbound_capacity(),
        }
    }
}

fn default_history_window() -> usize {
    10
}

fn default_reply_history_window() -> usize {
    5
}

fn default_idle_timeout() -> u64 {
    1800
}

fn default_classification_timeout() -> u64 {
    15
}

fn default_welcome_message() -> String {
    DEFAULT_WELCOME.to_string()
}

fn default_replay_limit() -> usize {
    50
}

fn default_inbound_capacity() -> usize {
    32
}

fn default_outbound_capacity() -> usize {
    64
}
