//! Language model configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::ai::OpenAIConfig;

/// Language model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// OpenAI API key
    pub openai_api_key: Option<Secret<String>>,

    /// Chat model used for both routing and replies
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// Sampling temperature for handler replies
    #[serde(default = "default_reply_temperature")]
    pub reply_temperature: f32,

    /// Sampling temperature for the classification call
    #[serde(default = "default_routing_temperature")]
    pub routing_temperature: f32,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if OpenAI is configured
    pub fn has_openai(&self) -> bool {
        self.openai_api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty())
    }

    /// Provider settings, if an API key is configured.
    pub fn openai(&self) -> Option<OpenAIConfig> {
        let key = self.openai_api_key.as_ref().filter(|_| self.has_openai())?;
        Some(
            OpenAIConfig::new(key.clone())
                .with_model(self.model.clone())
                .with_base_url(self.base_url.clone())
                .with_timeout(self.timeout())
                .with_max_retries(self.max_retries),
        )
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_openai() {
            return Err(ValidationError::MissingRequired("OPENAI_API_KEY"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidBaseUrl);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if !(0.0..=2.0).contains(&self.reply_temperature) {
            return Err(ValidationError::InvalidTemperature("reply_temperature"));
        }
        if !(0.0..=2.0).contains(&self.routing_temperature) {
            return Err(ValidationError::InvalidTemperature("routing_temperature"));
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            reply_temperature: default_reply_temperature(),
            routing_temperature: default_routing_temperature(),
        }
    }
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    3
}

fn default_reply_temperature() -> f32 {
    0.7
}

fn default_routing_temperature() -> f32 {
    0.1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_key() -> AiConfig {
        AiConfig {
            openai_api_key: Some(Secret::new("sk-test".to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.max_retries, 3);
        assert!(config.routing_temperature < config.reply_temperature);
    }

    #[test]
    fn test_validation_requires_key() {
        assert!(matches!(
            AiConfig::default().validate(),
            Err(ValidationError::MissingRequired("OPENAI_API_KEY"))
        ));
        let blank = AiConfig {
            openai_api_key: Some(Secret::new(String::new())),
            ..Default::default()
        };
        assert!(blank.validate().is_err());
        assert!(blank.openai().is_none());
    }

    #[test]
    fn test_validation_base_url() {
        let config = AiConfig {
            base_url: "ftp://example.com".to_string(),
            ..with_key()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidBaseUrl)));
    }

    #[test]
    fn test_validation_temperature_range() {
        let config = AiConfig {
            reply_temperature: 2.5,
            ..with_key()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_openai_settings_carry_through() {
        let config = AiConfig {
            model: "gpt-4o".to_string(),
            timeout_secs: 10,
            ..with_key()
        };
        assert!(config.validate().is_ok());

        let openai = config.openai().unwrap();
        assert_eq!(openai.model, "gpt-4o");
        assert_eq!(openai.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_key_is_not_printed() {
        let printed = format!("{:?}", with_key());
        assert!(!printed.contains("sk-test"));
    }
}
