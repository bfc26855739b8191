//! Widget configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chat::upload::UploadSchedule;
use crate::core::format::{DEFAULT_SIGNIFICANT_DIGITS, MAX_SIGNIFICANT_DIGITS};
use crate::error::{ConfigError, ConfigResult};
use crate::gesture::DEFAULT_LONG_PRESS_MS;

/// Chat backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatConfig {
    /// Message collection name
    pub collection: String,
    /// Root folder for uploaded attachments
    pub media_prefix: String,
    /// Storage bucket name (appears in attachment URLs)
    pub bucket: String,
    /// Only the most recent N messages are shown (None = all)
    pub message_limit: Option<usize>,
    /// Simulated upload progress schedule
    pub upload_schedule: UploadSchedule,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            collection: "messages".to_string(),
            media_prefix: "media".to_string(),
            bucket: "covercalc".to_string(),
            message_limit: None,
            upload_schedule: UploadSchedule::default(),
        }
    }
}

/// Log output settings for native hosts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level widget configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Press duration (exclusive) above which equals reveals the panel
    pub long_press_threshold_ms: u64,
    /// Significant digits kept in computed results
    pub significant_digits: usize,
    /// Chat backend settings
    pub chat: ChatConfig,
    /// Logging settings
    pub log: LogConfig,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            long_press_threshold_ms: DEFAULT_LONG_PRESS_MS,
            significant_digits: DEFAULT_SIGNIFICANT_DIGITS,
            chat: ChatConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl WidgetConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the long-press threshold
    #[must_use]
    pub const fn with_long_press_threshold_ms(mut self, ms: u64) -> Self {
        self.long_press_threshold_ms = ms;
        self
    }

    /// Set result precision
    #[must_use]
    pub const fn with_significant_digits(mut self, digits: usize) -> Self {
        self.significant_digits = digits;
        self
    }

    /// Set the message collection
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.chat.collection = collection.into();
        self
    }

    /// Limit the visible history
    #[must_use]
    pub const fn with_message_limit(mut self, limit: Option<usize>) -> Self {
        self.chat.message_limit = limit;
        self
    }

    /// Set the upload progress schedule
    #[must_use]
    pub fn with_upload_schedule(mut self, schedule: UploadSchedule) -> Self {
        self.chat.upload_schedule = schedule;
        self
    }

    /// Parses and validates JSON
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates YAML
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let contents = std::fs::read_to_string(path)?;

        match extension.as_str() {
            "json" => Self::from_json_str(&contents),
            "yaml" | "yml" => Self::from_yaml_str(&contents),
            _ => Err(ConfigError::UnsupportedFormat { extension }),
        }
    }

    /// Checks invariants serde cannot express
    pub fn validate(&self) -> ConfigResult<()> {
        if self.long_press_threshold_ms == 0 {
            return Err(ConfigError::invalid(
                "longPressThresholdMs must be greater than zero",
            ));
        }
        if !(1..=MAX_SIGNIFICANT_DIGITS).contains(&self.significant_digits) {
            return Err(ConfigError::invalid(format!(
                "significantDigits must be between 1 and {MAX_SIGNIFICANT_DIGITS}"
            )));
        }
        if self.chat.collection.trim().is_empty() {
            return Err(ConfigError::invalid("chat.collection must not be empty"));
        }
        if self.chat.message_limit == Some(0) {
            return Err(ConfigError::invalid("chat.messageLimit must be at least 1"));
        }
        self.chat.upload_schedule.validate()
    }
}
