//! Error types for the chat collaborators and configuration

use thiserror::Error;

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Errors reported by the chat session and its collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// An operation needed an identity before sign-in completed
    #[error("Not signed in")]
    NotSignedIn,

    /// The identity service refused or failed
    #[error("Authentication failed: {message}")]
    Auth {
        /// Error message
        message: String,
    },

    /// The message store rejected a write, read or delete
    #[error("Message store error: {message}")]
    Store {
        /// Error message
        message: String,
    },

    /// The blob store failed to store an attachment
    #[error("Upload of {path} failed: {message}")]
    Upload {
        /// Destination path
        path: String,
        /// Error message
        message: String,
    },

    /// The user (or platform) denied access to the capture device
    #[error("Capture permission denied")]
    CapturePermissionDenied,

    /// The capture device failed mid-recording
    #[error("Capture failed: {message}")]
    Capture {
        /// Error message
        message: String,
    },

    /// A recording is already running
    #[error("A recording is already in progress")]
    RecordingInProgress,

    /// Stop was requested with nothing recording
    #[error("No recording in progress")]
    NotRecording,
}

impl ChatError {
    /// Create an authentication error
    #[must_use]
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a message store error
    #[must_use]
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create an upload error
    #[must_use]
    pub fn upload(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upload {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a capture error
    #[must_use]
    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture {
            message: message.into(),
        }
    }
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating [`crate::config::WidgetConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Unknown file extension
    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat {
        /// The offending extension
        extension: String,
    },

    /// Well-formed but semantically invalid
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Error message
        message: String,
    },
}

impl ConfigError {
    /// Create a validation error
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}
