//! Message records owned by the message store

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Store-assigned message identifier
pub type MessageId = String;

/// Kind of attachment a capture or upload carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image
    Image,
    /// Video clip
    Video,
    /// Audio recording
    Audio,
}

impl MediaKind {
    /// Lowercase name, used in storage paths
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }

    /// File extension for a MIME type, falling back to a per-kind default
    #[must_use]
    pub fn extension_for(&self, mime_type: &str) -> &'static str {
        match mime_type {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "video/mp4" => "mp4",
            "video/webm" => "webm",
            "audio/ogg" => "ogg",
            "audio/mpeg" => "mp3",
            "audio/webm" => "weba",
            _ => match self {
                Self::Image => "img",
                Self::Video => "vid",
                Self::Audio => "aud",
            },
        }
    }
}

/// Message kind as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Plain text
    #[default]
    Text,
    /// Image attachment
    Image,
    /// Video attachment
    Video,
    /// Audio attachment
    Audio,
}

impl From<MediaKind> for MessageKind {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => Self::Image,
            MediaKind::Video => Self::Video,
            MediaKind::Audio => Self::Audio,
        }
    }
}

/// Client-side record passed to `append`; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDraft {
    /// Text body (absent for pure media messages)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Sender identity uid
    pub sender: String,
    /// Message kind
    pub kind: MessageKind,
    /// URL of the attachment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

impl MessageDraft {
    /// Creates a text draft
    #[must_use]
    pub fn text(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            sender: sender.into(),
            kind: MessageKind::Text,
            media_url: None,
        }
    }

    /// Creates a media draft pointing at an uploaded attachment
    #[must_use]
    pub fn media(sender: impl Into<String>, kind: MediaKind, url: impl Into<String>) -> Self {
        Self {
            text: None,
            sender: sender.into(),
            kind: kind.into(),
            media_url: Some(url.into()),
        }
    }
}

/// A stored message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Store-assigned identifier
    pub id: MessageId,
    /// Text body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Sender identity uid
    pub sender: String,
    /// Message kind
    pub kind: MessageKind,
    /// Attachment URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    /// Server timestamp, ms since the Unix epoch
    pub timestamp_ms: u64,
}

impl Message {
    /// Materializes a draft with store-assigned fields
    #[must_use]
    pub fn from_draft(id: MessageId, draft: MessageDraft, timestamp_ms: u64) -> Self {
        Self {
            id,
            text: draft.text,
            sender: draft.sender,
            kind: draft.kind,
            media_url: draft.media_url,
            timestamp_ms,
        }
    }

    /// True if `uid` sent this message
    #[must_use]
    pub fn is_from(&self, uid: &str) -> bool {
        self.sender == uid
    }

    /// Server timestamp in the host's local time zone
    #[must_use]
    pub fn local_time(&self) -> Option<DateTime<Local>> {
        let millis = i64::try_from(self.timestamp_ms).ok()?;
        Local.timestamp_millis_opt(millis).single()
    }

    /// Timestamp rendered as `HH:MM` in a given zone
    #[must_use]
    pub fn time_label_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        i64::try_from(self.timestamp_ms)
            .ok()
            .and_then(|millis| tz.timestamp_millis_opt(millis).single())
            .map(|time| time.format("%H:%M").to_string())
            .unwrap_or_default()
    }

    /// Timestamp rendered as local `HH:MM`
    #[must_use]
    pub fn time_label(&self) -> String {
        self.local_time()
            .map(|time| time.format("%H:%M").to_string())
            .unwrap_or_default()
    }
}
