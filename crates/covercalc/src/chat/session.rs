//! Chat panel controller
//!
//! Owns the signed-in identity, the live message subscription, the current
//! recording (if any) and the upload indicator. All backend access goes
//! through the injected [`ChatServices`].

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use uuid::Uuid;

use super::message::{MediaKind, Message, MessageDraft, MessageId};
use super::services::{CaptureHandle, ChatServices, Identity, MessageQuery, MessageSubscription};
use super::upload::UploadMonitor;
use crate::config::ChatConfig;
use crate::error::{ChatError, ChatResult};

/// Controller behind the hidden chat panel
#[derive(Debug)]
pub struct ChatSession {
    services: ChatServices,
    config: ChatConfig,
    identity: Option<Identity>,
    subscription: Option<MessageSubscription>,
    messages: Vec<Message>,
    recording: Option<CaptureHandle>,
    upload: UploadMonitor,
}

impl ChatSession {
    /// Creates a disconnected session
    #[must_use]
    pub fn new(services: ChatServices, config: ChatConfig) -> Self {
        let upload = UploadMonitor::new(services.clock.clone(), config.upload_schedule.clone());
        Self {
            services,
            config,
            identity: None,
            subscription: None,
            messages: Vec::new(),
            recording: None,
            upload,
        }
    }

    /// Signs in anonymously and opens the message subscription.
    ///
    /// Calling it again on a connected session is a no-op.
    pub async fn connect(&mut self) -> ChatResult<Identity> {
        if let (Some(identity), Some(_)) = (&self.identity, &self.subscription) {
            return Ok(identity.clone());
        }

        let identity = self.services.identity.sign_in_anonymously().await?;
        let query = MessageQuery::collection(self.config.collection.clone())
            .with_limit(self.config.message_limit);
        let subscription = self.services.messages.subscribe(query).await?;

        self.messages = subscription.snapshot();
        self.subscription = Some(subscription);
        self.identity = Some(identity.clone());
        tracing::info!(
            uid = %identity.uid,
            collection = %self.config.collection,
            visible = self.messages.len(),
            "chat session connected"
        );
        Ok(identity)
    }

    /// True once [`Self::connect`] has succeeded
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.identity.is_some() && self.subscription.is_some()
    }

    /// The signed-in identity
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Messages currently visible, oldest first
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Session configuration
    #[must_use]
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Picks up the latest snapshot without waiting. Returns true if the
    /// visible list changed.
    pub fn refresh(&mut self) -> bool {
        let Some(latest) = self.subscription.as_mut().and_then(MessageSubscription::poll_latest)
        else {
            return false;
        };
        self.messages = latest;
        true
    }

    /// Waits for the next snapshot. `None` when disconnected or the store
    /// has gone away.
    pub async fn next_update(&mut self) -> Option<&[Message]> {
        let latest = self.subscription.as_mut()?.changed().await?;
        self.messages = latest;
        Some(self.messages.as_slice())
    }

    /// Sends a text message.
    ///
    /// Whitespace-only input is ignored and yields `Ok(None)`. Otherwise the
    /// text is sent exactly as typed.
    pub async fn send_text(&self, text: &str) -> ChatResult<Option<MessageId>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let uid = self.require_uid()?;
        let id = self
            .services
            .messages
            .append(&self.config.collection, MessageDraft::text(uid, text))
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "send failed"))?;
        tracing::info!(%id, "text message sent");
        Ok(Some(id))
    }

    /// Uploads an attachment and appends a message pointing at it.
    ///
    /// The upload indicator runs for the duration of the upload and is
    /// cleared whether it succeeds, fails or is dropped half way.
    pub async fn send_media(
        &self,
        kind: MediaKind,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> ChatResult<MessageId> {
        self.media_upload(kind, bytes, mime_type)?.await
    }

    /// Starts an attachment upload and returns the rest of it as a future
    /// that owns everything it needs.
    ///
    /// The upload counts as in flight from this call until the future
    /// completes or is dropped, so a renderer can poll
    /// [`Self::upload_progress`] while it is pending.
    pub fn media_upload(
        &self,
        kind: MediaKind,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> ChatResult<BoxFuture<'static, ChatResult<MessageId>>> {
        let uid = self.require_uid()?.to_string();
        let path = self.media_path(&uid, kind, mime_type);
        let mime_type = mime_type.to_string();
        let collection = self.config.collection.clone();
        let blobs = Arc::clone(&self.services.blobs);
        let messages = Arc::clone(&self.services.messages);
        let in_flight = self.upload.begin();

        Ok(async move {
            let size = bytes.len();
            let uploaded = blobs.upload(&path, bytes, &mime_type).await;
            drop(in_flight);

            let url =
                uploaded.inspect_err(|e| tracing::warn!(error = %e, %path, "upload failed"))?;
            tracing::info!(%path, size, "attachment uploaded");

            messages
                .append(&collection, MessageDraft::media(uid, kind, url))
                .await
                .inspect_err(|e| tracing::warn!(error = %e, "media message append failed"))
        }
        .boxed())
    }

    /// Starts recording from the capture device
    pub async fn start_recording(&mut self, kind: MediaKind) -> ChatResult<()> {
        if self.recording.is_some() {
            return Err(ChatError::RecordingInProgress);
        }
        self.require_uid()?;
        let handle = self
            .services
            .capture
            .start_capture(kind)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "capture did not start"))?;
        tracing::info!(kind = kind.as_str(), "recording started");
        self.recording = Some(handle);
        Ok(())
    }

    /// True while a recording is running
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Stops the recording and sends it as a media message
    pub async fn stop_recording_and_send(&mut self) -> ChatResult<MessageId> {
        let handle = self.recording.take().ok_or(ChatError::NotRecording)?;
        let media = self.services.capture.stop_capture(handle).await?;
        tracing::info!(
            kind = media.kind.as_str(),
            size = media.bytes.len(),
            "recording stopped"
        );
        self.send_media(media.kind, media.bytes, &media.mime_type)
            .await
    }

    /// Stops the recording and discards it. Returns false if nothing was
    /// recording.
    pub async fn cancel_recording(&mut self) -> ChatResult<bool> {
        let Some(handle) = self.recording.take() else {
            return Ok(false);
        };
        self.services.capture.stop_capture(handle).await?;
        tracing::info!("recording discarded");
        Ok(true)
    }

    /// Deletes every visible message in one batch. Returns how many were
    /// removed.
    pub async fn clear_history(&self) -> ChatResult<usize> {
        self.require_uid()?;
        let ids: Vec<MessageId> = self.messages.iter().map(|m| m.id.clone()).collect();
        if ids.is_empty() {
            return Ok(0);
        }
        let removed = self
            .services
            .messages
            .delete_all(&self.config.collection, &ids)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "clear history failed"))?;
        tracing::info!(removed, "history cleared");
        Ok(removed)
    }

    /// Shared upload indicator
    #[must_use]
    pub fn upload_monitor(&self) -> &UploadMonitor {
        &self.upload
    }

    /// Simulated upload percentage, `None` when idle
    #[must_use]
    pub fn upload_progress(&self) -> Option<u8> {
        self.upload.progress()
    }

    fn require_uid(&self) -> ChatResult<&str> {
        self.identity
            .as_ref()
            .map(|identity| identity.uid.as_str())
            .ok_or(ChatError::NotSignedIn)
    }

    fn media_path(&self, uid: &str, kind: MediaKind, mime_type: &str) -> String {
        format!(
            "{}/{}/{}/{}.{}",
            self.config.media_prefix,
            uid,
            kind.as_str(),
            Uuid::new_v4(),
            kind.extension_for(mime_type)
        )
    }
}
