//! Collaborator interfaces consumed by the chat panel
//!
//! The panel never talks to a backend directly. Each collaborator is a
//! trait object bundled into [`ChatServices`], which is handed to the
//! session at construction time.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::message::{MediaKind, Message, MessageDraft, MessageId};
use crate::clock::SharedClock;
use crate::error::ChatResult;

/// Signed-in identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id
    pub uid: String,
    /// True for anonymous sessions
    pub anonymous: bool,
}

/// Anonymous identity provider
#[async_trait]
pub trait IdentityService: Send + Sync + std::fmt::Debug {
    /// Signs in anonymously. Idempotent: returns the existing identity when
    /// already signed in.
    async fn sign_in_anonymously(&self) -> ChatResult<Identity>;

    /// The identity, if signed in
    fn current(&self) -> Option<Identity>;
}

/// Which messages a subscription observes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    /// Collection name
    pub collection: String,
    /// Keep only the most recent N messages
    pub limit: Option<usize>,
}

impl MessageQuery {
    /// All messages in a collection, oldest first
    #[must_use]
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            limit: None,
        }
    }

    /// Restricts the query to the most recent `limit` messages
    #[must_use]
    pub const fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Applies the query window to an ordered snapshot
    #[must_use]
    pub fn window(&self, ordered: &[Message]) -> Vec<Message> {
        let skip = self
            .limit
            .map_or(0, |limit| ordered.len().saturating_sub(limit));
        ordered[skip..].to_vec()
    }
}

/// Live view of a query.
///
/// Every change in the underlying collection publishes a fresh snapshot,
/// ordered by ascending server timestamp.
#[derive(Debug)]
pub struct MessageSubscription {
    query: MessageQuery,
    receiver: watch::Receiver<Vec<Message>>,
}

impl MessageSubscription {
    /// Wraps a store's change channel
    #[must_use]
    pub fn new(query: MessageQuery, receiver: watch::Receiver<Vec<Message>>) -> Self {
        Self { query, receiver }
    }

    /// The query this subscription observes
    #[must_use]
    pub fn query(&self) -> &MessageQuery {
        &self.query
    }

    /// Latest snapshot, without waiting
    #[must_use]
    pub fn snapshot(&self) -> Vec<Message> {
        self.query.window(&self.receiver.borrow())
    }

    /// True if a snapshot arrived that has not been read with
    /// [`Self::changed`] yet
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Latest snapshot if one arrived since the last read, marking it seen
    pub fn poll_latest(&mut self) -> Option<Vec<Message>> {
        if !self.has_changed() {
            return None;
        }
        Some(self.query.window(&self.receiver.borrow_and_update()))
    }

    /// Waits for the next change. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Vec<Message>> {
        self.receiver.changed().await.ok()?;
        Some(self.query.window(&self.receiver.borrow_and_update()))
    }

    /// Converts into a lazy stream: the current snapshot first, then one
    /// item per change
    pub fn into_stream(self) -> impl Stream<Item = Vec<Message>> + Send {
        let initial = self.snapshot();
        stream::once(async move { initial }).chain(stream::unfold(self, |mut sub| async move {
            let next = sub.changed().await?;
            Some((next, sub))
        }))
    }
}

/// Ordered, live-subscribable message collection
#[async_trait]
pub trait MessageStore: Send + Sync + std::fmt::Debug {
    /// Appends a draft; the store assigns id and server timestamp
    async fn append(&self, collection: &str, draft: MessageDraft) -> ChatResult<MessageId>;

    /// Opens a live subscription
    async fn subscribe(&self, query: MessageQuery) -> ChatResult<MessageSubscription>;

    /// Deletes every listed message in one atomic batch. Returns how many
    /// existed.
    async fn delete_all(&self, collection: &str, ids: &[MessageId]) -> ChatResult<usize>;
}

/// Object storage for attachments
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// Stores `bytes` at `path`; resolves to a retrievable URL once stored
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> ChatResult<String>;
}

/// Handle to a capture in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureHandle {
    /// Capture id, unique per device
    pub id: u64,
    /// What is being captured
    pub kind: MediaKind,
}

/// Bytes produced by a finished capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedMedia {
    /// Media kind
    pub kind: MediaKind,
    /// MIME type of `bytes`
    pub mime_type: String,
    /// Encoded media, forwarded to storage unmodified
    pub bytes: Vec<u8>,
}

/// Local capture device (microphone, camera)
#[async_trait]
pub trait MediaCapture: Send + Sync + std::fmt::Debug {
    /// Starts capturing; fails when permission is denied
    async fn start_capture(&self, kind: MediaKind) -> ChatResult<CaptureHandle>;

    /// Stops a capture and returns what was recorded
    async fn stop_capture(&self, handle: CaptureHandle) -> ChatResult<CapturedMedia>;
}

/// Everything the chat panel needs from the outside world
#[derive(Debug, Clone)]
pub struct ChatServices {
    /// Identity provider
    pub identity: Arc<dyn IdentityService>,
    /// Message collection
    pub messages: Arc<dyn MessageStore>,
    /// Attachment storage
    pub blobs: Arc<dyn BlobStore>,
    /// Capture device
    pub capture: Arc<dyn MediaCapture>,
    /// Time source
    pub clock: SharedClock,
}
