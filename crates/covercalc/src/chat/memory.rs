//! In-process collaborator implementations
//!
//! Used by tests and by hosts that have no managed backend wired in. Each
//! one can be switched "offline" (or have permission denied) so failure
//! paths can be exercised deterministically.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use super::message::{MediaKind, Message, MessageDraft, MessageId};
use super::services::{
    BlobStore, CaptureHandle, CapturedMedia, ChatServices, Identity, IdentityService,
    MediaCapture, MessageQuery, MessageStore, MessageSubscription,
};
use crate::clock::SharedClock;
use crate::config::ChatConfig;
use crate::error::{ChatError, ChatResult};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Identity
// ============================================================================

/// Anonymous sign-in that mints a random uid once
#[derive(Debug, Default)]
pub struct AnonymousAuth {
    identity: Mutex<Option<Identity>>,
    offline: AtomicBool,
}

impl AnonymousAuth {
    /// Creates a signed-out provider
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider already signed in as `uid`
    #[must_use]
    pub fn signed_in(uid: impl Into<String>) -> Self {
        Self {
            identity: Mutex::new(Some(Identity {
                uid: uid.into(),
                anonymous: true,
            })),
            offline: AtomicBool::new(false),
        }
    }

    /// Makes subsequent sign-ins fail
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Drops the current identity
    pub fn sign_out(&self) {
        lock(&self.identity).take();
    }
}

#[async_trait]
impl IdentityService for AnonymousAuth {
    async fn sign_in_anonymously(&self) -> ChatResult<Identity> {
        let mut slot = lock(&self.identity);
        if let Some(identity) = slot.as_ref() {
            return Ok(identity.clone());
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(ChatError::auth("identity service unreachable"));
        }

        let identity = Identity {
            uid: Uuid::new_v4().simple().to_string(),
            anonymous: true,
        };
        tracing::info!(uid = %identity.uid, "signed in anonymously");
        *slot = Some(identity.clone());
        Ok(identity)
    }

    fn current(&self) -> Option<Identity> {
        lock(&self.identity).clone()
    }
}

// ============================================================================
// Message store
// ============================================================================

/// Message collections held in memory, one watch channel per collection
#[derive(Debug)]
pub struct MemoryMessageStore {
    clock: SharedClock,
    collections: Mutex<HashMap<String, watch::Sender<Vec<Message>>>>,
    offline: AtomicBool,
}

impl MemoryMessageStore {
    /// Creates an empty store stamping messages with `clock`
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            collections: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent operation fail
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Ordered contents of a collection
    #[must_use]
    pub fn messages(&self, collection: &str) -> Vec<Message> {
        lock(&self.collections)
            .get(collection)
            .map(|tx| tx.borrow().clone())
            .unwrap_or_default()
    }

    /// Number of messages in a collection
    #[must_use]
    pub fn len(&self, collection: &str) -> usize {
        lock(&self.collections)
            .get(collection)
            .map_or(0, |tx| tx.borrow().len())
    }

    /// Serializes a collection to JSON
    pub fn export_json(&self, collection: &str) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.messages(collection))
    }

    /// Replaces a collection with messages from JSON, re-sorting them
    pub fn import_json(&self, collection: &str, json: &str) -> Result<usize, serde_json::Error> {
        let mut messages: Vec<Message> = serde_json::from_str(json)?;
        messages.sort_by_key(|m| m.timestamp_ms);
        let count = messages.len();
        self.with_collection(collection, |tx| {
            tx.send_replace(messages);
        });
        Ok(count)
    }

    fn check_online(&self) -> ChatResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(ChatError::store("message store unreachable"))
        } else {
            Ok(())
        }
    }

    fn with_collection<R>(
        &self,
        collection: &str,
        f: impl FnOnce(&watch::Sender<Vec<Message>>) -> R,
    ) -> R {
        let mut collections = lock(&self.collections);
        let tx = collections
            .entry(collection.to_string())
            .or_insert_with(|| watch::channel(Vec::new()).0);
        f(tx)
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn append(&self, collection: &str, draft: MessageDraft) -> ChatResult<MessageId> {
        self.check_online()?;
        let id = Uuid::new_v4().to_string();
        let message = Message::from_draft(id.clone(), draft, self.clock.now_ms());

        self.with_collection(collection, |tx| {
            tx.send_modify(|list| {
                // Equal timestamps keep arrival order
                let at = list.partition_point(|m| m.timestamp_ms <= message.timestamp_ms);
                list.insert(at, message);
            });
        });
        tracing::debug!(collection, %id, "message appended");
        Ok(id)
    }

    async fn subscribe(&self, query: MessageQuery) -> ChatResult<MessageSubscription> {
        self.check_online()?;
        let receiver = self.with_collection(&query.collection, watch::Sender::subscribe);
        Ok(MessageSubscription::new(query, receiver))
    }

    async fn delete_all(&self, collection: &str, ids: &[MessageId]) -> ChatResult<usize> {
        self.check_online()?;
        let removed = self.with_collection(collection, |tx| {
            let mut removed = 0;
            tx.send_if_modified(|list| {
                let before = list.len();
                list.retain(|m| !ids.contains(&m.id));
                removed = before - list.len();
                removed > 0
            });
            removed
        });
        tracing::info!(collection, removed, "batch delete committed");
        Ok(removed)
    }
}

// ============================================================================
// Blob store
// ============================================================================

/// A stored attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// MIME type given at upload
    pub content_type: String,
    /// Raw bytes
    pub bytes: Vec<u8>,
}

/// Attachments held in memory, addressed as `memory://<bucket>/<path>`
#[derive(Debug)]
pub struct MemoryBlobStore {
    bucket: String,
    objects: Mutex<HashMap<String, StoredBlob>>,
    offline: AtomicBool,
}

impl MemoryBlobStore {
    /// Creates an empty bucket
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Makes subsequent uploads fail
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// URL for a stored path
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!("memory://{}/{}", self.bucket, path)
    }

    /// Looks up an object by URL or bare path
    #[must_use]
    pub fn get(&self, url_or_path: &str) -> Option<StoredBlob> {
        let prefix = format!("memory://{}/", self.bucket);
        let path = url_or_path.strip_prefix(&prefix).unwrap_or(url_or_path);
        lock(&self.objects).get(path).cloned()
    }

    /// Number of stored objects
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    /// True when nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> ChatResult<String> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ChatError::upload(path, "blob store unreachable"));
        }
        let size = bytes.len();
        lock(&self.objects).insert(
            path.to_string(),
            StoredBlob {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        tracing::debug!(path, size, "blob stored");
        Ok(self.url_for(path))
    }
}

// ============================================================================
// Media capture
// ============================================================================

/// Capture device that "records" a fixed payload
#[derive(Debug)]
pub struct ScriptedCapture {
    payload: Vec<u8>,
    permission_granted: AtomicBool,
    next_id: AtomicU64,
    active: Mutex<HashMap<u64, MediaKind>>,
}

impl ScriptedCapture {
    /// Creates a device that returns `payload` for every capture
    #[must_use]
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
            permission_granted: AtomicBool::new(true),
            next_id: AtomicU64::new(1),
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Grants or revokes device permission
    pub fn set_permission(&self, granted: bool) {
        self.permission_granted.store(granted, Ordering::SeqCst);
    }

    /// Number of captures currently running
    #[must_use]
    pub fn active_captures(&self) -> usize {
        lock(&self.active).len()
    }

    fn mime_type(kind: MediaKind) -> &'static str {
        match kind {
            MediaKind::Image => "image/png",
            MediaKind::Video => "video/webm",
            MediaKind::Audio => "audio/webm",
        }
    }
}

#[async_trait]
impl MediaCapture for ScriptedCapture {
    async fn start_capture(&self, kind: MediaKind) -> ChatResult<CaptureHandle> {
        if !self.permission_granted.load(Ordering::SeqCst) {
            return Err(ChatError::CapturePermissionDenied);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.active).insert(id, kind);
        Ok(CaptureHandle { id, kind })
    }

    async fn stop_capture(&self, handle: CaptureHandle) -> ChatResult<CapturedMedia> {
        let kind = lock(&self.active)
            .remove(&handle.id)
            .ok_or_else(|| ChatError::capture(format!("unknown capture {}", handle.id)))?;
        Ok(CapturedMedia {
            kind,
            mime_type: Self::mime_type(kind).to_string(),
            bytes: self.payload.clone(),
        })
    }
}

// ============================================================================
// Bundle
// ============================================================================

/// All four in-memory collaborators sharing one clock.
///
/// Keeps typed handles so callers can flip failure toggles after handing
/// [`ChatServices`] to a session.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    /// Identity provider
    pub auth: Arc<AnonymousAuth>,
    /// Message store
    pub messages: Arc<MemoryMessageStore>,
    /// Blob store
    pub blobs: Arc<MemoryBlobStore>,
    /// Capture device
    pub capture: Arc<ScriptedCapture>,
    /// Shared clock
    pub clock: SharedClock,
}

impl MemoryBackend {
    /// Creates a signed-out backend storing attachments under `bucket`
    #[must_use]
    pub fn new(clock: SharedClock, bucket: impl Into<String>) -> Self {
        Self {
            auth: Arc::new(AnonymousAuth::new()),
            messages: Arc::new(MemoryMessageStore::new(clock.clone())),
            blobs: Arc::new(MemoryBlobStore::new(bucket)),
            capture: Arc::new(ScriptedCapture::new(Vec::new())),
            clock,
        }
    }

    /// Creates a backend using the bucket named in `config`
    #[must_use]
    pub fn for_config(clock: SharedClock, config: &ChatConfig) -> Self {
        Self::new(clock, config.bucket.clone())
    }

    /// Replaces the capture device
    #[must_use]
    pub fn with_capture(mut self, capture: ScriptedCapture) -> Self {
        self.capture = Arc::new(capture);
        self
    }

    /// Replaces the identity provider
    #[must_use]
    pub fn with_auth(mut self, auth: AnonymousAuth) -> Self {
        self.auth = Arc::new(auth);
        self
    }

    /// Type-erased view handed to a [`super::ChatSession`]
    #[must_use]
    pub fn services(&self) -> ChatServices {
        ChatServices {
            identity: self.auth.clone(),
            messages: self.messages.clone(),
            blobs: self.blobs.clone(),
            capture: self.capture.clone(),
            clock: self.clock.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn store() -> (Arc<ManualClock>, MemoryMessageStore) {
        let clock = ManualClock::shared(1_000);
        let store = MemoryMessageStore::new(clock.clone());
        (clock, store)
    }

    // ===== AnonymousAuth =====

    #[tokio::test]
    async fn test_sign_in_is_idempotent() {
        let auth = AnonymousAuth::new();
        assert!(auth.current().is_none());
        let first = auth.sign_in_anonymously().await.unwrap();
        let second = auth.sign_in_anonymously().await.unwrap();
        assert_eq!(first, second);
        assert!(first.anonymous);
        assert_eq!(auth.current(), Some(first));
    }

    #[tokio::test]
    async fn test_sign_in_offline_fails() {
        let auth = AnonymousAuth::new();
        auth.set_offline(true);
        let err = auth.sign_in_anonymously().await.unwrap_err();
        assert!(matches!(err, ChatError::Auth { .. }));
    }

    #[tokio::test]
    async fn test_signed_in_survives_offline() {
        let auth = AnonymousAuth::signed_in("uid-1");
        auth.set_offline(true);
        assert_eq!(auth.sign_in_anonymously().await.unwrap().uid, "uid-1");
    }

    #[tokio::test]
    async fn test_sign_out_mints_new_uid() {
        let auth = AnonymousAuth::signed_in("uid-1");
        auth.sign_out();
        let identity = auth.sign_in_anonymously().await.unwrap();
        assert_ne!(identity.uid, "uid-1");
    }

    // ===== MemoryMessageStore =====

    #[tokio::test]
    async fn test_append_orders_by_timestamp() {
        let (clock, store) = store();
        store
            .append("m", MessageDraft::text("u", "first"))
            .await
            .unwrap();
        clock.advance_ms(10);
        store
            .append("m", MessageDraft::text("u", "second"))
            .await
            .unwrap();

        let texts: Vec<_> = store
            .messages("m")
            .into_iter()
            .filter_map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_equal_timestamps_keep_arrival_order() {
        let (_, store) = store();
        for text in ["a", "b", "c"] {
            store.append("m", MessageDraft::text("u", text)).await.unwrap();
        }
        let texts: Vec<_> = store
            .messages("m")
            .into_iter()
            .filter_map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_imported_history_sorted_and_appends_interleave() {
        let (clock, store) = store();
        let older = Message::from_draft("x".into(), MessageDraft::text("u", "old"), 500);
        let newer = Message::from_draft("y".into(), MessageDraft::text("u", "new"), 2_000);
        let json = serde_json::to_string(&vec![newer, older]).unwrap();
        assert_eq!(store.import_json("m", &json).unwrap(), 2);

        clock.set_ms(1_000);
        store
            .append("m", MessageDraft::text("u", "middle"))
            .await
            .unwrap();
        let texts: Vec<_> = store
            .messages("m")
            .into_iter()
            .filter_map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["old", "middle", "new"]);
    }

    #[tokio::test]
    async fn test_subscription_sees_appends() {
        let (_, store) = store();
        let mut sub = store
            .subscribe(MessageQuery::collection("m"))
            .await
            .unwrap();
        assert!(sub.snapshot().is_empty());

        store.append("m", MessageDraft::text("u", "hi")).await.unwrap();
        let snapshot = sub.changed().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].text.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let (_, store) = store();
        store.append("a", MessageDraft::text("u", "1")).await.unwrap();
        assert_eq!(store.len("a"), 1);
        assert_eq!(store.len("b"), 0);
    }

    #[tokio::test]
    async fn test_delete_all_removes_listed_only() {
        let (_, store) = store();
        let keep = store.append("m", MessageDraft::text("u", "keep")).await.unwrap();
        let gone = store.append("m", MessageDraft::text("u", "gone")).await.unwrap();

        let removed = store
            .delete_all("m", &[gone, "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        let remaining = store.messages("m");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep);
    }

    #[tokio::test]
    async fn test_delete_all_publishes_once() {
        let (_, store) = store();
        let a = store.append("m", MessageDraft::text("u", "a")).await.unwrap();
        let b = store.append("m", MessageDraft::text("u", "b")).await.unwrap();
        let mut sub = store.subscribe(MessageQuery::collection("m")).await.unwrap();

        store.delete_all("m", &[a, b]).await.unwrap();
        assert!(sub.changed().await.unwrap().is_empty());
        assert!(!sub.has_changed());
    }

    #[tokio::test]
    async fn test_delete_nothing_does_not_notify() {
        let (_, store) = store();
        store.append("m", MessageDraft::text("u", "a")).await.unwrap();
        let sub = store.subscribe(MessageQuery::collection("m")).await.unwrap();
        store.delete_all("m", &[]).await.unwrap();
        assert!(!sub.has_changed());
    }

    #[tokio::test]
    async fn test_offline_store_rejects_everything() {
        let (_, store) = store();
        store.set_offline(true);
        assert!(store.append("m", MessageDraft::text("u", "x")).await.is_err());
        assert!(store.subscribe(MessageQuery::collection("m")).await.is_err());
        assert!(store.delete_all("m", &[]).await.is_err());
        store.set_offline(false);
        assert!(store.append("m", MessageDraft::text("u", "x")).await.is_ok());
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let (_, store) = store();
        store.append("m", MessageDraft::text("u", "a")).await.unwrap();
        let json = store.export_json("m").unwrap();

        let (_, other) = self::store();
        assert_eq!(other.import_json("m", &json).unwrap(), 1);
        assert_eq!(other.messages("m"), store.messages("m"));
    }

    // ===== MemoryBlobStore =====

    #[tokio::test]
    async fn test_upload_returns_retrievable_url() {
        let blobs = MemoryBlobStore::new("bucket");
        let url = blobs
            .upload("media/u/image/a.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        assert_eq!(url, "memory://bucket/media/u/image/a.png");

        let stored = blobs.get(&url).unwrap();
        assert_eq!(stored.bytes, vec![1, 2, 3]);
        assert_eq!(stored.content_type, "image/png");
        assert_eq!(blobs.get("media/u/image/a.png"), Some(stored));
    }

    #[tokio::test]
    async fn test_upload_offline() {
        let blobs = MemoryBlobStore::new("bucket");
        blobs.set_offline(true);
        let err = blobs.upload("p", vec![], "image/png").await.unwrap_err();
        assert!(matches!(err, ChatError::Upload { .. }));
        assert!(blobs.is_empty());
    }

    // ===== ScriptedCapture =====

    #[tokio::test]
    async fn test_capture_round_trip() {
        let capture = ScriptedCapture::new(b"OggS".to_vec());
        let handle = capture.start_capture(MediaKind::Audio).await.unwrap();
        assert_eq!(capture.active_captures(), 1);

        let media = capture.stop_capture(handle).await.unwrap();
        assert_eq!(media.kind, MediaKind::Audio);
        assert_eq!(media.mime_type, "audio/webm");
        assert_eq!(media.bytes, b"OggS".to_vec());
        assert_eq!(capture.active_captures(), 0);
    }

    #[tokio::test]
    async fn test_capture_permission_denied() {
        let capture = ScriptedCapture::new(Vec::new());
        capture.set_permission(false);
        let err = capture.start_capture(MediaKind::Audio).await.unwrap_err();
        assert_eq!(err, ChatError::CapturePermissionDenied);
    }

    #[tokio::test]
    async fn test_stop_unknown_capture() {
        let capture = ScriptedCapture::new(Vec::new());
        let bogus = CaptureHandle {
            id: 99,
            kind: MediaKind::Audio,
        };
        assert!(matches!(
            capture.stop_capture(bogus).await,
            Err(ChatError::Capture { .. })
        ));
    }

    // ===== MemoryBackend =====

    #[tokio::test]
    async fn test_backend_uses_configured_bucket() {
        let config = ChatConfig {
            bucket: "vault".to_string(),
            ..ChatConfig::default()
        };
        let backend = MemoryBackend::for_config(ManualClock::shared(0), &config);
        let url = backend
            .services()
            .blobs
            .upload("media/u/image/a.png", vec![1], "image/png")
            .await
            .unwrap();
        assert_eq!(url, "memory://vault/media/u/image/a.png");
        assert!(backend.blobs.get(&url).is_some());
    }
}
