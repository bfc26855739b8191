//! Chat panel flows through the public API, two participants sharing one
//! in-memory backend

use std::sync::Arc;

use covercalc::chat::{
    AnonymousAuth, ChatServices, ChatSession, MediaKind, MemoryBackend, MessageKind,
    MessageQuery, MessageStore, ScriptedCapture,
};
use covercalc::clock::ManualClock;
use covercalc::config::ChatConfig;
use covercalc::ChatError;
use futures::StreamExt;

fn backend() -> (Arc<ManualClock>, MemoryBackend) {
    let clock = ManualClock::shared(1_700_000_000_000);
    let backend = MemoryBackend::new(clock.clone(), "bucket")
        .with_capture(ScriptedCapture::new(b"voice-note".to_vec()))
        .with_auth(AnonymousAuth::signed_in("alice"));
    (clock, backend)
}

fn as_user(backend: &MemoryBackend, uid: &str) -> ChatServices {
    ChatServices {
        identity: Arc::new(AnonymousAuth::signed_in(uid)),
        ..backend.services()
    }
}

async fn connected(services: ChatServices, config: ChatConfig) -> ChatSession {
    let mut session = ChatSession::new(services, config);
    session.connect().await.expect("connect");
    session
}

// ===== Shared history tests =====

#[tokio::test]
async fn test_both_participants_see_each_message() {
    let (clock, backend) = backend();
    let alice = connected(backend.services(), ChatConfig::default()).await;
    let mut bob = connected(as_user(&backend, "bob"), ChatConfig::default()).await;

    alice.send_text("hi bob").await.expect("send");
    clock.advance_ms(10);
    bob.send_text("hi alice").await.expect("send");

    assert!(bob.refresh());
    let texts: Vec<_> = bob
        .messages()
        .iter()
        .map(|m| m.text.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(texts, ["hi bob", "hi alice"]);
    assert!(!bob.messages()[0].is_from("bob"));
    assert!(bob.messages()[1].is_from("bob"));
}

#[tokio::test]
async fn test_message_limit_keeps_most_recent() {
    let (clock, backend) = backend();
    let config = ChatConfig {
        message_limit: Some(2),
        ..ChatConfig::default()
    };
    let mut session = connected(backend.services(), config).await;

    for text in ["one", "two", "three"] {
        session.send_text(text).await.expect("send");
        clock.advance_ms(1);
    }
    session.refresh();

    let texts: Vec<_> = session
        .messages()
        .iter()
        .filter_map(|m| m.text.clone())
        .collect();
    assert_eq!(texts, ["two", "three"]);
    assert_eq!(backend.messages.len("messages"), 3);
}

#[tokio::test]
async fn test_clear_history_empties_every_view() {
    let (_, backend) = backend();
    let mut alice = connected(backend.services(), ChatConfig::default()).await;
    let mut bob = connected(as_user(&backend, "bob"), ChatConfig::default()).await;

    alice.send_text("secret").await.expect("send");
    bob.send_text("also secret").await.expect("send");
    bob.refresh();

    assert_eq!(bob.clear_history().await.expect("clear"), 2);
    assert!(alice.refresh());
    assert!(alice.messages().is_empty());
    assert_eq!(backend.messages.len("messages"), 0);
}

#[tokio::test]
async fn test_collections_are_isolated() {
    let (_, backend) = backend();
    let team = ChatConfig {
        collection: "team".to_string(),
        ..ChatConfig::default()
    };
    let mut general = connected(backend.services(), ChatConfig::default()).await;
    let team = connected(as_user(&backend, "bob"), team).await;

    team.send_text("team only").await.expect("send");
    assert!(!general.refresh());
    assert!(general.messages().is_empty());
}

// ===== Media tests =====

#[tokio::test]
async fn test_recorded_audio_lands_in_blob_store() {
    let (_, backend) = backend();
    let mut session = connected(backend.services(), ChatConfig::default()).await;

    session
        .start_recording(MediaKind::Audio)
        .await
        .expect("start");
    session.stop_recording_and_send().await.expect("send");
    session.refresh();

    let message = &session.messages()[0];
    assert_eq!(message.kind, MessageKind::Audio);
    let url = message.media_url.as_deref().expect("url");
    let blob = backend.blobs.get(url).expect("stored");
    assert_eq!(blob.bytes, b"voice-note");
    assert_eq!(blob.content_type, "audio/webm");
    assert!(url.contains("/alice/"));
}

#[tokio::test]
async fn test_upload_failure_sends_nothing() {
    let (_, backend) = backend();
    let mut session = connected(backend.services(), ChatConfig::default()).await;
    backend.blobs.set_offline(true);

    let result = session
        .send_media(MediaKind::Image, vec![1, 2, 3], "image/jpeg")
        .await;
    assert!(matches!(result, Err(ChatError::Upload { .. })));
    assert_eq!(session.upload_progress(), None);
    assert!(!session.refresh());
    assert!(backend.blobs.is_empty());
}

#[tokio::test]
async fn test_denied_microphone_leaves_session_idle() {
    let (_, backend) = backend();
    let mut session = connected(backend.services(), ChatConfig::default()).await;
    backend.capture.set_permission(false);

    let result = session.start_recording(MediaKind::Audio).await;
    assert!(matches!(result, Err(ChatError::CapturePermissionDenied)));
    assert!(!session.is_recording());
    assert_eq!(backend.capture.active_captures(), 0);
}

// ===== Subscription tests =====

#[tokio::test]
async fn test_subscription_stream_yields_snapshot_then_changes() {
    let (clock, backend) = backend();
    let sender = connected(backend.services(), ChatConfig::default()).await;
    sender.send_text("before").await.expect("send");

    let subscription = backend
        .messages
        .subscribe(MessageQuery::collection("messages"))
        .await
        .expect("subscribe");
    let mut stream = Box::pin(subscription.into_stream());

    let first = stream.next().await.expect("initial snapshot");
    assert_eq!(first.len(), 1);

    clock.advance_ms(5);
    sender.send_text("after").await.expect("send");
    let second = stream.next().await.expect("update");
    assert_eq!(second.len(), 2);
    assert_eq!(second[1].text.as_deref(), Some("after"));
}

#[tokio::test]
async fn test_next_update_wakes_on_remote_send() {
    let (_, backend) = backend();
    let mut alice = connected(backend.services(), ChatConfig::default()).await;
    let bob = connected(as_user(&backend, "bob"), ChatConfig::default()).await;

    let send = async {
        tokio::task::yield_now().await;
        bob.send_text("ping").await.expect("send");
    };
    let (update, ()) = tokio::join!(alice.next_update(), send);
    assert_eq!(update.map(<[_]>::len), Some(1));
}

#[tokio::test]
async fn test_exported_history_reimports_in_order() {
    let (clock, backend) = backend();
    let session = connected(backend.services(), ChatConfig::default()).await;
    session.send_text("a").await.expect("send");
    clock.advance_ms(1);
    session.send_text("b").await.expect("send");

    let json = backend.messages.export_json("messages").expect("export");
    let imported = backend
        .messages
        .import_json("archive", &json)
        .expect("import");
    assert_eq!(imported, 2);
    assert_eq!(
        backend.messages.messages("archive"),
        backend.messages.messages("messages")
    );
}
