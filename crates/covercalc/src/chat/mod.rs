//! Hidden chat panel
//!
//! Messages, the collaborator traits the panel consumes, in-memory
//! implementations of them, and the session that drives the panel.

pub mod memory;
mod message;
mod services;
mod session;
pub mod upload;

pub use memory::{
    AnonymousAuth, MemoryBackend, MemoryBlobStore, MemoryMessageStore, ScriptedCapture,
    StoredBlob,
};
pub use message::{MediaKind, Message, MessageDraft, MessageId, MessageKind};
pub use services::{
    BlobStore, CaptureHandle, CapturedMedia, ChatServices, Identity, IdentityService,
    MediaCapture, MessageQuery, MessageStore, MessageSubscription,
};
pub use session::ChatSession;
pub use upload::{ProgressStep, UploadGuard, UploadMonitor, UploadSchedule};
