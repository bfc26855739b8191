//! Widget driver
//!
//! Routes DOM events to the calculator widget and the chat session, then
//! re-renders the mock DOM. Collaborator failures never escape: they are
//! logged, remembered in [`WidgetDriver::last_error`] and the transient UI
//! state is reset.

use futures::future::{BoxFuture, FutureExt};

use super::dom::{ids, DomElement, DomEvent, MockDom};
use super::keypad::{Keypad, EQUALS_ID};
use super::{CalculatorWidget, WidgetEvent};
use crate::chat::{ChatServices, ChatSession, MediaKind, Message, MessageId, MessageKind};
use crate::config::WidgetConfig;
use crate::error::{ChatError, ChatResult};
use crate::gesture::GestureSignal;

/// An attachment upload the driver is waiting on
struct PendingUpload(BoxFuture<'static, ChatResult<MessageId>>);

impl std::fmt::Debug for PendingUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PendingUpload")
    }
}

/// End-to-end driver over widget, DOM and chat session
#[derive(Debug)]
pub struct WidgetDriver {
    widget: CalculatorWidget,
    dom: MockDom,
    keypad: Keypad,
    chat: ChatSession,
    draft: String,
    uploads: Vec<PendingUpload>,
    last_error: Option<ChatError>,
}

impl WidgetDriver {
    /// Creates a driver with default configuration
    #[must_use]
    pub fn new(services: ChatServices) -> Self {
        Self::with_config(services, &WidgetConfig::default())
    }

    /// Creates a driver from a configuration
    #[must_use]
    pub fn with_config(services: ChatServices, config: &WidgetConfig) -> Self {
        let widget = CalculatorWidget::with_config(services.clock.clone(), config);
        let chat = ChatSession::new(services, config.chat.clone());
        let mut driver = Self {
            widget,
            dom: MockDom::widget(),
            keypad: Keypad::new(),
            chat,
            draft: String::new(),
            uploads: Vec::new(),
            last_error: None,
        };
        driver.sync_dom();
        driver
    }

    /// The widget state
    #[must_use]
    pub fn widget(&self) -> &CalculatorWidget {
        &self.widget
    }

    /// The rendered DOM
    #[must_use]
    pub fn dom(&self) -> &MockDom {
        &self.dom
    }

    /// The chat session
    #[must_use]
    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    /// Most recent collaborator failure, if any
    #[must_use]
    pub fn last_error(&self) -> Option<&ChatError> {
        self.last_error.as_ref()
    }

    /// Dispatches one DOM event and re-renders
    pub async fn dispatch(&mut self, event: DomEvent) {
        self.dom.dispatch_event(event.clone());

        match event {
            DomEvent::PointerDown { element_id } | DomEvent::TouchStart { element_id }
                if element_id == EQUALS_ID =>
            {
                self.widget.handle(WidgetEvent::EqualsDown);
            }
            DomEvent::PointerUp { element_id } | DomEvent::TouchEnd { element_id }
                if element_id == EQUALS_ID =>
            {
                if self.widget.handle(WidgetEvent::EqualsUp) == Some(GestureSignal::RevealPanel) {
                    self.on_reveal().await;
                }
            }
            DomEvent::PointerLeave { element_id } if element_id == EQUALS_ID => {
                self.widget.handle(WidgetEvent::EqualsLeave);
            }
            DomEvent::PointerCancel { element_id } if element_id == EQUALS_ID => {
                self.widget.handle(WidgetEvent::EqualsCancel);
            }
            DomEvent::Click { element_id } => self.on_click(&element_id).await,
            DomEvent::Input { element_id, value } if element_id == ids::CHAT_INPUT => {
                self.draft = value;
            }
            DomEvent::KeyPress { element_id, key } => {
                self.on_key(element_id.as_deref(), &key).await;
            }
            _ => {}
        }

        self.chat.refresh();
        self.sync_dom();
    }

    /// Clicks an element
    pub async fn click(&mut self, element_id: &str) {
        self.dispatch(DomEvent::click(element_id)).await;
    }

    /// Presses a key with nothing focused
    pub async fn press_key(&mut self, key: &str) {
        self.dispatch(DomEvent::key_press(key)).await;
    }

    /// Types into the message input
    pub async fn type_message(&mut self, text: &str) {
        self.dispatch(DomEvent::input(ids::CHAT_INPUT, text)).await;
    }

    /// Uploads an attachment picked by the user and waits for it
    pub async fn attach_media(&mut self, kind: MediaKind, bytes: Vec<u8>, mime_type: &str) {
        self.start_attach(kind, bytes, mime_type);
        for PendingUpload(upload) in std::mem::take(&mut self.uploads) {
            let result = upload.await;
            self.record(result);
        }
        self.chat.refresh();
        self.sync_dom();
    }

    /// Starts uploading an attachment without waiting for it.
    ///
    /// The upload progresses on [`Self::tick`], which also renders the
    /// simulated percentage while it is in flight.
    pub fn start_attach(&mut self, kind: MediaKind, bytes: Vec<u8>, mime_type: &str) {
        match self.chat.media_upload(kind, bytes, mime_type) {
            Ok(upload) => self.uploads.push(PendingUpload(upload)),
            Err(e) => self.fail(e),
        }
        self.tick();
    }

    /// Uploads started with [`Self::start_attach`] that have not finished
    #[must_use]
    pub fn pending_uploads(&self) -> usize {
        self.uploads.len()
    }

    /// Render hook: advances pending uploads, picks up new messages and
    /// re-renders
    pub fn tick(&mut self) {
        let mut finished = Vec::new();
        self.uploads
            .retain_mut(|PendingUpload(upload)| match upload.as_mut().now_or_never() {
                Some(result) => {
                    finished.push(result);
                    false
                }
                None => true,
            });
        for result in finished {
            self.record(result);
        }
        self.chat.refresh();
        self.sync_dom();
    }

    /// Waits for the next message snapshot and re-renders. Returns false
    /// when there will be none.
    pub async fn wait_for_messages(&mut self) -> bool {
        let updated = self.chat.next_update().await.is_some();
        self.sync_dom();
        updated
    }

    async fn on_click(&mut self, element_id: &str) {
        if element_id == EQUALS_ID {
            // Equals is driven by its pointer events
            return;
        }
        if let Some(action) = self.keypad.handle_click(element_id) {
            self.widget.handle(WidgetEvent::Action(action));
            return;
        }
        if !self.widget.is_panel_visible() {
            return;
        }
        match element_id {
            ids::CHAT_BACK => self.widget.hide_panel(),
            ids::CHAT_SEND => self.send_draft().await,
            ids::CHAT_CLEAR => {
                let result = self.chat.clear_history().await;
                self.record(result);
            }
            ids::CHAT_RECORD => self.toggle_recording().await,
            _ => {}
        }
    }

    async fn on_key(&mut self, element_id: Option<&str>, key: &str) {
        if element_id == Some(ids::CHAT_INPUT) {
            if key == "Enter" && self.widget.is_panel_visible() {
                self.send_draft().await;
            }
            return;
        }
        if let Some(action) = Keypad::key_to_action(key) {
            self.widget.handle(WidgetEvent::Action(action));
        }
    }

    async fn on_reveal(&mut self) {
        if self.chat.is_connected() {
            return;
        }
        let result = self.chat.connect().await;
        self.record(result);
    }

    async fn send_draft(&mut self) {
        match self.chat.send_text(&self.draft).await {
            Ok(Some(_)) => self.draft.clear(),
            Ok(None) => {}
            Err(e) => self.fail(e),
        }
    }

    async fn toggle_recording(&mut self) {
        let result = if self.chat.is_recording() {
            self.chat.stop_recording_and_send().await.map(drop)
        } else {
            self.chat.start_recording(MediaKind::Audio).await
        };
        self.record(result);
    }

    fn record<T>(&mut self, result: Result<T, ChatError>) {
        match result {
            Ok(_) => self.last_error = None,
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, error: ChatError) {
        tracing::warn!(error = %error, "chat action failed");
        self.last_error = Some(error);
    }

    fn sync_dom(&mut self) {
        self.dom.set_element_text(ids::DISPLAY, self.widget.display());
        self.dom.set_visible(ids::CHAT_PANEL, self.widget.is_panel_visible());
        self.dom.set_value(ids::CHAT_INPUT, &self.draft);

        let record_label = if self.chat.is_recording() {
            "Stop"
        } else {
            "Record"
        };
        self.dom.set_element_text(ids::CHAT_RECORD, record_label);

        match self.chat.upload_progress() {
            Some(percent) => {
                self.dom.set_visible(ids::CHAT_UPLOAD_PROGRESS, true);
                let label = format!("{percent}%");
                self.dom.set_element_text(ids::CHAT_UPLOAD_PROGRESS, &label);
            }
            None => {
                self.dom.set_visible(ids::CHAT_UPLOAD_PROGRESS, false);
                self.dom.set_element_text(ids::CHAT_UPLOAD_PROGRESS, "");
            }
        }

        self.dom.clear_children(ids::CHAT_MESSAGES);
        let uid = self.chat.identity().map(|i| i.uid.clone());
        let items: Vec<DomElement> = self
            .chat
            .messages()
            .iter()
            .enumerate()
            .map(|(i, message)| message_element(i, message, uid.as_deref()))
            .collect();
        for item in items {
            self.dom.append_child(ids::CHAT_MESSAGES, item);
        }
    }
}

fn message_element(index: usize, message: &Message, own_uid: Option<&str>) -> DomElement {
    let mine = own_uid.is_some_and(|uid| message.is_from(uid));
    let kind = match message.kind {
        MessageKind::Text => "text",
        MessageKind::Image => "image",
        MessageKind::Video => "video",
        MessageKind::Audio => "audio",
    };

    let mut element = DomElement::new("li")
        .with_id(&format!("message-{index}"))
        .with_class("message")
        .with_class(if mine { "mine" } else { "theirs" })
        .with_attr("data-kind", kind)
        .with_attr("data-time", &message.time_label());
    if let Some(text) = &message.text {
        element = element.with_text(text);
    }
    if let Some(url) = &message.media_url {
        element = element.with_attr("data-src", url);
    }
    element
}
