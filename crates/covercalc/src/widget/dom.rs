//! Observable element tree
//!
//! A minimal DOM stand-in the widget driver renders into, so the whole
//! widget (calculator, gesture and chat panel) can be exercised without a
//! browser.

use std::collections::{HashMap, VecDeque};

use super::keypad::Keypad;

/// Element ids used by the widget
pub mod ids {
    /// Calculator display
    pub const DISPLAY: &str = "calc-display";
    /// Keypad container
    pub const KEYPAD: &str = "calc-keypad";
    /// Hidden chat panel
    pub const CHAT_PANEL: &str = "chat-panel";
    /// Back control hiding the panel
    pub const CHAT_BACK: &str = "chat-back";
    /// Message list
    pub const CHAT_MESSAGES: &str = "chat-messages";
    /// Message text input
    pub const CHAT_INPUT: &str = "chat-input";
    /// Send button
    pub const CHAT_SEND: &str = "chat-send";
    /// Clear-history button
    pub const CHAT_CLEAR: &str = "chat-clear";
    /// Audio record toggle
    pub const CHAT_RECORD: &str = "chat-record";
    /// Upload progress indicator
    pub const CHAT_UPLOAD_PROGRESS: &str = "chat-upload-progress";
}

/// A DOM element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomElement {
    /// Element id
    pub id: String,
    /// Tag name
    pub tag: String,
    /// Text content
    pub text_content: String,
    /// Attributes
    pub attributes: HashMap<String, String>,
    /// CSS classes
    pub classes: Vec<String>,
    /// Visibility
    pub visible: bool,
    /// Children
    pub children: Vec<DomElement>,
}

impl Default for DomElement {
    fn default() -> Self {
        Self::new("div")
    }
}

impl DomElement {
    /// Creates an element with the given tag
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            id: String::new(),
            tag: tag.to_string(),
            text_content: String::new(),
            attributes: HashMap::new(),
            classes: Vec::new(),
            visible: true,
            children: Vec::new(),
        }
    }

    /// Sets the id
    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Sets the text content
    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.text_content = text.to_string();
        self
    }

    /// Adds a class
    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    /// Sets an attribute
    #[must_use]
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Adds a child
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Starts hidden
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Sets the text content
    pub fn set_text(&mut self, text: &str) {
        text.clone_into(&mut self.text_content);
    }

    /// Adds a class if missing
    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    /// Removes a class
    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    /// True if the element has `class`
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Attribute value
    #[must_use]
    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Events the widget reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEvent {
    /// Click on an element
    Click {
        /// Target id
        element_id: String,
    },
    /// Pointer pressed on an element
    PointerDown {
        /// Target id
        element_id: String,
    },
    /// Pointer released on an element
    PointerUp {
        /// Target id
        element_id: String,
    },
    /// Pointer left an element while pressed
    PointerLeave {
        /// Target id
        element_id: String,
    },
    /// Platform cancelled the pointer
    PointerCancel {
        /// Target id
        element_id: String,
    },
    /// Touch began on an element
    TouchStart {
        /// Target id
        element_id: String,
    },
    /// Touch ended on an element
    TouchEnd {
        /// Target id
        element_id: String,
    },
    /// Text input changed
    Input {
        /// Input id
        element_id: String,
        /// New value
        value: String,
    },
    /// Key pressed
    KeyPress {
        /// Focused element, if any
        element_id: Option<String>,
        /// Key name (`"5"`, `"Enter"`, `"Escape"`, ...)
        key: String,
    },
}

impl DomEvent {
    /// Click event
    #[must_use]
    pub fn click(element_id: &str) -> Self {
        Self::Click {
            element_id: element_id.to_string(),
        }
    }

    /// Pointer-down event
    #[must_use]
    pub fn pointer_down(element_id: &str) -> Self {
        Self::PointerDown {
            element_id: element_id.to_string(),
        }
    }

    /// Pointer-up event
    #[must_use]
    pub fn pointer_up(element_id: &str) -> Self {
        Self::PointerUp {
            element_id: element_id.to_string(),
        }
    }

    /// Pointer-leave event
    #[must_use]
    pub fn pointer_leave(element_id: &str) -> Self {
        Self::PointerLeave {
            element_id: element_id.to_string(),
        }
    }

    /// Pointer-cancel event
    #[must_use]
    pub fn pointer_cancel(element_id: &str) -> Self {
        Self::PointerCancel {
            element_id: element_id.to_string(),
        }
    }

    /// Touch-start event
    #[must_use]
    pub fn touch_start(element_id: &str) -> Self {
        Self::TouchStart {
            element_id: element_id.to_string(),
        }
    }

    /// Touch-end event
    #[must_use]
    pub fn touch_end(element_id: &str) -> Self {
        Self::TouchEnd {
            element_id: element_id.to_string(),
        }
    }

    /// Input event
    #[must_use]
    pub fn input(element_id: &str, value: &str) -> Self {
        Self::Input {
            element_id: element_id.to_string(),
            value: value.to_string(),
        }
    }

    /// Key press with nothing focused
    #[must_use]
    pub fn key_press(key: &str) -> Self {
        Self::KeyPress {
            element_id: None,
            key: key.to_string(),
        }
    }

    /// Key press inside an element
    #[must_use]
    pub fn key_press_in(element_id: &str, key: &str) -> Self {
        Self::KeyPress {
            element_id: Some(element_id.to_string()),
            key: key.to_string(),
        }
    }

    /// Target element id
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Click { element_id }
            | Self::PointerDown { element_id }
            | Self::PointerUp { element_id }
            | Self::PointerLeave { element_id }
            | Self::PointerCancel { element_id }
            | Self::TouchStart { element_id }
            | Self::TouchEnd { element_id }
            | Self::Input { element_id, .. } => Some(element_id),
            Self::KeyPress { element_id, .. } => element_id.as_deref(),
        }
    }
}

/// Number of recent events [`MockDom`] keeps by default
pub const DEFAULT_EVENT_HISTORY: usize = 64;

/// In-memory DOM with id lookup and a bounded log of recent events
#[derive(Debug)]
pub struct MockDom {
    /// Root element
    pub root: DomElement,
    elements: HashMap<String, DomElement>,
    event_history: VecDeque<DomEvent>,
    history_limit: usize,
}

impl Default for MockDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDom {
    /// Creates an empty DOM
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: DomElement::new("div").with_id("root"),
            elements: HashMap::new(),
            event_history: VecDeque::new(),
            history_limit: DEFAULT_EVENT_HISTORY,
        }
    }

    /// Keeps at most `limit` recent events; 0 disables the log
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self.event_history.truncate(limit);
        self
    }

    /// Builds the widget: display, keypad and the hidden chat panel
    #[must_use]
    pub fn widget() -> Self {
        let mut dom = Self::new();

        let display = DomElement::new("div")
            .with_id(ids::DISPLAY)
            .with_class("display")
            .with_text("0")
            .with_attr("aria-live", "polite");
        let keypad = Keypad::new();
        let keypad_element = keypad.create_keypad_element();

        let back = DomElement::new("button")
            .with_id(ids::CHAT_BACK)
            .with_text("←");
        let messages = DomElement::new("ul")
            .with_id(ids::CHAT_MESSAGES)
            .with_class("message-list");
        let input = DomElement::new("input")
            .with_id(ids::CHAT_INPUT)
            .with_attr("type", "text")
            .with_attr("value", "");
        let send = DomElement::new("button")
            .with_id(ids::CHAT_SEND)
            .with_text("Send");
        let clear = DomElement::new("button")
            .with_id(ids::CHAT_CLEAR)
            .with_text("Clear");
        let record = DomElement::new("button")
            .with_id(ids::CHAT_RECORD)
            .with_text("Record");
        let progress = DomElement::new("div")
            .with_id(ids::CHAT_UPLOAD_PROGRESS)
            .with_class("upload-progress")
            .hidden();

        let panel_children = [back, messages, input, send, clear, record, progress];
        let panel = panel_children
            .iter()
            .cloned()
            .fold(
                DomElement::new("section")
                    .with_id(ids::CHAT_PANEL)
                    .with_class("chat-panel")
                    .hidden(),
                DomElement::with_child,
            );

        dom.root = DomElement::new("div")
            .with_id("covercalc")
            .with_class("calculator")
            .with_child(display.clone())
            .with_child(keypad_element.clone())
            .with_child(panel.clone());

        dom.register_element(display);
        dom.register_element(keypad_element);
        for btn in keypad.buttons() {
            dom.register_element(Keypad::button_element(btn));
        }
        dom.register_element(panel);
        for child in panel_children {
            dom.register_element(child);
        }
        dom
    }

    /// Registers an element for id lookup
    pub fn register_element(&mut self, element: DomElement) {
        if !element.id.is_empty() {
            self.elements.insert(element.id.clone(), element);
        }
    }

    /// Element by id
    #[must_use]
    pub fn get_element(&self, id: &str) -> Option<&DomElement> {
        self.elements.get(id)
    }

    /// Mutable element by id
    pub fn get_element_mut(&mut self, id: &str) -> Option<&mut DomElement> {
        self.elements.get_mut(id)
    }

    /// Records an event and applies its effect on the tree (input values)
    pub fn dispatch_event(&mut self, event: DomEvent) {
        if let DomEvent::Input { element_id, value } = &event {
            if let Some(element) = self.elements.get_mut(element_id) {
                element.attributes.insert("value".to_string(), value.clone());
            }
        }
        if self.history_limit == 0 {
            return;
        }
        while self.event_history.len() >= self.history_limit {
            self.event_history.pop_front();
        }
        self.event_history.push_back(event);
    }

    /// Most recent events, oldest first
    #[must_use]
    pub fn event_history(&self) -> &VecDeque<DomEvent> {
        &self.event_history
    }

    /// Clears the event log
    pub fn clear_event_history(&mut self) {
        self.event_history.clear();
    }

    /// Sets element text
    pub fn set_element_text(&mut self, id: &str, text: &str) {
        if let Some(element) = self.elements.get_mut(id) {
            element.set_text(text);
        }
    }

    /// Element text
    #[must_use]
    pub fn get_element_text(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|e| e.text_content.as_str())
    }

    /// Sets an input's value
    pub fn set_value(&mut self, id: &str, value: &str) {
        if let Some(element) = self.elements.get_mut(id) {
            element.attributes.insert("value".to_string(), value.to_string());
        }
    }

    /// An input's value
    #[must_use]
    pub fn get_value(&self, id: &str) -> Option<&str> {
        self.elements.get(id).and_then(|e| e.get_attr("value"))
    }

    /// Shows or hides an element
    pub fn set_visible(&mut self, id: &str, visible: bool) {
        if let Some(element) = self.elements.get_mut(id) {
            element.visible = visible;
        }
    }

    /// Element visibility (false for unknown ids)
    #[must_use]
    pub fn is_visible(&self, id: &str) -> bool {
        self.elements.get(id).is_some_and(|e| e.visible)
    }

    /// Appends a child to a parent
    pub fn append_child(&mut self, parent_id: &str, child: DomElement) {
        if let Some(parent) = self.elements.get_mut(parent_id) {
            parent.children.push(child.clone());
        }
        self.register_element(child);
    }

    /// Removes every child of an element
    pub fn clear_children(&mut self, id: &str) {
        let Some(parent) = self.elements.get_mut(id) else {
            return;
        };
        let children = std::mem::take(&mut parent.children);
        for child in children.iter().filter(|c| !c.id.is_empty()) {
            self.elements.remove(&child.id);
        }
    }

    /// Children of an element
    #[must_use]
    pub fn children(&self, id: &str) -> &[DomElement] {
        self.elements
            .get(id)
            .map(|e| e.children.as_slice())
            .unwrap_or_default()
    }
}
