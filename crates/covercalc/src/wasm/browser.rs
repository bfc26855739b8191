//! `wasm-bindgen` entry point

use std::sync::Arc;

use wasm_bindgen::prelude::*;
use web_sys::console;

use crate::clock::{Clock, SharedClock};
use crate::config::WidgetConfig;
use crate::gesture::GestureSignal;
use crate::widget::{CalculatorWidget, Keypad, WidgetEvent};

/// Clock reading `Date.now()`; `SystemTime` is unavailable in the browser
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

/// The calculator widget as seen from JavaScript
#[derive(Debug)]
#[wasm_bindgen]
pub struct BrowserWidget {
    widget: CalculatorWidget,
    keypad: Keypad,
}

#[wasm_bindgen]
impl BrowserWidget {
    /// Creates a widget with default settings
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_error_panic_hook::set_once();
        Self::with_clock(Arc::new(BrowserClock), &WidgetConfig::default())
    }

    /// Creates a widget from a JSON configuration
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(json: &str) -> Result<BrowserWidget, JsError> {
        console_error_panic_hook::set_once();
        let config = WidgetConfig::from_json_str(json)?;
        Ok(Self::with_clock(Arc::new(BrowserClock), &config))
    }

    /// Current display text
    #[wasm_bindgen(getter)]
    pub fn display(&self) -> String {
        self.widget.display().to_string()
    }

    /// Whether the chat panel is showing
    #[wasm_bindgen(getter, js_name = panelVisible)]
    pub fn panel_visible(&self) -> bool {
        self.widget.is_panel_visible()
    }

    /// Handles a keypad click by element id. Returns false for unknown ids
    /// and for equals, which is driven by its pointer events.
    #[wasm_bindgen(js_name = handleButton)]
    pub fn handle_button(&mut self, element_id: &str) -> bool {
        match self.keypad.handle_click(element_id) {
            Some(crate::widget::KeypadAction::Equals) | None => false,
            Some(action) => {
                self.widget.handle(WidgetEvent::Action(action));
                true
            }
        }
    }

    /// Handles a keyboard key. Returns false if the key is not mapped.
    #[wasm_bindgen(js_name = handleKey)]
    pub fn handle_key(&mut self, key: &str) -> bool {
        let Some(action) = Keypad::key_to_action(key) else {
            return false;
        };
        self.widget.handle(WidgetEvent::Action(action));
        true
    }

    /// Pointer or touch down on equals
    #[wasm_bindgen(js_name = equalsDown)]
    pub fn equals_down(&mut self) {
        self.widget.handle(WidgetEvent::EqualsDown);
    }

    /// Pointer or touch up on equals: `"compute"`, `"reveal"`, or `""` when
    /// no press was in progress
    #[wasm_bindgen(js_name = equalsUp)]
    pub fn equals_up(&mut self) -> String {
        match self.widget.handle(WidgetEvent::EqualsUp) {
            Some(GestureSignal::Compute) => "compute".to_string(),
            Some(GestureSignal::RevealPanel) => "reveal".to_string(),
            None => String::new(),
        }
    }

    /// Pointer left equals
    #[wasm_bindgen(js_name = equalsLeave)]
    pub fn equals_leave(&mut self) {
        self.widget.handle(WidgetEvent::EqualsLeave);
    }

    /// Pointer on equals cancelled
    #[wasm_bindgen(js_name = equalsCancel)]
    pub fn equals_cancel(&mut self) {
        self.widget.handle(WidgetEvent::EqualsCancel);
    }

    /// Hides the chat panel (back control)
    #[wasm_bindgen(js_name = hidePanel)]
    pub fn hide_panel(&mut self) {
        self.widget.hide_panel();
    }

    /// Accumulator state as JSON
    #[wasm_bindgen(js_name = stateJson)]
    pub fn state_json(&self) -> String {
        serde_json::to_string(self.widget.accumulator().state()).unwrap_or_default()
    }
}

impl BrowserWidget {
    /// Creates a widget on an explicit clock
    #[must_use]
    pub fn with_clock(clock: SharedClock, config: &WidgetConfig) -> Self {
        Self {
            widget: CalculatorWidget::with_config(clock, config),
            keypad: Keypad::new(),
        }
    }
}

impl Default for BrowserWidget {
    fn default() -> Self {
        Self::new()
    }
}

/// Module start hook
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    console::log_1(&"covercalc initialized".into());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn widget() -> (Arc<ManualClock>, BrowserWidget) {
        let clock = ManualClock::shared(0);
        let widget = BrowserWidget::with_clock(clock.clone(), &WidgetConfig::default());
        (clock, widget)
    }

    #[test]
    fn test_buttons_and_keys() {
        let (_, mut widget) = widget();
        assert!(widget.handle_button("btn-7"));
        assert!(widget.handle_key("*"));
        assert!(widget.handle_button("btn-6"));
        assert!(widget.handle_key("Enter"));
        assert_eq!(widget.display(), "42");
    }

    #[test]
    fn test_unknown_inputs() {
        let (_, mut widget) = widget();
        assert!(!widget.handle_button("nope"));
        assert!(!widget.handle_button("btn-equals"));
        assert!(!widget.handle_key("F5"));
    }

    #[test]
    fn test_equals_gesture() {
        let (clock, mut widget) = widget();
        widget.equals_down();
        clock.advance_ms(50);
        assert_eq!(widget.equals_up(), "compute");
        assert_eq!(widget.equals_up(), "");

        widget.equals_down();
        clock.advance_ms(501);
        assert_eq!(widget.equals_up(), "reveal");
        assert!(widget.panel_visible());
        widget.hide_panel();
        assert!(!widget.panel_visible());
    }

    #[test]
    fn test_state_json() {
        let (_, widget) = widget();
        assert!(widget.state_json().contains("\"display\":\"0\""));
    }
}
