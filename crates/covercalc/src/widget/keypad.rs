//! Calculator keypad
//!
//! Button layout, element ids and the keyboard mapping shared by the mock
//! DOM and the browser bindings.

use super::dom::DomElement;
use crate::core::Operator;

/// What a keypad button (or key) does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypadAction {
    /// Insert a digit (0-9)
    Digit(u8),
    /// Insert a decimal point
    Decimal,
    /// Choose an operator
    Operator(Operator),
    /// Compute (or, held, reveal the panel)
    Equals,
    /// Reset the accumulator
    Clear,
}

impl KeypadAction {
    /// Button label
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Digit(d) => d.to_string(),
            Self::Decimal => ".".to_string(),
            Self::Operator(op) => op.symbol().to_string(),
            Self::Equals => "=".to_string(),
            Self::Clear => "C".to_string(),
        }
    }

    /// Element id of the button performing this action
    #[must_use]
    pub fn element_id(&self) -> String {
        match self {
            Self::Digit(d) => format!("btn-{d}"),
            Self::Decimal => "btn-decimal".to_string(),
            Self::Operator(op) => format!("btn-{}", op.name()),
            Self::Equals => EQUALS_ID.to_string(),
            Self::Clear => "btn-clear".to_string(),
        }
    }
}

/// Element id of the equals button, the only one with press-duration logic
pub const EQUALS_ID: &str = "btn-equals";

/// A single keypad button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeypadButtonDef {
    /// The action this button performs
    pub action: KeypadAction,
    /// DOM element id
    pub id: String,
    /// Grid row (0-indexed)
    pub row: usize,
    /// Grid column (0-indexed)
    pub col: usize,
    /// Columns spanned
    pub span: usize,
}

impl KeypadButtonDef {
    /// Creates a one-column button
    #[must_use]
    pub fn new(action: KeypadAction, row: usize, col: usize) -> Self {
        Self {
            action,
            id: action.element_id(),
            row,
            col,
            span: 1,
        }
    }

    /// Sets how many columns the button spans
    #[must_use]
    pub const fn with_span(mut self, span: usize) -> Self {
        self.span = span;
        self
    }
}

/// Keypad layout:
/// ```text
/// [ 7 ] [ 8 ] [ 9 ] [ ÷ ]
/// [ 4 ] [ 5 ] [ 6 ] [ × ]
/// [ 1 ] [ 2 ] [ 3 ] [ - ]
/// [ 0 ] [ . ] [ C ] [ + ]
/// [          =          ]
/// ```
#[derive(Debug, Clone)]
pub struct Keypad {
    buttons: Vec<KeypadButtonDef>,
    rows: usize,
    cols: usize,
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}

impl Keypad {
    /// Creates the standard four-function keypad
    #[must_use]
    pub fn new() -> Self {
        use self::KeypadAction::{Clear, Decimal, Digit, Equals};

        let op = KeypadAction::Operator;
        let buttons = vec![
            KeypadButtonDef::new(Digit(7), 0, 0),
            KeypadButtonDef::new(Digit(8), 0, 1),
            KeypadButtonDef::new(Digit(9), 0, 2),
            KeypadButtonDef::new(op(Operator::Divide), 0, 3),
            KeypadButtonDef::new(Digit(4), 1, 0),
            KeypadButtonDef::new(Digit(5), 1, 1),
            KeypadButtonDef::new(Digit(6), 1, 2),
            KeypadButtonDef::new(op(Operator::Multiply), 1, 3),
            KeypadButtonDef::new(Digit(1), 2, 0),
            KeypadButtonDef::new(Digit(2), 2, 1),
            KeypadButtonDef::new(Digit(3), 2, 2),
            KeypadButtonDef::new(op(Operator::Subtract), 2, 3),
            KeypadButtonDef::new(Digit(0), 3, 0),
            KeypadButtonDef::new(Decimal, 3, 1),
            KeypadButtonDef::new(Clear, 3, 2),
            KeypadButtonDef::new(op(Operator::Add), 3, 3),
            KeypadButtonDef::new(Equals, 4, 0).with_span(4),
        ];

        Self {
            buttons,
            rows: 5,
            cols: 4,
        }
    }

    /// Number of buttons
    #[must_use]
    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    /// Grid dimensions (rows, cols)
    #[must_use]
    pub const fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// All buttons in layout order
    #[must_use]
    pub fn buttons(&self) -> &[KeypadButtonDef] {
        &self.buttons
    }

    /// Button covering a grid cell (wide buttons cover several)
    #[must_use]
    pub fn button_at(&self, row: usize, col: usize) -> Option<&KeypadButtonDef> {
        self.buttons
            .iter()
            .find(|b| b.row == row && (b.col..b.col + b.span).contains(&col))
    }

    /// Finds a button by element id
    #[must_use]
    pub fn find_button_by_id(&self, id: &str) -> Option<&KeypadButtonDef> {
        self.buttons.iter().find(|b| b.id == id)
    }

    /// Action for a clicked element, if it is a keypad button
    #[must_use]
    pub fn handle_click(&self, element_id: &str) -> Option<KeypadAction> {
        self.find_button_by_id(element_id).map(|b| b.action)
    }

    /// Maps a keyboard key to an action
    #[must_use]
    pub fn key_to_action(key: &str) -> Option<KeypadAction> {
        let mut chars = key.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            if let Some(d) = ch.to_digit(10) {
                return Some(KeypadAction::Digit(d as u8));
            }
            if let Some(op) = Operator::from_char(ch) {
                return Some(KeypadAction::Operator(op));
            }
        }
        match key {
            "." | "," => Some(KeypadAction::Decimal),
            "Enter" | "=" => Some(KeypadAction::Equals),
            "Escape" | "c" | "C" => Some(KeypadAction::Clear),
            _ => None,
        }
    }

    /// Container element holding every button
    #[must_use]
    pub fn create_keypad_element(&self) -> DomElement {
        self.buttons
            .iter()
            .fold(
                DomElement::new("div").with_id("calc-keypad").with_class("keypad"),
                |keypad, btn| keypad.with_child(Self::button_element(btn)),
            )
    }

    /// Element for one button
    #[must_use]
    pub fn button_element(btn: &KeypadButtonDef) -> DomElement {
        let mut element = DomElement::new("button")
            .with_id(&btn.id)
            .with_text(&btn.action.label())
            .with_class("keypad-btn")
            .with_class(&format!("keypad-row-{}", btn.row))
            .with_class(&format!("keypad-col-{}", btn.col));
        if btn.span > 1 {
            element = element.with_attr("data-span", &btn.span.to_string());
        }
        if let KeypadAction::Operator(op) = btn.action {
            element = element.with_attr("aria-label", op.name());
        }
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== KeypadAction tests =====

    #[test]
    fn test_labels() {
        assert_eq!(KeypadAction::Digit(7).label(), "7");
        assert_eq!(KeypadAction::Decimal.label(), ".");
        assert_eq!(KeypadAction::Operator(Operator::Multiply).label(), "×");
        assert_eq!(KeypadAction::Operator(Operator::Divide).label(), "÷");
        assert_eq!(KeypadAction::Equals.label(), "=");
        assert_eq!(KeypadAction::Clear.label(), "C");
    }

    #[test]
    fn test_element_ids() {
        assert_eq!(KeypadAction::Digit(5).element_id(), "btn-5");
        assert_eq!(KeypadAction::Decimal.element_id(), "btn-decimal");
        assert_eq!(
            KeypadAction::Operator(Operator::Add).element_id(),
            "btn-plus"
        );
        assert_eq!(
            KeypadAction::Operator(Operator::Subtract).element_id(),
            "btn-minus"
        );
        assert_eq!(KeypadAction::Equals.element_id(), EQUALS_ID);
        assert_eq!(KeypadAction::Clear.element_id(), "btn-clear");
    }

    // ===== Layout tests =====

    #[test]
    fn test_layout() {
        let keypad = Keypad::new();
        assert_eq!(keypad.button_count(), 17);
        assert_eq!(keypad.dimensions(), (5, 4));
        assert_eq!(
            keypad.button_at(0, 3).map(|b| b.action),
            Some(KeypadAction::Operator(Operator::Divide))
        );
        assert_eq!(
            keypad.button_at(3, 0).map(|b| b.action),
            Some(KeypadAction::Digit(0))
        );
    }

    #[test]
    fn test_equals_spans_last_row() {
        let keypad = Keypad::default();
        for col in 0..4 {
            assert_eq!(
                keypad.button_at(4, col).map(|b| b.action),
                Some(KeypadAction::Equals)
            );
        }
        assert!(keypad.button_at(4, 4).is_none());
        assert!(keypad.button_at(5, 0).is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let keypad = Keypad::new();
        let mut ids: Vec<_> = keypad.buttons().iter().map(|b| b.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), keypad.button_count());
    }

    #[test]
    fn test_handle_click() {
        let keypad = Keypad::new();
        assert_eq!(keypad.handle_click("btn-9"), Some(KeypadAction::Digit(9)));
        assert_eq!(
            keypad.handle_click("btn-times"),
            Some(KeypadAction::Operator(Operator::Multiply))
        );
        assert_eq!(keypad.handle_click("chat-send"), None);
    }

    // ===== Keyboard tests =====

    #[test]
    fn test_key_digits() {
        for d in 0..=9u8 {
            assert_eq!(
                Keypad::key_to_action(&d.to_string()),
                Some(KeypadAction::Digit(d))
            );
        }
    }

    #[test]
    fn test_key_operators() {
        assert_eq!(
            Keypad::key_to_action("+"),
            Some(KeypadAction::Operator(Operator::Add))
        );
        assert_eq!(
            Keypad::key_to_action("-"),
            Some(KeypadAction::Operator(Operator::Subtract))
        );
        assert_eq!(
            Keypad::key_to_action("*"),
            Some(KeypadAction::Operator(Operator::Multiply))
        );
        assert_eq!(
            Keypad::key_to_action("/"),
            Some(KeypadAction::Operator(Operator::Divide))
        );
        assert_eq!(Keypad::key_to_action("x"), None);
    }

    #[test]
    fn test_key_controls() {
        assert_eq!(Keypad::key_to_action("."), Some(KeypadAction::Decimal));
        assert_eq!(Keypad::key_to_action("Enter"), Some(KeypadAction::Equals));
        assert_eq!(Keypad::key_to_action("="), Some(KeypadAction::Equals));
        assert_eq!(Keypad::key_to_action("Escape"), Some(KeypadAction::Clear));
        assert_eq!(Keypad::key_to_action("c"), Some(KeypadAction::Clear));
        assert_eq!(Keypad::key_to_action("Tab"), None);
        assert_eq!(Keypad::key_to_action(""), None);
    }

    // ===== DOM tests =====

    #[test]
    fn test_keypad_element() {
        let element = Keypad::new().create_keypad_element();
        assert_eq!(element.id, "calc-keypad");
        assert_eq!(element.children.len(), 17);

        let equals = element.children.iter().find(|c| c.id == EQUALS_ID).unwrap();
        assert_eq!(equals.get_attr("data-span"), Some("4"));

        let plus = element.children.iter().find(|c| c.id == "btn-plus").unwrap();
        assert_eq!(plus.text_content, "+");
        assert_eq!(plus.get_attr("aria-label"), Some("plus"));
        assert!(plus.has_class("keypad-btn"));
    }
}
