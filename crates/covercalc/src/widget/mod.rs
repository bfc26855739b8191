//! The calculator widget
//!
//! Combines the accumulator, the equals-button gesture dispatcher and the
//! visibility of the hidden chat panel. Rendering and backend access live
//! in [`driver`]; this type is pure synchronous state.

pub mod dom;
pub mod driver;
pub mod keypad;

pub use dom::{DomElement, DomEvent, MockDom};
pub use driver::WidgetDriver;
pub use keypad::{Keypad, KeypadAction, KeypadButtonDef, EQUALS_ID};

use crate::clock::SharedClock;
use crate::config::WidgetConfig;
use crate::core::Accumulator;
use crate::gesture::{GestureDispatcher, GestureSignal};

/// Input the widget understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    /// A keypad button click or a mapped key
    Action(KeypadAction),
    /// Pointer or touch down on equals
    EqualsDown,
    /// Pointer or touch released on equals
    EqualsUp,
    /// Pointer left equals while pressed
    EqualsLeave,
    /// Pointer on equals was cancelled
    EqualsCancel,
}

/// Calculator state, equals gesture and panel visibility
#[derive(Debug)]
pub struct CalculatorWidget {
    accumulator: Accumulator,
    dispatcher: GestureDispatcher,
    panel_visible: bool,
}

impl CalculatorWidget {
    /// Creates a widget with default settings
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self::with_config(clock, &WidgetConfig::default())
    }

    /// Creates a widget using the threshold and precision from `config`
    #[must_use]
    pub fn with_config(clock: SharedClock, config: &WidgetConfig) -> Self {
        Self {
            accumulator: Accumulator::with_precision(config.significant_digits),
            dispatcher: GestureDispatcher::with_threshold(clock, config.long_press_threshold_ms),
            panel_visible: false,
        }
    }

    /// Current display text
    #[must_use]
    pub fn display(&self) -> &str {
        self.accumulator.display()
    }

    /// The accumulator
    #[must_use]
    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// The equals gesture dispatcher
    #[must_use]
    pub fn dispatcher(&self) -> &GestureDispatcher {
        &self.dispatcher
    }

    /// True once a long press revealed the panel (until hidden again)
    #[must_use]
    pub fn is_panel_visible(&self) -> bool {
        self.panel_visible
    }

    /// Shows the chat panel
    pub fn show_panel(&mut self) {
        self.panel_visible = true;
    }

    /// Hides the chat panel
    pub fn hide_panel(&mut self) {
        self.panel_visible = false;
    }

    /// Applies one input.
    ///
    /// Returns the gesture outcome for a completed equals press. A long press
    /// reveals the panel and leaves the accumulator untouched.
    pub fn handle(&mut self, event: WidgetEvent) -> Option<GestureSignal> {
        match event {
            WidgetEvent::Action(action) => {
                self.apply(action);
                None
            }
            WidgetEvent::EqualsDown => {
                self.dispatcher.pointer_down();
                None
            }
            WidgetEvent::EqualsUp => {
                let signal = self.dispatcher.pointer_up()?;
                match signal {
                    GestureSignal::Compute => {
                        self.accumulator.input_equals();
                    }
                    GestureSignal::RevealPanel => {
                        tracing::info!("hidden panel revealed");
                        self.show_panel();
                    }
                }
                Some(signal)
            }
            WidgetEvent::EqualsLeave => {
                self.dispatcher.pointer_leave();
                None
            }
            WidgetEvent::EqualsCancel => {
                self.dispatcher.pointer_cancel();
                None
            }
        }
    }

    fn apply(&mut self, action: KeypadAction) {
        match action {
            KeypadAction::Digit(d) => self.accumulator.input_digit(d),
            KeypadAction::Decimal => self.accumulator.input_decimal_point(),
            KeypadAction::Operator(op) => self.accumulator.input_operator(op),
            KeypadAction::Equals => {
                self.accumulator.input_equals();
            }
            KeypadAction::Clear => self.accumulator.clear(),
        }
    }
}
