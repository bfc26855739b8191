//! covercalc - a four-function calculator with a hidden chat panel
//!
//! The widget behaves like an ordinary pocket calculator. Holding the
//! equals button longer than the long-press threshold reveals a private
//! chat panel instead of computing.
//!
//! # Layout
//!
//! - [`core`]: the immediate-execution accumulator and result formatting
//! - [`gesture`]: short-press versus long-press dispatch on equals
//! - [`chat`]: messages, backend collaborator traits, in-memory backends and
//!   the [`chat::ChatSession`] that drives the panel
//! - [`widget`]: the widget state, keypad, mock DOM and end-to-end driver
//! - [`config`], [`error`], [`clock`]: ambient plumbing
//!
//! # Example
//!
//! ```rust
//! use covercalc::prelude::*;
//!
//! let mut acc = Accumulator::new();
//! acc.input_digit(2);
//! acc.input_operator(Operator::Add);
//! acc.input_digit(3);
//! acc.input_operator(Operator::Multiply);
//! acc.input_digit(4);
//! acc.input_equals();
//! assert_eq!(acc.display(), "20");
//!
//! let clock = ManualClock::shared(0);
//! let mut equals = GestureDispatcher::new(clock.clone());
//! equals.pointer_down();
//! clock.advance_ms(600);
//! assert_eq!(equals.pointer_up(), Some(GestureSignal::RevealPanel));
//! ```

#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::float_cmp
    )
)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]

pub mod chat;
pub mod clock;
pub mod config;
pub mod core;
pub mod error;
pub mod gesture;
pub mod widget;

#[cfg(not(target_arch = "wasm32"))]
pub mod logging;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{ChatError, ChatResult, ConfigError, ConfigResult};

/// Commonly used types
pub mod prelude {
    pub use crate::chat::{
        ChatServices, ChatSession, MediaKind, MemoryBackend, Message, MessageDraft, MessageKind,
    };
    pub use crate::clock::{Clock, ManualClock, SharedClock, SystemClock};
    pub use crate::config::WidgetConfig;
    pub use crate::core::{Accumulator, CalculatorState, Operator};
    pub use crate::error::{ChatError, ChatResult};
    pub use crate::gesture::{GestureDispatcher, GestureSignal};
    pub use crate::widget::{CalculatorWidget, WidgetDriver, WidgetEvent};
}
