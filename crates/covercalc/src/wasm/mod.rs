//! Browser bindings
//!
//! Compiled with the `wasm` feature. Exposes the calculator, the equals
//! gesture and panel visibility to JavaScript; the page wires its own
//! backend SDK to the chat panel.

mod browser;

pub use browser::{init, BrowserClock, BrowserWidget};
