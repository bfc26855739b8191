//! Calculator core: operators, accumulator and display formatting
//!
//! Every input is accepted. There is no error type here because no input
//! sequence can put the accumulator into an invalid state.

mod accumulator;
pub mod format;
mod operator;

pub use accumulator::{Accumulator, CalculatorState};
pub use format::{format_result, parse_display};
pub use operator::Operator;
