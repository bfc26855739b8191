//! Immediate-execution accumulator
//!
//! There is no expression tree: every operator press folds the pending
//! value into the first operand right away, like a pocket calculator.

use serde::{Deserialize, Serialize};

use super::format::{format_result, parse_display, DEFAULT_SIGNIFICANT_DIGITS};
use super::operator::Operator;

/// Snapshot of the accumulator's four fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorState {
    /// Text currently shown (decimal string, at most one `.`)
    pub display: String,
    /// Left-hand operand, recorded once an operator is chosen
    pub first_operand: Option<f64>,
    /// Pending operator
    pub operator: Option<Operator>,
    /// Next digit starts a fresh second operand
    pub awaiting_second_operand: bool,
}

impl Default for CalculatorState {
    fn default() -> Self {
        Self {
            display: "0".to_string(),
            first_operand: None,
            operator: None,
            awaiting_second_operand: false,
        }
    }
}

/// The running calculator state plus the input operations that mutate it
#[derive(Debug, Clone)]
pub struct Accumulator {
    state: CalculatorState,
    significant_digits: usize,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator {
    /// Creates an accumulator showing `0`
    #[must_use]
    pub fn new() -> Self {
        Self::with_precision(DEFAULT_SIGNIFICANT_DIGITS)
    }

    /// Creates an accumulator that rounds results to `significant_digits`
    #[must_use]
    pub fn with_precision(significant_digits: usize) -> Self {
        Self {
            state: CalculatorState::default(),
            significant_digits,
        }
    }

    /// Returns the current display text
    #[must_use]
    pub fn display(&self) -> &str {
        &self.state.display
    }

    /// Returns the current display as a number
    #[must_use]
    pub fn value(&self) -> f64 {
        parse_display(&self.state.display)
    }

    /// Returns a read-only view of the state
    #[must_use]
    pub fn state(&self) -> &CalculatorState {
        &self.state
    }

    /// Appends a digit, or starts a fresh operand after an operator
    pub fn input_digit(&mut self, digit: u8) {
        let Some(ch) = char::from_digit(u32::from(digit), 10) else {
            return;
        };

        if self.state.awaiting_second_operand {
            self.state.display = ch.to_string();
            self.state.awaiting_second_operand = false;
        } else if self.state.display == "0" || !self.display_is_editable() {
            self.state.display = ch.to_string();
        } else {
            self.state.display.push(ch);
        }
    }

    /// Appends `.` unless the display already has one
    pub fn input_decimal_point(&mut self) {
        if !self.display_is_editable() {
            self.state.display = "0.".to_string();
        } else if !self.state.display.contains('.') {
            self.state.display.push('.');
        }
    }

    /// Chooses the pending operator, folding any complete pending operation
    pub fn input_operator(&mut self, op: Operator) {
        if self.state.operator.is_some() && self.state.awaiting_second_operand {
            self.state.operator = Some(op);
            return;
        }

        let input = self.value();
        match (self.state.first_operand, self.state.operator) {
            (Some(first), Some(pending)) => {
                let result = pending.apply(first, input);
                self.state.display = format_result(result, self.significant_digits);
                self.state.first_operand = Some(result);
            }
            _ => self.state.first_operand = Some(input),
        }

        self.state.operator = Some(op);
        self.state.awaiting_second_operand = true;
    }

    /// Computes the pending operation and shows the result.
    ///
    /// Returns the computed value, or `None` when nothing was pending.
    pub fn input_equals(&mut self) -> Option<f64> {
        let (Some(first), Some(op)) = (self.state.first_operand, self.state.operator) else {
            return None;
        };

        let result = op.apply(first, self.value());
        self.state.display = format_result(result, self.significant_digits);
        self.state.first_operand = None;
        self.state.operator = None;
        self.state.awaiting_second_operand = false;
        Some(result)
    }

    /// Resets every field to its initial value
    pub fn clear(&mut self) {
        self.state = CalculatorState::default();
    }

    /// Results shown as infinity, NaN or in exponent notation are replaced,
    /// not extended, by the next digit or decimal point
    fn display_is_editable(&self) -> bool {
        !self.state.display.contains('e') && self.value().is_finite()
    }
}
