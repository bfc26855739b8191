//! Press-duration gesture dispatch for the equals control
//!
//! ```text
//!            pointer down
//!   ┌──────┐ ────────────► ┌─────────┐
//!   │ Idle │               │ Pressed │
//!   └──────┘ ◄──────────── └─────────┘
//!            up / leave / cancel
//! ```
//!
//! A short press computes, a press held longer than the threshold reveals
//! the hidden panel instead. The pressed state owns a [`PressGuard`]; every
//! exit edge consumes it, so a stale press start can never leak into a
//! later, unrelated press.

use crate::clock::SharedClock;

/// Default long-press threshold in milliseconds
pub const DEFAULT_LONG_PRESS_MS: u64 = 500;

/// Outcome of a completed press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureSignal {
    /// Short press: run the normal equals action
    Compute,
    /// Long press: suppress the click and reveal the hidden panel
    RevealPanel,
}

/// Proof that a press is in progress, holding its start time
#[derive(Debug, PartialEq, Eq)]
pub struct PressGuard {
    started_at_ms: u64,
}

impl PressGuard {
    fn start(now_ms: u64) -> Self {
        Self {
            started_at_ms: now_ms,
        }
    }

    /// When the press began (ms since epoch)
    #[must_use]
    pub const fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    /// Consumes the guard and reports how long the press lasted
    #[must_use]
    pub fn release(self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_at_ms)
    }
}

/// Dispatcher state
#[derive(Debug, Default, PartialEq, Eq)]
pub enum GestureState {
    /// No press in progress
    #[default]
    Idle,
    /// Pointer is down on the control
    Pressed(PressGuard),
}

/// Two-state long-press detector
#[derive(Debug)]
pub struct GestureDispatcher {
    clock: SharedClock,
    threshold_ms: u64,
    state: GestureState,
}

impl GestureDispatcher {
    /// Creates a dispatcher with the default 500 ms threshold
    #[must_use]
    pub fn new(clock: SharedClock) -> Self {
        Self::with_threshold(clock, DEFAULT_LONG_PRESS_MS)
    }

    /// Creates a dispatcher with a custom threshold
    #[must_use]
    pub fn with_threshold(clock: SharedClock, threshold_ms: u64) -> Self {
        Self {
            clock,
            threshold_ms,
            state: GestureState::Idle,
        }
    }

    /// The long-press threshold in milliseconds
    #[must_use]
    pub const fn threshold_ms(&self) -> u64 {
        self.threshold_ms
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &GestureState {
        &self.state
    }

    /// True while a press is in progress
    #[must_use]
    pub const fn is_pressed(&self) -> bool {
        matches!(self.state, GestureState::Pressed(_))
    }

    /// Pointer (or touch) went down on the control.
    ///
    /// A second down without an intervening up restarts the press.
    pub fn pointer_down(&mut self) {
        self.state = GestureState::Pressed(PressGuard::start(self.clock.now_ms()));
    }

    /// Pointer (or touch) was released on the control.
    ///
    /// Returns `None` when no press was in progress.
    pub fn pointer_up(&mut self) -> Option<GestureSignal> {
        let GestureState::Pressed(guard) = std::mem::take(&mut self.state) else {
            return None;
        };

        let elapsed = guard.release(self.clock.now_ms());
        if elapsed > self.threshold_ms {
            tracing::debug!(elapsed_ms = elapsed, "long press on equals");
            Some(GestureSignal::RevealPanel)
        } else {
            Some(GestureSignal::Compute)
        }
    }

    /// Pointer left the control before release; the press is abandoned
    pub fn pointer_leave(&mut self) {
        self.abandon();
    }

    /// The platform cancelled the pointer (scroll, focus loss, ...)
    pub fn pointer_cancel(&mut self) {
        self.abandon();
    }

    fn abandon(&mut self) {
        if let GestureState::Pressed(guard) = std::mem::take(&mut self.state) {
            tracing::trace!(started_at_ms = guard.started_at_ms(), "press abandoned");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    fn dispatcher() -> (Arc<ManualClock>, GestureDispatcher) {
        let clock = ManualClock::shared(10_000);
        let dispatcher = GestureDispatcher::new(clock.clone());
        (clock, dispatcher)
    }

    #[test]
    fn test_starts_idle() {
        let (_, d) = dispatcher();
        assert_eq!(d.state(), &GestureState::Idle);
        assert!(!d.is_pressed());
        assert_eq!(d.threshold_ms(), DEFAULT_LONG_PRESS_MS);
    }

    #[test]
    fn test_short_press_computes() {
        let (clock, mut d) = dispatcher();
        d.pointer_down();
        clock.advance_ms(100);
        assert_eq!(d.pointer_up(), Some(GestureSignal::Compute));
        assert!(!d.is_pressed());
    }

    #[test]
    fn test_long_press_reveals() {
        let (clock, mut d) = dispatcher();
        d.pointer_down();
        clock.advance_ms(600);
        assert_eq!(d.pointer_up(), Some(GestureSignal::RevealPanel));
        assert!(!d.is_pressed());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let (clock, mut d) = dispatcher();
        d.pointer_down();
        clock.advance_ms(DEFAULT_LONG_PRESS_MS);
        assert_eq!(d.pointer_up(), Some(GestureSignal::Compute));

        d.pointer_down();
        clock.advance_ms(DEFAULT_LONG_PRESS_MS + 1);
        assert_eq!(d.pointer_up(), Some(GestureSignal::RevealPanel));
    }

    #[test]
    fn test_up_without_down_signals_nothing() {
        let (_, mut d) = dispatcher();
        assert_eq!(d.pointer_up(), None);
    }

    #[test]
    fn test_leave_returns_to_idle() {
        let (clock, mut d) = dispatcher();
        d.pointer_down();
        d.pointer_leave();
        assert!(!d.is_pressed());

        // A later up must not measure from the abandoned press
        clock.advance_ms(5_000);
        assert_eq!(d.pointer_up(), None);
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let (clock, mut d) = dispatcher();
        d.pointer_down();
        clock.advance_ms(800);
        d.pointer_cancel();
        assert_eq!(d.state(), &GestureState::Idle);
        assert_eq!(d.pointer_up(), None);
    }

    #[test]
    fn test_stale_press_not_reused() {
        let (clock, mut d) = dispatcher();
        d.pointer_down();
        d.pointer_leave();
        clock.advance_ms(10_000);

        d.pointer_down();
        clock.advance_ms(50);
        assert_eq!(d.pointer_up(), Some(GestureSignal::Compute));
    }

    #[test]
    fn test_second_down_restarts_press() {
        let (clock, mut d) = dispatcher();
        d.pointer_down();
        clock.advance_ms(400);
        d.pointer_down();
        clock.advance_ms(400);
        assert_eq!(d.pointer_up(), Some(GestureSignal::Compute));
    }

    #[test]
    fn test_custom_threshold() {
        let clock = ManualClock::shared(0);
        let mut d = GestureDispatcher::with_threshold(clock.clone(), 1_000);
        d.pointer_down();
        clock.advance_ms(800);
        assert_eq!(d.pointer_up(), Some(GestureSignal::Compute));
    }

    #[test]
    fn test_press_guard_release_saturates() {
        let guard = PressGuard::start(500);
        assert_eq!(guard.started_at_ms(), 500);
        assert_eq!(guard.release(100), 0);
    }
}
