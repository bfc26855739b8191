//! Simulated upload progress
//!
//! The blob store reports nothing until an upload completes, so the panel
//! shows progress from a fixed time schedule instead. The percentage is an
//! estimate driven by elapsed time, not by bytes transferred.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::clock::SharedClock;
use crate::error::{ConfigError, ConfigResult};

/// One step of the schedule: after `after_ms` show `percent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStep {
    /// Milliseconds since the upload started
    pub after_ms: u64,
    /// Percentage to show from then on
    pub percent: u8,
}

impl ProgressStep {
    /// Creates a step
    #[must_use]
    pub const fn new(after_ms: u64, percent: u8) -> Self {
        Self { after_ms, percent }
    }
}

/// Ordered list of progress steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadSchedule {
    steps: Vec<ProgressStep>,
}

impl Default for UploadSchedule {
    fn default() -> Self {
        Self::new(vec![
            ProgressStep::new(0, 0),
            ProgressStep::new(300, 25),
            ProgressStep::new(800, 50),
            ProgressStep::new(1_500, 75),
            ProgressStep::new(2_500, 90),
        ])
    }
}

impl UploadSchedule {
    /// Creates a schedule from explicit steps
    #[must_use]
    pub fn new(steps: Vec<ProgressStep>) -> Self {
        Self { steps }
    }

    /// The steps in order
    #[must_use]
    pub fn steps(&self) -> &[ProgressStep] {
        &self.steps
    }

    /// Percentage to show `elapsed_ms` after the upload started.
    ///
    /// Never reaches 100: completion is reported by the store, not the clock.
    #[must_use]
    pub fn percent_at(&self, elapsed_ms: u64) -> u8 {
        self.steps
            .iter()
            .take_while(|step| step.after_ms <= elapsed_ms)
            .last()
            .map_or(0, |step| step.percent.min(99))
    }

    /// Steps must be non-empty, non-decreasing in both time and
    /// percentage, and stay below 100
    pub fn validate(&self) -> ConfigResult<()> {
        if self.steps.is_empty() {
            return Err(ConfigError::invalid("upload schedule must have at least one step"));
        }
        for pair in self.steps.windows(2) {
            if pair[1].after_ms < pair[0].after_ms {
                return Err(ConfigError::invalid("upload schedule times must not decrease"));
            }
            if pair[1].percent < pair[0].percent {
                return Err(ConfigError::invalid(
                    "upload schedule percentages must not decrease",
                ));
            }
        }
        if self.steps.iter().any(|step| step.percent >= 100) {
            return Err(ConfigError::invalid(
                "upload schedule percentages must stay below 100",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ActiveUploads {
    next_id: u64,
    // (upload id, start time in ms)
    started: Vec<(u64, u64)>,
}

/// Shared view of the uploads in flight, polled by whatever renders the
/// panel
#[derive(Debug, Clone)]
pub struct UploadMonitor {
    clock: SharedClock,
    schedule: UploadSchedule,
    active: Arc<Mutex<ActiveUploads>>,
}

impl UploadMonitor {
    /// Creates an idle monitor
    #[must_use]
    pub fn new(clock: SharedClock, schedule: UploadSchedule) -> Self {
        Self {
            clock,
            schedule,
            active: Arc::new(Mutex::new(ActiveUploads::default())),
        }
    }

    /// Marks an upload as started. The upload counts as in flight until the
    /// returned guard is dropped, however the upload ends.
    #[must_use = "the upload is finished as soon as the guard is dropped"]
    pub fn begin(&self) -> UploadGuard {
        let now = self.clock.now_ms();
        let mut active = self.uploads();
        let id = active.next_id;
        active.next_id += 1;
        active.started.push((id, now));
        UploadGuard {
            active: Arc::clone(&self.active),
            id,
        }
    }

    /// True while any upload is in flight
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.uploads().started.is_empty()
    }

    /// Number of uploads in flight
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.uploads().started.len()
    }

    /// Simulated percentage of the oldest upload in flight, or `None` when
    /// idle
    #[must_use]
    pub fn progress(&self) -> Option<u8> {
        let started = self.uploads().started.iter().map(|&(_, at)| at).min()?;
        let elapsed = self.clock.now_ms().saturating_sub(started);
        Some(self.schedule.percent_at(elapsed))
    }

    fn uploads(&self) -> MutexGuard<'_, ActiveUploads> {
        lock(&self.active)
    }
}

/// One upload in flight; dropping it clears that upload from the monitor
#[derive(Debug)]
pub struct UploadGuard {
    active: Arc<Mutex<ActiveUploads>>,
    id: u64,
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        let id = self.id;
        lock(&self.active).started.retain(|&(upload, _)| upload != id);
    }
}

fn lock(active: &Mutex<ActiveUploads>) -> MutexGuard<'_, ActiveUploads> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}
