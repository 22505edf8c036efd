//! The recording session state machine.
//!
//! All transitions take the current time explicitly so the session never
//! reads a clock itself.

use log::*;
use uuid::Uuid;

use crate::metrics::Sample;

pub const DEFAULT_DURATION_SECS: f64 = 300.0;
pub const DEFAULT_DEDUP_WINDOW_SECS: f64 = 0.5;

/// How `observe` decides whether a sample joins the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendPolicy {
    /// Single consumer: every observed sample is kept.
    Always,
    /// Several delivery loops may observe the same moment: skip samples that
    /// land within the dedup window of the last kept one.
    Deduplicate,
}

#[derive(Debug, Clone)]
pub struct RecordingSession {
    active: bool,
    id: Option<Uuid>,
    start_time: f64,
    duration: f64,
    dedup_window: f64,
    samples: Vec<Sample>,
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_WINDOW_SECS)
    }
}

impl RecordingSession {
    pub fn new(dedup_window: f64) -> Self {
        Self {
            active: false,
            id: None,
            start_time: 0.0,
            duration: DEFAULT_DURATION_SECS,
            dedup_window,
            samples: Vec::new(),
        }
    }

    /// Begin a new session, discarding whatever the previous one collected.
    pub fn start(&mut self, now: f64, duration: f64) -> Uuid {
        if self.active
            && let Some(old) = self.id
        {
            info!(
                target: "Monitor",
                "Discarding session {} with {} samples", old, self.samples.len()
            );
        }
        let id = Uuid::new_v4();
        self.active = true;
        self.id = Some(id);
        self.start_time = now;
        self.duration = duration.max(0.0);
        self.samples.clear();
        id
    }

    /// Offer a sample to the session and return the recording progress.
    pub fn observe(&mut self, sample: &Sample, policy: AppendPolicy, now: f64) -> f64 {
        if !self.active {
            return 0.0;
        }
        // Samples stay in collection order even when a slower consumer
        // reaches the lock after a newer sample was kept.
        let append = match (policy, self.samples.last()) {
            (_, Some(last)) if sample.timestamp < last.timestamp => false,
            (AppendPolicy::Always, _) | (AppendPolicy::Deduplicate, None) => true,
            (AppendPolicy::Deduplicate, Some(last)) => {
                sample.timestamp - last.timestamp > self.dedup_window
            }
        };
        if append {
            self.samples.push(sample.clone());
        } else {
            trace!(target: "Monitor", "Skipping duplicate sample at {}", sample.timestamp);
        }
        self.progress(now)
    }

    /// Elapsed share of the target duration, clamped to 0..=100.
    pub fn progress(&self, now: f64) -> f64 {
        if !self.active {
            return 0.0;
        }
        if self.duration <= 0.0 {
            return 100.0;
        }
        ((now - self.start_time) / self.duration * 100.0).clamp(0.0, 100.0)
    }

    pub fn should_stop(&self, now: f64) -> bool {
        self.active && now - self.start_time >= self.duration
    }

    /// End the session. The samples stay around for report regeneration.
    pub fn stop(&mut self) -> Vec<Sample> {
        self.active = false;
        self.samples.clone()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether any session was started since the process began.
    pub fn has_session(&self) -> bool {
        self.id.is_some()
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn set_dedup_window(&mut self, window: f64) {
        self.dedup_window = window;
    }
}
