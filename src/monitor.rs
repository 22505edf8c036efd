//! The shared handle every viewer talks to.
//!
//! A [`Monitor`] owns the collector and the single recording session. Polling
//! requests, streaming loops and the terminal dashboard all go through it, so
//! observing, auto-stopping and finalizing happen in exactly one place.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use color_eyre::Result;
use log::*;
use serde::Serialize;
use tokio::{sync::mpsc, time::MissedTickBehavior};
use uuid::Uuid;

use crate::{
    config::RecordingConfig,
    metrics::{
        AnnotatedSample, Collector, HostInfo, Sample, SysinfoProbe, SystemProbe, sample::epoch_secs,
    },
    recording::{AppendPolicy, RecordingSession},
    report,
};

type Clock = Box<dyn Fn() -> f64 + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Ready(PathBuf),
    /// No session was ever recorded.
    NoReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordingStatus {
    pub active: bool,
    pub session: Option<Uuid>,
    pub progress: f64,
    pub samples: usize,
    pub duration: f64,
    pub report_path: PathBuf,
}

#[derive(Debug)]
struct RecordingState {
    session: RecordingSession,
    duration: f64,
    report_path: PathBuf,
}

impl RecordingState {
    /// End the session and write its report. The session is over even when
    /// the write fails.
    fn finalize(&mut self) -> Result<PathBuf> {
        let samples = self.session.stop();
        info!(
            target: "Monitor",
            "Finalizing session {:?} with {} samples",
            self.session.id(),
            samples.len()
        );
        self.write_report(&samples)
    }

    fn write_report(&self, samples: &[Sample]) -> Result<PathBuf> {
        report::generate(samples, &self.report_path)?;
        Ok(self.report_path.clone())
    }
}

pub struct Monitor<P = SysinfoProbe> {
    collector: Mutex<Collector<P>>,
    state: Mutex<RecordingState>,
    clock: Clock,
}

impl<P> std::fmt::Debug for Monitor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<P: SystemProbe> Monitor<P> {
    pub fn new(collector: Collector<P>, config: &RecordingConfig) -> Self {
        Self {
            collector: Mutex::new(collector),
            state: Mutex::new(RecordingState {
                session: RecordingSession::new(config.dedup_window()),
                duration: config.duration(),
                report_path: config.report_path.clone(),
            }),
            clock: Box::new(epoch_secs),
        }
    }

    /// Replace the wall clock used for session timing.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    /// Sample for a single polling consumer: always recorded.
    pub fn poll(&self) -> AnnotatedSample {
        self.deliver(AppendPolicy::Always)
    }

    /// Sample for a streaming loop that may run next to other consumers.
    pub fn stream_sample(&self) -> AnnotatedSample {
        self.deliver(AppendPolicy::Deduplicate)
    }

    fn deliver(&self, policy: AppendPolicy) -> AnnotatedSample {
        let sample = self.collect();
        let now = (self.clock)();
        let mut state = self.lock_state();
        let recording_progress = state.session.observe(&sample, policy, now);
        let mut recording_finished = false;
        let mut report = None;
        if state.session.should_stop(now) {
            info!(target: "Monitor", "Recording duration reached, stopping");
            recording_finished = true;
            match state.finalize() {
                Ok(path) => report = Some(path),
                Err(err) => error!(target: "Monitor", "Report generation failed: {:#}", err),
            }
        }
        AnnotatedSample {
            sample,
            recording_progress,
            recording_finished,
            report,
        }
    }

    fn collect(&self) -> Sample {
        self.collector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .collect()
    }

    pub fn host_info(&self) -> HostInfo {
        self.collector
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .host()
    }

    fn lock_state(&self) -> MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a fresh session with the configured duration, dropping any
    /// session in progress.
    pub fn start_recording(&self) -> Uuid {
        let now = (self.clock)();
        let mut state = self.lock_state();
        let duration = state.duration;
        let id = state.session.start(now, duration);
        info!(target: "Monitor", "Recording session {} started ({}s)", id, duration);
        id
    }

    pub fn stop_and_finalize(&self) -> Result<PathBuf> {
        self.lock_state().finalize()
    }

    /// Produce the report file for download.
    ///
    /// An active session is stopped and finalized. Otherwise the last
    /// session's samples are rendered again.
    pub fn download_report(&self) -> Result<ReportOutcome> {
        let mut state = self.lock_state();
        if state.session.is_active() {
            return state.finalize().map(ReportOutcome::Ready);
        }
        if state.session.has_session() {
            let path = state.write_report(state.session.samples())?;
            return Ok(ReportOutcome::Ready(path));
        }
        Ok(ReportOutcome::NoReport)
    }

    pub fn status(&self) -> RecordingStatus {
        let now = (self.clock)();
        let state = self.lock_state();
        RecordingStatus {
            active: state.session.is_active(),
            session: state.session.id(),
            progress: state.session.progress(now),
            samples: state.session.samples().len(),
            duration: state.duration,
            report_path: state.report_path.clone(),
        }
    }

    /// Apply reloaded settings. A running session keeps its duration.
    pub fn apply(&self, config: &RecordingConfig) {
        let mut state = self.lock_state();
        state.duration = config.duration();
        state.report_path = config.report_path.clone();
        state.session.set_dedup_window(config.dedup_window());
        debug!(target: "Monitor", "Applied recording settings {:?}", config);
    }
}

impl<P: SystemProbe + 'static> Monitor<P> {
    /// Run a delivery loop that pushes a sample every `period`.
    ///
    /// The loop ends once the receiver is dropped; the recording session is
    /// left exactly as it was.
    pub fn spawn_delivery(self: &Arc<Self>, period: Duration) -> mpsc::Receiver<AnnotatedSample> {
        let (sender, receiver) = mpsc::channel(1);
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if sender.is_closed() {
                    break;
                }
                let monitor = Arc::clone(&monitor);
                let sample = match tokio::task::spawn_blocking(move || monitor.stream_sample()).await
                {
                    Ok(sample) => sample,
                    Err(err) => {
                        error!(target: "Monitor", "Sampling task failed: {}", err);
                        break;
                    }
                };
                if sender.send(sample).await.is_err() {
                    break;
                }
            }
            debug!(target: "Monitor", "Delivery loop stopped");
        });
        receiver
    }
}
