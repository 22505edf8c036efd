use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// One process as seen during a single enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

impl ProcessInfo {
    pub(crate) fn new(pid: u32, name: String, cpu_percent: f64, memory_percent: f64) -> Self {
        Self {
            pid,
            name,
            cpu_percent: finite_or_zero(cpu_percent),
            memory_percent: finite_or_zero(memory_percent),
        }
    }
}

/// A point-in-time snapshot of host resource usage.
///
/// The serialized field names follow the browser dashboard's JSON contract
/// (`cpu`, `memory`, `disk`), hence the renames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: f64,
    #[serde(rename = "cpu")]
    pub cpu_percent: f64,
    #[serde(rename = "memory")]
    pub memory_percent: f64,
    #[serde(rename = "disk")]
    pub disk_percent: f64,
    pub net_sent: u64,
    pub net_recv: u64,
    pub top_cpu: Vec<ProcessInfo>,
    pub top_mem: Vec<ProcessInfo>,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            timestamp: epoch_secs(),
            cpu_percent: 0.0,
            memory_percent: 0.0,
            disk_percent: 0.0,
            net_sent: 0,
            net_recv: 0,
            top_cpu: Vec::new(),
            top_mem: Vec::new(),
        }
    }
}

/// A sample as delivered to viewers, with the recording state folded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedSample {
    #[serde(flatten)]
    pub sample: Sample,
    pub recording_progress: f64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub recording_finished: bool,
    /// Where the finished session's report was written; `None` when the
    /// write failed or nothing finished. Local to this process.
    #[serde(skip)]
    pub report: Option<std::path::PathBuf>,
}

/// Wall-clock seconds since the Unix epoch.
pub fn epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
