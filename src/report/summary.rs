//! Pure reductions from a recorded sample sequence to report figures.

use crate::metrics::Sample;

/// Target number of points on the trend chart.
pub const CHART_POINTS: usize = 50;
pub const BYTES_PER_MB: f64 = 1_048_576.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub avg_cpu: f64,
    pub max_cpu: f64,
    pub avg_mem: f64,
    pub max_mem: f64,
    /// `last - first` of the cumulative counters. Negative after a counter
    /// reset or wrap; reported as-is.
    pub sent_bytes: i128,
    pub recv_bytes: i128,
}

impl Summary {
    /// `None` for an empty sequence.
    pub fn from_samples(samples: &[Sample]) -> Option<Self> {
        let first = samples.first()?;
        let last = samples.last()?;
        let count = samples.len() as f64;
        let (cpu_sum, max_cpu, mem_sum, max_mem) = samples.iter().fold(
            (0.0, f64::MIN, 0.0, f64::MIN),
            |(cpu_sum, max_cpu, mem_sum, max_mem), s| {
                (
                    cpu_sum + s.cpu_percent,
                    f64::max(max_cpu, s.cpu_percent),
                    mem_sum + s.memory_percent,
                    f64::max(max_mem, s.memory_percent),
                )
            },
        );
        Some(Self {
            avg_cpu: cpu_sum / count,
            max_cpu,
            avg_mem: mem_sum / count,
            max_mem,
            sent_bytes: last.net_sent as i128 - first.net_sent as i128,
            recv_bytes: last.net_recv as i128 - first.net_recv as i128,
        })
    }

    pub fn sent_mb(&self) -> f64 {
        self.sent_bytes as f64 / BYTES_PER_MB
    }

    pub fn recv_mb(&self) -> f64 {
        self.recv_bytes as f64 / BYTES_PER_MB
    }

    /// The summary table, header row first.
    pub fn table(&self) -> Vec<[String; 4]> {
        let dash = || "-".to_string();
        vec![
            [
                "Metric".to_string(),
                "Average".to_string(),
                "Maximum".to_string(),
                "Total Change".to_string(),
            ],
            [
                "CPU Usage".to_string(),
                format!("{:.1}%", self.avg_cpu),
                format!("{:.1}%", self.max_cpu),
                dash(),
            ],
            [
                "Memory Usage".to_string(),
                format!("{:.1}%", self.avg_mem),
                format!("{:.1}%", self.max_mem),
                dash(),
            ],
            [
                "Network Sent".to_string(),
                dash(),
                dash(),
                format!("{:.2} MB", self.sent_mb()),
            ],
            [
                "Network Recv".to_string(),
                dash(),
                dash(),
                format!("{:.2} MB", self.recv_mb()),
            ],
        ]
    }
}

/// Stride used to thin `len` samples down to roughly [`CHART_POINTS`].
pub fn downsample_step(len: usize) -> usize {
    (len / CHART_POINTS).max(1)
}

/// CPU and memory series for the trend chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub cpu: Vec<f64>,
    pub memory: Vec<f64>,
}

impl ChartSeries {
    /// Every `step`-th sample starting at index 0.
    pub fn from_samples(samples: &[Sample]) -> Self {
        let step = downsample_step(samples.len());
        let (cpu, memory) = samples
            .iter()
            .step_by(step)
            .map(|s| (s.cpu_percent, s.memory_percent))
            .unzip();
        Self { cpu, memory }
    }

    pub fn len(&self) -> usize {
        self.cpu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty()
    }
}
