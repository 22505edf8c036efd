use std::cmp::Ordering;

use log::*;

use crate::metrics::{
    host::HostInfo,
    probe::SystemProbe,
    sample::{ProcessInfo, Sample},
};

pub const DEFAULT_TOP_PROCESSES: usize = 5;

/// Turns probe readings into [`Sample`]s.
#[derive(Debug)]
pub struct Collector<P> {
    probe: P,
    top_n: usize,
}

impl<P: SystemProbe> Collector<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            top_n: DEFAULT_TOP_PROCESSES,
        }
    }

    pub fn with_top_processes(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn host(&self) -> HostInfo {
        self.probe.host()
    }

    /// Take one sample. Never fails: a failed process enumeration only
    /// empties the top-process lists.
    pub fn collect(&mut self) -> Sample {
        self.probe.refresh();
        let network = self.probe.network();
        let (top_cpu, top_mem) = match self.probe.processes() {
            Ok(processes) => (
                top_by(&processes, self.top_n, |p| p.cpu_percent),
                top_by(&processes, self.top_n, |p| p.memory_percent),
            ),
            Err(err) => {
                warn!(target: "Monitor", "Process enumeration failed: {}", err);
                (Vec::new(), Vec::new())
            }
        };
        Sample {
            timestamp: self.probe.timestamp(),
            cpu_percent: self.probe.cpu_percent(),
            memory_percent: self.probe.memory().percent(),
            disk_percent: self.probe.disk_percent(),
            net_sent: network.sent,
            net_recv: network.recv,
            top_cpu,
            top_mem,
        }
    }
}

/// The `n` processes with the highest `key`, highest first.
///
/// The sort is stable, so equal keys keep enumeration order.
pub fn top_by<F>(processes: &[ProcessInfo], n: usize, key: F) -> Vec<ProcessInfo>
where
    F: Fn(&ProcessInfo) -> f64,
{
    let mut sorted: Vec<&ProcessInfo> = processes.iter().collect();
    sorted.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
    sorted.into_iter().take(n).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::fake::FakeProbe;

    fn proc(pid: u32, cpu: f64, mem: f64) -> ProcessInfo {
        ProcessInfo::new(pid, format!("p{}", pid), cpu, mem)
    }

    fn pids(list: &[ProcessInfo]) -> Vec<u32> {
        list.iter().map(|p| p.pid).collect()
    }

    #[test]
    fn orders_three_processes_by_cpu() {
        let processes = vec![proc(1, 10.0, 0.0), proc(2, 90.0, 0.0), proc(3, 50.0, 0.0)];
        let top = top_by(&processes, 5, |p| p.cpu_percent);
        let cpus: Vec<f64> = top.iter().map(|p| p.cpu_percent).collect();
        assert_eq!(cpus, vec![90.0, 50.0, 10.0]);
    }

    #[test]
    fn truncates_to_n() {
        let processes: Vec<ProcessInfo> = (1..=8).map(|i| proc(i, i as f64, 0.0)).collect();
        let top = top_by(&processes, 5, |p| p.cpu_percent);
        assert_eq!(pids(&top), vec![8, 7, 6, 5, 4]);
    }

    #[test]
    fn ties_keep_enumeration_order() {
        let processes = vec![
            proc(1, 5.0, 0.0),
            proc(2, 20.0, 0.0),
            proc(3, 5.0, 0.0),
            proc(4, 5.0, 0.0),
        ];
        let top = top_by(&processes, 3, |p| p.cpu_percent);
        assert_eq!(pids(&top), vec![2, 1, 3]);
    }

    #[test]
    fn collect_builds_both_lists_from_one_enumeration() {
        let probe = FakeProbe::default().with_processes(vec![
            proc(1, 10.0, 70.0),
            proc(2, 90.0, 5.0),
            proc(3, 50.0, 30.0),
        ]);
        let mut collector = Collector::new(probe);
        let sample = collector.collect();
        assert_eq!(pids(&sample.top_cpu), vec![2, 3, 1]);
        assert_eq!(pids(&sample.top_mem), vec![1, 3, 2]);
    }

    #[test]
    fn collect_fills_scalar_metrics() {
        let probe = FakeProbe::default()
            .with_cpu(42.0)
            .with_disk(61.5)
            .with_network(1_000, 2_000);
        let mut collector = Collector::new(probe);
        let sample = collector.collect();
        assert_eq!(sample.cpu_percent, 42.0);
        assert_eq!(sample.disk_percent, 61.5);
        assert_eq!(sample.net_sent, 1_000);
        assert_eq!(sample.net_recv, 2_000);
        assert_eq!(sample.memory_percent, 50.0);
    }

    #[test]
    fn failed_enumeration_degrades_to_empty_lists() {
        let probe = FakeProbe::default().with_cpu(33.0).failing_processes();
        let mut collector = Collector::new(probe);
        let sample = collector.collect();
        assert!(sample.top_cpu.is_empty());
        assert!(sample.top_mem.is_empty());
        assert_eq!(sample.cpu_percent, 33.0);
    }

    #[test]
    fn respects_configured_top_count() {
        let processes: Vec<ProcessInfo> = (1..=4).map(|i| proc(i, i as f64, i as f64)).collect();
        let mut collector =
            Collector::new(FakeProbe::default().with_processes(processes)).with_top_processes(2);
        let sample = collector.collect();
        assert_eq!(pids(&sample.top_cpu), vec![4, 3]);
        assert_eq!(pids(&sample.top_mem), vec![4, 3]);
    }
}
