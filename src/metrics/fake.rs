//! Deterministic [`SystemProbe`] for tests.

use color_eyre::{Result, eyre::eyre};

use crate::metrics::{
    host::HostInfo,
    probe::{MemoryReading, NetworkTotals, SystemProbe},
    sample::ProcessInfo,
};

/// Scripted readings. Each `refresh` advances the clock by `tick` seconds and
/// the network counters by `net_step` bytes.
#[derive(Debug, Clone)]
pub struct FakeProbe {
    now: f64,
    tick: f64,
    cpu: f64,
    memory: MemoryReading,
    disk: f64,
    network: NetworkTotals,
    net_step: u64,
    processes: Vec<ProcessInfo>,
    fail_processes: bool,
}

impl Default for FakeProbe {
    fn default() -> Self {
        Self {
            now: 1000.0,
            tick: 0.0,
            cpu: 0.0,
            memory: MemoryReading {
                total: 1000,
                available: 500,
                active: None,
            },
            disk: 0.0,
            network: NetworkTotals::default(),
            net_step: 0,
            processes: Vec::new(),
            fail_processes: false,
        }
    }
}

impl FakeProbe {
    pub fn with_cpu(mut self, cpu: f64) -> Self {
        self.cpu = cpu;
        self
    }

    pub fn with_disk(mut self, disk: f64) -> Self {
        self.disk = disk;
        self
    }

    pub fn with_network(mut self, sent: u64, recv: u64) -> Self {
        self.network = NetworkTotals { sent, recv };
        self
    }

    pub fn with_net_step(mut self, step: u64) -> Self {
        self.net_step = step;
        self
    }

    pub fn with_clock(mut self, start: f64, tick: f64) -> Self {
        self.now = start - tick;
        self.tick = tick;
        self
    }

    pub fn with_processes(mut self, processes: Vec<ProcessInfo>) -> Self {
        self.processes = processes;
        self
    }

    pub fn failing_processes(mut self) -> Self {
        self.fail_processes = true;
        self
    }
}

impl SystemProbe for FakeProbe {
    fn refresh(&mut self) {
        self.now += self.tick;
        self.network.sent += self.net_step;
        self.network.recv += self.net_step;
    }

    fn timestamp(&self) -> f64 {
        self.now
    }

    fn cpu_percent(&self) -> f64 {
        self.cpu
    }

    fn memory(&self) -> MemoryReading {
        self.memory
    }

    fn disk_percent(&self) -> f64 {
        self.disk
    }

    fn network(&self) -> NetworkTotals {
        self.network
    }

    fn processes(&self) -> Result<Vec<ProcessInfo>> {
        if self.fail_processes {
            Err(eyre!("process table unavailable"))
        } else {
            Ok(self.processes.clone())
        }
    }

    fn host(&self) -> HostInfo {
        HostInfo {
            hostname: "testhost".to_string(),
            os: "TestOS 1.0".to_string(),
            kernel: None,
            cpu_brand: "Fake CPU".to_string(),
            cpu_cores: 4,
            uptime_secs: 3600,
        }
    }
}
