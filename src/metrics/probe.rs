use std::path::Path;

use color_eyre::Result;
use sysinfo::{Disks, Networks, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::metrics::{
    host::HostInfo,
    sample::{ProcessInfo, epoch_secs},
};

/// Raw memory figures in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MemoryReading {
    pub total: u64,
    pub available: u64,
    /// Only some platforms report "active" memory.
    pub active: Option<u64>,
}

impl MemoryReading {
    /// Memory usage percentage.
    ///
    /// Uses `active / total` where the platform reports active memory and
    /// `(total - available) / total` everywhere else. The two give noticeably
    /// different absolute values, so the choice is kept in this one place.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let used = match self.active {
            Some(active) => active,
            None => self.total.saturating_sub(self.available),
        };
        used as f64 / self.total as f64 * 100.0
    }
}

/// Cumulative network byte counters summed over all interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkTotals {
    pub sent: u64,
    pub recv: u64,
}

/// Access to the OS counters a [`Sample`](crate::metrics::Sample) is built from.
pub trait SystemProbe: Send {
    /// Refresh the underlying views. Called once before each set of reads.
    fn refresh(&mut self);

    fn timestamp(&self) -> f64 {
        epoch_secs()
    }

    fn cpu_percent(&self) -> f64;

    fn memory(&self) -> MemoryReading;

    fn disk_percent(&self) -> f64;

    fn network(&self) -> NetworkTotals;

    /// All visible processes. An error means enumeration failed as a whole;
    /// processes that vanish or deny access are simply absent.
    fn processes(&self) -> Result<Vec<ProcessInfo>>;

    fn host(&self) -> HostInfo;
}

/// [`SystemProbe`] backed by `sysinfo`.
#[derive(Debug)]
pub struct SysinfoProbe {
    sys: System,
    disks: Disks,
    networks: Networks,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let mut sys = System::new();
        // CPU usage is a delta, so prime it once.
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        Self {
            sys,
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbe for SysinfoProbe {
    fn refresh(&mut self) {
        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory();
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );
        self.disks.refresh(true);
        self.networks.refresh(true);
    }

    fn cpu_percent(&self) -> f64 {
        self.sys.global_cpu_usage() as f64
    }

    fn memory(&self) -> MemoryReading {
        MemoryReading {
            total: self.sys.total_memory(),
            available: self.sys.available_memory(),
            active: active_memory(),
        }
    }

    fn disk_percent(&self) -> f64 {
        let list = self.disks.list();
        let root = list
            .iter()
            .find(|d| d.mount_point() == Path::new("/"))
            .or_else(|| list.first());
        match root {
            Some(disk) if disk.total_space() > 0 => {
                let used = disk.total_space().saturating_sub(disk.available_space());
                used as f64 / disk.total_space() as f64 * 100.0
            }
            _ => 0.0,
        }
    }

    fn network(&self) -> NetworkTotals {
        self.networks
            .list()
            .values()
            .fold(NetworkTotals::default(), |acc, data| NetworkTotals {
                sent: acc.sent.saturating_add(data.total_transmitted()),
                recv: acc.recv.saturating_add(data.total_received()),
            })
    }

    fn processes(&self) -> Result<Vec<ProcessInfo>> {
        let total = self.sys.total_memory();
        let processes = self
            .sys
            .processes()
            .values()
            .map(|p| {
                let memory_percent = if total > 0 {
                    p.memory() as f64 / total as f64 * 100.0
                } else {
                    0.0
                };
                ProcessInfo::new(
                    p.pid().as_u32(),
                    p.name().to_string_lossy().into_owned(),
                    p.cpu_usage() as f64,
                    memory_percent,
                )
            })
            .collect();
        Ok(processes)
    }

    fn host(&self) -> HostInfo {
        let cpus = self.sys.cpus();
        HostInfo {
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            os: System::long_os_version()
                .or_else(System::name)
                .unwrap_or_else(|| std::env::consts::OS.to_string()),
            kernel: System::kernel_version(),
            cpu_brand: cpus
                .first()
                .map(|cpu| cpu.brand().trim().to_string())
                .filter(|brand| !brand.is_empty())
                .unwrap_or_else(|| "unknown CPU".to_string()),
            cpu_cores: cpus.len(),
            uptime_secs: System::uptime(),
        }
    }
}

#[cfg(target_os = "linux")]
fn active_memory() -> Option<u64> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    parse_active_kib(&meminfo).map(|kib| kib * 1024)
}

#[cfg(target_os = "macos")]
fn active_memory() -> Option<u64> {
    let mut stats = std::mem::MaybeUninit::<libc::vm_statistics64>::zeroed();
    let mut count = libc::HOST_VM_INFO64_COUNT;
    // SAFETY: the kernel writes at most `count` integers into `stats`.
    #[allow(deprecated)]
    let status = unsafe {
        libc::host_statistics64(
            libc::mach_host_self(),
            libc::HOST_VM_INFO64,
            stats.as_mut_ptr() as libc::host_info64_t,
            &mut count,
        )
    };
    if status != libc::KERN_SUCCESS {
        return None;
    }
    // SAFETY: zero-initialised and filled in by a successful call.
    let stats = unsafe { stats.assume_init() };
    // SAFETY: sysconf has no preconditions.
    let page_size = u64::try_from(unsafe { libc::sysconf(libc::_SC_PAGESIZE) }).ok()?;
    Some(pages_to_bytes(stats.active_count as u64, page_size))
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn active_memory() -> Option<u64> {
    None
}

/// Mach reports memory in pages.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn pages_to_bytes(pages: u64, page_size: u64) -> u64 {
    pages.saturating_mul(page_size)
}

/// Pull the `Active:` line out of `/proc/meminfo` content, in KiB.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_active_kib(meminfo: &str) -> Option<u64> {
    meminfo.lines().find_map(|line| {
        let rest = line.strip_prefix("Active:")?;
        rest.split_whitespace().next()?.parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! memory_percent_tests {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (reading, expected): (MemoryReading, f64) = $value;
                    let actual = reading.percent();
                    assert!(
                        (actual - expected).abs() < 1e-9,
                        "{}: expected {}, got {}",
                        stringify!($name),
                        expected,
                        actual
                    );
                }
            )*
        }
    }

    memory_percent_tests! {
        active_memory_wins_over_available: (
            MemoryReading { total: 1000, available: 100, active: Some(250) },
            25.0,
        ),
        falls_back_to_total_minus_available: (
            MemoryReading { total: 1000, available: 400, active: None },
            60.0,
        ),
        zero_total_is_zero_percent: (
            MemoryReading { total: 0, available: 0, active: Some(10) },
            0.0,
        ),
        available_above_total_saturates: (
            MemoryReading { total: 100, available: 200, active: None },
            0.0,
        ),
    }

    #[test]
    fn parses_active_line_from_meminfo() {
        let meminfo = "MemTotal:       16303932 kB\n\
                       MemFree:         1234567 kB\n\
                       Active(anon):    2222222 kB\n\
                       Active:          7654321 kB\n\
                       Inactive:        1111111 kB\n";
        assert_eq!(parse_active_kib(meminfo), Some(7654321));
    }

    #[test]
    fn missing_active_line_is_none() {
        assert_eq!(parse_active_kib("MemTotal: 10 kB\n"), None);
    }

    #[test]
    fn page_counts_convert_to_bytes() {
        assert_eq!(pages_to_bytes(1000, 16384), 16_384_000);
        assert_eq!(pages_to_bytes(0, 4096), 0);
        assert_eq!(pages_to_bytes(u64::MAX, 4096), u64::MAX);
    }

    #[test]
    fn sysinfo_probe_reports_host() {
        let probe = SysinfoProbe::new();
        let host = probe.host();
        assert!(!host.hostname.is_empty());
        assert!(!host.os.is_empty());
        assert!(!host.cpu_brand.is_empty());
    }

    #[test]
    fn sysinfo_probe_reads_sane_values() {
        let mut probe = SysinfoProbe::new();
        probe.refresh();
        assert!(probe.cpu_percent().is_finite());
        let memory = probe.memory().percent();
        assert!((0.0..=100.0).contains(&memory), "memory {}", memory);
        let disk = probe.disk_percent();
        assert!((0.0..=100.0).contains(&disk), "disk {}", disk);
    }
}
