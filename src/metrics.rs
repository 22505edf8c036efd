pub mod collector;
#[cfg(test)]
pub mod fake;
pub mod host;
pub mod probe;
pub mod sample;

pub use collector::Collector;
pub use host::HostInfo;
pub use probe::{SysinfoProbe, SystemProbe};
pub use sample::{AnnotatedSample, ProcessInfo, Sample, epoch_secs};
