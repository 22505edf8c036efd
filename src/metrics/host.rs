use serde::{Deserialize, Serialize};

/// Static-ish facts about the machine, shown next to the live figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    pub hostname: String,
    /// Distribution and version, e.g. "Linux (Ubuntu 24.04)".
    pub os: String,
    pub kernel: Option<String>,
    pub cpu_brand: String,
    /// Logical CPUs.
    pub cpu_cores: usize,
    pub uptime_secs: u64,
}

impl HostInfo {
    /// Uptime as `"3d 04h 12m"`, dropping the day part when zero.
    pub fn uptime_text(&self) -> String {
        let minutes = self.uptime_secs / 60;
        let (days, hours, minutes) = (minutes / 1440, minutes / 60 % 24, minutes % 60);
        if days > 0 {
            format!("{}d {:02}h {:02}m", days, hours, minutes)
        } else {
            format!("{:02}h {:02}m", hours, minutes)
        }
    }

    /// The same host `secs` seconds later.
    pub fn uptime_advanced(&self, secs: u64) -> HostInfo {
        HostInfo {
            uptime_secs: self.uptime_secs.saturating_add(secs),
            ..self.clone()
        }
    }

    /// One-line summary for the dashboard header.
    pub fn summary(&self) -> String {
        format!(
            "{} | {} | {} x{} | up {}",
            self.hostname,
            self.os,
            self.cpu_brand,
            self.cpu_cores,
            self.uptime_text()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(uptime_secs: u64) -> HostInfo {
        HostInfo {
            hostname: "box".to_string(),
            os: "Linux (Test 1.0)".to_string(),
            kernel: Some("6.1.0".to_string()),
            cpu_brand: "Test CPU".to_string(),
            cpu_cores: 8,
            uptime_secs,
        }
    }

    macro_rules! uptime_tests {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (secs, expected): (u64, &str) = $value;
                    assert_eq!(host(secs).uptime_text(), expected);
                }
            )*
        }
    }

    uptime_tests! {
        under_a_minute: (59, "00h 00m"),
        hours_and_minutes: (3 * 3600 + 5 * 60 + 9, "03h 05m"),
        days_shown_when_present: (2 * 86400 + 4 * 3600 + 12 * 60, "2d 04h 12m"),
    }

    #[test]
    fn summary_names_host_and_cpu() {
        let summary = host(60).summary();
        assert_eq!(summary, "box | Linux (Test 1.0) | Test CPU x8 | up 00h 01m");
    }

    #[test]
    fn uptime_advances_without_touching_the_rest() {
        let later = host(60).uptime_advanced(3600);
        assert_eq!(later.uptime_secs, 3660);
        assert_eq!(later.hostname, "box");
        assert_eq!(later.uptime_text(), "01h 01m");
    }

    #[test]
    fn serializes_flat_fields() {
        let json = serde_json::to_value(host(10)).unwrap();
        assert_eq!(json["hostname"], "box");
        assert_eq!(json["cpu_cores"], 8);
        assert_eq!(json["uptime_secs"], 10);
    }
}
