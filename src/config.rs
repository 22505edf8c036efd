//! Provides a ConfigManager to read and refresh config from files.
//!

use color_eyre::Result;
use config;
use log::*;
use notify::{RecommendedWatcher, Watcher};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    event::{AppEvent, Event},
    metrics::collector::DEFAULT_TOP_PROCESSES,
};

pub const DEFAULT_FILE: &str = "sysmon.toml";
pub const ENV_PREFIX: &str = "SYSMON";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub duration_secs: u64,
    pub dedup_window_ms: u64,
    pub report_path: PathBuf,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            duration_secs: 300,
            dedup_window_ms: 500,
            report_path: PathBuf::from("report.pdf"),
        }
    }
}

impl RecordingConfig {
    pub fn duration(&self) -> f64 {
        self.duration_secs as f64
    }

    pub fn dedup_window(&self) -> f64 {
        self.dedup_window_ms as f64 / 1000.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// File name offered to the browser for the report download.
    pub download_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            download_name: "system_report.pdf".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SysmonConfig {
    pub sample_interval_ms: u64,
    pub top_processes: usize,
    /// Seconds of history shown by the terminal sparklines.
    pub history_secs: u64,
    pub recording: RecordingConfig,
    pub server: ServerConfig,
}

impl Default for SysmonConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1000,
            top_processes: DEFAULT_TOP_PROCESSES,
            history_secs: 120,
            recording: RecordingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl SysmonConfig {
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms.max(1))
    }
}

#[derive(Debug)]
pub struct ConfigManager {
    pub file_path: PathBuf,
    config: SysmonConfig,
    _watcher: Option<RecommendedWatcher>,
}

impl ConfigManager {
    /// Load without watching for changes.
    pub fn load(file_path: PathBuf) -> Result<ConfigManager> {
        Ok(ConfigManager {
            config: Self::load_from_file(file_path.clone())?,
            file_path,
            _watcher: None,
        })
    }

    /// Load and send a reload event whenever the file changes. A missing
    /// file is not watched; defaults and the environment still apply.
    pub fn watch(file_path: PathBuf, sender: UnboundedSender<Event>) -> Result<ConfigManager> {
        let mut manager = Self::load(file_path)?;
        if manager.file_path.exists() {
            let mut watcher = notify::recommended_watcher(move |_| {
                let _ = sender.send(Event::App(AppEvent::Reload));
            })?;
            info!(target: "Config", "Watching file {:?}", manager.file_path);
            watcher.watch(&manager.file_path, notify::RecursiveMode::NonRecursive)?;
            manager._watcher = Some(watcher);
        } else {
            info!(target: "Config", "No config file at {:?}, using defaults", manager.file_path);
        }
        Ok(manager)
    }

    pub fn current(&self) -> SysmonConfig {
        self.config.clone()
    }

    pub fn reload(&mut self) -> Result<SysmonConfig> {
        self.config = Self::load_from_file(self.file_path.clone())?;
        Ok(self.current())
    }

    fn load_from_file(file_path: PathBuf) -> Result<SysmonConfig> {
        Self::load_layered(file_path, None)
    }

    /// File first, then `SYSMON_*` variables. `env` replaces the process
    /// environment when given.
    fn load_layered(
        file_path: PathBuf,
        env: Option<config::Map<String, String>>,
    ) -> Result<SysmonConfig> {
        let raw = config::Config::builder()
            .add_source(config::File::from(file_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;
        Ok(raw.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(manager.current(), SysmonConfig::default());
        assert_eq!(manager.current().recording.duration(), 300.0);
        assert_eq!(manager.current().recording.dedup_window(), 0.5);
    }

    #[test]
    fn file_overrides_selected_fields() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "sample_interval_ms = 2000\n\
             [recording]\n\
             duration_secs = 60\n\
             report_path = \"out/session.pdf\"\n\
             [server]\n\
             bind = \"0.0.0.0:9000\""
        )
        .unwrap();
        let manager = ConfigManager::load(file.path().to_path_buf()).unwrap();
        let config = manager.current();
        assert_eq!(config.sample_interval(), Duration::from_secs(2));
        assert_eq!(config.recording.duration_secs, 60);
        assert_eq!(config.recording.dedup_window_ms, 500);
        assert_eq!(config.recording.report_path, PathBuf::from("out/session.pdf"));
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.server.download_name, "system_report.pdf");
        assert_eq!(config.top_processes, 5);
    }

    #[test]
    fn reload_picks_up_changes() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "top_processes = 3").unwrap();
        let mut manager = ConfigManager::load(file.path().to_path_buf()).unwrap();
        assert_eq!(manager.current().top_processes, 3);

        std::fs::write(file.path(), "top_processes = 8\n").unwrap();
        assert_eq!(manager.reload().unwrap().top_processes, 8);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "top_processes = \"many\"").unwrap();
        assert!(ConfigManager::load(file.path().to_path_buf()).is_err());
    }

    #[test]
    fn environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[recording]\nduration_secs = 120\ndedup_window_ms = 250").unwrap();
        let env = [
            ("SYSMON_RECORDING__DURATION_SECS", "60"),
            ("SYSMON_SERVER__BIND", "0.0.0.0:8080"),
            ("SYSMON_TOP_PROCESSES", "7"),
            ("OTHER_TOP_PROCESSES", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let config = ConfigManager::load_layered(file.path().to_path_buf(), Some(env)).unwrap();
        assert_eq!(config.recording.duration_secs, 60);
        assert_eq!(config.recording.dedup_window_ms, 250);
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.top_processes, 7);
    }

    #[test]
    fn effective_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&SysmonConfig::default()).unwrap();
        assert!(text.contains("[recording]"));
        assert!(text.contains("duration_secs = 300"));
    }
}
