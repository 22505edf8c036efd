use std::{path::PathBuf, sync::Arc, time::Duration};

use crate::{
    config::{ConfigManager, SysmonConfig},
    event::{AppEvent, Event, EventHandler},
    history::SampleHistory,
    metrics::{AnnotatedSample, Collector, HostInfo, SysinfoProbe, epoch_secs},
    monitor::{Monitor, ReportOutcome},
    ui::{dashboard::DashboardWidget, state::UiState},
};
use color_eyre::eyre::Result;
use log::*;
use ratatui::{
    DefaultTerminal,
    buffer::Buffer,
    crossterm::event::{KeyCode, KeyEvent, KeyModifiers},
    layout::Rect,
    prelude::*,
};
use tokio::task::JoinHandle;

pub struct App {
    pub running: bool,
    pub events: EventHandler,
    pub config: ConfigManager,
    pub monitor: Arc<Monitor>,
    pub samples: SampleHistory,
    pub host: HostInfo,
    /// Wall-clock seconds when `host` was read.
    host_read_at: f64,
    pub ui_state: UiState,
    sample_interval: Duration,
    delivery: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(config_path: PathBuf) -> Result<Self> {
        let events = EventHandler::new();
        let config = ConfigManager::watch(config_path, events.clone_sender())?;
        let settings = config.current();
        let collector =
            Collector::new(SysinfoProbe::new()).with_top_processes(settings.top_processes);
        let host = collector.host();
        Ok(Self {
            running: true,
            events,
            monitor: Arc::new(Monitor::new(collector, &settings.recording)),
            samples: SampleHistory::new(settings.history_secs as f64),
            host,
            host_read_at: epoch_secs(),
            ui_state: UiState::default(),
            sample_interval: settings.sample_interval(),
            delivery: None,
            config,
        })
    }

    /// Run the application's main loop.
    pub async fn run(&mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.start_delivery();
        while self.running {
            terminal.draw(|frame| self.render(frame.area(), frame.buffer_mut()))?;
            match self.events.next().await? {
                Event::Tick => self.tick(),
                Event::Crossterm(event) => match event {
                    crossterm::event::Event::Key(key_event)
                        if key_event.kind == crossterm::event::KeyEventKind::Press =>
                    {
                        self.handle_key_events(key_event)?
                    }
                    _ => {}
                },
                Event::App(app_event) => match app_event {
                    AppEvent::Reload => self.reload_config(),
                    AppEvent::Quit => self.quit(),
                    AppEvent::StartRecording => self.start_recording(),
                    AppEvent::SaveReport => self.save_report(),
                    AppEvent::ToggleDebug => self.ui_state.toggle_debug(),
                    AppEvent::Sample(sample) => self.receive(*sample),
                },
            }
        }
        self.shutdown();
        Ok(())
    }

    /// Handles the key events and updates the state of [`App`].
    pub fn handle_key_events(&mut self, key_event: KeyEvent) -> Result<()> {
        match key_event.code {
            KeyCode::Esc | KeyCode::Char('q') => self.events.send(AppEvent::Quit),
            KeyCode::Char('c' | 'C') if key_event.modifiers == KeyModifiers::CONTROL => {
                self.events.send(AppEvent::Quit)
            }
            KeyCode::Char('c') => self.events.send(AppEvent::Reload),
            KeyCode::Char('r') => self.events.send(AppEvent::StartRecording),
            KeyCode::Char('s') => self.events.send(AppEvent::SaveReport),
            KeyCode::Char('d') => self.events.send(AppEvent::ToggleDebug),
            _ => {}
        }
        Ok(())
    }

    fn tick(&mut self) {
        self.ui_state.tick();
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }

    /// (Re)start forwarding samples from the monitor into the event queue.
    fn start_delivery(&mut self) {
        if let Some(previous) = self.delivery.take() {
            previous.abort();
        }
        let mut samples = self.monitor.spawn_delivery(self.sample_interval);
        let sender = self.events.clone_sender();
        self.delivery = Some(tokio::spawn(async move {
            while let Some(sample) = samples.recv().await {
                if sender
                    .send(Event::App(AppEvent::Sample(Box::new(sample))))
                    .is_err()
                {
                    break;
                }
            }
        }));
        debug!(target: "App", "Sampling every {:?}", self.sample_interval);
    }

    fn receive(&mut self, sample: AnnotatedSample) {
        if sample.recording_finished {
            match &sample.report {
                Some(path) => info!(
                    target: "App",
                    "Recording finished, report at {}",
                    path.display()
                ),
                None => warn!(
                    target: "App",
                    "Recording finished but the report could not be written, press s to retry"
                ),
            }
        }
        self.samples.push(sample);
    }

    fn start_recording(&mut self) {
        let session = self.monitor.start_recording();
        info!(target: "App", "Recording session {} started", session);
    }

    fn save_report(&mut self) {
        match self.monitor.download_report() {
            Ok(ReportOutcome::Ready(path)) => {
                info!(target: "App", "Report saved to {}", path.display())
            }
            Ok(ReportOutcome::NoReport) => {
                warn!(target: "App", "No report available, press r to record first")
            }
            Err(e) => error!(target: "App", "Report generation failed: {:#}", e),
        }
    }

    fn reload_config(&mut self) {
        debug!(target:"App", "Reload!");
        match self.config.reload() {
            Ok(config) => self.apply(config),
            Err(e) => error!(target: "App", "{:#}", e),
        }
    }

    fn apply(&mut self, config: SysmonConfig) {
        self.monitor.apply(&config.recording);
        self.samples.set_window(config.history_secs as f64);
        if config.sample_interval() != self.sample_interval {
            self.sample_interval = config.sample_interval();
            self.start_delivery();
        }
    }

    /// Keep whatever an unfinished session has recorded.
    fn shutdown(&mut self) {
        if let Some(delivery) = self.delivery.take() {
            delivery.abort();
        }
        if self.monitor.status().active {
            match self.monitor.stop_and_finalize() {
                Ok(path) => info!(target: "App", "Saved in-progress session to {}", path.display()),
                Err(e) => error!(target: "App", "Could not save session on exit: {:#}", e),
            }
        }
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let status = self.monitor.status();
        let elapsed = (self.ui_state.now - self.host_read_at).max(0.0) as u64;
        let host = self.host.uptime_advanced(elapsed);
        DashboardWidget {
            ui: &self.ui_state,
            samples: &self.samples,
            status: &status,
            host: Some(&host),
        }
        .render(area, buf);
    }
}
