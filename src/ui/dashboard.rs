use crate::{
    history::SampleHistory,
    metrics::HostInfo,
    monitor::RecordingStatus,
    ui::{
        debug::DebugWidget,
        processes::{ProcessTable, Ranking},
        stat_line::usage_stats,
        state::UiState,
    },
};
use ratatui::{buffer::Buffer, layout::Rect, macros::*, prelude::*, widgets::*};
use tui_logger::*;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// The whole terminal screen.
///
/// ```"not rust"
/// ╭ sysmon ─ ● REC ──────────────────────────────────────────────╮
/// │ box | Linux (Ubuntu 24.04) | Ryzen 7 x16 | up 2d 04h 12m      │
/// │ ██████████████████████░░░░░░░░░░░░░ 62.0% (186 samples)       │
/// ╰───────────────────────────────────────────────────────────────╯
///  ▂▃▅▇█▇▅▃▂▂▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁  CPU:    37.5%
///  ...
/// ╭ Top CPU ──────────────────╮╭ Top Memory ───────────────╮
/// ╰───────────────────────────╯╰───────────────────────────╯
/// logs
/// ```
pub struct DashboardWidget<'a> {
    pub ui: &'a UiState,
    pub samples: &'a SampleHistory,
    pub status: &'a RecordingStatus,
    pub host: Option<&'a HostInfo>,
}

impl DashboardWidget<'_> {
    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let border = Block::bordered()
            .title_top(ratatui::macros::line![
                " sysmon ".fg(self.ui.theme.primary),
                self.recording_indicator(),
            ])
            .title_bottom(
                ratatui::macros::line![" r record  s save  c reload  d debug  q quit "]
                    .right_aligned(),
            )
            .border_style(
                Style::default()
                    .bg(self.ui.theme.surface)
                    .fg(self.ui.theme.primary_background),
            )
            .bg(self.ui.theme.surface)
            .border_type(BorderType::Rounded);
        let inner = border.inner(area);
        border.render(area, buf);
        let [host, gauge] = vertical![==1, ==1].areas(inner);
        let host_text = match self.host {
            Some(host) => host.summary(),
            None => "host information unavailable".to_string(),
        };
        Line::from(host_text)
            .fg(self.ui.theme.secondary)
            .render(host, buf);

        let label = if self.status.session.is_some() {
            format!(
                "{:.1}% ({} samples of {:.0}s)",
                self.status.progress, self.status.samples, self.status.duration
            )
        } else {
            "Not recording".to_string()
        };
        Gauge::default()
            .ratio((self.status.progress / 100.0).clamp(0.0, 1.0))
            .label(label)
            .gauge_style(
                Style::default()
                    .fg(self.ui.theme.cpu)
                    .bg(crate::ui::theme::Theme::darken(self.ui.theme.cpu, 0.8)),
            )
            .render(gauge, buf);
    }

    fn recording_indicator(&self) -> Span<'static> {
        const FRAMES: [&str; 4] = [" ● ", " ● ", " ○ ", " ○ "];
        if self.status.active {
            let frame = FRAMES[self.ui.step_of_4_in_1_second()];
            span!(self.ui.theme.cpu; "{}REC ", frame)
        } else if self.status.session.is_some() {
            span!(self.ui.theme.success; " ■ done ")
        } else {
            span!(self.ui.theme.secondary; " ○ idle ")
        }
    }

    fn render_usage(&self, area: Rect, buf: &mut Buffer) {
        let [cpu, mem, disk, net] = vertical![==1, ==1, ==1, ==1].areas(area);
        let stats = usage_stats(self.ui, self.samples);
        for (stat, rect) in stats.iter().zip([cpu, mem, disk]) {
            stat.render(rect, buf);
        }
        self.network_line().render(net, buf);
    }

    fn network_line(&self) -> Line<'static> {
        const FRAMES: [&str; 8] = ["⠁", "⠂", "⠄", "⡀", "⢀", "⠠", "⠐", "⠈"];
        let (up, down) = match self.samples.network_rates() {
            Some((up, down)) => (format_rate(up), format_rate(down)),
            None => ("-".to_string(), "-".to_string()),
        };
        match self.samples.latest() {
            Some(latest) => ratatui::macros::line![
                " NET ".fg(self.ui.theme.primary),
                FRAMES[self.ui.step_of_8_in_1_second()].fg(self.ui.theme.secondary),
                format!("  ↑ {}", up).fg(self.ui.theme.cpu),
                format!("  ↓ {}", down).fg(self.ui.theme.memory),
                format!(
                    "  (total {:.2} MB sent, {:.2} MB received)",
                    latest.sample.net_sent as f64 / BYTES_PER_MB,
                    latest.sample.net_recv as f64 / BYTES_PER_MB
                ),
            ],
            None => ratatui::macros::line![" NET ".fg(self.ui.theme.primary), " waiting for data"],
        }
    }

    fn render_processes(&self, area: Rect, buf: &mut Buffer) {
        let [by_cpu, by_mem] = horizontal![*=1, *=1].spacing(1).areas(area);
        let (top_cpu, top_mem) = match self.samples.latest() {
            Some(latest) => (
                latest.sample.top_cpu.as_slice(),
                latest.sample.top_mem.as_slice(),
            ),
            None => (&[][..], &[][..]),
        };
        ProcessTable {
            ranking: Ranking::Cpu,
            processes: top_cpu,
            ui: self.ui,
        }
        .render(by_cpu, buf);
        ProcessTable {
            ranking: Ranking::Memory,
            processes: top_mem,
            ui: self.ui,
        }
        .render(by_mem, buf);
    }
}

/// Bytes per second with a binary unit.
fn format_rate(bytes_per_sec: f64) -> String {
    let magnitude = bytes_per_sec.abs();
    if magnitude >= BYTES_PER_MB {
        format!("{:.2} MB/s", bytes_per_sec / BYTES_PER_MB)
    } else if magnitude >= 1024.0 {
        format!("{:.1} KB/s", bytes_per_sec / 1024.0)
    } else {
        format!("{:.0} B/s", bytes_per_sec)
    }
}

impl<'a> Widget for &mut DashboardWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let [window_rect, log_rect] = vertical![>=5, ==10].areas(area);

        let panel_style = Style::default()
            .bg(self.ui.theme.surface)
            .fg(self.ui.theme.foreground);

        let main_rect = if self.ui.debug {
            let [main_rect, panel_rect] = horizontal![>=5, >=30].areas(window_rect);
            DebugWidget {
                ui: self.ui,
                status: self.status,
            }
            .render(panel_rect, buf);
            main_rect
        } else {
            window_rect
        };

        TuiLoggerSmartWidget::default()
            .style_error(panel_style.fg(self.ui.theme.error))
            .style_debug(panel_style)
            .style_warn(panel_style.fg(self.ui.theme.warning))
            .style_trace(panel_style)
            .style_info(panel_style)
            .style(panel_style)
            .border_style(panel_style.fg(self.ui.theme.foreground))
            .output_separator(':')
            .output_timestamp(Some("%H:%M:%S".to_string()))
            .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
            .output_target(true)
            .output_file(false)
            .output_line(false)
            .state(&self.ui.logger_state)
            .render(log_rect, buf);

        let main_style = Style::default()
            .bg(self.ui.theme.background)
            .fg(self.ui.theme.foreground);
        Block::new().style(main_style).render(main_rect, buf);

        let [header, usage, processes] = vertical![==4, ==4, >=4]
            .spacing(1)
            .margin(1)
            .areas(main_rect);
        self.render_header(header, buf);
        self.render_usage(usage, buf);
        self.render_processes(processes, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn idle() -> RecordingStatus {
        RecordingStatus {
            active: false,
            session: None,
            progress: 0.0,
            samples: 0,
            duration: 300.0,
            report_path: PathBuf::from("report.pdf"),
        }
    }

    fn rendered(buf: &Buffer) -> String {
        let area = buf.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn renders_idle_dashboard_without_samples() {
        let ui = UiState::default();
        let samples = SampleHistory::new(120.0);
        let status = idle();
        let area = Rect::new(0, 0, 100, 40);
        let mut buf = Buffer::empty(area);
        DashboardWidget {
            ui: &ui,
            samples: &samples,
            status: &status,
            host: None,
        }
        .render(area, &mut buf);
        let text = rendered(&buf);
        assert!(text.contains("Not recording"), "{text}");
        assert!(text.contains("waiting for data"), "{text}");
        assert!(text.contains("Top CPU"), "{text}");
    }

    macro_rules! format_rate_tests {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (rate, expected): (f64, &str) = $value;
                    assert_eq!(format_rate(rate), expected);
                }
            )*
        }
    }

    format_rate_tests! {
        bytes: (512.0, "512 B/s"),
        kilobytes: (1536.0, "1.5 KB/s"),
        megabytes: (3.0 * 1024.0 * 1024.0, "3.00 MB/s"),
        negative_after_reset: (-2048.0, "-2.0 KB/s"),
    }

    #[test]
    fn shows_host_and_throughput() {
        let ui = UiState::default();
        let mut samples = SampleHistory::new(120.0);
        for (offset, sent) in [(2.0, 0), (1.0, 2048)] {
            samples.push(crate::metrics::AnnotatedSample {
                sample: crate::metrics::Sample {
                    timestamp: ui.now - offset,
                    net_sent: sent,
                    ..crate::metrics::Sample::default()
                },
                recording_progress: 0.0,
                recording_finished: false,
                report: None,
            });
        }
        let host = HostInfo {
            hostname: "box".to_string(),
            os: "TestOS".to_string(),
            kernel: None,
            cpu_brand: "Test CPU".to_string(),
            cpu_cores: 2,
            uptime_secs: 120,
        };
        let status = idle();
        let area = Rect::new(0, 0, 120, 40);
        let mut buf = Buffer::empty(area);
        DashboardWidget {
            ui: &ui,
            samples: &samples,
            status: &status,
            host: Some(&host),
        }
        .render(area, &mut buf);
        let text = rendered(&buf);
        assert!(text.contains("box | TestOS | Test CPU x2 | up 00h 02m"), "{text}");
        assert!(text.contains("↑ 2.0 KB/s"), "{text}");
        assert!(text.contains("↓ 0 B/s"), "{text}");
    }

    #[test]
    fn shows_recording_progress() {
        let ui = UiState::default();
        let samples = SampleHistory::new(120.0);
        let status = RecordingStatus {
            active: true,
            session: Some(uuid::Uuid::new_v4()),
            progress: 25.0,
            samples: 75,
            ..idle()
        };
        let area = Rect::new(0, 0, 100, 40);
        let mut buf = Buffer::empty(area);
        DashboardWidget {
            ui: &ui,
            samples: &samples,
            status: &status,
            host: None,
        }
        .render(area, &mut buf);
        let text = rendered(&buf);
        assert!(text.contains("REC"), "{text}");
        assert!(text.contains("25.0% (75 samples of 300s)"), "{text}");
    }
}
