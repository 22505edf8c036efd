use std::fmt::Debug;

use crate::{history::SampleHistory, ui::state::UiState};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    macros::*,
    prelude::*,
    style::Stylize,
    widgets::*,
};

/// One usage figure with its recent history as a sparkline.
///
/// ```"not rust"
///  ____▂▂▃▅▇█▇▅▃▂▂▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁▁ CPU:    37.5%
/// ```
#[derive(Debug)]
pub struct SingleStat<'a> {
    name: &'static str,
    history: Vec<f64>,
    timestamps: Vec<f64>,
    window: f64,
    color: Color,
    ui: &'a UiState,
}

/// The CPU, memory and disk lines, all on a 0..100 scale.
pub fn usage_stats<'a>(ui: &'a UiState, samples: &SampleHistory) -> [SingleStat<'a>; 3] {
    let stat = |name, color, metric: fn(&crate::metrics::AnnotatedSample) -> f64| {
        let (timestamps, history) = samples.series(metric);
        SingleStat {
            name,
            history,
            timestamps,
            window: samples.window(),
            color,
            ui,
        }
    };
    [
        stat("CPU", ui.theme.cpu, |s| s.sample.cpu_percent),
        stat("MEM", ui.theme.memory, |s| s.sample.memory_percent),
        stat("DISK", ui.theme.disk, |s| s.sample.disk_percent),
    ]
}

impl SingleStat<'_> {
    fn current(&self) -> f64 {
        self.history.last().copied().unwrap_or_default()
    }
}

impl<'a> Widget for &SingleStat<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [_, history, _, label, current, _] =
            horizontal![==1, *=1, ==1, ==6, ==8, ==2].areas(area);
        Text::from(format!("{}:", self.name)).render(label, buf);
        let current_value = self.current();
        ratatui::macros::line![
            span![format!("{:.1}", current_value)].fg(self.ui.theme.usage(current_value)),
            span![format!("{:<2}", "%")].fg(self.ui.theme.primary_background)
        ]
        .alignment(Alignment::Right)
        .render(current, buf);
        let resampled: Vec<Option<u64>> = crate::resample::resample(
            &self.history,
            &self.timestamps,
            self.ui.now - self.window,
            self.ui.now,
            history.width as usize,
        )
        .iter()
        .map(|o| o.map(|v| v.trunc() as u64))
        .collect();
        Sparkline::default()
            .data(&resampled)
            .max(100)
            .absent_value_symbol("_")
            .fg(self.color)
            .render(history, buf);
    }
}
