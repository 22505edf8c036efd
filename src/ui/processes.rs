use crate::{metrics::ProcessInfo, ui::state::UiState};
use ratatui::{buffer::Buffer, layout::Rect, prelude::*, widgets::*};

/// Which figure a process table ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ranking {
    Cpu,
    Memory,
}

impl Ranking {
    fn title(&self) -> &'static str {
        match self {
            Ranking::Cpu => " Top CPU ",
            Ranking::Memory => " Top Memory ",
        }
    }
}

/// A ranked process list.
///
/// ```"not rust"
/// ╭ Top CPU ─────────────────────────────╮
/// │   PID Name                 CPU%  MEM% │
/// │  4211 firefox              37.5   8.1 │
/// ╰──────────────────────────────────────╯
/// ```
pub struct ProcessTable<'a> {
    pub ranking: Ranking,
    pub processes: &'a [ProcessInfo],
    pub ui: &'a UiState,
}

impl ProcessTable<'_> {
    fn row(&self, process: &ProcessInfo) -> Row<'static> {
        let (cpu_style, mem_style) = match self.ranking {
            Ranking::Cpu => (self.ui.theme.cpu, self.ui.theme.foreground),
            Ranking::Memory => (self.ui.theme.foreground, self.ui.theme.memory),
        };
        Row::new(vec![
            Cell::from(process.pid.to_string()),
            Cell::from(process.name.clone()),
            Cell::from(format!("{:.1}", process.cpu_percent)).style(Style::default().fg(cpu_style)),
            Cell::from(format!("{:.1}", process.memory_percent))
                .style(Style::default().fg(mem_style)),
        ])
    }
}

impl Widget for ProcessTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = Block::bordered()
            .title(Span::from(self.ranking.title()).fg(self.ui.theme.primary))
            .border_style(
                Style::default()
                    .bg(self.ui.theme.surface)
                    .fg(self.ui.theme.primary_background),
            )
            .bg(self.ui.theme.surface)
            .border_type(BorderType::Rounded);
        if self.processes.is_empty() {
            let inner = border.inner(area);
            border.render(area, buf);
            let text = Text::from("No processes yet");
            let area = inner.centered(
                Constraint::Length(text.width() as u16),
                Constraint::Length(1),
            );
            text.render(area, buf);
            return;
        }
        let header = Row::new(vec!["PID", "Name", "CPU%", "MEM%"])
            .style(Style::default().fg(self.ui.theme.secondary).bold());
        let rows: Vec<Row> = self.processes.iter().map(|p| self.row(p)).collect();
        let widths = [
            Constraint::Length(7),
            Constraint::Fill(1),
            Constraint::Length(6),
            Constraint::Length(6),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(border)
            .style(Style::default().fg(self.ui.theme.foreground));
        Widget::render(table, area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn lists_processes_in_given_order() {
        let ui = UiState::default();
        let processes = vec![
            ProcessInfo::new(42, "busy".to_string(), 90.0, 1.0),
            ProcessInfo::new(7, "idle".to_string(), 10.0, 2.0),
        ];
        let area = Rect::new(0, 0, 40, 6);
        let mut buf = Buffer::empty(area);
        ProcessTable {
            ranking: Ranking::Cpu,
            processes: &processes,
            ui: &ui,
        }
        .render(area, &mut buf);
        let text = rendered(&buf);
        assert!(text.contains("Top CPU"), "{text}");
        let busy = text.find("busy").unwrap();
        let idle = text.find("idle").unwrap();
        assert!(busy < idle, "{text}");
        assert!(text.contains("90.0"), "{text}");
    }

    #[test]
    fn empty_table_shows_placeholder() {
        let ui = UiState::default();
        let area = Rect::new(0, 0, 40, 5);
        let mut buf = Buffer::empty(area);
        ProcessTable {
            ranking: Ranking::Memory,
            processes: &[],
            ui: &ui,
        }
        .render(area, &mut buf);
        let text = rendered(&buf);
        assert!(text.contains("Top Memory"), "{text}");
        assert!(text.contains("No processes yet"), "{text}");
    }
}
