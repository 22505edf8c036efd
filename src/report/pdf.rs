//! Single-page A4 rendering of a [`Report`].
//!
//! The page is laid out top to bottom like a document flow: title, timestamp,
//! summary table, trend chart and legend.

use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::report::{Report, TITLE, summary::ChartSeries};

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 72.0;
const FRAME_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const REGULAR: Name<'static> = Name(b"F1");
const BOLD: Name<'static> = Name(b"F2");

const BODY_SIZE: f32 = 10.0;
const HEADING_SIZE: f32 = 14.0;
const TITLE_SIZE: f32 = 24.0;

const COLUMN_WIDTHS: [f32; 4] = [150.0, 100.0, 100.0, 100.0];
const HEADER_ROW_HEIGHT: f32 = 26.0;
const BODY_ROW_HEIGHT: f32 = 18.0;

const CHART_WIDTH: f32 = 400.0;
const CHART_HEIGHT: f32 = 200.0;
const PLOT_X: f32 = 50.0;
const PLOT_Y: f32 = 50.0;
const PLOT_WIDTH: f32 = 300.0;
const PLOT_HEIGHT: f32 = 125.0;

#[derive(Debug, Clone, Copy)]
struct Rgb(f32, f32, f32);

const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
const RED: Rgb = Rgb(1.0, 0.0, 0.0);
const BLUE: Rgb = Rgb(0.0, 0.0, 1.0);
const GREY: Rgb = Rgb(0.5, 0.5, 0.5);
const WHITESMOKE: Rgb = Rgb(0.96, 0.96, 0.96);
const BEIGE: Rgb = Rgb(0.96, 0.96, 0.86);

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Center,
}

/// Encode the report as a complete PDF file.
pub fn render(report: &Report) -> Vec<u8> {
    let mut page = PageFlow::new();
    page.paragraph(TITLE, BOLD, TITLE_SIZE, BLACK, Align::Center);
    page.spacer(20.0);
    let generated = format!(
        "Generated at: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    page.paragraph(&generated, REGULAR, BODY_SIZE, BLACK, Align::Left);
    page.spacer(20.0);

    match &report.summary {
        None => page.paragraph("No data recorded.", REGULAR, BODY_SIZE, BLACK, Align::Left),
        Some(summary) => {
            page.paragraph("1. Summary Statistics", BOLD, HEADING_SIZE, BLACK, Align::Left);
            page.spacer(6.0);
            page.table(&summary.table());
            page.spacer(40.0);
            page.paragraph(
                "2. CPU & Memory Usage Trend",
                BOLD,
                HEADING_SIZE,
                BLACK,
                Align::Left,
            );
            page.spacer(6.0);
            page.chart(&report.chart);
            page.legend();
        }
    }

    assemble(page.finish())
}

fn assemble(content: Vec<u8>) -> Vec<u8> {
    let catalog_id = Ref::new(1);
    let tree_id = Ref::new(2);
    let page_id = Ref::new(3);
    let content_id = Ref::new(4);
    let regular_id = Ref::new(5);
    let bold_id = Ref::new(6);
    let info_id = Ref::new(7);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
    page.parent(tree_id);
    page.contents(content_id);
    page.resources()
        .fonts()
        .pair(REGULAR, regular_id)
        .pair(BOLD, bold_id);
    page.finish();

    pdf.type1_font(regular_id).base_font(Name(b"Helvetica"));
    pdf.type1_font(bold_id).base_font(Name(b"Helvetica-Bold"));
    pdf.document_info(info_id)
        .title(TextStr(TITLE))
        .producer(TextStr("sysmon"));
    pdf.stream(content_id, &content);
    pdf.finish()
}

/// Content stream plus a cursor that moves down the page.
struct PageFlow {
    content: Content,
    cursor: f32,
}

impl PageFlow {
    fn new() -> Self {
        Self {
            content: Content::new(),
            cursor: PAGE_HEIGHT - MARGIN,
        }
    }

    fn finish(self) -> Vec<u8> {
        self.content.finish()
    }

    fn spacer(&mut self, height: f32) {
        self.cursor -= height;
    }

    fn paragraph(&mut self, text: &str, font: Name, size: f32, color: Rgb, align: Align) {
        let leading = size * 1.2;
        let baseline = self.cursor - size;
        let x = match align {
            Align::Left => MARGIN,
            Align::Center => MARGIN + (FRAME_WIDTH - text_width(text, size)) / 2.0,
        };
        self.text(x, baseline, font, size, color, text);
        self.cursor -= leading;
    }

    fn text(&mut self, x: f32, y: f32, font: Name, size: f32, color: Rgb, text: &str) {
        self.content.set_fill_rgb(color.0, color.1, color.2);
        self.content.begin_text();
        self.content.set_font(font, size);
        self.content.next_line(x, y);
        self.content.show(Str(text.as_bytes()));
        self.content.end_text();
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        self.content.set_fill_rgb(color.0, color.1, color.2);
        self.content.rect(x, y, width, height);
        self.content.fill_nonzero();
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32)) {
        self.content.move_to(from.0, from.1);
        self.content.line_to(to.0, to.1);
        self.content.stroke();
    }

    /// Grid table with a grey header row and beige body, text centered.
    fn table(&mut self, rows: &[[String; 4]]) {
        let width: f32 = COLUMN_WIDTHS.iter().sum();
        let left = MARGIN + (FRAME_WIDTH - width) / 2.0;
        let top = self.cursor;

        let mut y = top;
        let mut row_edges = vec![top];
        for (index, row) in rows.iter().enumerate() {
            let (height, font, background, foreground) = if index == 0 {
                (HEADER_ROW_HEIGHT, BOLD, GREY, WHITESMOKE)
            } else {
                (BODY_ROW_HEIGHT, REGULAR, BEIGE, BLACK)
            };
            y -= height;
            self.fill_rect(left, y, width, height, background);
            // Header cells keep the extra space below the text.
            let baseline = if index == 0 {
                y + height - BODY_SIZE - 5.0
            } else {
                y + (height - BODY_SIZE) / 2.0 + 2.0
            };
            let mut x = left;
            for (cell, cell_width) in row.iter().zip(COLUMN_WIDTHS) {
                let cell_x = x + (cell_width - text_width(cell, BODY_SIZE)) / 2.0;
                self.text(cell_x, baseline, font, BODY_SIZE, foreground, cell);
                x += cell_width;
            }
            row_edges.push(y);
        }

        self.content.set_stroke_rgb(BLACK.0, BLACK.1, BLACK.2);
        self.content.set_line_width(1.0);
        for edge in &row_edges {
            self.line((left, *edge), (left + width, *edge));
        }
        let mut x = left;
        self.line((x, top), (x, y));
        for cell_width in COLUMN_WIDTHS {
            x += cell_width;
            self.line((x, top), (x, y));
        }
        self.cursor = y;
    }

    /// CPU (red) and memory (blue) lines on a 0..100 value axis.
    fn chart(&mut self, series: &ChartSeries) {
        let origin_x = MARGIN + (FRAME_WIDTH - CHART_WIDTH) / 2.0;
        let origin_y = self.cursor - CHART_HEIGHT;
        let plot_x = origin_x + PLOT_X;
        let plot_y = origin_y + PLOT_Y;

        self.content.set_stroke_rgb(BLACK.0, BLACK.1, BLACK.2);
        self.content.set_line_width(0.5);
        self.line((plot_x, plot_y), (plot_x, plot_y + PLOT_HEIGHT));
        for tick in (0..=100).step_by(20) {
            let y = plot_y + value_offset(tick as f64);
            self.line((plot_x - 4.0, y), (plot_x, y));
            let label = tick.to_string();
            let x = plot_x - 6.0 - text_width(&label, 8.0);
            self.text(x, y - 3.0, REGULAR, 8.0, BLACK, &label);
        }

        self.polyline(&series.cpu, plot_x, plot_y, RED);
        self.polyline(&series.memory, plot_x, plot_y, BLUE);
        self.cursor = origin_y;
    }

    /// Points sit in the middle of equal-width category slots.
    fn polyline(&mut self, values: &[f64], plot_x: f32, plot_y: f32, color: Rgb) {
        if values.is_empty() {
            return;
        }
        let slot = PLOT_WIDTH / values.len() as f32;
        let point = |i: usize, v: f64| (plot_x + slot * (i as f32 + 0.5), plot_y + value_offset(v));
        self.content.set_stroke_rgb(color.0, color.1, color.2);
        self.content.set_line_width(1.0);
        let (x, y) = point(0, values[0]);
        self.content.move_to(x, y);
        if values.len() == 1 {
            // A lone point still gets a visible mark.
            self.content.line_to(x + 1.0, y);
        }
        for (i, value) in values.iter().enumerate().skip(1) {
            let (x, y) = point(i, *value);
            self.content.line_to(x, y);
        }
        self.content.stroke();
    }

    fn legend(&mut self) {
        let baseline = self.cursor - BODY_SIZE;
        let mut x = MARGIN;
        for (text, color) in [
            ("Red: CPU %", RED),
            (", ", BLACK),
            ("Blue: Memory %", BLUE),
        ] {
            self.text(x, baseline, REGULAR, BODY_SIZE, color, text);
            x += text_width(text, BODY_SIZE);
        }
        self.cursor -= BODY_SIZE * 1.2;
    }
}

fn value_offset(value: f64) -> f32 {
    (value.clamp(0.0, 100.0) / 100.0) as f32 * PLOT_HEIGHT
}

/// Approximate Helvetica advance width, good enough for centering.
fn text_width(text: &str, size: f32) -> f32 {
    let em: f32 = text
        .chars()
        .map(|c| match c {
            ' ' | '.' | ',' | ':' | 'i' | 'j' | 'l' | 'I' | 't' | 'f' | '-' => 0.278,
            '%' | 'M' | 'm' | 'W' | 'w' => 0.833,
            'A'..='Z' => 0.667,
            'r' => 0.333,
            _ => 0.556,
        })
        .sum();
    em * size
}
