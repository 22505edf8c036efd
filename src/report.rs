//! Report generation: reduce a recorded session and render it to a PDF file.

use std::path::Path;

use chrono::{DateTime, Local};
use color_eyre::{Result, eyre::WrapErr};
use log::*;

use crate::metrics::Sample;

pub mod pdf;
pub mod summary;

pub use summary::{ChartSeries, Summary};

pub const TITLE: &str = "System Resource Monitoring Report";

/// Everything the document shows. Apart from `generated_at` this is a pure
/// function of the sample sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub generated_at: DateTime<Local>,
    pub samples: usize,
    pub summary: Option<Summary>,
    pub chart: ChartSeries,
}

impl Report {
    pub fn build(samples: &[Sample], generated_at: DateTime<Local>) -> Self {
        Self {
            generated_at,
            samples: samples.len(),
            summary: Summary::from_samples(samples),
            chart: ChartSeries::from_samples(samples),
        }
    }

    pub fn render(&self) -> Vec<u8> {
        pdf::render(self)
    }
}

/// Build the report for `samples` and write it to `path`, replacing any
/// previous file there.
pub fn generate(samples: &[Sample], path: &Path) -> Result<Report> {
    let report = Report::build(samples, Local::now());
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("creating report directory {}", parent.display()))?;
    }
    std::fs::write(path, report.render())
        .wrap_err_with(|| format!("writing report to {}", path.display()))?;
    info!(
        target: "Report",
        "Wrote report for {} samples ({} chart points) to {}",
        report.samples,
        report.chart.len(),
        path.display()
    );
    Ok(report)
}
