pub mod chart;
pub mod layout;
pub mod markup;
pub mod pdf;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::events::Analysis;
use chart::ChartSource;

pub const REPORT_FILE: &str = "match_report.pdf";
pub const REPORT_TITLE: &str = "Match Report";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("A report is already being generated")]
    Busy,
    #[error("Chart rasterization failed: {0}")]
    Chart(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Marks a generation in flight; releases the generator when dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Builds the PDF report: awaits the chart snapshot, then lays out and
/// encodes synchronously. One generation at a time; overlapping calls get
/// [`ReportError::Busy`].
pub struct ReportGenerator<C> {
    chart: C,
    compress: bool,
    busy: AtomicBool,
}

impl<C: ChartSource> ReportGenerator<C> {
    pub fn new(chart: C, compress: bool) -> Self {
        Self {
            chart,
            compress,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<InFlight<'_>, ReportError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ReportError::Busy)?;
        Ok(InFlight(&self.busy))
    }

    /// Generate the report as PDF bytes.
    pub async fn generate(&self, analysis: &Analysis) -> Result<Vec<u8>, ReportError> {
        let _in_flight = self.begin()?;

        let snapshot = self.chart.snapshot(analysis).await?;
        if snapshot.is_none() {
            log::debug!("No chart available, skipping chart block");
        }

        let doc = layout::layout(analysis, snapshot.as_ref());
        let bytes = pdf::encode(&doc, &pdf::DocInfo::new(REPORT_TITLE), self.compress)?;
        log::info!("Generated report: {} pages, {} bytes", doc.pages.len(), bytes.len());
        Ok(bytes)
    }

    /// Generate the report and write it to `path`.
    pub async fn write_to(&self, analysis: &Analysis, path: &Path) -> Result<(), ReportError> {
        let bytes = self.generate(analysis).await?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }
}
