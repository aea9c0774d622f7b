//! Flat CSV exports of the normalized match data.
//!
//! Fields are comma-joined without quoting. A label containing a comma
//! corrupts its row; downstream consumers read the raw format, so this is
//! left as is.

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::events::{Analysis, CategoryFilter, PlayerStats};

pub const EVENT_LOG_FILE: &str = "event_logs.csv";
/// Alternative event-log file name used by the match view.
pub const MATCH_EVENT_LOG_FILE: &str = "match_event_logs.csv";
pub const SUMMARY_FILE: &str = "shot_summary.csv";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

fn writer<W: Write>(out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out)
}

/// `Time (s),Shot Type,Player ID`, one row per event passing `filter`.
pub fn write_event_log<W: Write>(analysis: &Analysis, filter: CategoryFilter, out: W) -> Result<usize> {
    let mut w = writer(out);
    w.write_record(["Time (s)", "Shot Type", "Player ID"])?;
    let rows = analysis.log_rows(filter);
    for row in &rows {
        w.write_record([row.time_text(), row.label.clone(), row.track_id.to_string()])?;
    }
    w.flush()?;
    Ok(rows.len())
}

/// `Shot Type,Player <id>...`, one row per shot type in taxonomy order.
pub fn write_summary<W: Write>(stats: &PlayerStats, roster: &[i64], out: W) -> Result<()> {
    let mut w = writer(out);
    let header: Vec<String> = std::iter::once("Shot Type".to_string())
        .chain(roster.iter().map(|id| format!("Player {id}")))
        .collect();
    w.write_record(&header)?;
    for (shot, counts) in stats.iter() {
        let record: Vec<String> = std::iter::once(shot.to_string())
            .chain(counts.iter().map(u32::to_string))
            .collect();
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}

pub fn event_log_csv(analysis: &Analysis, filter: CategoryFilter) -> Result<String> {
    let mut buf = Vec::new();
    write_event_log(analysis, filter, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn summary_csv(analysis: &Analysis) -> Result<String> {
    let mut buf = Vec::new();
    write_summary(&analysis.stats, &analysis.roster, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Files written by [`export_csv`].
pub struct ExportResult {
    pub event_log: PathBuf,
    pub summary: PathBuf,
    pub rows: usize,
}

/// Write both CSV exports into `dir`.
pub fn export_csv(
    analysis: &Analysis,
    filter: CategoryFilter,
    dir: &Path,
    event_log_name: &str,
    summary_name: &str,
) -> Result<ExportResult> {
    std::fs::create_dir_all(dir)?;

    let event_log = dir.join(event_log_name);
    let rows = write_event_log(analysis, filter, std::fs::File::create(&event_log)?)?;
    log::info!("Wrote {} ({} rows)", event_log.display(), rows);

    let summary = dir.join(summary_name);
    write_summary(&analysis.stats, &analysis.roster, std::fs::File::create(&summary)?)?;
    log::info!("Wrote {}", summary.display());

    Ok(ExportResult {
        event_log,
        summary,
        rows,
    })
}
