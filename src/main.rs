use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use courtside::config::AppConfig;
use courtside::events::{Analysis, CategoryFilter};
use courtside::playback::scroll::FixedRowViewport;
use courtside::playback::surface::SimulatedTimeline;
use courtside::playback::{SyncState, Synchronizer};
use courtside::report::chart::BarChart;
use courtside::report::ReportGenerator;
use courtside::session::{FileStore, Session, SessionStore, RESULT_KEY};
use std::path::PathBuf;
use std::rc::Rc;

/// Row height and visible height of the simulated log panel, in pixels.
const LOG_ROW_HEIGHT: f64 = 24.0;
const LOG_PANEL_HEIGHT: f64 = 240.0;

#[derive(Parser)]
#[command(name = "courtside", version, about = "Match replay: shot log, video sync, CSV and PDF reports")]
struct Cli {
    /// Read the match result from this JSON file instead of the session store
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Session directory (overrides config and the XDG default)
    #[arg(long, global = true)]
    session_dir: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a pipeline result in the session
    Load {
        /// Match result JSON file
        file: PathBuf,
    },

    /// Drop the stored result from the session
    Clear,

    /// Show roster, time unit and per-player shot counts
    Stats,

    /// Print the event log
    Log {
        /// Only show this shot type ("all" for everything)
        #[arg(short, long, default_value = "all")]
        shot: String,
    },

    /// Sync the log to a playback position, or seek to a log row
    Seek {
        /// Playback position in seconds
        #[arg(long, required_unless_present = "row", conflicts_with = "row")]
        at: Option<f64>,

        /// Log row to select (event index)
        #[arg(long)]
        row: Option<usize>,
    },

    /// Write the event log and shot summary CSVs
    Export {
        /// Only export this shot type ("all" for everything)
        #[arg(short, long, default_value = "all")]
        shot: String,

        /// Output directory (overrides config)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Generate the PDF match report
    Report {
        /// Output directory (overrides config)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Export CSVs and generate the report
    All {
        /// Output directory (overrides config)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = AppConfig::load();

    // Resolve session directory: CLI > config > XDG default
    let session_dir = cli
        .session_dir
        .or(config.session_dir.clone())
        .unwrap_or_else(courtside::config::default_session_dir);
    log::info!("Session: {}", session_dir.display());
    let mut store = FileStore::new(session_dir);

    let session = match &cli.input {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Session::from_json(&json)
        }
        None => Session::load(&store),
    };

    match cli.command {
        Commands::Load { file } => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let loaded = Session::from_json(&json);
            let Some(result) = loaded.result() else {
                anyhow::bail!("{} is not a valid match result", file.display());
            };
            store.put(RESULT_KEY, &json).context("Failed to store match result")?;
            println!("Loaded {} events from {}", result.events.len(), file.display());
        }

        Commands::Clear => {
            let mut session = session;
            session.clear(&mut store).context("Failed to clear session")?;
            println!("Session cleared");
        }

        Commands::Stats => {
            let Some(analysis) = require_analysis(&session, &config) else {
                return Ok(());
            };
            print_stats(&analysis);
        }

        Commands::Log { shot } => {
            let filter = parse_filter(&shot)?;
            let Some(analysis) = require_analysis(&session, &config) else {
                return Ok(());
            };
            let rows = analysis.log_rows(filter);
            if rows.is_empty() {
                println!("No events.");
            }
            for row in &rows {
                println!("{:>4}  {}", row.index, row.line());
            }
        }

        Commands::Seek { at, row } => {
            let Some(analysis) = require_analysis(&session, &config) else {
                return Ok(());
            };
            run_seek(&analysis, at, row)?;
        }

        Commands::Export { shot, out } => {
            let filter = parse_filter(&shot)?;
            let Some(analysis) = require_analysis(&session, &config) else {
                return Ok(());
            };
            let dir = out.unwrap_or_else(|| config.resolve_output_dir());
            run_export(&analysis, filter, &dir, &config)?;
        }

        Commands::Report { out } => {
            let Some(analysis) = require_analysis(&session, &config) else {
                return Ok(());
            };
            let dir = out.unwrap_or_else(|| config.resolve_output_dir());
            run_report(&analysis, &dir, &config).await?;
        }

        Commands::All { out } => {
            let Some(analysis) = require_analysis(&session, &config) else {
                return Ok(());
            };
            let dir = out.unwrap_or_else(|| config.resolve_output_dir());
            run_export(&analysis, CategoryFilter::All, &dir, &config)?;
            run_report(&analysis, &dir, &config).await?;
        }
    }

    Ok(())
}

/// Normalized view of the session, or print the empty state.
fn require_analysis(session: &Session, config: &AppConfig) -> Option<Analysis> {
    let analysis = session.analysis(config.timestamp_fallback);
    if analysis.is_none() {
        println!("No match result loaded. Run `courtside load <FILE>` or pass --input.");
    }
    analysis
}

fn parse_filter(value: &str) -> Result<CategoryFilter> {
    CategoryFilter::parse(value).with_context(|| format!("Unknown shot type: {value}"))
}

fn print_stats(analysis: &Analysis) {
    println!("Events: {} ({})", analysis.events.len(), analysis.unit.as_str());
    if analysis.roster.is_empty() {
        println!("No players.");
        return;
    }

    print!("{:<16}", "Shot Type");
    for player in &analysis.roster {
        print!("{:>10}", format!("Player {player}"));
    }
    println!();
    println!("{}", "-".repeat(16 + 10 * analysis.roster.len()));
    for (shot, counts) in analysis.stats.iter() {
        print!("{:<16}", shot);
        for count in counts {
            print!("{:>10}", count);
        }
        println!();
    }
}

fn run_seek(analysis: &Analysis, at: Option<f64>, row: Option<usize>) -> Result<()> {
    let mut sync = Synchronizer::from_analysis(analysis);
    let viewport = Rc::new(FixedRowViewport::new(
        (0..analysis.events.len()).collect(),
        LOG_ROW_HEIGHT,
        LOG_PANEL_HEIGHT,
    ));
    sync.set_viewport(viewport.clone());

    let timeline = sync.video_url().map(|url| Rc::new(SimulatedTimeline::new(url)));
    if let Some(timeline) = &timeline {
        sync.bind(timeline.clone());
    }

    match row {
        Some(row) => {
            let time = sync
                .select(row)
                .with_context(|| format!("No event at row {row}"))?;
            println!("Seek to {time:.1}s");
        }
        None => {
            let at = at.unwrap_or_default();
            match &timeline {
                Some(timeline) => timeline.advance_to(at),
                None => sync.on_time_update(at),
            }
        }
    }

    match sync.state() {
        SyncState::NoVideo => println!("Video: none"),
        _ => println!("Video: {}", sync.video_url().unwrap_or_default()),
    }
    match sync.current_index() {
        Some(index) => {
            if let Some(row) = analysis.log_rows(CategoryFilter::All).get(index) {
                println!("Highlighted: {:>4}  {}", row.index, row.line());
            }
            println!("Log scroll offset: {:.0}px", viewport.scroll_top());
        }
        None => println!("No events."),
    }
    Ok(())
}

fn run_export(
    analysis: &Analysis,
    filter: CategoryFilter,
    dir: &std::path::Path,
    config: &AppConfig,
) -> Result<()> {
    let result = courtside::export::export_csv(
        analysis,
        filter,
        dir,
        &config.export.event_log_file,
        &config.export.summary_file,
    )
    .context("CSV export failed")?;
    println!(
        "Exported {} events to {} and summary to {}",
        result.rows,
        result.event_log.display(),
        result.summary.display()
    );
    Ok(())
}

async fn run_report(analysis: &Analysis, dir: &std::path::Path, config: &AppConfig) -> Result<()> {
    let path = dir.join(&config.report.file);
    let generator = ReportGenerator::new(BarChart, config.report.compress);
    generator
        .write_to(analysis, &path)
        .await
        .context("Report generation failed")?;
    println!("Report written to {}", path.display());
    Ok(())
}
