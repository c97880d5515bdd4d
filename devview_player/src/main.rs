//! DevView CLI
//!
//! Load recorded device positions from CSV and play them back one second
//! per tick.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use devview_core::{
    ingest_csv_file, DayRollover, FrameSink, JsonLinesSink, LogSink, PlaybackConfig,
    RenderCycle, SqliteStore, Timestamp, TimelineBounds,
};
use devview_env::{PlaybackContext, TokioContext};
use devview_player::{PlaybackRunner, PlaybackSummary, VirtualContext};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// DevView - playback of recorded 3D device positions
#[derive(Parser, Debug)]
#[command(name = "devview")]
#[command(about = "Replay recorded device positions from a SQLite store", long_about = None)]
struct Cli {
    /// Verbose output (debug level; RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bulk-load a CSV file into the position table
    Load {
        /// SQLite database file (created if missing)
        #[arg(long, default_value = "database.sqlite")]
        db: PathBuf,

        /// CSV file: header line, then device_id,x_pos,y_pos,z_pos,device_type,time
        #[arg(default_value = "data/Rounded_Device_Movement_Data.csv")]
        csv: PathBuf,
    },

    /// Play the recorded timeline back, one second per tick
    Play(PlayArgs),

    /// Print timeline bounds, or the frame at one timestamp, as JSON
    Inspect {
        /// SQLite database file
        #[arg(long, default_value = "database.sqlite")]
        db: PathBuf,

        /// Timestamp to render (YYYY-MM-DD HH:MM:SS)
        #[arg(long)]
        at: Option<String>,
    },
}

#[derive(Args, Debug)]
struct PlayArgs {
    /// SQLite database file
    #[arg(long, default_value = "database.sqlite")]
    db: PathBuf,

    /// Timer period in milliseconds
    #[arg(short, long, default_value = "1000")]
    period_ms: u64,

    /// Stop after this many ticks (default: run until quit)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Display surface
    #[arg(short, long, value_enum, default_value = "log")]
    frontend: Frontend,

    /// Save the Rerun stream to this .rrd file instead of spawning a viewer
    #[arg(long)]
    rerun_save: Option<String>,

    /// Table rows per page
    #[arg(long, default_value = "10")]
    page_size: usize,

    /// Advance the date when the clock passes midnight
    #[arg(long)]
    advance_date: bool,

    /// Use a virtual clock: render ticks back to back without waiting
    #[arg(long)]
    no_wait: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Frontend {
    /// Clock label and device counts as log lines
    Log,
    /// One JSON document per frame on stdout
    Json,
    /// Terminal dashboard (requires the `dashboard` feature)
    Dashboard,
    /// Rerun viewer (requires the `visualization` feature)
    Rerun,
}

impl PlayArgs {
    fn config(&self) -> PlaybackConfig {
        PlaybackConfig {
            period: Duration::from_millis(self.period_ms),
            page_size: self.page_size,
            day_rollover: if self.advance_date {
                DayRollover::AdvanceDate
            } else {
                DayRollover::WrapWithinDay
            },
            ..PlaybackConfig::default()
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging (stderr keeps stdout free for JSON output)
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Load { db, csv } => load(db, csv),
        Command::Play(args) => play(args),
        Command::Inspect { db, at } => inspect(db, at),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn load(db: PathBuf, csv: PathBuf) -> CliResult<()> {
    let mut store = SqliteStore::open(&db)?;
    let report = ingest_csv_file(&mut store, &csv)?;
    info!(
        rows = report.rows_inserted,
        db = %db.display(),
        "✓ load complete"
    );
    Ok(())
}

fn inspect(db: PathBuf, at: Option<String>) -> CliResult<()> {
    let store = SqliteStore::open_read_only(&db)?;
    let output = inspect_json(store, at.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Timeline bounds and counts, or the full frame at `at` when given.
fn inspect_json(store: SqliteStore, at: Option<&str>) -> CliResult<serde_json::Value> {
    if let Some(text) = at {
        let time: Timestamp = text.parse()?;
        let cycle = RenderCycle::new(store, &PlaybackConfig::default())?;
        return Ok(serde_json::to_value(cycle.frame_at(0, time)?)?);
    }

    let samples = store.sample_count()?;
    let (start, end) = if samples == 0 {
        (None, None)
    } else {
        (
            Some(store.min_time()?.to_string()),
            Some(store.max_time()?.to_string()),
        )
    };
    Ok(serde_json::json!({
        "samples": samples,
        "timestamps": store.timeline_len()?,
        "start_time": start,
        "end_time": end,
    }))
}

fn play(args: PlayArgs) -> CliResult<()> {
    let config = args.config();
    let store = SqliteStore::open_read_only(&args.db)?;
    let cycle = RenderCycle::new(store, &config)?;
    info!(
        db = %args.db.display(),
        start = %cycle.current(),
        frontend = ?args.frontend,
        "session opened"
    );

    let summary = match args.frontend {
        Frontend::Log => run_blocking(&args, cycle, &config, LogSink)?,
        Frontend::Json => {
            run_blocking(&args, cycle, &config, JsonLinesSink::new(std::io::stdout()))?
        }
        Frontend::Dashboard => run_dashboard(&args, cycle, &config)?,
        Frontend::Rerun => run_rerun(&args, cycle, &config)?,
    };

    info!(
        ticks = summary.ticks,
        last_time = %summary.last_time,
        elapsed_s = summary.elapsed.as_secs_f64(),
        "session closed"
    );
    Ok(())
}

/// Run playback to completion on a runtime owned by the calling thread.
fn run_blocking(
    args: &PlayArgs,
    cycle: RenderCycle<SqliteStore>,
    config: &PlaybackConfig,
    sink: impl FrameSink + Send + 'static,
) -> CliResult<PlaybackSummary> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let summary = if args.no_wait {
        rt.block_on(drive(VirtualContext::shared(), args.ticks, cycle, config, sink))?
    } else {
        rt.block_on(drive(TokioContext::shared(), args.ticks, cycle, config, sink))?
    };
    Ok(summary)
}

async fn drive<Ctx: PlaybackContext>(
    ctx: Arc<Ctx>,
    ticks: Option<u64>,
    cycle: RenderCycle<SqliteStore>,
    config: &PlaybackConfig,
    sink: impl FrameSink + Send + 'static,
) -> Result<PlaybackSummary, devview_core::PlaybackError> {
    let mut runner = PlaybackRunner::new(ctx, cycle, config.period).with_sink(sink);
    if let Some(ticks) = ticks {
        runner = runner.with_max_ticks(ticks);
    }
    runner.run().await
}

#[cfg(feature = "dashboard")]
fn run_dashboard(
    args: &PlayArgs,
    cycle: RenderCycle<SqliteStore>,
    config: &PlaybackConfig,
) -> CliResult<PlaybackSummary> {
    use devview_core::dashboard::{frame_channel, PlaybackDashboard};

    let (sink, rx) = frame_channel();
    let ticks = args.ticks;
    let no_wait = args.no_wait;
    let config = config.clone();

    // Playback on its own thread; the terminal UI owns the main thread
    let playback = std::thread::spawn(move || -> Result<PlaybackSummary, String> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| e.to_string())?;
        let result = if no_wait {
            rt.block_on(drive(VirtualContext::shared(), ticks, cycle, &config, sink))
        } else {
            rt.block_on(drive(TokioContext::shared(), ticks, cycle, &config, sink))
        };
        result.map_err(|e| e.to_string())
    });

    PlaybackDashboard::new(rx).run()?;

    match playback.join() {
        Ok(result) => Ok(result?),
        Err(_) => Err("playback thread panicked".into()),
    }
}

#[cfg(not(feature = "dashboard"))]
fn run_dashboard(
    _args: &PlayArgs,
    _cycle: RenderCycle<SqliteStore>,
    _config: &PlaybackConfig,
) -> CliResult<PlaybackSummary> {
    Err("terminal dashboard not available (compile with --features dashboard)".into())
}

#[cfg(feature = "visualization")]
fn run_rerun(
    args: &PlayArgs,
    cycle: RenderCycle<SqliteStore>,
    config: &PlaybackConfig,
) -> CliResult<PlaybackSummary> {
    use devview_core::visualization::RerunVisualizer;

    let visualizer = match &args.rerun_save {
        Some(path) => {
            info!(path = %path, "saving Rerun stream");
            RerunVisualizer::new_to_file("devview", path)?
        }
        None => RerunVisualizer::new("devview")?,
    };
    run_blocking(args, cycle, config, visualizer)
}

#[cfg(not(feature = "visualization"))]
fn run_rerun(
    _args: &PlayArgs,
    _cycle: RenderCycle<SqliteStore>,
    _config: &PlaybackConfig,
) -> CliResult<PlaybackSummary> {
    Err("Rerun visualization not available (compile with --features visualization)".into())
}
