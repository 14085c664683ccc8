//! # Evolving Event Detection
//!
//! Detects evolving events — groups of entities that become mutually linked
//! or co-active in overlapping time windows — from per-entity edit history
//! dumps, and exports the edits belonging to each detected event.
//!
//! ## Usage
//!
//! ```text
//! # Implicit (burst + similarity) mode over the default data directory
//! flashpoint --data-dir data/debate --output-dir outputs/debate
//!
//! # Explicit (mutual reference) mode with a tighter window
//! flashpoint --mode explicit --delta-days 1 --data-dir data/debate
//! ```
//!
//! Input files are named `edits_<Entity>.json` and hold an array of objects
//! with `timestamp`, `added` and `deleted` fields. One `event_<id>.json`
//! file is written per detected event.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use prettytable::{Cell, Row as PrettyRow, Table};
use std::path::PathBuf;
use tracing::info;

use flashpoint::aggregation::Event;
use flashpoint::edit::load_edits_dir;
use flashpoint::export::write_event_files;
use flashpoint::logging::configure_logging;
use flashpoint::pipeline::{run, GraphMode, PipelineConfig};

#[derive(Parser)]
#[clap(name = "flashpoint", about = "Detect evolving events from entity edit histories")]
struct Cli {
    /// Directory containing edits_<Entity>.json files
    #[clap(short, long, default_value = "data/edits")]
    data_dir: PathBuf,

    /// Directory where per-event edit files are written
    #[clap(short, long, default_value = "outputs")]
    output_dir: PathBuf,

    /// Graph construction mode
    #[clap(short, long, value_enum, default_value_t = Mode::Implicit)]
    mode: Mode,

    /// Max days between mutual references (explicit mode)
    #[clap(long, default_value_t = 2)]
    delta_days: i64,

    /// Burst day percentile (implicit mode)
    #[clap(long, default_value_t = 90.0)]
    burst_percentile: f64,

    /// Minimum added-text similarity on shared burst days (implicit mode)
    #[clap(long, default_value_t = 0.3)]
    similarity_threshold: f64,

    /// Minimum overlap coefficient for merging clusters across periods
    /// (explicit mode)
    #[clap(long, default_value_t = 0.8)]
    gamma: f64,

    /// Smallest cluster worth tracking
    #[clap(long, default_value_t = 3)]
    min_cluster_size: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Explicit,
    Implicit,
}

impl From<Mode> for GraphMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Explicit => GraphMode::Explicit,
            Mode::Implicit => GraphMode::Implicit,
        }
    }
}

fn main() -> Result<()> {
    configure_logging();

    let cli = Cli::parse();
    let config = PipelineConfig {
        mode: cli.mode.into(),
        delta_days: cli.delta_days,
        burst_percentile: cli.burst_percentile,
        similarity_threshold: cli.similarity_threshold,
        gamma: cli.gamma,
        min_cluster_size: cli.min_cluster_size,
    };

    let edits = load_edits_dir(&cli.data_dir)?;
    info!("Running event detection over {} edits", edits.len());

    let events = run(&edits, &config);
    info!("Detected {} evolving events", events.len());

    print_events(&events);

    write_event_files(&events, &edits, &cli.output_dir)?;
    info!("Wrote event files to {}", cli.output_dir.display());

    Ok(())
}

fn print_events(events: &[Event]) {
    let mut table = Table::new();
    table.add_row(PrettyRow::new(vec![
        Cell::new("Event"),
        Cell::new("Start"),
        Cell::new("End"),
        Cell::new("Size"),
        Cell::new("Entities"),
    ]));

    for (event_id, event) in events.iter().enumerate() {
        let entities: Vec<&str> = event.entities.iter().map(String::as_str).collect();
        table.add_row(PrettyRow::new(vec![
            Cell::new(&event_id.to_string()),
            Cell::new(&event.start.to_string()),
            Cell::new(&event.end.to_string()),
            Cell::new(&event.entities.len().to_string()),
            Cell::new(&entities.join(", ")),
        ]));
    }

    table.printstd();
}
