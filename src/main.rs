use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use route_tracker::config::TrackerConfig;
use route_tracker::date_key;
use route_tracker::export_data;
use route_tracker::import_data;
use route_tracker::kv_store::SqliteKvStore;
use route_tracker::location_source::ReplayLocationSource;
use route_tracker::logs;
use route_tracker::map_view::GeoJsonMapView;
use route_tracker::route_selection::RouteSelection;
use route_tracker::route_store::RouteStore;
use route_tracker::tracker::{Clock, FixedClock, SystemClock, Tracker};

#[derive(Parser, Debug)]
#[command(author, version, about = "Record daily GPS routes and render them", long_about = None)]
struct Cli {
    /// Directory holding the route database
    #[arg(long, default_value = ".", value_hint = ValueHint::DirPath)]
    data_dir: PathBuf,

    /// Write rotating log files here instead of logging to stderr
    #[arg(long, value_hint = ValueHint::DirPath)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a GPX/CSV recording as a live position stream and store it
    Track {
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,

        /// Pretend today is this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Render stored routes as GeoJSON
    Show {
        /// today, yesterday, day2, day3 or all
        #[arg(long)]
        select: Option<RouteSelection>,

        /// Pretend today is this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Output file (defaults to stdout)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
    /// List stored days and their number of points
    List,
    /// Export one day as GPX
    Export {
        /// Day to export (YYYY-MM-DD)
        day: String,
        #[arg(value_hint = ValueHint::FilePath)]
        output: PathBuf,
    },
    /// Delete all route data
    Reset {
        #[arg(long, action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// Zip the log files (needs --log-dir)
    ExportLogs {
        #[arg(value_hint = ValueHint::FilePath)]
        output: PathBuf,
    },
}

type CliTracker = Tracker<SqliteKvStore, GeoJsonMapView, ReplayLocationSource, FixedClock>;

fn open_store(data_dir: &Path) -> Result<SqliteKvStore> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data dir {:?}", data_dir))?;
    SqliteKvStore::open(data_dir)
}

// Read-only commands skip the startup cleanup.
fn open_route_store(data_dir: &Path) -> Result<RouteStore<SqliteKvStore>> {
    let store = open_store(data_dir)?;
    Ok(RouteStore::new(
        store,
        TrackerConfig::default().coordinate_filter(),
    ))
}

fn open_tracker(
    data_dir: &Path,
    today: Option<NaiveDate>,
    location_source: ReplayLocationSource,
) -> Result<CliTracker> {
    let config = TrackerConfig::default();
    let store = open_store(data_dir)?;
    let map_view = GeoJsonMapView::new(config.sentinel, config.initial_zoom);
    let clock = FixedClock(today.unwrap_or_else(|| SystemClock.today()));
    let mut tracker = Tracker::new(config, store, map_view, location_source, clock);
    tracker.startup()?;
    Ok(tracker)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Track { input, today } => {
            let samples = import_data::load_samples(&input)?;
            let num_of_samples = samples.len();
            let mut tracker = open_tracker(
                &cli.data_dir,
                today,
                ReplayLocationSource::from_samples(samples),
            )?;
            let session = tracker.record_session();
            tracker.shutdown()?;
            let summary = session?;
            println!(
                "{}: {} samples replayed, {} handled, {} stored",
                tracker.today_key(),
                num_of_samples,
                summary.handled,
                summary.stored
            );
        }
        Command::Show {
            select,
            today,
            output,
        } => {
            let mut tracker = open_tracker(&cli.data_dir, today, ReplayLocationSource::empty())?;
            if let Some(selection) = select {
                tracker.set_selection(selection)?;
            }
            let geojson = serde_json::to_string_pretty(&tracker.map_view().to_geojson())?;
            match output {
                Some(path) => fs::write(path, geojson)?,
                None => writeln!(io::stdout(), "{}", geojson)?,
            }
            tracker.shutdown()?;
        }
        Command::List => {
            let store = open_route_store(&cli.data_dir)?;
            for key in store.date_keys()? {
                println!("{}\t{}", key, store.load(&key).len());
            }
        }
        Command::Export { day, output } => {
            date_key::parse_date_key(&day)?;
            let route = open_route_store(&cli.data_dir)?.load(&day);
            let mut file = File::create(&output)?;
            export_data::export_gpx(&day, &route, &mut file)?;
            println!("exported {} points to {:?}", route.len(), output);
        }
        Command::Reset { yes } => {
            if !yes {
                bail!("refusing to delete all route data without --yes");
            }
            let mut tracker = open_tracker(&cli.data_dir, None, ReplayLocationSource::empty())?;
            tracker.reset_all_data(yes)?;
            tracker.shutdown()?;
            println!("All route data has been cleared.");
        }
        Command::ExportLogs { output } => match &cli.log_dir {
            Some(log_dir) => logs::export(log_dir, output)?,
            None => bail!("--log-dir is required to export logs"),
        },
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let logging = match &cli.log_dir {
        Some(log_dir) => logs::init(log_dir),
        None => env_logger::try_init().map_err(|e| e.into()),
    };
    if let Err(e) = logging {
        eprintln!("failed to initialize logging: {e:?}");
    }
    if let Err(e) = run(cli) {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}
