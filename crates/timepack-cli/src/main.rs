//! timepack CLI: Command-line interface for timeline event packing

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use timepack_engine::{read_events, timestamp, Config, Event, PackedEvent, Packer, Timeline};
use tracing::debug;

/// Lay out calendar events for a day timeline
#[derive(Parser)]
#[command(name = "timepack")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack events into columns for an event area of the given width
    Pack {
        /// JSON file with an array of events (reads stdin when omitted)
        file: Option<PathBuf>,

        /// Width of the event area in pixels
        #[arg(long)]
        width: f64,

        /// First visible hour; overrides the config
        #[arg(long)]
        day_start: Option<u32>,

        /// Config file
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Print a table instead of JSON
        #[arg(long)]
        table: bool,
    },

    /// Lay out a full timeline view for a screen of the given width
    View {
        /// JSON file with an array of events (reads stdin when omitted)
        file: Option<PathBuf>,

        /// Screen width in pixels, hour sidebar included
        #[arg(long)]
        screen_width: f64,

        /// Config file
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },

    /// Write a default config file
    Init {
        /// Where to write the config
        #[arg(long, default_value = DEFAULT_CONFIG)]
        path: PathBuf,
    },
}

const DEFAULT_CONFIG: &str = "timepack.json";

/// Output of the `view` command.
#[derive(Serialize)]
struct ViewOutput {
    calendar_height: f64,
    event_area_width: f64,
    initial_scroll_offset: Option<f64>,
    events: Vec<PackedEvent>,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Pack {
            file,
            width,
            day_start,
            config,
            table,
        } => {
            cmd_pack(file.as_deref(), width, day_start, &config, table);
        }
        Commands::View {
            file,
            screen_width,
            config,
        } => {
            cmd_view(file.as_deref(), screen_width, &config);
        }
        Commands::Init { path } => {
            cmd_init(&path);
        }
    }
}

/// Install a stderr subscriber when `RUST_LOG` is set.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn cmd_pack(
    file: Option<&Path>,
    width: f64,
    day_start: Option<u32>,
    config_path: &Path,
    table: bool,
) {
    let mut config = load_config(config_path);
    if let Some(hour) = day_start {
        config.day_start = hour;
        if let Err(e) = config.validate() {
            fail(&e);
        }
    }

    let events = load_events(file);
    let packed = Packer::new(config.layout).pack(events, width, f64::from(config.day_start));

    if table {
        print_table(&packed);
    } else {
        print_json(&packed);
    }
}

fn cmd_view(file: Option<&Path>, screen_width: f64, config_path: &Path) {
    let timeline = Timeline::new(load_config(config_path));
    let events = load_events(file);
    let packed = timeline.pack(events, screen_width);

    print_json(&ViewOutput {
        calendar_height: timeline.calendar_height(),
        event_area_width: timeline.event_area_width(screen_width),
        initial_scroll_offset: timeline.initial_scroll_offset(&packed),
        events: packed,
    });
}

fn cmd_init(path: &Path) {
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return;
    }

    match Config::default().save(path) {
        Ok(()) => println!("Created {}", path.display()),
        Err(e) => fail(&e),
    }
}

/// Load the config, falling back to defaults when the default path is absent.
fn load_config(path: &Path) -> Config {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG) {
        debug!(path = %path.display(), "No config file, using defaults");
        return Config::default();
    }
    Config::load(path).unwrap_or_else(|e| fail(&e))
}

fn load_events(file: Option<&Path>) -> Vec<Event> {
    let result = match file {
        Some(path) => File::open(path)
            .map_err(Into::into)
            .and_then(|f| read_events(BufReader::new(f))),
        None => read_events(io::stdin().lock()),
    };
    let events = result.unwrap_or_else(|e| fail(&e));
    debug!(count = events.len(), "Loaded events");
    events
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => fail(&e),
    }
}

fn print_table(packed: &[PackedEvent]) {
    println!(
        "{:>5}  {:<19}  {:<19}  {:>8}  {:>8}  {:>8}  {:>8}",
        "index", "start", "end", "top", "height", "left", "width"
    );
    for p in packed {
        println!(
            "{:>5}  {:<19}  {:<19}  {:>8.1}  {:>8.1}  {:>8.1}  {:>8.1}",
            p.index,
            timestamp::format(&p.event.start),
            timestamp::format(&p.event.end_or_default()),
            p.top,
            p.height,
            p.left,
            p.width,
        );
    }
}

fn fail(error: &dyn std::fmt::Display) -> ! {
    eprintln!("Error: {error}");
    std::process::exit(1);
}
