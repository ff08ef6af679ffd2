//! tasktop: live process and memory monitor
//!
//! Run: cargo run -p tasktop-terminal --features cli --bin tasktop

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use tasktop_core::{FilterState, InMemorySettings, Monitor, Sampler, SettingsProvider};
use tasktop_terminal::{
    default_log_file, init_logging, run_interactive, run_once, App, FileSettings, LogTarget,
    OnceOptions, OutputFormat, RunOptions, SysinfoInspector, SysinfoTerminator, TasktopConfig,
    TerminalError,
};

/// Pause between the two headless captures so CPU figures have a baseline.
const WARMUP: Duration = Duration::from_millis(200);

/// tasktop - live process and memory monitor
#[derive(Parser)]
#[command(name = "tasktop", version, about, long_about = None)]
struct Cli {
    /// Refresh interval in milliseconds (overrides the config file)
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Path to custom config file (YAML)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Dump default configuration to stdout and exit
    #[arg(long)]
    dump_config: bool,

    /// Capture once, print the table to stdout and exit
    #[arg(long)]
    once: bool,

    /// With --once, print JSON instead of a table
    #[arg(long, requires = "once")]
    json: bool,

    /// Table width for --once
    #[arg(long, default_value = "120")]
    width: u16,

    /// Rows to show after filtering (0 = all; overrides the config file)
    #[arg(short = 'n', long)]
    rows: Option<usize>,

    /// Hide system processes for this run
    #[arg(long)]
    hide_system: bool,

    /// Hide inaccessible processes for this run
    #[arg(long)]
    hide_inaccessible: bool,

    /// Only show processes whose name contains this text (--once only)
    #[arg(long, value_name = "TEXT", requires = "once")]
    search: Option<String>,

    /// Log filter when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Log file for interactive mode
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Disable colors (use plain text)
    #[arg(long)]
    no_color: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.dump_config {
        print!("{}", TasktopConfig::default_yaml());
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tasktop: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), TerminalError> {
    // Headless output owns stdout; the interactive UI owns the whole
    // terminal, so its logs go to a file.
    let log_target = if cli.once {
        LogTarget::Stderr
    } else {
        LogTarget::File(cli.log_file.clone().unwrap_or_else(default_log_file))
    };
    init_logging(&log_target, cli.log_level.as_deref())?;

    let mut config = match &cli.config {
        Some(path) if path.exists() => TasktopConfig::load_from_file(path).unwrap_or_else(|err| {
            eprintln!("tasktop: {err}, using defaults");
            TasktopConfig::default()
        }),
        Some(_) => TasktopConfig::default(),
        None => TasktopConfig::load(),
    };
    if let Some(refresh) = cli.refresh {
        config.refresh_ms = refresh;
    }
    if let Some(rows) = cli.rows {
        config.row_limit = rows;
    }
    // Overrides hold for this run only; checkbox write-back edits just the
    // toggled key in the file.
    config.hide_system_processes |= cli.hide_system;
    config.hide_inaccessible_processes |= cli.hide_inaccessible;
    let config = config.normalized();

    if cli.once {
        return headless(cli, &config);
    }

    let settings = match &cli.config {
        Some(path) => Some(FileSettings::new(path, &config)),
        None => FileSettings::discover(&config),
    };
    match settings {
        Some(settings) => interactive(cli, &config, settings),
        None => {
            tracing::warn!("no config directory, filter toggles will not be saved");
            let settings = InMemorySettings {
                hide_system: config.hide_system_processes,
                hide_inaccessible: config.hide_inaccessible_processes,
            };
            interactive(cli, &config, settings)
        }
    }
}

fn headless(cli: &Cli, config: &TasktopConfig) -> Result<(), TerminalError> {
    let options = OnceOptions {
        filter: FilterState {
            hide_system_processes: config.hide_system_processes,
            hide_inaccessible_processes: config.hide_inaccessible_processes,
            search_query: cli.search.clone().unwrap_or_default(),
        },
        row_limit: config.row_limit,
        format: if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        },
        warmup: WARMUP,
        width: cli.width,
    };
    let mut sampler = Sampler::new(SysinfoInspector::new());
    run_once(&mut sampler, &options, &mut io::stdout().lock())
}

fn interactive<S: SettingsProvider>(
    cli: &Cli,
    config: &TasktopConfig,
    settings: S,
) -> Result<(), TerminalError> {
    let monitor = Monitor::new(settings, SysinfoTerminator::new(), config.row_limit);
    let app = App::new(monitor, !cli.no_color);
    let options = RunOptions {
        refresh: config.refresh_interval(),
        poll: config.poll_interval(),
    };
    run_interactive(app, Sampler::new(SysinfoInspector::new()), options)
}
