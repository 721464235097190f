//! freeview CLI: replay marker/input scenarios against the anchoring core.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use freeview::scenario::{demo_scenario, replay, Scenario};
use freeview::ViewerConfig;
use log::LevelFilter;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "freeview")]
#[command(about = "Replay marker tracking and gesture scenarios against the viewer core")]
#[command(version)]
struct Cli {
    /// Log verbosity on stderr.
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON scenario and print (or write) the report.
    Replay(ReplayArgs),

    /// Print the default viewer configuration as JSON.
    DefaultConfig,

    /// Print a sample scenario as JSON.
    DemoScenario,
}

#[derive(Debug, Clone, Args)]
struct ReplayArgs {
    /// Scenario file (JSON).
    #[arg(long)]
    scenario: PathBuf,

    /// Viewer configuration (JSON). Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the report. Printed to stdout when omitted.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: LogLevel) -> CliResult<()> {
    freeview::core::init_with_level(level.into())?;
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(level: LogLevel) -> CliResult<()> {
    freeview::core::init_tracing(level.into(), false);
    // Already installed by the subscriber when tracing-subscriber bridges `log`.
    let _ = tracing_log::LogTracer::init();
    log::set_max_level(level.into());
    Ok(())
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level)?;

    match cli.command {
        Commands::Replay(args) => run_replay(&args),
        Commands::DefaultConfig => print_json(&ViewerConfig::default()),
        Commands::DemoScenario => print_json(&demo_scenario()),
    }
}

fn run_replay(args: &ReplayArgs) -> CliResult<()> {
    let scenario = Scenario::load_json(&args.scenario)?;
    let config = match &args.config {
        Some(path) => ViewerConfig::load_json(path)?,
        None => ViewerConfig::default(),
    };

    let report = replay(&scenario, config)?;
    match &args.output {
        Some(path) => {
            report.write_json(path)?;
            eprintln!(
                "wrote {} steps ({} UI events) to {}",
                report.steps.len(),
                report.ui_events.len(),
                path.display()
            );
        }
        None => print_json(&report)?,
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
