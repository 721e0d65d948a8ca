//! ttc-fusion CLI: replay a recording and tabulate time-to-collision estimates.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use ttc_fusion::{
    report, BruteForceMatcher, FusionConfig, ReplaySensors, SensorSet, SweepConfig, SweepRunner,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "ttc-fusion")]
#[command(about = "Estimate time-to-collision from camera keypoints and range-sensor returns")]
#[command(version)]
struct Cli {
    /// Log verbosity.
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,

    /// Emit logs as JSON lines (requires the `tracing` feature).
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the detector/descriptor sweep over a recording.
    Run(RunArgs),

    /// Print the default configuration as JSON.
    DefaultConfig {
        /// Write to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Recording JSON describing the frames.
    #[arg(long)]
    recording: PathBuf,

    /// Fusion config JSON; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Restrict the sweep to one keypoint detector (requires --descriptor).
    #[arg(long, requires = "descriptor")]
    detector: Option<String>,

    /// Restrict the sweep to one descriptor (requires --detector).
    #[arg(long, requires = "detector")]
    descriptor: Option<String>,

    /// Write records as CSV.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write records as JSON.
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Log per-object top-view summaries.
    #[arg(long)]
    visualize: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn init_logging(level: LogLevel, json: bool) -> CliResult<()> {
    #[cfg(feature = "tracing")]
    {
        let _ = tracing_log::LogTracer::init();
        log::set_max_level(level.filter());
        ttc_fusion::core::init_tracing(level.filter(), json);
    }
    #[cfg(not(feature = "tracing"))]
    {
        if json {
            eprintln!("--json needs the `tracing` feature; using plain logs");
        }
        ttc_fusion::core::init_with_level(level.filter())?;
    }
    Ok(())
}

fn run(args: RunArgs) -> CliResult<()> {
    let mut cfg = match &args.config {
        Some(path) => FusionConfig::load_json(path)?,
        None => FusionConfig::default(),
    };
    if let (Some(det), Some(desc)) = (&args.detector, &args.descriptor) {
        cfg.sweep = SweepConfig::single(det, desc);
    }
    if args.visualize {
        cfg.tracking.visualize = true;
    }

    let sensors = ReplaySensors::open(
        &args.recording,
        cfg.detector,
        BruteForceMatcher::new(cfg.matcher),
    )?;
    let frames = sensors.frames();
    log::info!(
        "loaded {} frames from {}",
        frames.len(),
        args.recording.display()
    );

    let runner = SweepRunner::new(cfg.build_tracker()?, SensorSet::uniform(&sensors));
    let records = runner.run(&cfg.sweep.plan(), &frames);

    match (&args.csv, &args.report_json) {
        (None, None) => report::write_csv(&records, std::io::stdout().lock())?,
        (csv, json) => {
            if let Some(path) = csv {
                report::write_csv_file(&records, path)?;
                log::info!("wrote {} records to {}", records.len(), path.display());
            }
            if let Some(path) = json {
                report::write_json_file(&records, path)?;
                log::info!("wrote {} records to {}", records.len(), path.display());
            }
        }
    }
    Ok(())
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.json)?;

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::DefaultConfig { out } => {
            let cfg = FusionConfig::default();
            match out {
                Some(path) => cfg.write_json(&path)?,
                None => println!("{}", cfg.to_json()?),
            }
            Ok(())
        }
    }
}
