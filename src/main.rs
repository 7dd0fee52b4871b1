// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use log::{error, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use clap::{Args, Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use subalign::app_config::{Config, LogLevel, PartitionStrategy};
use subalign::app_controller::{Controller, OffsetOutcome};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for PartitionStrategy to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPartitionStrategy {
    Gaps,
    Components,
}

impl From<CliPartitionStrategy> for PartitionStrategy {
    fn from(cli_strategy: CliPartitionStrategy) -> Self {
        match cli_strategy {
            CliPartitionStrategy::Gaps => PartitionStrategy::Gaps,
            CliPartitionStrategy::Components => PartitionStrategy::Components,
        }
    }
}

/// Options shared by every subcommand
#[derive(Args, Debug)]
struct GlobalArgs {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "subalign.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long, global = true)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long, global = true)]
    target_language: Option<String>,

    /// Keep caption text as is instead of stripping markup and sound descriptions
    #[arg(long, global = true)]
    no_sterilize: bool,
}

/// A source and a target caption file
#[derive(Args, Debug)]
struct TrackPair {
    /// Source language SRT file
    #[arg(value_name = "SOURCE")]
    source: PathBuf,

    /// Target language SRT file
    #[arg(value_name = "TARGET")]
    target: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Align two caption files into sentence pairs
    Align {
        #[command(flatten)]
        tracks: TrackPair,

        /// Output file (defaults to SOURCE with an .aligned extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only write pairs whose sides are both longer than this many characters
        #[arg(long)]
        min_length: Option<usize>,
    },

    /// Write .sent and .sent-index files for an SRT file or every SRT under a directory
    Sentences {
        /// SRT file or directory
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,

        /// Skip the .sent-index file
        #[arg(long)]
        no_index: bool,

        /// Films processed at the same time
        #[arg(short, long, default_value_t = 4)]
        jobs: usize,
    },

    /// Partition both files and write sentence, index and overlap files per side
    Overlaps {
        #[command(flatten)]
        tracks: TrackPair,

        /// Partitioning strategy
        #[arg(long, value_enum)]
        strategy: Option<CliPartitionStrategy>,

        /// Minimum silence between partitions, in seconds
        #[arg(short, long)]
        gap: Option<f64>,

        /// Longest run of consecutive sentences to join
        #[arg(short, long)]
        num_overlaps: Option<usize>,

        /// Merge partitions ending in a trailing sentence when closer than this many seconds
        #[arg(long)]
        merge_ellipsized: Option<f64>,
    },

    /// Split both files at long silences into numbered SRT files
    Split {
        #[command(flatten)]
        tracks: TrackPair,

        /// Minimum silence to split at, in seconds
        #[arg(short, long)]
        gap: Option<f64>,

        /// Cut into this many near-equal parts, each ending at a silence
        #[arg(short, long)]
        parts: Option<usize>,
    },

    /// Estimate the timing drift between two files and delay the early one
    FixOffset {
        #[command(flatten)]
        tracks: TrackPair,

        /// Report the correction without rewriting any file
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate shell completions for subalign
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// subalign - sentence alignment of subtitle tracks
///
/// Aligns the captions of two languages for the same film into sentence pairs
/// for parallel corpora.
#[derive(Parser, Debug)]
#[command(name = "subalign")]
#[command(version)]
#[command(about = "Align subtitle tracks of two languages into sentence pairs")]
#[command(long_about = "subalign matches the sentences of two subtitle files of the same film by time overlap.

EXAMPLES:
    subalign align film.en.srt film.es.srt            # Write film.en.aligned
    subalign sentences /corpus/ --jobs 8              # .sent/.sent-index for every SRT
    subalign overlaps film.en.srt film.es.srt -n 4    # Sentence and overlap files per side
    subalign split film.en.srt film.es.srt -g 10      # film.en-001.srt, film.es-001.srt, ...
    subalign split film.en.srt film.es.srt -p 4       # Four parts ending at silences
    subalign fix-offset film.en.srt film.es.srt       # Delay the early track
    subalign completions bash > subalign.bash         # Generate bash completions

CONFIGURATION:
    Configuration is stored in subalign.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

// @struct: Custom logger implementation
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Tag and ANSI color for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "1;31"),
            Level::Warn => ("WARN ", "1;33"),
            Level::Info => ("INFO ", "1;32"),
            Level::Debug => ("DEBUG", "1;36"),
            Level::Trace => ("TRACE", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (tag, color) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                color, now, tag, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Load the config file and apply command line overrides
fn load_config(global: &GlobalArgs) -> Result<Config> {
    let mut config = Config::load_or_create(&global.config_path)?;

    if let Some(level) = &global.log_level {
        config.log_level = level.clone().into();
    }
    if let Some(source_language) = &global.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &global.target_language {
        config.target_language = target_language.clone();
    }
    if global.no_sterilize {
        config.alignment.sterilize = false;
    }

    log::set_max_level(config.log_level.to_level_filter());
    Ok(config)
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "subalign", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = load_config(&cli.global)?;

    match cli.command {
        Commands::Completions { .. } => {}
        Commands::Align { tracks, output, min_length } => {
            if let Some(min_length) = min_length {
                config.alignment.min_pair_length = min_length;
            }
            let controller = Controller::with_config(config)?;
            controller.run_align(&tracks.source, &tracks.target, output)?;
        }
        Commands::Sentences { input_path, no_index, jobs } => {
            let controller = Controller::with_config(config)?;
            controller.run_sentences(input_path, !no_index, jobs).await?;
        }
        Commands::Overlaps { tracks, strategy, gap, num_overlaps, merge_ellipsized } => {
            if let Some(strategy) = strategy {
                config.partitioning.strategy = strategy.into();
            }
            if let Some(gap) = gap {
                config.partitioning.gap_threshold_secs = gap;
            }
            if let Some(num_overlaps) = num_overlaps {
                config.partitioning.num_overlaps = num_overlaps;
            }
            if let Some(merge_ellipsized) = merge_ellipsized {
                config.partitioning.merge_ellipsized_secs = merge_ellipsized;
            }
            let controller = Controller::with_config(config)?;
            controller.run_overlaps(&tracks.source, &tracks.target)?;
        }
        Commands::Split { tracks, gap, parts } => {
            let controller = Controller::with_config(config)?;
            controller.run_split(&tracks.source, &tracks.target, gap, parts)?;
        }
        Commands::FixOffset { tracks, dry_run } => {
            let controller = Controller::with_config(config)?;
            match controller.run_fix_offset(&tracks.source, &tracks.target, dry_run)? {
                OffsetOutcome::WithinTolerance(estimate) => {
                    info!("No correction needed ({:.3}s)", estimate.offset_secs());
                }
                OffsetOutcome::Corrected { file, estimate } | OffsetOutcome::DryRun { file, estimate } => {
                    info!("{}: {:.3}s from {} samples", file.display(), estimate.offset_secs(), estimate.samples);
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger with info level; the config may raise or lower it
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();
    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
