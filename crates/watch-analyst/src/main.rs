//! CLI entry point for the directory watcher and one-off analyses.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use watch_analyst::ai::{InferenceClient, OllamaClient, OllamaConfig};
use watch_analyst::analyzer::read_text;
use watch_analyst::profiler::correlation::DEFAULT_THRESHOLD;
use watch_analyst::utils::file_name;
use watch_analyst::{
    AppConfig, BasicStats, CancellationToken, ConfigError, CorrelationMethod, DirectoryWatcher,
    FileMetadata, FileProcessor, OutlierMethod, ReportWriter, TextAnalyzer, detect_outliers,
    extract_basic_stats, file_metadata, load_table, significant_correlations,
};

/// Configuration file used when `--config` is not given.
const DEFAULT_CONFIG_PATH: &str = "config/settings.yaml";

/// CLI-compatible correlation method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliCorrelationMethod {
    /// Linear correlation
    Pearson,
    /// Rank correlation
    Spearman,
}

impl From<CliCorrelationMethod> for CorrelationMethod {
    fn from(cli: CliCorrelationMethod) -> Self {
        match cli {
            CliCorrelationMethod::Pearson => CorrelationMethod::Pearson,
            CliCorrelationMethod::Spearman => CorrelationMethod::Spearman,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Watch a directory and analyze new tabular files with a local model",
    long_about = "Watches a directory for new CSV, Parquet or Excel files and asks a locally \
                  hosted Ollama model for an analysis and recommendations.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  WATCH_ANALYST_MODEL       Overrides model_settings.model_name\n  \
                  WATCH_ANALYST_BASE_URL    Overrides model_settings.base_url\n\n\
                  EXAMPLES:\n  \
                  # Watch the configured directory until Ctrl+C\n  \
                  watch-analyst\n\n  \
                  # Analyze one file and print the recommendations as JSON\n  \
                  watch-analyst analyze data/umsatz.csv --json\n\n  \
                  # Statistics, outliers and correlations without a model call\n  \
                  watch-analyst profile data/umsatz.csv --method spearman"
)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch the configured directory for new files (default)
    Watch,

    /// Analyze a single file and write both outputs
    Analyze {
        file: PathBuf,

        /// Print the recommendations document (or the error record) as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print metadata, statistics, outliers and correlations as JSON
    Profile {
        file: PathBuf,

        /// Minimum absolute correlation to report
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,

        #[arg(long, value_enum, default_value = "pearson")]
        method: CliCorrelationMethod,
    },

    /// Structured summary of a text document
    Document { file: PathBuf },

    /// Code review of a source file
    Review { file: PathBuf },

    /// Short summary of a text file
    Summarize { file: PathBuf },

    /// Compare two text files
    Compare { first: PathBuf, second: PathBuf },
}

impl Command {
    /// Commands whose stdout must contain nothing but JSON.
    fn json_output(&self) -> bool {
        matches!(self, Command::Analyze { json: true, .. } | Command::Profile { .. })
    }
}

#[derive(Serialize)]
struct ProfileReport {
    metadata: FileMetadata,
    basic_stats: BasicStats,
    outliers: BTreeMap<String, Vec<usize>>,
    correlations: Vec<CorrelationEntry>,
}

#[derive(Serialize)]
struct CorrelationEntry {
    first: String,
    second: String,
    coefficient: f64,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is disabled so stdout only carries JSON.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Load the configuration, falling back to defaults only for the implicit path.
fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let config = match explicit {
        Some(path) => AppConfig::load(path)?,
        None => match AppConfig::load(Path::new(DEFAULT_CONFIG_PATH)) {
            Ok(config) => config,
            Err(ConfigError::NotFound(path)) => {
                warn!("{} not found, using defaults", path.display());
                AppConfig::default()
            }
            Err(e) => return Err(e.into()),
        },
    };
    Ok(config.with_env_overrides()?)
}

fn build_client(config: &AppConfig) -> Result<Arc<dyn InferenceClient>> {
    let client = OllamaClient::with_config(OllamaConfig::from(&config.model_settings))?;
    Ok(Arc::new(client))
}

fn run_watch(config: &AppConfig) -> Result<()> {
    config
        .ensure_directories()
        .context("Failed to create watch/output directories")?;

    let client = build_client(config)?;
    let processor = FileProcessor::new(client, ReportWriter::new(&config.output_directory));

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("Failed to install Ctrl+C handler")?;

    info!("Watch directory: {}", config.watch_directory.display());
    info!("Output directory: {}", config.output_directory.display());
    info!("Press Ctrl+C to stop");

    DirectoryWatcher::new(&config.watch_directory, processor).run(&token)?;
    Ok(())
}

fn run_analyze(config: &AppConfig, file: &Path, json: bool) -> Result<()> {
    config
        .ensure_directories()
        .context("Failed to create watch/output directories")?;

    let processor = FileProcessor::new(
        build_client(config)?,
        ReportWriter::new(&config.output_directory),
    );

    match processor.process(file) {
        Ok(output) => {
            if json {
                println!("{}", std::fs::read_to_string(&output.recommendations_path)?);
            } else {
                println!("Analysis saved to:");
                println!("- Report: {}", output.report_path.display());
                println!("- Recommendations: {}", output.recommendations_path.display());
            }
            Ok(())
        }
        Err(e) if json => {
            let record = e.to_record(file_name(file));
            println!("{}", serde_json::to_string_pretty(&record)?);
            std::process::exit(1);
        }
        Err(e) => Err(anyhow!("Failed to process {}: {}", file.display(), e)),
    }
}

fn run_profile(file: &Path, threshold: f64, method: CorrelationMethod) -> Result<()> {
    let df = load_table(file)?;
    let matrix = significant_correlations(&df, method, threshold)?;

    let report = ProfileReport {
        metadata: file_metadata(file)?,
        basic_stats: extract_basic_stats(&df)?,
        outliers: detect_outliers(&df, None, OutlierMethod::Iqr)?,
        correlations: matrix
            .significant_pairs()
            .into_iter()
            .map(|(first, second, coefficient)| CorrelationEntry {
                first,
                second,
                coefficient,
            })
            .collect(),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Watch);

    init_logging(&args.log_level, args.quiet, command.json_output());

    dotenv().ok();

    let config = || load_config(args.config.as_deref());

    match command {
        Command::Watch => run_watch(&config()?),
        Command::Analyze { file, json } => run_analyze(&config()?, &file, json),
        Command::Profile {
            file,
            threshold,
            method,
        } => run_profile(&file, threshold, method.into()),
        Command::Document { file } => {
            let analyzer = TextAnalyzer::new(build_client(&config()?)?);
            let result = analyzer.analyze_document(&file)?;
            println!("{}", result.summary);
            Ok(())
        }
        Command::Review { file } => {
            let analyzer = TextAnalyzer::new(build_client(&config()?)?);
            let review = analyzer.review_code(&file)?;
            println!("{}", review.suggestions);
            Ok(())
        }
        Command::Summarize { file } => {
            let analyzer = TextAnalyzer::new(build_client(&config()?)?);
            println!("{}", analyzer.summarize(&read_text(&file)?)?);
            Ok(())
        }
        Command::Compare { first, second } => {
            let analyzer = TextAnalyzer::new(build_client(&config()?)?);
            println!(
                "{}",
                analyzer.compare(&read_text(&first)?, &read_text(&second)?)?
            );
            Ok(())
        }
    }
}
