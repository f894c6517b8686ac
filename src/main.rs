use clap::{Parser, Subcommand};
use melody_filter::config::Config;
use melody_filter::{validate_input, BatchRunner, SequenceFilter};
use std::path::PathBuf;

/// Melody/Chord Corpus Filter
#[derive(Parser)]
#[command(name = "melodyfilter")]
#[command(about = "Filter and trim two-track melody/chord MIDI files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter a directory of sequence files into an output directory
    Filter {
        /// Folder containing the dataset to preprocess
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Folder receiving the accepted, aligned files
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Custom configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Maximum rest share per track, in percent
        #[arg(short = 'r', long)]
        rest_threshold: Option<f64>,

        /// Maximum share of out-of-range melody notes, in percent
        #[arg(short = 't', long)]
        out_of_range: Option<f64>,

        /// Worker threads (default: available CPUs minus one)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Write a JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Classify only, write nothing
        #[arg(long)]
        dry_run: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,

        /// Quiet output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Classify a single file and print its verdict
    Check {
        /// Sequence file to inspect
        file: PathBuf,

        /// Custom configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config: PathBuf,
    },
    /// Show default configuration
    ShowConfig,
}

fn init_logging(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn load_or_default(path: Option<PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => melody_filter::config::load_config(path),
        None => Ok(Config::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Filter {
            input,
            output,
            config,
            rest_threshold,
            out_of_range,
            jobs,
            report,
            dry_run,
            verbose,
            quiet,
        } => {
            if verbose && quiet {
                anyhow::bail!("Cannot specify both --verbose and --quiet");
            }
            init_logging(if verbose {
                "debug"
            } else if quiet {
                "warn"
            } else {
                "info"
            });

            // Load configuration, then let flags override it
            let mut config = load_or_default(config)?;
            if let Some(input) = input {
                config.io.input_dir = input;
            }
            if let Some(output) = output {
                config.io.output_dir = output;
            }
            if let Some(pct) = rest_threshold {
                config.thresholds.rest_percent = pct;
            }
            if let Some(pct) = out_of_range {
                config.thresholds.out_of_range_percent = pct;
            }
            if jobs.is_some() {
                config.batch.jobs = jobs;
            }
            if report.is_some() {
                config.batch.report_path = report;
            }

            validate_input(&config.io.input_dir, &config)?;

            let runner = BatchRunner::new(config).with_dry_run(dry_run);
            let batch_report = runner.run()?;

            println!();
            print!("{}", batch_report.summary.render_table());

            if let Some(path) = &runner.config().batch.report_path {
                batch_report.export_json(path)?;
            }
        }
        Commands::Check { file, config } => {
            init_logging("warn");
            let config = load_or_default(config)?;
            let filter = SequenceFilter::new(config);
            let classified = filter.classify(&file)?;
            let json = serde_json::json!({
                "file": classified.sequence.name,
                "alignment": classified.alignment,
                "verdict": classified.verdict,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::ValidateConfig { config } => {
            let config = melody_filter::config::load_config(config)?;
            println!("Configuration is valid");
            if let Ok(json) = serde_json::to_string_pretty(&config) {
                println!("{}", json);
            }
        }
        Commands::ShowConfig => {
            let config = Config::default();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
    }

    Ok(())
}
