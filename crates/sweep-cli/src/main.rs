use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use log::info;
use std::path::PathBuf;
use sweep_lib::{config::read_config, pipeline, SweepConfig};

#[derive(Parser)]
#[command(
    name = "sweep",
    version,
    about = "Convert level-sweep sensor logs into a stage/level CSV dataset"
)]
struct Cli {
    /// Logging verbosity (e.g., debug, info, warn)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct SourceArgs {
    /// TOML file with input/output/expected_samples/strict
    #[arg(long)]
    config: Option<PathBuf>,
    /// Sensor log to read (stdin when omitted)
    #[arg(long)]
    input: Option<PathBuf>,
    /// Distinct samples each stage should hold
    #[arg(long)]
    expected_samples: Option<usize>,
    /// Treat readings before the first stage start as an error
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract readings, label stages and write the sorted CSV
    Convert {
        #[command(flatten)]
        source: SourceArgs,
        /// CSV file to write
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print the summary as JSON instead of the confirmation line
        #[arg(long)]
        json: bool,
    },
    /// Run the same checks without writing anything; prints the summary JSON
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    match cli.command {
        Commands::Convert {
            source,
            output,
            json,
        } => cmd_convert(&source, output, json)?,
        Commands::Check { source } => cmd_check(&source)?,
    }
    Ok(())
}

fn load_config(source: &SourceArgs) -> Result<SweepConfig> {
    let mut config = match &source.config {
        Some(path) => read_config(path)?,
        None => SweepConfig::default(),
    };
    if let Some(input) = &source.input {
        config.input = Some(input.clone());
    }
    if let Some(expected) = source.expected_samples {
        config.expected_samples = expected;
    }
    config.strict |= source.strict;
    Ok(config)
}

fn cmd_convert(source: &SourceArgs, output: Option<PathBuf>, json: bool) -> Result<()> {
    let mut config = load_config(source)?;
    if output.is_some() {
        config.output = output;
    }
    match &config.input {
        Some(path) => info!("reading {}", path.display()),
        None => info!("reading log from stdin"),
    }
    let summary = pipeline::run(&config)?;
    if json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        let path = summary
            .output
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!(
            "Wrote {} rows across {} stages to {}",
            summary.rows, summary.stages, path
        );
    }
    Ok(())
}

fn cmd_check(source: &SourceArgs) -> Result<()> {
    let config = load_config(source)?;
    let outcome = pipeline::check(&config)?;
    println!("{}", serde_json::to_string(&outcome.summary)?);
    Ok(())
}
