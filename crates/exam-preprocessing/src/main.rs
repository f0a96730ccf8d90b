//! CLI entry point for the exam score preprocessor.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use exam_preprocessing::transformation::{read_csv, write_csv};
use exam_preprocessing::{
    ColumnTransformer, DataTransformation, LogContext, PreprocessorConfig, TransformationOutput,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Fit and apply the exam score preprocessor",
    long_about = "Median-imputes and standardizes numeric columns, mode-imputes, \
                  one-hot encodes and scales categorical columns, and persists \
                  the fitted preprocessor.\n\n\
                  EXAMPLES:\n  \
                  # Fit on a train/test split and save the preprocessor\n  \
                  exam-preprocessing fit --train data/train.csv --test data/test.csv\n\n  \
                  # Apply a saved preprocessor to new data\n  \
                  exam-preprocessing transform -i new.csv -o new_features.csv"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// JSON configuration file (column schema, target, artifact path)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the per-run log file
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Do not mirror log lines to stderr
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit the preprocessor on a training split and transform the test split
    Fit {
        /// Training CSV
        #[arg(long)]
        train: PathBuf,

        /// Test CSV
        #[arg(long)]
        test: PathBuf,

        /// Where to save the fitted preprocessor
        #[arg(short, long)]
        artifact: Option<PathBuf>,

        /// Target column split off before preprocessing
        #[arg(short, long)]
        target: Option<String>,

        /// Write train_transformed.csv and test_transformed.csv here
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Print the run summary as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Apply a saved preprocessor to a CSV file
    Transform {
        /// Input CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,

        /// Saved preprocessor
        #[arg(short, long)]
        artifact: Option<PathBuf>,
    },
}

fn load_config(args: &Args) -> Result<PreprocessorConfig> {
    let mut config = match &args.config {
        Some(path) => PreprocessorConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PreprocessorConfig::default(),
    };

    if let Some(dir) = &args.log_dir {
        config.logging.log_dir = dir.clone();
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    let json = matches!(args.command, Command::Fit { json: true, .. });
    config.logging.console = !args.quiet && !json;

    match &args.command {
        Command::Fit {
            artifact, target, ..
        } => {
            if let Some(path) = artifact {
                config.artifact_path = path.clone();
            }
            if let Some(target) = target {
                config.target_column = target.clone();
            }
        }
        Command::Transform { artifact, .. } => {
            if let Some(path) = artifact {
                config.artifact_path = path.clone();
            }
        }
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let logs = LogContext::init(&config.logging)?;
    let _guard = logs.enter();
    info!("Logging to {}", logs.log_file().display());

    let result = match &args.command {
        Command::Fit {
            train,
            test,
            output_dir,
            json,
            ..
        } => run_fit(config, logs.clone(), train, test, output_dir.as_deref(), *json),
        Command::Transform { input, output, .. } => run_transform(&config, input, output),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

fn run_fit(
    config: PreprocessorConfig,
    logs: LogContext,
    train: &Path,
    test: &Path,
    output_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    for path in [train, test] {
        if !path.exists() {
            return Err(anyhow!("Input file not found: {}", path.display()));
        }
    }

    let mut output = match DataTransformation::new(config)
        .with_log_context(logs)
        .from_csv(train, test)
    {
        Ok(output) => output,
        Err(e) if json => {
            println!("{}", serde_json::to_string_pretty(&e)?);
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(dir) = output_dir {
        write_csv(&mut output.train, dir.join("train_transformed.csv"))?;
        write_csv(&mut output.test, dir.join("test_transformed.csv"))?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&output.summary)?);
    } else {
        print_summary(&output);
    }
    Ok(())
}

fn run_transform(config: &PreprocessorConfig, input: &Path, output: &Path) -> Result<()> {
    if !input.exists() {
        return Err(anyhow!("Input file not found: {}", input.display()));
    }

    let preprocessor = ColumnTransformer::load(&config.artifact_path)?;
    let df = read_csv(input)?;
    info!("Dataset loaded successfully: {:?}", df.shape());

    let mut transformed = preprocessor.transform(&df)?;
    write_csv(&mut transformed, output)?;
    println!(
        "Transformed {} rows into {} features: {}",
        transformed.height(),
        transformed.width(),
        output.display()
    );
    Ok(())
}

fn print_summary(output: &TransformationOutput) {
    let summary = &output.summary;
    println!("\n{}", "=".repeat(60));
    println!("DATA TRANSFORMATION COMPLETE");
    println!("{}", "=".repeat(60));
    println!("  Train rows:   {}", summary.train_rows);
    println!("  Test rows:    {}", summary.test_rows);
    println!("  Features:     {}", summary.n_features);
    println!("  Target:       {}", summary.target_column);
    println!("  Preprocessor: {}", summary.artifact_path.display());
    println!();
    for name in &summary.feature_names {
        println!("    {}", name);
    }
    println!("{}", "=".repeat(60));
}
