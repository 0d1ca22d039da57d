mod annotate;
mod evaluate;
mod report;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tweetscope_core::TopicId;

pub(crate) use annotate::run_annotate;
pub(crate) use evaluate::run_evaluate;
pub(crate) use report::run_summary;

#[derive(Debug, Parser)]
#[command(name = "tweetscope")]
#[command(about = "Annotate tweets with sentiment, emotion and topic, and report on the results")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the annotation pipeline and write the enriched table
    Annotate {
        /// Raw tweet table (overrides `TWEETSCOPE_INPUT_PATH`)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output CSV (overrides `TWEETSCOPE_OUTPUT_PATH`)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Topic model directory (overrides `TWEETSCOPE_MODEL_CACHE_DIR`)
        #[arg(long)]
        model_cache_dir: Option<PathBuf>,
        /// Drop records that fail labeling instead of aborting the run
        #[arg(long)]
        skip_failed: bool,
        /// Load and clean the inputs, print counts, and call no model
        #[arg(long)]
        dry_run: bool,
    },
    /// Print aggregate figures for an annotated table
    Summary {
        /// Annotated CSV to read
        #[arg(
            long,
            env = "TWEETSCOPE_OUTPUT_PATH",
            default_value = "./data/final_analysis_with_predictions.csv"
        )]
        input: PathBuf,
        /// Restrict per-subset figures to one topic
        #[arg(long, value_parser = parse_topic, allow_negative_numbers = true)]
        topic: Option<TopicId>,
        /// Number of emotions to list
        #[arg(long, default_value = "5")]
        top: usize,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Score the sentiment model against the labeled sentiment examples
    Evaluate {
        /// Only evaluate the first N examples
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the cleaned form of TEXT
    Clean {
        text: String,
    },
}

fn parse_topic(raw: &str) -> Result<TopicId, String> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("invalid topic id '{raw}': {e}"))?;
    TopicId::new(value).map_err(|e| e.to_string())
}

fn init_tracing() -> anyhow::Result<()> {
    let level = std::env::var("TWEETSCOPE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Annotate {
            input,
            output,
            model_cache_dir,
            skip_failed,
            dry_run,
        }) => {
            let overrides = annotate::PathOverrides {
                input,
                output,
                model_cache_dir,
            };
            run_annotate(overrides, skip_failed, dry_run).await?;
        }
        Some(Commands::Summary {
            input,
            topic,
            top,
            json,
        }) => run_summary(&input, topic, top, json)?,
        Some(Commands::Evaluate { limit }) => run_evaluate(limit).await?,
        Some(Commands::Clean { text }) => println!("{}", tweetscope_pipeline::clean(&text)),
        None => println!("no command given; run `tweetscope --help` for usage"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
