//! One-shot analysis runner.
//!
//! Reads collaborator credentials from the environment, runs the full
//! pipeline for one video and prints the result envelope as JSON.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use validator::Validate;

use icoach_indexing::{InsightClient, InsightConfig};
use icoach_models::AnalyzeOptions;
use icoach_vision::{AnalysisConfig, DetectorSet, Pipeline};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Interview Coach: non-verbal analysis of a recorded interview"
)]
struct Cli {
    /// Presigned URL or local path of the recorded interview video
    #[arg(value_name = "VIDEO")]
    video: String,

    /// Frame sampling rate inside each segment (1-10)
    #[arg(long, default_value_t = 2)]
    fps: u32,

    /// Cap on the number of analyzed segments (1-50)
    #[arg(long)]
    max_segments: Option<u32>,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("icoach=info".parse().unwrap())
        .add_directive("ort=warn".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let options = AnalyzeOptions {
        fps: cli.fps,
        max_segments: cli.max_segments,
    };
    options.validate().context("invalid analysis options")?;

    let client = InsightClient::new(InsightConfig::from_env())
        .context("video-understanding client configuration")?;
    let detectors = DetectorSet::global().context("detector initialization")?;

    let pipeline = Pipeline::new(Arc::new(client), detectors, AnalysisConfig::default());

    info!(video = %cli.video, fps = options.fps, "starting analysis");
    let result = pipeline.run(&cli.video, &options).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    DetectorSet::teardown();
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("analysis failed: {e:#}");
        std::process::exit(1);
    }
}
