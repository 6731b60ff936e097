use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::Parser;
use domain::scans::ScanState;
use scanner::{
    HttpAnalysisClient, ScanFlowController, ScannerConfig, SignalOutcome, StillImageCamera,
};
use tracing_subscriber::EnvFilter;

/// Runs one scan against the analysis endpoint, using a PNG file as the camera feed.
#[derive(Parser, Debug)]
#[command(name = "scanner", version)]
struct Args {
    /// PNG image served as the camera frame
    image: PathBuf,

    /// Analysis endpoint URL (overrides ANALYZE_ENDPOINT_URL)
    #[arg(long)]
    endpoint: Option<String>,

    /// Open the detail view for this medication (1-based) once results are in
    #[arg(long)]
    select: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    let args = Args::parse();

    let mut config = ScannerConfig::from_env()?;
    if let Some(endpoint) = args.endpoint {
        config.endpoint_url = endpoint;
    }

    let camera = Arc::new(StillImageCamera::new(&args.image));
    let client = Arc::new(HttpAnalysisClient::new(config.endpoint_url.clone()));
    let mut flow = ScanFlowController::new(camera, client, &config);

    println!("{}\n", flow.screen());

    flow.start().await?;
    if !flow.wait_for_camera().await? {
        bail!("camera unavailable: {}", args.image.display());
    }
    println!("{}\n", flow.screen());

    flow.capture().await?;
    loop {
        match flow.process_next_signal().await? {
            SignalOutcome::ProgressAdvanced(progress) if progress % 25 == 0 => {
                println!("Processing prescription... {}%", progress);
            }
            SignalOutcome::Completed | SignalOutcome::AnalysisFailed => break,
            _ => {}
        }
    }

    if flow.state() != ScanState::Results {
        println!("{}", flow.screen());
        bail!("analysis did not complete");
    }
    println!("{}\n", flow.screen());

    if let Some(position) = args.select {
        let index = position.checked_sub(1).context("--select is 1-based")?;
        flow.select_medication(index).await?;
        println!("{}\n", flow.screen());
        flow.close_detail().await?;
    }

    flow.reset().await?;
    Ok(())
}
