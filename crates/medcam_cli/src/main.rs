//! Command-line interface: classify a scan image and write Grad-CAM
//! artifacts explaining the prediction.

#![deny(unsafe_code)]
#![warn(clippy::all)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use clap::Parser;

use medcam::prelude::*;

type InferBackend = Autodiff<NdArray>;

/// Classify a medical scan and explain the prediction with Grad-CAM.
#[derive(Parser, Debug)]
#[command(name = "medcam", version, about)]
struct Cli {
    /// Path to the scan image to analyze
    image: PathBuf,

    /// Directory receiving the heatmap and overlay artifacts
    #[arg(default_value = "./output")]
    output: PathBuf,

    /// Checkpoint directory holding the trained model
    #[arg(short, long, default_value = "./model")]
    checkpoint: PathBuf,

    /// Heatmap weight when blending the overlay
    #[arg(long, default_value_t = DEFAULT_OVERLAY_ALPHA)]
    alpha: f32,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let device = Default::default();
    let explainer = Explainer::<InferBackend>::load(&cli.checkpoint, &device)
        .with_context(|| format!("Loading checkpoint from {}", cli.checkpoint.display()))?
        .with_overlay_alpha(cli.alpha);

    let report = explainer
        .analyze(&cli.image, &cli.output)
        .with_context(|| format!("Analyzing {}", cli.image.display()))?;

    print!("{}", report.render_text());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}
