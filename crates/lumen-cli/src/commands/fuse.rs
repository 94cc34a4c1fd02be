use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use lumen_core::compute::CancellationToken;
use lumen_core::pipeline::{FnReporter, FusionConfig, FusionPipeline, PipelineState, RunOutcome};

use crate::frames::{load_frames, save_image};
use crate::summary::{print_fusion_summary, print_result_summary};

#[derive(Args)]
pub struct FuseArgs {
    /// Input frames, in capture order
    #[arg(required = true)]
    pub frames: Vec<PathBuf>,

    /// Fusion config file (TOML); flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Bilateral denoise strength (0-1)
    #[arg(long)]
    pub denoise: Option<f32>,

    /// Disable ghost elimination
    #[arg(long)]
    pub no_ghost: bool,

    /// Skip the dynamic-range stage
    #[arg(long)]
    pub no_hdr: bool,

    /// Smaller alignment search for faster runs
    #[arg(long)]
    pub fast: bool,

    /// Fail when fewer frames are supplied
    #[arg(long)]
    pub min_frames: Option<usize>,

    /// Use at most this many frames around the middle of the burst (0 = all)
    #[arg(long)]
    pub max_frames: Option<usize>,

    /// Worker threads (default: all cores)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Output file path
    #[arg(short, long, default_value = "fused.png")]
    pub output: PathBuf,
}

pub fn run(args: &FuseArgs) -> Result<()> {
    let config = build_config(args)?;
    print_fusion_summary(&config, args.frames.len(), &args.output);

    println!("Reading {} frames...", args.frames.len());
    let frames = load_frames(&args.frames)?;

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:24} [{bar:40}] {pos}%")?
            .progress_chars("=> "),
    );
    let bar = pb.clone();
    let mut pipeline = FusionPipeline::builder(config)
        .reporter(Arc::new(FnReporter(move |state: &PipelineState| {
            update_progress(&bar, state)
        })))
        .build()?;

    let outcome = pipeline.run(frames, &CancellationToken::new());
    let result = match outcome {
        Ok(RunOutcome::Completed(result)) => result,
        Ok(RunOutcome::Cancelled) => {
            pb.abandon_with_message("Cancelled");
            bail!("Fusion was cancelled");
        }
        Err(e) => {
            pb.abandon_with_message("Failed");
            return Err(e.into());
        }
    };
    pb.finish_with_message("Done");

    save_image(&result.image, &args.output)?;
    print_result_summary(&result);
    println!("\nOutput saved to {}", args.output.display());

    Ok(())
}

/// Config file (or defaults) with command-line overrides applied.
fn build_config(args: &FuseArgs) -> Result<FusionConfig> {
    let mut config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid fusion config")?
    } else {
        FusionConfig::default()
    };

    if let Some(strength) = args.denoise {
        config.denoise_strength = strength;
    }
    if args.no_ghost {
        config.enable_ghost_elimination = false;
    }
    if args.no_hdr {
        config.enable_hdr = false;
    }
    if args.fast {
        config.prefer_speed = true;
    }
    if let Some(n) = args.min_frames {
        config.min_frames = n;
    }
    if let Some(n) = args.max_frames {
        config.max_frames = n;
    }
    if args.threads.is_some() {
        config.worker_threads = args.threads;
    }

    config.validate()?;
    Ok(config)
}

fn update_progress(pb: &ProgressBar, state: &PipelineState) {
    match state {
        PipelineState::Aligning { progress } | PipelineState::Merging { progress } => {
            pb.set_message(state.name());
            pb.set_position((progress * 100.0) as u64);
        }
        PipelineState::PostProcessing { stage } => {
            pb.set_message(format!("Post-processing ({stage})"));
            pb.set_position(100);
        }
        _ => {}
    }
}
