use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use lumen_core::pipeline::FusionConfig;

#[derive(Args)]
pub struct InfoArgs {
    /// Input frames
    #[arg(required = true)]
    pub frames: Vec<PathBuf>,

    /// Minimum burst size to check against
    #[arg(long)]
    pub min_frames: Option<usize>,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let mut dims = Vec::with_capacity(args.frames.len());
    for path in &args.frames {
        let (w, h) = image::image_dimensions(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        println!("{:<40} {}x{}", path.display(), w, h);
        dims.push((w as usize, h as usize));
    }

    let min_frames = args
        .min_frames
        .unwrap_or_else(|| FusionConfig::default().min_frames);
    println!();
    println!("Frames:      {}", dims.len());
    if let Some(&(w, h)) = dims.first() {
        println!("Dimensions:  {}x{}", w, h);
        let raw_mb = (w * h * 3 * dims.len()) as f64 / (1024.0 * 1024.0);
        println!("Data size:   {:.1} MB (8-bit RGB)", raw_mb);
    }
    match fusable(&dims, min_frames) {
        Ok(()) => println!("Fusable:     yes"),
        Err(reason) => println!("Fusable:     no ({reason})"),
    }

    Ok(())
}

/// Whether a burst with these frame sizes passes the pipeline's preconditions.
fn fusable(dims: &[(usize, usize)], min_frames: usize) -> std::result::Result<(), String> {
    if dims.len() < min_frames {
        return Err(format!("need at least {min_frames} frames"));
    }
    let Some(&first) = dims.first() else {
        return Err("no frames".to_string());
    };
    if first.0 == 0 || first.1 == 0 {
        return Err("empty image".to_string());
    }
    if let Some(i) = dims.iter().position(|&d| d != first) {
        return Err(format!(
            "frame {i} is {}x{}, expected {}x{}",
            dims[i].0, dims[i].1, first.0, first.1
        ));
    }
    Ok(())
}
