use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use lumen_core::pipeline::FusionConfig;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save the default FusionConfig as TOML.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let toml_str = default_config_toml()?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}

fn default_config_toml() -> Result<String> {
    Ok(toml::to_string_pretty(&FusionConfig::default())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_toml_parses_back() {
        let text = default_config_toml().unwrap();
        assert!(text.contains("[alignment]"));
        assert!(text.contains("[ghost]"));
        assert!(text.contains("[denoise]"));
        assert!(!text.contains("worker_threads"));
        let parsed: FusionConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, FusionConfig::default());
    }

    #[test]
    fn test_config_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lumen.toml");
        run(&ConfigArgs {
            output: Some(path.clone()),
        })
        .unwrap();
        let parsed: FusionConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.min_frames, 4);
    }
}
