mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

use packsmith_codecs::encode::{DistImageFormat, DistImageSettings, LosslessSettings};
use packsmith_codecs::tools::ToolOverrides;
use packsmith_codecs::transcode::VideoSettings;
use packsmith_codecs::upscale::UpscaleSettings;

use crate::pipeline::CodecSettings;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./packsmith.toml",
        "~/.config/packsmith/config.toml",
        "/etc/packsmith/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.run.workers == 0 {
        anyhow::bail!("run.workers cannot be 0");
    }

    if let Err(e) = config.dist.format.parse::<DistImageFormat>() {
        anyhow::bail!("dist.format: {e}");
    }

    if !(1..=9).contains(&config.archive.jxl_effort) {
        anyhow::bail!(
            "archive.jxl_effort must be 1-9, got {}",
            config.archive.jxl_effort
        );
    }

    if config.dist.target_width == 0 {
        anyhow::bail!("dist.target_width cannot be 0");
    }

    if config.video.preset.is_empty() {
        anyhow::bail!("video.preset cannot be empty");
    }

    // Soft checks: a missing tool override falls back to PATH at run time.
    for (name, path) in [
        ("tools.ffmpeg", &config.tools.ffmpeg),
        ("tools.ffprobe", &config.tools.ffprobe),
        ("tools.cjxl", &config.tools.cjxl),
        ("tools.realesrgan", &config.tools.realesrgan),
        ("tools.sevenzip", &config.tools.sevenzip),
    ] {
        if let Some(p) = path {
            if !p.exists() {
                tracing::warn!("{} does not exist: {:?}", name, p);
            }
        }
    }

    Ok(())
}

impl Config {
    /// Immutable codec settings for one run, handed explicitly to the
    /// executor rather than read from ambient state.
    pub fn codec_settings(&self) -> Result<CodecSettings> {
        let format: DistImageFormat = self
            .dist
            .format
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;

        Ok(CodecSettings {
            lossless: LosslessSettings {
                effort: self.archive.jxl_effort,
            },
            dist_image: DistImageSettings {
                format,
                quality: self.dist.quality,
                preset: self.dist.preset,
            },
            upscale: UpscaleSettings {
                target_width: self.dist.target_width,
                always_upscale: self.dist.always_upscale,
                model: self.dist.upscale_model.clone(),
            },
            video: VideoSettings {
                crf: self.video.crf,
                preset: self.video.preset.clone(),
                max_width: self.video.max_width,
            },
        })
    }

    /// Tool path overrides for toolchain discovery.
    pub fn tool_overrides(&self) -> ToolOverrides {
        ToolOverrides {
            ffmpeg: self.tools.ffmpeg.clone(),
            ffprobe: self.tools.ffprobe.clone(),
            cjxl: self.tools.cjxl.clone(),
            realesrgan: self.tools.realesrgan.clone(),
            sevenzip: self.tools.sevenzip.clone(),
        }
    }
}
