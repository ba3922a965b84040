use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub archive: ArchiveProfileConfig,

    #[serde(default)]
    pub dist: DistProfileConfig,

    #[serde(default)]
    pub video: VideoConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// Number of conversions allowed to run concurrently. External codecs are
    /// CPU/GPU-bound, so this stays small.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    4
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveProfileConfig {
    /// cjxl effort level (1-9).
    #[serde(default = "default_jxl_effort")]
    pub jxl_effort: u32,
}

fn default_jxl_effort() -> u32 {
    8
}

impl Default for ArchiveProfileConfig {
    fn default() -> Self {
        Self {
            jxl_effort: default_jxl_effort(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DistProfileConfig {
    /// Lossy image format: "avif" or "webp".
    #[serde(default = "default_dist_format")]
    pub format: String,

    /// CRF (avif) / quality (webp) for the dist image encode.
    #[serde(default = "default_dist_quality")]
    pub quality: u32,

    /// SVT-AV1 preset for the dist image encode.
    #[serde(default = "default_dist_preset")]
    pub preset: u32,

    /// Width the upscale pass aims for.
    #[serde(default = "default_target_width")]
    pub target_width: u32,

    /// Upscale even when the source already meets the target width.
    #[serde(default)]
    pub always_upscale: bool,

    /// realesrgan model name.
    #[serde(default = "default_upscale_model")]
    pub upscale_model: String,
}

fn default_dist_format() -> String {
    "avif".to_string()
}
fn default_dist_quality() -> u32 {
    26
}
fn default_dist_preset() -> u32 {
    6
}
fn default_target_width() -> u32 {
    2500
}
fn default_upscale_model() -> String {
    "realesr-animevideov3".to_string()
}

impl Default for DistProfileConfig {
    fn default() -> Self {
        Self {
            format: default_dist_format(),
            quality: default_dist_quality(),
            preset: default_dist_preset(),
            target_width: default_target_width(),
            always_upscale: false,
            upscale_model: default_upscale_model(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoConfig {
    /// x264 CRF for dist video transcodes.
    #[serde(default = "default_video_crf")]
    pub crf: u32,

    /// x264 preset.
    #[serde(default = "default_video_preset")]
    pub preset: String,

    /// Maximum output width; smaller sources keep their own size.
    #[serde(default = "default_video_max_width")]
    pub max_width: u32,
}

fn default_video_crf() -> u32 {
    22
}
fn default_video_preset() -> String {
    "slow".to_string()
}
fn default_video_max_width() -> u32 {
    1920
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            crf: default_video_crf(),
            preset: default_video_preset(),
            max_width: default_video_max_width(),
        }
    }
}

/// Optional explicit tool locations; anything unset is looked up on PATH.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe: Option<PathBuf>,

    #[serde(default)]
    pub cjxl: Option<PathBuf>,

    #[serde(default)]
    pub realesrgan: Option<PathBuf>,

    #[serde(default)]
    pub sevenzip: Option<PathBuf>,
}
