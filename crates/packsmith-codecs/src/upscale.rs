//! Super-resolution upscaling via realesrgan-ncnn-vulkan.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::command::ToolCommand;
use crate::tools::Toolchain;
use crate::{Error, Result};

/// Upscale factor bounds supported by the model.
const MIN_SCALE: u32 = 2;
const MAX_SCALE: u32 = 4;

/// Fixed settings for the dist profile's upscale pass.
#[derive(Debug, Clone)]
pub struct UpscaleSettings {
    /// Target output width the dist profile aims for.
    pub target_width: u32,
    /// Upscale even when the source already meets the target width.
    pub always_upscale: bool,
    /// Model name passed to realesrgan.
    pub model: String,
}

impl Default for UpscaleSettings {
    fn default() -> Self {
        Self {
            target_width: 2500,
            always_upscale: false,
            model: "realesr-animevideov3".to_string(),
        }
    }
}

/// Decision for one image, derived from its probed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpscalePlan {
    /// Source already meets the target; encode without upscaling.
    Skip,
    /// Upscale by `factor`; when `downscale_to` is set the upscale overshoots
    /// the target and the encode pass caps the width back down.
    Scale {
        factor: u32,
        downscale_to: Option<u32>,
    },
}

/// Work out the upscale factor for a source image of the given width.
///
/// Factor is `ceil(target / width)` clamped to the model's 2-4 range; sources
/// at or above the target are skipped unless `always_upscale` is set.
pub fn plan_upscale(width: u32, settings: &UpscaleSettings) -> UpscalePlan {
    let raw = settings.target_width.div_ceil(width).min(MAX_SCALE);
    if raw <= 1 && !settings.always_upscale {
        return UpscalePlan::Skip;
    }
    let factor = raw.max(MIN_SCALE);

    let downscale_to = if width * factor > settings.target_width {
        Some(settings.target_width)
    } else {
        None
    };

    UpscalePlan::Scale {
        factor,
        downscale_to,
    }
}

/// Run realesrgan, producing a PNG at `factor` times the input size.
pub async fn upscale(
    tc: &Toolchain,
    cancel: &CancellationToken,
    input: &Path,
    output: &Path,
    factor: u32,
    model: &str,
) -> Result<()> {
    if !input.exists() {
        return Err(Error::file_not_found(input));
    }

    ToolCommand::new(tc.realesrgan.clone())
        .arg("-i")
        .arg(input.to_string_lossy())
        .arg("-o")
        .arg(output.to_string_lossy())
        .arg("-s")
        .arg(factor.to_string())
        .arg("-n")
        .arg(model)
        .arg("-f")
        .arg("png")
        .cancel_token(cancel.clone())
        .execute()
        .await?;

    // realesrgan can exit zero without writing output on some driver errors.
    if !output.exists() {
        return Err(Error::tool_failed(
            "realesrgan-ncnn-vulkan",
            "no output produced",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(target_width: u32, always_upscale: bool) -> UpscaleSettings {
        UpscaleSettings {
            target_width,
            always_upscale,
            ..UpscaleSettings::default()
        }
    }

    #[test]
    fn test_plan_skips_large_sources() {
        assert_eq!(plan_upscale(2500, &settings(2500, false)), UpscalePlan::Skip);
        assert_eq!(plan_upscale(4000, &settings(2500, false)), UpscalePlan::Skip);
    }

    #[test]
    fn test_plan_always_upscale_forces_minimum() {
        assert_eq!(
            plan_upscale(4000, &settings(2500, true)),
            UpscalePlan::Scale {
                factor: 2,
                downscale_to: Some(2500)
            }
        );
    }

    #[test]
    fn test_plan_small_source_clamps_to_max() {
        // 2500 / 400 = 6.25 -> clamped to 4, 1600 < 2500 so no downscale.
        assert_eq!(
            plan_upscale(400, &settings(2500, false)),
            UpscalePlan::Scale {
                factor: 4,
                downscale_to: None
            }
        );
    }

    #[test]
    fn test_plan_overshoot_downscales() {
        // 2500 / 1300 = 1.92 -> ceil 2, 2600 > 2500 so cap back down.
        assert_eq!(
            plan_upscale(1300, &settings(2500, false)),
            UpscalePlan::Scale {
                factor: 2,
                downscale_to: Some(2500)
            }
        );
    }

    #[test]
    fn test_plan_exact_fit() {
        // 2500 / 1250 = 2 exactly, no overshoot.
        assert_eq!(
            plan_upscale(1250, &settings(2500, false)),
            UpscalePlan::Scale {
                factor: 2,
                downscale_to: None
            }
        );
    }
}
