//! Image re-encoding: lossless JPEG XL and the lossy dist formats.

use std::path::Path;
use std::str::FromStr;

use tokio_util::sync::CancellationToken;

use crate::command::ToolCommand;
use crate::tools::Toolchain;
use crate::{Error, Result};

/// Fixed settings for the archive profile's lossless re-encode.
#[derive(Debug, Clone, Copy)]
pub struct LosslessSettings {
    /// cjxl effort level (1-9).
    pub effort: u32,
}

impl Default for LosslessSettings {
    fn default() -> Self {
        Self { effort: 8 }
    }
}

/// Lossy image format for the dist profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistImageFormat {
    Avif,
    Webp,
}

impl DistImageFormat {
    /// Normalized file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Avif => "avif",
            Self::Webp => "webp",
        }
    }

    fn ffmpeg_codec(&self) -> &'static str {
        match self {
            Self::Avif => "libsvtav1",
            Self::Webp => "libwebp",
        }
    }
}

impl FromStr for DistImageFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "avif" => Ok(Self::Avif),
            "webp" => Ok(Self::Webp),
            other => Err(format!("unsupported dist image format: {other}")),
        }
    }
}

/// Fixed settings for the dist profile's lossy re-encode.
#[derive(Debug, Clone, Copy)]
pub struct DistImageSettings {
    pub format: DistImageFormat,
    /// CRF for AVIF, quality for WebP.
    pub quality: u32,
    /// Encoder preset (AVIF only).
    pub preset: u32,
}

impl Default for DistImageSettings {
    fn default() -> Self {
        Self {
            format: DistImageFormat::Avif,
            quality: 26,
            preset: 6,
        }
    }
}

/// Re-encode an image losslessly to JPEG XL with cjxl.
pub async fn encode_lossless_jxl(
    tc: &Toolchain,
    cancel: &CancellationToken,
    input: &Path,
    output: &Path,
    settings: LosslessSettings,
) -> Result<()> {
    if !input.exists() {
        return Err(Error::file_not_found(input));
    }

    ToolCommand::new(tc.cjxl.clone())
        .arg("-d")
        .arg("0")
        .arg("-e")
        .arg(settings.effort.to_string())
        .arg(input.to_string_lossy())
        .arg(output.to_string_lossy())
        .cancel_token(cancel.clone())
        .execute()
        .await?;

    Ok(())
}

/// Re-encode an image to the lossy dist format with ffmpeg.
///
/// `downscale_width` caps the output width (aspect preserved); `None` keeps
/// the input size. Dimensions are rounded up to even values because SVT-AV1
/// rejects odd sizes.
pub async fn encode_dist_image(
    tc: &Toolchain,
    cancel: &CancellationToken,
    input: &Path,
    output: &Path,
    settings: DistImageSettings,
    downscale_width: Option<u32>,
) -> Result<()> {
    if !input.exists() {
        return Err(Error::file_not_found(input));
    }

    let filter = match downscale_width {
        Some(width) => format!("scale={width}:-2"),
        None => "scale=ceil(iw/2)*2:ceil(ih/2)*2".to_string(),
    };

    let mut cmd = ToolCommand::new(tc.ffmpeg.clone())
        .arg("-i")
        .arg(input.to_string_lossy())
        .arg("-c:v")
        .arg(settings.format.ffmpeg_codec());

    cmd = match settings.format {
        DistImageFormat::Avif => cmd
            .arg("-crf")
            .arg(settings.quality.to_string())
            .arg("-preset")
            .arg(settings.preset.to_string()),
        DistImageFormat::Webp => cmd
            .arg("-quality")
            .arg(settings.quality.to_string())
            .arg("-pix_fmt")
            .arg("yuv420p"),
    };

    cmd.arg("-vf")
        .arg(filter)
        .arg("-y")
        .arg(output.to_string_lossy())
        .cancel_token(cancel.clone())
        .execute()
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dist_format_parse() {
        assert_eq!("avif".parse::<DistImageFormat>().unwrap(), DistImageFormat::Avif);
        assert_eq!("WEBP".parse::<DistImageFormat>().unwrap(), DistImageFormat::Webp);
        assert!("png".parse::<DistImageFormat>().is_err());
        assert!("jxl".parse::<DistImageFormat>().is_err());
    }

    #[test]
    fn test_dist_format_extension() {
        assert_eq!(DistImageFormat::Avif.extension(), "avif");
        assert_eq!(DistImageFormat::Webp.extension(), "webp");
    }

    #[test]
    fn test_default_settings() {
        let lossless = LosslessSettings::default();
        assert_eq!(lossless.effort, 8);

        let dist = DistImageSettings::default();
        assert_eq!(dist.format, DistImageFormat::Avif);
        assert_eq!(dist.quality, 26);
        assert_eq!(dist.preset, 6);
    }
}
