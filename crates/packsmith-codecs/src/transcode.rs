//! Video transcoding to the fixed dist profile.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::command::ToolCommand;
use crate::tools::Toolchain;
use crate::{Error, Result};

/// Fixed settings for the dist profile's video transcode.
#[derive(Debug, Clone)]
pub struct VideoSettings {
    /// x264 CRF.
    pub crf: u32,
    /// x264 preset.
    pub preset: String,
    /// Maximum output width; smaller sources are left at their own size.
    pub max_width: u32,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            crf: 22,
            preset: "slow".to_string(),
            max_width: 1920,
        }
    }
}

/// Transcode a video to H.264 MP4, copying the audio stream.
pub async fn transcode_video(
    tc: &Toolchain,
    cancel: &CancellationToken,
    input: &Path,
    output: &Path,
    settings: &VideoSettings,
) -> Result<()> {
    if !input.exists() {
        return Err(Error::file_not_found(input));
    }

    ToolCommand::new(tc.ffmpeg.clone())
        .arg("-i")
        .arg(input.to_string_lossy())
        .arg("-c:v")
        .arg("libx264")
        .arg("-c:a")
        .arg("copy")
        .arg("-crf")
        .arg(settings.crf.to_string())
        .arg("-preset")
        .arg(&settings.preset)
        .arg("-vf")
        .arg(format!("scale='min({},iw)':-2", settings.max_width))
        .arg("-y")
        .arg(output.to_string_lossy())
        .cancel_token(cancel.clone())
        .execute()
        .await?;

    Ok(())
}
