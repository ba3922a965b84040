//! Conversion pipeline: the codec seam, the per-file executor, and the
//! orchestrator that runs a full source tree to finished archives.

mod executor;
mod orchestrator;

pub use executor::ConversionExecutor;
pub use orchestrator::{Orchestrator, ProfileSummary, RunSummary};

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use packsmith_codecs::encode::{self, DistImageSettings, LosslessSettings};
use packsmith_codecs::probe;
use packsmith_codecs::tools::Toolchain;
use packsmith_codecs::transcode::{self, VideoSettings};
use packsmith_codecs::upscale::{self, UpscalePlan, UpscaleSettings};

/// Immutable codec parameters for one run.
#[derive(Debug, Clone, Default)]
pub struct CodecSettings {
    pub lossless: LosslessSettings,
    pub dist_image: DistImageSettings,
    pub upscale: UpscaleSettings,
    pub video: VideoSettings,
}

/// The conversions the executor can delegate.
///
/// A trait object so tests exercise the pipeline with fakes instead of real
/// ffmpeg/cjxl invocations. Each method writes its result to `staged`; the
/// executor owns staging and publication.
#[async_trait]
pub trait Codec: Send + Sync {
    /// Lossless re-encode to JPEG XL.
    async fn encode_lossless_image(&self, input: &Path, staged: &Path)
        -> packsmith_codecs::Result<()>;

    /// Upscale (when the source is below the target width) and re-encode to
    /// the lossy dist format. `scratch` is a path the implementation may use
    /// for the intermediate upscaled frame.
    async fn encode_upscaled_lossy_image(
        &self,
        input: &Path,
        staged: &Path,
        scratch: &Path,
    ) -> packsmith_codecs::Result<()>;

    /// Transcode to the fixed dist video profile.
    async fn transcode_video(&self, input: &Path, staged: &Path) -> packsmith_codecs::Result<()>;

    /// Extension of the lossy dist image format ("avif" or "webp").
    fn dist_image_extension(&self) -> &'static str;
}

/// Production codec driving the external tools.
pub struct ExternalCodec {
    toolchain: Toolchain,
    settings: CodecSettings,
    cancel: CancellationToken,
}

impl ExternalCodec {
    pub fn new(toolchain: Toolchain, settings: CodecSettings, cancel: CancellationToken) -> Self {
        Self {
            toolchain,
            settings,
            cancel,
        }
    }
}

#[async_trait]
impl Codec for ExternalCodec {
    async fn encode_lossless_image(
        &self,
        input: &Path,
        staged: &Path,
    ) -> packsmith_codecs::Result<()> {
        encode::encode_lossless_jxl(
            &self.toolchain,
            &self.cancel,
            input,
            staged,
            self.settings.lossless,
        )
        .await
    }

    async fn encode_upscaled_lossy_image(
        &self,
        input: &Path,
        staged: &Path,
        scratch: &Path,
    ) -> packsmith_codecs::Result<()> {
        let (width, _height) = probe::dimensions(&self.toolchain, &self.cancel, input).await?;

        match upscale::plan_upscale(width, &self.settings.upscale) {
            UpscalePlan::Skip => {
                encode::encode_dist_image(
                    &self.toolchain,
                    &self.cancel,
                    input,
                    staged,
                    self.settings.dist_image,
                    None,
                )
                .await
            }
            UpscalePlan::Scale {
                factor,
                downscale_to,
            } => {
                upscale::upscale(
                    &self.toolchain,
                    &self.cancel,
                    input,
                    scratch,
                    factor,
                    &self.settings.upscale.model,
                )
                .await?;

                encode::encode_dist_image(
                    &self.toolchain,
                    &self.cancel,
                    scratch,
                    staged,
                    self.settings.dist_image,
                    downscale_to,
                )
                .await
            }
        }
    }

    async fn transcode_video(&self, input: &Path, staged: &Path) -> packsmith_codecs::Result<()> {
        transcode::transcode_video(
            &self.toolchain,
            &self.cancel,
            input,
            staged,
            &self.settings.video,
        )
        .await
    }

    fn dist_image_extension(&self) -> &'static str {
        self.settings.dist_image.format.extension()
    }
}
