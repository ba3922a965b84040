//! Per-file conversion execution.
//!
//! Runs one (source file, action) pair to completion and reports the result
//! as a manifest entry. Codec failures are demoted to `Failed` entries so the
//! orchestrator can finish the run degraded; only cancellation propagates as
//! an error.

use std::path::Path;
use std::sync::Arc;

use packsmith_codecs::StagingArea;
use packsmith_common::{ConversionAction, Error, Result};

use crate::manifest::{Fingerprint, ManifestEntry, Outcome};
use crate::pipeline::Codec;
use crate::rules;
use crate::scanner::SourceFile;

/// Executes conversions against an injected codec.
pub struct ConversionExecutor {
    codec: Arc<dyn Codec>,
}

impl ConversionExecutor {
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self { codec }
    }

    /// Run one conversion, writing its output under `tree_root`.
    ///
    /// Returns a manifest entry in every non-cancelled case; a codec or I/O
    /// failure becomes a `Failed` entry with nothing left at the destination.
    ///
    /// # Errors
    ///
    /// Only [`Error::Cancelled`] when the run was cancelled mid-conversion.
    pub async fn execute(
        &self,
        source: &SourceFile,
        action: ConversionAction,
        tree_root: &Path,
    ) -> Result<ManifestEntry> {
        let output_rel = rules::output_path(
            &source.relative_path,
            action,
            self.codec.dist_image_extension(),
        );
        let destination = tree_root.join(&output_rel);

        let result = match action {
            ConversionAction::Copy => copy_verbatim(&source.absolute_path, &destination),
            _ => self.encode(source, action, &destination).await,
        };

        match result {
            Ok((outcome, output_fingerprint)) => {
                tracing::debug!(
                    "{} {:?} -> {:?}",
                    action,
                    source.relative_path,
                    output_rel
                );
                Ok(ManifestEntry {
                    source_path: source.relative_path.clone(),
                    action,
                    output_path: Some(output_rel),
                    source_fingerprint: source.fingerprint,
                    output_fingerprint: Some(output_fingerprint),
                    outcome,
                })
            }
            Err(Error::Cancelled) => Err(Error::Cancelled),
            Err(e) => {
                let kind = e.failure_kind();
                tracing::warn!("{}: {:?}: {}", kind, source.relative_path, e);
                Ok(ManifestEntry::failed(
                    source.relative_path.clone(),
                    action,
                    source.fingerprint,
                    kind,
                    e.to_string(),
                ))
            }
        }
    }

    async fn encode(
        &self,
        source: &SourceFile,
        action: ConversionAction,
        destination: &Path,
    ) -> Result<(Outcome, Fingerprint)> {
        let staging = StagingArea::for_destination(destination).map_err(map_codec_error)?;

        let result = match action {
            ConversionAction::EncodeLosslessImage => {
                self.codec
                    .encode_lossless_image(&source.absolute_path, staging.staged_path())
                    .await
            }
            ConversionAction::EncodeUpscaledLossyImage => {
                let scratch = staging.scratch_file("upscaled.png");
                self.codec
                    .encode_upscaled_lossy_image(
                        &source.absolute_path,
                        staging.staged_path(),
                        &scratch,
                    )
                    .await
            }
            ConversionAction::TranscodeVideo => {
                self.codec
                    .transcode_video(&source.absolute_path, staging.staged_path())
                    .await
            }
            ConversionAction::Copy => unreachable!("copy does not go through the codec"),
        };

        match result {
            Ok(()) => {
                // Fingerprint the staged file before the rename so a stat
                // failure leaves nothing published; the rename preserves size
                // and mtime.
                let fingerprint = Fingerprint::of_file(staging.staged_path())
                    .map_err(|e| Error::io_failure(format!("failed to stat staged output: {e}")))?;
                staging.publish().map_err(map_codec_error)?;
                Ok((Outcome::Succeeded, fingerprint))
            }
            Err(e) => {
                staging.discard();
                Err(map_codec_error(e))
            }
        }
    }
}

/// Copy a file byte for byte, preserving its relative path.
///
/// A plain copy is a single filesystem operation; it skips the staging area
/// the multi-step codecs need (and staging would reject legitimately empty
/// source files).
fn copy_verbatim(source: &Path, destination: &Path) -> Result<(Outcome, Fingerprint)> {
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_failure(e.to_string()))?;
    }
    std::fs::copy(source, destination).map_err(|e| Error::io_failure(e.to_string()))?;
    let fingerprint = Fingerprint::of_file(destination).map_err(|e| {
        let _ = std::fs::remove_file(destination);
        Error::io_failure(format!("failed to stat copied output: {e}"))
    })?;
    Ok((Outcome::CopiedUnchanged, fingerprint))
}

/// Map a tool-level error into the manifest failure taxonomy.
fn map_codec_error(e: packsmith_codecs::Error) -> Error {
    use packsmith_codecs::Error as Codec;

    match e {
        Codec::FileNotFound { .. } | Codec::ParseError { .. } | Codec::InvalidInput(_) => {
            Error::unsupported_input(e.to_string())
        }
        Codec::ToolFailed { .. } | Codec::ToolNotFound { .. } => {
            Error::codec_failure(e.to_string())
        }
        Codec::Io(_) | Codec::Staging(_) => Error::io_failure(e.to_string()),
        Codec::Cancelled { .. } => Error::Cancelled,
    }
}
