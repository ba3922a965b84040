//! Conversion rule table.
//!
//! A pure mapping from (profile, classification) to the action the pipeline
//! takes. Total by construction: every input gets an action, and anything the
//! table does not recognize degrades to a verbatim copy.

use std::path::{Path, PathBuf};

use packsmith_common::{Classification, ConcreteFormat, ConversionAction, MediaKind, TargetProfile};

/// Resolve the action for one classified file under one profile.
pub fn resolve(profile: TargetProfile, classification: &Classification) -> ConversionAction {
    let format = match classification {
        Classification::Recognized { format } | Classification::Fallback { format } => *format,
        Classification::Unknown => return ConversionAction::Copy,
    };

    match profile {
        TargetProfile::Archive => match format {
            ConcreteFormat::Png | ConcreteFormat::Jpeg | ConcreteFormat::Gif => {
                ConversionAction::EncodeLosslessImage
            }
            // Already-compressed modern formats and everything else are
            // preserved byte for byte.
            _ => ConversionAction::Copy,
        },
        TargetProfile::Dist => match format {
            ConcreteFormat::Png | ConcreteFormat::Jpeg | ConcreteFormat::WebP => {
                ConversionAction::EncodeUpscaledLossyImage
            }
            _ if format.media_kind() == MediaKind::Video => ConversionAction::TranscodeVideo,
            _ => ConversionAction::Copy,
        },
    }
}

/// Output path (relative to the tree root) for a source file under an action.
///
/// `dist_image_ext` is the configured lossy image extension ("avif" or
/// "webp"); it is ignored for other actions.
pub fn output_path(relative: &Path, action: ConversionAction, dist_image_ext: &str) -> PathBuf {
    match action {
        ConversionAction::Copy => relative.to_path_buf(),
        ConversionAction::EncodeLosslessImage => relative.with_extension("jxl"),
        ConversionAction::EncodeUpscaledLossyImage => relative.with_extension(dist_image_ext),
        ConversionAction::TranscodeVideo => relative.with_extension("mp4"),
    }
}
