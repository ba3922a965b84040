//! Core type definitions for target profiles, formats, and conversion actions.
//!
//! All enums serialize in snake_case so manifests stay human-inspectable and
//! stable across releases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Output target for a processing run.
///
/// Each profile owns its own rule set, output tree, and container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetProfile {
    /// Lossless preservation target, packed into a 7z container.
    Archive,
    /// Lossy, upscaled distribution target, packed into a zip container.
    Dist,
}

impl TargetProfile {
    /// Both profiles, in the order a full run processes them.
    pub const ALL: [TargetProfile; 2] = [TargetProfile::Archive, TargetProfile::Dist];

    /// Suffix appended to the source directory name for this profile's
    /// staged output tree.
    pub fn tree_suffix(&self) -> &'static str {
        match self {
            Self::Archive => "_archive",
            Self::Dist => "_dist",
        }
    }

    /// Container format for this profile's final artifact.
    pub fn container(&self) -> Container {
        match self {
            Self::Archive => Container::SevenZip,
            Self::Dist => Container::Zip,
        }
    }
}

impl fmt::Display for TargetProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archive => write!(f, "archive"),
            Self::Dist => write!(f, "dist"),
        }
    }
}

/// Compression container for a finished output tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// 7z container (archive profile).
    SevenZip,
    /// Zip container (dist profile).
    Zip,
}

impl Container {
    /// File extension for this container.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::SevenZip => "7z",
            Self::Zip => "zip",
        }
    }

    /// The `-t` type flag value 7z expects for this container.
    pub fn sevenzip_type(&self) -> &'static str {
        match self {
            Self::SevenZip => "7z",
            Self::Zip => "zip",
        }
    }
}

/// Semantic kind of a classified media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image.
    Image,
    /// Video or animation container.
    Video,
    /// Anything else; copied verbatim by every profile.
    Other,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Concrete on-disk format of a classified file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcreteFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
    /// JPEG XL, produced by the archive profile's lossless re-encode.
    Jxl,
    /// AVIF, the default dist image format.
    Avif,
    Mp4,
    Webm,
    Mov,
    Mkv,
    Avi,
    /// Unrecognized content; always copied verbatim.
    Opaque,
}

impl ConcreteFormat {
    /// The media kind this format belongs to.
    pub fn media_kind(&self) -> MediaKind {
        match self {
            Self::Png | Self::Jpeg | Self::Gif | Self::WebP | Self::Jxl | Self::Avif => {
                MediaKind::Image
            }
            Self::Mp4 | Self::Webm | Self::Mov | Self::Mkv | Self::Avi => MediaKind::Video,
            Self::Opaque => MediaKind::Other,
        }
    }

    /// Map a lowercase file extension to a format, if known.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            "jxl" => Some(Self::Jxl),
            "avif" => Some(Self::Avif),
            "mp4" | "m4v" => Some(Self::Mp4),
            "webm" => Some(Self::Webm),
            "mov" => Some(Self::Mov),
            "mkv" => Some(Self::Mkv),
            "avi" => Some(Self::Avi),
            _ => None,
        }
    }
}

impl fmt::Display for ConcreteFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::WebP => "webp",
            Self::Jxl => "jxl",
            Self::Avif => "avif",
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Mov => "mov",
            Self::Mkv => "mkv",
            Self::Avi => "avi",
            Self::Opaque => "opaque",
        };
        write!(f, "{name}")
    }
}

/// Result of classifying a file's content.
///
/// A tagged variant rather than sentinel values so downstream rule resolution
/// stays exhaustive and compiler-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "lowercase")]
pub enum Classification {
    /// Content sniffing succeeded.
    Recognized { format: ConcreteFormat },
    /// Content was ambiguous or unreadable; format taken from the extension.
    Fallback { format: ConcreteFormat },
    /// Neither content nor extension identified the file.
    Unknown,
}

impl Classification {
    /// The concrete format, treating unknown files as opaque.
    pub fn format(&self) -> ConcreteFormat {
        match self {
            Self::Recognized { format } | Self::Fallback { format } => *format,
            Self::Unknown => ConcreteFormat::Opaque,
        }
    }

    /// The media kind derived from the format.
    pub fn media_kind(&self) -> MediaKind {
        self.format().media_kind()
    }
}

/// Conversion chosen for one (source file, target profile) pair.
///
/// Purely descriptive of what the executor must do; carries no mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionAction {
    /// Verbatim byte copy preserving the relative path.
    Copy,
    /// Lossless re-encode to JPEG XL (archive profile).
    EncodeLosslessImage,
    /// Upscale and re-encode to the configured lossy dist format.
    EncodeUpscaledLossyImage,
    /// Transcode to the fixed dist video profile (H.264 MP4).
    TranscodeVideo,
}

impl fmt::Display for ConversionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copy => write!(f, "copy"),
            Self::EncodeLosslessImage => write!(f, "encode_lossless_image"),
            Self::EncodeUpscaledLossyImage => write!(f, "encode_upscaled_lossy_image"),
            Self::TranscodeVideo => write!(f, "transcode_video"),
        }
    }
}
