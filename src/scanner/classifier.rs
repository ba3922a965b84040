//! Format classification for source files.
//!
//! Classification prefers content sniffing over the filename so mislabeled
//! files (a PNG saved as `.jpg`) are converted correctly; the extension is
//! only a fallback for content we cannot identify. Classification never
//! fails: an unreadable file is logged and classified opaque so the pipeline
//! can still copy it verbatim.

use std::io::Read;
use std::path::Path;

use packsmith_common::{paths, Classification, ConcreteFormat};

/// Bytes read from the head of each file for sniffing. Enough for every
/// magic number we check, including EBML doctype strings.
const SNIFF_LEN: usize = 512;

/// Content-sniffing classifier with extension fallback.
#[derive(Debug, Default)]
pub struct FormatClassifier;

impl FormatClassifier {
    /// Create a new classifier.
    pub fn new() -> Self {
        Self
    }

    /// Classify a file into a media kind and concrete format.
    pub fn classify(&self, path: &Path) -> Classification {
        match read_head(path) {
            Ok(head) => {
                if let Some(format) = sniff_format(&head) {
                    return Classification::Recognized { format };
                }
                self.fallback(path, "content not recognized")
            }
            Err(e) => {
                tracing::warn!("could not read {:?} for sniffing: {}", path, e);
                self.fallback(path, "unreadable")
            }
        }
    }

    fn fallback(&self, path: &Path, reason: &str) -> Classification {
        match paths::lowercase_extension(path).and_then(|ext| ConcreteFormat::from_extension(&ext))
        {
            Some(format) => {
                tracing::debug!("{:?}: {}, falling back to extension", path, reason);
                Classification::Fallback { format }
            }
            None => Classification::Unknown,
        }
    }
}

fn read_head(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut file = std::fs::File::open(path)?;
    let mut buf = vec![0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(buf)
}

/// Identify a format from leading file content, or None when ambiguous.
fn sniff_format(head: &[u8]) -> Option<ConcreteFormat> {
    // Still images first: the image crate knows all of ours.
    if let Ok(guessed) = image::guess_format(head) {
        use image::ImageFormat;
        match guessed {
            ImageFormat::Png => return Some(ConcreteFormat::Png),
            ImageFormat::Jpeg => return Some(ConcreteFormat::Jpeg),
            ImageFormat::Gif => return Some(ConcreteFormat::Gif),
            ImageFormat::WebP => return Some(ConcreteFormat::WebP),
            ImageFormat::Avif => return Some(ConcreteFormat::Avif),
            // Recognized but not a format the rule table knows; treat like
            // unrecognized content and let the extension fallback decide.
            _ => return None,
        }
    }

    // JPEG XL: bare codestream or ISO box container.
    if head.starts_with(&[0xFF, 0x0A])
        || head.starts_with(&[0x00, 0x00, 0x00, 0x0C, b'J', b'X', b'L', b' '])
    {
        return Some(ConcreteFormat::Jxl);
    }

    // ISO base media (mp4/mov): size field then 'ftyp' and a brand.
    if head.len() >= 12 && &head[4..8] == b"ftyp" {
        return match &head[8..10] {
            b"qt" => Some(ConcreteFormat::Mov),
            _ => Some(ConcreteFormat::Mp4),
        };
    }

    // EBML (mkv/webm): magic then a DocType string further in.
    if head.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        if contains(head, b"webm") {
            return Some(ConcreteFormat::Webm);
        }
        return Some(ConcreteFormat::Mkv);
    }

    // RIFF AVI.
    if head.len() >= 12 && &head[0..4] == b"RIFF" && &head[8..12] == b"AVI " {
        return Some(ConcreteFormat::Avi);
    }

    None
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
