//! Image and video dimension probing via ffprobe.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::command::ToolCommand;
use crate::tools::Toolchain;
use crate::{Error, Result};

/// Probe the pixel dimensions of the first video stream (images count as a
/// single-frame video stream to ffprobe).
///
/// # Errors
///
/// Returns [`Error::ToolFailed`] when ffprobe cannot read the file and
/// [`Error::ParseError`] when its output is not `WIDTHxHEIGHT`.
pub async fn dimensions(
    tc: &Toolchain,
    cancel: &CancellationToken,
    input: &Path,
) -> Result<(u32, u32)> {
    let output = ToolCommand::new(tc.ffprobe.clone())
        .arg("-v")
        .arg("error")
        .arg("-select_streams")
        .arg("v:0")
        .arg("-show_entries")
        .arg("stream=width,height")
        .arg("-of")
        .arg("csv=s=x:p=0")
        .arg(input.to_string_lossy())
        .cancel_token(cancel.clone())
        .execute()
        .await?;

    parse_dimensions(output.stdout.trim())
}

fn parse_dimensions(s: &str) -> Result<(u32, u32)> {
    let mut parts = s.split('x');
    let width = parts
        .next()
        .and_then(|w| w.trim().parse::<u32>().ok())
        .ok_or_else(|| Error::parse_error("ffprobe", format!("bad dimensions: {s:?}")))?;
    let height = parts
        .next()
        .and_then(|h| h.trim().parse::<u32>().ok())
        .ok_or_else(|| Error::parse_error("ffprobe", format!("bad dimensions: {s:?}")))?;

    if width == 0 || height == 0 {
        return Err(Error::parse_error(
            "ffprobe",
            format!("zero dimension: {s:?}"),
        ));
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(parse_dimensions("1920x1080").unwrap(), (1920, 1080));
        assert_eq!(parse_dimensions("640x480").unwrap(), (640, 480));
    }

    #[test]
    fn test_parse_dimensions_rejects_garbage() {
        assert!(parse_dimensions("").is_err());
        assert!(parse_dimensions("1920").is_err());
        assert!(parse_dimensions("x1080").is_err());
        assert!(parse_dimensions("axb").is_err());
        assert!(parse_dimensions("0x100").is_err());
    }

    #[test]
    fn test_parse_dimensions_with_trailing_field() {
        // ffprobe sometimes emits a trailing separator field; the first two
        // components are what matter.
        assert_eq!(parse_dimensions("800x600x").unwrap(), (800, 600));
    }
}
