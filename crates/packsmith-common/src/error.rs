//! Common error types used throughout packsmith.
//!
//! Per-file conversion failures are classified into a small taxonomy so the
//! orchestrator can record them in the manifest without aborting the run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a recorded per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The source file is corrupt or unreadable by the codec.
    UnsupportedInput,
    /// An external codec errored or exited non-zero.
    CodecFailure,
    /// The destination could not be written.
    IoFailure,
    /// A manifest entry's staged output is missing during reprocessing.
    ManifestInconsistent,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedInput => write!(f, "unsupported-input"),
            Self::CodecFailure => write!(f, "codec-failure"),
            Self::IoFailure => write!(f, "io-failure"),
            Self::ManifestInconsistent => write!(f, "manifest-inconsistent"),
        }
    }
}

/// Common error type for packsmith.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A conversion failed in a way attributable to one source file.
    #[error("{kind}: {message}")]
    Conversion { kind: FailureKind, message: String },

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The run was cancelled before completion.
    #[error("Cancelled")]
    Cancelled,

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an unsupported-input conversion error.
    pub fn unsupported_input<S: Into<String>>(msg: S) -> Self {
        Self::Conversion {
            kind: FailureKind::UnsupportedInput,
            message: msg.into(),
        }
    }

    /// Create a codec-failure conversion error.
    pub fn codec_failure<S: Into<String>>(msg: S) -> Self {
        Self::Conversion {
            kind: FailureKind::CodecFailure,
            message: msg.into(),
        }
    }

    /// Create an io-failure conversion error.
    pub fn io_failure<S: Into<String>>(msg: S) -> Self {
        Self::Conversion {
            kind: FailureKind::IoFailure,
            message: msg.into(),
        }
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// The failure kind to record in the manifest for this error.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::Conversion { kind, .. } => *kind,
            Self::Io(_) => FailureKind::IoFailure,
            _ => FailureKind::CodecFailure,
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::codec_failure("ffmpeg exited with status 1");
        assert_eq!(err.to_string(), "codec-failure: ffmpeg exited with status 1");

        let err = Error::unsupported_input("truncated png");
        assert_eq!(err.to_string(), "unsupported-input: truncated png");

        let err = Error::invalid_input("bad path");
        assert_eq!(err.to_string(), "Invalid input: bad path");
    }

    #[test]
    fn test_failure_kind_mapping() {
        assert_eq!(
            Error::codec_failure("x").failure_kind(),
            FailureKind::CodecFailure
        );
        assert_eq!(
            Error::io_failure("x").failure_kind(),
            FailureKind::IoFailure
        );
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(Error::from(io_err).failure_kind(), FailureKind::IoFailure);
    }

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(FailureKind::UnsupportedInput.to_string(), "unsupported-input");
        assert_eq!(
            FailureKind::ManifestInconsistent.to_string(),
            "manifest-inconsistent"
        );
    }
}
