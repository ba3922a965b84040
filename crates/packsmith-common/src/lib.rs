//! Packsmith-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across packsmith:
//!
//! - **Core Types**: Target profiles, media kinds, concrete formats, and
//!   conversion actions
//! - **Path Utilities**: Extension normalization for classification fallback
//! - **Error Handling**: The per-file failure taxonomy and result aliases
//!
//! # Examples
//!
//! ```
//! use packsmith_common::{TargetProfile, MediaKind, ConcreteFormat};
//!
//! assert_eq!(ConcreteFormat::from_extension("png"), Some(ConcreteFormat::Png));
//! assert_eq!(ConcreteFormat::Png.media_kind(), MediaKind::Image);
//! assert_eq!(TargetProfile::Archive.tree_suffix(), "_archive");
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, FailureKind, Result};
pub use types::*;
