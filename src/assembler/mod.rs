//! Final archive assembly.
//!
//! Verifies a finished output tree against its manifest, then packs it into
//! the profile's container. Compression goes through an [`Archiver`] trait so
//! tests can assemble without a real 7z binary.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use packsmith_codecs::compress;
use packsmith_codecs::tools::Toolchain;
use packsmith_common::{Container, Error, Result};

use crate::manifest::{Manifest, MANIFEST_FILE_NAME};

/// Packs a finished tree into a container.
#[async_trait]
pub trait Archiver: Send + Sync {
    async fn pack(
        &self,
        tree: &Path,
        destination: &Path,
        container: Container,
    ) -> packsmith_codecs::Result<PathBuf>;
}

/// Production archiver shelling out to 7z.
pub struct SevenZipArchiver {
    toolchain: Toolchain,
    cancel: CancellationToken,
}

impl SevenZipArchiver {
    pub fn new(toolchain: Toolchain, cancel: CancellationToken) -> Self {
        Self { toolchain, cancel }
    }
}

#[async_trait]
impl Archiver for SevenZipArchiver {
    async fn pack(
        &self,
        tree: &Path,
        destination: &Path,
        container: Container,
    ) -> packsmith_codecs::Result<PathBuf> {
        compress::compress_dir(
            &self.toolchain,
            &self.cancel,
            tree,
            destination,
            container.sevenzip_type(),
        )
        .await
    }
}

/// Check that the files on disk are exactly the manifest's non-failed outputs
/// plus the manifest file itself.
///
/// # Errors
///
/// Lists every missing and stray path in the error message.
pub fn verify_tree(tree: &Path, manifest: &Manifest) -> Result<()> {
    let mut expected = manifest.expected_outputs();
    expected.insert(PathBuf::from(MANIFEST_FILE_NAME));

    let mut actual = BTreeSet::new();
    for entry in WalkDir::new(tree) {
        let entry = entry.map_err(|e| Error::io_failure(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(tree)
            .map_err(|e| Error::internal(e.to_string()))?;
        actual.insert(rel.to_path_buf());
    }

    let missing: Vec<_> = expected.difference(&actual).collect();
    let stray: Vec<_> = actual.difference(&expected).collect();

    if missing.is_empty() && stray.is_empty() {
        return Ok(());
    }

    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing: {missing:?}"));
    }
    if !stray.is_empty() {
        parts.push(format!("stray: {stray:?}"));
    }
    Err(Error::invalid_input(format!(
        "tree {} does not match its manifest ({})",
        tree.display(),
        parts.join("; ")
    )))
}

/// Verifies and packs finished trees.
pub struct ArchiveAssembler {
    archiver: Arc<dyn Archiver>,
}

impl ArchiveAssembler {
    pub fn new(archiver: Arc<dyn Archiver>) -> Self {
        Self { archiver }
    }

    /// Verify `tree` against `manifest`, then pack it into the manifest
    /// profile's container at `destination`.
    pub async fn assemble(
        &self,
        tree: &Path,
        manifest: &Manifest,
        destination: &Path,
    ) -> Result<PathBuf> {
        verify_tree(tree, manifest)?;

        let container = manifest.profile.container();
        tracing::info!(
            "packing {} ({} entries) -> {}",
            tree.display(),
            manifest.entries.len(),
            destination.display()
        );

        let artifact = self
            .archiver
            .pack(tree, destination, container)
            .await
            .map_err(|e| {
                if e.is_cancelled() {
                    Error::Cancelled
                } else {
                    Error::codec_failure(e.to_string())
                }
            })?;

        Ok(artifact)
    }
}
