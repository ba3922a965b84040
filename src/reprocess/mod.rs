//! Dist archive reprocessing.
//!
//! Rebuilds the dist container from an already-staged (possibly hand-edited)
//! dist tree. Every entry is revalidated against the files on disk; no
//! classifier, rule table, or codec runs. The archive profile is never
//! touched.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use packsmith_common::{FailureKind, TargetProfile};

use crate::assembler::ArchiveAssembler;
use crate::manifest::{Fingerprint, Manifest, Outcome};

/// Result of a reprocessing run.
#[derive(Debug)]
pub struct ReprocessSummary {
    pub tree: PathBuf,
    pub artifact: PathBuf,
    /// Entries whose staged output validated (fingerprint refreshed).
    pub validated: usize,
    /// Entries newly marked manifest-inconsistent because their staged
    /// output disappeared.
    pub inconsistent: usize,
    /// Entries already failed in the recorded run.
    pub previously_failed: usize,
}

impl ReprocessSummary {
    pub fn is_degraded(&self) -> bool {
        self.inconsistent > 0 || self.previously_failed > 0
    }
}

/// Container artifact for a dist tree (`pack_dist` -> `pack.zip`), created
/// next to the tree.
pub fn artifact_path(tree: &Path) -> Result<PathBuf> {
    let name = tree
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("tree has no directory name: {}", tree.display()))?;
    let base = name.strip_suffix(TargetProfile::Dist.tree_suffix()).unwrap_or(&name);
    let extension = TargetProfile::Dist.container().extension();
    Ok(tree.with_file_name(format!("{base}.{extension}")))
}

/// Revalidate a staged dist tree against its manifest and rebuild the zip.
///
/// Entries whose output file still exists get their output fingerprint
/// refreshed from disk, so manual edits are accepted as-is. Entries whose
/// output is gone are marked failed with kind `manifest-inconsistent` and
/// excluded from the rebuilt archive. Entries are never added or removed.
pub async fn reprocess(tree: &Path, assembler: &ArchiveAssembler) -> Result<ReprocessSummary> {
    let mut manifest = Manifest::load_from_tree(tree)?;
    if manifest.profile != TargetProfile::Dist {
        anyhow::bail!(
            "{} holds a {} manifest; only dist trees can be reprocessed",
            tree.display(),
            manifest.profile
        );
    }

    let mut validated = 0;
    let mut inconsistent = 0;
    let mut previously_failed = 0;

    for entry in &mut manifest.entries {
        if entry.outcome.is_failed() {
            previously_failed += 1;
            continue;
        }

        // Non-failed entries always carry an output path.
        let Some(output_rel) = entry.output_path.clone() else {
            continue;
        };
        let output = tree.join(&output_rel);

        match Fingerprint::of_file(&output) {
            Ok(fingerprint) => {
                entry.output_fingerprint = Some(fingerprint);
                validated += 1;
            }
            Err(_) => {
                tracing::warn!(
                    "staged output missing for {:?}, excluding from rebuild",
                    entry.source_path
                );
                entry.output_path = None;
                entry.output_fingerprint = None;
                entry.outcome = Outcome::Failed {
                    kind: FailureKind::ManifestInconsistent,
                    message: format!("staged output missing: {}", output_rel.display()),
                };
                inconsistent += 1;
            }
        }
    }

    manifest.save_in_tree(tree)?;

    let destination = artifact_path(tree)?;
    let artifact = assembler.assemble(tree, &manifest, &destination).await?;

    tracing::info!(
        "reprocessed {}: {} validated, {} inconsistent -> {}",
        tree.display(),
        validated,
        inconsistent,
        artifact.display()
    );

    Ok(ReprocessSummary {
        tree: tree.to_path_buf(),
        artifact,
        validated,
        inconsistent,
        previously_failed,
    })
}
