//! Full-run orchestration: scan, classify, convert, finalize.
//!
//! Conversions for both profiles run as a cross product on a bounded tokio
//! worker pool. Per-file failures are recorded and the run completes
//! degraded; only cancellation or an unusable source tree aborts it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use packsmith_common::{Error, FailureKind, TargetProfile};

use crate::assembler::{ArchiveAssembler, Archiver};
use crate::manifest::{Manifest, ManifestEntry, Outcome};
use crate::pipeline::{Codec, ConversionExecutor};
use crate::rules;
use crate::scanner::{self, FormatClassifier, SourceFile};

/// Result of one profile within a run.
#[derive(Debug)]
pub struct ProfileSummary {
    pub profile: TargetProfile,
    pub tree: PathBuf,
    pub artifact: PathBuf,
    pub succeeded: usize,
    pub copied: usize,
    pub failed: usize,
}

/// Result of a complete processing run.
#[derive(Debug)]
pub struct RunSummary {
    pub source: PathBuf,
    pub files_scanned: usize,
    pub profiles: Vec<ProfileSummary>,
}

impl RunSummary {
    /// Whether any entry failed; the run still completed.
    pub fn is_degraded(&self) -> bool {
        self.profiles.iter().any(|p| p.failed > 0)
    }

    pub fn total_failed(&self) -> usize {
        self.profiles.iter().map(|p| p.failed).sum()
    }
}

/// Staged output tree for a source directory under a profile
/// (`pack` -> `pack_archive`, `pack_dist`), created next to the source.
pub fn tree_path(source: &Path, profile: TargetProfile) -> Result<PathBuf> {
    let name = source_name(source)?;
    Ok(source.with_file_name(format!("{name}{}", profile.tree_suffix())))
}

/// Final container artifact for a source directory under a profile
/// (`pack` -> `pack.7z`, `pack.zip`).
pub fn artifact_path(source: &Path, profile: TargetProfile) -> Result<PathBuf> {
    let name = source_name(source)?;
    Ok(source.with_file_name(format!("{name}.{}", profile.container().extension())))
}

fn source_name(source: &Path) -> Result<String> {
    source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("source has no directory name: {}", source.display()))
}

/// Drives a source directory through both profiles to finished archives.
pub struct Orchestrator {
    codec: Arc<dyn Codec>,
    archiver: Arc<dyn Archiver>,
    workers: usize,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        codec: Arc<dyn Codec>,
        archiver: Arc<dyn Archiver>,
        workers: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            codec,
            archiver,
            workers: workers.max(1),
            cancel,
        }
    }

    /// Process `source` into both output trees and containers.
    ///
    /// # Errors
    ///
    /// Fails on an unusable source tree, cancellation, or a finalize step
    /// (manifest write, verification, packing) going wrong. Per-file codec
    /// failures do not error; they are reported in the summary.
    pub async fn run(&self, source: &Path) -> Result<RunSummary> {
        tracing::info!("scanning {}", source.display());
        let files = scanner::scan(source, &FormatClassifier::new())?;
        tracing::info!("classified {} files", files.len());

        let trees = self.prepare_trees(source)?;
        let entries = self.convert_all(&files, &trees).await?;

        tracing::info!("finalizing {} trees", trees.len());
        let mut profiles = Vec::new();
        for (profile, tree) in trees {
            let mut manifest = Manifest::new(profile);
            manifest.entries = entries
                .iter()
                .filter(|(p, _)| *p == profile)
                .map(|(_, e)| e.clone())
                .collect();
            manifest.sort_entries();
            manifest.save_in_tree(&tree)?;

            let destination = artifact_path(source, profile)?;
            let assembler = ArchiveAssembler::new(self.archiver.clone());
            let artifact = assembler.assemble(&tree, &manifest, &destination).await?;

            let succeeded = manifest
                .entries
                .iter()
                .filter(|e| e.outcome == Outcome::Succeeded)
                .count();
            let copied = manifest
                .entries
                .iter()
                .filter(|e| e.outcome == Outcome::CopiedUnchanged)
                .count();
            let failed = manifest.failed_count();

            tracing::info!(
                "{}: {} converted, {} copied, {} failed -> {}",
                profile,
                succeeded,
                copied,
                failed,
                artifact.display()
            );
            profiles.push(ProfileSummary {
                profile,
                tree,
                artifact,
                succeeded,
                copied,
                failed,
            });
        }

        Ok(RunSummary {
            source: source.to_path_buf(),
            files_scanned: files.len(),
            profiles,
        })
    }

    /// Create a fresh output tree per profile, replacing leftovers from a
    /// previous run.
    fn prepare_trees(&self, source: &Path) -> Result<Vec<(TargetProfile, PathBuf)>> {
        let mut trees = Vec::new();
        for profile in TargetProfile::ALL {
            let tree = tree_path(source, profile)?;
            if tree.exists() {
                tracing::warn!("replacing existing output tree {}", tree.display());
                std::fs::remove_dir_all(&tree)
                    .with_context(|| format!("failed to remove {}", tree.display()))?;
            }
            std::fs::create_dir_all(&tree)
                .with_context(|| format!("failed to create {}", tree.display()))?;
            trees.push((profile, tree));
        }
        Ok(trees)
    }

    /// Run the SourceFiles x profiles cross product on the worker pool.
    async fn convert_all(
        &self,
        files: &[SourceFile],
        trees: &[(TargetProfile, PathBuf)],
    ) -> Result<Vec<(TargetProfile, ManifestEntry)>> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let executor = Arc::new(ConversionExecutor::new(self.codec.clone()));
        let entries = Arc::new(Mutex::new(Vec::with_capacity(files.len() * trees.len())));

        // Normalized extensions can collide: `a.png` and `a.jpg` both map to
        // `a.jxl` under the archive profile. The first source to claim an
        // output path wins; later claimants fail instead of silently
        // overwriting the published file.
        let mut claimed: HashSet<(TargetProfile, PathBuf)> = HashSet::new();

        let mut tasks = JoinSet::new();
        for file in files {
            for (profile, tree) in trees {
                if self.cancel.is_cancelled() {
                    tasks.abort_all();
                    anyhow::bail!(Error::Cancelled);
                }

                let profile = *profile;
                let action = rules::resolve(profile, &file.classification);
                let output_rel = rules::output_path(
                    &file.relative_path,
                    action,
                    self.codec.dist_image_extension(),
                );
                if !claimed.insert((profile, output_rel.clone())) {
                    tracing::warn!(
                        "{}: output {:?} already claimed, failing {:?}",
                        profile,
                        output_rel,
                        file.relative_path
                    );
                    entries.lock().push((
                        profile,
                        ManifestEntry::failed(
                            file.relative_path.clone(),
                            action,
                            file.fingerprint,
                            FailureKind::IoFailure,
                            format!(
                                "output path already produced by another source: {}",
                                output_rel.display()
                            ),
                        ),
                    ));
                    continue;
                }

                let semaphore = semaphore.clone();
                let executor = executor.clone();
                let entries = entries.clone();
                let file = file.clone();
                let tree = tree.clone();

                tasks.spawn(async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .map_err(|_| Error::internal("worker pool closed"))?;
                    let entry = executor.execute(&file, action, &tree).await?;
                    entries.lock().push((profile, entry));
                    Ok::<(), Error>(())
                });
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(Error::Cancelled)) => {
                    tasks.abort_all();
                    anyhow::bail!(Error::Cancelled);
                }
                Ok(Err(e)) => {
                    tasks.abort_all();
                    return Err(e.into());
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => anyhow::bail!("conversion task panicked: {e}"),
            }
        }

        let entries = Arc::try_unwrap(entries)
            .map_err(|_| anyhow::anyhow!("conversion tasks still hold results"))?
            .into_inner();
        Ok(entries)
    }
}
