//! Per-run manifest: the durable record that makes reprocessing possible.
//!
//! One manifest per output tree, persisted as pretty JSON inside the tree
//! root so it travels with the staged files and stays human-inspectable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use packsmith_common::{ConversionAction, Error, FailureKind, Result, TargetProfile};

/// File name of the persisted manifest inside an output tree.
pub const MANIFEST_FILE_NAME: &str = ".packsmith-manifest.json";

/// Cheap content-identity check: size plus modification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// File size in bytes.
    pub len: u64,
    /// Modification time as unix seconds.
    pub modified_unix: i64,
}

impl Fingerprint {
    /// Fingerprint a file on disk.
    pub fn of_file(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        let modified_unix = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        Ok(Self {
            len: meta.len(),
            modified_unix,
        })
    }
}

/// Final status of one (source file, profile) conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Conversion ran and produced output.
    Succeeded,
    /// Verbatim copy, byte-identical to the source.
    CopiedUnchanged,
    /// Conversion failed; no output exists for this entry.
    Failed { kind: FailureKind, message: String },
}

impl Outcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Record of one source file's conversion under one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Path relative to the source root.
    pub source_path: PathBuf,
    /// Action the rule table chose.
    pub action: ConversionAction,
    /// Output path relative to the tree root; present unless the entry failed.
    pub output_path: Option<PathBuf>,
    /// Fingerprint of the source at conversion time.
    pub source_fingerprint: Fingerprint,
    /// Fingerprint of the staged output; refreshed during reprocess
    /// validation so manually edited files are accepted as-is.
    pub output_fingerprint: Option<Fingerprint>,
    pub outcome: Outcome,
}

impl ManifestEntry {
    /// Build a failed entry for the given source.
    pub fn failed(
        source_path: PathBuf,
        action: ConversionAction,
        source_fingerprint: Fingerprint,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source_path,
            action,
            output_path: None,
            source_fingerprint,
            output_fingerprint: None,
            outcome: Outcome::Failed {
                kind,
                message: message.into(),
            },
        }
    }
}

/// Durable record of one profile's run over a source tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub profile: TargetProfile,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Create an empty manifest for a profile.
    pub fn new(profile: TargetProfile) -> Self {
        Self {
            profile,
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Path of the manifest file inside a tree.
    pub fn path_in_tree(tree: &Path) -> PathBuf {
        tree.join(MANIFEST_FILE_NAME)
    }

    /// Persist as pretty JSON inside the tree root.
    pub fn save_in_tree(&self, tree: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::internal(format!("failed to serialize manifest: {e}")))?;
        std::fs::write(Self::path_in_tree(tree), json)?;
        Ok(())
    }

    /// Load the manifest persisted inside a tree root.
    pub fn load_from_tree(tree: &Path) -> Result<Self> {
        let path = Self::path_in_tree(tree);
        let content = std::fs::read_to_string(&path).map_err(|_| {
            Error::invalid_input(format!("no manifest found in tree: {}", tree.display()))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| Error::invalid_input(format!("corrupt manifest {}: {e}", path.display())))
    }

    /// Number of failed entries.
    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_failed()).count()
    }

    /// Relative output paths of all non-failed entries.
    pub fn expected_outputs(&self) -> BTreeSet<PathBuf> {
        self.entries
            .iter()
            .filter(|e| !e.outcome.is_failed())
            .filter_map(|e| e.output_path.clone())
            .collect()
    }

    /// Sort entries lexicographically by source path so repeated runs over an
    /// unchanged source produce identical manifests.
    pub fn sort_entries(&mut self) {
        self.entries.sort_by(|a, b| a.source_path.cmp(&b.source_path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packsmith_common::ConversionAction;
    use tempfile::tempdir;

    fn entry(source: &str, output: Option<&str>, outcome: Outcome) -> ManifestEntry {
        ManifestEntry {
            source_path: PathBuf::from(source),
            action: ConversionAction::Copy,
            output_path: output.map(PathBuf::from),
            source_fingerprint: Fingerprint {
                len: 10,
                modified_unix: 1_700_000_000,
            },
            output_fingerprint: None,
            outcome,
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();

        let mut manifest = Manifest::new(TargetProfile::Dist);
        manifest.entries.push(entry(
            "page01.png",
            Some("page01.avif"),
            Outcome::Succeeded,
        ));
        manifest.entries.push(entry(
            "broken.png",
            None,
            Outcome::Failed {
                kind: FailureKind::CodecFailure,
                message: "ffmpeg exited with status 1".into(),
            },
        ));
        manifest.save_in_tree(dir.path()).unwrap();

        let loaded = Manifest::load_from_tree(dir.path()).unwrap();
        assert_eq!(loaded.profile, TargetProfile::Dist);
        assert_eq!(loaded.entries, manifest.entries);
    }

    #[test]
    fn test_load_missing_manifest() {
        let dir = tempdir().unwrap();
        assert!(Manifest::load_from_tree(dir.path()).is_err());
    }

    #[test]
    fn test_expected_outputs_skip_failed() {
        let mut manifest = Manifest::new(TargetProfile::Archive);
        manifest
            .entries
            .push(entry("a.png", Some("a.jxl"), Outcome::Succeeded));
        manifest
            .entries
            .push(entry("b.txt", Some("b.txt"), Outcome::CopiedUnchanged));
        manifest.entries.push(entry(
            "c.png",
            None,
            Outcome::Failed {
                kind: FailureKind::UnsupportedInput,
                message: "truncated".into(),
            },
        ));

        let outputs = manifest.expected_outputs();
        assert_eq!(outputs.len(), 2);
        assert!(outputs.contains(Path::new("a.jxl")));
        assert!(outputs.contains(Path::new("b.txt")));
        assert_eq!(manifest.failed_count(), 1);
    }

    #[test]
    fn test_sort_entries() {
        let mut manifest = Manifest::new(TargetProfile::Dist);
        manifest.entries.push(entry("b.png", None, Outcome::Succeeded));
        manifest.entries.push(entry("a.png", None, Outcome::Succeeded));
        manifest.sort_entries();
        assert_eq!(manifest.entries[0].source_path, PathBuf::from("a.png"));
    }

    #[test]
    fn test_fingerprint_of_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"hello").unwrap();

        let fp = Fingerprint::of_file(&path).unwrap();
        assert_eq!(fp.len, 5);
        assert!(fp.modified_unix > 0);

        assert!(Fingerprint::of_file(&dir.path().join("missing")).is_err());
    }
}
