//! Source tree scanning.
//!
//! Walks the source directory recursively and produces one [`SourceFile`]
//! per regular file, classified and fingerprinted, in a deterministic
//! lexicographic order.

mod classifier;

pub use classifier::FormatClassifier;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use packsmith_common::Classification;

use crate::manifest::Fingerprint;

/// One file discovered in the source tree.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path relative to the scan root. Mirrored into the output trees.
    pub relative_path: PathBuf,
    /// Absolute path on disk.
    pub absolute_path: PathBuf,
    pub classification: Classification,
    pub fingerprint: Fingerprint,
}

/// Scan a source directory, classifying every regular file.
///
/// Hidden files and empty directories are skipped. Symlinks are not
/// followed. The returned list is sorted by relative path.
pub fn scan(root: &Path, classifier: &FormatClassifier) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        anyhow::bail!("source is not a directory: {}", root.display());
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to scan {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if is_hidden(entry.file_name().to_string_lossy().as_ref()) {
            tracing::debug!("skipping hidden file {:?}", entry.path());
            continue;
        }

        let absolute_path = entry.path().to_path_buf();
        let relative_path = absolute_path
            .strip_prefix(root)
            .with_context(|| format!("path escapes scan root: {}", absolute_path.display()))?
            .to_path_buf();

        let classification = classifier.classify(&absolute_path);
        let fingerprint = Fingerprint::of_file(&absolute_path)
            .with_context(|| format!("failed to stat {}", absolute_path.display()))?;

        files.push(SourceFile {
            relative_path,
            absolute_path,
            classification,
            fingerprint,
        });
    }

    // sort_by_file_name orders siblings, not full relative paths.
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    tracing::info!("scanned {} files under {}", files.len(), root.display());
    Ok(files)
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use packsmith_common::{ConcreteFormat, MediaKind};
    use tempfile::tempdir;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_scan_sorted_and_classified() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("b.txt"), b"text").unwrap();
        std::fs::write(dir.path().join("a.png"), PNG_MAGIC).unwrap();
        std::fs::write(dir.path().join("sub/c.png"), PNG_MAGIC).unwrap();

        let files = scan(dir.path(), &FormatClassifier::new()).unwrap();

        let rel: Vec<_> = files.iter().map(|f| f.relative_path.clone()).collect();
        assert_eq!(
            rel,
            vec![
                PathBuf::from("a.png"),
                PathBuf::from("b.txt"),
                PathBuf::from("sub/c.png"),
            ]
        );
        assert_eq!(files[0].classification.format(), ConcreteFormat::Png);
        assert_eq!(files[1].classification.media_kind(), MediaKind::Other);
    }

    #[test]
    fn test_scan_skips_hidden_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".DS_Store"), b"junk").unwrap();
        std::fs::write(dir.path().join("kept.txt"), b"text").unwrap();

        let files = scan(dir.path(), &FormatClassifier::new()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, PathBuf::from("kept.txt"));
    }

    #[test]
    fn test_scan_rejects_non_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"x").unwrap();

        assert!(scan(&file, &FormatClassifier::new()).is_err());
        assert!(scan(&dir.path().join("missing"), &FormatClassifier::new()).is_err());
    }

    #[test]
    fn test_scan_empty_directory() {
        let dir = tempdir().unwrap();
        let files = scan(dir.path(), &FormatClassifier::new()).unwrap();
        assert!(files.is_empty());
    }
}
