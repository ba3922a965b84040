//! Staging area for codec output with atomic publication.
//!
//! Codecs write into a temp directory first; the finished file is renamed
//! into its destination only on success, so a failed or cancelled conversion
//! never leaves partial output behind.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{Error, Result};

/// Staging area for one conversion.
///
/// # Example
///
/// ```no_run
/// use packsmith_codecs::StagingArea;
/// use std::path::Path;
///
/// let dest = Path::new("/pack_dist/page01.avif");
/// let staging = StagingArea::for_destination(dest)?;
/// let staged = staging.staged_path();
/// // ... run the codec writing to `staged` ...
/// staging.publish()?;
/// # Ok::<(), packsmith_codecs::Error>(())
/// ```
pub struct StagingArea {
    temp_dir: TempDir,
    staged_path: PathBuf,
    destination: PathBuf,
}

impl StagingArea {
    /// Create a staging area for the given destination file.
    ///
    /// The temp directory is created next to the destination so publication
    /// is a same-filesystem rename.
    pub fn for_destination<P: AsRef<Path>>(destination: P) -> Result<Self> {
        let destination = destination.as_ref().to_path_buf();
        let parent = destination
            .parent()
            .ok_or_else(|| Error::InvalidInput("destination has no parent directory".into()))?;
        std::fs::create_dir_all(parent)?;

        let temp_dir = tempfile::Builder::new()
            .prefix(".packsmith-staging-")
            .tempdir_in(parent)
            .map_err(|e| Error::Staging(e.to_string()))?;

        let file_name = destination
            .file_name()
            .ok_or_else(|| Error::InvalidInput("destination has no file name".into()))?;
        let staged_path = temp_dir.path().join(file_name);

        Ok(Self {
            temp_dir,
            staged_path,
            destination,
        })
    }

    /// Path the codec should write to.
    pub fn staged_path(&self) -> &Path {
        &self.staged_path
    }

    /// Extra scratch file inside the staging directory (for multi-step
    /// conversions such as upscale-then-encode).
    pub fn scratch_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Atomically move the staged file to its destination.
    ///
    /// # Errors
    ///
    /// Fails if the codec produced no output, or produced an empty file, or
    /// the rename itself fails.
    pub fn publish(self) -> Result<PathBuf> {
        let meta = std::fs::metadata(&self.staged_path).map_err(|_| {
            Error::Staging(format!(
                "staged output does not exist: {}",
                self.staged_path.display()
            ))
        })?;

        if meta.len() == 0 {
            return Err(Error::Staging(format!(
                "staged output is empty: {}",
                self.staged_path.display()
            )));
        }

        std::fs::rename(&self.staged_path, &self.destination).map_err(|e| {
            Error::Staging(format!(
                "failed to publish {}: {e}",
                self.destination.display()
            ))
        })?;

        Ok(self.destination)
    }

    /// Discard the staged output without publishing.
    pub fn discard(self) {
        // TempDir cleans up on drop.
        drop(self.temp_dir);
    }
}
