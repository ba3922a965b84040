//! Container creation via 7z.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::command::ToolCommand;
use crate::tools::Toolchain;
use crate::{Error, Result};

/// Archiving a large tree can legitimately take a while even at -mx1.
const COMPRESS_TIMEOUT: Duration = Duration::from_secs(3600);

/// Pack a directory's contents into a container at `destination`.
///
/// `container_type` is the 7z `-t` value (`7z` or `zip`). A pre-existing
/// destination is replaced. Runs 7z with the tree as working directory so
/// archive members carry tree-relative paths.
pub async fn compress_dir(
    tc: &Toolchain,
    cancel: &CancellationToken,
    tree: &Path,
    destination: &Path,
    container_type: &str,
) -> Result<PathBuf> {
    if !tree.is_dir() {
        return Err(Error::InvalidInput(format!(
            "not a directory: {}",
            tree.display()
        )));
    }

    if destination.exists() {
        std::fs::remove_file(destination)?;
    }

    // 7z resolves relative member paths against its working directory, so the
    // destination must be absolute before we chdir into the tree.
    let destination = std::path::absolute(destination)?;

    ToolCommand::new(tc.sevenzip.clone())
        .arg("a")
        .arg(format!("-t{container_type}"))
        .arg("-mx1")
        .arg("-y")
        .arg("-bd")
        .arg(destination.to_string_lossy())
        .arg(".")
        .current_dir(tree)
        .timeout(COMPRESS_TIMEOUT)
        .cancel_token(cancel.clone())
        .execute()
        .await?;

    if !destination.exists() {
        return Err(Error::tool_failed("7z", "no archive produced"));
    }

    Ok(destination)
}
