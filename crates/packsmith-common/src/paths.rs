//! Path utilities.

use std::path::Path;

/// Lowercased extension of a path, if any.
///
/// The classifier's extension fallback normalizes through this before
/// mapping to a concrete format.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use packsmith_common::paths::lowercase_extension;
///
/// assert_eq!(lowercase_extension(Path::new("page.PNG")), Some("png".to_string()));
/// assert_eq!(lowercase_extension(Path::new("no_extension")), None);
/// ```
pub fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}
