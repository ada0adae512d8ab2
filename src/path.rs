//! Path helpers used by the resolvers.

use std::path::Path;

/// Returns the last and second-to-last extensions of the file name in `path`.
///
/// Extensions are returned without their leading dot and are empty when absent.
/// `page.html.tmpl` yields `("tmpl", "html")`, `notes.txt` yields `("txt", "")`.
/// A leading dot (hidden files) does not start an extension.
pub fn split_extensions(path: impl AsRef<Path>) -> (String, String) {
    let path = path.as_ref();
    let Some(first) = path.extension().and_then(|e| e.to_str()) else {
        return (String::new(), String::new());
    };

    let second = path
        .file_stem()
        .map(Path::new)
        .and_then(|stem| stem.extension())
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    (first.to_string(), second.to_string())
}

/// Whether `path` exists and is a directory (symlinks are followed).
pub fn is_dir(path: impl AsRef<Path>) -> bool {
    std::fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

/// Whether `path` exists and is a regular file (symlinks are followed).
pub fn is_file(path: impl AsRef<Path>) -> bool {
    std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}
