//! Utility functions for titles, inputs and file creation

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::Path;

/// Derive a filename from a page title
///
/// Strips everything up to and including the first `:`. Titles without a
/// namespace prefix are returned unchanged.
///
/// # Examples
///
/// ```
/// use commons_archivist::utils::derived_filename;
///
/// assert_eq!(derived_filename("File:Example.jpg"), "Example.jpg");
/// assert_eq!(derived_filename("File:Ratio 1:2.png"), "Ratio 1:2.png");
/// assert_eq!(derived_filename("Example.jpg"), "Example.jpg");
/// ```
#[must_use]
pub fn derived_filename(title: &str) -> &str {
    match title.split_once(':') {
        Some((_, rest)) => rest,
        None => title,
    }
}

/// Remove duplicate inputs, keeping the first occurrence of each
#[must_use]
pub fn dedupe_preserving_order(inputs: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(inputs.len());
    inputs
        .iter()
        .filter(|input| seen.insert(input.as_str()))
        .cloned()
        .collect()
}

/// Create (or truncate) a file for writing, tagging errors with its path
pub async fn create_file(path: &Path) -> Result<tokio::fs::File> {
    tokio::fs::File::create(path)
        .await
        .map_err(|source| Error::IoAt {
            path: path.to_path_buf(),
            source,
        })
}

/// Make sure a file exists without truncating it
///
/// Creates missing parent directories, then creates the file only if it is
/// absent. An existing file is left untouched.
pub async fn ensure_file_exists(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| Error::IoAt {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(_) => {
            tracing::debug!(path = %path.display(), "Created empty file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(source) => Err(Error::IoAt {
            path: path.to_path_buf(),
            source,
        }),
    }
}
