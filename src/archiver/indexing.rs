//! Index stage: read-modify-write of the Markdown index file.

use std::io::SeekFrom;
use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::index;
use crate::types::IndexEntry;
use crate::utils::ensure_file_exists;

/// Merge `entries` into the index at `path`.
///
/// The file is created (with its parent directories) when missing, then
/// read, rewritten from the start and truncated to the new length, all
/// through a single open handle.
pub(super) async fn update_index(path: &Path, entries: Vec<IndexEntry>) -> Result<()> {
    tracing::info!(count = entries.len(), "Indexing {} files", entries.len());

    ensure_file_exists(path).await?;

    let io_error = |source| Error::IoAt {
        path: path.to_path_buf(),
        source,
    };
    let mut file = tokio::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .await
        .map_err(io_error)?;

    let mut text = String::new();
    file.read_to_string(&mut text).await.map_err(io_error)?;

    let merged = index::merge(&text, entries);

    file.seek(SeekFrom::Start(0)).await.map_err(io_error)?;
    file.write_all(merged.as_bytes()).await.map_err(io_error)?;
    file.flush().await.map_err(io_error)?;
    file.set_len(merged.len() as u64).await.map_err(io_error)?;

    tracing::debug!(path = %path.display(), bytes = merged.len(), "Index written");
    Ok(())
}
