//! Fetch stage: concurrent downloads streamed to the destination directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::aggregate::handle_partial_errors;
use crate::client::MediaSource;
use crate::error::{Error, Result};
use crate::formatter;
use crate::types::{IndexEntry, PageRecord};

use super::join_units;

/// Download the primary image of every page into `dest`.
///
/// Returns whether individual failures were ignored, plus one index entry
/// per fetched file in page order.
pub(super) async fn fetch_pages(
    source: Arc<dyn MediaSource>,
    pages: Vec<PageRecord>,
    dest: &Path,
    service_name: &str,
    ignore_individual_errors: bool,
    cancel_token: &CancellationToken,
) -> Result<(bool, Vec<IndexEntry>)> {
    tracing::info!(count = pages.len(), "Fetching {} files", pages.len());

    tokio::fs::create_dir_all(dest)
        .await
        .map_err(|source| Error::IoAt {
            path: dest.to_path_buf(),
            source,
        })?;

    let units = pages.into_iter().map(|page| {
        fetch_page(
            Arc::clone(&source),
            page,
            dest.to_path_buf(),
            service_name.to_string(),
        )
    });
    let outcomes = join_units(cancel_token, units).await;

    Ok(handle_partial_errors(
        outcomes,
        ignore_individual_errors,
        "Error fetching",
    )?)
}

/// Fetch one page to `<dest>/<filename>` and format its index entry.
///
/// The target file is opened by the source once its request is under way,
/// so units queued behind the per-host limit hold no file handles.
async fn fetch_page(
    source: Arc<dyn MediaSource>,
    page: PageRecord,
    dest: PathBuf,
    service_name: String,
) -> Result<IndexEntry> {
    let filename = page.filename().to_string();
    let (image, credit) = match (page.primary_image(), formatter::credit(&page, &service_name)) {
        (Some(image), Some(credit)) => (image, credit),
        _ => return Err(Error::MissingImageInfo { filename }),
    };

    tracing::info!(filename = %filename, "Fetching '{}'", filename);
    let bytes = source.download(&image.url, &dest.join(&filename)).await?;
    tracing::debug!(filename = %filename, bytes, "Fetched");

    Ok(IndexEntry {
        line: formatter::index_line(&filename, &credit),
        filename,
    })
}
