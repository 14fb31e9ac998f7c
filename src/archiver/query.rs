//! Query stage: batched metadata requests and page merging.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::aggregate::handle_partial_errors;
use crate::client::MediaSource;
use crate::error::Result;
use crate::types::PageRecord;

use super::join_units;

/// Resolve `inputs` into page records.
///
/// Inputs are split into batches of `batch_size`, one request per batch, all
/// submitted at once. Returns whether individual batch failures were ignored,
/// plus the merged pages.
pub(super) async fn query_pages(
    source: Arc<dyn MediaSource>,
    inputs: &[String],
    batch_size: usize,
    ignore_individual_errors: bool,
    cancel_token: &CancellationToken,
) -> Result<(bool, Vec<PageRecord>)> {
    tracing::info!(count = inputs.len(), "Querying {} files", inputs.len());

    let units = inputs.chunks(batch_size.max(1)).map(|batch| {
        let source = Arc::clone(&source);
        let batch = batch.to_vec();
        async move { source.query(&batch).await }
    });
    let outcomes = join_units(cancel_token, units).await;

    let (partial, batches) =
        handle_partial_errors(outcomes, ignore_individual_errors, "Error querying")?;
    let pages = merge_pages(batches);
    tracing::debug!(pages = pages.len(), "Query merged");
    Ok((partial, pages))
}

/// Merge batch results keyed by page id.
///
/// A page keeps the position where its id was first seen; when a later batch
/// returns the same id, its record replaces the earlier one.
pub(super) fn merge_pages(batches: Vec<Vec<(String, PageRecord)>>) -> Vec<PageRecord> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut pages: Vec<PageRecord> = Vec::new();

    for (id, page) in batches.into_iter().flatten() {
        match positions.get(&id) {
            Some(&position) => pages[position] = page,
            None => {
                positions.insert(id, pages.len());
                pages.push(page);
            }
        }
    }

    pages
}
