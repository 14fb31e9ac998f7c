//! Shared fixtures for archiver tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::client::MediaSource;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{ExtMetadata, ImageVariant, MetadataValue, PageRecord};
use crate::utils::create_file;

use super::Archiver;

/// In-memory [`MediaSource`] that records every call
#[derive(Default)]
pub(crate) struct FakeSource {
    /// Title -> (page id, record) returned by queries; unknown titles are omitted
    pub(crate) pages: HashMap<String, (String, PageRecord)>,
    /// URL -> body served by downloads; unknown URLs fail
    pub(crate) files: HashMap<String, Vec<u8>>,
    /// Titles whose batch fails with an ordinary error
    pub(crate) failing_titles: Vec<String>,
    /// URLs whose download never completes
    pub(crate) hanging_urls: Vec<String>,
    /// Batches received, in call order
    pub(crate) queries: Mutex<Vec<Vec<String>>>,
    /// URLs downloaded, in call order
    pub(crate) downloads: Mutex<Vec<String>>,
}

impl FakeSource {
    /// Register a page with one image variant served at `https://upload.test/<filename>`
    pub(crate) fn with_file(mut self, id: &str, title: &str, body: &[u8]) -> Self {
        let page = page_with_image(title);
        let url = page.image_info[0].url.clone();
        self.pages
            .insert(title.to_string(), (id.to_string(), page));
        self.files.insert(url, body.to_vec());
        self
    }

    /// Register a page without image information
    pub(crate) fn with_missing_image(mut self, id: &str, title: &str) -> Self {
        let page = PageRecord {
            title: title.to_string(),
            image_info: vec![],
        };
        self.pages
            .insert(title.to_string(), (id.to_string(), page));
        self
    }

    pub(crate) fn query_calls(&self) -> Vec<Vec<String>> {
        self.queries.lock().unwrap().clone()
    }

    pub(crate) fn download_calls(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MediaSource for FakeSource {
    async fn query(&self, titles: &[String]) -> Result<Vec<(String, PageRecord)>> {
        self.queries.lock().unwrap().push(titles.to_vec());
        tokio::task::yield_now().await;

        if titles.iter().any(|t| self.failing_titles.contains(t)) {
            return Err(Error::MalformedResponse(format!(
                "batch starting with '{}' failed",
                titles[0]
            )));
        }
        Ok(titles
            .iter()
            .filter_map(|title| self.pages.get(title).cloned())
            .collect())
    }

    async fn download(&self, url: &str, path: &Path) -> Result<u64> {
        self.downloads.lock().unwrap().push(url.to_string());

        if self.hanging_urls.iter().any(|u| u == url) {
            futures::future::pending::<()>().await;
        }
        let body = self
            .files
            .get(url)
            .ok_or_else(|| Error::Io(std::io::Error::other(format!("no such file: {url}"))))?;
        let mut file = create_file(path).await?;
        for chunk in body.chunks(8) {
            tokio::task::yield_now().await;
            file.write_all(chunk).await?;
        }
        file.flush().await?;
        Ok(body.len() as u64)
    }
}

/// Page with one image variant and no extended metadata
pub(crate) fn page_with_image(title: &str) -> PageRecord {
    let filename = crate::utils::derived_filename(title);
    PageRecord {
        title: title.to_string(),
        image_info: vec![ImageVariant {
            description_url: format!("https://commons.test/wiki/{title}"),
            url: format!("https://upload.test/{filename}"),
            ext_metadata: ExtMetadata::default(),
        }],
    }
}

/// Page with author and license metadata
pub(crate) fn page_with_credit(title: &str, artist: &str, license: &str) -> PageRecord {
    let mut page = page_with_image(title);
    page.image_info[0].ext_metadata = ExtMetadata {
        artist: Some(MetadataValue::new(artist)),
        license_short_name: Some(MetadataValue::new(license)),
        license_url: None,
    };
    page
}

/// Archiver over `source` with default configuration
pub(crate) fn archiver(source: Arc<FakeSource>) -> Archiver {
    Archiver::new(source, Config::default(), CancellationToken::new())
}
