//! Remote media API access
//!
//! [`MediaSource`] is the capability the pipeline talks to: resolve titles to
//! page records, and stream a file's bytes to disk. [`CommonsClient`]
//! is the production implementation against the MediaWiki `action=query`
//! API, decoding responses through an explicit schema so malformed payloads
//! are rejected at the boundary.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::host_limiter::HostLimiter;
use crate::types::{ExtMetadata, ImageVariant, MetadataValue, PageRecord};
use crate::utils::create_file;
use serde::Deserialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Abstraction over the remote media service, enabling testability.
#[async_trait::async_trait]
pub trait MediaSource: Send + Sync {
    /// Resolve a batch of titles
    ///
    /// Returns `(page id, record)` pairs in response order.
    async fn query(&self, titles: &[String]) -> Result<Vec<(String, PageRecord)>>;

    /// Stream the content at `url` into a new file at `path`, returning the
    /// bytes written
    ///
    /// The file is created only once the response has started, so a request
    /// still waiting for its turn holds no file handle and leaves nothing on
    /// disk.
    async fn download(&self, url: &str, path: &Path) -> Result<u64>;
}

/// Production [`MediaSource`] backed by `reqwest`
pub struct CommonsClient {
    http: reqwest::Client,
    api_url: url::Url,
    limiter: HostLimiter,
}

impl CommonsClient {
    /// Create a client from configuration
    ///
    /// # Errors
    /// Returns error if the API URL is invalid or the HTTP client cannot be built
    pub fn new(config: &Config) -> Result<Self> {
        let api_url = url::Url::parse(&config.api_url)?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_ENCODING,
            reqwest::header::HeaderValue::from_static("gzip"),
        );

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent_header())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            api_url,
            limiter: HostLimiter::new(config.max_requests_per_host),
        })
    }

    /// Build the query URL for a batch of titles
    pub fn query_url(&self, titles: &[String]) -> url::Url {
        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("action", "query")
            .append_pair("titles", &titles.join("|"))
            .append_pair("prop", "imageinfo")
            .append_pair("iiprop", "extmetadata|url");
        url
    }
}

#[async_trait::async_trait]
impl MediaSource for CommonsClient {
    async fn query(&self, titles: &[String]) -> Result<Vec<(String, PageRecord)>> {
        let url = self.query_url(titles);
        let _permit = self.limiter.acquire(&url).await?;

        tracing::debug!(titles = titles.len(), url = %url, "Sending query");
        let response = self.http.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        parse_query_response(&body)
    }

    async fn download(&self, url: &str, path: &Path) -> Result<u64> {
        let url = url::Url::parse(url)?;
        let _permit = self.limiter.acquire(&url).await?;

        let mut response = self.http.get(url).send().await?.error_for_status()?;
        let mut file = create_file(path).await?;
        let io_error = |source| Error::IoAt {
            path: path.to_path_buf(),
            source,
        };

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await.map_err(io_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_error)?;
        Ok(written)
    }
}

/// Decode a `query` response body into page records
///
/// # Errors
/// Returns [`Error::Serialization`] for invalid JSON or a page that does not
/// match the schema, and [`Error::MalformedResponse`] when `query.pages` is
/// missing (for example an API error payload).
pub fn parse_query_response(body: &str) -> Result<Vec<(String, PageRecord)>> {
    let response: RawResponse = serde_json::from_str(body)?;
    let query = match response.query {
        Some(query) => query,
        None => {
            let detail = response
                .error
                .map(|e| format!("{}: {}", e.code, e.info))
                .unwrap_or_else(|| "missing 'query' object".to_string());
            return Err(Error::MalformedResponse(detail));
        }
    };
    let pages = query
        .pages
        .ok_or_else(|| Error::MalformedResponse("missing 'query.pages' object".to_string()))?;

    pages
        .into_iter()
        .map(|(id, value)| {
            let page: RawPage = serde_json::from_value(value)?;
            Ok((id, page.into()))
        })
        .collect()
}

// Wire schema. `pages` stays a JSON map so its key order survives decoding.

#[derive(Deserialize)]
struct RawResponse {
    query: Option<RawQuery>,
    error: Option<RawApiError>,
}

#[derive(Deserialize)]
struct RawApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Deserialize)]
struct RawQuery {
    pages: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Deserialize)]
struct RawPage {
    title: String,
    #[serde(default)]
    imageinfo: Option<Vec<RawImageInfo>>,
}

#[derive(Deserialize)]
struct RawImageInfo {
    descriptionurl: String,
    url: String,
    #[serde(default)]
    extmetadata: Option<RawExtMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawExtMetadata {
    #[serde(default)]
    artist: Option<RawValue>,
    #[serde(default)]
    license_short_name: Option<RawValue>,
    #[serde(default)]
    license_url: Option<RawValue>,
}

#[derive(Deserialize)]
struct RawValue {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

impl From<RawPage> for PageRecord {
    fn from(raw: RawPage) -> Self {
        PageRecord {
            title: raw.title,
            image_info: raw
                .imageinfo
                .unwrap_or_default()
                .into_iter()
                .map(ImageVariant::from)
                .collect(),
        }
    }
}

impl From<RawImageInfo> for ImageVariant {
    fn from(raw: RawImageInfo) -> Self {
        let ext_metadata = raw
            .extmetadata
            .map(|m| ExtMetadata {
                artist: m.artist.map(MetadataValue::from),
                license_short_name: m.license_short_name.map(MetadataValue::from),
                license_url: m.license_url.map(MetadataValue::from),
            })
            .unwrap_or_default();
        ImageVariant {
            description_url: raw.descriptionurl,
            url: raw.url,
            ext_metadata,
        }
    }
}

impl From<RawValue> for MetadataValue {
    fn from(raw: RawValue) -> Self {
        MetadataValue {
            value: raw.value.unwrap_or_default(),
            source: raw.source,
        }
    }
}
