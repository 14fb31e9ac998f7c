//! Configuration types for commons-archivist

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Maximum number of titles the API accepts in one query
pub const MAX_TITLES_PER_QUERY: usize = 50;

/// Remote service configuration
///
/// Every field has a default, so an empty JSON object (or no config file at
/// all) targets Wikimedia Commons with the polite settings of one in-flight
/// request per host.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// MediaWiki API endpoint (default: Wikimedia Commons)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Service name used at the end of credit lines (default: "Wikimedia Commons")
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Product part of the user agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Contact details (email or URL) added to the user agent, as the
    /// Wikimedia user-agent policy asks of API clients
    #[serde(default)]
    pub contact: Option<String>,

    /// Titles per metadata query (default: 50, capped at 50)
    #[serde(default = "default_query_batch_size")]
    pub query_batch_size: usize,

    /// Maximum in-flight requests per host (default: 1)
    #[serde(default = "default_max_requests_per_host")]
    pub max_requests_per_host: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            service_name: default_service_name(),
            user_agent: default_user_agent(),
            contact: None,
            query_batch_size: default_query_batch_size(),
            max_requests_per_host: default_max_requests_per_host(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::IoAt {
                path: path.to_path_buf(),
                source,
            })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.api_url)?;
        if self.query_batch_size == 0 {
            return Err(Error::config(
                "query_batch_size",
                "query batch size must be at least 1",
            ));
        }
        if self.max_requests_per_host == 0 {
            return Err(Error::config(
                "max_requests_per_host",
                "at least one request per host must be allowed",
            ));
        }
        if let Some(contact) = &self.contact
            && (contact.trim().is_empty() || contact.chars().any(char::is_control))
        {
            return Err(Error::config(
                "contact",
                "contact must be a non-empty single line",
            ));
        }
        Ok(())
    }

    /// `User-Agent` header value, with the contact in parentheses after the
    /// product token when one is configured
    ///
    /// ```
    /// use commons_archivist::Config;
    ///
    /// let config = Config {
    ///     user_agent: "archivist/1.0 reqwest/0.11".to_string(),
    ///     contact: Some("ops@example.org".to_string()),
    ///     ..Default::default()
    /// };
    /// assert_eq!(
    ///     config.user_agent_header(),
    ///     "archivist/1.0 (ops@example.org) reqwest/0.11"
    /// );
    /// ```
    pub fn user_agent_header(&self) -> String {
        let Some(contact) = self.contact.as_deref().map(str::trim) else {
            return self.user_agent.clone();
        };
        match self.user_agent.split_once(' ') {
            Some((product, rest)) => format!("{} ({}) {}", product, contact, rest),
            None => format!("{} ({})", self.user_agent, contact),
        }
    }

    /// Batch size actually used, never above the API limit
    pub fn effective_batch_size(&self) -> usize {
        self.query_batch_size.clamp(1, MAX_TITLES_PER_QUERY)
    }
}

fn default_api_url() -> String {
    "https://commons.wikimedia.org/w/api.php".to_string()
}

fn default_service_name() -> String {
    "Wikimedia Commons".to_string()
}

fn default_user_agent() -> String {
    concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION"),
        " reqwest/0.11"
    )
    .to_string()
}

fn default_query_batch_size() -> usize {
    MAX_TITLES_PER_QUERY
}

fn default_max_requests_per_host() -> usize {
    1
}

/// Inputs of a single archive run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Args {
    /// Page titles to archive, in request order (duplicates allowed)
    pub inputs: Vec<String>,
    /// Destination directory for fetched files
    pub dest: PathBuf,
    /// Optional Markdown index file
    pub index: Option<PathBuf>,
    /// Continue when individual queries or fetches fail
    pub ignore_individual_errors: bool,
}

impl Args {
    /// Create arguments with no index and strict error handling
    pub fn new(
        inputs: impl IntoIterator<Item = impl Into<String>>,
        dest: impl Into<PathBuf>,
    ) -> Self {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            dest: dest.into(),
            index: None,
            ignore_individual_errors: false,
        }
    }

    /// Set the index file
    #[must_use]
    pub fn with_index(mut self, index: impl Into<PathBuf>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Set whether individual failures are tolerated
    #[must_use]
    pub fn ignore_individual_errors(mut self, ignore: bool) -> Self {
        self.ignore_individual_errors = ignore;
        self
    }

    /// Validate paths and inputs
    ///
    /// `dest` must be an existing directory or a path that does not exist yet;
    /// `index`, when set, must be an existing file or a path that does not
    /// exist yet.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(Error::config("inputs", "at least one input is required"));
        }
        if self.dest.exists() && !self.dest.is_dir() {
            return Err(Error::config(
                "dest",
                format!("{} exists and is not a directory", self.dest.display()),
            ));
        }
        if let Some(index) = &self.index
            && index.exists()
            && !index.is_file()
        {
            return Err(Error::config(
                "index",
                format!("{} exists and is not a file", index.display()),
            ));
        }
        Ok(())
    }
}
