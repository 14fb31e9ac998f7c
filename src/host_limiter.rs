//! Per-host request limiting
//!
//! The HostLimiter caps the number of in-flight requests to any single host.
//! Callers may submit many requests concurrently; requests to the same host
//! queue on a shared semaphore and execute at most `limit` at a time.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Shared per-host concurrency limiter
///
/// Cloning is cheap and clones share the same semaphores.
#[derive(Clone)]
pub struct HostLimiter {
    /// Permits per host
    limit: usize,
    /// One semaphore per host, created on first use
    hosts: Arc<Mutex<HashMap<String, Arc<Semaphore>>>>,
}

impl HostLimiter {
    /// Create a limiter allowing `limit` concurrent requests per host (minimum 1)
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            hosts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Permits per host
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Wait for a request slot on the host of `url`
    ///
    /// The slot is released when the returned permit is dropped, so callers
    /// keep it alive until the response body has been consumed.
    pub async fn acquire(&self, url: &url::Url) -> Result<OwnedSemaphorePermit> {
        let semaphore = self.semaphore_for(&host_key(url));
        // Only a closed semaphore fails, which means the limiter is shutting down
        semaphore.acquire_owned().await.map_err(|_| Error::Cancelled)
    }

    fn semaphore_for(&self, host: &str) -> Arc<Semaphore> {
        let mut hosts = match self.hosts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(
            hosts
                .entry(host.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.limit))),
        )
    }

    /// Permits currently free for the host of `url`
    pub fn available(&self, url: &url::Url) -> usize {
        self.semaphore_for(&host_key(url)).available_permits()
    }
}

/// Host plus explicit port, so mock servers on different ports stay independent
fn host_key(url: &url::Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}
