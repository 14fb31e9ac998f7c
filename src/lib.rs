//! # commons-archivist
//!
//! Archive media files from Wikimedia Commons together with their
//! attribution credits.
//!
//! A run takes a list of file titles, resolves them through the MediaWiki
//! API, downloads each file into a destination directory, and optionally
//! merges one credit line per file into a Markdown index.
//!
//! ## Design Philosophy
//!
//! - **Partial failures are first-class** - A single bad file does not have
//!   to sink the whole job; the exit code says which stages were affected
//! - **Polite by default** - One request in flight per host, batched queries
//! - **Library-first** - The CLI is a thin wrapper over [`Archiver`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use commons_archivist::{Archiver, Args, Config};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let archiver = Archiver::from_config(Config::default(), CancellationToken::new())?;
//!
//!     let args = Args::new(["File:Example.jpg"], "media").with_index("media/README.md");
//!     let exit_code = archiver.run(&args).await;
//!
//!     std::process::exit(exit_code.into());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Partial-failure aggregation
pub mod aggregate;
/// Query, fetch and index pipeline
pub mod archiver;
/// Remote media API client
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Credit and index line formatting
pub mod formatter;
/// Per-host request limiting
pub mod host_limiter;
/// Markdown index parsing and rendering
pub mod index;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use aggregate::{Outcome, handle_partial_errors};
pub use archiver::Archiver;
pub use client::{CommonsClient, MediaSource};
pub use config::{Args, Config};
pub use error::{Error, ErrorGroup, Result};
pub use index::IndexDocument;
pub use types::{ExitCode, IndexEntry, PageRecord, Stage};

use tokio_util::sync::CancellationToken;

/// Cancel `token` when the process is asked to stop.
///
/// Listens for Ctrl+C everywhere and for SIGTERM on unix. Returns without
/// cancelling anything once `token` is cancelled by someone else, so it can
/// be spawned next to a run and awaited afterwards.
///
/// # Example
///
/// ```no_run
/// use commons_archivist::{Archiver, Args, Config, cancel_on_signal};
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let token = CancellationToken::new();
///     tokio::spawn(cancel_on_signal(token.clone()));
///
///     let archiver = Archiver::from_config(Config::default(), token)?;
///     archiver.run(&Args::new(["File:Example.jpg"], "media")).await;
///     Ok(())
/// }
/// ```
pub async fn cancel_on_signal(token: CancellationToken) {
    tokio::select! {
        signal = stop_requested() => {
            tracing::warn!(signal, "Cancelling run");
            token.cancel();
        }
        _ = token.cancelled() => {}
    }
}

/// Resolve with the name of the first stop signal received
///
/// A listener that cannot be registered never fires instead of failing the run.
async fn stop_requested() -> &'static str {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for Ctrl+C");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending().await
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    }
}
