//! Query → fetch → index pipeline.
//!
//! The `Archiver` runs one archive job and reports the outcome as
//! [`ExitCode`] flags. Its stages live in focused submodules:
//! - [`query`] - Batched metadata queries and page merging
//! - [`fetch`] - Concurrent file downloads and index entry formatting
//! - [`indexing`] - Read-modify-write of the Markdown index
//!
//! Every stage submits its units of work together, joins them in input
//! order, and hands the outcomes to
//! [`handle_partial_errors`](crate::aggregate::handle_partial_errors).

mod fetch;
mod indexing;
mod query;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::aggregate::Outcome;
use crate::client::{CommonsClient, MediaSource};
use crate::config::{Args, Config};
use crate::error::{Error, Result};
use crate::types::{ExitCode, Stage};
use crate::utils::dedupe_preserving_order;

/// Runs archive jobs against a [`MediaSource`]
///
/// The source and cancellation token are explicit dependencies so a run can
/// be driven by a mock service and interrupted from outside.
pub struct Archiver {
    source: Arc<dyn MediaSource>,
    config: Config,
    cancel_token: CancellationToken,
}

impl Archiver {
    /// Create an archiver over an existing source
    pub fn new(
        source: Arc<dyn MediaSource>,
        config: Config,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            source,
            config,
            cancel_token,
        }
    }

    /// Create an archiver talking to the API described by `config`
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client cannot be built
    pub fn from_config(config: Config, cancel_token: CancellationToken) -> Result<Self> {
        config.validate()?;
        let client = CommonsClient::new(&config)?;
        Ok(Self::new(Arc::new(client), config, cancel_token))
    }

    /// Run one archive job
    ///
    /// Never fails: every error is logged and folded into the returned flags.
    /// A stage that aborts sets its own flag plus [`ExitCode::GENERIC_ERROR`];
    /// tolerated individual failures set the stage's partial flag.
    pub async fn run(&self, args: &Args) -> ExitCode {
        let mut exit_code = ExitCode::default();
        if let Err(e) = self.try_run(args, &mut exit_code).await {
            tracing::error!(error = %e, "Error");
            exit_code |= ExitCode::GENERIC_ERROR;
        }
        exit_code
    }

    async fn try_run(&self, args: &Args, exit_code: &mut ExitCode) -> Result<()> {
        args.validate()?;
        let ignore = args.ignore_individual_errors;
        let inputs = dedupe_preserving_order(&args.inputs);

        let pages = self
            .run_stage(
                Stage::Query,
                exit_code,
                query::query_pages(
                    Arc::clone(&self.source),
                    &inputs,
                    self.config.effective_batch_size(),
                    ignore,
                    &self.cancel_token,
                ),
            )
            .await?;

        let entries = self
            .run_stage(
                Stage::Fetch,
                exit_code,
                fetch::fetch_pages(
                    Arc::clone(&self.source),
                    pages,
                    &args.dest,
                    &self.config.service_name,
                    ignore,
                    &self.cancel_token,
                ),
            )
            .await?;

        match &args.index {
            None => {
                tracing::info!("Skipped indexing");
            }
            Some(index) => {
                self.run_stage(Stage::Index, exit_code, async {
                    indexing::update_index(index, entries)
                        .await
                        .map(|()| (false, ()))
                })
                .await?;
            }
        }

        Ok(())
    }

    /// Run a stage, recording its partial or fatal outcome in `exit_code`
    async fn run_stage<T>(
        &self,
        stage: Stage,
        exit_code: &mut ExitCode,
        work: impl Future<Output = Result<(bool, T)>>,
    ) -> Result<T> {
        let result = if self.cancel_token.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            work.await
        };

        match result {
            Ok((partial, value)) => {
                if partial && let Some(flag) = stage.partial_flag() {
                    *exit_code |= flag;
                }
                Ok(value)
            }
            Err(e) => {
                tracing::error!(stage = %stage, error = %e, "Error {}", stage);
                *exit_code |= stage.error_flag();
                Err(e)
            }
        }
    }
}

/// Spawn every unit, wait for all of them, and collect outcomes in input order
///
/// Each unit races `cancel_token`; a cancelled unit ends as a fatal
/// [`Error::Cancelled`], and a panicked one as a fatal [`Error::Task`].
pub(crate) async fn join_units<T, F>(
    cancel_token: &CancellationToken,
    units: impl IntoIterator<Item = F>,
) -> Vec<Outcome<T>>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    let handles: Vec<_> = units
        .into_iter()
        .map(|unit| {
            let token = cancel_token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(Error::Cancelled),
                    result = unit => result,
                }
            })
        })
        .collect();

    join_all(handles)
        .await
        .into_iter()
        .map(|joined| match joined {
            Ok(result) => Outcome::from(result),
            Err(e) => Outcome::Fatal(Error::Task(e)),
        })
        .collect()
}
