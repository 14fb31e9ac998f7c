//! Partial-failure aggregation for concurrent batches
//!
//! Every unit of work in a batch ends in an [`Outcome`]. After the batch is
//! joined, [`handle_partial_errors`] decides whether the batch as a whole
//! fails or continues with the successful values.

use crate::error::{Error, ErrorGroup, Result};

/// Result of one unit of work in a concurrent batch
#[derive(Debug)]
pub enum Outcome<T> {
    /// The unit produced a value
    Success(T),
    /// The unit failed with an ordinary error that may be tolerated
    Failed(Error),
    /// The unit was interrupted; never tolerated
    Fatal(Error),
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(e) if e.is_fatal() => Outcome::Fatal(e),
            Err(e) => Outcome::Failed(e),
        }
    }
}

/// Split a joined batch into values and failures
///
/// - Any fatal outcome: returns a fatal group holding *all* failures, in
///   batch order, regardless of `ignore_individual_errors`.
/// - Ordinary failures and `ignore_individual_errors == false`: returns a
///   group of those failures.
/// - Ordinary failures and `ignore_individual_errors == true`: logs the
///   group and returns `(true, successes)`.
/// - No failures: returns `(false, values)`.
///
/// Successful values keep their original order.
pub fn handle_partial_errors<T>(
    results: impl IntoIterator<Item = Outcome<T>>,
    ignore_individual_errors: bool,
    error_message: &str,
) -> std::result::Result<(bool, Vec<T>), ErrorGroup> {
    let mut values = Vec::new();
    let mut errors = Vec::new();
    let mut fatal = false;

    for outcome in results {
        match outcome {
            Outcome::Success(value) => values.push(value),
            Outcome::Failed(e) => errors.push(e),
            Outcome::Fatal(e) => {
                fatal = true;
                errors.push(e);
            }
        }
    }

    if fatal {
        return Err(ErrorGroup::new(error_message, errors, true));
    }
    if errors.is_empty() {
        return Ok((false, values));
    }

    let group = ErrorGroup::new(error_message, errors, false);
    if !ignore_individual_errors {
        return Err(group);
    }

    tracing::error!(
        failures = group.len(),
        succeeded = values.len(),
        error = %group,
        "{}",
        error_message
    );
    Ok((true, values))
}
