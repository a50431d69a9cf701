//! Accumulate per-row outcomes into a [`RunResult`].

use crate::feature::{GeocodeOutcome, PointFeature};
use crate::report::{ExecutionMode, RunIssue, RunReport, RunResult, RunStatus};
use crate::row::Row;

/// Collects one feature per processed row and keeps the counters in step.
///
/// An aggregator belongs to exactly one run and is never shared between
/// threads.
///
/// # Examples
///
/// ```
/// use csvpoints_core::{
///     Coordinates, ExecutionMode, GeocodeOutcome, ResultAggregator, Row, RunStatus,
/// };
///
/// let mut aggregator = ResultAggregator::with_capacity(2);
/// let row = Row::from_pairs([("address", "Osaka")]);
/// let osaka = Coordinates::new(34.7, 135.5)?;
/// aggregator.record(GeocodeOutcome::resolved(osaka), &row);
/// aggregator.record(GeocodeOutcome::failed("no result"), &row);
///
/// let result = aggregator.finalize(ExecutionMode::Synchronous, RunStatus::Completed);
/// assert_eq!(result.report.added, 1);
/// assert_eq!(result.report.failed, 1);
/// assert_eq!(result.features.len(), 2);
/// # Ok::<(), csvpoints_core::CoordinateError>(())
/// ```
#[derive(Debug, Default)]
pub struct ResultAggregator {
    features: Vec<PointFeature>,
    added: usize,
    failed: usize,
    resolved: usize,
    skipped: usize,
    issue: Option<RunIssue>,
}

impl ResultAggregator {
    /// Empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty aggregator with room for `rows` features.
    #[must_use]
    pub fn with_capacity(rows: usize) -> Self {
        Self {
            features: Vec::with_capacity(rows),
            ..Self::default()
        }
    }

    /// Attach the cause of a degraded run to the final report.
    pub fn set_issue(&mut self, issue: RunIssue) {
        self.issue = Some(issue);
    }

    /// Append the feature for `row` and bump the matching counter.
    pub fn record(&mut self, outcome: GeocodeOutcome, row: &Row) {
        match &outcome {
            GeocodeOutcome::Resolved { .. } => {
                self.added += 1;
                self.resolved += 1;
            }
            GeocodeOutcome::Failed { .. } => self.failed += 1,
            GeocodeOutcome::Skipped { .. } => {
                self.added += 1;
                self.skipped += 1;
            }
        }
        self.features
            .push(PointFeature::from_outcome(row.clone(), &outcome));
    }

    /// Rows recorded so far.
    #[must_use]
    pub const fn processed(&self) -> usize {
        self.features.len()
    }

    /// Freeze the counters and hand over the features.
    #[must_use]
    pub fn finalize(self, mode: ExecutionMode, status: RunStatus) -> RunResult {
        RunResult {
            report: RunReport {
                mode: Some(mode),
                status,
                added: self.added,
                failed: self.failed,
                resolved: self.resolved,
                skipped: self.skipped,
                issue: self.issue,
            },
            features: self.features,
        }
    }
}
