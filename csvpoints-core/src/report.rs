//! Run summaries.

use std::fmt;

use crate::detect::MappingError;
use crate::feature::PointFeature;
use crate::registry::ProviderId;

/// How rows were turned into features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ExecutionMode {
    /// Coordinates read straight from columns, or attribute-only passthrough.
    Direct,
    /// Geocoded one row at a time on the caller's thread.
    Synchronous,
    /// Geocoded on a background worker with progress and cancellation.
    Asynchronous,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Direct => "direct",
            Self::Synchronous => "synchronous",
            Self::Asynchronous => "asynchronous",
        })
    }
}

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RunStatus {
    /// Every row was processed.
    Completed,
    /// The run was cancelled; counts cover the rows processed before that.
    Aborted,
    /// Rows were kept attribute-only because geocoding could not happen.
    Degraded,
    /// The column mapping cannot support any run path; nothing was produced.
    ConfigError,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::Degraded => "degraded",
            Self::ConfigError => "configuration error",
        })
    }
}

/// Why a run was refused or degraded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum RunIssue {
    /// Required column roles are not mapped.
    MissingRoles {
        /// The completeness check that failed.
        error: MappingError,
    },
    /// The selected provider has no usable credential.
    ProviderUnusable {
        /// The provider that was selected.
        provider: ProviderId,
    },
    /// The background worker could not be started.
    SchedulingFailure {
        /// Error reported by the spawner.
        message: String,
    },
}

impl fmt::Display for RunIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRoles { error } => write!(f, "cannot run: {error}"),
            Self::ProviderUnusable { provider } => write!(
                f,
                "{} is not configured; geocoding skipped",
                provider.display_name()
            ),
            Self::SchedulingFailure { message } => {
                write!(f, "background geocoding could not start: {message}")
            }
        }
    }
}

/// Counts and status describing a finished run.
///
/// `added` counts every feature produced, with or without geometry;
/// `failed` counts attempted rows that yielded nothing. `resolved` and
/// `skipped` break `added` down further.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunReport {
    /// Mode used, or `None` when the run was refused.
    pub mode: Option<ExecutionMode>,
    /// Terminal status.
    pub status: RunStatus,
    /// Rows emitted with geometry or as attribute-only passthrough.
    pub added: usize,
    /// Rows attempted without success.
    pub failed: usize,
    /// Rows emitted with geometry.
    pub resolved: usize,
    /// Rows emitted attribute-only without an attempt.
    pub skipped: usize,
    /// Cause of a refused or degraded run.
    pub issue: Option<RunIssue>,
}

impl RunReport {
    /// Report for a run refused because the mapping is incomplete.
    #[must_use]
    pub const fn config_error(error: MappingError) -> Self {
        Self {
            mode: None,
            status: RunStatus::ConfigError,
            added: 0,
            failed: 0,
            resolved: 0,
            skipped: 0,
            issue: Some(RunIssue::MissingRoles { error }),
        }
    }

    /// Rows accounted for by the run.
    #[must_use]
    pub const fn attempted(&self) -> usize {
        self.added.saturating_add(self.failed)
    }

    /// Short English summary suitable for a status line.
    ///
    /// # Examples
    ///
    /// ```
    /// use csvpoints_core::{ExecutionMode, RunReport, RunStatus};
    ///
    /// let report = RunReport {
    ///     mode: Some(ExecutionMode::Synchronous),
    ///     status: RunStatus::Completed,
    ///     added: 3,
    ///     failed: 1,
    ///     resolved: 3,
    ///     skipped: 0,
    ///     issue: None,
    /// };
    /// assert_eq!(
    ///     report.summary(),
    ///     "completed (synchronous): 3 added, 1 failed, 0 skipped"
    /// );
    /// ```
    #[must_use]
    pub fn summary(&self) -> String {
        let head = self.mode.map_or_else(
            || self.status.to_string(),
            |mode| format!("{} ({mode})", self.status),
        );
        let mut text = format!(
            "{head}: {} added, {} failed, {} skipped",
            self.added, self.failed, self.skipped
        );
        if let Some(issue) = &self.issue {
            text.push_str("; ");
            text.push_str(&issue.to_string());
        }
        text
    }
}

/// Report plus the features a run produced, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Counts and status.
    pub report: RunReport,
    /// Features for every processed row.
    pub features: Vec<PointFeature>,
}

impl RunResult {
    /// Result carrying no features.
    #[must_use]
    pub const fn empty(report: RunReport) -> Self {
        Self {
            report,
            features: Vec::new(),
        }
    }
}
