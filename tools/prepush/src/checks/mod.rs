pub mod golang;
pub mod rust;

#[cfg(test)]
pub(crate) mod fake;

use crate::error::ExecError;
use crate::options::Options;
use std::path::Path;
use std::time::Duration;

pub use golang::GoChecker;
pub use rust::RustChecker;

/// Outcome of one discrete check. Built once by a checker, then only read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CheckResult {
    pub name: String,
    /// Not authoritative when `skipped` is set.
    pub passed: bool,
    pub skipped: bool,
    /// Present iff `skipped`.
    pub reason: Option<String>,
    pub output: String,
    /// Present iff the check could not run cleanly.
    pub error: Option<ExecError>,
    /// Advisory check whose outcome never blocks a push.
    pub informational: bool,
    pub elapsed: Duration,
}

/// Terminal state of a check as seen by the reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Passed,
    Failed,
    Skipped,
    /// Forced-pass informational check whose tool did not succeed.
    Warning,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            output: output.into(),
            ..Self::default()
        }
    }

    /// Tool ran fine but its output shows a problem.
    pub fn fail(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn errored(name: impl Into<String>, error: ExecError, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            output: output.into(),
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn skip(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            skipped: true,
            reason: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Mark as advisory: always passes, keeps any error for the report.
    pub fn into_informational(self) -> Self {
        Self {
            passed: true,
            informational: true,
            ..self
        }
    }

    pub fn with_elapsed(self, elapsed: Duration) -> Self {
        Self { elapsed, ..self }
    }

    pub fn status(&self) -> Status {
        if self.skipped {
            Status::Skipped
        } else if self.informational && self.error.is_some() {
            Status::Warning
        } else if self.passed && self.error.is_none() {
            Status::Passed
        } else {
            Status::Failed
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status() == Status::Failed
    }
}

/// A set of checks for one language or ecosystem.
pub trait Checker: Send + Sync {
    fn name(&self) -> &str;

    /// Run every enabled sub-check in `dir`, in order. Disabled categories are
    /// left out entirely; a missing optional tool yields a skipped result.
    fn check(&self, dir: &Path, opts: &Options) -> Vec<CheckResult>;
}
