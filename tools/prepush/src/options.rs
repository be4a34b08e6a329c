use std::time::Duration;

/// Coverage exclusion used when nothing else is configured: skip the
/// command entry points under `cmd/`.
pub const DEFAULT_GO_EXCLUDE_COVERAGE: &str = "cmd";

/// Read-only configuration threaded through the registry and every checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub test: bool,
    pub lint: bool,
    pub format: bool,
    /// Informational only; never blocks a push.
    pub coverage: bool,
    pub go_exclude_coverage: String,
    pub verbose: bool,
    /// Kill any single tool invocation that runs longer than this.
    pub timeout: Option<Duration>,
    /// Run checkers for different detections on separate threads.
    pub parallel: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            test: true,
            lint: true,
            format: true,
            coverage: false,
            go_exclude_coverage: DEFAULT_GO_EXCLUDE_COVERAGE.to_string(),
            verbose: false,
            timeout: None,
            parallel: false,
        }
    }
}

pub fn default_options() -> Options {
    Options::default()
}
