use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why an external tool invocation did not succeed.
///
/// Kept `Clone + PartialEq` so a [`CheckResult`](crate::checks::CheckResult)
/// stays plain data that can be compared and re-reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("{program}: executable file not found in $PATH")]
    NotFound { program: String },

    #[error("{program}: failed to start: {message}")]
    Spawn { program: String, message: String },

    #[error("{program}: {}", exit_description(.code))]
    ExitStatus { program: String, code: Option<i32> },

    #[error("{program}: timed out after {limit:?}")]
    TimedOut { program: String, limit: Duration },

    #[error("{program}: unexpected output: {message}")]
    InvalidOutput { program: String, message: String },
}

fn exit_description(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
