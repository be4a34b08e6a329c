use crate::error::ConfigError;
use crate::options::Options;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = ".prepush.json";

/// Per-repository overrides read from `.prepush.json`. Unset fields keep
/// whatever the caller already had.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub struct FileConfig {
    pub test: Option<bool>,
    pub lint: Option<bool>,
    pub format: Option<bool>,
    pub coverage: Option<bool>,
    pub go_exclude_coverage: Option<String>,
    pub verbose: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub parallel: Option<bool>,
}

impl FileConfig {
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE)
    }

    /// Load the config for `dir`. A missing file is an empty config.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path_in(dir);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn apply(&self, mut opts: Options) -> Options {
        if let Some(test) = self.test {
            opts.test = test;
        }
        if let Some(lint) = self.lint {
            opts.lint = lint;
        }
        if let Some(format) = self.format {
            opts.format = format;
        }
        if let Some(coverage) = self.coverage {
            opts.coverage = coverage;
        }
        if let Some(exclude) = &self.go_exclude_coverage {
            opts.go_exclude_coverage = exclude.clone();
        }
        if let Some(verbose) = self.verbose {
            opts.verbose = verbose;
        }
        if let Some(secs) = self.timeout_secs {
            opts.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(parallel) = self.parallel {
            opts.parallel = parallel;
        }
        opts
    }
}
