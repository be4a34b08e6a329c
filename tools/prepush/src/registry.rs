use crate::checks::{CheckResult, Checker, GoChecker, RustChecker};
use crate::detect::Detection;
use crate::error::ExecError;
use crate::options::Options;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

/// Maps language tags to the checker that handles them.
#[derive(Default)]
pub struct Registry {
    checkers: Vec<(String, Box<dyn Checker>)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in checker.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("go", GoChecker::new());
        registry.register("rust", RustChecker::new());
        registry
    }

    /// Register `checker` for `language`, replacing any previous one.
    pub fn register(&mut self, language: impl Into<String>, checker: impl Checker + 'static) {
        let language = language.into();
        let checker: Box<dyn Checker> = Box::new(checker);
        match self.checkers.iter_mut().find(|(tag, _)| *tag == language) {
            Some(slot) => slot.1 = checker,
            None => self.checkers.push((language, checker)),
        }
    }

    pub fn get(&self, language: &str) -> Option<&dyn Checker> {
        self.checkers
            .iter()
            .find(|(tag, _)| tag == language)
            .map(|(_, checker)| checker.as_ref())
    }

    pub fn languages(&self) -> Vec<&str> {
        self.checkers.iter().map(|(tag, _)| tag.as_str()).collect()
    }

    /// Run the matching checker for every detection and flatten the results,
    /// in detection order then checker order. Unregistered languages are
    /// dropped silently.
    pub fn run(&self, detections: &[Detection], opts: &Options) -> Vec<CheckResult> {
        let jobs: Vec<(&Detection, &dyn Checker)> = detections
            .iter()
            .filter_map(|detection| match self.get(&detection.language) {
                Some(checker) => Some((detection, checker)),
                None => {
                    tracing::debug!(language = %detection.language, "no checker registered");
                    None
                }
            })
            .collect();

        if !opts.parallel || jobs.len() < 2 {
            return jobs
                .into_iter()
                .flat_map(|(detection, checker)| {
                    panic::catch_unwind(AssertUnwindSafe(|| checker.check(&detection.path, opts)))
                        .unwrap_or_else(|_| panicked(checker.name()))
                })
                .collect();
        }

        thread::scope(|scope| {
            let handles: Vec<_> = jobs
                .iter()
                .map(|&(detection, checker)| {
                    let handle = scope.spawn(move || checker.check(&detection.path, opts));
                    (checker.name(), handle)
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|(name, handle)| handle.join().unwrap_or_else(|_| panicked(name)))
                .collect()
        })
    }
}

/// Stand-in result for a checker that panicked instead of reporting.
fn panicked(name: &str) -> Vec<CheckResult> {
    tracing::warn!(checker = name, "checker panicked");
    vec![CheckResult::errored(
        format!("{name}: checker panicked"),
        ExecError::Spawn {
            program: name.to_string(),
            message: "checker panicked".to_string(),
        },
        "",
    )]
}
