use super::{CheckResult, Checker};
use crate::options::Options;
use crate::runner::{run_check, CommandCall, CommandRunner, SystemRunner};
use std::path::Path;

const CLIPPY: &str = "cargo-clippy";
const LLVM_COV: &str = "cargo-llvm-cov";

/// Checks for Cargo projects. Everything goes through `cargo`; clippy and
/// llvm-cov are optional subcommands.
#[derive(Debug, Default)]
pub struct RustChecker<R = SystemRunner> {
    runner: R,
}

impl RustChecker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: CommandRunner> RustChecker<R> {
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    fn cargo(&self, name: &str, args: &[&str], dir: &Path, opts: &Options) -> CheckResult {
        let call = CommandCall::new("cargo", args.iter().copied())
            .in_dir(dir)
            .with_timeout(opts.timeout);
        run_check(&self.runner, name, &call)
    }

    fn optional(&self, tool: &str, name: &str, args: &[&str], dir: &Path, opts: &Options) -> CheckResult {
        if !self.runner.exists(tool) {
            tracing::debug!(tool, "skipping, tool not installed");
            return CheckResult::skip(name, format!("{tool} not installed"));
        }
        self.cargo(name, args, dir, opts)
    }
}

impl<R: CommandRunner> Checker for RustChecker<R> {
    fn name(&self) -> &str {
        "Rust"
    }

    fn check(&self, dir: &Path, opts: &Options) -> Vec<CheckResult> {
        let mut results = Vec::new();

        if opts.format {
            results.push(self.cargo("Rust: rustfmt", &["fmt", "--all", "--", "--check"], dir, opts));
        }
        if opts.lint {
            results.push(self.optional(
                CLIPPY,
                "Rust: clippy",
                &["clippy", "--all-targets", "--", "-D", "warnings"],
                dir,
                opts,
            ));
        }
        if opts.test {
            results.push(self.cargo("Rust: tests", &["test", "--workspace"], dir, opts));
        }
        if opts.coverage {
            let coverage = self.optional(
                LLVM_COV,
                "Rust: coverage",
                &["llvm-cov", "--workspace", "--summary-only"],
                dir,
                opts,
            );
            results.push(if coverage.skipped {
                coverage
            } else {
                coverage.into_informational()
            });
        }

        results
    }
}
