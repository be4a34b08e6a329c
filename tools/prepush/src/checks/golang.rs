use super::{CheckResult, Checker};
use crate::error::ExecError;
use crate::options::Options;
use crate::runner::{run_check, CommandCall, CommandRunner, SystemRunner};
use serde::Deserialize;
use std::path::Path;
use std::time::Instant;

const LINTER: &str = "golangci-lint";
const COVERAGE_TOOL: &str = "gocoverbadge";

/// Checks for Go modules: replace directives, gofmt, golangci-lint, tests and
/// an informational coverage badge.
#[derive(Debug, Default)]
pub struct GoChecker<R = SystemRunner> {
    runner: R,
}

/// Subset of `go mod edit -json` that matters here.
#[derive(Debug, Deserialize)]
struct GoModFile {
    #[serde(rename = "Replace", default)]
    replace: Option<Vec<Replace>>,
}

#[derive(Debug, Deserialize)]
struct Replace {
    #[serde(rename = "Old")]
    old: ModuleRef,
    #[serde(rename = "New")]
    new: ModuleRef,
}

#[derive(Debug, Deserialize)]
struct ModuleRef {
    #[serde(rename = "Path")]
    path: String,
    #[serde(rename = "Version", default)]
    version: Option<String>,
}

impl GoChecker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: CommandRunner> GoChecker<R> {
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    fn call(&self, program: &str, args: &[&str], dir: &Path, opts: &Options) -> CommandCall {
        CommandCall::new(program, args.iter().copied())
            .in_dir(dir)
            .with_timeout(opts.timeout)
    }

    fn check_no_local_replace(&self, dir: &Path, opts: &Options) -> CheckResult {
        let name = "Go: no local replace directives";
        let start = Instant::now();
        let call = self.call("go", &["mod", "edit", "-json"], dir, opts);

        let result = match self.runner.run(&call) {
            Err(error) => CheckResult::errored(name, error, ""),
            Ok(output) if !output.success() => CheckResult::errored(
                name,
                ExecError::ExitStatus {
                    program: "go".to_string(),
                    code: output.status,
                },
                output.stderr.trim(),
            ),
            Ok(output) => match local_replacements(&output.stdout) {
                Err(error) => CheckResult::errored(
                    name,
                    ExecError::InvalidOutput {
                        program: "go mod edit -json".to_string(),
                        message: error.to_string(),
                    },
                    "",
                ),
                Ok(local) if local.is_empty() => CheckResult::pass(name, ""),
                Ok(local) => CheckResult::fail(
                    name,
                    format!(
                        "go.mod contains local replace directives:\n{}",
                        local.join("\n")
                    ),
                ),
            },
        };
        result.with_elapsed(start.elapsed())
    }

    fn check_format(&self, dir: &Path, opts: &Options) -> CheckResult {
        let name = "Go: gofmt";
        let start = Instant::now();
        let call = self.call("gofmt", &["-l", "."], dir, opts);

        let result = match self.runner.run(&call) {
            Err(error) => CheckResult::errored(name, error, ""),
            Ok(output) if !output.success() => CheckResult::errored(
                name,
                ExecError::ExitStatus {
                    program: "gofmt".to_string(),
                    code: output.status,
                },
                output.stderr.trim(),
            ),
            Ok(output) => {
                let unformatted = output.stdout.trim();
                if unformatted.is_empty() {
                    CheckResult::pass(name, "")
                } else {
                    CheckResult::fail(name, format!("Files need formatting:\n{unformatted}"))
                }
            }
        };
        result.with_elapsed(start.elapsed())
    }

    fn check_lint(&self, dir: &Path, opts: &Options) -> CheckResult {
        let name = "Go: golangci-lint";
        if !self.runner.exists(LINTER) {
            tracing::debug!(tool = LINTER, "skipping lint, tool not installed");
            return CheckResult::skip(name, format!("{LINTER} not installed"));
        }
        run_check(&self.runner, name, &self.call(LINTER, &["run"], dir, opts))
    }

    fn check_test(&self, dir: &Path, opts: &Options) -> CheckResult {
        run_check(
            &self.runner,
            "Go: tests",
            &self.call("go", &["test", "./..."], dir, opts),
        )
    }

    fn check_coverage(&self, dir: &Path, opts: &Options) -> CheckResult {
        let name = "Go: coverage";
        if !self.runner.exists(COVERAGE_TOOL) {
            tracing::debug!(tool = COVERAGE_TOOL, "skipping coverage, tool not installed");
            return CheckResult::skip(name, format!("{COVERAGE_TOOL} not installed"));
        }

        let dir_arg = dir.to_string_lossy();
        let mut args = vec!["-dir", &*dir_arg, "-badge-only"];
        if !opts.go_exclude_coverage.is_empty() {
            args.push("-exclude");
            args.push(&opts.go_exclude_coverage);
        }

        run_check(&self.runner, name, &self.call(COVERAGE_TOOL, &args, dir, opts)).into_informational()
    }
}

impl<R: CommandRunner> Checker for GoChecker<R> {
    fn name(&self) -> &str {
        "Go"
    }

    fn check(&self, dir: &Path, opts: &Options) -> Vec<CheckResult> {
        let mut results = vec![self.check_no_local_replace(dir, opts)];

        if opts.format {
            results.push(self.check_format(dir, opts));
        }
        if opts.lint {
            results.push(self.check_lint(dir, opts));
        }
        if opts.test {
            results.push(self.check_test(dir, opts));
        }
        if opts.coverage {
            results.push(self.check_coverage(dir, opts));
        }

        results
    }
}

/// Replace directives whose target is a filesystem path (`./x`, `../x`, `/x`).
fn local_replacements(mod_json: &str) -> Result<Vec<String>, serde_json::Error> {
    let parsed: GoModFile = serde_json::from_str(mod_json)?;
    Ok(parsed
        .replace
        .unwrap_or_default()
        .iter()
        .filter(|replace| replace.new.path.starts_with('.') || replace.new.path.starts_with('/'))
        .map(|replace| match replace.old.version.as_deref() {
            Some(version) => format!("  {} {version} => {}", replace.old.path, replace.new.path),
            None => format!("  {} => {}", replace.old.path, replace.new.path),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fake::FakeRunner;
    use crate::checks::Status;

    const CLEAN_MOD: &str = r#"{
        "Module": {"Path": "example.com/app"},
        "Go": "1.22",
        "Require": [{"Path": "github.com/spf13/cobra", "Version": "v1.8.0"}],
        "Exclude": null,
        "Replace": [
            {"Old": {"Path": "golang.org/x/net"}, "New": {"Path": "golang.org/x/net", "Version": "v0.20.0"}}
        ],
        "Retract": null
    }"#;

    const LOCAL_MOD: &str = r#"{
        "Module": {"Path": "example.com/app"},
        "Replace": [
            {"Old": {"Path": "example.com/lib"}, "New": {"Path": "../lib"}},
            {"Old": {"Path": "example.com/abs", "Version": "v1.0.0"}, "New": {"Path": "/src/abs"}}
        ]
    }"#;

    fn only(opts: impl FnOnce(&mut Options)) -> Options {
        let mut base = Options {
            test: false,
            lint: false,
            format: false,
            coverage: false,
            ..Options::default()
        };
        opts(&mut base);
        base
    }

    fn names(results: &[CheckResult]) -> Vec<&str> {
        results.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn default_options_run_all_blocking_checks_in_order() {
        let runner = FakeRunner::new(
            &[LINTER],
            vec![
                FakeRunner::ok(CLEAN_MOD),
                FakeRunner::ok(""),
                FakeRunner::ok(""),
                FakeRunner::ok("ok  example.com/app"),
            ],
        );
        let checker = GoChecker::with_runner(runner);
        let results = checker.check(Path::new("."), &Options::default());

        assert_eq!(
            names(&results),
            vec![
                "Go: no local replace directives",
                "Go: gofmt",
                "Go: golangci-lint",
                "Go: tests",
            ]
        );
        assert!(results.iter().all(|r| r.status() == Status::Passed));
        assert_eq!(
            checker.runner.calls(),
            vec![
                vec!["go", "mod", "edit", "-json"],
                vec!["gofmt", "-l", "."],
                vec!["golangci-lint", "run"],
                vec!["go", "test", "./..."],
            ]
        );
    }

    #[test]
    fn disabled_categories_are_absent_not_skipped() {
        let checker = GoChecker::with_runner(FakeRunner::new(&[], vec![FakeRunner::ok(CLEAN_MOD)]));
        let results = checker.check(Path::new("."), &only(|_| {}));
        assert_eq!(names(&results), vec!["Go: no local replace directives"]);
    }

    #[test]
    fn local_replace_directive_fails_with_explanation() {
        let checker = GoChecker::with_runner(FakeRunner::new(&[], vec![FakeRunner::ok(LOCAL_MOD)]));
        let results = checker.check(Path::new("."), &only(|_| {}));

        let result = &results[0];
        assert_eq!(result.status(), Status::Failed);
        assert!(result.error.is_none());
        assert!(result.output.contains("local replace directives"));
        assert!(result.output.contains("example.com/lib => ../lib"));
        assert!(result.output.contains("example.com/abs v1.0.0 => /src/abs"));
    }

    #[test]
    fn module_replacements_are_allowed() {
        assert!(local_replacements(CLEAN_MOD).unwrap().is_empty());
        assert!(local_replacements(r#"{"Replace": null}"#).unwrap().is_empty());
        assert!(local_replacements("{}").unwrap().is_empty());
    }

    #[test]
    fn missing_go_tool_fails_with_error() {
        let checker = GoChecker::with_runner(FakeRunner::new(&[], vec![FakeRunner::missing("go")]));
        let results = checker.check(Path::new("."), &only(|_| {}));
        assert_eq!(results[0].status(), Status::Failed);
        assert!(matches!(results[0].error, Some(ExecError::NotFound { .. })));
    }

    #[test]
    fn garbled_mod_json_fails_with_invalid_output() {
        let checker = GoChecker::with_runner(FakeRunner::new(&[], vec![FakeRunner::ok("not json")]));
        let results = checker.check(Path::new("."), &only(|_| {}));
        assert!(matches!(results[0].error, Some(ExecError::InvalidOutput { .. })));
    }

    #[test]
    fn unformatted_files_are_listed() {
        let checker = GoChecker::with_runner(FakeRunner::new(
            &[],
            vec![FakeRunner::ok(CLEAN_MOD), FakeRunner::ok("main.go\npkg/util.go\n")],
        ));
        let results = checker.check(Path::new("."), &only(|o| o.format = true));

        let format = &results[1];
        assert_eq!(format.name, "Go: gofmt");
        assert_eq!(format.status(), Status::Failed);
        assert!(format.error.is_none());
        assert_eq!(format.output, "Files need formatting:\nmain.go\npkg/util.go");
    }

    #[test]
    fn gofmt_exit_failure_sets_error() {
        let checker = GoChecker::with_runner(FakeRunner::new(
            &[],
            vec![FakeRunner::ok(CLEAN_MOD), FakeRunner::exit(2, "")],
        ));
        let results = checker.check(Path::new("."), &only(|o| o.format = true));
        assert!(matches!(
            results[1].error,
            Some(ExecError::ExitStatus { code: Some(2), .. })
        ));
    }

    #[test]
    fn go_mod_edit_failure_keeps_stderr() {
        let checker = GoChecker::with_runner(FakeRunner::new(
            &[],
            vec![FakeRunner::exit_stderr(1, "go: cannot find main module\n")],
        ));
        let results = checker.check(Path::new("."), &only(|_| {}));

        assert_eq!(results[0].status(), Status::Failed);
        assert_eq!(results[0].output, "go: cannot find main module");
        assert!(matches!(
            results[0].error,
            Some(ExecError::ExitStatus { code: Some(1), .. })
        ));
    }

    #[test]
    fn gofmt_failure_keeps_stderr() {
        let checker = GoChecker::with_runner(FakeRunner::new(
            &[],
            vec![
                FakeRunner::ok(CLEAN_MOD),
                FakeRunner::exit_stderr(2, "main.go:3:1: expected declaration\n"),
            ],
        ));
        let results = checker.check(Path::new("."), &only(|o| o.format = true));

        assert_eq!(results[1].status(), Status::Failed);
        assert_eq!(results[1].output, "main.go:3:1: expected declaration");
        assert!(matches!(
            results[1].error,
            Some(ExecError::ExitStatus { code: Some(2), .. })
        ));
    }

    #[test]
    fn missing_linter_is_skipped() {
        let checker = GoChecker::with_runner(FakeRunner::new(&[], vec![FakeRunner::ok(CLEAN_MOD)]));
        let results = checker.check(Path::new("."), &only(|o| o.lint = true));

        assert_eq!(results.len(), 2);
        assert_eq!(results[1].status(), Status::Skipped);
        assert_eq!(results[1].reason.as_deref(), Some("golangci-lint not installed"));
        assert_eq!(checker.runner.calls().len(), 1);
    }

    #[test]
    fn failures_do_not_short_circuit() {
        let checker = GoChecker::with_runner(FakeRunner::new(
            &[LINTER],
            vec![
                FakeRunner::missing("go"),
                FakeRunner::ok("bad.go"),
                FakeRunner::exit(1, "lint errors"),
                FakeRunner::exit(1, "FAIL"),
            ],
        ));
        let results = checker.check(Path::new("."), &Options::default());
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(CheckResult::is_failed));
        assert_eq!(results[2].output, "lint errors");
    }

    #[test]
    fn coverage_passes_even_when_tool_fails() {
        let checker = GoChecker::with_runner(FakeRunner::new(
            &[COVERAGE_TOOL],
            vec![FakeRunner::ok(CLEAN_MOD), FakeRunner::exit(1, "no test files")],
        ));
        let results = checker.check(Path::new("."), &only(|o| o.coverage = true));

        let coverage = &results[1];
        assert!(coverage.passed);
        assert!(coverage.informational);
        assert_eq!(coverage.status(), Status::Warning);
    }

    #[test]
    fn coverage_badge_is_returned_not_printed() {
        let checker = GoChecker::with_runner(FakeRunner::new(
            &[COVERAGE_TOOL],
            vec![
                FakeRunner::ok(CLEAN_MOD),
                FakeRunner::ok("![coverage](https://img.shields.io/badge/coverage-82.5%25-green)\n"),
            ],
        ));
        let opts = only(|o| o.coverage = true);
        let results = checker.check(Path::new("/repo"), &opts);

        let coverage = &results[1];
        assert_eq!(coverage.status(), Status::Passed);
        assert!(coverage.output.starts_with("![coverage]"));
        assert_eq!(
            checker.runner.calls()[1],
            vec!["gocoverbadge", "-dir", "/repo", "-badge-only", "-exclude", "cmd"]
        );
    }

    #[test]
    fn empty_coverage_exclusion_is_not_passed() {
        let checker = GoChecker::with_runner(FakeRunner::new(&[COVERAGE_TOOL], vec![FakeRunner::ok(CLEAN_MOD)]));
        let opts = only(|o| {
            o.coverage = true;
            o.go_exclude_coverage = String::new();
        });
        checker.check(Path::new("/repo"), &opts);
        assert_eq!(
            checker.runner.calls()[1],
            vec!["gocoverbadge", "-dir", "/repo", "-badge-only"]
        );
    }

    #[test]
    fn missing_coverage_tool_is_skipped() {
        let checker = GoChecker::with_runner(FakeRunner::new(&[], vec![FakeRunner::ok(CLEAN_MOD)]));
        let results = checker.check(Path::new("."), &only(|o| o.coverage = true));
        assert_eq!(results[1].status(), Status::Skipped);
        assert_eq!(results[1].reason.as_deref(), Some("gocoverbadge not installed"));
    }

    #[test]
    fn timeout_is_forwarded_to_every_call() {
        let checker = GoChecker::with_runner(FakeRunner::new(&[], vec![FakeRunner::ok(CLEAN_MOD)]));
        let opts = Options {
            timeout: Some(std::time::Duration::from_secs(30)),
            ..only(|_| {})
        };
        let call = checker.call("go", &["version"], Path::new("."), &opts);
        assert_eq!(call.timeout, Some(std::time::Duration::from_secs(30)));
        assert_eq!(checker.name(), "Go");
    }
}
