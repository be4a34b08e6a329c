use crate::checks::{CheckResult, Status};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use regex::Regex;
use std::fmt;
use std::io::{self, Write};
use std::sync::OnceLock;

const LABEL_WIDTH: usize = 36;
/// Output lines shown for a failure when not in verbose mode.
const TAIL_LINES: usize = 10;

/// Counts from one pass over the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub warnings: usize,
}

impl Summary {
    pub fn tally(results: &[CheckResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result.status() {
                Status::Passed => summary.passed += 1,
                Status::Failed => summary.failed += 1,
                Status::Skipped => summary.skipped += 1,
                Status::Warning => summary.warnings += 1,
            }
        }
        summary
    }

    /// Warnings never block.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Passed: {}, Failed: {}, Skipped: {}",
            self.passed, self.failed, self.skipped
        )?;
        if self.warnings > 0 {
            write!(f, ", Warnings: {}", self.warnings)?;
        }
        Ok(())
    }
}

/// Write one status line per result and return the counts.
pub fn write_results<W: Write>(out: &mut W, results: &[CheckResult], verbose: bool) -> io::Result<Summary> {
    for result in results {
        match result.status() {
            Status::Passed => {
                writeln!(
                    out,
                    "  {} {:<width$} {}",
                    "\u{2713}".if_supports_color(Stdout, |s| s.green()),
                    result.name,
                    elapsed(result).if_supports_color(Stdout, |s| s.dimmed()),
                    width = LABEL_WIDTH
                )?;
                if result.informational || verbose {
                    write_block(out, &result.output, None)?;
                }
            }
            Status::Failed => {
                writeln!(
                    out,
                    "  {} {:<width$} {}",
                    "\u{2717}".if_supports_color(Stdout, |s| s.red()),
                    result.name,
                    elapsed(result).if_supports_color(Stdout, |s| s.dimmed()),
                    width = LABEL_WIDTH
                )?;
                write_failure_detail(out, result, verbose)?;
            }
            Status::Skipped => {
                writeln!(
                    out,
                    "  {} {:<width$} {}",
                    "-".if_supports_color(Stdout, |s| s.yellow()),
                    result.name,
                    "skipped".if_supports_color(Stdout, |s| s.dimmed()),
                    width = LABEL_WIDTH
                )?;
                if verbose {
                    write_block(out, result.reason.as_deref().unwrap_or_default(), None)?;
                }
            }
            Status::Warning => {
                writeln!(
                    out,
                    "  {} {:<width$} {}",
                    "\u{26a0}".if_supports_color(Stdout, |s| s.yellow()),
                    result.name,
                    "warning (informational)".if_supports_color(Stdout, |s| s.yellow()),
                    width = LABEL_WIDTH
                )?;
                if let Some(error) = &result.error {
                    write_block(out, &error.to_string(), None)?;
                }
                if verbose {
                    write_block(out, &result.output, None)?;
                }
            }
        }
    }
    Ok(Summary::tally(results))
}

pub fn print_results(results: &[CheckResult], verbose: bool) -> Summary {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_results(&mut out, results, verbose).unwrap_or_else(|_| Summary::tally(results))
}

/// Standard report: results, the counts line, and a verdict.
pub fn write_report<W: Write>(out: &mut W, results: &[CheckResult], verbose: bool) -> io::Result<Summary> {
    writeln!(out, "{}", "=== Summary ===".if_supports_color(Stdout, |s| s.bold()))?;
    let summary = write_results(out, results, verbose)?;

    writeln!(out)?;
    writeln!(out, "{summary}")?;
    writeln!(out)?;
    if !summary.all_passed() {
        writeln!(out, "{}", "Pre-push checks failed!".if_supports_color(Stdout, |s| s.red()))?;
    } else if summary.warnings > 0 {
        writeln!(
            out,
            "{}",
            "Pre-push checks passed with warnings.".if_supports_color(Stdout, |s| s.yellow())
        )?;
    } else {
        writeln!(out, "{}", "All pre-push checks passed!".if_supports_color(Stdout, |s| s.green()))?;
    }
    Ok(summary)
}

pub fn print_report(results: &[CheckResult], verbose: bool) -> Summary {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, results, verbose).unwrap_or_else(|_| Summary::tally(results))
}

/// Go/No-Go poll: every check is a binary gate, skipped checks stand by.
/// Returns true when nothing is in the failed state.
pub fn write_go_no_go_report<W: Write>(out: &mut W, results: &[CheckResult], verbose: bool) -> io::Result<bool> {
    writeln!(out, "{}", "=== Go/No-Go Poll ===".if_supports_color(Stdout, |s| s.bold()))?;
    writeln!(out)?;

    for result in results {
        let coverage = if result.informational {
            coverage_percent(&result.output)
                .map(|pct| format!(" {pct}"))
                .unwrap_or_default()
        } else {
            String::new()
        };

        match result.status() {
            Status::Passed => writeln!(
                out,
                "  {:<width$} {}{coverage}",
                result.name,
                "GO".if_supports_color(Stdout, |s| s.green()),
                width = LABEL_WIDTH
            )?,
            Status::Warning => writeln!(
                out,
                "  {:<width$} {}{coverage}",
                result.name,
                "GO (advisory)".if_supports_color(Stdout, |s| s.yellow()),
                width = LABEL_WIDTH
            )?,
            Status::Skipped => writeln!(
                out,
                "  {:<width$} {} {}",
                result.name,
                "STANDBY".if_supports_color(Stdout, |s| s.yellow()),
                result
                    .reason
                    .as_deref()
                    .unwrap_or_default()
                    .if_supports_color(Stdout, |s| s.dimmed()),
                width = LABEL_WIDTH
            )?,
            Status::Failed => {
                writeln!(
                    out,
                    "  {:<width$} {}",
                    result.name,
                    "NO-GO".if_supports_color(Stdout, |s| s.red()),
                    width = LABEL_WIDTH
                )?;
                write_failure_detail(out, result, verbose)?;
            }
        }
    }

    let summary = Summary::tally(results);
    let go = summary.passed + summary.warnings;
    writeln!(out)?;
    writeln!(
        out,
        "  GO: {go}  NO-GO: {}  STANDBY: {}",
        summary.failed, summary.skipped
    )?;
    writeln!(out)?;

    let all_go = summary.all_passed();
    if all_go {
        writeln!(
            out,
            "  {}",
            "GO FOR PUSH".if_supports_color(Stdout, |s| s.green().bold().to_string())
        )?;
    } else {
        writeln!(
            out,
            "  {} {}",
            "NO-GO FOR PUSH".if_supports_color(Stdout, |s| s.red().bold().to_string()),
            format!("({} check(s) blocking)", summary.failed).if_supports_color(Stdout, |s| s.dimmed())
        )?;
    }
    Ok(all_go)
}

pub fn print_go_no_go_report(results: &[CheckResult], verbose: bool) -> bool {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_go_no_go_report(&mut out, results, verbose)
        .unwrap_or_else(|_| Summary::tally(results).all_passed())
}

/// First percentage in a coverage tool's output, e.g. `82.5%`.
pub fn coverage_percent(output: &str) -> Option<String> {
    static PERCENT: OnceLock<Regex> = OnceLock::new();
    let re = PERCENT.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?%").expect("valid percentage pattern"));
    re.find(output).map(|m| m.as_str().to_string())
}

/// Error line always; output in full when verbose, else its tail.
fn write_failure_detail<W: Write>(out: &mut W, result: &CheckResult, verbose: bool) -> io::Result<()> {
    if let Some(error) = &result.error {
        write_block(out, &format!("error: {error}"), None)?;
    }
    let limit = if verbose { None } else { Some(TAIL_LINES) };
    write_block(out, &result.output, limit)
}

fn write_block<W: Write>(out: &mut W, text: &str, tail: Option<usize>) -> io::Result<()> {
    let lines: Vec<&str> = text.lines().collect();
    let start = match tail {
        Some(max) if lines.len() > max => {
            writeln!(
                out,
                "      {}",
                format!("... {} earlier line(s), rerun with --verbose", lines.len() - max)
                    .if_supports_color(Stdout, |s| s.dimmed())
            )?;
            lines.len() - max
        }
        _ => 0,
    };
    for line in &lines[start..] {
        writeln!(out, "      {line}")?;
    }
    Ok(())
}

fn elapsed(result: &CheckResult) -> String {
    format!("{:.1}s", result.elapsed.as_secs_f64())
}
