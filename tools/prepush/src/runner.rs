use crate::checks::CheckResult;
use crate::error::ExecError;
use std::ffi::OsStr;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCall {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Standard output followed by standard error.
    pub fn combined(&self) -> String {
        let mut merged = String::with_capacity(self.stdout.len() + self.stderr.len());
        merged.push_str(&self.stdout);
        merged.push_str(&self.stderr);
        merged
    }
}

/// Seam between checkers and the operating system.
///
/// `run` returns `Err` only when the program could not be started or was
/// killed by its timeout; a non-zero exit is still `Ok`.
pub trait CommandRunner: Send + Sync {
    fn run(&self, call: &CommandCall) -> Result<CommandOutput, ExecError>;
    fn exists(&self, program: &str) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandCall {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            current_dir: None,
            timeout: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn to_vec(&self) -> Vec<String> {
        let mut parts = Vec::with_capacity(1 + self.args.len());
        parts.push(self.program.clone());
        parts.extend(self.args.iter().cloned());
        parts
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, call: &CommandCall) -> Result<CommandOutput, ExecError> {
        let mut process = Command::new(&call.program);
        process.args(&call.args);
        if let Some(dir) = call.current_dir.as_deref() {
            process.current_dir(dir);
        }

        tracing::debug!(
            program = %call.program,
            args = ?call.args,
            dir = ?call.current_dir,
            "running command"
        );
        let start = Instant::now();

        let output = match call.timeout {
            None => process
                .output()
                .map(|output| CommandOutput {
                    status: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                })
                .map_err(|error| spawn_error(&call.program, &error))?,
            Some(limit) => run_with_deadline(&mut process, &call.program, limit)?,
        };

        tracing::debug!(
            program = %call.program,
            status = ?output.status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "command finished"
        );
        Ok(output)
    }

    fn exists(&self, program: &str) -> bool {
        command_exists(program)
    }
}

fn spawn_error(program: &str, error: &io::Error) -> ExecError {
    if error.kind() == io::ErrorKind::NotFound {
        ExecError::NotFound {
            program: program.to_string(),
        }
    } else {
        ExecError::Spawn {
            program: program.to_string(),
            message: error.to_string(),
        }
    }
}

fn run_with_deadline(
    process: &mut Command,
    program: &str,
    limit: Duration,
) -> Result<CommandOutput, ExecError> {
    let mut child = process
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|error| spawn_error(program, &error))?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let deadline = Instant::now() + limit;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                // Background grandchildren can keep the pipes open after the
                // child exits, so the drains share the same deadline.
                let stdout = collect_before(&stdout, deadline);
                let stderr = collect_before(&stderr, deadline);
                return match (stdout, stderr) {
                    (Some(stdout), Some(stderr)) => Ok(CommandOutput {
                        status: status.code(),
                        stdout,
                        stderr,
                    }),
                    _ => Err(timed_out(program, limit)),
                };
            }
            Ok(None) if Instant::now() >= deadline => {
                kill(&mut child);
                // Readers are left detached: grandchildren may still hold the pipes.
                return Err(timed_out(program, limit));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(error) => {
                kill(&mut child);
                return Err(ExecError::Spawn {
                    program: program.to_string(),
                    message: error.to_string(),
                });
            }
        }
    }
}

fn timed_out(program: &str, limit: Duration) -> ExecError {
    tracing::warn!(program, limit = ?limit, "command timed out");
    ExecError::TimedOut {
        program: program.to_string(),
        limit,
    }
}

/// Read a pipe to the end on its own thread; the text arrives on the channel.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).to_string());
    });
    rx
}

fn collect_before(rx: &mpsc::Receiver<String>, deadline: Instant) -> Option<String> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    rx.recv_timeout(remaining).ok()
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Run a command through `runner` and classify the outcome as a check result.
///
/// Output is stdout+stderr, trimmed. Exit status 0 passes; anything else fails
/// with the error set and whatever output was captured.
pub fn run_check<R: CommandRunner + ?Sized>(runner: &R, name: &str, call: &CommandCall) -> CheckResult {
    let start = Instant::now();
    let result = match runner.run(call) {
        Ok(output) if output.success() => CheckResult::pass(name, output.combined().trim()),
        Ok(output) => CheckResult::errored(
            name,
            ExecError::ExitStatus {
                program: call.program.clone(),
                code: output.status,
            },
            output.combined().trim(),
        ),
        Err(error) => CheckResult::errored(name, error, ""),
    };
    result.with_elapsed(start.elapsed())
}

/// Run `program` with `args` in `dir` using the real system runner.
pub fn run_command(name: &str, dir: &Path, program: &str, args: &[&str]) -> CheckResult {
    let call = CommandCall::new(program, args.iter().copied()).in_dir(dir);
    run_check(&SystemRunner, name, &call)
}

/// Check if a command is available on PATH without executing it.
pub fn command_exists(program: &str) -> bool {
    if program.is_empty() {
        return false;
    }
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate);
    }
    std::env::var_os("PATH")
        .map(|path| {
            std::env::split_paths(&path).any(|dir| is_executable(&dir.join(OsStr::new(program))))
        })
        .unwrap_or(false)
}

/// True unless stat-ing `path` fails with an explicit not-found error.
pub fn file_exists(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(_) => true,
        Err(error) => error.kind() != io::ErrorKind::NotFound,
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    if path.is_file() {
        return true;
    }
    ["exe", "cmd", "bat"]
        .iter()
        .any(|ext| path.with_extension(ext).is_file())
}
