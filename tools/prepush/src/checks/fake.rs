use crate::error::ExecError;
use crate::runner::{CommandCall, CommandOutput, CommandRunner};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

/// Scripted runner: answers calls in order and records what was asked.
pub struct FakeRunner {
    calls: Mutex<Vec<CommandCall>>,
    responses: Mutex<VecDeque<Result<CommandOutput, ExecError>>>,
    installed: HashSet<String>,
}

impl FakeRunner {
    pub fn new(installed: &[&str], responses: Vec<Result<CommandOutput, ExecError>>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::from(responses)),
            installed: installed.iter().map(|name| name.to_string()).collect(),
        }
    }

    pub fn ok(stdout: &str) -> Result<CommandOutput, ExecError> {
        Self::exit(0, stdout)
    }

    pub fn exit(status: i32, stdout: &str) -> Result<CommandOutput, ExecError> {
        Ok(CommandOutput {
            status: Some(status),
            stdout: stdout.to_string(),
            stderr: String::new(),
        })
    }

    /// Non-zero exit that only complains on stderr.
    pub fn exit_stderr(status: i32, stderr: &str) -> Result<CommandOutput, ExecError> {
        Ok(CommandOutput {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.to_string(),
        })
    }

    pub fn missing(program: &str) -> Result<CommandOutput, ExecError> {
        Err(ExecError::NotFound {
            program: program.to_string(),
        })
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(CommandCall::to_vec)
            .collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, call: &CommandCall) -> Result<CommandOutput, ExecError> {
        self.calls.lock().unwrap().push(call.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Self::ok(""))
    }

    fn exists(&self, program: &str) -> bool {
        self.installed.contains(program)
    }
}
