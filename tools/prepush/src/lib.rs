pub mod checks;
pub mod config;
pub mod detect;
pub mod error;
pub mod options;
pub mod registry;
pub mod reporter;
pub mod runner;

pub use checks::{CheckResult, Checker, Status};
pub use detect::Detection;
pub use options::Options;
pub use registry::Registry;
pub use runner::{command_exists, file_exists, run_command, CommandCall, CommandOutput, CommandRunner, SystemRunner};
