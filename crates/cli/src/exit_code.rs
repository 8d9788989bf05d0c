// Consistent exit codes for the launcher.
//
//   0  = success
//   1  = a command was rejected, or a general error
//   2  = usage/argument error
//   10 = main application could not be found or started
//   13 = network error talking to the control API

use std::process;

use extraterm_launcher_common::args::ParseError;

use crate::dispatch::UsageError;
use crate::launcher::LaunchError;

/// Named exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    LaunchFailed = 10,
    Network = 13,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if cause.is::<ParseError>() || cause.is::<UsageError>() {
                return Self::Usage;
            }
            if cause.is::<LaunchError>() {
                return Self::LaunchFailed;
            }
            if cause.is::<reqwest::Error>() {
                return Self::Network;
            }
        }
        Self::Error
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code.code() as u8)
    }
}
