// Turns parsed arguments into control API calls and collects the results.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::debug;

use extraterm_launcher_common::args::{Command, ParsedArguments};
use extraterm_launcher_common::protocol::{
    new_terminal_command, show_all_windows_command, CommandPayload,
};

use crate::client::{CommandResponse, ControlClient};
use crate::exit_code::ExitCode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("expected at most one directory argument, got {0}")]
    TooManyDirectories(usize),

    #[error("a directory argument cannot be combined with -c/--command")]
    DirectoryWithCommands,

    #[error("-w/--window `{0}` must precede a -c/--command block")]
    UnclaimedWindow(String),
}

/// What a single launcher run asks the main application to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Open a terminal at the directory, then raise all windows. Both
    /// commands target `window` when one was given.
    OpenAt { directory: PathBuf, window: Option<String> },
    /// Run the explicitly given commands and print their results.
    Commands(Vec<Command>),
}

impl Invocation {
    /// `current_dir` is only consulted when neither commands nor a directory were given.
    pub fn plan(
        parsed: ParsedArguments,
        current_dir: impl FnOnce() -> io::Result<PathBuf>,
    ) -> Result<Self> {
        let ParsedArguments { commands, mut bare_args, window } = parsed;

        if bare_args.len() > 1 {
            return Err(UsageError::TooManyDirectories(bare_args.len()).into());
        }
        if let Some(directory) = bare_args.pop() {
            if !commands.is_empty() {
                return Err(UsageError::DirectoryWithCommands.into());
            }
            return Ok(Self::OpenAt { directory: PathBuf::from(directory), window });
        }
        if commands.is_empty() {
            let directory = current_dir().context("failed to determine the current directory")?;
            return Ok(Self::OpenAt { directory, window });
        }
        if let Some(window) = window {
            return Err(UsageError::UnclaimedWindow(window).into());
        }
        Ok(Self::Commands(commands))
    }

    /// Commands to submit, in order.
    pub fn commands(&self) -> Vec<Command> {
        match self {
            Self::OpenAt { directory, window } => {
                let mut commands = vec![
                    new_terminal_command(&directory.to_string_lossy()),
                    show_all_windows_command(),
                ];
                for command in &mut commands {
                    command.window = window.clone();
                }
                commands
            }
            Self::Commands(commands) => commands.clone(),
        }
    }

    fn echoes_results(&self) -> bool {
        matches!(self, Self::Commands(_))
    }
}

/// Responses gathered from one run, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub responses: Vec<CommandResponse>,
    echo: bool,
}

impl DispatchReport {
    /// Whether a command was rejected. Submission stops at the first one.
    pub fn failed(&self) -> bool {
        self.responses.last().is_some_and(|response| !response.is_success())
    }

    pub fn exit_code(&self) -> ExitCode {
        if self.failed() {
            ExitCode::Error
        } else {
            ExitCode::Success
        }
    }

    /// Text for stdout, if any. Bodies are passed through unchanged.
    ///
    /// Explicit commands print every body: a single one as-is, several as a
    /// JSON array. The implicit open-terminal flow only prints the body of a
    /// rejected command.
    pub fn render(&self) -> Option<String> {
        if !self.echo {
            return self
                .responses
                .last()
                .filter(|response| !response.is_success())
                .map(|response| response.body.clone());
        }
        match self.responses.as_slice() {
            [] => None,
            [single] => Some(single.body.clone()),
            many => {
                let bodies: Vec<&str> = many.iter().map(|response| response.body.as_str()).collect();
                Some(format!("[\n{}\n]\n", bodies.join(",\n")))
            }
        }
    }
}

/// Submit every command of `invocation`, stopping at the first rejected one.
pub async fn dispatch(client: &ControlClient, invocation: &Invocation) -> Result<DispatchReport> {
    let mut report = DispatchReport { responses: Vec::new(), echo: invocation.echoes_results() };

    for command in invocation.commands() {
        let response = client.submit(&CommandPayload::from(&command)).await?;
        debug!(command = %command.name, status = response.status, "command answered");

        let rejected = !response.is_success();
        report.responses.push(response);
        if rejected {
            break;
        }
    }

    Ok(report)
}
