// Error reporting for the launcher.
//
// TTY → colored `error:` line. Piped/redirected → JSON object on stderr,
// so scripts that parse stdout never see launcher diagnostics.

use std::io::{self, IsTerminal, Write};

use extraterm_launcher_common::args::ParseError;

use crate::dispatch::UsageError;
use crate::launcher::LaunchError;

const ANSI_RED: &str = "\x1b[31m";
const ANSI_RESET: &str = "\x1b[0m";

/// Output format for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    /// JSON when stdout is not a terminal.
    pub fn detect() -> Self {
        Self::detect_from_terminal(io::stdout().is_terminal())
    }

    pub fn detect_from_terminal(is_tty: bool) -> Self {
        if is_tty {
            Self::Human
        } else {
            Self::Json
        }
    }
}

/// Write command output to stdout verbatim.
pub fn print_result(text: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();
    out.write_all(text.as_bytes())?;
    out.flush()
}

/// Write an error to stderr in the selected format.
pub fn print_error(format: OutputFormat, code: &str, message: &str) {
    let mut err = io::stderr().lock();
    let _ = write_error(&mut err, format, code, message, io::stderr().is_terminal());
}

/// Print a launcher failure with a stable error code.
pub fn print_anyhow_error(format: OutputFormat, error: &anyhow::Error) {
    let (code, message) = describe_error(error);
    print_error(format, code, &message);
}

fn write_error<W: Write>(
    writer: &mut W,
    format: OutputFormat,
    code: &str,
    message: &str,
    is_tty: bool,
) -> io::Result<()> {
    match format {
        OutputFormat::Human => {
            writeln!(writer, "{}", render_human_stderr_line("error", message, is_tty, ANSI_RED))
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "error": {
                    "code": code,
                    "message": message,
                }
            });
            serde_json::to_writer(&mut *writer, &obj).map_err(io::Error::other)?;
            writeln!(writer)
        }
    }
}

fn describe_error(error: &anyhow::Error) -> (&'static str, String) {
    let message = format!("{error:#}");
    for cause in error.chain() {
        if cause.is::<ParseError>() || cause.is::<UsageError>() {
            return ("USAGE", message);
        }
        if let Some(launch) = cause.downcast_ref::<LaunchError>() {
            let code = match launch {
                LaunchError::NoConfigDir => "NO_CONFIG_DIR",
                LaunchError::ExecutableNotFound(_) => "MAIN_EXECUTABLE_NOT_FOUND",
                LaunchError::SpawnFailed { .. } => "LAUNCH_FAILED",
                LaunchError::ExitedEarly(_) => "MAIN_EXITED",
                LaunchError::TimedOut(_) => "READY_TIMEOUT",
            };
            return (code, message);
        }
        if cause.is::<reqwest::Error>() {
            return ("NETWORK_ERROR", message);
        }
    }
    ("ERROR", message)
}

fn render_human_stderr_line(label: &str, message: &str, is_tty: bool, color: &str) -> String {
    if is_tty {
        format!("{color}{label}:{ANSI_RESET} {message}")
    } else {
        format!("{label}: {message}")
    }
}
