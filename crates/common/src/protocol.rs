// HTTP control API of the main application.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::args::Command;
use crate::wordcase::kebab_to_camel_keys;

/// Liveness probe endpoint, relative to the base URL.
pub const PING_PATH: &str = "ping";
/// Command submission endpoint, relative to the base URL.
pub const COMMAND_PATH: &str = "command";
/// Body of a healthy ping response.
pub const PONG: &str = "pong";

// ── Built-in commands ──────────────────────────────────────────────
pub const NEW_TERMINAL_COMMAND: &str = "extraterm:window.newTerminal";
pub const SHOW_ALL_WINDOWS_COMMAND: &str = "extraterm:window.showAll";
pub const WORKING_DIRECTORY_FLAG: &str = "--working-directory";

/// Body of `POST <base>/command`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandPayload {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<String>,
    /// Arguments keyed by camelCase name.
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

impl From<&Command> for CommandPayload {
    fn from(command: &Command) -> Self {
        Self {
            command: command.name.clone(),
            window: command.window.clone(),
            args: kebab_to_camel_keys(&command.parameters),
        }
    }
}

/// Open a terminal at `directory`.
pub fn new_terminal_command(directory: &str) -> Command {
    Command::new(NEW_TERMINAL_COMMAND).with_parameter(WORKING_DIRECTORY_FLAG, directory)
}

/// Raise every window of the main application.
pub fn show_all_windows_command() -> Command {
    Command::new(SHOW_ALL_WINDOWS_COMMAND)
}

#[must_use]
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}
