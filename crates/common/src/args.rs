// Launcher command line grammar.
//
//   launcher [-w <window>] -c <command> [--flag value ...] [--] ...
//   launcher [<directory>]
//
// Parsed by a small state machine that consumes one token per transition.

use std::collections::BTreeMap;

use thiserror::Error;

const WINDOW_SHORT: &str = "-w";
const WINDOW_LONG: &str = "--window";
const COMMAND_SHORT: &str = "-c";
const COMMAND_LONG: &str = "--command";
const SEPARATOR: &str = "--";
const PARAMETER_PREFIX: &str = "--";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command line parameter '{0}'.")]
    UnknownParameter(String),

    #[error("Parameters to commands must start with '--'. Found: '{0}'.")]
    ParameterWithoutDashes(String),

    #[error("Command parameter '{0}' does not have a value.")]
    MissingFlagValue(String),

    #[error("No value for window option was given.")]
    MissingWindowValue,
}

/// Position of the parser within the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    ProgramName,
    Flag,
    WindowValue,
    CommandName,
    CommandFlag,
    CommandValue,
}

/// A fully parsed remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub window: Option<String>,
    pub name: String,
    /// Parameter values keyed by their `--flag` name.
    pub parameters: BTreeMap<String, String>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self { window: None, name: name.into(), parameters: BTreeMap::new() }
    }

    pub fn with_parameter(mut self, flag: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(flag.into(), value.into());
        self
    }
}

/// An in-progress command block. Consumed by [`CommandBuilder::build`].
#[derive(Debug, Default)]
pub struct CommandBuilder {
    window: Option<String>,
    name: Option<String>,
    parameters: BTreeMap<String, String>,
}

impl CommandBuilder {
    fn is_named(&self) -> bool {
        self.name.is_some()
    }

    /// Finish the block. Unnamed builders and empty names (`-c ""`) produce
    /// nothing; a missing window falls back to `inherited_window`.
    pub fn build(self, inherited_window: Option<&str>) -> Option<Command> {
        let name = self.name.filter(|name| !name.is_empty())?;
        Some(Command {
            window: self.window.or_else(|| inherited_window.map(str::to_string)),
            name,
            parameters: self.parameters,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArguments {
    pub commands: Vec<Command>,
    /// Positional arguments given outside any command block.
    pub bare_args: Vec<String>,
    /// A `-w` value that no command block claimed.
    pub window: Option<String>,
}

/// Parse process arguments. Element 0 is the program name.
pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<ParsedArguments, ParseError> {
    let mut parser = Parser::default();
    for token in args {
        parser.feed(token.as_ref())?;
    }
    parser.finish()
}

struct Parser {
    state: ParseState,
    open: CommandBuilder,
    pending_flag: String,
    last_window: Option<String>,
    result: ParsedArguments,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            state: ParseState::ProgramName,
            open: CommandBuilder::default(),
            pending_flag: String::new(),
            last_window: None,
            result: ParsedArguments::default(),
        }
    }
}

impl Parser {
    fn feed(&mut self, token: &str) -> Result<(), ParseError> {
        self.state = match self.state {
            ParseState::ProgramName => ParseState::Flag,

            ParseState::Flag => match token {
                WINDOW_SHORT | WINDOW_LONG => ParseState::WindowValue,
                COMMAND_SHORT | COMMAND_LONG => {
                    self.finalize_open();
                    ParseState::CommandName
                }
                bare if !bare.starts_with('-') => {
                    self.result.bare_args.push(bare.to_string());
                    ParseState::Flag
                }
                unknown => return Err(ParseError::UnknownParameter(unknown.to_string())),
            },

            ParseState::WindowValue => {
                self.open.window = Some(token.to_string());
                if self.open.is_named() {
                    ParseState::CommandFlag
                } else {
                    ParseState::Flag
                }
            }

            ParseState::CommandName => {
                self.open.name = Some(token.to_string());
                ParseState::CommandFlag
            }

            ParseState::CommandFlag => match token {
                SEPARATOR => {
                    self.finalize_open();
                    ParseState::Flag
                }
                COMMAND_SHORT | COMMAND_LONG => {
                    self.finalize_open();
                    ParseState::CommandName
                }
                WINDOW_SHORT | WINDOW_LONG => ParseState::WindowValue,
                flag if flag.starts_with(PARAMETER_PREFIX) => {
                    self.pending_flag = flag.to_string();
                    ParseState::CommandValue
                }
                other => return Err(ParseError::ParameterWithoutDashes(other.to_string())),
            },

            ParseState::CommandValue => {
                let flag = std::mem::take(&mut self.pending_flag);
                self.open.parameters.insert(flag, token.to_string());
                ParseState::CommandFlag
            }
        };
        Ok(())
    }

    fn finalize_open(&mut self) {
        let builder = std::mem::take(&mut self.open);
        if !builder.is_named() {
            // A window given before `-c` belongs to the block about to start.
            self.open.window = builder.window;
            return;
        }
        if let Some(command) = builder.build(self.last_window.as_deref()) {
            self.last_window = command.window.clone();
            self.result.commands.push(command);
        }
    }

    fn finish(mut self) -> Result<ParsedArguments, ParseError> {
        match self.state {
            ParseState::CommandValue => Err(ParseError::MissingFlagValue(self.pending_flag)),
            ParseState::WindowValue => Err(ParseError::MissingWindowValue),
            _ => {
                self.finalize_open();
                self.result.window = self.open.window;
                Ok(self.result)
            }
        }
    }
}
