//! Parsing of the line-oriented debugger protocol.

use crate::error::FunError;
use std::io;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load(String),
    Breakpoint(usize),
    Condition { line: usize, expression: String },
    List,
    Remove(usize),
    Run,
    Evaluate(String),
    Stop,
    Continue,
}

/// One line of debugger input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    /// Unrecognised leading word; ignored without output.
    Unknown,
    Command {
        command: Command,
        /// Tokens were left over after the command's arguments.
        extra: bool,
    },
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("some arguments missed")]
    MissingArgument,

    #[error("wrong types of arguments")]
    WrongArgumentType,

    #[error("file wasn't found")]
    FileNotFound,

    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("condition expression is missed")]
    EmptyCondition,

    #[error("command isn't available now - run any program first")]
    NotRunning,

    #[error("there is nothing to continue")]
    NothingToContinue,

    #[error("no program loaded")]
    NoProgram,

    #[error("failed to start evaluation: {0}")]
    Spawn(#[source] io::Error),

    #[error(transparent)]
    Interpreter(#[from] FunError),
}

/// Whitespace tokenizer that can also hand out the unread rest of the line.
struct Arguments<'a> {
    rest: &'a str,
}

impl<'a> Arguments<'a> {
    fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    fn next_token(&mut self) -> Option<&'a str> {
        let trimmed = self.rest.trim_start();
        if trimmed.is_empty() {
            self.rest = trimmed;
            return None;
        }
        let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let (token, rest) = trimmed.split_at(end);
        self.rest = rest;
        Some(token)
    }

    fn line_number(&mut self) -> Result<usize, CommandError> {
        self.next_token()
            .ok_or(CommandError::MissingArgument)?
            .parse()
            .map_err(|_| CommandError::WrongArgumentType)
    }

    /// Everything left on the line, trimmed.
    fn remainder(&mut self) -> &'a str {
        let rest = self.rest.trim();
        self.rest = "";
        rest
    }

    fn required_remainder(&mut self) -> Result<&'a str, CommandError> {
        match self.remainder() {
            "" => Err(CommandError::MissingArgument),
            rest => Ok(rest),
        }
    }

    fn has_more(&self) -> bool {
        !self.rest.trim().is_empty()
    }
}

pub fn parse_line(line: &str) -> Result<Input, CommandError> {
    let mut arguments = Arguments::new(line);
    let Some(word) = arguments.next_token() else {
        return Ok(Input::Empty);
    };

    let command = match word {
        "load" => Command::Load(arguments.required_remainder()?.to_string()),
        "breakpoint" => Command::Breakpoint(arguments.line_number()?),
        "condition" => Command::Condition {
            line: arguments.line_number()?,
            expression: arguments.remainder().to_string(),
        },
        "list" => Command::List,
        "remove" => Command::Remove(arguments.line_number()?),
        "run" => Command::Run,
        "evaluate" => Command::Evaluate(arguments.required_remainder()?.to_string()),
        "stop" => Command::Stop,
        "continue" => Command::Continue,
        _ => return Ok(Input::Unknown),
    };

    Ok(Input::Command {
        command,
        extra: arguments.has_more(),
    })
}
