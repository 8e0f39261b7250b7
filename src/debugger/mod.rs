//! Interactive breakpoint debugger.
//!
//! Reads one command per line, writes prompts and messages to the shared
//! output sink. While a run is suspended the prompt shows where:
//! `line=<N>,elementType=<NodeKind>>`; otherwise it is `>`.

pub mod breakpoints;
pub mod command;
pub mod session;

use crate::ast::File;
use crate::output::Output;
use crate::parser::{parse_expression, parse_program};
use breakpoints::{Breakpoint, Breakpoints};
use command::{Command, CommandError, Input};
use parking_lot::RwLock;
use session::{Outcome, Session};
use std::fs;
use std::io::{self, BufRead};
use std::sync::Arc;

pub struct Debugger {
    output: Output,
    program: Option<Arc<File>>,
    breakpoints: Arc<RwLock<Breakpoints>>,
    session: Option<Session>,
}

impl Debugger {
    pub fn new(output: Output) -> Self {
        Self {
            output,
            program: None,
            breakpoints: Arc::new(RwLock::new(Breakpoints::new())),
            session: None,
        }
    }

    /// Run the command loop until `input` is exhausted.
    pub fn run<R: BufRead>(&mut self, mut input: R) -> io::Result<()> {
        loop {
            self.output.print(&self.prompt());

            let mut bytes = Vec::new();
            if input.read_until(b'\n', &mut bytes)? == 0 {
                break;
            }
            // Bytes that are not UTF-8 become U+FFFD rather than ending the loop.
            let line = String::from_utf8_lossy(&bytes);
            self.execute_line(line.trim_end_matches(['\n', '\r']));
        }

        self.stop();
        Ok(())
    }

    pub fn prompt(&self) -> String {
        match self.session.as_ref().and_then(Session::position) {
            Some((line, kind)) => format!("line={},elementType={}>", line, kind),
            None => ">".to_string(),
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.session.is_some()
    }

    /// Parse and execute one line of input, reporting problems on the output.
    pub fn execute_line(&mut self, line: &str) {
        match command::parse_line(line) {
            Ok(Input::Empty) => self.output.println("Warning: empty command ignored"),
            Ok(Input::Unknown) => {}
            Ok(Input::Command { command, extra }) => match self.execute(command) {
                Ok(()) => {
                    if extra {
                        self.output.println("Warning: Extra arguments were ignored");
                    }
                }
                Err(error) => self.report(&error),
            },
            Err(error) => self.report(&error),
        }
    }

    pub fn execute(&mut self, command: Command) -> Result<(), CommandError> {
        match command {
            Command::Load(path) => self.load(&path),
            Command::Breakpoint(line) => {
                self.install(line, Breakpoint::unconditional());
                Ok(())
            }
            Command::Condition { line, expression } => {
                if expression.is_empty() {
                    return Err(CommandError::EmptyCondition);
                }
                let condition = parse_expression(&expression)?;
                self.install(line, Breakpoint::conditional(condition, expression));
                Ok(())
            }
            Command::List => {
                self.list();
                Ok(())
            }
            Command::Remove(line) => {
                if !self.breakpoints.write().remove(line) {
                    self.output
                        .println(&format!("Warning: there is no breakpoints on line {}", line));
                }
                Ok(())
            }
            Command::Run => self.start(),
            Command::Evaluate(source) => self.evaluate(&source),
            Command::Stop => {
                self.stop();
                Ok(())
            }
            Command::Continue => self.resume(),
        }
    }

    /// Replace the loaded program. A file that cannot be read or parsed
    /// leaves the current program and any suspended run untouched.
    fn load(&mut self, path: &str) -> Result<(), CommandError> {
        let source = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => CommandError::FileNotFound,
            _ => CommandError::Read {
                path: path.to_string(),
                source,
            },
        })?;
        let program = parse_program(&source)?;

        self.stop();
        self.program = Some(Arc::new(program));
        self.breakpoints.write().clear();
        tracing::info!(path, "program loaded");
        self.output.println("Program loaded.");
        Ok(())
    }

    fn install(&mut self, line: usize, breakpoint: Breakpoint) {
        if self.breakpoints.write().insert(line, breakpoint) {
            self.output.println(&format!(
                "Warning: breakpoint at line {} was overwritten",
                line
            ));
        }
    }

    fn list(&self) {
        self.output.println("List of breakpoints:");
        for (line, breakpoint) in self.breakpoints.read().iter() {
            self.output.println(&format!(
                "   At line {}, condition: {}",
                line, breakpoint.description
            ));
        }
        self.output.println("");
    }

    fn start(&mut self) -> Result<(), CommandError> {
        let program = self.program.clone().ok_or(CommandError::NoProgram)?;
        self.stop();

        tracing::info!("starting program");
        let mut session = Session::start(
            program,
            Arc::clone(&self.breakpoints),
            self.output.clone(),
        )
        .map_err(CommandError::Spawn)?;
        let outcome = session.wait();
        self.settle(session, outcome)
    }

    fn resume(&mut self) -> Result<(), CommandError> {
        let mut session = self.session.take().ok_or(CommandError::NothingToContinue)?;
        let outcome = session.resume();
        self.settle(session, outcome)
    }

    /// Keep the session if it suspended again, otherwise wind it down.
    fn settle(&mut self, session: Session, outcome: Outcome) -> Result<(), CommandError> {
        match outcome {
            Outcome::Suspended { .. } => {
                self.session = Some(session);
                Ok(())
            }
            Outcome::Finished(result) => {
                drop(session);
                let value = result?;
                tracing::info!(result = value, "program finished");
                Ok(())
            }
        }
    }

    fn evaluate(&mut self, source: &str) -> Result<(), CommandError> {
        let session = self.session.as_mut().ok_or(CommandError::NotRunning)?;
        let expr = parse_expression(source)?;
        let value = session.evaluate(expr)?;
        self.output.println(&format!("={}", value));
        Ok(())
    }

    /// Abandon the suspended run, if any.
    fn stop(&mut self) {
        if self.session.take().is_some() {
            tracing::info!("program stopped");
        }
    }

    fn report(&self, error: &CommandError) {
        self.output.println(&format!("Error: {}", error));
    }
}
