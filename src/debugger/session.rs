//! A program run that can be suspended at breakpoints.
//!
//! The program is evaluated on a worker thread which owns every scope of the
//! run. The worker and the command loop talk over zero-capacity channels, so
//! control is handed back and forth and the two never run at the same time.
//! While suspended, the worker sits inside `Inspector::visit` waiting for the
//! next request; that blocked call is the continuation of the run.

use super::breakpoints::Breakpoints;
use crate::ast::{Expr, File, Node, NodeKind};
use crate::error::FunError;
use crate::evaluator::{Evaluator, Inspector, EVALUATION_STACK_SIZE};
use crate::output::Output;
use crate::scope::Scope;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::RwLock;
use std::io;
use std::rc::Rc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Requests sent to a suspended worker.
enum Resume {
    Evaluate(Expr),
    Continue,
}

/// Notifications sent back by the worker.
enum Event {
    Suspended { line: usize, kind: NodeKind },
    Evaluated(Result<i32, FunError>),
    Finished(Result<i32, FunError>),
}

/// Where a run stands after control came back to the command loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Suspended { line: usize, kind: NodeKind },
    Finished(Result<i32, FunError>),
}

pub struct Session {
    commands: Option<Sender<Resume>>,
    events: Option<Receiver<Event>>,
    worker: Option<JoinHandle<()>>,
    position: Option<(usize, NodeKind)>,
}

impl Session {
    /// Spawn the worker. It runs until the first suspension or the end of the
    /// program; call [`Session::wait`] to find out which.
    pub fn start(
        program: Arc<File>,
        breakpoints: Arc<RwLock<Breakpoints>>,
        output: Output,
    ) -> io::Result<Self> {
        let (command_tx, command_rx) = channel::bounded(0);
        let (event_tx, event_rx) = channel::bounded(0);

        let worker = thread::Builder::new()
            .name("funlang-eval".to_string())
            .stack_size(EVALUATION_STACK_SIZE)
            .spawn(move || {
                let inspector = BreakpointInspector {
                    breakpoints,
                    output: output.clone(),
                    commands: command_rx,
                    events: event_tx.clone(),
                };
                let result = evaluate_program(&program, output, inspector);
                // The command loop may already have stopped listening.
                let _ = event_tx.send(Event::Finished(result));
            })?;

        Ok(Self {
            commands: Some(command_tx),
            events: Some(event_rx),
            worker: Some(worker),
            position: None,
        })
    }

    /// Line and node kind of the current suspension point.
    pub fn position(&self) -> Option<(usize, NodeKind)> {
        self.position
    }

    /// Block until the worker suspends or finishes.
    pub fn wait(&mut self) -> Outcome {
        self.position = None;
        let Some(events) = &self.events else {
            return Outcome::Finished(Err(FunError::Stopped));
        };

        loop {
            match events.recv() {
                Ok(Event::Suspended { line, kind }) => {
                    self.position = Some((line, kind));
                    return Outcome::Suspended { line, kind };
                }
                Ok(Event::Finished(result)) => return Outcome::Finished(result),
                Ok(Event::Evaluated(_)) => {
                    tracing::warn!("dropping evaluation result nobody asked for");
                }
                Err(_) => return Outcome::Finished(Err(FunError::Stopped)),
            }
        }
    }

    /// Evaluate `expr` in the suspended scope without resuming the run.
    pub fn evaluate(&mut self, expr: Expr) -> Result<i32, FunError> {
        let (Some(commands), Some(events)) = (&self.commands, &self.events) else {
            return Err(FunError::Stopped);
        };

        commands
            .send(Resume::Evaluate(expr))
            .map_err(|_| FunError::Stopped)?;
        match events.recv() {
            Ok(Event::Evaluated(result)) => result,
            Ok(Event::Finished(_) | Event::Suspended { .. }) | Err(_) => Err(FunError::Stopped),
        }
    }

    /// Continue the run up to its next suspension or its end.
    pub fn resume(&mut self) -> Outcome {
        let sent = match &self.commands {
            Some(commands) => commands.send(Resume::Continue).is_ok(),
            None => false,
        };
        if !sent {
            return Outcome::Finished(Err(FunError::Stopped));
        }

        tracing::debug!("resuming evaluation");
        self.wait()
    }
}

impl Drop for Session {
    /// Cancel the run if it is still suspended and wait for the worker.
    fn drop(&mut self) {
        self.commands.take();
        self.events.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("evaluation thread panicked");
            }
        }
    }
}

fn evaluate_program(
    program: &File,
    output: Output,
    mut inspector: BreakpointInspector,
) -> Result<i32, FunError> {
    let mut evaluator = Evaluator::with_inspector(output, &mut inspector);
    let scope = evaluator.prelude();
    let result = evaluator.evaluate_file(program, &scope);
    scope.release();
    result
}

/// Suspends the worker when a node sits on a line whose breakpoint
/// condition holds.
struct BreakpointInspector {
    breakpoints: Arc<RwLock<Breakpoints>>,
    output: Output,
    commands: Receiver<Resume>,
    events: Sender<Event>,
}

impl BreakpointInspector {
    fn condition(&self, line: usize) -> Option<Expr> {
        self.breakpoints
            .read()
            .get(line)
            .map(|breakpoint| breakpoint.condition.clone())
    }
}

impl Inspector for BreakpointInspector {
    fn visit(&mut self, node: Node<'_>, scope: &Rc<Scope>) -> Result<(), FunError> {
        let line = node.line();
        let Some(condition) = self.condition(line) else {
            return Ok(());
        };

        // Conditions and `evaluate` requests run without breakpoints.
        if Evaluator::new(self.output.clone()).evaluate_expression(&condition, scope)? == 0 {
            return Ok(());
        }

        let kind = node.kind();
        tracing::debug!(line, %kind, "suspended at breakpoint");
        self.events
            .send(Event::Suspended { line, kind })
            .map_err(|_| FunError::Stopped)?;

        loop {
            match self.commands.recv() {
                Ok(Resume::Evaluate(expr)) => {
                    let result =
                        Evaluator::new(self.output.clone()).evaluate_expression(&expr, scope);
                    self.events
                        .send(Event::Evaluated(result))
                        .map_err(|_| FunError::Stopped)?;
                }
                Ok(Resume::Continue) => return Ok(()),
                Err(_) => {
                    tracing::debug!(line, "run stopped while suspended");
                    return Err(FunError::Stopped);
                }
            }
        }
    }
}
