use crate::ast::{Block, Expr, File, Node, Stmt};
use crate::error::FunError;
use crate::function::{Builtin, Closure, Function};
use crate::output::Output;
use crate::scope::Scope;
use std::panic;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;

/// Stack given to threads that evaluate programs. Recursion in a program
/// recurses in the evaluator.
pub const EVALUATION_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Observer consulted before each node is evaluated.
///
/// `File` and `Literal` nodes are never reported. An error returned from
/// `visit` aborts the evaluation and is propagated to the caller unchanged.
pub trait Inspector {
    fn visit(&mut self, node: Node<'_>, scope: &Rc<Scope>) -> Result<(), FunError>;
}

/// Evaluate a whole program in a fresh root scope holding the builtins.
///
/// Returns the value of the first `return` that unwound to the top level,
/// or 0 when the program never returned.
pub fn run_program(file: &File, output: &Output) -> Result<i32, FunError> {
    let mut evaluator = Evaluator::new(output.clone());
    let scope = evaluator.prelude();
    let result = evaluator.evaluate_file(file, &scope);
    scope.release();
    result
}

/// [`run_program`] on a thread with [`EVALUATION_STACK_SIZE`] of stack.
pub fn run_program_on_large_stack(file: &File, output: &Output) -> Result<i32, FunError> {
    thread::scope(|threads| {
        let worker = thread::Builder::new()
            .name("funlang-eval".to_string())
            .stack_size(EVALUATION_STACK_SIZE)
            .spawn_scoped(threads, move || run_program(file, output));

        match worker {
            Ok(worker) => worker
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload)),
            Err(error) => {
                tracing::warn!(%error, "failed to spawn evaluation thread, running inline");
                run_program(file, output)
            }
        }
    })
}

pub struct Evaluator<'i> {
    output: Output,
    inspector: Option<&'i mut dyn Inspector>,
}

impl<'i> Evaluator<'i> {
    pub fn new(output: Output) -> Self {
        Self {
            output,
            inspector: None,
        }
    }

    pub fn with_inspector(output: Output, inspector: &'i mut dyn Inspector) -> Self {
        Self {
            output,
            inspector: Some(inspector),
        }
    }

    /// Root scope with `print` and `println` bound to this evaluator's output.
    pub fn prelude(&self) -> Rc<Scope> {
        let scope = Scope::root();
        for builtin in [
            Builtin::print(self.output.clone()),
            Builtin::println(self.output.clone()),
        ] {
            let name = builtin.name();
            // A fresh scope cannot already hold the name.
            let _ = scope.define_function(name, Function::Builtin(builtin));
        }
        scope
    }

    /// Evaluate any node. Expressions and files produce a value, other
    /// statements and blocks produce `None`.
    pub fn evaluate(&mut self, node: Node<'_>, scope: &Rc<Scope>) -> Result<Option<i32>, FunError> {
        match node {
            Node::File(file) => self.evaluate_file(file, scope).map(Some),
            Node::Block(block) => self.evaluate_block(block, scope).map(|_| None),
            Node::Stmt(stmt) => self.evaluate_statement(stmt, scope),
            Node::Expr(expr) => self.evaluate_expression(expr, scope).map(Some),
        }
    }

    pub fn evaluate_file(&mut self, file: &File, scope: &Rc<Scope>) -> Result<i32, FunError> {
        self.evaluate_block(&file.block, scope)?;
        Ok(scope.result())
    }

    /// Run the statements in a child of `scope`. A `return` inside stops the
    /// block and is handed on to `scope`.
    pub fn evaluate_block(&mut self, block: &Block, scope: &Rc<Scope>) -> Result<(), FunError> {
        self.inspect(Node::Block(block), scope)?;

        let local = Scope::child(scope);
        let result = self.execute_statements(&block.statements, &local, scope);
        local.release();
        result
    }

    fn execute_statements(
        &mut self,
        statements: &[Stmt],
        local: &Rc<Scope>,
        parent: &Rc<Scope>,
    ) -> Result<(), FunError> {
        for statement in statements {
            self.evaluate_statement(statement, local)?;
            if local.is_interrupted() {
                parent.interrupt(local.result());
                break;
            }
        }
        Ok(())
    }

    pub fn evaluate_statement(
        &mut self,
        stmt: &Stmt,
        scope: &Rc<Scope>,
    ) -> Result<Option<i32>, FunError> {
        // An expression statement is reported through its expression.
        if !matches!(stmt, Stmt::Expression(_)) {
            self.inspect(Node::Stmt(stmt), scope)?;
        }

        match stmt {
            Stmt::Expression(expr) => return self.evaluate_expression(expr, scope).map(Some),
            Stmt::FunctionDefinition {
                name,
                params,
                body,
                line,
            } => {
                let closure = Closure::new(Rc::clone(scope), params.clone(), Arc::clone(body));
                scope
                    .define_function(name, Function::User(closure))
                    .map_err(|_| FunError::Redefinition {
                        name: name.clone(),
                        line: *line,
                    })?;
            }
            Stmt::VariableDeclaration { name, value, line } => {
                let value = match value {
                    Some(expr) => self.evaluate_expression(expr, scope)?,
                    None => 0,
                };
                scope.define(name, value).map_err(|_| FunError::Redefinition {
                    name: name.clone(),
                    line: *line,
                })?;
            }
            Stmt::While {
                condition, body, ..
            } => {
                while !scope.is_interrupted() && self.evaluate_expression(condition, scope)? != 0 {
                    self.evaluate_block(body, scope)?;
                }
            }
            Stmt::If {
                condition,
                body,
                else_body,
                ..
            } => {
                if self.evaluate_expression(condition, scope)? != 0 {
                    self.evaluate_block(body, scope)?;
                } else if let Some(else_body) = else_body {
                    self.evaluate_block(else_body, scope)?;
                }
            }
            Stmt::Assignment { name, value, line } => {
                let value = self.evaluate_expression(value, scope)?;
                scope.set(name, value).map_err(|_| FunError::UnknownIdentifier {
                    name: name.clone(),
                    line: *line,
                })?;
            }
            Stmt::Return { value, .. } => {
                let value = self.evaluate_expression(value, scope)?;
                scope.interrupt(value);
            }
        }

        Ok(None)
    }

    pub fn evaluate_expression(&mut self, expr: &Expr, scope: &Rc<Scope>) -> Result<i32, FunError> {
        match expr {
            Expr::Literal { value, .. } => Ok(*value),
            Expr::Identifier { name, line } => {
                self.inspect(Node::Expr(expr), scope)?;
                scope.get(name).ok_or_else(|| FunError::UnknownIdentifier {
                    name: name.clone(),
                    line: *line,
                })
            }
            Expr::Binary {
                left,
                operator,
                right,
                line,
            } => {
                self.inspect(Node::Expr(expr), scope)?;
                let left_val = self.evaluate_expression(left, scope)?;
                let right_val = self.evaluate_expression(right, scope)?;
                operator
                    .apply(left_val, right_val)
                    .ok_or(FunError::Arithmetic { line: *line })
            }
            Expr::Call { name, args, line } => {
                self.inspect(Node::Expr(expr), scope)?;
                let function = scope
                    .function(name)
                    .ok_or_else(|| FunError::UnknownIdentifier {
                        name: name.clone(),
                        line: *line,
                    })?;

                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate_expression(arg, scope)?);
                }

                tracing::trace!(function = %name, ?values, line, "call");
                function.apply(&values, self).map_err(|error| match error {
                    FunError::WrongArgumentsNumber { .. } => FunError::FunctionCall {
                        name: name.clone(),
                        line: *line,
                    },
                    other => other,
                })
            }
        }
    }

    fn inspect(&mut self, node: Node<'_>, scope: &Rc<Scope>) -> Result<(), FunError> {
        match self.inspector.as_deref_mut() {
            Some(inspector) => inspector.visit(node, scope),
            None => Ok(()),
        }
    }
}
