use crate::ast::Block;
use crate::error::FunError;
use crate::evaluator::Evaluator;
use crate::output::Output;
use crate::scope::Scope;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// A callable bound in a scope.
pub enum Function {
    Builtin(Builtin),
    User(Closure),
}

impl Function {
    pub fn apply(&self, args: &[i32], evaluator: &mut Evaluator<'_>) -> Result<i32, FunError> {
        match self {
            Function::Builtin(builtin) => Ok(builtin.apply(args)),
            Function::User(closure) => closure.apply(args, evaluator),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Function::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),
            Function::User(closure) => write!(f, "<fun ({})>", closure.params.join(", ")),
        }
    }
}

/// Native function writing its arguments to the output sink.
pub struct Builtin {
    name: &'static str,
    separator: &'static str,
    output: Output,
}

impl Builtin {
    /// `print(a, b)` writes `a b` and a newline.
    pub fn print(output: Output) -> Self {
        Self {
            name: "print",
            separator: " ",
            output,
        }
    }

    /// `println(a, b)` writes `a` and `b` on separate lines.
    pub fn println(output: Output) -> Self {
        Self {
            name: "println",
            separator: "\n",
            output,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, args: &[i32]) -> i32 {
        let text = args
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(self.separator);
        self.output.println(&text);
        0
    }
}

/// User function together with the scope it was defined in.
pub struct Closure {
    scope: Rc<Scope>,
    params: Vec<String>,
    body: Arc<Block>,
}

impl Closure {
    pub fn new(scope: Rc<Scope>, params: Vec<String>, body: Arc<Block>) -> Self {
        Self {
            scope,
            params,
            body,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn apply(&self, args: &[i32], evaluator: &mut Evaluator<'_>) -> Result<i32, FunError> {
        if args.len() != self.arity() {
            return Err(FunError::WrongArgumentsNumber {
                expected: self.arity(),
                found: args.len(),
            });
        }

        let frame = Scope::child(&self.scope);
        for (name, value) in self.params.iter().zip(args) {
            // Duplicate parameter names: the first binding wins.
            let _ = frame.define(name, *value);
        }

        evaluator.evaluate_block(&self.body, &frame)?;
        Ok(frame.result())
    }
}
