// Fun Language Interpreter Library
//
// Core library for the Fun language: a small imperative integer language
// with a tree-walking evaluator and an interactive breakpoint debugger.

// Public modules
pub mod ast;
pub mod debugger;
pub mod error;
pub mod evaluator;
pub mod function;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod runner;
pub mod scope;

// Re-export commonly used items
pub use ast::{BinaryOp, Block, Expr, File, Node, NodeKind, Stmt};
pub use debugger::Debugger;
pub use error::{FunError, Span};
pub use evaluator::{run_program, run_program_on_large_stack, Evaluator, Inspector};
pub use function::{Builtin, Closure, Function};
pub use lexer::{Lexer, Token, TokenType};
pub use output::Output;
pub use parser::{parse_expression, parse_program, Parser};
pub use scope::{BindingError, Scope};

// Re-export main functions
pub use runner::run;
