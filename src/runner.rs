use crate::error::FunError;
use crate::evaluator::run_program_on_large_stack;
use crate::output::Output;
use crate::parser::parse_program;

/// Parse and evaluate a whole source file, printing program output to stdout
/// and errors as diagnostics on stderr.
///
/// Returns the program's result, or the error that ended it.
pub fn run(source: &str, filename: Option<&str>) -> Result<i32, FunError> {
    let result = parse_program(source)
        .and_then(|program| run_program_on_large_stack(&program, &Output::stdout()));

    match &result {
        Ok(value) => tracing::debug!(result = value, "program finished"),
        Err(error) => error.report(source, filename),
    }
    result
}
