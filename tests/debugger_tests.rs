use funlang::debugger::breakpoints::{Breakpoint, Breakpoints};
use funlang::debugger::command::{Command, CommandError};
use funlang::parser::parse_expression;
use funlang::{Debugger, Output};
use pretty_assertions::assert_eq;

const PROGRAM: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/debug_program.fun");
const FAULTY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/faulty_program.fun");
const BROKEN: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/broken_program.fun");

/// Feed `input` to a fresh debugger and return everything it wrote.
fn transcript(input: &str) -> String {
    let output = Output::buffer();
    let mut debugger = Debugger::new(output.clone());
    debugger.run(input.as_bytes()).unwrap();
    output.contents()
}

fn session(path: &str, commands: &[&str]) -> String {
    let mut lines = vec![format!("load {}", path)];
    lines.extend(commands.iter().map(|command| command.to_string()));
    transcript(&lines.join("\n"))
}

#[test]
fn manages_breakpoint_list() {
    let output = session(
        PROGRAM,
        &[
            "list",
            "breakpoint 1",
            "condition 6 t > 3",
            "list",
            "remove 6",
            "list",
        ],
    );
    assert_eq!(
        output,
        ">Program loaded.\n\
         >List of breakpoints:\n\n\
         >>>List of breakpoints:\n   At line 1, condition: empty\n   At line 6, condition: t > 3\n\n\
         >>List of breakpoints:\n   At line 1, condition: empty\n\n\
         >"
    );
}

#[test]
fn warns_on_overwrite_and_missing_removal() {
    let output = session(PROGRAM, &["breakpoint 3", "condition 3 x == 2", "remove 4", "list"]);
    assert_eq!(
        output,
        ">Program loaded.\n\
         >>Warning: breakpoint at line 3 was overwritten\n\
         >Warning: there is no breakpoints on line 4\n\
         >List of breakpoints:\n   At line 3, condition: x == 2\n\n\
         >"
    );
}

#[test]
fn suspends_at_call_and_evaluates_in_place() {
    let output = session(
        PROGRAM,
        &["breakpoint 8", "run", "evaluate 2+2", "continue", "continue"],
    );
    assert_eq!(
        output,
        ">Program loaded.\n\
         >>line=8,elementType=FunctionCall>=4\n\
         line=8,elementType=FunctionCall>line=8,elementType=Identifier>20\n\
         >"
    );
}

#[test]
fn conditional_breakpoint_inside_function() {
    let output = session(
        PROGRAM,
        &[
            "condition 4 t > 3",
            "run",
            "evaluate x",
            "evaluate t",
            "stop",
            "continue",
        ],
    );
    assert_eq!(
        output,
        ">Program loaded.\n\
         >>line=4,elementType=ReturnStatement>=2\n\
         line=4,elementType=ReturnStatement>=4\n\
         line=4,elementType=ReturnStatement>>Error: there is nothing to continue\n\
         >"
    );
}

#[test]
fn breakpoint_on_first_line_hits_block_then_statement() {
    let output = session(PROGRAM, &["breakpoint 1", "run", "continue", "continue"]);
    assert_eq!(
        output,
        ">Program loaded.\n\
         >>line=1,elementType=Block>line=1,elementType=VariableDeclaration>20\n\
         >"
    );
}

#[test]
fn evaluate_has_side_effects_and_reports_errors() {
    let output = session(
        PROGRAM,
        &[
            "breakpoint 8",
            "run",
            "evaluate grow(2)",
            "evaluate t / 0",
            "evaluate undefined_name",
            "continue",
            "continue",
        ],
    );
    assert_eq!(
        output,
        ">Program loaded.\n\
         >>line=8,elementType=FunctionCall>=40\n\
         line=8,elementType=FunctionCall>Error: Forbidden arithmetic operation at line 1\n\
         line=8,elementType=FunctionCall>Error: Unknown identifier 'undefined_name' at line 1\n\
         line=8,elementType=FunctionCall>line=8,elementType=Identifier>40\n\
         >"
    );
}

#[test]
fn runs_to_completion_repeatedly() {
    let output = session(PROGRAM, &["run", "run"]);
    assert_eq!(output, ">Program loaded.\n>20\n>20\n>");
}

#[test]
fn runtime_errors_end_the_run() {
    let output = session(FAULTY, &["run", "continue"]);
    assert_eq!(
        output,
        ">Program loaded.\n\
         >10\n\
         Error: Forbidden arithmetic operation at line 4\n\
         >Error: there is nothing to continue\n\
         >"
    );
}

#[test]
fn end_of_input_abandons_suspended_run() {
    let output = session(PROGRAM, &["breakpoint 8", "run"]);
    assert_eq!(output, ">Program loaded.\n>>line=8,elementType=FunctionCall>");
}

#[test]
fn loading_stops_the_run_and_clears_breakpoints() {
    let load = format!("load {}", PROGRAM);
    let output = session(PROGRAM, &["breakpoint 8", "run", &load, "list"]);
    assert_eq!(
        output,
        ">Program loaded.\n\
         >>line=8,elementType=FunctionCall>Program loaded.\n\
         >List of breakpoints:\n\n\
         >"
    );
}

#[test]
fn commands_that_need_state() {
    assert_eq!(
        transcript("evaluate 1\nrun\ncontinue"),
        ">Error: command isn't available now - run any program first\n\
         >Error: no program loaded\n\
         >Error: there is nothing to continue\n\
         >"
    );
}

#[test]
fn missing_file() {
    assert_eq!(
        transcript("load /nonexistent/program.fun"),
        ">Error: file wasn't found\n>"
    );
}

#[test]
fn argument_errors() {
    assert_eq!(
        transcript("breakpoint\nbreakpoint x\ncondition 5\ncondition 5 1 +"),
        ">Error: some arguments missed\n\
         >Error: wrong types of arguments\n\
         >Error: condition expression is missed\n\
         >Error: Syntax error: Expected expression after '+' at line 1\n\
         >"
    );
}

#[test]
fn extra_empty_and_unknown_input() {
    assert_eq!(
        transcript("list all\nhello world\n\n"),
        ">List of breakpoints:\n\nWarning: Extra arguments were ignored\n\
         >>Warning: empty command ignored\n\
         >"
    );
}

#[test]
fn non_utf8_line_is_ignored_and_loop_continues() {
    let output = Output::buffer();
    let mut debugger = Debugger::new(output.clone());
    debugger.run(&b"\xff\xfe\nlist\n"[..]).unwrap();
    assert_eq!(output.contents(), ">>List of breakpoints:\n\n>");
}

#[test]
fn failed_load_keeps_the_suspended_run() {
    let output = Output::buffer();
    let mut debugger = Debugger::new(output.clone());
    debugger.execute_line(&format!("load {}", PROGRAM));
    debugger.execute_line("breakpoint 8");
    debugger.execute_line("run");

    debugger.execute_line("load /nonexistent/typo.fun");
    debugger.execute_line(&format!("load {}", BROKEN));
    assert!(debugger.is_suspended());
    assert_eq!(debugger.prompt(), "line=8,elementType=FunctionCall>");

    debugger.execute_line("list");
    debugger.execute_line("continue");
    debugger.execute_line("continue");
    assert!(!debugger.is_suspended());
    assert_eq!(
        output.contents(),
        "Program loaded.\n\
         Error: file wasn't found\n\
         Error: Syntax error: Expected variable name after 'var' at line 1\n\
         List of breakpoints:\n   At line 8, condition: empty\n\n\
         20\n"
    );
}

#[test]
fn prompt_tracks_suspension() {
    let output = Output::buffer();
    let mut debugger = Debugger::new(output.clone());
    assert_eq!(debugger.prompt(), ">");

    debugger.execute_line(&format!("load {}", PROGRAM));
    debugger.execute_line("breakpoint 6");
    debugger.execute_line("run");
    assert!(debugger.is_suspended());
    assert_eq!(debugger.prompt(), "line=6,elementType=FunctionCall>");

    debugger.execute_line("stop");
    assert!(!debugger.is_suspended());
    assert_eq!(debugger.prompt(), ">");
}

#[test]
fn execute_rejects_empty_condition() {
    let mut debugger = Debugger::new(Output::buffer());
    let result = debugger.execute(Command::Condition {
        line: 2,
        expression: String::new(),
    });
    assert!(matches!(result, Err(CommandError::EmptyCondition)));
}

#[test]
fn breakpoints_are_keyed_by_line() {
    let mut breakpoints = Breakpoints::new();
    assert!(breakpoints.is_empty());
    assert!(!breakpoints.insert(7, Breakpoint::unconditional()));
    assert!(!breakpoints.insert(
        2,
        Breakpoint::conditional(parse_expression("a < 3").unwrap(), "a < 3")
    ));
    assert!(breakpoints.insert(7, Breakpoint::unconditional()));

    let lines: Vec<usize> = breakpoints.iter().map(|(line, _)| line).collect();
    assert_eq!(lines, vec![2, 7]);
    assert_eq!(breakpoints.len(), 2);

    assert!(breakpoints.remove(2));
    assert!(!breakpoints.remove(2));
    assert!(breakpoints.get(2).is_none());
    assert_eq!(breakpoints.get(7).map(|b| b.description.as_str()), Some("empty"));
}
