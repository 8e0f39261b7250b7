use funlang::ast::{Block, Expr, Node, Stmt};
use funlang::error::FunError;
use funlang::evaluator::{run_program, run_program_on_large_stack, Evaluator, Inspector};
use funlang::function::Closure;
use funlang::output::Output;
use funlang::parser::{parse_expression, parse_program};
use funlang::scope::Scope;
use pretty_assertions::assert_eq;
use std::rc::Rc;
use std::sync::Arc;

fn run(source: &str) -> Result<i32, FunError> {
    run_with_output(source).0
}

fn run_with_output(source: &str) -> (Result<i32, FunError>, String) {
    let program = parse_program(source).expect("program should parse");
    let output = Output::buffer();
    let result = run_program(&program, &output);
    (result, output.contents())
}

#[test]
fn arithmetic_follows_precedence() {
    assert_eq!(run("return 2*3+2*2 + 4*4"), Ok(26));
    assert_eq!(run("return (2*3+2*2 < (0-4)*(0-4))"), Ok(1));
    assert_eq!(run("return 17 % 5 - 7 / 2"), Ok(-1));
}

#[test]
fn comparison_and_logic_give_zero_or_one() {
    assert_eq!(run("return 3 >= 3"), Ok(1));
    assert_eq!(run("return 3 != 3"), Ok(0));
    assert_eq!(run("return 5 && 7"), Ok(1));
    assert_eq!(run("return 0 || 0"), Ok(0));
    assert_eq!(run("return 0 || 9"), Ok(1));
}

#[test]
fn arithmetic_wraps_on_overflow() {
    assert_eq!(run("return 2147483647 + 1"), Ok(i32::MIN));
    assert_eq!(run("return (0 - 2147483647 - 1) / (0 - 1)"), Ok(i32::MIN));
}

#[test]
fn division_by_zero_is_an_error() {
    assert_eq!(run("return 7 / 0"), Err(FunError::Arithmetic { line: 1 }));
    assert_eq!(
        run("var z = 0\nreturn 5 % z"),
        Err(FunError::Arithmetic { line: 2 })
    );
}

#[test]
fn closures_write_through_to_captured_scope() {
    let source = "var t = 1
fun p(x) { t = t * x }
p(2)
p(p(2) + 1)
return t";
    assert_eq!(run(source), Ok(4));
}

#[test]
fn counts_divisors_with_loops() {
    let source = "var n = 24
var t = 1
var cnt
while (t <= n) {
    if (n % t == 0) { cnt = cnt + 1 }
    t = t + 1
}
return cnt";
    assert_eq!(run(source), Ok(8));
}

#[test]
fn recursion() {
    let source = "fun fact(n) {
    if (n <= 1) { return 1 }
    return n * fact(n - 1)
}
return fact(10)";
    assert_eq!(run(source), Ok(3628800));
}

#[test]
fn return_unwinds_loops_inside_functions() {
    let source = "fun first(n) {
    var i = 0
    while (1) {
        if (i * i >= n) { return i }
        i = i + 1
    }
    return 0 - 1
}
return first(50)";
    assert_eq!(run(source), Ok(8));
}

#[test]
fn top_level_return_stops_the_program() {
    let (result, output) = run_with_output("print(1)\nreturn 5\nprint(2)");
    assert_eq!(result, Ok(5));
    assert_eq!(output, "1\n");
}

#[test]
fn missing_return_yields_zero() {
    assert_eq!(run("fun f() { var a = 1 }\nreturn f()"), Ok(0));
    assert_eq!(run("var x = 5"), Ok(0));
    assert_eq!(run(""), Ok(0));
}

#[test]
fn redefinition_in_same_scope_fails() {
    assert_eq!(
        run("var x = 1\nvar x = 2"),
        Err(FunError::Redefinition {
            name: "x".to_string(),
            line: 2
        })
    );
    assert_eq!(
        run("fun f() { }\nfun f() { }"),
        Err(FunError::Redefinition {
            name: "f".to_string(),
            line: 2
        })
    );
}

#[test]
fn variables_and_functions_have_separate_namespaces() {
    assert_eq!(run("var f = 3\nfun f(x) { return x + 1 }\nreturn f(f)"), Ok(4));
}

#[test]
fn inner_blocks_shadow_outer_names() {
    assert_eq!(run("var x = 1\nif (1) { var x = 2 }\nreturn x"), Ok(1));
    assert_eq!(
        run("var x = 1\nfun f(x) { return x * 10 }\nreturn f(7) + x"),
        Ok(71)
    );
}

#[test]
fn loop_bodies_get_a_fresh_scope_each_iteration() {
    let source = "var i = 0
while (i < 3) {
    var k = i
    i = i + 1
}
return i";
    assert_eq!(run(source), Ok(3));
}

#[test]
fn unknown_names_are_reported() {
    assert_eq!(
        run("return y"),
        Err(FunError::UnknownIdentifier {
            name: "y".to_string(),
            line: 1
        })
    );
    assert_eq!(
        run("var a = 1\nfoo(a)"),
        Err(FunError::UnknownIdentifier {
            name: "foo".to_string(),
            line: 2
        })
    );
}

#[test]
fn assignment_requires_a_declaration() {
    assert_eq!(
        run("x = 5"),
        Err(FunError::UnknownIdentifier {
            name: "x".to_string(),
            line: 1
        })
    );
}

#[test]
fn scoping_is_lexical() {
    let source = "fun get() { return hidden }
fun caller() {
    var hidden = 5
    return get()
}
return caller()";
    assert_eq!(
        run(source),
        Err(FunError::UnknownIdentifier {
            name: "hidden".to_string(),
            line: 1
        })
    );
}

#[test]
fn wrong_argument_count_reports_call_site() {
    let source = "fun f(a) { return a }
var r = 0
r = f(1, 2)";
    let error = run(source).unwrap_err();
    assert_eq!(
        error,
        FunError::FunctionCall {
            name: "f".to_string(),
            line: 3
        }
    );
    assert_eq!(
        error.to_string(),
        "Wrong number of arguments in call to 'f' at line 3"
    );
}

#[test]
fn logical_operators_evaluate_both_sides() {
    let source = "fun side(x) {
    print(x)
    return x
}
return side(0) && side(1)";
    let (result, output) = run_with_output(source);
    assert_eq!(result, Ok(0));
    assert_eq!(output, "0\n1\n");
}

#[test]
fn operands_and_arguments_evaluate_left_to_right() {
    let source = "fun side(x) {
    print(x)
    return x
}
fun pair(a, b) { return a * 10 + b }
return side(1) - side(2) + pair(side(3), side(4))";
    let (result, output) = run_with_output(source);
    assert_eq!(result, Ok(33));
    assert_eq!(output, "1\n2\n3\n4\n");
}

#[test]
fn print_builtins() {
    let (result, output) = run_with_output("print(1, 2, 3)\nprintln(4, 5)\nprint()");
    assert_eq!(result, Ok(0));
    assert_eq!(output, "1 2 3\n4\n5\n\n");
}

#[test]
fn builtins_can_be_shadowed() {
    let (result, output) = run_with_output("fun print(x) { return x + 1 }\nreturn print(1)");
    assert_eq!(result, Ok(2));
    assert_eq!(output, "");
}

#[test]
fn evaluates_single_nodes_in_a_given_scope() {
    let output = Output::buffer();
    let mut evaluator = Evaluator::new(output.clone());
    let scope = evaluator.prelude();

    let file = parse_program("var a = 6").unwrap();
    let declaration = &file.block.statements[0];
    assert_eq!(evaluator.evaluate(Node::Stmt(declaration), &scope), Ok(None));
    assert_eq!(scope.get("a"), Some(6));

    let expr = parse_expression("a * 7").unwrap();
    assert_eq!(evaluator.evaluate(Node::Expr(&expr), &scope), Ok(Some(42)));
    scope.release();
}

/// Records every visited node.
#[derive(Default)]
struct Recorder {
    visits: Vec<String>,
}

impl Inspector for Recorder {
    fn visit(&mut self, node: Node<'_>, _scope: &Rc<Scope>) -> Result<(), FunError> {
        self.visits.push(format!("{}:{}", node.line(), node.kind()));
        Ok(())
    }
}

#[test]
fn inspector_sees_nodes_in_evaluation_order() {
    let file = parse_program("var a = 1\nfun f(x) {\n  return x + a\n}\nprint(f(2))").unwrap();
    let mut recorder = Recorder::default();
    {
        let mut evaluator = Evaluator::with_inspector(Output::buffer(), &mut recorder);
        let scope = evaluator.prelude();
        assert_eq!(evaluator.evaluate_file(&file, &scope), Ok(0));
        scope.release();
    }

    assert_eq!(
        recorder.visits,
        vec![
            "1:Block",
            "1:VariableDeclaration",
            "2:FunctionDefinition",
            "5:FunctionCall",
            "5:FunctionCall",
            "3:Block",
            "3:ReturnStatement",
            "3:BinaryExpression",
            "3:Identifier",
            "3:Identifier",
        ]
    );
}

/// Stops the run at the first node on the given line.
struct StopAt(usize);

impl Inspector for StopAt {
    fn visit(&mut self, node: Node<'_>, _scope: &Rc<Scope>) -> Result<(), FunError> {
        if node.line() == self.0 {
            Err(FunError::Stopped)
        } else {
            Ok(())
        }
    }
}

#[test]
fn inspector_errors_abort_evaluation() {
    let file = parse_program("print(1)\nprint(2)\nprint(3)").unwrap();
    let output = Output::buffer();
    let mut inspector = StopAt(2);
    let mut evaluator = Evaluator::with_inspector(output.clone(), &mut inspector);
    let scope = evaluator.prelude();

    assert_eq!(evaluator.evaluate_file(&file, &scope), Err(FunError::Stopped));
    assert_eq!(output.contents(), "1\n");
    scope.release();
}

#[test]
fn return_value_is_read_from_returning_statement() {
    let file = parse_program("return 3 * 3").unwrap();
    let Stmt::Return { value, .. } = &file.block.statements[0] else {
        panic!("expected a return statement");
    };
    assert!(matches!(value, Expr::Binary { .. }));
    assert_eq!(run_program(&file, &Output::buffer()), Ok(9));
}

const DEEP_RECURSION: &str = "fun depth(n) {
    if (n == 0) { return 0 }
    return 1 + depth(n - 1)
}
return depth(3000)";

#[test]
fn deep_recursion_runs_on_large_stack() {
    let program = parse_program(DEEP_RECURSION).unwrap();
    assert_eq!(run_program_on_large_stack(&program, &Output::buffer()), Ok(3000));
}

#[test]
fn file_runner_uses_large_stack() {
    assert_eq!(funlang::run(DEEP_RECURSION, None), Ok(3000));
}

#[test]
fn closure_arity_counts_parameters() {
    let body = Arc::new(Block {
        statements: Vec::new(),
        line: 1,
    });
    let closure = Closure::new(Scope::root(), vec!["a".to_string(), "b".to_string()], body);
    assert_eq!(closure.arity(), 2);
}
