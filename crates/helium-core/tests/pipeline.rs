//! End-to-end checks: source text through lexer, parser, printer and
//! interpreter.

use helium_core::printer::{self, AstPrinter};
use helium_core::{Interpreter, Lexer, Parser, Statement, Value};
use insta::assert_snapshot;

const SAMPLE: &str = r#"
let count: int = 3;
let label: string;
label = "n";
if count > 1 {
    print label, count * 2;
}
return count;
"#;

#[test]
fn sample_program_prints_tree() {
    let (program, diagnostics) = Parser::new(SAMPLE, "sample.he").parse();
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);

    assert_snapshot!(printer::render_program(program.as_ref()), @r#"
    Program statements' count 5
    Statement 1:
    Let Statement: count
    Data type: int
      Value: Integer Literal: 3

    Statement 2:
    Let Statement: label
    Data type: string
      Uninitialized

    Statement 3:
    Assignment Statement: label = String literal: n

    Statement 4:
    If Statement:
      Condition: Infix Expression: (Identifier: count
     > Integer Literal: 1
    )
      If Block:
        Statement 1:
    Print Statement: (
    Identifier: label
     -> Infix Expression: (Identifier: count
     * Integer Literal: 2
    )
    )


    Statement 5:
    Return Statement: Identifier: count
    "#);
}

#[test]
fn sample_program_runs() {
    let (program, _) = Parser::new(SAMPLE, "sample.he").parse();
    let mut interpreter = Interpreter::new(Vec::new());
    let result = interpreter.run(&program.unwrap()).unwrap();

    assert_eq!(result, Some(Value::Int(3)));
    assert_eq!(String::from_utf8(interpreter.into_inner()).unwrap(), "n 6\n");
}

#[test]
fn token_dump_matches_lexer_positions() {
    let tokens = Lexer::new("let x: int;\nprint x;").tokenize();
    let mut printer = AstPrinter::new(Vec::new());
    printer.print_tokens(&tokens).unwrap();
    let output = String::from_utf8(printer.into_inner()).unwrap();

    let print_line = output
        .lines()
        .find(|l| l.starts_with("Token Type: PRINT"))
        .unwrap();
    assert!(print_line.ends_with("Line : 2   Column : 1"));
    // The end-of-file token carries no literal.
    assert!(output.contains(&format!("Token {} has a NULL literal", tokens.len() - 1)));
    assert!(output.trim_end().ends_with("Ended lexer output"));
}

#[test]
fn malformed_source_still_prints() {
    let source = "let x: int = 1 + ; print a, , @; } return;";
    let (program, diagnostics) = Parser::new(source, "broken.he").parse();
    assert!(diagnostics.has_errors());

    let program = program.unwrap();
    let output = printer::render_program(Some(&program));
    assert!(output.contains(printer::NULL_EXPRESSION));
    assert!(output.contains(printer::NULL_PRINT_VALUE));
    assert!(output.contains(printer::UNKNOWN_EXPRESSION));
    assert!(output.contains(printer::UNKNOWN_STATEMENT));
    assert!(matches!(program.statements.last(), Some(Statement::Return { value: None })));
}

#[test]
fn abandoned_parse_prints_marker() {
    let source = format!("print {}1;", "-".repeat(500));
    let (program, diagnostics) = Parser::new(&source, "deep.he").parse();

    assert!(program.is_none());
    assert!(diagnostics.has_errors());
    assert_eq!(
        printer::render_program(program.as_ref()),
        format!("{}\n", printer::NULL_PROGRAM)
    );
}

#[test]
fn long_print_list_from_source() {
    const N: usize = 20_000;
    let args = vec!["1"; N].join(", ");
    let source = format!("print {};", args);
    let (program, diagnostics) = Parser::new(&source, "long.he").parse();
    assert!(diagnostics.is_empty());

    let output = printer::render_program(program.as_ref());
    assert_eq!(output.matches("Integer Literal: 1").count(), N);
    assert_eq!(output.matches(printer::CHAIN_SEPARATOR).count(), N - 1);
}

#[test]
fn long_operator_chain_is_abandoned() {
    let terms = vec!["1"; 10_000].join(" + ");
    let source = format!("print {};", terms);
    let (program, diagnostics) = Parser::new(&source, "chain.he").parse();

    assert!(program.is_none());
    assert_eq!(diagnostics.iter().last().unwrap().code, "E105");
    assert_eq!(
        printer::render_program(program.as_ref()),
        format!("{}\n", printer::NULL_PROGRAM)
    );

    let source = format!("let x: int = 0;\nx{};", "++".repeat(10_000));
    let (program, _) = Parser::new(&source, "chain.he").parse();
    assert!(program.is_none());
}

#[test]
fn operator_chain_within_limit_runs() {
    let terms = vec!["1"; 100].join(" + ");
    let source = format!("print {};", terms);
    let (program, diagnostics) = Parser::new(&source, "chain.he").parse();
    assert!(diagnostics.is_empty());

    let program = program.unwrap();
    let rendered = printer::render_program(Some(&program));
    assert_eq!(rendered.matches("Infix Expression").count(), 99);

    let mut interpreter = Interpreter::new(Vec::new());
    interpreter.run(&program).unwrap();
    assert_eq!(String::from_utf8(interpreter.into_inner()).unwrap(), "100\n");
}
