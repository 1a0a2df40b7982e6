use std::fs;

use cmmc::ast::{BlockItem, CompUnit, Item, Stmt};
use cmmc::err::CmmErr;
use cmmc::lexer::tokenize;
use cmmc::parser::{self, descent, ParseErr, StepKind};

fn read(name: &str) -> String {
    fs::read_to_string(format!("tests/files/{name}")).unwrap()
}

fn parse(code: &str) -> CompUnit {
    parser::parse(&tokenize(code).unwrap()).unwrap()
}

#[test]
fn round_trip() {
    let code = read("round_trip.cmm");
    let ast = parse(&code);

    assert_eq!(ast.items.len(), 2);
    assert!(matches!(ast.items[0], Item::Decl(_)));
    assert!(matches!(ast.items[1], Item::FuncDef(_)));
    assert_eq!(ast.to_string(), "int a = 10;\nint main() {\n    a = a + 5;\n    return a;\n}\n");

    // the printed program parses to the same tree
    assert_eq!(parse(&ast.to_string()), ast);
}

#[test]
fn missing_semicolon() {
    let code = read("missing_semi.cmm");
    let tokens = tokenize(&code).unwrap();
    let err = parser::parse(&tokens).unwrap_err();

    assert_eq!(err.err().err_name(), "syntax error");
    assert!(matches!(err.err(), ParseErr::UnexpectedToken { found, .. } if found == "'int'"));

    // at or after the missing `;`
    let span = err.span().unwrap();
    assert_eq!(span.line(), 0);
    assert!(span.col() >= 10, "{span}");
}

#[test]
fn trace_ends_in_error() {
    let code = read("missing_semi.cmm");
    let tokens = tokenize(&code).unwrap();
    let (result, trace) = parser::parse_traced(&tokens);

    assert!(result.is_err());
    assert_eq!(trace.last().map(|s| s.kind), Some(StepKind::Error));
    assert_eq!(trace.first().map(|s| s.kind), Some(StepKind::Move));
}

#[test]
fn trace_ends_in_accept() {
    let tokens = tokenize(&read("loops.cmm")).unwrap();
    let (result, trace) = parser::parse_traced(&tokens);

    assert!(result.is_ok());
    assert_eq!(trace.last().map(|s| s.kind), Some(StepKind::Accept));
    assert!(trace.iter().any(|s| s.kind == StepKind::Reduction));
}

#[test]
fn parsers_agree() {
    for name in ["round_trip.cmm", "loops.cmm", "semantic_errors.cmm"] {
        let tokens = tokenize(&read(name)).unwrap();
        let slr = parser::parse(&tokens).unwrap();
        let rd = descent::parse(tokens).unwrap();

        assert_eq!(slr, rd, "{name}");
    }
}

#[test]
fn left_associative() {
    let ast = parse("int f(int a, int b, int c) { return a - b - c; }");
    let printed = ast.to_string();
    assert!(printed.contains("return a - b - c;"));

    // grouping on the right survives printing as-is
    let ast = parse("int f(int a, int b, int c) { return a - (b - c); }");
    assert!(ast.to_string().contains("return a - (b - c);"));
}

#[test]
fn dangling_else() {
    let ast = parse("void f(int a, int b) { if (a) if (b) putint(1); else putint(2); }");
    let Item::FuncDef(f) = &ast.items[0] else { panic!("expected a function") };
    let BlockItem::Stmt(Stmt::If { then, els, .. }) = &f.block.items[0] else { panic!("expected an if") };

    // the else belongs to the inner if
    assert!(els.is_none());
    assert!(matches!(&**then, Stmt::If { els: Some(_), .. }));
}
