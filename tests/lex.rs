use std::fs;

use cmmc::err::CmmErr;
use cmmc::lexer::token::TokenKind;
use cmmc::lexer::{tokenize, Lexer};

#[test]
fn listing() {
    let code = fs::read_to_string("tests/files/round_trip.cmm").unwrap();
    let tokens = tokenize(&code).unwrap();

    let lines: Vec<_> = tokens.iter()
        .take(6)
        .map(ToString::to_string)
        .collect();
    assert_eq!(lines, vec![
        "int\t<KW,1>",
        "a\t<IDN,a>",
        "=\t<OP,35>",
        "10\t<INT,10>",
        ";\t<SE,54>",
        "int\t<KW,1>",
    ]);

    assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(), 1);
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
}

#[test]
fn comments_and_floats() {
    let tokens = tokenize("/* a\n block */ float f = 3.14; // done\n").unwrap();
    let lines: Vec<_> = tokens.iter().map(ToString::to_string).collect();

    assert_eq!(&lines[..5], &["float\t<KW,6>", "f\t<IDN,f>", "=\t<OP,35>", "3.14\t<FLOAT,3.14>", ";\t<SE,54>"]);
    assert_eq!(tokens[0].span.line(), 1);
}

#[test]
fn all_errors_collected() {
    let code = fs::read_to_string("tests/files/bad_chars.cmm").unwrap();
    let errs = tokenize(&code).unwrap_err();

    assert_eq!(errs.len(), 2);
    assert!(errs.iter().all(|e| e.err().err_name() == "lexical error"));
    assert_eq!(errs[0].short_msg(), "1:11 :: lexical error: unrecognized input \"@\"");
    assert_eq!(errs[1].span().map(|s| s.start), Some((1, 10)));
    assert!(errs[0].full_msg(&code).ends_with("int a = 1 @ 2;\n          ^"));

    // the raw stream keeps the bad input in place and carries on past it
    let tokens = Lexer::new(&code).lex();
    let bad: Vec<_> = tokens.iter()
        .filter(|t| t.kind == TokenKind::Error)
        .map(ToString::to_string)
        .collect();
    assert_eq!(bad, vec!["@\t<ERROR,1,11>", "#\t<ERROR,2,11>"]);
    assert!(tokens.iter().any(|t| t.lexeme == "b"));
}
