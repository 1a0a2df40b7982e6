//! Converts sequences of tokens to an AST.
//!
//! The parser is a table-driven SLR(1) parser.
//! The tables are built from the [C-- grammar][crate::grammar::cmm] once, on first use,
//! and a shift-reduce [`Driver`] walks the token stream over them,
//! building the AST bottom-up as productions are reduced.
//!
//! This module provides:
//! - [`parse`]: A function to parse [a list of lexed tokens][`crate::lexer`] into an AST.
//! - [`parse_traced`]: Similar to `parse`, but also returns each step the driver took.
//! - [`sets`], [`table`]: FIRST/FOLLOW sets, the LR(0) automaton, and the SLR(1) tables.
//! - [`Driver`]: The shift-reduce engine, generic over its [`Semantics`].
//! - [`descent::Parser`]: A recursive descent parser for the same grammar.

use once_cell::sync::Lazy;

use crate::ast::CompUnit;
use crate::err::{CmmErr, FullCmmErr};
use crate::grammar::cmm::GRAMMAR;
use crate::lexer::token::Token;

pub use self::driver::{Driver, Semantics, StepKind, TraceStep};
pub use self::table::{Action, ParseTable};

pub mod sets;
pub mod table;
pub mod driver;
pub mod descent;
mod actions;

/// The SLR(1) tables of C--, built on first use.
pub static TABLE: Lazy<ParseTable> = Lazy::new(|| ParseTable::from_grammar(&GRAMMAR));

/// Parses a sequence of tokens (ending with the end-of-input token) into an AST.
pub fn parse(tokens: &[Token]) -> ParseResult<CompUnit> {
    Driver::new(&GRAMMAR, &TABLE).run(tokens, &mut actions::AstBuilder::default())?
        .into_program()
}

/// Parses a sequence of tokens into an AST, and returns the steps the driver took
/// (up to and including the failing step, if parsing failed).
pub fn parse_traced(tokens: &[Token]) -> (ParseResult<CompUnit>, Vec<TraceStep>) {
    let mut driver = Driver::new(&GRAMMAR, &TABLE).with_trace();
    let result = driver.run(tokens, &mut actions::AstBuilder::default())
        .and_then(|v| v.into_program());

    (result, driver.into_trace())
}

/// An error that occurs in the parsing process.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ParseErr {
    /// The parser found a token that cannot occur here.
    UnexpectedToken {
        /// The offending token
        found: String,
        /// The terminals that could have occurred here
        expected: Vec<&'static str>
    },

    /// A numeric literal could not be represented.
    InvalidLiteral(String),

    /// The GOTO table had no entry after a reduction.
    MissingGoto {
        /// The state uncovered by the reduction
        state: usize,
        /// The non-terminal that was reduced to
        symbol: &'static str
    },

    /// A semantic action found an unexpected value on the value stack.
    UnexpectedValue(&'static str)
}

impl CmmErr for ParseErr {
    fn err_name(&self) -> &'static str {
        match self {
            ParseErr::UnexpectedToken { .. } | ParseErr::InvalidLiteral(_) => "syntax error",
            ParseErr::MissingGoto { .. } | ParseErr::UnexpectedValue(_) => "internal error",
        }
    }
}

impl std::fmt::Display for ParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErr::UnexpectedToken { found, expected } => match &expected[..] {
                []  => write!(f, "unexpected {found}"),
                [e] => write!(f, "unexpected {found}, expected '{e}'"),
                es  => {
                    let estr = es.iter()
                        .map(|e| format!("'{e}'"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    write!(f, "unexpected {found}, expected one of {estr}")
                }
            },
            ParseErr::InvalidLiteral(s) => write!(f, "literal {s} is out of range"),
            ParseErr::MissingGoto { state, symbol } => write!(f, "no GOTO entry for state {state} on {symbol}"),
            ParseErr::UnexpectedValue(v) => write!(f, "expected {v} on the value stack"),
        }
    }
}

impl std::error::Error for ParseErr {}

/// A [`Result`] type for operations in the parsing process.
pub type ParseResult<T> = Result<T, FullParseErr>;
/// A [`ParseErr`] with its position.
pub type FullParseErr = FullCmmErr<ParseErr>;
