//! The shift-reduce engine.
//!
//! The [`Driver`] keeps a stack of states and an aligned stack of semantic values.
//! What the values are, and how they combine on a reduction, is up to its [`Semantics`].

use std::fmt::Display;

use crate::err::{CmmErr, Span};
use crate::grammar::{Grammar, Production, Symbol};
use crate::lexer::token::{Token, TokenKind};

use super::table::{Action, ParseTable};
use super::{ParseErr, ParseResult};

/// The semantic values of a parse and how they are built.
pub trait Semantics {
    /// The value associated with each stack entry.
    type Value;

    /// The value of a shifted terminal.
    fn shift(&mut self, token: &Token) -> ParseResult<Self::Value>;

    /// The value of a reduced production, given the values of its right-hand side (left to right).
    fn reduce(&mut self, prod: &Production, args: Vec<Self::Value>) -> ParseResult<Self::Value>;
}

/// The kind of a parse step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StepKind {
    /// A terminal was shifted
    Move,
    /// A production was reduced
    Reduction,
    /// The input was accepted
    Accept,
    /// There was no action for the lookahead
    Error
}

impl Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepKind::Move      => f.write_str("move"),
            StepKind::Reduction => f.write_str("reduction"),
            StepKind::Accept    => f.write_str("accept"),
            StepKind::Error     => f.write_str("error"),
        }
    }
}

/// One step of a parse, displayed as `step<TAB>top#lookahead<TAB>kind`.
///
/// For a shift, `top` is the shifted terminal and `lookahead` its lexeme.
/// For a reduction, `top` is the produced non-terminal and `lookahead` the lookahead terminal.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TraceStep {
    /// The step number, from 1
    pub step: usize,
    #[allow(missing_docs)]
    pub top: String,
    #[allow(missing_docs)]
    pub lookahead: String,
    #[allow(missing_docs)]
    pub kind: StepKind
}

impl Display for TraceStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{}#{}\t{}", self.step, self.top, self.lookahead, self.kind)
    }
}

/// A shift-reduce parser over a grammar's SLR(1) tables.
pub struct Driver<'t> {
    grammar: &'t Grammar,
    table: &'t ParseTable,
    trace: Option<Vec<TraceStep>>
}

impl<'t> Driver<'t> {
    /// Creates a driver.
    pub fn new(grammar: &'t Grammar, table: &'t ParseTable) -> Self {
        Driver { grammar, table, trace: None }
    }

    /// Records each step of the parse.
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(vec![]);
        self
    }

    /// The recorded steps (empty if tracing is off).
    pub fn into_trace(self) -> Vec<TraceStep> {
        self.trace.unwrap_or_default()
    }

    fn record(&mut self, top: &str, lookahead: &str, kind: StepKind) {
        if let Some(trace) = &mut self.trace {
            let step = TraceStep {
                step: trace.len() + 1,
                top: top.to_string(),
                lookahead: lookahead.to_string(),
                kind
            };
            log::trace!("{step}");
            trace.push(step);
        }
    }

    /// Parses the tokens, returning the value of the accepted start symbol.
    ///
    /// The tokens should end with the end-of-input token.
    /// If they do not, the input is treated as ending after the last token.
    /// Parsing stops at the first syntax error.
    pub fn run<S: Semantics>(&mut self, tokens: &[Token], sem: &mut S) -> ParseResult<S::Value> {
        let eof = Token::new(
            TokenKind::Eof, "",
            tokens.last().map_or(Span::one((0, 0)), |t| t.span)
        );

        let mut states = vec![0];
        let mut values: Vec<S::Value> = vec![];
        let mut ip = 0;

        loop {
            let token = tokens.get(ip).unwrap_or(&eof);
            let state = top(&states);
            let terminal = token.terminal().and_then(|n| self.grammar.terminal(n));

            let Some(action) = terminal.and_then(|t| self.table.action(state, t)) else {
                self.record(terminal.map_or("?", |t| t.name()), &token.lexeme, StepKind::Error);
                return Err(self.unexpected(state, token));
            };
            let terminal = terminal.unwrap_or(Symbol::END);

            match action {
                Action::Shift(next) => {
                    self.record(terminal.name(), &token.lexeme, StepKind::Move);
                    values.push(sem.shift(token)?);
                    states.push(next);
                    ip += 1;
                },
                Action::Reduce(p) => {
                    let prod = self.grammar.production(p);
                    let n = prod.len();
                    if n >= states.len() || n > values.len() {
                        Err(ParseErr::UnexpectedValue("a right-hand side").at_span(token.span))?;
                    }

                    let args = values.split_off(values.len() - n);
                    states.truncate(states.len() - n);

                    let value = sem.reduce(prod, args)?;
                    let uncovered = top(&states);
                    let next = self.table.goto(uncovered, prod.left)
                        .ok_or_else(|| {
                            ParseErr::MissingGoto { state: uncovered, symbol: prod.left.name() }
                                .at_span(token.span)
                        })?;

                    self.record(prod.left.name(), terminal.name(), StepKind::Reduction);
                    values.push(value);
                    states.push(next);
                },
                Action::Accept => {
                    self.record(self.grammar.start().name(), terminal.name(), StepKind::Accept);
                    return match (values.pop(), values.is_empty()) {
                        (Some(v), true) => Ok(v),
                        _ => Err(ParseErr::UnexpectedValue("exactly one value").at_span(token.span)),
                    };
                },
            }
        }
    }

    fn unexpected(&self, state: usize, token: &Token) -> super::FullParseErr {
        let expected = self.table.expected(state)
            .into_iter()
            .map(|s| s.name())
            .collect();

        ParseErr::UnexpectedToken { found: token.describe(), expected }
            .at_span(token.span)
    }
}

fn top(states: &[usize]) -> usize {
    states.last().copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Evaluates sums of single digits.
    struct Sum;
    impl Semantics for Sum {
        type Value = i64;

        fn shift(&mut self, token: &Token) -> ParseResult<i64> {
            Ok(token.lexeme.parse().unwrap_or(0))
        }

        fn reduce(&mut self, prod: &Production, args: Vec<i64>) -> ParseResult<i64> {
            Ok(match prod.rhs_names()[..] {
                ["E", "+", "T"] => args[0] + args[2],
                ["E", "-", "T"] => args[0] - args[2],
                _ => args[0],
            })
        }
    }

    fn grammar() -> Grammar {
        Grammar::new("E", &[
            ("E", &["E", "+", "T"]),
            ("E", &["E", "-", "T"]),
            ("E", &["T"]),
            ("T", &["IntConst"]),
        ])
    }

    fn tokens(src: &str) -> Vec<Token> {
        crate::lexer::tokenize(src).unwrap()
    }

    #[test]
    fn custom_semantics() {
        let g = grammar();
        let table = ParseTable::from_grammar(&g);

        let mut driver = Driver::new(&g, &table);
        assert_eq!(driver.run(&tokens("1 - 2 - 3 + 10"), &mut Sum), Ok(6));
    }

    #[test]
    fn missing_eof_is_implied() {
        let g = grammar();
        let table = ParseTable::from_grammar(&g);

        let mut toks = tokens("4 + 5");
        toks.pop();
        assert_eq!(Driver::new(&g, &table).run(&toks, &mut Sum), Ok(9));
    }

    #[test]
    fn trace_and_error() {
        let g = grammar();
        let table = ParseTable::from_grammar(&g);

        let mut driver = Driver::new(&g, &table).with_trace();
        let err = driver.run(&tokens("1 + + 2"), &mut Sum).unwrap_err();
        assert_eq!(err, ParseErr::UnexpectedToken {
            found: String::from("'+'"),
            expected: vec!["IntConst"]
        });

        let lines: Vec<_> = driver.into_trace().iter().map(ToString::to_string).collect();
        assert_eq!(lines, vec![
            "1\tIntConst#1\tmove",
            "2\tT#+\treduction",
            "3\tE#+\treduction",
            "4\t+#+\tmove",
            "5\t+#+\terror",
        ]);
    }
}
