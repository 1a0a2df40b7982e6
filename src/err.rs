//! Shared machinery for reporting compiler errors.
//!
//! Each stage of the pipeline has its own error enum (e.g. [`LexErr`], [`ParseErr`], [`IrGenErr`]).
//! These implement the [`CmmErr`] trait, which names the error's category
//! and lets the error be attached to a position in the source.
//!
//! [`FullCmmErr`] is an error with its attached position,
//! and it is what gets printed to the terminal.
//!
//! [`LexErr`]: crate::lexer::LexErr
//! [`ParseErr`]: crate::parser::ParseErr
//! [`IrGenErr`]: crate::compiler::IrGenErr

use std::fmt::Display;

/// Errors that can be printed by the C-- compiler.
///
/// Implementors provide the category of the error (through [`CmmErr::err_name`])
/// and the message of the error (through [`Display`]).
pub trait CmmErr: Display + Sized {
    /// The category of the error (e.g. `lexical error`, `syntax error`)
    fn err_name(&self) -> &'static str;

    /// Designate that this error occurred at a specific character
    fn at(self, p: Cursor) -> FullCmmErr<Self> {
        FullCmmErr::new(self, Some(Span::one(p)))
    }

    /// Designate that this error occurred over a span of characters
    fn at_span(self, span: Span) -> FullCmmErr<Self> {
        FullCmmErr::new(self, Some(span))
    }

    /// Designate that this error occurred somewhere unknown
    fn at_unknown(self) -> FullCmmErr<Self> {
        FullCmmErr::new(self, None)
    }
}

/// A position in the source, as (line, column).
///
/// Both are 0-indexed, and are displayed 1-indexed.
pub type Cursor = (usize /* line */, usize /* column */);

/// A run of characters on a single line of source.
///
/// C-- tokens never cross lines, so one line is enough to point at any of them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Span {
    /// The first character of the span
    pub start: Cursor,
    /// How many characters are covered (at least 1)
    pub len: usize
}

impl Span {
    /// A span starting at `start` covering `len` characters.
    pub fn new(start: Cursor, len: usize) -> Self {
        Span { start, len: len.max(1) }
    }

    /// A span of one character.
    pub fn one(start: Cursor) -> Self {
        Span::new(start, 1)
    }

    /// The line this span is on (0-indexed).
    pub fn line(&self) -> usize {
        self.start.0
    }

    /// The column this span starts on (0-indexed).
    pub fn col(&self) -> usize {
        self.start.1
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line() + 1, self.col() + 1)
    }
}

/// An error with an (optionally known) position in the source.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct FullCmmErr<E: CmmErr> {
    pub(crate) err: E,
    span: Option<Span>
}

impl<E: CmmErr> From<E> for FullCmmErr<E> {
    fn from(err: E) -> Self {
        err.at_unknown()
    }
}

impl<E: CmmErr> FullCmmErr<E> {
    fn new(err: E, span: Option<Span>) -> Self {
        Self { err, span }
    }

    /// The underlying error.
    pub fn err(&self) -> &E {
        &self.err
    }

    /// Where the error occurred, if known.
    pub fn span(&self) -> Option<Span> {
        self.span
    }

    /// Get a one-line String designating where the error occurred
    /// and the message associated with the error.
    pub fn short_msg(&self) -> String {
        match self.span {
            Some(span) => format!("{span} :: {}: {}", self.err.err_name(), self.err),
            None => format!("{}: {}", self.err.err_name(), self.err),
        }
    }

    /// Get the short message, followed by the offending line of source
    /// with a pointer beneath the offending characters.
    pub fn full_msg(&self, src: &str) -> String {
        let mut lines = vec![self.short_msg()];

        if let Some(span) = self.span {
            if let Some(code) = src.lines().nth(span.line()) {
                let ptr = " ".repeat(span.col()) + "^" + &"~".repeat(span.len - 1);
                lines.push(String::new());
                lines.push(code.to_string());
                lines.push(ptr);
            }
        }

        lines.join("\n")
    }

    /// Map the inner error to another error, keeping its position.
    pub fn map<F: CmmErr>(self, f: impl FnOnce(E) -> F) -> FullCmmErr<F> {
        FullCmmErr { err: f(self.err), span: self.span }
    }
}

impl<E: CmmErr> Display for FullCmmErr<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.short_msg())
    }
}

impl<E: CmmErr + std::fmt::Debug> std::error::Error for FullCmmErr<E> {}

impl<E: CmmErr + PartialEq> PartialEq<E> for FullCmmErr<E> {
    fn eq(&self, other: &E) -> bool {
        &self.err == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(PartialEq, Eq, Debug)]
    struct Oops;
    impl Display for Oops {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "oops")
        }
    }
    impl CmmErr for Oops {
        fn err_name(&self) -> &'static str {
            "test error"
        }
    }

    #[test]
    fn short_and_full_messages() {
        let src = "int a;\nint bb = ;";
        let e = Oops.at_span(Span::new((1, 4), 2));

        assert_eq!(e.short_msg(), "2:5 :: test error: oops");
        assert_eq!(e.full_msg(src), "2:5 :: test error: oops\n\nint bb = ;\n    ^~");
        assert_eq!(Oops.at_unknown().short_msg(), "test error: oops");
        assert_eq!(Oops.at((0, 0)).full_msg(src), "1:1 :: test error: oops\n\nint a;\n^");
    }
}
