//! Converts strings to sequences of tokens.
//!
//! The token patterns are compiled by [`logos`] (see [`TokenKind`]).
//! The lexer here wraps that with source positions, an end-of-input token,
//! and error collection.
//!
//! This module provides:
//! - [`tokenize`]: A utility function that lexes a string and fails on any lexical error.
//! - [`Lexer`]: The struct which does the lexing process, keeping error tokens in the stream.

use logos::Logos;

use crate::err::{CmmErr, Cursor, FullCmmErr, Span};

use self::token::{Token, TokenKind};
pub mod token;

/// Lex a string into a sequence of tokens, ending with an end-of-input token.
///
/// If any input could not be matched, every such spot is reported.
/// For a stream that keeps the error tokens, see [`Lexer::lex`].
///
/// # Example
/// ```
/// # use cmmc::lexer::tokenize;
/// use cmmc::lexer::token::{TokenKind, token};
///
/// let kinds: Vec<_> = tokenize("a + 1").unwrap()
///     .into_iter()
///     .map(|t| t.kind)
///     .collect();
///
/// assert_eq!(kinds, vec![TokenKind::Ident, token![+], TokenKind::IntConst, TokenKind::Eof]);
/// ```
pub fn tokenize(input: &str) -> LexResult<Vec<Token>> {
    let tokens = Lexer::new(input).lex();

    let errs: Vec<_> = tokens.iter()
        .filter(|t| t.kind == TokenKind::Error)
        .map(|t| LexErr::UnknownInput(t.lexeme.clone()).at_span(t.span))
        .collect();

    if errs.is_empty() {
        Ok(tokens)
    } else {
        Err(errs)
    }
}

/// An error that occurs in the lexing process.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum LexErr {
    /// Input that is not part of any C-- token (e.g. `@`, `#`, a lone `&`)
    UnknownInput(String)
}

/// A [`Result`] type for operations in the lexing process.
///
/// Lexing reports every error it finds, rather than stopping at the first.
pub type LexResult<T> = Result<T, Vec<FullLexErr>>;
/// A [`LexErr`] with its position.
pub type FullLexErr = FullCmmErr<LexErr>;

impl CmmErr for LexErr {
    fn err_name(&self) -> &'static str {
        "lexical error"
    }
}

impl std::fmt::Display for LexErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexErr::UnknownInput(s) => write!(f, "unrecognized input {s:?}"),
        }
    }
}

impl std::error::Error for LexErr {}

/// Lexes a source string into [`Token`]s.
pub struct Lexer<'s> {
    src: &'s str,
    /// Byte offset of the start of each line
    line_starts: Vec<usize>
}

impl<'s> Lexer<'s> {
    /// Creates a lexer over the given source.
    pub fn new(src: &'s str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(src.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Lexer { src, line_starts }
    }

    /// Converts a byte offset into the source into a (line, column) cursor.
    fn cursor(&self, offset: usize) -> Cursor {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(l) => l,
            Err(l) => l - 1,
        };
        let col = self.src[self.line_starts[line]..offset].chars().count();

        (line, col)
    }

    /// Lex the whole source.
    ///
    /// Unmatched input is kept as [`TokenKind::Error`] tokens and lexing resumes after it,
    /// so every lexical error is visible in one pass.
    /// The stream always ends with exactly one [`TokenKind::Eof`] token.
    pub fn lex(&self) -> Vec<Token> {
        let mut lx = TokenKind::lexer(self.src);
        let mut tokens = vec![];

        while let Some(result) = lx.next() {
            let kind = result.unwrap_or(TokenKind::Error);
            let lexeme = lx.slice();
            let span = Span::new(self.cursor(lx.span().start), lexeme.chars().count());

            tokens.push(Token::new(kind, lexeme, span));
        }

        let end = self.cursor(self.src.len());
        tokens.push(Token::new(TokenKind::Eof, "", Span::one(end)));

        log::debug!("lexed {} tokens", tokens.len());
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::token::token;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).lex().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn basic_lex() {
        assert_eq!(kinds("int main(){ return 0; }"), vec![
            token![int], TokenKind::Ident, token!["("], token![")"], token!["{"],
            token![return], TokenKind::IntConst, token![;], token!["}"],
            TokenKind::Eof
        ]);
    }

    /// Longest match and keyword priority.
    #[test]
    fn op_and_keyword_lex() {
        assert_eq!(kinds("a<=b==c!=!d&&e||f"), vec![
            TokenKind::Ident, token![<=], TokenKind::Ident, token![==], TokenKind::Ident,
            token![!=], token![!], TokenKind::Ident, token![&&], TokenKind::Ident,
            token![||], TokenKind::Ident, TokenKind::Eof
        ]);

        assert_eq!(kinds("intx int main whilst while"), vec![
            TokenKind::Ident, token![int], TokenKind::Ident, TokenKind::Ident, token![while],
            TokenKind::Eof
        ]);
    }

    #[test]
    fn numeric_lex() {
        let tokens = Lexer::new("12 3.25 0").lex();
        let pairs: Vec<_> = tokens.iter().map(|t| (t.kind, t.lexeme.as_str())).collect();
        assert_eq!(pairs, vec![
            (TokenKind::IntConst, "12"),
            (TokenKind::FloatConst, "3.25"),
            (TokenKind::IntConst, "0"),
            (TokenKind::Eof, ""),
        ]);
    }

    #[test]
    fn comment_lex() {
        assert_eq!(kinds("a // b c\n/* d\n e */ f"), vec![
            TokenKind::Ident, TokenKind::Ident, TokenKind::Eof
        ]);
        assert_eq!(kinds("/**/x/* ** */"), vec![TokenKind::Ident, TokenKind::Eof]);
    }

    #[test]
    fn positions() {
        let tokens = Lexer::new("int a;\n  float bc;").lex();
        let spans: Vec<_> = tokens.iter().map(|t| t.span).collect();

        assert_eq!(spans, vec![
            Span::new((0, 0), 3),
            Span::new((0, 4), 1),
            Span::new((0, 5), 1),
            Span::new((1, 2), 5),
            Span::new((1, 8), 2),
            Span::new((1, 10), 1),
            Span::new((1, 11), 1),
        ]);
    }

    #[test]
    fn error_tokens_are_collected() {
        let input = "int a = 1 @ 2;\nb # c;";
        assert_eq!(kinds(input), vec![
            token![int], TokenKind::Ident, token![=], TokenKind::IntConst, TokenKind::Error,
            TokenKind::IntConst, token![;], TokenKind::Ident, TokenKind::Error, TokenKind::Ident,
            token![;], TokenKind::Eof
        ]);

        let errs = tokenize(input).unwrap_err();
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[0], LexErr::UnknownInput(String::from("@")));
        assert_eq!(errs[0].span(), Some(Span::one((0, 10))));
        assert_eq!(errs[1].span(), Some(Span::one((1, 2))));
    }

    #[test]
    fn listing_format() {
        let tokens = Lexer::new("int x = 3.5 $").lex();
        let lines: Vec<_> = tokens.iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.to_string())
            .collect();

        assert_eq!(lines, vec![
            "int\t<KW,1>",
            "x\t<IDN,x>",
            "=\t<OP,35>",
            "3.5\t<FLOAT,3.5>",
            "$\t<ERROR,1,13>",
        ]);
    }
}
