//! The kinds of tokens a C-- program is made of.
//!
//! [`TokenKind`] is the [`logos`] token enum, and [`Token`] is a kind together with
//! its lexeme and where it occurred.

use std::fmt::Display;

use logos::Logos;

use crate::err::Span;

/// The coarse classification of a token.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum Category {
    /// Reserved words (`int`, `if`, ...)
    Keyword,
    /// Operators (`+`, `&&`, ...)
    Operator,
    /// Delimiters (`(`, `;`, ...)
    Delimiter,
    /// Identifiers
    Ident,
    /// Integer literals
    IntLit,
    /// Float literals
    FloatLit,
    /// The end of input
    Eof,
    /// Input that did not match any token
    Error
}

impl Category {
    /// The short name of the category used in token listings.
    pub fn short_name(self) -> &'static str {
        match self {
            Category::Keyword   => "KW",
            Category::Operator  => "OP",
            Category::Delimiter => "SE",
            Category::Ident     => "IDN",
            Category::IntLit    => "INT",
            Category::FloatLit  => "FLOAT",
            Category::Eof       => "EOF",
            Category::Error     => "ERROR",
        }
    }
}

macro_rules! define_tokens {
    (
        keywords: {$($kw:ident: $kwx:literal = $kwc:literal),*},
        operators: {$($op:ident: $opx:literal = $opc:literal),*},
        delimiters: {$($de:ident: $dex:literal = $dec:literal),*}
    ) => {
        /// A kind of token.
        #[derive(Logos, PartialEq, Eq, Hash, Debug, Clone, Copy)]
        #[logos(skip r"[ \t\r\n\f]+")]
        #[logos(skip r"//[^\n]*")]
        #[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
        #[allow(missing_docs)]
        pub enum TokenKind {
            $(#[token($kwx)] $kw,)*
            $(#[token($opx)] $op,)*
            $(#[token($dex)] $de,)*

            #[regex("[A-Za-z_][A-Za-z0-9_]*")]
            Ident,
            #[regex("[0-9]+")]
            IntConst,
            #[regex(r"[0-9]+\.[0-9]+")]
            FloatConst,

            /// End of input. Not produced by the logos lexer, appended by [`Lexer`](crate::lexer::Lexer).
            Eof,
            /// Unmatched input.
            Error
        }

        impl TokenKind {
            /// The category of this kind of token.
            pub fn category(self) -> Category {
                match self {
                    $(Self::$kw => Category::Keyword,)*
                    $(Self::$op => Category::Operator,)*
                    $(Self::$de => Category::Delimiter,)*
                    Self::Ident      => Category::Ident,
                    Self::IntConst   => Category::IntLit,
                    Self::FloatConst => Category::FloatLit,
                    Self::Eof        => Category::Eof,
                    Self::Error      => Category::Error,
                }
            }

            /// The numeric type code of this kind of token.
            pub fn code(self) -> u32 {
                match self {
                    $(Self::$kw => $kwc,)*
                    $(Self::$op => $opc,)*
                    $(Self::$de => $dec,)*
                    Self::Ident      => 100,
                    Self::IntConst   => 101,
                    Self::FloatConst => 102,
                    Self::Eof        => 200,
                    Self::Error      => 201,
                }
            }

            /// The name of the grammar terminal this kind of token is read as.
            ///
            /// Error tokens are not any terminal.
            pub fn terminal(self) -> Option<&'static str> {
                match self {
                    $(Self::$kw => Some($kwx),)*
                    $(Self::$op => Some($opx),)*
                    $(Self::$de => Some($dex),)*
                    Self::Ident      => Some("Ident"),
                    Self::IntConst   => Some("IntConst"),
                    Self::FloatConst => Some("floatConst"),
                    Self::Eof        => Some("$"),
                    Self::Error      => None,
                }
            }
        }
    };
}

define_tokens! {
    keywords: {
        Int:      "int"      = 1,
        Void:     "void"     = 2,
        Return:   "return"   = 3,
        Const:    "const"    = 4,
        Float:    "float"    = 6,
        If:       "if"       = 7,
        Else:     "else"     = 8,
        While:    "while"    = 9,
        Break:    "break"    = 10,
        Continue: "continue" = 11
    },
    operators: {
        Plus:    "+"  = 30,
        Minus:   "-"  = 31,
        Star:    "*"  = 32,
        Slash:   "/"  = 33,
        Percent: "%"  = 34,
        Assign:  "="  = 35,
        Gt:      ">"  = 36,
        Lt:      "<"  = 37,
        Eq:      "==" = 38,
        Le:      "<=" = 39,
        Ge:      ">=" = 40,
        Ne:      "!=" = 41,
        And:     "&&" = 42,
        Or:      "||" = 43,
        Not:     "!"  = 44
    },
    delimiters: {
        LParen: "(" = 50,
        RParen: ")" = 51,
        LBrace: "{" = 52,
        RBrace: "}" = 53,
        Semi:   ";" = 54,
        Comma:  "," = 55
    }
}

/// A token together with its lexeme and its position.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The matched source text (empty for the end of input)
    pub lexeme: String,
    /// Where the token occurred
    pub span: Span
}

impl Token {
    /// Creates a token.
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Token { kind, lexeme: lexeme.into(), span }
    }

    /// The grammar terminal this token is read as.
    pub fn terminal(&self) -> Option<&'static str> {
        self.kind.terminal()
    }

    /// How this token reads in diagnostics.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => String::from("end of input"),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

impl PartialEq<TokenKind> for Token {
    fn eq(&self, other: &TokenKind) -> bool {
        &self.kind == other
    }
}

/// The token listing format: `lexeme<TAB><CAT,attr>`.
impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cat = self.kind.category();
        let tag = cat.short_name();

        match cat {
            Category::Ident | Category::IntLit | Category::FloatLit => {
                write!(f, "{}\t<{tag},{}>", self.lexeme, self.lexeme)
            },
            Category::Error => {
                write!(f, "{}\t<{tag},{},{}>", self.lexeme, self.span.line() + 1, self.span.col() + 1)
            },
            _ => write!(f, "{}\t<{tag},{}>", self.lexeme, self.kind.code()),
        }
    }
}

/// Shorthand for token kinds of keywords, operators and delimiters.
///
/// # Example
/// ```
/// use cmmc::lexer::token::{TokenKind, token};
///
/// assert_eq!(token![&&], TokenKind::And);
/// assert_eq!(token![while], TokenKind::While);
/// ```
#[macro_export]
macro_rules! token {
    (int)      => { $crate::lexer::token::TokenKind::Int };
    (void)     => { $crate::lexer::token::TokenKind::Void };
    (return)   => { $crate::lexer::token::TokenKind::Return };
    (const)    => { $crate::lexer::token::TokenKind::Const };
    (float)    => { $crate::lexer::token::TokenKind::Float };
    (if)       => { $crate::lexer::token::TokenKind::If };
    (else)     => { $crate::lexer::token::TokenKind::Else };
    (while)    => { $crate::lexer::token::TokenKind::While };
    (break)    => { $crate::lexer::token::TokenKind::Break };
    (continue) => { $crate::lexer::token::TokenKind::Continue };

    (+)  => { $crate::lexer::token::TokenKind::Plus };
    (-)  => { $crate::lexer::token::TokenKind::Minus };
    (*)  => { $crate::lexer::token::TokenKind::Star };
    (/)  => { $crate::lexer::token::TokenKind::Slash };
    (%)  => { $crate::lexer::token::TokenKind::Percent };
    (=)  => { $crate::lexer::token::TokenKind::Assign };
    (>)  => { $crate::lexer::token::TokenKind::Gt };
    (<)  => { $crate::lexer::token::TokenKind::Lt };
    (==) => { $crate::lexer::token::TokenKind::Eq };
    (<=) => { $crate::lexer::token::TokenKind::Le };
    (>=) => { $crate::lexer::token::TokenKind::Ge };
    (!=) => { $crate::lexer::token::TokenKind::Ne };
    (&&) => { $crate::lexer::token::TokenKind::And };
    (||) => { $crate::lexer::token::TokenKind::Or };
    (!)  => { $crate::lexer::token::TokenKind::Not };

    ("(") => { $crate::lexer::token::TokenKind::LParen };
    (")") => { $crate::lexer::token::TokenKind::RParen };
    ("{") => { $crate::lexer::token::TokenKind::LBrace };
    ("}") => { $crate::lexer::token::TokenKind::RBrace };
    (;)   => { $crate::lexer::token::TokenKind::Semi };
    (,)   => { $crate::lexer::token::TokenKind::Comma };
}
#[doc(inline)]
pub use token;
