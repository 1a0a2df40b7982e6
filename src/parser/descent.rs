//! A recursive descent parser for C--.
//!
//! It accepts the same language as the SLR(1) parser and produces the same AST.
//! Assignments are recognized by two tokens of lookahead (`Ident =`).

use std::collections::VecDeque;

use crate::ast::*;
use crate::err::{CmmErr, Span};
use crate::lexer::token::{Token, TokenKind, token};

use super::actions::{out_of_range, read_number};
use super::{FullParseErr, ParseErr, ParseResult};

/// Parses a sequence of tokens into an AST by recursive descent.
pub fn parse(tokens: impl IntoIterator<Item=Token>) -> ParseResult<CompUnit> {
    Parser::new(tokens).parse()
}

/// A struct that does the conversion of tokens to an AST.
pub struct Parser {
    tokens: VecDeque<Token>,
    eof: Token
}

macro_rules! left_assoc_rules {
    ($($n:ident: $ch:ty = $next:ident with $op:ty;)*) => {
        $(
            fn $n(&mut self) -> ParseResult<$ch> {
                let mut e = <$ch>::single(self.$next()?);

                while let Some(op) = <$op>::from_token(self.peek().kind) {
                    self.next();
                    e = e.then(op, self.$next()?);
                }

                Ok(e)
            }
        )*
    };
}

impl Parser {
    /// Create a new Parser to read a given set of tokens.
    pub fn new(tokens: impl IntoIterator<Item=Token>) -> Self {
        let tokens: VecDeque<_> = tokens.into_iter().collect();
        let end = tokens.back().map_or(Span::one((0, 0)), |t| t.span);

        Parser { tokens, eof: Token::new(TokenKind::Eof, "", end) }
    }

    /// Consumes the parser and converts the tokens into an AST.
    pub fn parse(mut self) -> ParseResult<CompUnit> {
        let mut items = vec![self.expect_item()?];
        while self.peek().kind != TokenKind::Eof {
            items.push(self.expect_item()?);
        }

        Ok(CompUnit { items })
    }

    // General terminology:
    // "expect X": The next set of tokens must represent X, otherwise error.
    // "match X": If the next set of tokens represent X, consume those tokens.
    //     Otherwise, do & return nothing.

    /// Look at the next token (end of input if there are none left).
    fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    /// Look `n` tokens ahead.
    fn peek_nth(&self, n: usize) -> &Token {
        self.tokens.get(n).unwrap_or(&self.eof)
    }

    /// Consume the next token.
    fn next(&mut self) -> Token {
        self.tokens.pop_front().unwrap_or_else(|| self.eof.clone())
    }

    /// Error at the next token, which is none of the expected terminals.
    fn unexpected(&self, expected: &[&'static str]) -> FullParseErr {
        let t = self.peek();
        ParseErr::UnexpectedToken { found: t.describe(), expected: expected.to_vec() }
            .at_span(t.span)
    }

    /// Expect that the next token is of the specified kind.
    fn expect1(&mut self, kind: TokenKind) -> ParseResult<Token> {
        match self.peek().kind == kind {
            true  => Ok(self.next()),
            false => Err(self.unexpected(&[kind.terminal().unwrap_or("?")])),
        }
    }

    /// Consume the next token if it is of the specified kind.
    fn match1(&mut self, kind: TokenKind) -> Option<Token> {
        self.match_n(&[kind])
    }

    /// Consume the next token if it is one of the specified kinds.
    fn match_n(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        match kinds.contains(&self.peek().kind) {
            true  => Some(self.next()),
            false => None,
        }
    }

    fn expect_ident(&mut self) -> ParseResult<Ident> {
        let t = self.expect1(TokenKind::Ident)?;
        Ok(Ident::new(t.lexeme, t.span))
    }

    fn expect_item(&mut self) -> ParseResult<Item> {
        let is_func = match self.peek().kind {
            token![void] => true,
            token![int] | token![float] => {
                self.peek_nth(1).kind == TokenKind::Ident && self.peek_nth(2).kind == token!["("]
            },
            token![const] => false,
            _ => return Err(self.unexpected(&["const", "int", "float", "void"])),
        };

        match is_func {
            true  => self.expect_func_def().map(Item::FuncDef),
            false => self.expect_decl().map(Item::Decl),
        }
    }

    fn expect_btype(&mut self) -> ParseResult<BType> {
        match self.peek().kind {
            token![int]   => { self.next(); Ok(BType::Int) },
            token![float] => { self.next(); Ok(BType::Float) },
            _ => Err(self.unexpected(&["int", "float"])),
        }
    }

    fn expect_decl(&mut self) -> ParseResult<Decl> {
        let is_const = self.match1(token![const]).is_some();
        let ty = self.expect_btype()?;

        let mut defs = vec![self.expect_def(is_const)?];
        while self.match1(token![,]).is_some() {
            defs.push(self.expect_def(is_const)?);
        }
        self.expect1(token![;])?;

        Ok(Decl { is_const, ty, defs })
    }

    fn expect_def(&mut self, is_const: bool) -> ParseResult<VarDef> {
        let ident = self.expect_ident()?;

        let init = if is_const {
            self.expect1(token![=])?;
            Some(Exp::from_add(self.expect_add()?))
        } else if self.match1(token![=]).is_some() {
            Some(self.expect_exp()?)
        } else {
            None
        };

        Ok(VarDef { ident, init })
    }

    fn expect_func_def(&mut self) -> ParseResult<FuncDef> {
        let ret = match self.match1(token![void]) {
            Some(_) => BType::Void,
            None => self.expect_btype()?,
        };
        let ident = self.expect_ident()?;
        self.expect1(token!["("])?;

        let mut params = vec![];
        if self.match1(token![")"]).is_none() {
            loop {
                let ty = self.expect_btype()?;
                params.push(FuncFParam { ty, ident: self.expect_ident()? });

                if self.match1(token![,]).is_none() { break; }
            }
            self.expect1(token![")"])?;
        }

        let block = self.expect_block()?;
        Ok(FuncDef { ret, ident, params, block })
    }

    fn expect_block(&mut self) -> ParseResult<Block> {
        self.expect1(token!["{"])?;

        let mut items = vec![];
        while self.match1(token!["}"]).is_none() {
            let item = match self.peek().kind {
                token![const] | token![int] | token![float] => BlockItem::Decl(self.expect_decl()?),
                TokenKind::Eof => return Err(self.unexpected(&["}"])),
                _ => BlockItem::Stmt(self.expect_stmt()?),
            };
            items.push(item);
        }

        Ok(Block { items })
    }

    fn expect_stmt(&mut self) -> ParseResult<Stmt> {
        let stmt = match self.peek().kind {
            TokenKind::Ident if self.peek_nth(1).kind == token![=] => {
                let lval = LVal(self.expect_ident()?);
                self.next();
                let e = self.expect_exp()?;
                self.expect1(token![;])?;
                Stmt::Assign(lval, e)
            },
            token![;] => {
                self.next();
                Stmt::Expr(None)
            },
            token!["{"] => Stmt::Block(self.expect_block()?),
            token![if] => {
                self.next();
                let cond = self.expect_cond()?;
                let then = Box::new(self.expect_stmt()?);
                let els = match self.match1(token![else]) {
                    Some(_) => Some(Box::new(self.expect_stmt()?)),
                    None => None,
                };
                Stmt::If { cond, then, els }
            },
            token![while] => {
                self.next();
                let cond = self.expect_cond()?;
                Stmt::While { cond, body: Box::new(self.expect_stmt()?) }
            },
            token![break] => {
                let span = self.next().span;
                self.expect1(token![;])?;
                Stmt::Break(span)
            },
            token![continue] => {
                let span = self.next().span;
                self.expect1(token![;])?;
                Stmt::Continue(span)
            },
            token![return] => {
                let span = self.next().span;
                let e = match self.match1(token![;]) {
                    Some(_) => None,
                    None => {
                        let e = self.expect_exp()?;
                        self.expect1(token![;])?;
                        Some(e)
                    }
                };
                Stmt::Return(e, span)
            },
            _ => {
                let e = self.expect_exp()?;
                self.expect1(token![;])?;
                Stmt::Expr(Some(e))
            }
        };

        Ok(stmt)
    }

    /// `"(" cond ")"`
    fn expect_cond(&mut self) -> ParseResult<Cond> {
        self.expect1(token!["("])?;
        let cond = Cond(self.expect_lor()?);
        self.expect1(token![")"])?;
        Ok(cond)
    }

    fn expect_exp(&mut self) -> ParseResult<Exp> {
        self.expect_lor().map(Exp)
    }

    left_assoc_rules! {
        expect_lor:  LOrExp  = expect_land  with OrOp;
        expect_land: LAndExp = expect_eq    with AndOp;
        expect_eq:   EqExp   = expect_rel   with EqOp;
        expect_rel:  RelExp  = expect_add   with RelOp;
        expect_add:  AddExp  = expect_mul   with AddOp;
        expect_mul:  MulExp  = expect_unary with MulOp;
    }

    fn expect_unary(&mut self) -> ParseResult<UnaryExp> {
        if let Some(op) = UnaryOp::from_token(self.peek().kind) {
            self.next();

            // 2147483648 is only in range here
            if op == UnaryOp::Minus && self.peek().kind == TokenKind::IntConst {
                let n = read_number(self.next())?;
                return Ok(UnaryExp::Op(op, Box::new(UnaryExp::Primary(PrimaryExp::Number(n)))));
            }
            return Ok(UnaryExp::Op(op, Box::new(self.expect_unary()?)));
        }

        if self.peek().kind == TokenKind::Ident && self.peek_nth(1).kind == token!["("] {
            let ident = self.expect_ident()?;
            self.next();

            let mut args = vec![];
            if self.match1(token![")"]).is_none() {
                args.push(self.expect_exp()?);
                while self.match1(token![,]).is_some() {
                    args.push(self.expect_exp()?);
                }
                self.expect1(token![")"])?;
            }

            return Ok(UnaryExp::Call { ident, args });
        }

        self.expect_primary().map(UnaryExp::Primary)
    }

    fn expect_primary(&mut self) -> ParseResult<PrimaryExp> {
        match self.peek().kind {
            token!["("] => {
                self.next();
                let e = self.expect_exp()?;
                self.expect1(token![")"])?;
                Ok(PrimaryExp::Paren(Box::new(e)))
            },
            TokenKind::Ident => Ok(PrimaryExp::LVal(LVal(self.expect_ident()?))),
            TokenKind::IntConst | TokenKind::FloatConst => {
                let t = self.next();
                match read_number(t.clone())? {
                    Number::Int(i32::MIN) => Err(out_of_range(&t)),
                    n => Ok(PrimaryExp::Number(n)),
                }
            },
            _ => Err(self.unexpected(&["(", "Ident", "IntConst", "floatConst", "+", "-", "!"])),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::tokenize;

    use super::*;

    fn both(src: &str) -> (ParseResult<CompUnit>, ParseResult<CompUnit>) {
        let tokens = tokenize(src).unwrap();
        (super::super::parse(&tokens), parse(tokens))
    }

    #[test]
    fn agrees_with_slr() {
        let programs = [
            "int a = 10; int main() { a = a + 5; return a; }",
            "const int N = 2 + 3 * 4, M = -N; float g;",
            "int f(int x, float y) { if (x < y && !x || y) return 1; else { x = x % 2; } return f(x, y) - 1 - 2; }",
            "void g() { while (1) { if (getint() == 0) break; continue; } ; {} return; }",
            "int h() { if (1) if (0) return 1; else return 2; return (3); }",
        ];

        for src in programs {
            let (slr, rd) = both(src);
            assert_eq!(slr.unwrap(), rd.unwrap(), "{src}");
        }
    }

    #[test]
    fn same_error_position() {
        for src in ["int a = 10 int b;", "int main() { return (1; }", "int f() { x = ; }"] {
            let (slr, rd) = both(src);
            assert_eq!(slr.unwrap_err().span(), rd.unwrap_err().span(), "{src}");
        }
    }

    #[test]
    fn int_min_only_when_negated() {
        let (slr, rd) = both("int a = -2147483648 - -2147483648;");
        assert_eq!(slr.unwrap(), rd.unwrap());

        for src in ["int a = 2147483648;", "int a = 1 - 2147483648;", "int a = -(2147483648);"] {
            let (slr, rd) = both(src);
            let (slr, rd) = (slr.unwrap_err(), rd.unwrap_err());
            assert_eq!(rd, ParseErr::InvalidLiteral(String::from("2147483648")), "{src}");
            assert_eq!(slr.span(), rd.span(), "{src}");
        }
    }

    #[test]
    fn assignment_lookahead() {
        let cu = parse(tokenize("void f() { a = b; a; }").unwrap()).unwrap();
        let Item::FuncDef(f) = &cu.items[0] else { panic!("expected function") };

        assert!(matches!(&f.block.items[0], BlockItem::Stmt(Stmt::Assign(..))));
        assert!(matches!(&f.block.items[1], BlockItem::Stmt(Stmt::Expr(Some(_)))));
    }
}
