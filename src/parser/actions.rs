//! The semantic actions of the C-- grammar, which build the AST.
//!
//! Each reduction takes the values of its right-hand side and combines them into one [`SemVal`].
//! Actions are matched by the production's left-hand side and right-hand side names.

use crate::ast::*;
use crate::err::CmmErr;
use crate::grammar::Production;
use crate::lexer::token::{Token, TokenKind};

use super::driver::Semantics;
use super::{FullParseErr, ParseErr, ParseResult};

/// A value on the parse stack.
#[derive(Debug)]
pub(super) enum SemVal {
    Token(Token),
    Program(CompUnit),
    Items(Vec<Item>),
    Item(Item),
    Decl(Decl),
    BType(BType),
    Defs(Vec<VarDef>),
    Def(VarDef),
    FuncDef(FuncDef),
    Params(Vec<FuncFParam>),
    Param(FuncFParam),
    Block(Block),
    BlockItems(Vec<BlockItem>),
    BlockItem(BlockItem),
    Stmt(Stmt),
    Else(Option<Stmt>),
    LVal(LVal),
    Exp(Exp),
    Cond(Cond),
    LOr(LOrExp),
    LAnd(LAndExp),
    Eq(EqExp),
    Rel(RelExp),
    Add(AddExp),
    Mul(MulExp),
    Unary(UnaryExp),
    Primary(PrimaryExp),
    Number(Number),
    UnaryOp(UnaryOp),
    Args(Vec<Exp>)
}

macro_rules! takers {
    ($($f:ident: $v:ident => $t:ty),* $(,)?) => {
        impl SemVal {
            $(
                fn $f(self) -> ParseResult<$t> {
                    match self {
                        SemVal::$v(x) => Ok(x),
                        _ => Err(ParseErr::UnexpectedValue(stringify!($v)).at_unknown()),
                    }
                }
            )*
        }
    };
}

takers! {
    into_token: Token => Token,
    into_items: Items => Vec<Item>,
    into_item: Item => Item,
    into_decl: Decl => Decl,
    into_btype: BType => BType,
    into_defs: Defs => Vec<VarDef>,
    into_def: Def => VarDef,
    into_func_def: FuncDef => FuncDef,
    into_params: Params => Vec<FuncFParam>,
    into_param: Param => FuncFParam,
    into_block: Block => Block,
    into_block_items: BlockItems => Vec<BlockItem>,
    into_block_item: BlockItem => BlockItem,
    into_stmt: Stmt => Stmt,
    into_else: Else => Option<Stmt>,
    into_lval: LVal => LVal,
    into_exp: Exp => Exp,
    into_cond: Cond => Cond,
    into_lor: LOr => LOrExp,
    into_land: LAnd => LAndExp,
    into_eq: Eq => EqExp,
    into_rel: Rel => RelExp,
    into_add: Add => AddExp,
    into_mul: Mul => MulExp,
    into_unary: Unary => UnaryExp,
    into_primary: Primary => PrimaryExp,
    into_number: Number => Number,
    into_unary_op: UnaryOp => UnaryOp,
    into_args: Args => Vec<Exp>,
}

impl SemVal {
    /// The AST of an accepted parse.
    pub(super) fn into_program(self) -> ParseResult<CompUnit> {
        match self {
            SemVal::Program(cu) => Ok(cu),
            _ => Err(ParseErr::UnexpectedValue("Program").at_unknown()),
        }
    }

    fn into_ident(self) -> ParseResult<Ident> {
        let t = self.into_token()?;
        Ok(Ident::new(t.lexeme, t.span))
    }

    /// Reads an operator token of one tier.
    fn into_op<Op>(self, read: fn(TokenKind) -> Option<Op>) -> ParseResult<Op> {
        let t = self.into_token()?;
        read(t.kind).ok_or_else(|| ParseErr::UnexpectedValue("an operator").at_span(t.span))
    }
}

/// The popped values of a reduction, taken left to right.
struct Args(std::vec::IntoIter<SemVal>);

impl Args {
    fn next(&mut self) -> ParseResult<SemVal> {
        self.0.next()
            .ok_or_else(|| ParseErr::UnexpectedValue("another value").at_unknown())
    }

    /// Discards a value (typically a keyword or delimiter token).
    fn skip(&mut self) -> ParseResult<()> {
        self.next().map(|_| ())
    }
}

/// Builds a C-- AST.
#[derive(Default)]
pub(super) struct AstBuilder {
    /// A `2147483648` literal which is still waiting for its unary minus.
    unnegated: Option<Token>
}

impl AstBuilder {
    /// `2147483648` only fits when it is negated, so the reductions between the literal
    /// and its unary minus are the only ones allowed while it is pending.
    fn check_unnegated(&mut self, prod: &Production, args: &[SemVal]) -> ParseResult<()> {
        let Some(t) = self.unnegated.take() else { return Ok(()) };

        match (prod.left.name(), &prod.rhs_names()[..], args.first()) {
            ("primaryExp", ["number"], _) | ("unaryExp", ["primaryExp"], _) => {
                self.unnegated = Some(t);
                Ok(())
            },
            ("unaryExp", ["unaryOp", _], Some(SemVal::UnaryOp(UnaryOp::Minus))) => Ok(()),
            _ => Err(out_of_range(&t)),
        }
    }
}

impl Semantics for AstBuilder {
    type Value = SemVal;

    fn shift(&mut self, token: &Token) -> ParseResult<SemVal> {
        Ok(SemVal::Token(token.clone()))
    }

    fn reduce(&mut self, prod: &Production, args: Vec<SemVal>) -> ParseResult<SemVal> {
        self.check_unnegated(prod, &args)?;
        let mut a = Args(args.into_iter());
        let rhs = prod.rhs_names();

        let value = match (prod.left.name(), &rhs[..]) {
            ("Program", _) => SemVal::Program(CompUnit { items: a.next()?.into_items()? }),

            ("compUnit", [_, _]) => {
                let mut items = a.next()?.into_items()?;
                items.push(a.next()?.into_item()?);
                SemVal::Items(items)
            },
            ("compUnit", [_]) => SemVal::Items(vec![a.next()?.into_item()?]),

            ("element", ["decl"]) => SemVal::Item(Item::Decl(a.next()?.into_decl()?)),
            ("element", ["funcDef"]) => SemVal::Item(Item::FuncDef(a.next()?.into_func_def()?)),

            ("decl", _) => a.next()?,
            ("constDecl", _) => {
                a.skip()?;
                let ty = a.next()?.into_btype()?;
                let defs = a.next()?.into_defs()?;
                SemVal::Decl(Decl { is_const: true, ty, defs })
            },
            ("varDecl", _) => {
                let ty = a.next()?.into_btype()?;
                let defs = a.next()?.into_defs()?;
                SemVal::Decl(Decl { is_const: false, ty, defs })
            },

            ("constDefList" | "varDefList", [_, ",", _]) => {
                let mut defs = a.next()?.into_defs()?;
                a.skip()?;
                defs.push(a.next()?.into_def()?);
                SemVal::Defs(defs)
            },
            ("constDefList" | "varDefList", [_]) => SemVal::Defs(vec![a.next()?.into_def()?]),

            ("bType", ["int"]) => SemVal::BType(BType::Int),
            ("bType", ["float"]) => SemVal::BType(BType::Float),
            ("funcType", ["void"]) => SemVal::BType(BType::Void),

            ("constDef" | "varDef", [_, "=", _]) => {
                let ident = a.next()?.into_ident()?;
                a.skip()?;
                let init = a.next()?.into_exp()?;
                SemVal::Def(VarDef { ident, init: Some(init) })
            },
            ("varDef", [_]) => SemVal::Def(VarDef { ident: a.next()?.into_ident()?, init: None }),
            ("constInitVal" | "initVal", _) => a.next()?,
            ("constExp", _) => SemVal::Exp(Exp::from_add(a.next()?.into_add()?)),

            ("funcDef", [_, _, "(", ")", _]) => {
                let ret = a.next()?.into_btype()?;
                let ident = a.next()?.into_ident()?;
                a.skip()?;
                a.skip()?;
                let block = a.next()?.into_block()?;
                SemVal::FuncDef(FuncDef { ret, ident, params: vec![], block })
            },
            ("funcDef", [_, _, "(", _, ")", _]) => {
                let ret = a.next()?.into_btype()?;
                let ident = a.next()?.into_ident()?;
                a.skip()?;
                let params = a.next()?.into_params()?;
                a.skip()?;
                let block = a.next()?.into_block()?;
                SemVal::FuncDef(FuncDef { ret, ident, params, block })
            },
            ("funcFParams", [_, ",", _]) => {
                let mut params = a.next()?.into_params()?;
                a.skip()?;
                params.push(a.next()?.into_param()?);
                SemVal::Params(params)
            },
            ("funcFParams", [_]) => SemVal::Params(vec![a.next()?.into_param()?]),
            ("funcFParam", _) => {
                let ty = a.next()?.into_btype()?;
                let ident = a.next()?.into_ident()?;
                SemVal::Param(FuncFParam { ty, ident })
            },

            ("block", ["{", "}"]) => SemVal::Block(Block::default()),
            ("block", ["{", _, "}"]) => {
                a.skip()?;
                SemVal::Block(Block { items: a.next()?.into_block_items()? })
            },
            ("blockItemList", [_, _]) => {
                let mut items = a.next()?.into_block_items()?;
                items.push(a.next()?.into_block_item()?);
                SemVal::BlockItems(items)
            },
            ("blockItemList", [_]) => SemVal::BlockItems(vec![a.next()?.into_block_item()?]),
            ("blockItem", ["decl"]) => SemVal::BlockItem(BlockItem::Decl(a.next()?.into_decl()?)),
            ("blockItem", ["stmt"]) => SemVal::BlockItem(BlockItem::Stmt(a.next()?.into_stmt()?)),

            ("stmt", rhs) => SemVal::Stmt(reduce_stmt(rhs, &mut a)?),
            ("ElsePart", ["else", _]) => {
                a.skip()?;
                SemVal::Else(Some(a.next()?.into_stmt()?))
            },
            ("ElsePart", []) => SemVal::Else(None),

            ("lVal", _) => SemVal::LVal(LVal(a.next()?.into_ident()?)),
            ("exp", _) => SemVal::Exp(Exp(a.next()?.into_lor()?)),
            ("cond", _) => SemVal::Cond(Cond(a.next()?.into_lor()?)),

            ("lOrExp", [_]) => SemVal::LOr(LOrExp::single(a.next()?.into_land()?)),
            ("lOrExp", [_, _, _]) => {
                let left = a.next()?.into_lor()?;
                let op = a.next()?.into_op(OrOp::from_token)?;
                SemVal::LOr(left.then(op, a.next()?.into_land()?))
            },
            ("lAndExp", [_]) => SemVal::LAnd(LAndExp::single(a.next()?.into_eq()?)),
            ("lAndExp", [_, _, _]) => {
                let left = a.next()?.into_land()?;
                let op = a.next()?.into_op(AndOp::from_token)?;
                SemVal::LAnd(left.then(op, a.next()?.into_eq()?))
            },
            ("eqExp", [_]) => SemVal::Eq(EqExp::single(a.next()?.into_rel()?)),
            ("eqExp", [_, _, _]) => {
                let left = a.next()?.into_eq()?;
                let op = a.next()?.into_op(EqOp::from_token)?;
                SemVal::Eq(left.then(op, a.next()?.into_rel()?))
            },
            ("relExp", [_]) => SemVal::Rel(RelExp::single(a.next()?.into_add()?)),
            ("relExp", [_, _, _]) => {
                let left = a.next()?.into_rel()?;
                let op = a.next()?.into_op(RelOp::from_token)?;
                SemVal::Rel(left.then(op, a.next()?.into_add()?))
            },
            ("addExp", [_]) => SemVal::Add(AddExp::single(a.next()?.into_mul()?)),
            ("addExp", [_, _, _]) => {
                let left = a.next()?.into_add()?;
                let op = a.next()?.into_op(AddOp::from_token)?;
                SemVal::Add(left.then(op, a.next()?.into_mul()?))
            },
            ("mulExp", [_]) => SemVal::Mul(MulExp::single(a.next()?.into_unary()?)),
            ("mulExp", [_, _, _]) => {
                let left = a.next()?.into_mul()?;
                let op = a.next()?.into_op(MulOp::from_token)?;
                SemVal::Mul(left.then(op, a.next()?.into_unary()?))
            },

            ("unaryExp", ["primaryExp"]) => SemVal::Unary(UnaryExp::Primary(a.next()?.into_primary()?)),
            ("unaryExp", ["unaryOp", _]) => {
                let op = a.next()?.into_unary_op()?;
                SemVal::Unary(UnaryExp::Op(op, Box::new(a.next()?.into_unary()?)))
            },
            ("unaryExp", ["Ident", "(", ")"]) => {
                let ident = a.next()?.into_ident()?;
                SemVal::Unary(UnaryExp::Call { ident, args: vec![] })
            },
            ("unaryExp", ["Ident", "(", _, ")"]) => {
                let ident = a.next()?.into_ident()?;
                a.skip()?;
                let args = a.next()?.into_args()?;
                SemVal::Unary(UnaryExp::Call { ident, args })
            },
            ("unaryOp", _) => SemVal::UnaryOp(a.next()?.into_op(UnaryOp::from_token)?),

            ("primaryExp", ["(", _, ")"]) => {
                a.skip()?;
                SemVal::Primary(PrimaryExp::Paren(Box::new(a.next()?.into_exp()?)))
            },
            ("primaryExp", ["lVal"]) => SemVal::Primary(PrimaryExp::LVal(a.next()?.into_lval()?)),
            ("primaryExp", ["number"]) => SemVal::Primary(PrimaryExp::Number(a.next()?.into_number()?)),
            ("number", _) => {
                let t = a.next()?.into_token()?;
                let n = read_number(t.clone())?;
                if n == Number::Int(i32::MIN) {
                    self.unnegated = Some(t);
                }
                SemVal::Number(n)
            },

            ("funcRParams", [_, ",", _]) => {
                let first = a.next()?.into_exp()?;
                a.skip()?;
                let mut args = vec![first];
                args.extend(a.next()?.into_args()?);
                SemVal::Args(args)
            },
            ("funcRParams", [_]) => SemVal::Args(vec![a.next()?.into_exp()?]),

            _ => return Err(ParseErr::UnexpectedValue("a known production").at_unknown()),
        };

        Ok(value)
    }
}

fn reduce_stmt(rhs: &[&str], a: &mut Args) -> ParseResult<Stmt> {
    let stmt = match rhs {
        ["lVal", "=", "exp", ";"] => {
            let lval = a.next()?.into_lval()?;
            a.skip()?;
            Stmt::Assign(lval, a.next()?.into_exp()?)
        },
        ["exp", ";"] => Stmt::Expr(Some(a.next()?.into_exp()?)),
        [";"] => Stmt::Expr(None),
        ["block"] => Stmt::Block(a.next()?.into_block()?),
        ["if", ..] => {
            a.skip()?;
            a.skip()?;
            let cond = a.next()?.into_cond()?;
            a.skip()?;
            let then = Box::new(a.next()?.into_stmt()?);
            let els = a.next()?.into_else()?.map(Box::new);
            Stmt::If { cond, then, els }
        },
        ["while", ..] => {
            a.skip()?;
            a.skip()?;
            let cond = a.next()?.into_cond()?;
            a.skip()?;
            Stmt::While { cond, body: Box::new(a.next()?.into_stmt()?) }
        },
        ["break", ";"] => Stmt::Break(a.next()?.into_token()?.span),
        ["continue", ";"] => Stmt::Continue(a.next()?.into_token()?.span),
        ["return", "exp", ";"] => {
            let span = a.next()?.into_token()?.span;
            Stmt::Return(Some(a.next()?.into_exp()?), span)
        },
        ["return", ";"] => Stmt::Return(None, a.next()?.into_token()?.span),
        _ => return Err(ParseErr::UnexpectedValue("a statement").at_unknown()),
    };

    Ok(stmt)
}

/// Reads a numeric literal.
///
/// 2147483648 reads as `i32::MIN`. It is only in range directly under a unary minus,
/// which the caller has to check (reporting [`out_of_range`] otherwise).
pub(super) fn read_number(t: Token) -> ParseResult<Number> {
    let invalid = || ParseErr::InvalidLiteral(t.lexeme.clone()).at_span(t.span);

    match t.kind {
        TokenKind::IntConst => match t.lexeme.parse::<i64>() {
            Ok(n) if n <= 1 << 31 => Ok(Number::Int(n as i32)),
            _ => Err(invalid()),
        },
        TokenKind::FloatConst => t.lexeme.parse::<f32>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Number::Float)
            .ok_or_else(invalid),
        _ => Err(ParseErr::UnexpectedValue("a number").at_span(t.span)),
    }
}

pub(super) fn out_of_range(t: &Token) -> FullParseErr {
    ParseErr::InvalidLiteral(t.lexeme.clone()).at_span(t.span)
}
