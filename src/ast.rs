//! The components of the AST generated through the [parser][`crate::parser`] module.
//!
//! A full translation unit is described by the [`CompUnit`] struct.
//!
//! The binary operator tiers of C-- are each a [`Chain`]:
//! an optional left operand of the same tier (with its operator) and a right operand of the next tier.
//! This keeps every tier left-associative, so `a - b - c` is `(a - b) - c`.
//!
//! Typically, an AST should not be defined manually.
//! Instead, [`crate::lexer`] and [`crate::parser`] should be used to create one from a string.

use crate::err::Span;

pub use self::op::*;
pub mod op;

/// A translation unit, a list of global declarations and function definitions.
///
/// # Syntax
/// ```text
/// compUnit = (decl | funcDef)+ ;
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct CompUnit {
    #[allow(missing_docs)]
    pub items: Vec<Item>
}

/// A top-level item.
#[derive(Debug, PartialEq, Clone)]
pub enum Item {
    /// A global declaration
    Decl(Decl),
    /// A function definition
    FuncDef(FuncDef)
}

/// An identifier with its position.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Ident {
    /// The name
    pub name: String,
    /// Where the identifier occurred
    pub span: Span
}

impl Ident {
    /// Creates an identifier.
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Ident { name: name.into(), span }
    }
}

/// The type of a declaration, parameter, or function return.
///
/// `void` only occurs as a function return type.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum BType {
    /// `int`
    Int,
    /// `float`
    Float,
    /// `void`
    Void
}

/// A variable or constant declaration.
///
/// # Syntax
/// ```text
/// decl = "const"? bType def ("," def)* ";" ;
/// ```
///
/// # Example
/// ```text
/// const int N = 10, M = N * 2;
/// float x, y = 1.5;
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct Decl {
    /// Whether this is a `const` declaration
    pub is_const: bool,
    /// The declared type
    pub ty: BType,
    /// The variables being defined
    pub defs: Vec<VarDef>
}

/// One variable of a declaration.
///
/// `const` definitions always have an initializer.
#[derive(Debug, PartialEq, Clone)]
pub struct VarDef {
    /// The variable name
    pub ident: Ident,
    /// The initializer
    pub init: Option<Exp>
}

/// A function definition.
///
/// # Syntax
/// ```text
/// funcDef = ("void" | bType) Ident "(" (funcFParam ("," funcFParam)*)? ")" block ;
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct FuncDef {
    /// The return type
    pub ret: BType,
    /// The function name
    pub ident: Ident,
    /// The parameters
    pub params: Vec<FuncFParam>,
    /// The body
    pub block: Block
}

/// A function parameter.
#[derive(Debug, PartialEq, Clone)]
pub struct FuncFParam {
    /// The parameter type
    pub ty: BType,
    /// The parameter name
    pub ident: Ident
}

/// An enclosed scope with a list of declarations and statements.
///
/// # Syntax
/// ```text
/// block = "{" (decl | stmt)* "}" ;
/// ```
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Block {
    #[allow(missing_docs)]
    pub items: Vec<BlockItem>
}

/// An item of a block.
#[derive(Debug, PartialEq, Clone)]
pub enum BlockItem {
    /// A local declaration
    Decl(Decl),
    /// A statement
    Stmt(Stmt)
}

/// A statement.
#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    /// An assignment.
    ///
    /// # Syntax
    /// ```text
    /// stmt = lVal "=" exp ";" ;
    /// ```
    Assign(LVal, Exp),

    /// An expression statement, or an empty statement (`;`).
    Expr(Option<Exp>),

    /// A nested block.
    Block(Block),

    /// An if statement, with an optional else branch.
    ///
    /// # Syntax
    /// ```text
    /// stmt = "if" "(" cond ")" stmt ("else" stmt)? ;
    /// ```
    If {
        #[allow(missing_docs)]
        cond: Cond,
        #[allow(missing_docs)]
        then: Box<Stmt>,
        #[allow(missing_docs)]
        els: Option<Box<Stmt>>
    },

    /// A while loop.
    ///
    /// # Syntax
    /// ```text
    /// stmt = "while" "(" cond ")" stmt ;
    /// ```
    While {
        #[allow(missing_docs)]
        cond: Cond,
        #[allow(missing_docs)]
        body: Box<Stmt>
    },

    /// `break;`, with the position of the keyword.
    Break(Span),

    /// `continue;`, with the position of the keyword.
    Continue(Span),

    /// A return statement, with the position of the keyword.
    Return(Option<Exp>, Span)
}

/// An assignable name.
#[derive(Debug, PartialEq, Clone)]
pub struct LVal(pub Ident);

/// An expression.
#[derive(Debug, PartialEq, Clone)]
pub struct Exp(pub LOrExp);

/// A condition (of an `if` or `while`).
#[derive(Debug, PartialEq, Clone)]
pub struct Cond(pub LOrExp);

/// A left-associative chain of one operator tier.
///
/// `left` is the operand (and operator) on the left, if there is one.
/// `right` is an operand of the next tier.
#[derive(Debug, PartialEq, Clone)]
pub struct Chain<Op, Next> {
    /// The left operand and the operator joining it to `right`
    pub left: Option<(Box<Chain<Op, Next>>, Op)>,
    /// The right operand
    pub right: Next
}

impl<Op, Next> Chain<Op, Next> {
    /// A chain of one operand.
    pub fn single(right: Next) -> Self {
        Chain { left: None, right }
    }

    /// Extends this chain on the right: `self op right`.
    pub fn then(self, op: Op, right: Next) -> Self {
        Chain { left: Some((Box::new(self), op)), right }
    }
}

/// `lOrExp = (lOrExp "||")? lAndExp ;`
pub type LOrExp = Chain<OrOp, LAndExp>;
/// `lAndExp = (lAndExp "&&")? eqExp ;`
pub type LAndExp = Chain<AndOp, EqExp>;
/// `eqExp = (eqExp ("==" | "!="))? relExp ;`
pub type EqExp = Chain<EqOp, RelExp>;
/// `relExp = (relExp ("<" | ">" | "<=" | ">="))? addExp ;`
pub type RelExp = Chain<RelOp, AddExp>;
/// `addExp = (addExp ("+" | "-"))? mulExp ;`
pub type AddExp = Chain<AddOp, MulExp>;
/// `mulExp = (mulExp ("*" | "/" | "%"))? unaryExp ;`
pub type MulExp = Chain<MulOp, UnaryExp>;

impl Exp {
    /// Wraps an additive expression (e.g. a `constExp`) up into a full expression.
    pub fn from_add(add: AddExp) -> Self {
        let rel = RelExp::single(add);
        let eq = EqExp::single(rel);
        let land = LAndExp::single(eq);
        Exp(LOrExp::single(land))
    }

    /// Wraps a unary expression up into a full expression.
    pub fn from_unary(unary: UnaryExp) -> Self {
        Exp::from_add(AddExp::single(MulExp::single(unary)))
    }

    /// If this expression is only an additive expression, that expression.
    pub fn as_add(&self) -> Option<&AddExp> {
        let Chain { left: None, right: land } = &self.0 else { return None };
        let Chain { left: None, right: eq } = land else { return None };
        let Chain { left: None, right: rel } = eq else { return None };
        let Chain { left: None, right: add } = rel else { return None };
        Some(add)
    }
}

/// A unary-tier expression.
#[derive(Debug, PartialEq, Clone)]
pub enum UnaryExp {
    /// A primary expression.
    Primary(PrimaryExp),

    /// A function call.
    ///
    /// # Syntax
    /// ```text
    /// unaryExp = Ident "(" (exp ("," exp)*)? ")" ;
    /// ```
    Call {
        #[allow(missing_docs)]
        ident: Ident,
        #[allow(missing_docs)]
        args: Vec<Exp>
    },

    /// A unary operator applied to an operand.
    Op(UnaryOp, Box<UnaryExp>)
}

/// A primary expression.
#[derive(Debug, PartialEq, Clone)]
pub enum PrimaryExp {
    /// A parenthesized expression
    Paren(Box<Exp>),
    /// A variable
    LVal(LVal),
    /// A numeric literal
    Number(Number)
}

/// A numeric literal.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Number {
    /// An integer literal
    Int(i32),
    /// A float literal
    Float(f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> MulExp {
        let lval = LVal(Ident::new(name, Span::one((0, 0))));
        MulExp::single(UnaryExp::Primary(PrimaryExp::LVal(lval)))
    }

    #[test]
    fn chain_building() {
        let c = AddExp::single(var("a"))
            .then(AddOp::Sub, var("b"))
            .then(AddOp::Sub, var("c"));

        // ((a - b) - c)
        assert_eq!(c.right, var("c"));
        let (ab, op) = c.left.as_ref().unwrap();
        assert_eq!(*op, AddOp::Sub);
        assert_eq!(ab.right, var("b"));
        assert_eq!(ab.left.as_ref().unwrap().0.right, var("a"));

        let e = Exp::from_add(c.clone());
        assert_eq!(e.as_add(), Some(&c));
    }
}
