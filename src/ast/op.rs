//! The operator AST nodes.
//!
//! Each precedence tier of C-- gets its own operator enum,
//! so a [`Chain`][crate::ast::Chain] can only hold the operators of its tier.

use std::fmt::Display;

use crate::lexer::token::{TokenKind, token};

macro_rules! define_ops {
    ($($(#[$m:meta])* $name:ident { $($(#[$vm:meta])* $v:ident: $tk:tt),+ })*) => {
        $(
            $(#[$m])*
            #[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
            pub enum $name {
                $($(#[$vm])* $v),+
            }

            impl $name {
                /// Reads the operator from its token kind.
                pub fn from_token(kind: TokenKind) -> Option<Self> {
                    match kind {
                        $(token![$tk] => Some(Self::$v),)+
                        _ => None
                    }
                }

                /// The source text of the operator.
                pub fn as_str(self) -> &'static str {
                    match self {
                        $(Self::$v => stringify!($tk)),+
                    }
                }
            }

            impl Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

define_ops! {
    /// Multiplicative operators.
    MulOp {
        /// `x * y`
        Mul: *,
        /// `x / y`
        Div: /,
        /// `x % y`
        Mod: %
    }

    /// Additive operators.
    AddOp {
        /// `x + y`
        Add: +,
        /// `x - y`
        Sub: -
    }

    /// Relational operators.
    RelOp {
        /// `x < y`
        Lt: <,
        /// `x > y`
        Gt: >,
        /// `x <= y`
        Le: <=,
        /// `x >= y`
        Ge: >=
    }

    /// Equality operators.
    EqOp {
        /// `x == y`
        Eq: ==,
        /// `x != y`
        Ne: !=
    }

    /// Logical and.
    AndOp {
        /// `x && y`
        And: &&
    }

    /// Logical or.
    OrOp {
        /// `x || y`
        Or: ||
    }

    /// Unary operators.
    UnaryOp {
        /// `+x`
        Plus: +,
        /// `-x`
        Minus: -,
        /// `!x`
        Not: !
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_text() {
        assert_eq!(RelOp::Le.to_string(), "<=");
        assert_eq!(OrOp::Or.to_string(), "||");
        assert_eq!(MulOp::from_token(token![%]), Some(MulOp::Mod));
        assert_eq!(AddOp::from_token(token![*]), None);
        assert_eq!(UnaryOp::from_token(token![-]), Some(UnaryOp::Minus));
    }
}
