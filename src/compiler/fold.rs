//! Compile-time evaluation of expressions.
//!
//! [`const_eval`] folds a whole expression (as needed for global initializers).
//! The operator functions ([`arith`], [`compare`], ...) fold a single operation,
//! and are also used by the generator when both operands are already constants.
//!
//! Integer arithmetic wraps. Division or remainder by zero is not constant.

use crate::ast::*;

use super::ir::{BinOp, CmpPred, Constant, Type};
use super::symtab::{Binding, SymbolTable};

/// Arithmetic operators, before their operand type is known.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[allow(missing_docs)]
pub enum Arith {
    Add, Sub, Mul, Div, Rem
}

impl Arith {
    /// The instruction for this operator over operands of the given type.
    pub fn inst(self, ty: Type) -> BinOp {
        match (self, ty == Type::F32) {
            (Arith::Add, false) => BinOp::Add,
            (Arith::Sub, false) => BinOp::Sub,
            (Arith::Mul, false) => BinOp::Mul,
            (Arith::Div, false) => BinOp::SDiv,
            (Arith::Rem, false) => BinOp::SRem,
            (Arith::Add, true)  => BinOp::FAdd,
            (Arith::Sub, true)  => BinOp::FSub,
            (Arith::Mul, true)  => BinOp::FMul,
            (Arith::Div, true)  => BinOp::FDiv,
            (Arith::Rem, true)  => BinOp::FRem,
        }
    }
}

impl From<AddOp> for Arith {
    fn from(op: AddOp) -> Self {
        match op {
            AddOp::Add => Arith::Add,
            AddOp::Sub => Arith::Sub,
        }
    }
}

impl From<MulOp> for Arith {
    fn from(op: MulOp) -> Self {
        match op {
            MulOp::Mul => Arith::Mul,
            MulOp::Div => Arith::Div,
            MulOp::Mod => Arith::Rem,
        }
    }
}

impl From<EqOp> for CmpPred {
    fn from(op: EqOp) -> Self {
        match op {
            EqOp::Eq => CmpPred::Eq,
            EqOp::Ne => CmpPred::Ne,
        }
    }
}

impl From<RelOp> for CmpPred {
    fn from(op: RelOp) -> Self {
        match op {
            RelOp::Lt => CmpPred::Lt,
            RelOp::Gt => CmpPred::Gt,
            RelOp::Le => CmpPred::Le,
            RelOp::Ge => CmpPred::Ge,
        }
    }
}

/// The type both operands of a binary operation are converted to:
/// `float` if either side is a float, otherwise `i32`.
pub fn promote(l: Type, r: Type) -> Type {
    match l == Type::F32 || r == Type::F32 {
        true  => Type::F32,
        false => Type::I32,
    }
}

fn promoted(l: Constant, r: Constant) -> Option<(Constant, Constant)> {
    let ty = promote(l.ty(), r.ty());
    Some((l.convert(ty)?, r.convert(ty)?))
}

/// Folds an arithmetic operation.
pub fn arith(op: Arith, l: Constant, r: Constant) -> Option<Constant> {
    match promoted(l, r)? {
        (Constant::Int(a), Constant::Int(b)) => {
            let n = match op {
                Arith::Add => a.wrapping_add(b),
                Arith::Sub => a.wrapping_sub(b),
                Arith::Mul => a.wrapping_mul(b),
                Arith::Div => a.checked_div(b).or_else(|| (b != 0).then(|| a.wrapping_div(b)))?,
                Arith::Rem => a.checked_rem(b).or_else(|| (b != 0).then(|| a.wrapping_rem(b)))?,
            };
            Some(Constant::Int(n))
        },
        (Constant::Float(a), Constant::Float(b)) => {
            let x = match op {
                Arith::Add => a + b,
                Arith::Sub => a - b,
                Arith::Mul => a * b,
                Arith::Div if b == 0.0 => return None,
                Arith::Div => a / b,
                Arith::Rem if b == 0.0 => return None,
                Arith::Rem => a % b,
            };
            Some(Constant::Float(x))
        },
        _ => None,
    }
}

/// Folds a comparison.
pub fn compare(pred: CmpPred, l: Constant, r: Constant) -> Option<Constant> {
    let ord = match promoted(l, r)? {
        (Constant::Int(a), Constant::Int(b)) => a.partial_cmp(&b),
        (Constant::Float(a), Constant::Float(b)) => a.partial_cmp(&b),
        _ => None,
    };

    // NaN compares false under every ordered predicate
    let Some(ord) = ord else { return Some(Constant::Bool(false)) };
    let b = match pred {
        CmpPred::Eq => ord.is_eq(),
        CmpPred::Ne => ord.is_ne(),
        CmpPred::Lt => ord.is_lt(),
        CmpPred::Gt => ord.is_gt(),
        CmpPred::Le => ord.is_le(),
        CmpPred::Ge => ord.is_ge(),
    };
    Some(Constant::Bool(b))
}

/// Folds `-c` (as `0 - c`).
pub fn negate(c: Constant) -> Constant {
    match c {
        Constant::Bool(b)  => Constant::Int(-(b as i32)),
        Constant::Int(n)   => Constant::Int(n.wrapping_neg()),
        Constant::Float(x) => Constant::Float(0.0 - x),
    }
}

/// Folds `!c` (as `c == 0`).
pub fn not(c: Constant) -> Constant {
    Constant::Bool(!c.is_truthy())
}

/// Evaluates an expression at compile time.
///
/// Returns None if the expression is not constant
/// (it reads a non-`const` variable, calls a function, or divides by zero).
pub fn const_eval(e: &Exp, symtab: &SymbolTable) -> Option<Constant> {
    e.0.fold(symtab)
}

trait Fold {
    fn fold(&self, symtab: &SymbolTable) -> Option<Constant>;
}

impl Fold for LOrExp {
    fn fold(&self, symtab: &SymbolTable) -> Option<Constant> {
        let r = self.right.fold(symtab)?;
        match &self.left {
            Some((l, _)) => Some(Constant::Bool(l.fold(symtab)?.is_truthy() || r.is_truthy())),
            None => Some(r),
        }
    }
}

impl Fold for LAndExp {
    fn fold(&self, symtab: &SymbolTable) -> Option<Constant> {
        let r = self.right.fold(symtab)?;
        match &self.left {
            Some((l, _)) => Some(Constant::Bool(l.fold(symtab)?.is_truthy() && r.is_truthy())),
            None => Some(r),
        }
    }
}

impl Fold for EqExp {
    fn fold(&self, symtab: &SymbolTable) -> Option<Constant> {
        let r = self.right.fold(symtab)?;
        match &self.left {
            Some((l, op)) => compare((*op).into(), l.fold(symtab)?, r),
            None => Some(r),
        }
    }
}

impl Fold for RelExp {
    fn fold(&self, symtab: &SymbolTable) -> Option<Constant> {
        let r = self.right.fold(symtab)?;
        match &self.left {
            Some((l, op)) => compare((*op).into(), l.fold(symtab)?, r),
            None => Some(r),
        }
    }
}

impl Fold for AddExp {
    fn fold(&self, symtab: &SymbolTable) -> Option<Constant> {
        let r = self.right.fold(symtab)?;
        match &self.left {
            Some((l, op)) => arith((*op).into(), l.fold(symtab)?, r),
            None => Some(r),
        }
    }
}

impl Fold for MulExp {
    fn fold(&self, symtab: &SymbolTable) -> Option<Constant> {
        let r = self.right.fold(symtab)?;
        match &self.left {
            Some((l, op)) => arith((*op).into(), l.fold(symtab)?, r),
            None => Some(r),
        }
    }
}

impl Fold for UnaryExp {
    fn fold(&self, symtab: &SymbolTable) -> Option<Constant> {
        match self {
            UnaryExp::Primary(p) => p.fold(symtab),
            UnaryExp::Call { .. } => None,
            UnaryExp::Op(op, e) => {
                let c = e.fold(symtab)?;
                match op {
                    UnaryOp::Plus  => Some(c),
                    UnaryOp::Minus => Some(negate(c)),
                    UnaryOp::Not   => Some(not(c)),
                }
            },
        }
    }
}

impl Fold for PrimaryExp {
    fn fold(&self, symtab: &SymbolTable) -> Option<Constant> {
        match self {
            PrimaryExp::Paren(e) => e.0.fold(symtab),
            PrimaryExp::LVal(LVal(ident)) => match symtab.lookup(&ident.name)? {
                Binding::Var { is_const: true, value, .. } => *value,
                _ => None,
            },
            PrimaryExp::Number(Number::Int(n))   => Some(Constant::Int(*n)),
            PrimaryExp::Number(Number::Float(x)) => Some(Constant::Float(*x)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler::ir::{GlobalId, Value};
    use crate::lexer::tokenize;
    use crate::parser::parse;

    use super::*;

    /// Folds the initializer of the last global in the program.
    fn fold_last(src: &str, symtab: &SymbolTable) -> Option<Constant> {
        let cu = parse(&tokenize(src).unwrap()).unwrap();
        let Some(Item::Decl(d)) = cu.items.last() else { panic!("expected a declaration") };
        let init = d.defs.last().and_then(|d| d.init.as_ref()).expect("initializer");
        const_eval(init, symtab)
    }

    fn fold(src: &str) -> Option<Constant> {
        fold_last(src, &SymbolTable::new())
    }

    #[test]
    fn arithmetic() {
        assert_eq!(fold("int a = 2 + 3 * 4;"), Some(Constant::Int(14)));
        assert_eq!(fold("int a = (2 + 3) * 4;"), Some(Constant::Int(20)));
        assert_eq!(fold("int a = 7 / 2 - 7 % 2;"), Some(Constant::Int(2)));
        assert_eq!(fold("int a = -(-5) + +1;"), Some(Constant::Int(6)));
        assert_eq!(fold("float a = 1 + 0.5;"), Some(Constant::Float(1.5)));
    }

    #[test]
    fn wrapping_and_division_by_zero() {
        assert_eq!(fold("int a = 2147483647 + 1;"), Some(Constant::Int(i32::MIN)));
        assert_eq!(arith(Arith::Div, Constant::Int(i32::MIN), Constant::Int(-1)), Some(Constant::Int(i32::MIN)));
        assert_eq!(fold("int a = 1 / 0;"), None);
        assert_eq!(fold("int a = 1 % (2 - 2);"), None);
        assert_eq!(fold("float a = 1.0 / 0;"), None);
    }

    #[test]
    fn logic_and_comparisons() {
        assert_eq!(fold("int a = !0;"), Some(Constant::Bool(true)));
        assert_eq!(fold("int a = 1 < 2 && 3 == 4;"), Some(Constant::Bool(false)));
        assert_eq!(fold("int a = 0 || 2.5 != 2;"), Some(Constant::Bool(true)));
        assert_eq!(compare(CmpPred::Ge, Constant::Int(2), Constant::Float(2.0)), Some(Constant::Bool(true)));
        assert_eq!(negate(Constant::Bool(true)), Constant::Int(-1));
    }

    #[test]
    fn references() {
        let mut symtab = SymbolTable::new();
        symtab.insert("N", Binding::Var {
            ptr: Value::Global(GlobalId(0)),
            ty: Type::I32,
            is_const: true,
            value: Some(Constant::Int(5))
        });
        symtab.insert("x", Binding::Var {
            ptr: Value::Global(GlobalId(1)),
            ty: Type::I32,
            is_const: false,
            value: None
        });

        assert_eq!(fold_last("int a = N * 2;", &symtab), Some(Constant::Int(10)));
        assert_eq!(fold_last("int a = x + 1;", &symtab), None);
        assert_eq!(fold_last("int a = y;", &symtab), None);
        assert_eq!(fold_last("int a = f();", &symtab), None);
    }

    #[test]
    fn instruction_selection() {
        assert_eq!(Arith::from(MulOp::Mod).inst(Type::I32), BinOp::SRem);
        assert_eq!(Arith::from(AddOp::Sub).inst(Type::F32), BinOp::FSub);
        assert_eq!(promote(Type::I1, Type::I32), Type::I32);
        assert_eq!(promote(Type::I32, Type::F32), Type::F32);
    }
}
