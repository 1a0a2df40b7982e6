use std::fmt::{Display, Formatter};

use crate::ast::*;

use super::*;

impl Display for CompUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for item in &self.items {
            writeln!(f, "{item}")?;
        }

        Ok(())
    }
}

impl Display for Item {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Item::Decl(d) => write!(f, "{d}"),
            Item::FuncDef(fd) => write!(f, "{fd}"),
        }
    }
}

impl Display for BType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BType::Int   => write!(f, "int"),
            BType::Float => write!(f, "float"),
            BType::Void  => write!(f, "void"),
        }
    }
}

impl Display for Ident {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Display for Decl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Decl { is_const, ty, defs } = self;

        if *is_const {
            write!(f, "const ")?;
        }
        write!(f, "{ty} ")?;
        fmt_list(f, defs)?;
        write!(f, ";")
    }
}

impl Display for VarDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.init {
            Some(e) => write!(f, "{} = {e}", self.ident),
            None => write!(f, "{}", self.ident),
        }
    }
}

impl Display for FuncDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let FuncDef { ret, ident, params, block } = self;

        write!(f, "{ret} {ident}(")?;
        fmt_mapped_list(f, params, |f, p| write!(f, "{} {}", p.ty, p.ident))?;
        write!(f, ") {block}")
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", BlockDisplay(&self.items))
    }
}

impl Display for BlockItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockItem::Decl(d) => write!(f, "{d}"),
            BlockItem::Stmt(s) => write!(f, "{s}"),
        }
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stmt::Assign(lval, e) => write!(f, "{lval} = {e};"),
            Stmt::Expr(Some(e)) => write!(f, "{e};"),
            Stmt::Expr(None) => write!(f, ";"),
            Stmt::Block(b) => write!(f, "{b}"),
            Stmt::If { cond, then, els } => {
                write!(f, "if ({cond}) {then}")?;
                match els {
                    Some(e) => write!(f, " else {e}"),
                    None => Ok(()),
                }
            },
            Stmt::While { cond, body } => write!(f, "while ({cond}) {body}"),
            Stmt::Break(_) => write!(f, "break;"),
            Stmt::Continue(_) => write!(f, "continue;"),
            Stmt::Return(Some(e), _) => write!(f, "return {e};"),
            Stmt::Return(None, _) => write!(f, "return;"),
        }
    }
}

impl Display for LVal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for Exp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for Cond {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<Op: Display, Next: Display> Display for Chain<Op, Next> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.left {
            Some((left, op)) => write!(f, "{left} {op} {}", self.right),
            None => write!(f, "{}", self.right),
        }
    }
}

impl Display for UnaryExp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryExp::Primary(p) => write!(f, "{p}"),
            UnaryExp::Call { ident, args } => {
                write!(f, "{ident}(")?;
                fmt_list(f, args)?;
                write!(f, ")")
            },
            UnaryExp::Op(op, e) => write!(f, "{op}{e}"),
        }
    }
}

impl Display for PrimaryExp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimaryExp::Paren(e) => write!(f, "({e})"),
            PrimaryExp::LVal(l) => write!(f, "{l}"),
            PrimaryExp::Number(n) => write!(f, "{n}"),
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Float(x) => write!(f, "{x:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn reparse(src: &str) -> String {
        let cu = parse(&tokenize(src).unwrap()).unwrap();
        let printed = cu.to_string();

        // printing then parsing gives back the same tree
        let cu2 = parse(&tokenize(&printed).unwrap()).unwrap();
        assert_eq!(cu.to_string(), cu2.to_string());
        printed
    }

    #[test]
    fn declarations() {
        assert_eq!(reparse("const int N=2+3*4,M=-N;float x;"), "const int N = 2 + 3 * 4, M = -N;\nfloat x;\n");
    }

    #[test]
    fn functions() {
        let printed = reparse("int f(int a,float b){if(a<b&&!a)return (a);else{a=a%2;}while(1){break;}g(a,1.5);;return;}");
        assert_eq!(printed, "\
int f(int a, float b) {
    if (a < b && !a) return (a); else {
        a = a % 2;
    }
    while (1) {
        break;
    }
    g(a, 1.5);
    ;
    return;
}
");
    }

    #[test]
    fn empty_block() {
        assert_eq!(reparse("void f(){}"), "void f() {}\n");
    }
}
