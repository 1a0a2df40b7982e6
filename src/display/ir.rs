use std::fmt::{Display, Formatter};

use crate::compiler::ir::*;

use super::*;

impl Display for Global {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Global { name, ty, init, is_const } = self;
        let kw = if *is_const { "constant" } else { "global" };

        write!(f, "@{name} = {kw} {ty} {init}")
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for g in &self.globals {
            writeln!(f, "{g}")?;
        }
        if !self.globals.is_empty() {
            writeln!(f)?;
        }

        for fun in self.functions.iter().filter(|fun| fun.is_declaration) {
            write!(f, "declare {} @{}(", fun.ret, fun.name)?;
            fmt_mapped_list(f, &fun.params, |f, p| write!(f, "{}", p.ty))?;
            writeln!(f, ")")?;
        }

        for fun in self.functions.iter().filter(|fun| !fun.is_declaration) {
            writeln!(f)?;
            write!(f, "{}", FunctionDisplay::new(self, fun))?;
        }

        Ok(())
    }
}

/// Displays a function definition.
///
/// Instructions with a result are numbered `%0, %1, ...` in layout order.
struct FunctionDisplay<'m> {
    module: &'m Module,
    fun: &'m Function,
    numbers: Vec<Option<usize>>
}

impl<'m> FunctionDisplay<'m> {
    fn new(module: &'m Module, fun: &'m Function) -> Self {
        let mut numbers = vec![None; fun.insts.len()];
        let results = fun.inst_order()
            .map(|(_, i)| i)
            .filter(|&i| fun.inst(i).ty != Type::Void);

        for (n, i) in results.enumerate() {
            numbers[i.index()] = Some(n);
        }

        FunctionDisplay { module, fun, numbers }
    }

    fn value(&self, v: Value) -> String {
        match v {
            Value::Const(c) => c.to_string(),
            Value::Inst(i) => match self.numbers.get(i.index()).copied().flatten() {
                Some(n) => format!("%{n}"),
                None => String::from("%<undef>"),
            },
            Value::Arg(a) => match self.fun.params.get(a as usize) {
                Some(p) => format!("%{}", p.name),
                None => String::from("%<undef>"),
            },
            Value::Global(g) => match self.module.globals.get(g.index()) {
                Some(g) => format!("@{}", g.name),
                None => String::from("@<undef>"),
            },
        }
    }

    /// A value with its type, as in `i32 %0`.
    fn typed(&self, v: Value) -> String {
        format!("{} {}", self.fun.value_type(v, self.module), self.value(v))
    }

    fn label(&self, b: BlockId) -> &str {
        self.fun.blocks.get(b.index()).map_or("<undef>", |b| &b.label)
    }

    fn fmt_inst(&self, f: &mut Formatter<'_>, id: InstId) -> std::fmt::Result {
        let Inst { kind, ty } = self.fun.inst(id);

        if *ty != Type::Void {
            write!(f, "{} = ", self.value(Value::Inst(id)))?;
        }

        match kind {
            InstKind::Alloca(t) => write!(f, "alloca {t}"),
            InstKind::Load(p) => write!(f, "load {ty}, {}", self.typed(*p)),
            InstKind::Store { value, ptr } => write!(f, "store {}, {}", self.typed(*value), self.typed(*ptr)),
            InstKind::Binary(op, l, r) => write!(f, "{} {}, {}", op.name(), self.typed(*l), self.value(*r)),
            InstKind::ICmp(p, l, r) => write!(f, "icmp {} {}, {}", p.int_name(), self.typed(*l), self.value(*r)),
            InstKind::FCmp(p, l, r) => write!(f, "fcmp {} {}, {}", p.float_name(), self.typed(*l), self.value(*r)),
            InstKind::Cast(op, v) => write!(f, "{} {} to {ty}", op.name(), self.typed(*v)),
            InstKind::Call { callee, args } => {
                let callee = self.module.functions.get(callee.index()).map_or("<undef>", |c| &c.name);
                write!(f, "call {ty} @{callee}(")?;
                fmt_mapped_list(f, args, |f, a| write!(f, "{}", self.typed(*a)))?;
                write!(f, ")")
            },
            InstKind::Phi(incoming) => {
                write!(f, "phi {ty} ")?;
                fmt_mapped_list(f, incoming, |f, &(v, b)| write!(f, "[ {}, %{} ]", self.value(v), self.label(b)))
            },
            InstKind::Br(b) => write!(f, "br label %{}", self.label(*b)),
            InstKind::CondBr { cond, then, els } => {
                write!(f, "br {}, label %{}, label %{}", self.typed(*cond), self.label(*then), self.label(*els))
            },
            InstKind::Ret(Some(v)) => write!(f, "ret {}", self.typed(*v)),
            InstKind::Ret(None) => write!(f, "ret void"),
        }
    }
}

impl Display for FunctionDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Function { name, ret, params, blocks, .. } = self.fun;

        write!(f, "define {ret} @{name}(")?;
        fmt_mapped_list(f, params, |f, p| write!(f, "{} %{}", p.ty, p.name))?;
        writeln!(f, ") {{")?;

        for block in blocks {
            writeln!(f, "{}:", block.label)?;
            for &i in &block.insts {
                write!(f, "  ")?;
                self.fmt_inst(f, i)?;
                writeln!(f)?;
            }
        }

        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler::codegen;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn ir(src: &str) -> String {
        let (module, errors) = codegen(&parse(&tokenize(src).unwrap()).unwrap());
        assert!(errors.is_empty(), "{errors:?}");
        module.to_string()
    }

    #[test]
    fn globals_and_declarations() {
        let text = ir("int a = 10; const int N = 5; float x;");
        assert!(text.starts_with("@a = global i32 10\n@N = constant i32 5\n@x = global float 0.0\n\n"), "{text}");
        assert!(text.contains("declare i32 @getint()\n"));
        assert!(text.contains("declare void @putfloat(float)\n"));
        assert!(!text.contains("define"));
    }

    #[test]
    fn function_body() {
        let text = ir("int a = 10; int main() { a = a + 5; return a; }");
        let main = text.split("\n\n").last().unwrap();
        assert_eq!(main, "\
define i32 @main() {
entry:
  %0 = load i32, i32* @a
  %1 = add i32 %0, 5
  store i32 %1, i32* @a
  %2 = load i32, i32* @a
  ret i32 %2
}
");
    }

    #[test]
    fn arguments_and_phis() {
        let text = ir("int f(int x, float y) { return x && y; }");
        assert!(text.contains("define i32 @f(i32 %x, float %y) {\n"), "{text}");
        assert!(text.contains("  store i32 %x, i32* %0\n"), "{text}");
        assert!(text.contains("br i1 %"), "{text}");
        assert!(text.contains("phi i1 [ false, %entry ], [ %"), "{text}");
        assert!(text.contains("fcmp one float %"), "{text}");
        assert!(text.contains("zext i1 %"), "{text}");
    }
}
