//! Lowers the AST into IR.
//!
//! Each AST node that produces IR implements [`GenIr`],
//! and [`IrGen`] holds the state shared between them
//! (the module being built, the function being built, the symbol table, and the errors so far).

use std::collections::HashSet;
use std::iter;

use crate::ast::*;
use crate::err::{CmmErr, Span};

use super::builder::{FnBuilder, LoopExits};
use super::fold::{self, Arith};
use super::ir::*;
use super::symtab::{Binding, SymbolTable};
use super::{FullIrGenErr, IrGenErr};

/// The runtime library every module can call: name, return type, parameter types.
const RUNTIME: &[(&str, Type, &[Type])] = &[
    ("getint",   Type::I32,  &[]),
    ("getch",    Type::I32,  &[]),
    ("getfloat", Type::F32,  &[]),
    ("putint",   Type::Void, &[Type::I32]),
    ("putch",    Type::Void, &[Type::I32]),
    ("putfloat", Type::Void, &[Type::F32]),
];

/// Generates the IR module of a program, along with every semantic error found.
pub fn codegen(cu: &CompUnit) -> (Module, Vec<FullIrGenErr>) {
    let mut gen = IrGen::new();
    gen.compile(cu);
    gen.finish()
}

/// The IR type of a declared type.
fn ir_type(ty: BType) -> Type {
    match ty {
        BType::Int   => Type::I32,
        BType::Float => Type::F32,
        BType::Void  => Type::Void,
    }
}

fn zero(ty: Type) -> Constant {
    ty.zero().unwrap_or(Constant::Int(0))
}

/// A value computed by an expression, with its type.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Typed {
    #[allow(missing_docs)]
    pub value: Value,
    #[allow(missing_docs)]
    pub ty: Type
}

impl Typed {
    fn constant(c: Constant) -> Self {
        Typed { value: Value::Const(c), ty: c.ty() }
    }
}

/// This struct converts an AST into IR.
pub struct IrGen {
    module: Module,
    symtab: SymbolTable,
    builder: FnBuilder,
    errors: Vec<FullIrGenErr>
}

impl IrGen {
    /// Creates a generator with an empty module and only the global scope.
    pub fn new() -> Self {
        IrGen {
            module: Module::default(),
            symtab: SymbolTable::new(),
            builder: FnBuilder::new("", Type::Void, vec![]),
            errors: vec![]
        }
    }

    /// Generates the IR of the given item into the current module,
    /// and returns the value generated by the write.
    pub fn compile<T: GenIr + ?Sized>(&mut self, t: &T) -> T::Return {
        t.gen_ir(self)
    }

    /// The module generated so far.
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// The errors reported so far.
    pub fn errors(&self) -> &[FullIrGenErr] {
        &self.errors
    }

    /// Consumes the generator, returning the module and the errors reported.
    pub fn finish(self) -> (Module, Vec<FullIrGenErr>) {
        (self.module, self.errors)
    }

    fn report(&mut self, err: IrGenErr, span: Span) {
        log::debug!("{span} :: {}: {err}", err.err_name());
        self.errors.push(err.at_span(span));
    }

    /// Binds a name in the current scope, reporting it if it is already bound there.
    fn bind(&mut self, ident: &Ident, binding: Binding) -> bool {
        let fresh = self.symtab.insert(&ident.name, binding);
        if !fresh {
            self.report(IrGenErr::DuplicateDef(ident.name.clone()), ident.span);
        }
        fresh
    }

    fn declare_runtime(&mut self) {
        for &(name, ret, params) in RUNTIME {
            let id = FuncId(self.module.functions.len() as u32);
            let decl_params = params.iter()
                .enumerate()
                .map(|(i, &ty)| Param { name: format!("p{i}"), ty })
                .collect();

            self.symtab.insert(name, Binding::Func { id, ret, params: params.to_vec() });
            self.module.functions.push(Function::declaration(name, ret, decl_params));
        }
    }

    /// Registers the signature of a function so it can be called before (or within) its body.
    fn declare_fn(&mut self, f: &FuncDef) -> Option<FuncId> {
        let id = FuncId(self.module.functions.len() as u32);
        let ret = ir_type(f.ret);
        let params: Vec<_> = f.params.iter()
            .map(|p| Param { name: p.ident.name.clone(), ty: ir_type(p.ty) })
            .collect();

        let binding = Binding::Func { id, ret, params: params.iter().map(|p| p.ty).collect() };
        if !self.bind(&f.ident, binding) {
            return None;
        }

        self.module.functions.push(Function::declaration(&f.ident.name, ret, params));
        Some(id)
    }

    /// Generates the body of a function whose signature was registered by [`IrGen::declare_fn`].
    fn define_fn(&mut self, id: FuncId, f: &FuncDef) {
        log::debug!("generating @{}", f.ident.name);

        let proto = self.module.function(id);
        let builder = FnBuilder::new(&proto.name, proto.ret, proto.params.clone());
        let outer = std::mem::replace(&mut self.builder, builder);

        self.symtab.enter_scope();
        for (i, p) in f.params.iter().enumerate() {
            if self.symtab.declared_here(&p.ident.name) {
                self.report(IrGenErr::DuplicateDef(p.ident.name.clone()), p.ident.span);
                continue;
            }
            let ty = ir_type(p.ty);
            let slot = self.builder.build_alloca(ty);
            self.builder.build_store(Value::Arg(i as u32), slot);
            self.bind(&p.ident, Binding::Var { ptr: slot, ty, is_const: false, value: None });
        }
        for item in &f.block.items {
            self.compile(item);
        }
        self.symtab.exit_scope();

        let builder = std::mem::replace(&mut self.builder, outer);
        self.module.functions[id.index()] = builder.finish();
    }

    fn global_def(&mut self, is_const: bool, ty: Type, def: &VarDef) {
        let init = match &def.init {
            Some(e) => fold::const_eval(e, &self.symtab).and_then(|c| c.convert(ty)),
            None => Some(zero(ty)),
        };
        let init = init.unwrap_or_else(|| {
            self.report(IrGenErr::NonConstInit(def.ident.name.clone()), def.ident.span);
            zero(ty)
        });

        let id = GlobalId(self.module.globals.len() as u32);
        let binding = Binding::Var {
            ptr: Value::Global(id),
            ty,
            is_const,
            value: is_const.then_some(init)
        };
        if self.bind(&def.ident, binding) {
            self.module.globals.push(Global { name: def.ident.name.clone(), ty, init, is_const });
        }
    }

    fn local_def(&mut self, is_const: bool, ty: Type, def: &VarDef) {
        if self.symtab.declared_here(&def.ident.name) {
            self.report(IrGenErr::DuplicateDef(def.ident.name.clone()), def.ident.span);
            return;
        }
        let slot = self.builder.build_alloca(ty);

        let value = match (&def.init, is_const) {
            (Some(e), true) => fold::const_eval(e, &self.symtab).and_then(|c| c.convert(ty)),
            _ => None,
        };

        match (value, &def.init) {
            (Some(c), _) => self.builder.build_store(Value::Const(c), slot),
            (None, Some(e)) => if let Some(v) = self.compile(e) {
                let v = self.convert(v, ty);
                self.builder.build_store(v, slot);
            },
            (None, None) => {},
        }

        // bound only after the initializer, so `int a = a;` reads the outer `a`
        self.bind(&def.ident, Binding::Var { ptr: slot, ty, is_const, value });
    }

    /// Resolves a variable to its address and type.
    fn resolve_var(&mut self, ident: &Ident, for_store: bool) -> Option<(Value, Type)> {
        match self.symtab.lookup(&ident.name) {
            Some(&Binding::Var { ptr, ty, is_const, .. }) => {
                if for_store && is_const {
                    self.report(IrGenErr::AssignToConst(ident.name.clone()), ident.span);
                    return None;
                }
                Some((ptr, ty))
            },
            Some(Binding::Func { .. }) => {
                self.report(IrGenErr::NotAVariable(ident.name.clone()), ident.span);
                None
            },
            None => {
                self.report(IrGenErr::UndefinedVar(ident.name.clone()), ident.span);
                None
            },
        }
    }

    fn gen_call(&mut self, ident: &Ident, args: &[Exp], allow_void: bool) -> Option<Typed> {
        let values: Vec<_> = args.iter().map(|a| self.compile(a)).collect();

        let (id, ret, params) = match self.symtab.lookup(&ident.name) {
            Some(Binding::Func { id, ret, params }) => (*id, *ret, params.clone()),
            Some(Binding::Var { .. }) => {
                self.report(IrGenErr::NotAFunction(ident.name.clone()), ident.span);
                return None;
            },
            None => {
                self.report(IrGenErr::UndefinedFun(ident.name.clone()), ident.span);
                return None;
            },
        };

        if params.len() != values.len() {
            let err = IrGenErr::ArgCount { name: ident.name.clone(), expected: params.len(), found: values.len() };
            self.report(err, ident.span);
            return None;
        }

        let values: Vec<_> = values.into_iter().collect::<Option<_>>()?;
        let args = iter::zip(values, params)
            .map(|(v, ty)| self.convert(v, ty))
            .collect();
        let value = self.builder.build_call(id, args, ret);

        if ret == Type::Void && !allow_void {
            self.report(IrGenErr::VoidValue(ident.name.clone()), ident.span);
            return None;
        }
        Some(Typed { value, ty: ret })
    }

    /// Generates an expression whose value is discarded.
    /// A bare call to a `void` function is allowed here.
    fn gen_effect(&mut self, e: &Exp) {
        let call = e.as_add().and_then(|add| match add {
            Chain { left: None, right: Chain { left: None, right: UnaryExp::Call { ident, args } } } => Some((ident, args)),
            _ => None,
        });

        match call {
            Some((ident, args)) => { self.gen_call(ident, args, true); },
            None => { self.compile(e); },
        }
    }

    /// Generates a condition as an `i1`.
    fn gen_cond(&mut self, cond: &Cond) -> Value {
        match self.compile(&cond.0) {
            Some(v) => self.to_bool(v),
            None => Value::Const(Constant::Bool(false)),
        }
    }

    /// Coerces a value to `i1` (as `!= 0`).
    fn to_bool(&mut self, v: Typed) -> Value {
        match (v.value, v.ty) {
            (Value::Const(c), _) => Value::Const(Constant::Bool(c.is_truthy())),
            (_, Type::I1) => v.value,
            (_, ty) => self.builder.build_cmp(CmpPred::Ne, v.value, Value::Const(zero(ty)), ty),
        }
    }

    /// Converts a value to another scalar type.
    fn convert(&mut self, v: Typed, to: Type) -> Value {
        if v.ty == to {
            return v.value;
        }
        if let Value::Const(c) = v.value {
            if let Some(c) = c.convert(to) {
                return Value::Const(c);
            }
        }

        match (v.ty, to) {
            (_, Type::I1) => self.to_bool(v),
            (Type::I1, Type::I32) => self.builder.build_cast(CastOp::ZExt, v.value, Type::I32),
            (Type::I1, Type::F32) => {
                let n = self.builder.build_cast(CastOp::ZExt, v.value, Type::I32);
                self.builder.build_cast(CastOp::SIToFP, n, Type::F32)
            },
            (Type::I32, Type::F32) => self.builder.build_cast(CastOp::SIToFP, v.value, Type::F32),
            (Type::F32, Type::I32) => self.builder.build_cast(CastOp::FPToSI, v.value, Type::I32),
            _ => v.value,
        }
    }

    fn arith(&mut self, op: Arith, l: Typed, r: Typed) -> Option<Typed> {
        if let (Value::Const(a), Value::Const(b)) = (l.value, r.value) {
            if let Some(c) = fold::arith(op, a, b) {
                return Some(Typed::constant(c));
            }
        }

        let ty = fold::promote(l.ty, r.ty);
        let (a, b) = (self.convert(l, ty), self.convert(r, ty));
        let value = self.builder.build_binary(op.inst(ty), a, b, ty);
        Some(Typed { value, ty })
    }

    fn cmp(&mut self, pred: CmpPred, l: Typed, r: Typed) -> Option<Typed> {
        if let (Value::Const(a), Value::Const(b)) = (l.value, r.value) {
            if let Some(c) = fold::compare(pred, a, b) {
                return Some(Typed::constant(c));
            }
        }

        let ty = fold::promote(l.ty, r.ty);
        let (a, b) = (self.convert(l, ty), self.convert(r, ty));
        let value = self.builder.build_cmp(pred, a, b, ty);
        Some(Typed { value, ty: Type::I1 })
    }

    fn unary(&mut self, op: UnaryOp, v: Typed) -> Option<Typed> {
        if let Value::Const(c) = v.value {
            return Some(Typed::constant(match op {
                UnaryOp::Plus  => c,
                UnaryOp::Minus => fold::negate(c),
                UnaryOp::Not   => fold::not(c),
            }));
        }

        match op {
            UnaryOp::Plus => Some(v),
            UnaryOp::Minus => {
                let ty = fold::promote(v.ty, Type::I32);
                let x = self.convert(v, ty);
                let value = self.builder.build_binary(Arith::Sub.inst(ty), Value::Const(zero(ty)), x, ty);
                Some(Typed { value, ty })
            },
            UnaryOp::Not => {
                let value = self.builder.build_cmp(CmpPred::Eq, v.value, Value::Const(zero(v.ty)), v.ty);
                Some(Typed { value, ty: Type::I1 })
            },
        }
    }

    /// Generates `lhs && rhs` (or `lhs || rhs`) with short-circuit control flow.
    ///
    /// The right side is only evaluated if the left side does not decide the result.
    /// The result is a phi in the merge block, taking the deciding constant from the left side's block.
    fn short_circuit(
        &mut self,
        is_and: bool,
        lhs: impl FnOnce(&mut Self) -> Option<Typed>,
        rhs: impl FnOnce(&mut Self) -> Option<Typed>
    ) -> Option<Typed> {
        let (prefix, decided) = match is_and {
            true  => ("land", false),
            false => ("lor", true),
        };
        let decided = Value::Const(Constant::Bool(decided));

        let l = lhs(self).map(|v| self.to_bool(v));
        let rhs_bb = self.builder.append_block(&format!("{prefix}_rhs"));
        let merge_bb = self.builder.append_block(&format!("{prefix}_merge"));

        self.builder.ensure_open();
        let lhs_end = self.builder.insert_block();
        let cond = l.unwrap_or(decided);
        match is_and {
            true  => self.builder.build_cond_br(cond, rhs_bb, merge_bb),
            false => self.builder.build_cond_br(cond, merge_bb, rhs_bb),
        }

        self.builder.position_at_end(rhs_bb);
        let r = rhs(self).map(|v| self.to_bool(v));
        self.builder.ensure_open();
        let rhs_end = self.builder.insert_block();
        self.builder.build_br(merge_bb);

        self.builder.position_at_end(merge_bb);
        let value = self.builder.build_phi(Type::I1, vec![
            (decided, lhs_end),
            (r.unwrap_or(decided), rhs_end),
        ]);

        l.and(r).map(|_| Typed { value, ty: Type::I1 })
    }
}

impl Default for IrGen {
    fn default() -> Self {
        Self::new()
    }
}

/// This trait is implemented for AST nodes that can be traversed
/// in order to write IR into the generator.
pub trait GenIr {
    /// The value returned in traversing.
    type Return;

    /// This function describes how the node is written into IR.
    fn gen_ir(&self, gen: &mut IrGen) -> Self::Return;
}

impl GenIr for CompUnit {
    type Return = ();

    /// The runtime library and every function signature are registered first,
    /// so any function can call any other, regardless of order.
    /// Then globals and function bodies are generated in source order.
    ///
    /// A function named like an earlier global is a duplicate and is skipped.
    fn gen_ir(&self, gen: &mut IrGen) {
        gen.declare_runtime();

        let mut globals = HashSet::new();
        let ids: Vec<_> = self.items.iter()
            .map(|item| match item {
                Item::Decl(d) => {
                    globals.extend(d.defs.iter().map(|def| def.ident.name.as_str()));
                    None
                },
                Item::FuncDef(f) if globals.contains(f.ident.name.as_str()) => {
                    gen.report(IrGenErr::DuplicateDef(f.ident.name.clone()), f.ident.span);
                    None
                },
                Item::FuncDef(f) => gen.declare_fn(f),
            })
            .collect();

        for (item, id) in iter::zip(&self.items, ids) {
            match (item, id) {
                (Item::Decl(d), _) => gen.compile(d),
                (Item::FuncDef(f), Some(id)) => gen.define_fn(id, f),
                (Item::FuncDef(_), None) => {},
            }
        }
    }
}

impl GenIr for Decl {
    type Return = ();

    fn gen_ir(&self, gen: &mut IrGen) {
        let ty = ir_type(self.ty);

        for def in &self.defs {
            match gen.symtab.is_global() {
                true  => gen.global_def(self.is_const, ty, def),
                false => gen.local_def(self.is_const, ty, def),
            }
        }
    }
}

impl GenIr for Block {
    type Return = ();

    fn gen_ir(&self, gen: &mut IrGen) {
        gen.symtab.enter_scope();
        for item in &self.items {
            gen.compile(item);
        }
        gen.symtab.exit_scope();
    }
}

impl GenIr for BlockItem {
    type Return = ();

    fn gen_ir(&self, gen: &mut IrGen) {
        match self {
            BlockItem::Decl(d) => gen.compile(d),
            BlockItem::Stmt(s) => gen.compile(s),
        }
    }
}

impl GenIr for Stmt {
    type Return = ();

    fn gen_ir(&self, gen: &mut IrGen) {
        match self {
            Stmt::Assign(LVal(ident), e) => {
                let v = gen.compile(e);
                let Some((ptr, ty)) = gen.resolve_var(ident, true) else { return };

                if let Some(v) = v {
                    let v = gen.convert(v, ty);
                    gen.builder.build_store(v, ptr);
                }
            },
            Stmt::Expr(Some(e)) => gen.gen_effect(e),
            Stmt::Expr(None) => {},
            Stmt::Block(b) => gen.compile(b),
            Stmt::If { cond, then, els } => {
                let c = gen.gen_cond(cond);

                let then_bb = gen.builder.append_block("if_then");
                let else_bb = els.as_ref().map(|_| gen.builder.append_block("if_else"));
                let merge_bb = gen.builder.append_block("if_merge");
                gen.builder.build_cond_br(c, then_bb, else_bb.unwrap_or(merge_bb));

                gen.builder.position_at_end(then_bb);
                gen.compile(&**then);
                if !gen.builder.is_terminated() {
                    gen.builder.build_br(merge_bb);
                }

                if let (Some(else_bb), Some(els)) = (else_bb, els) {
                    gen.builder.position_at_end(else_bb);
                    gen.compile(&**els);
                    if !gen.builder.is_terminated() {
                        gen.builder.build_br(merge_bb);
                    }
                }

                gen.builder.position_at_end(merge_bb);
            },
            Stmt::While { cond, body } => {
                let cond_bb = gen.builder.append_block("while_cond");
                let body_bb = gen.builder.append_block("while_body");
                let end_bb = gen.builder.append_block("while_end");

                gen.builder.build_br(cond_bb);
                gen.builder.position_at_end(cond_bb);
                let c = gen.gen_cond(cond);
                gen.builder.build_cond_br(c, body_bb, end_bb);

                gen.builder.position_at_end(body_bb);
                gen.builder.push_loop(LoopExits { cont: cond_bb, brk: end_bb });
                gen.compile(&**body);
                gen.builder.pop_loop();
                if !gen.builder.is_terminated() {
                    gen.builder.build_br(cond_bb);
                }

                gen.builder.position_at_end(end_bb);
            },
            Stmt::Break(span) => match gen.builder.loop_exits() {
                Some(exits) => gen.builder.build_br(exits.brk),
                None => gen.report(IrGenErr::BreakOutsideLoop, *span),
            },
            Stmt::Continue(span) => match gen.builder.loop_exits() {
                Some(exits) => gen.builder.build_br(exits.cont),
                None => gen.report(IrGenErr::ContinueOutsideLoop, *span),
            },
            Stmt::Return(e, span) => {
                let ret = gen.builder.func().ret;
                let name = gen.builder.func().name.clone();

                match (e, ret) {
                    (Some(e), Type::Void) => {
                        gen.gen_effect(e);
                        gen.report(IrGenErr::ReturnValueInVoid(name), *span);
                        gen.builder.build_ret(None);
                    },
                    (None, Type::Void) => gen.builder.build_ret(None),
                    (None, ty) => {
                        gen.report(IrGenErr::MissingReturnValue(name), *span);
                        gen.builder.build_ret(Some(Value::Const(zero(ty))));
                    },
                    (Some(e), ty) => {
                        let v = match gen.compile(e) {
                            Some(v) => gen.convert(v, ty),
                            None => Value::Const(zero(ty)),
                        };
                        gen.builder.build_ret(Some(v));
                    },
                }
            },
        }
    }
}

impl GenIr for Exp {
    type Return = Option<Typed>;

    fn gen_ir(&self, gen: &mut IrGen) -> Self::Return {
        gen.compile(&self.0)
    }
}

impl GenIr for LOrExp {
    type Return = Option<Typed>;

    fn gen_ir(&self, gen: &mut IrGen) -> Self::Return {
        match &self.left {
            Some((left, _)) => gen.short_circuit(false, |gen| gen.compile(&**left), |gen| gen.compile(&self.right)),
            None => gen.compile(&self.right),
        }
    }
}

impl GenIr for LAndExp {
    type Return = Option<Typed>;

    fn gen_ir(&self, gen: &mut IrGen) -> Self::Return {
        match &self.left {
            Some((left, _)) => gen.short_circuit(true, |gen| gen.compile(&**left), |gen| gen.compile(&self.right)),
            None => gen.compile(&self.right),
        }
    }
}

macro_rules! impl_binary_tier {
    ($($t:ty => $method:ident),*) => {
        $(
            impl GenIr for $t {
                type Return = Option<Typed>;

                fn gen_ir(&self, gen: &mut IrGen) -> Self::Return {
                    match &self.left {
                        Some((left, op)) => {
                            let l = gen.compile(&**left);
                            let r = gen.compile(&self.right);
                            gen.$method((*op).into(), l?, r?)
                        },
                        None => gen.compile(&self.right),
                    }
                }
            }
        )*
    };
}

impl_binary_tier! {
    EqExp  => cmp,
    RelExp => cmp,
    AddExp => arith,
    MulExp => arith
}

impl GenIr for UnaryExp {
    type Return = Option<Typed>;

    fn gen_ir(&self, gen: &mut IrGen) -> Self::Return {
        match self {
            UnaryExp::Primary(p) => gen.compile(p),
            UnaryExp::Call { ident, args } => gen.gen_call(ident, args, false),
            UnaryExp::Op(op, e) => {
                let v = gen.compile(&**e)?;
                gen.unary(*op, v)
            },
        }
    }
}

impl GenIr for PrimaryExp {
    type Return = Option<Typed>;

    fn gen_ir(&self, gen: &mut IrGen) -> Self::Return {
        match self {
            PrimaryExp::Paren(e) => gen.compile(&**e),
            PrimaryExp::LVal(LVal(ident)) => {
                let (ptr, ty) = gen.resolve_var(ident, false)?;
                Some(Typed { value: gen.builder.build_load(ptr, ty), ty })
            },
            PrimaryExp::Number(Number::Int(n))   => Some(Typed::constant(Constant::Int(*n))),
            PrimaryExp::Number(Number::Float(x)) => Some(Typed::constant(Constant::Float(*x))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use crate::test_utils::prelude::*;

    use super::*;

    load_tests!("_test_files/programs.cmm");
    load_tests!(error_tests, "_test_files/errors.cmm");

    fn gen(src: &str) -> (Module, Vec<FullIrGenErr>) {
        let cu = parse(&tokenize(src).unwrap()).unwrap();
        codegen(&cu)
    }

    fn gen_ok(src: &str) -> Module {
        let (module, errors) = gen(src);
        assert!(errors.is_empty(), "{errors:?}");
        if let Err(e) = module.verify() {
            panic!("{e}\n{module:?}");
        }
        module
    }

    fn kinds<'m>(m: &'m Module, f: &str) -> Vec<&'m InstKind> {
        let f = m.function_by_name(f).expect("function");
        f.inst_order().map(|(_, i)| &f.inst(i).kind).collect()
    }

    fn errs(src: &str) -> Vec<IrGenErr> {
        gen(src).1.into_iter().map(|e| e.err().clone()).collect()
    }

    #[test]
    fn runtime_and_forward_calls() {
        let m = gen_ok("int main() { return f(1); } int f(int x) { return x; }");
        assert!(m.function_by_name("getint").map_or(false, |f| f.is_declaration));
        assert!(m.function_by_name("putfloat").is_some());

        let calls = kinds(&m, "main").into_iter()
            .filter(|k| matches!(k, InstKind::Call { .. }))
            .count();
        assert_eq!(calls, 1);
    }

    #[test]
    fn globals_are_folded() {
        let m = gen_ok("const int N = 5; int a = 2 + 3 * N; float b = N / 2; int main() { return a; }");
        assert_eq!(m.global_by_name("N").map(|g| (g.init, g.is_const)), Some((Constant::Int(5), true)));
        assert_eq!(m.global_by_name("a").map(|g| g.init), Some(Constant::Int(17)));
        assert_eq!(m.global_by_name("b").map(|g| g.init), Some(Constant::Float(2.0)));
    }

    #[test]
    fn parameters_are_spilled() {
        let m = gen_ok("int f(int x) { return x; }");
        let k = kinds(&m, "f");
        assert!(matches!(k[0], InstKind::Alloca(Type::I32)));
        assert!(matches!(k[1], InstKind::Store { value: Value::Arg(0), .. }));
        assert!(matches!(k[2], InstKind::Load(_)));
        assert!(matches!(k[3], InstKind::Ret(Some(Value::Inst(_)))));
    }

    #[test]
    fn promotion() {
        let m = gen_ok("float f(int x, float y) { return x + y; }");
        let k = kinds(&m, "f");
        assert!(k.iter().any(|k| matches!(k, InstKind::Cast(CastOp::SIToFP, _))));
        assert!(k.iter().any(|k| matches!(k, InstKind::Binary(BinOp::FAdd, ..))));
    }

    #[test]
    fn short_circuit_phi() {
        let m = gen_ok("int f(int a, int b) { return a && b; }");
        let f = m.function_by_name("f").unwrap();
        let merge = f.block_by_label("land_merge2").expect("merge block");
        let rhs = f.block_by_label("land_rhs1").expect("rhs block");

        let phi = &f.inst(f.block(merge).insts[0]).kind;
        let InstKind::Phi(incoming) = phi else { panic!("expected phi, got {phi:?}") };
        assert_eq!(incoming[0], (Value::Const(Constant::Bool(false)), BlockId(0)));
        assert_eq!(incoming[1].1, rhs);
    }

    #[test]
    fn default_returns() {
        let m = gen_ok("int f() { } void g() { putint(1); } float h(int x) { if (x) return 1; }");
        for (name, ret) in [
            ("f", Some(Value::Const(Constant::Int(0)))),
            ("g", None),
            ("h", Some(Value::Const(Constant::Float(0.0)))),
        ] {
            let f = m.function_by_name(name).unwrap();
            let last = BlockId(f.blocks.len() as u32 - 1);
            assert_eq!(f.terminator(last).map(|t| &t.kind), Some(&InstKind::Ret(ret)), "{name}");
        }
    }

    #[test]
    fn dead_code_after_return() {
        let m = gen_ok("int f() { return 1; return 2; }");
        let f = m.function_by_name("f").unwrap();
        assert!(f.blocks.iter().any(|b| b.label.starts_with("unreachable")));
    }

    #[test]
    fn errors_are_collected() {
        assert_eq!(errs("int main() { return x; }"), vec![IrGenErr::UndefinedVar(String::from("x"))]);
        assert_eq!(errs("int main() { g(); return 0; }"), vec![IrGenErr::UndefinedFun(String::from("g"))]);
        assert_eq!(errs("int a; float a;"), vec![IrGenErr::DuplicateDef(String::from("a"))]);
        assert_eq!(errs("int x; int a = x;"), vec![IrGenErr::NonConstInit(String::from("a"))]);
        assert_eq!(errs("const int N = 1; void f() { N = 2; }"), vec![IrGenErr::AssignToConst(String::from("N"))]);
        assert_eq!(errs("int x; void f() { x(); }"), vec![IrGenErr::NotAFunction(String::from("x"))]);
        assert_eq!(errs("void f() { int y = f; }"), vec![IrGenErr::NotAVariable(String::from("f"))]);
        assert_eq!(
            errs("void f() { putint(1, 2); }"),
            vec![IrGenErr::ArgCount { name: String::from("putint"), expected: 1, found: 2 }]
        );
        assert_eq!(errs("int f() { return putint(1); }"), vec![IrGenErr::VoidValue(String::from("putint"))]);
        assert_eq!(errs("void f() { break; continue; }"), vec![IrGenErr::BreakOutsideLoop, IrGenErr::ContinueOutsideLoop]);
        assert_eq!(errs("void f() { return 1; }"), vec![IrGenErr::ReturnValueInVoid(String::from("f"))]);
        assert_eq!(errs("int f() { return; }"), vec![IrGenErr::MissingReturnValue(String::from("f"))]);
    }

    #[test]
    fn erroneous_module_still_verifies() {
        let (m, errors) = gen("int f(int a) { int b = a + x; if (y || a) b = g(b); while (b) { break; } return b; }");
        assert_eq!(errors.len(), 3);
        assert_eq!(m.verify(), Ok(()));
    }

    #[test]
    fn error_positions() {
        let (_, errors) = gen("int main() {\n  return x;\n}");
        assert_eq!(errors[0].span(), Some(Span::new((1, 9), 1)));
    }

    #[test]
    fn programs_generate() -> TestResult<()> {
        tests().pass_all(|t| t.codegen().map(|_| ()), &[
            "basic",
            "shadowing",
            "while_loops",
            "nested_loops",
            "recursion",
            "mutual_recursion",
            "short_circuit",
            "float_promotion",
            "dead_code",
            "const_locals",
            "empty_functions",
        ])
    }

    #[test]
    fn shadowing_uses_innermost_slot() -> TestResult<()> {
        let m = tests().get("shadowing")?.codegen()?;
        let f = m.function_by_name("main").unwrap();

        let allocas: Vec<_> = f.inst_order()
            .map(|(_, i)| i)
            .filter(|&i| matches!(f.inst(i).kind, InstKind::Alloca(_)))
            .collect();
        let loads: Vec<_> = f.inst_order()
            .filter_map(|(_, i)| match f.inst(i).kind {
                InstKind::Load(p) => Some(p),
                _ => None,
            })
            .collect();

        // the float x inside the block, then the int x for the return
        assert_eq!(allocas.len(), 2);
        assert_eq!(loads, vec![Value::Inst(allocas[1]), Value::Inst(allocas[0])]);
        Ok(())
    }

    #[test]
    fn loop_exits() -> TestResult<()> {
        let m = tests().get("while_loops")?.codegen()?;
        let f = m.function_by_name("main").unwrap();
        let cond = f.block_by_label("while_cond1").expect("while_cond1");
        let end = f.block_by_label("while_end3").expect("while_end3");

        let brs_to = |b| f.inst_order()
            .filter(|&(_, i)| f.inst(i).kind == InstKind::Br(b))
            .count();

        // entry, continue, back edge
        assert_eq!(brs_to(cond), 3);
        // break
        assert_eq!(brs_to(end), 1);
        Ok(())
    }

    #[test]
    fn promotions_in_program() -> TestResult<()> {
        let m = tests().get("float_promotion")?.codegen()?;
        let all: Vec<_> = m.functions.iter()
            .flat_map(|f| f.insts.iter().map(|i| i.kind.clone()))
            .collect();

        assert!(all.iter().any(|k| matches!(k, InstKind::Cast(CastOp::SIToFP, _))));
        assert!(all.iter().any(|k| matches!(k, InstKind::Cast(CastOp::FPToSI, _))));
        assert!(all.iter().any(|k| matches!(k, InstKind::Cast(CastOp::ZExt, _))));
        assert!(all.iter().any(|k| matches!(k, InstKind::Binary(BinOp::FMul, ..))));
        assert!(all.iter().any(|k| matches!(k, InstKind::FCmp(CmpPred::Gt, ..))));
        Ok(())
    }

    #[test]
    fn const_locals_are_folded() -> TestResult<()> {
        let m = tests().get("const_locals")?.codegen()?;
        let f = m.function_by_name("main").unwrap();
        let stored: Vec<_> = f.insts.iter()
            .filter_map(|i| match i.kind {
                InstKind::Store { value: Value::Const(c), .. } => Some(c),
                _ => None,
            })
            .collect();

        assert_eq!(stored, vec![Constant::Int(8), Constant::Int(9)]);
        Ok(())
    }

    #[test]
    fn four_phis() -> TestResult<()> {
        let m = tests().get("short_circuit")?.codegen()?;
        let f = m.function_by_name("f").unwrap();
        let phis = f.insts.iter().filter(|i| matches!(i.kind, InstKind::Phi(_))).count();
        assert_eq!(phis, 4);
        Ok(())
    }

    #[test]
    fn error_programs() -> TestResult<()> {
        let names = |t: &str| -> TestResult<Vec<IrGenErr>> {
            let errs = error_tests().get(t)?.codegen_errors()?;
            Ok(errs.into_iter().map(|e| e.err().clone()).collect())
        };
        let s = String::from;

        assert_eq!(names("undefined")?, vec![IrGenErr::UndefinedVar(s("y")), IrGenErr::UndefinedFun(s("g"))]);
        assert_eq!(names("duplicates")?, vec![
            IrGenErr::DuplicateDef(s("f")),
            IrGenErr::DuplicateDef(s("a")),
            IrGenErr::DuplicateDef(s("p")),
            IrGenErr::DuplicateDef(s("q")),
        ]);
        assert_eq!(names("scope_exit")?, vec![IrGenErr::UndefinedVar(s("inner"))]);
        assert_eq!(names("runtime_redefined")?, vec![IrGenErr::DuplicateDef(s("getint"))]);
        Ok(())
    }
}
