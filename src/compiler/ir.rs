//! The SSA intermediate representation.
//!
//! A [`Module`] owns its globals and functions.
//! A [`Function`] owns an arena of instructions and a list of [`BasicBlock`]s,
//! and each block holds an ordered list of handles into that arena.
//!
//! Every other reference is a copyable handle ([`Value`], [`BlockId`], [`FuncId`], ...),
//! so the IR never holds references into itself.

use std::fmt::Display;

use crate::err::CmmErr;

macro_rules! define_ids {
    ($($(#[$m:meta])* $name:ident),*) => {
        $(
            $(#[$m])*
            #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
            pub struct $name(pub u32);

            impl $name {
                /// The index of this handle in its arena.
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

define_ids! {
    /// A handle to a function of a [`Module`].
    FuncId,
    /// A handle to a global of a [`Module`].
    GlobalId,
    /// A handle to a basic block of a [`Function`].
    BlockId,
    /// A handle to an instruction of a [`Function`].
    InstId
}

/// The type of an IR value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Type {
    /// No value
    Void,
    /// A boolean
    I1,
    /// A 32-bit signed integer
    I32,
    /// A 32-bit float
    F32,
    /// A pointer to a value of the given type
    Ptr(&'static Type)
}

impl Type {
    /// The type of a pointer to this type.
    pub fn ptr(self) -> Type {
        match self {
            Type::I1  => Type::Ptr(&Type::I1),
            Type::I32 => Type::Ptr(&Type::I32),
            Type::F32 => Type::Ptr(&Type::F32),
            _         => Type::Ptr(&Type::Void),
        }
    }

    /// The type this pointer type points to.
    pub fn pointee(self) -> Option<Type> {
        match self {
            Type::Ptr(t) => Some(*t),
            _ => None,
        }
    }

    /// The zero value of this type (None for `void` and pointers).
    pub fn zero(self) -> Option<Constant> {
        match self {
            Type::I1  => Some(Constant::Bool(false)),
            Type::I32 => Some(Constant::Int(0)),
            Type::F32 => Some(Constant::Float(0.0)),
            Type::Void | Type::Ptr(_) => None,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Void   => f.write_str("void"),
            Type::I1     => f.write_str("i1"),
            Type::I32    => f.write_str("i32"),
            Type::F32    => f.write_str("float"),
            Type::Ptr(t) => write!(f, "{t}*"),
        }
    }
}

/// A constant value.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Constant {
    #[allow(missing_docs)] Bool(bool),
    #[allow(missing_docs)] Int(i32),
    #[allow(missing_docs)] Float(f32)
}

impl Constant {
    /// The type of this constant.
    pub fn ty(self) -> Type {
        match self {
            Constant::Bool(_)  => Type::I1,
            Constant::Int(_)   => Type::I32,
            Constant::Float(_) => Type::F32,
        }
    }

    /// Converts this constant to another scalar type (as `zext`, `sitofp`, `fptosi`, or `!= 0` would).
    pub fn convert(self, to: Type) -> Option<Constant> {
        let c = match (self, to) {
            (c, t) if c.ty() == t => c,
            (Constant::Bool(b),  Type::I32) => Constant::Int(b as i32),
            (Constant::Bool(b),  Type::F32) => Constant::Float(b as i32 as f32),
            (Constant::Int(n),   Type::F32) => Constant::Float(n as f32),
            (Constant::Float(x), Type::I32) => Constant::Int(x as i32),
            (c, Type::I1) => Constant::Bool(c.is_truthy()),
            _ => return None,
        };

        Some(c)
    }

    /// Whether this constant is nonzero.
    pub fn is_truthy(self) -> bool {
        match self {
            Constant::Bool(b)  => b,
            Constant::Int(n)   => n != 0,
            Constant::Float(x) => x != 0.0,
        }
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Bool(b)  => write!(f, "{b}"),
            Constant::Int(n)   => write!(f, "{n}"),
            Constant::Float(x) => write!(f, "{x:?}"),
        }
    }
}

/// An operand of an instruction.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Value {
    /// A constant
    Const(Constant),
    /// The result of an instruction of the current function
    Inst(InstId),
    /// A parameter of the current function
    Arg(u32),
    /// The address of a global
    Global(GlobalId)
}

/// Arithmetic operators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[allow(missing_docs)]
pub enum BinOp {
    Add, Sub, Mul, SDiv, SRem,
    FAdd, FSub, FMul, FDiv, FRem
}

impl BinOp {
    /// The mnemonic of this operator.
    pub fn name(self) -> &'static str {
        match self {
            BinOp::Add  => "add",
            BinOp::Sub  => "sub",
            BinOp::Mul  => "mul",
            BinOp::SDiv => "sdiv",
            BinOp::SRem => "srem",
            BinOp::FAdd => "fadd",
            BinOp::FSub => "fsub",
            BinOp::FMul => "fmul",
            BinOp::FDiv => "fdiv",
            BinOp::FRem => "frem",
        }
    }
}

/// Comparison predicates (signed for integers, ordered for floats).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[allow(missing_docs)]
pub enum CmpPred {
    Eq, Ne, Lt, Gt, Le, Ge
}

impl CmpPred {
    /// The mnemonic of this predicate in an `icmp`.
    pub fn int_name(self) -> &'static str {
        match self {
            CmpPred::Eq => "eq",
            CmpPred::Ne => "ne",
            CmpPred::Lt => "slt",
            CmpPred::Gt => "sgt",
            CmpPred::Le => "sle",
            CmpPred::Ge => "sge",
        }
    }

    /// The mnemonic of this predicate in an `fcmp`.
    pub fn float_name(self) -> &'static str {
        match self {
            CmpPred::Eq => "oeq",
            CmpPred::Ne => "one",
            CmpPred::Lt => "olt",
            CmpPred::Gt => "ogt",
            CmpPred::Le => "ole",
            CmpPred::Ge => "oge",
        }
    }
}

/// Conversions between scalar types.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CastOp {
    /// `i1` to `i32`
    ZExt,
    /// `i32` to `float`
    SIToFP,
    /// `float` to `i32`
    FPToSI
}

impl CastOp {
    /// The mnemonic of this conversion.
    pub fn name(self) -> &'static str {
        match self {
            CastOp::ZExt   => "zext",
            CastOp::SIToFP => "sitofp",
            CastOp::FPToSI => "fptosi",
        }
    }
}

/// What an instruction does.
#[derive(Clone, PartialEq, Debug)]
pub enum InstKind {
    /// Reserves a stack slot of the given type
    Alloca(Type),
    /// Reads through a pointer
    Load(Value),
    /// Writes a value through a pointer
    Store {
        #[allow(missing_docs)] value: Value,
        #[allow(missing_docs)] ptr: Value
    },
    /// Arithmetic
    Binary(BinOp, Value, Value),
    /// Integer comparison
    ICmp(CmpPred, Value, Value),
    /// Float comparison
    FCmp(CmpPred, Value, Value),
    /// Scalar conversion
    Cast(CastOp, Value),
    /// A function call
    Call {
        #[allow(missing_docs)] callee: FuncId,
        #[allow(missing_docs)] args: Vec<Value>
    },
    /// Selects a value depending on the predecessor block
    Phi(Vec<(Value, BlockId)>),
    /// Unconditional branch
    Br(BlockId),
    /// Conditional branch
    CondBr {
        #[allow(missing_docs)] cond: Value,
        #[allow(missing_docs)] then: BlockId,
        #[allow(missing_docs)] els: BlockId
    },
    /// Function return
    Ret(Option<Value>)
}

impl InstKind {
    /// Whether this instruction ends a block.
    pub fn is_terminator(&self) -> bool {
        matches!(self, InstKind::Br(_) | InstKind::CondBr { .. } | InstKind::Ret(_))
    }

    /// The blocks this instruction can branch to.
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            InstKind::Br(b) => vec![*b],
            InstKind::CondBr { then, els, .. } => vec![*then, *els],
            _ => vec![],
        }
    }

    /// The values this instruction reads.
    pub fn operands(&self) -> Vec<Value> {
        match self {
            InstKind::Alloca(_) | InstKind::Br(_) | InstKind::Ret(None) => vec![],
            InstKind::Load(p) => vec![*p],
            InstKind::Store { value, ptr } => vec![*value, *ptr],
            InstKind::Binary(_, l, r) | InstKind::ICmp(_, l, r) | InstKind::FCmp(_, l, r) => vec![*l, *r],
            InstKind::Cast(_, v) => vec![*v],
            InstKind::Call { args, .. } => args.clone(),
            InstKind::Phi(incoming) => incoming.iter().map(|&(v, _)| v).collect(),
            InstKind::CondBr { cond, .. } => vec![*cond],
            InstKind::Ret(Some(v)) => vec![*v],
        }
    }
}

/// An instruction and the type of its result (`void` if it has none).
#[derive(Clone, PartialEq, Debug)]
pub struct Inst {
    #[allow(missing_docs)]
    pub kind: InstKind,
    #[allow(missing_docs)]
    pub ty: Type
}

/// A straight-line sequence of instructions ending in a terminator.
#[derive(Clone, PartialEq, Debug)]
pub struct BasicBlock {
    /// The label of the block, unique within its function
    pub label: String,
    /// The instructions of the block, in order
    pub insts: Vec<InstId>
}

/// A function parameter.
#[derive(Clone, PartialEq, Debug)]
pub struct Param {
    #[allow(missing_docs)]
    pub name: String,
    #[allow(missing_docs)]
    pub ty: Type
}

/// A function, or the declaration of an external one.
#[derive(Clone, PartialEq, Debug)]
pub struct Function {
    #[allow(missing_docs)]
    pub name: String,
    /// The return type
    pub ret: Type,
    #[allow(missing_docs)]
    pub params: Vec<Param>,
    /// The blocks, in layout order (the first is the entry block)
    pub blocks: Vec<BasicBlock>,
    /// The instruction arena
    pub insts: Vec<Inst>,
    /// Whether this function has no body
    pub is_declaration: bool
}

impl Function {
    /// A function declaration with no body.
    pub fn declaration(name: impl Into<String>, ret: Type, params: Vec<Param>) -> Self {
        Function {
            name: name.into(),
            ret,
            params,
            blocks: vec![],
            insts: vec![],
            is_declaration: true
        }
    }

    /// The instruction with the given handle.
    pub fn inst(&self, id: InstId) -> &Inst {
        &self.insts[id.index()]
    }

    /// The block with the given handle.
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    /// Finds a block by label.
    pub fn block_by_label(&self, label: &str) -> Option<BlockId> {
        self.blocks.iter()
            .position(|b| b.label == label)
            .map(|i| BlockId(i as u32))
    }

    /// The terminator of a block, if it has one.
    pub fn terminator(&self, id: BlockId) -> Option<&Inst> {
        self.block(id).insts.last()
            .map(|&i| self.inst(i))
            .filter(|i| i.kind.is_terminator())
    }

    /// The blocks that branch to the given block.
    pub fn predecessors(&self, id: BlockId) -> Vec<BlockId> {
        (0..self.blocks.len())
            .map(|i| BlockId(i as u32))
            .filter(|&b| {
                self.terminator(b).map_or(false, |t| t.kind.successors().contains(&id))
            })
            .collect()
    }

    /// The instructions of the function in layout order, with the block they belong to.
    pub fn inst_order(&self) -> impl Iterator<Item=(BlockId, InstId)> + '_ {
        self.blocks.iter()
            .enumerate()
            .flat_map(|(b, block)| block.insts.iter().map(move |&i| (BlockId(b as u32), i)))
    }

    /// The type of a value used in this function.
    pub fn value_type(&self, v: Value, module: &Module) -> Type {
        match v {
            Value::Const(c) => c.ty(),
            Value::Inst(i) => self.inst(i).ty,
            Value::Arg(a) => self.params.get(a as usize).map_or(Type::Void, |p| p.ty),
            Value::Global(g) => module.globals.get(g.index()).map_or(Type::Void, |g| g.ty.ptr()),
        }
    }
}

/// A global variable or constant.
#[derive(Clone, PartialEq, Debug)]
pub struct Global {
    #[allow(missing_docs)]
    pub name: String,
    /// The type of the value (the global itself is a pointer to it)
    pub ty: Type,
    /// The initial value
    pub init: Constant,
    /// Whether the global is a constant
    pub is_const: bool
}

/// A translation unit of IR.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Module {
    #[allow(missing_docs)]
    pub globals: Vec<Global>,
    #[allow(missing_docs)]
    pub functions: Vec<Function>
}

impl Module {
    /// The function with the given handle.
    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.index()]
    }

    /// Finds a function by name.
    pub fn function_by_name(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Finds a global by name.
    pub fn global_by_name(&self, name: &str) -> Option<&Global> {
        self.globals.iter().find(|g| g.name == name)
    }

    /// Checks the structural invariants of the module:
    /// - every block of a defined function ends in exactly one terminator, and no instruction follows it,
    /// - every operand refers to an instruction placed in the function, a parameter, or a global,
    /// - phis are at the start of their block, and their incoming blocks are predecessors,
    /// - every branch target and callee exists.
    pub fn verify(&self) -> Result<(), VerifyErr> {
        for f in self.functions.iter().filter(|f| !f.is_declaration) {
            let err = |msg: String| VerifyErr { function: f.name.clone(), msg };

            if f.blocks.is_empty() {
                return Err(err(String::from("function has no blocks")));
            }

            let mut placed = vec![false; f.insts.len()];
            for (_, i) in f.inst_order() {
                match placed.get_mut(i.index()) {
                    Some(p) if !*p => *p = true,
                    _ => return Err(err(format!("instruction {} is placed twice or does not exist", i.0))),
                }
            }

            for (b, block) in f.blocks.iter().enumerate() {
                let b = BlockId(b as u32);
                let Some((&last, body)) = block.insts.split_last() else {
                    return Err(err(format!("block {} is empty", block.label)));
                };
                if !f.inst(last).kind.is_terminator() {
                    return Err(err(format!("block {} does not end in a terminator", block.label)));
                }
                if body.iter().any(|&i| f.inst(i).kind.is_terminator()) {
                    return Err(err(format!("block {} has an instruction after its terminator", block.label)));
                }

                let mut in_phis = true;
                for &i in &block.insts {
                    let inst = f.inst(i);

                    for v in inst.kind.operands() {
                        let ok = match v {
                            Value::Const(_)  => true,
                            Value::Inst(d)   => placed.get(d.index()).copied().unwrap_or(false) && f.inst(d).ty != Type::Void,
                            Value::Arg(a)    => (a as usize) < f.params.len(),
                            Value::Global(g) => g.index() < self.globals.len(),
                        };
                        if !ok {
                            return Err(err(format!("block {} uses an undefined value", block.label)));
                        }
                    }

                    if inst.kind.successors().iter().any(|s| s.index() >= f.blocks.len()) {
                        return Err(err(format!("block {} branches to a missing block", block.label)));
                    }
                    if let InstKind::Call { callee, .. } = inst.kind {
                        if callee.index() >= self.functions.len() {
                            return Err(err(format!("block {} calls a missing function", block.label)));
                        }
                    }

                    match &inst.kind {
                        InstKind::Phi(incoming) => {
                            if !in_phis {
                                return Err(err(format!("phi in block {} is not at the start", block.label)));
                            }
                            let preds = f.predecessors(b);
                            if incoming.iter().any(|(_, from)| !preds.contains(from)) {
                                return Err(err(format!("phi in block {} has a non-predecessor incoming block", block.label)));
                            }
                        },
                        _ => in_phis = false,
                    }
                }
            }
        }

        Ok(())
    }
}

/// A violated structural invariant of a [`Module`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct VerifyErr {
    /// The function the violation is in
    pub function: String,
    /// What is wrong
    pub msg: String
}

impl CmmErr for VerifyErr {
    fn err_name(&self) -> &'static str {
        "ir error"
    }
}

impl Display for VerifyErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "in @{}: {}", self.function, self.msg)
    }
}

impl std::error::Error for VerifyErr {}

#[cfg(test)]
mod tests {
    use super::*;

    fn ret_function(blocks: Vec<BasicBlock>, insts: Vec<Inst>) -> Module {
        Module {
            globals: vec![],
            functions: vec![Function {
                name: String::from("f"),
                ret: Type::I32,
                params: vec![],
                blocks,
                insts,
                is_declaration: false
            }]
        }
    }

    fn block(label: &str, insts: &[u32]) -> BasicBlock {
        BasicBlock { label: label.to_string(), insts: insts.iter().map(|&i| InstId(i)).collect() }
    }

    fn inst(kind: InstKind, ty: Type) -> Inst {
        Inst { kind, ty }
    }

    #[test]
    fn constant_conversions() {
        assert_eq!(Constant::Int(3).convert(Type::F32), Some(Constant::Float(3.0)));
        assert_eq!(Constant::Float(-2.75).convert(Type::I32), Some(Constant::Int(-2)));
        assert_eq!(Constant::Bool(true).convert(Type::I32), Some(Constant::Int(1)));
        assert_eq!(Constant::Float(0.0).convert(Type::I1), Some(Constant::Bool(false)));
        assert_eq!(Constant::Int(1).convert(Type::Void), None);
        assert_eq!(Type::I32.ptr().to_string(), "i32*");
        assert_eq!(Type::F32.ptr().pointee(), Some(Type::F32));
    }

    #[test]
    fn verify_accepts_well_formed() {
        let m = ret_function(
            vec![block("entry", &[0]), block("next", &[1])],
            vec![
                inst(InstKind::Br(BlockId(1)), Type::Void),
                inst(InstKind::Ret(Some(Value::Const(Constant::Int(0)))), Type::Void),
            ]
        );
        assert_eq!(m.verify(), Ok(()));
        assert_eq!(m.functions[0].predecessors(BlockId(1)), vec![BlockId(0)]);
    }

    #[test]
    fn verify_rejects_missing_terminator() {
        let m = ret_function(
            vec![block("entry", &[0])],
            vec![inst(InstKind::Alloca(Type::I32), Type::I32.ptr())]
        );
        assert!(m.verify().is_err());
    }

    #[test]
    fn verify_rejects_code_after_terminator() {
        let m = ret_function(
            vec![block("entry", &[0, 1])],
            vec![
                inst(InstKind::Ret(None), Type::Void),
                inst(InstKind::Ret(None), Type::Void),
            ]
        );
        assert!(m.verify().is_err());
    }

    #[test]
    fn verify_rejects_bad_phi() {
        let m = ret_function(
            vec![block("entry", &[0, 1])],
            vec![
                inst(InstKind::Phi(vec![(Value::Const(Constant::Bool(true)), BlockId(0))]), Type::I1),
                inst(InstKind::Ret(Some(Value::Inst(InstId(0)))), Type::Void),
            ]
        );
        let err = m.verify().unwrap_err();
        assert!(err.msg.contains("non-predecessor"), "{err}");
    }
}
