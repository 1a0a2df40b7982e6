//! Appends instructions to a function under construction.

use super::ir::*;

/// Where `break` and `continue` statements in a loop body branch to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(super) struct LoopExits {
    pub cont: BlockId,
    pub brk: BlockId
}

/// Builds the body of one function.
///
/// Instructions are appended at the end of the current block.
/// Once that block has a terminator, the next instruction opens a fresh `unreachable` block,
/// so code after a `return`, `break`, or `continue` never lands after a terminator.
pub(super) struct FnBuilder {
    func: Function,
    cursor: BlockId,
    allocas: usize,
    labels: usize,
    loops: Vec<LoopExits>
}

impl FnBuilder {
    /// Starts a function with an empty `entry` block.
    pub fn new(name: &str, ret: Type, params: Vec<Param>) -> Self {
        let mut func = Function::declaration(name, ret, params);
        func.is_declaration = false;
        func.blocks.push(BasicBlock { label: String::from("entry"), insts: vec![] });

        FnBuilder { func, cursor: BlockId(0), allocas: 0, labels: 0, loops: vec![] }
    }

    /// The function being built.
    pub fn func(&self) -> &Function {
        &self.func
    }

    /// Adds a new block at the end of the function, labeled `{base}{n}`.
    pub fn append_block(&mut self, base: &str) -> BlockId {
        self.labels += 1;
        let id = BlockId(self.func.blocks.len() as u32);
        self.func.blocks.push(BasicBlock { label: format!("{base}{}", self.labels), insts: vec![] });
        id
    }

    /// Moves the cursor to the end of a block.
    pub fn position_at_end(&mut self, block: BlockId) {
        self.cursor = block;
    }

    /// The block instructions are currently appended to.
    pub fn insert_block(&self) -> BlockId {
        self.cursor
    }

    /// Whether the current block already ends in a terminator.
    pub fn is_terminated(&self) -> bool {
        self.func.terminator(self.cursor).is_some()
    }

    fn new_inst(&mut self, kind: InstKind, ty: Type) -> InstId {
        let id = InstId(self.func.insts.len() as u32);
        self.func.insts.push(Inst { kind, ty });
        id
    }

    /// Makes sure the current block can take more instructions,
    /// moving to a fresh `unreachable` block if it is already terminated.
    pub fn ensure_open(&mut self) {
        if self.is_terminated() {
            let dead = self.append_block("unreachable");
            self.position_at_end(dead);
        }
    }

    fn push(&mut self, kind: InstKind, ty: Type) -> Value {
        self.ensure_open();

        let id = self.new_inst(kind, ty);
        self.func.blocks[self.cursor.index()].insts.push(id);
        Value::Inst(id)
    }

    /// Reserves a stack slot. Slots are placed at the top of the entry block.
    pub fn build_alloca(&mut self, ty: Type) -> Value {
        let id = self.new_inst(InstKind::Alloca(ty), ty.ptr());
        self.func.blocks[0].insts.insert(self.allocas, id);
        self.allocas += 1;
        Value::Inst(id)
    }

    pub fn build_load(&mut self, ptr: Value, ty: Type) -> Value {
        self.push(InstKind::Load(ptr), ty)
    }

    pub fn build_store(&mut self, value: Value, ptr: Value) {
        self.push(InstKind::Store { value, ptr }, Type::Void);
    }

    pub fn build_binary(&mut self, op: BinOp, l: Value, r: Value, ty: Type) -> Value {
        self.push(InstKind::Binary(op, l, r), ty)
    }

    /// Compares two values of the given operand type (`icmp` for integers, `fcmp` for floats).
    pub fn build_cmp(&mut self, pred: CmpPred, l: Value, r: Value, operand_ty: Type) -> Value {
        let kind = match operand_ty {
            Type::F32 => InstKind::FCmp(pred, l, r),
            _ => InstKind::ICmp(pred, l, r),
        };
        self.push(kind, Type::I1)
    }

    pub fn build_cast(&mut self, op: CastOp, v: Value, to: Type) -> Value {
        self.push(InstKind::Cast(op, v), to)
    }

    pub fn build_call(&mut self, callee: FuncId, args: Vec<Value>, ret: Type) -> Value {
        self.push(InstKind::Call { callee, args }, ret)
    }

    pub fn build_phi(&mut self, ty: Type, incoming: Vec<(Value, BlockId)>) -> Value {
        self.push(InstKind::Phi(incoming), ty)
    }

    pub fn build_br(&mut self, target: BlockId) {
        self.push(InstKind::Br(target), Type::Void);
    }

    pub fn build_cond_br(&mut self, cond: Value, then: BlockId, els: BlockId) {
        self.push(InstKind::CondBr { cond, then, els }, Type::Void);
    }

    pub fn build_ret(&mut self, v: Option<Value>) {
        self.push(InstKind::Ret(v), Type::Void);
    }

    /// Enters a loop body.
    pub fn push_loop(&mut self, exits: LoopExits) {
        self.loops.push(exits);
    }

    /// Leaves the innermost loop body.
    pub fn pop_loop(&mut self) {
        self.loops.pop();
    }

    /// The exits of the innermost loop, if in one.
    pub fn loop_exits(&self) -> Option<LoopExits> {
        self.loops.last().copied()
    }

    /// Finishes the function, terminating every block that is still open with the default return.
    pub fn finish(mut self) -> Function {
        let default = self.func.ret.zero().map(Value::Const);

        for b in 0..self.func.blocks.len() {
            let b = BlockId(b as u32);
            if self.func.terminator(b).is_none() {
                let id = self.new_inst(InstKind::Ret(default), Type::Void);
                self.func.blocks[b.index()].insts.push(id);
            }
        }

        self.func
    }
}
