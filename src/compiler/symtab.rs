//! Lexically scoped name bindings.

use indexmap::IndexMap;

use super::ir::{Constant, FuncId, Type, Value};

/// What a name is bound to.
#[derive(Clone, PartialEq, Debug)]
pub enum Binding {
    /// A variable or constant, accessed through a pointer.
    Var {
        /// The address of the variable (an `alloca` or a global)
        ptr: Value,
        /// The type of the variable
        ty: Type,
        /// Whether the variable is `const`
        is_const: bool,
        /// The value of a `const` variable, if it could be folded
        value: Option<Constant>
    },

    /// A function.
    Func {
        #[allow(missing_docs)]
        id: FuncId,
        /// The return type
        ret: Type,
        /// The parameter types
        params: Vec<Type>
    }
}

/// A stack of scopes, innermost last.
///
/// The outermost (global) scope is always present.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<IndexMap<String, Binding>>
}

impl SymbolTable {
    /// A table with only the global scope.
    pub fn new() -> Self {
        SymbolTable { scopes: vec![IndexMap::new()] }
    }

    /// Opens a new innermost scope.
    pub fn enter_scope(&mut self) {
        self.scopes.push(IndexMap::new());
    }

    /// Closes the innermost scope, dropping its bindings.
    /// The global scope is never closed.
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// How many scopes are open (1 at global level).
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Whether only the global scope is open.
    pub fn is_global(&self) -> bool {
        self.depth() == 1
    }

    /// Binds a name in the innermost scope.
    ///
    /// If the name is already bound in that scope, nothing changes and this returns false.
    /// Names in outer scopes are shadowed.
    pub fn insert(&mut self, name: &str, binding: Binding) -> bool {
        let Some(scope) = self.scopes.last_mut() else { return false };

        match scope.contains_key(name) {
            true  => false,
            false => {
                scope.insert(name.to_string(), binding);
                true
            }
        }
    }

    /// Whether the name is bound in the innermost scope (where it cannot be bound again).
    pub fn declared_here(&self, name: &str) -> bool {
        self.scopes.last().is_some_and(|s| s.contains_key(name))
    }

    /// Finds the innermost binding of a name.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter()
            .rev()
            .find_map(|s| s.get(name))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
