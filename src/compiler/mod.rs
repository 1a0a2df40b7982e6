//! The IR generator, which lowers a C-- AST into SSA-form IR.
//!
//! The IR is a small, LLVM-like language described in [`ir`].
//! It can be generated from an AST via the [`codegen`] function,
//! or using the [`IrGen`] struct directly.
//!
//! Generation does not stop at the first semantic error.
//! Every error is collected, and the module is still produced
//! (with erroneous expressions left out).
//!
//! # Example
//! ```
//! use cmmc::{lexer, parser, compiler};
//!
//! let tokens = lexer::tokenize("int main() { return 1 + 2; }").unwrap();
//! let ast = parser::parse(&tokens).unwrap();
//! let (module, errors) = compiler::codegen(&ast);
//!
//! assert!(errors.is_empty());
//! assert!(module.verify().is_ok());
//! println!("{module}");
//! ```

pub mod ir;
pub mod symtab;
pub mod fold;
mod builder;
mod codegen;

use crate::err::{CmmErr, FullCmmErr};

pub use self::codegen::{codegen, GenIr, IrGen, Typed};

/// A semantic error found during IR generation.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum IrGenErr {
    /// Variable was not declared.
    UndefinedVar(String),
    /// Function was not declared.
    UndefinedFun(String),
    /// Name was already declared in the same scope.
    DuplicateDef(String),
    /// A global initializer could not be evaluated at compile time.
    NonConstInit(String),
    /// Assignment to a `const` variable.
    AssignToConst(String),
    /// A variable was called as a function.
    NotAFunction(String),
    /// A function was used as a variable.
    NotAVariable(String),
    /// A function was called with the wrong number of arguments.
    ArgCount {
        #[allow(missing_docs)]
        name: String,
        #[allow(missing_docs)]
        expected: usize,
        #[allow(missing_docs)]
        found: usize
    },
    /// The result of a `void` function was used as a value.
    VoidValue(String),
    /// `break` outside of a loop.
    BreakOutsideLoop,
    /// `continue` outside of a loop.
    ContinueOutsideLoop,
    /// A `void` function returned a value.
    ReturnValueInVoid(String),
    /// A non-`void` function returned without a value.
    MissingReturnValue(String)
}

impl CmmErr for IrGenErr {
    fn err_name(&self) -> &'static str {
        match self {
            | IrGenErr::UndefinedVar(_)
            | IrGenErr::UndefinedFun(_)
            | IrGenErr::DuplicateDef(_)
            => "name error",

            | IrGenErr::NonConstInit(_)
            | IrGenErr::AssignToConst(_)
            => "const error",

            | IrGenErr::NotAFunction(_)
            | IrGenErr::NotAVariable(_)
            | IrGenErr::ArgCount { .. }
            | IrGenErr::VoidValue(_)
            | IrGenErr::ReturnValueInVoid(_)
            | IrGenErr::MissingReturnValue(_)
            => "type error",

            | IrGenErr::BreakOutsideLoop
            | IrGenErr::ContinueOutsideLoop
            => "syntax error",
        }
    }
}

impl std::fmt::Display for IrGenErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IrGenErr::UndefinedVar(name)       => write!(f, "could not find variable '{name}'"),
            IrGenErr::UndefinedFun(name)       => write!(f, "could not find function '{name}'"),
            IrGenErr::DuplicateDef(name)       => write!(f, "'{name}' is already defined in this scope"),
            IrGenErr::NonConstInit(name)       => write!(f, "initializer of global '{name}' is not constant"),
            IrGenErr::AssignToConst(name)      => write!(f, "cannot assign to constant '{name}'"),
            IrGenErr::NotAFunction(name)       => write!(f, "'{name}' is not a function"),
            IrGenErr::NotAVariable(name)       => write!(f, "function '{name}' cannot be used as a value"),
            IrGenErr::ArgCount { name, expected, found }
                => write!(f, "function '{name}' expects {expected} argument(s), but {found} were given"),
            IrGenErr::VoidValue(name)          => write!(f, "'{name}' returns void and cannot be used as a value"),
            IrGenErr::BreakOutsideLoop         => write!(f, "'break' outside of a loop"),
            IrGenErr::ContinueOutsideLoop      => write!(f, "'continue' outside of a loop"),
            IrGenErr::ReturnValueInVoid(name)  => write!(f, "void function '{name}' cannot return a value"),
            IrGenErr::MissingReturnValue(name) => write!(f, "function '{name}' must return a value"),
        }
    }
}

impl std::error::Error for IrGenErr {}

/// An [`IrGenErr`] with its position.
pub type FullIrGenErr = FullCmmErr<IrGenErr>;
