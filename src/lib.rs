#![warn(missing_docs)]

//! A compiler front end for C--, a small subset of C.
//!
//! # Parsing
//!
//! Parsing of a string to an abstract syntax tree (AST) is done
//! with the [`lexer`] and [`parser`] modules.
//!
//! These modules provide:
//! - [`tokenize`][`lexer::tokenize`]: A function that processes strings into sequences of tokens.
//! - [`parse`][`parser::parse`]: A function that processes sequences of tokens into an AST,
//!     using SLR(1) tables built from the [`grammar`].
//! - [`ast`]: The components of the AST.
//!
//! # Compiling
//!
//! The AST is lowered into an SSA-form IR, which prints in an LLVM-like text form.
//! See the [`compiler`] module for more info.
//!
//! This module provides:
//! - [`codegen`][`compiler::codegen`]: Generates the IR of a program, collecting semantic errors.
//! - [`ir`][`compiler::ir`]: The components of the IR.
//!
//! # Example
//! ```
//! use cmmc::{lexer, parser, compiler};
//!
//! let src = "int a = 10; int main() { a = a + 5; return a; }";
//! let tokens = lexer::tokenize(src).unwrap();
//! let ast = parser::parse(&tokens).unwrap();
//! let (module, errors) = compiler::codegen(&ast);
//!
//! assert!(errors.is_empty());
//! assert!(module.to_string().contains("@a = global i32 10"));
//! ```

pub mod lexer;
pub mod grammar;
pub mod parser;
pub mod ast;

pub mod compiler;
pub mod err;

#[cfg(test)]
mod test_utils;
mod display;
