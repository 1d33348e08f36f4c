//! Helium Core Library
//!
//! This crate provides the frontend of the Helium scripting language:
//! lexing, parsing, the AST and its diagnostic printer, plus a small
//! tree-walking interpreter.

pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod span;

pub use ast::*;
pub use config::{Config, ConfigError};
pub use diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics};
pub use interpreter::{Interpreter, RuntimeError, Value};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use printer::AstPrinter;
pub use span::Span;
