// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

pub mod ast;
pub mod diag;
pub mod lexer;
pub mod parser;
pub mod semant;
pub mod token;

pub use ast::*;
pub use diag::Diagnostic;
pub use lexer::{lex, Lexer, Token, TokenKind};
pub use parser::parse_program;
pub use semant::{analyze, ClassTable, SemanticAnalyzer, TypeRef};
pub use token::Tok;
