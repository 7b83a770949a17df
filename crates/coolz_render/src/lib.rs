// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

//! Read-only AST renderers: canonical source text, GraphViz DOT, an
//! indented pretty-print, and JSON. No validation, no mutation.

pub mod canonical;
pub mod dot;
pub mod json;
pub mod pretty;

pub use canonical::{canonical_expr, canonical_program};
pub use dot::to_dot;
pub use json::to_json;
pub use pretty::to_pretty;
