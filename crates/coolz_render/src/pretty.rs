// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

//! Indented human-readable dump. Classes and features get one line each;
//! expressions print inline except for the structured control forms.

use std::fmt::Write;

use coolz_frontend::ast::{Class, Expr, Feature, Program};

pub fn to_pretty(program: &Program) -> String {
    let mut out = String::from("Program\n");
    for class in &program.classes {
        class_line(&mut out, class, 1);
    }
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("  ");
    }
}

fn class_line(out: &mut String, class: &Class, level: usize) {
    indent(out, level);
    match &class.parent {
        Some(parent) => {
            let _ = writeln!(out, "Class {} inherits {parent}", class.name);
        }
        None => {
            let _ = writeln!(out, "Class {}", class.name);
        }
    }
    for feature in &class.features {
        feature_line(out, feature, level + 1);
    }
}

fn feature_line(out: &mut String, feature: &Feature, level: usize) {
    indent(out, level);
    match feature {
        Feature::Attr { name, ty, init } => {
            let _ = write!(out, "Attribute {name}: {ty}");
            if let Some(init) = init {
                out.push_str(" <- ");
                expr_inline(out, init);
            }
            out.push('\n');
        }
        Feature::Method {
            name,
            formals,
            ret_type,
            body,
        } => {
            let _ = write!(out, "Method {name}(");
            for (i, formal) in formals.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{}: {}", formal.name, formal.ty);
            }
            let _ = writeln!(out, "): {ret_type}");
            expr_block(out, body, level + 1);
        }
    }
}

fn expr_block(out: &mut String, expr: &Expr, level: usize) {
    match expr {
        Expr::If { cond, then_, else_ } => {
            indent(out, level);
            out.push_str("if ");
            expr_inline(out, cond);
            out.push_str(" then\n");
            expr_block(out, then_, level + 1);
            indent(out, level);
            out.push_str("else\n");
            expr_block(out, else_, level + 1);
            indent(out, level);
            out.push_str("fi\n");
        }

        Expr::While { cond, body } => {
            indent(out, level);
            out.push_str("while ");
            expr_inline(out, cond);
            out.push_str(" loop\n");
            expr_block(out, body, level + 1);
            indent(out, level);
            out.push_str("pool\n");
        }

        Expr::Block(exprs) => {
            indent(out, level);
            out.push_str("{\n");
            for e in exprs {
                expr_block(out, e, level + 1);
            }
            indent(out, level);
            out.push_str("}\n");
        }

        Expr::Let { bindings, body } => {
            indent(out, level);
            out.push_str("let ");
            for (i, binding) in bindings.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{}: {}", binding.name, binding.ty);
                if let Some(init) = &binding.init {
                    out.push_str(" <- ");
                    expr_inline(out, init);
                }
            }
            out.push_str(" in\n");
            expr_block(out, body, level + 1);
        }

        Expr::Case { expr, arms } => {
            indent(out, level);
            out.push_str("case ");
            expr_inline(out, expr);
            out.push_str(" of\n");
            for arm in arms {
                indent(out, level + 1);
                let _ = write!(out, "{}: {} => ", arm.name, arm.ty);
                expr_inline(out, &arm.expr);
                out.push('\n');
            }
            indent(out, level);
            out.push_str("esac\n");
        }

        other => {
            indent(out, level);
            expr_inline(out, other);
            out.push('\n');
        }
    }
}

fn expr_inline(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Int(n) => {
            let _ = write!(out, "{n}");
        }
        Expr::Str(s) => {
            let _ = write!(out, "{s:?}");
        }
        Expr::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Expr::Id(name) => out.push_str(name),
        Expr::Self_ => out.push_str("self"),
        Expr::New(ty) => {
            let _ = write!(out, "new {ty}");
        }
        Expr::Paren(inner) => {
            out.push('(');
            expr_inline(out, inner);
            out.push(')');
        }

        Expr::Assign { name, expr } => {
            out.push_str(name);
            out.push_str(" <- ");
            expr_inline(out, expr);
        }

        Expr::Bin { op, lhs, rhs } => {
            out.push('(');
            expr_inline(out, lhs);
            let _ = write!(out, " {op} ");
            expr_inline(out, rhs);
            out.push(')');
        }

        Expr::Not(inner) => {
            out.push_str("not ");
            expr_inline(out, inner);
        }
        Expr::Neg(inner) => {
            out.push_str("~ ");
            expr_inline(out, inner);
        }
        Expr::IsVoid(inner) => {
            out.push_str("isvoid ");
            expr_inline(out, inner);
        }

        Expr::Dispatch {
            recv,
            static_type,
            method,
            args,
        } => {
            match (recv.as_ref(), static_type) {
                (Expr::Self_, None) => {}
                (_, None) => {
                    expr_inline(out, recv);
                    out.push('.');
                }
                (_, Some(st)) => {
                    expr_inline(out, recv);
                    let _ = write!(out, "@{st}.");
                }
            }
            out.push_str(method);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                expr_inline(out, arg);
            }
            out.push(')');
        }

        // Structured forms that end up inline, e.g. inside an argument
        // list, fall back to the compact canonical shape.
        other => out.push_str(&crate::canonical::canonical_expr(other)),
    }
}
