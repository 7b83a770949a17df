// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

//! Canonical source form: every compound expression is printed fully
//! parenthesized, so the text re-parses to a tree with the same canonical
//! form. Grouping nodes are transparent here, which is what makes the
//! printer idempotent under a parse round-trip.

use std::fmt::Write;

use coolz_frontend::ast::{Class, Expr, Feature, Program};

pub fn canonical_program(program: &Program) -> String {
    let mut out = String::new();
    for class in &program.classes {
        write_class(&mut out, class);
    }
    out
}

fn write_class(out: &mut String, class: &Class) {
    match &class.parent {
        Some(parent) => {
            let _ = writeln!(out, "class {} inherits {} {{", class.name, parent);
        }
        None => {
            let _ = writeln!(out, "class {} {{", class.name);
        }
    }
    for feature in &class.features {
        let _ = writeln!(out, "  {};", canonical_feature(feature));
    }
    out.push_str("};\n");
}

fn canonical_feature(feature: &Feature) -> String {
    match feature {
        Feature::Attr { name, ty, init } => match init {
            Some(init) => format!("{name} : {ty} <- {}", canonical_expr(init)),
            None => format!("{name} : {ty}"),
        },
        Feature::Method {
            name,
            formals,
            ret_type,
            body,
        } => {
            let formals = formals
                .iter()
                .map(|f| format!("{} : {}", f.name, f.ty))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "{name}({formals}) : {ret_type} {{ {} }}",
                canonical_expr(body)
            )
        }
    }
}

pub fn canonical_expr(expr: &Expr) -> String {
    match expr {
        Expr::Int(n) => n.to_string(),
        Expr::Str(s) => quote(s),
        Expr::Bool(b) => b.to_string(),
        Expr::Id(name) => name.clone(),
        Expr::Self_ => "self".to_string(),

        // Grouping carries no meaning of its own.
        Expr::Paren(inner) => canonical_expr(inner),

        Expr::Assign { name, expr } => {
            format!("({name} <- {})", canonical_expr(expr))
        }

        Expr::Not(inner) => format!("(not {})", canonical_expr(inner)),
        Expr::Neg(inner) => format!("(~ {})", canonical_expr(inner)),
        Expr::IsVoid(inner) => format!("(isvoid {})", canonical_expr(inner)),

        Expr::Bin { op, lhs, rhs } => {
            format!("({} {op} {})", canonical_expr(lhs), canonical_expr(rhs))
        }

        Expr::New(ty) => format!("new {ty}"),

        Expr::If { cond, then_, else_ } => format!(
            "if {} then {} else {} fi",
            canonical_expr(cond),
            canonical_expr(then_),
            canonical_expr(else_)
        ),

        Expr::While { cond, body } => format!(
            "while {} loop {} pool",
            canonical_expr(cond),
            canonical_expr(body)
        ),

        Expr::Block(exprs) => {
            let mut out = String::from("{ ");
            for e in exprs {
                let _ = write!(out, "{}; ", canonical_expr(e));
            }
            out.push('}');
            out
        }

        Expr::Let { bindings, body } => {
            let bindings = bindings
                .iter()
                .map(|b| match &b.init {
                    Some(init) => {
                        format!("{} : {} <- {}", b.name, b.ty, canonical_expr(init))
                    }
                    None => format!("{} : {}", b.name, b.ty),
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("let {bindings} in {}", canonical_expr(body))
        }

        Expr::Case { expr, arms } => {
            let mut out = format!("case {} of ", canonical_expr(expr));
            for arm in arms {
                let _ = write!(
                    out,
                    "{} : {} => {}; ",
                    arm.name,
                    arm.ty,
                    canonical_expr(&arm.expr)
                );
            }
            out.push_str("esac");
            out
        }

        Expr::Dispatch {
            recv,
            static_type,
            method,
            args,
        } => {
            let args = args
                .iter()
                .map(canonical_expr)
                .collect::<Vec<_>>()
                .join(", ");
            // An implicit-self call prints without a receiver, which is how
            // the parser rebuilds it.
            match (recv.as_ref(), static_type) {
                (Expr::Self_, None) => format!("{method}({args})"),
                (_, None) => format!("{}.{method}({args})", canonical_expr(recv)),
                (_, Some(st)) => {
                    format!("{}@{st}.{method}({args})", canonical_expr(recv))
                }
            }
        }
    }
}

// COOL string syntax: the lexer folds these escapes back to the same chars.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
