// Copyright 2025 Diivanand Ramalingam
// Licensed under the Apache License, Version 2.0

//! GraphViz DOT output. One node per AST node, edges labeled with the
//! child's role where the role is not obvious from position.

use std::fmt::Write;

use coolz_frontend::ast::{Class, Expr, Feature, Program};

pub fn to_dot(program: &Program) -> String {
    let mut dot = Dot::default();
    let root = dot.node("Program");
    for class in &program.classes {
        let child = dot.class(class);
        dot.edge(root, child, None);
    }
    let mut out = String::from("digraph AST {\n");
    out.push_str(&dot.body);
    out.push_str("}\n");
    out
}

#[derive(Default)]
struct Dot {
    body: String,
    next: usize,
}

impl Dot {
    fn node(&mut self, label: &str) -> usize {
        let id = self.next;
        self.next += 1;
        let _ = writeln!(self.body, "  n{id} [label=\"{}\"];", escape(label));
        id
    }

    fn edge(&mut self, from: usize, to: usize, label: Option<&str>) {
        match label {
            Some(label) => {
                let _ = writeln!(self.body, "  n{from} -> n{to} [label=\"{label}\"];");
            }
            None => {
                let _ = writeln!(self.body, "  n{from} -> n{to};");
            }
        }
    }

    fn class(&mut self, class: &Class) -> usize {
        let label = match &class.parent {
            Some(parent) => format!("Class\n{}\ninherits {parent}", class.name),
            None => format!("Class\n{}", class.name),
        };
        let id = self.node(&label);
        for feature in &class.features {
            let child = self.feature(feature);
            self.edge(id, child, None);
        }
        id
    }

    fn feature(&mut self, feature: &Feature) -> usize {
        match feature {
            Feature::Attr { name, ty, init } => {
                let id = self.node(&format!("Attribute\n{name}:{ty}"));
                if let Some(init) = init {
                    let child = self.expr(init);
                    self.edge(id, child, None);
                }
                id
            }
            Feature::Method {
                name,
                formals,
                ret_type,
                body,
            } => {
                let id = self.node(&format!("Method\n{name}\n{ret_type}"));
                for formal in formals {
                    let child = self.node(&format!("Formal\n{}:{}", formal.name, formal.ty));
                    self.edge(id, child, None);
                }
                let child = self.expr(body);
                self.edge(id, child, None);
                id
            }
        }
    }

    fn expr(&mut self, expr: &Expr) -> usize {
        match expr {
            Expr::Int(n) => self.node(&format!("Int\n{n}")),
            Expr::Str(s) => self.node(&format!("String\n\"{s}\"")),
            Expr::Bool(b) => self.node(&format!("Bool\n{b}")),
            Expr::Id(name) => self.node(&format!("Id\n{name}")),
            Expr::Self_ => self.node("self"),
            Expr::New(ty) => self.node(&format!("new {ty}")),
            Expr::Paren(inner) => self.expr(inner),

            Expr::Assign { name, expr } => {
                let id = self.node("<-");
                let lhs = self.node(&format!("Id\n{name}"));
                self.edge(id, lhs, Some("left"));
                let rhs = self.expr(expr);
                self.edge(id, rhs, Some("right"));
                id
            }

            Expr::Bin { op, lhs, rhs } => {
                let id = self.node(op.symbol());
                let l = self.expr(lhs);
                self.edge(id, l, Some("left"));
                let r = self.expr(rhs);
                self.edge(id, r, Some("right"));
                id
            }

            Expr::Not(inner) => self.unary("not", inner),
            Expr::Neg(inner) => self.unary("~", inner),
            Expr::IsVoid(inner) => self.unary("isvoid", inner),

            Expr::If { cond, then_, else_ } => {
                let id = self.node("if");
                let c = self.expr(cond);
                self.edge(id, c, Some("cond"));
                let t = self.expr(then_);
                self.edge(id, t, Some("then"));
                let e = self.expr(else_);
                self.edge(id, e, Some("else"));
                id
            }

            Expr::While { cond, body } => {
                let id = self.node("while");
                let c = self.expr(cond);
                self.edge(id, c, Some("cond"));
                let b = self.expr(body);
                self.edge(id, b, Some("body"));
                id
            }

            Expr::Block(exprs) => {
                let id = self.node("block");
                for e in exprs {
                    let child = self.expr(e);
                    self.edge(id, child, None);
                }
                id
            }

            Expr::Let { bindings, body } => {
                let id = self.node("let");
                for binding in bindings {
                    let b = self.node(&format!("Binding\n{}:{}", binding.name, binding.ty));
                    self.edge(id, b, None);
                    if let Some(init) = &binding.init {
                        let child = self.expr(init);
                        self.edge(b, child, None);
                    }
                }
                let child = self.expr(body);
                self.edge(id, child, Some("in"));
                id
            }

            Expr::Case { expr, arms } => {
                let id = self.node("case");
                let subject = self.expr(expr);
                self.edge(id, subject, Some("subject"));
                for arm in arms {
                    let a = self.node(&format!("Branch\n{}:{}", arm.name, arm.ty));
                    self.edge(id, a, None);
                    let child = self.expr(&arm.expr);
                    self.edge(a, child, None);
                }
                id
            }

            Expr::Dispatch {
                recv,
                static_type,
                method,
                args,
            } => {
                let label = match static_type {
                    Some(st) => format!("Call\n{method}@{st}"),
                    None => format!("Call\n{method}"),
                };
                let id = self.node(&label);
                let obj = self.expr(recv);
                self.edge(id, obj, Some("obj"));
                for arg in args {
                    let child = self.expr(arg);
                    self.edge(id, child, Some("arg"));
                }
                id
            }
        }
    }

    fn unary(&mut self, label: &str, inner: &Expr) -> usize {
        let id = self.node(label);
        let child = self.expr(inner);
        self.edge(id, child, None);
        id
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use coolz_frontend::{lex, parse_program};

    fn parse(src: &str) -> Program {
        let (toks, _) = lex(src);
        let (prog, diags) = parse_program(&toks);
        assert!(diags.is_empty(), "{diags:?}");
        prog.unwrap()
    }

    #[test]
    fn wraps_everything_in_a_digraph() {
        let dot = to_dot(&parse("class Main { };"));
        assert!(dot.starts_with("digraph AST {\n"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("n0 [label=\"Program\"]"));
        assert!(dot.contains("Class\\nMain"));
        assert!(dot.contains("n0 -> n1;"));
    }

    #[test]
    fn control_flow_edges_carry_role_labels() {
        let dot = to_dot(&parse(
            "class Main { f(b : Bool) : Object { if b then 1 else 2 fi }; };",
        ));
        assert!(dot.contains("[label=\"cond\"]"));
        assert!(dot.contains("[label=\"then\"]"));
        assert!(dot.contains("[label=\"else\"]"));
    }

    #[test]
    fn string_labels_are_escaped() {
        let dot = to_dot(&parse(r#"class Main { s : String <- "a\"b"; };"#));
        assert!(dot.contains(r#"String\n\"a\"b\""#));
    }

    #[test]
    fn node_ids_are_unique_and_sequential() {
        let dot = to_dot(&parse("class A { }; class B { };"));
        assert!(dot.contains("n0 ["));
        assert!(dot.contains("n1 ["));
        assert!(dot.contains("n2 ["));
        assert!(!dot.contains("n3 ["));
    }
}
