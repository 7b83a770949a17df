use crate::ast::{BinOp, Expr};
use crate::diag::Diagnostic;

use super::scope::ScopeStack;
use super::table::{ClassTable, TypeRef, BOOL, INT, OBJECT, SELF_TYPE, STRING};

/// Compute the static type of an expression, accumulating diagnostics.
///
/// Total: every failure reports and falls back to a safe type (usually
/// `Object`) so that the enclosing expression can still be checked.
pub(super) fn type_of(
    table: &ClassTable,
    env: &mut ScopeStack,
    current_class: &str,
    expr: &Expr,
    diags: &mut Vec<Diagnostic>,
) -> TypeRef {
    match expr {
        Expr::Int(_) => TypeRef::class(INT),
        Expr::Str(_) => TypeRef::class(STRING),
        Expr::Bool(_) => TypeRef::class(BOOL),
        Expr::Self_ => TypeRef::SelfType,
        Expr::Paren(inner) => type_of(table, env, current_class, inner, diags),

        Expr::Id(name) => match env.lookup(name) {
            Some(ty) => ty.clone(),
            None => {
                diags.push(Diagnostic::new(format!("undefined identifier {name}")));
                TypeRef::class(OBJECT)
            }
        },

        Expr::Assign { name, expr } => {
            if name == "self" {
                diags.push(Diagnostic::new("cannot assign to self"));
            }

            let declared = env.lookup(name).cloned();
            let rhs = type_of(table, env, current_class, expr, diags);

            match declared {
                Some(declared) => {
                    if !table.conforms(&rhs, &declared, current_class) {
                        diags.push(Diagnostic::new(format!(
                            "assignment to {name} has type {rhs}, expected {declared}"
                        )));
                    }
                }
                None if name != "self" => {
                    diags.push(Diagnostic::new(format!(
                        "assignment to undefined identifier {name}"
                    )));
                }
                None => {}
            }
            // The assignment's own type is the right-hand side's.
            rhs
        }

        Expr::Block(exprs) => {
            let mut last = TypeRef::class(OBJECT);
            for e in exprs {
                last = type_of(table, env, current_class, e, diags);
            }
            last
        }

        Expr::If { cond, then_, else_ } => {
            check_bool(table, env, current_class, cond, "if", diags);
            let then_ty = type_of(table, env, current_class, then_, diags);
            let else_ty = type_of(table, env, current_class, else_, diags);
            table.join(&then_ty, &else_ty, current_class)
        }

        Expr::While { cond, body } => {
            check_bool(table, env, current_class, cond, "while", diags);
            let _ = type_of(table, env, current_class, body, diags);
            TypeRef::class(OBJECT)
        }

        Expr::Let { bindings, body } => {
            env.push();
            for b in bindings {
                let declared = TypeRef::parse(&b.ty);
                if let TypeRef::Class(name) = &declared {
                    if !table.has(name) {
                        diags.push(Diagnostic::new(format!(
                            "undefined type {name} in let binding {}",
                            b.name
                        )));
                    }
                }

                if let Some(init) = &b.init {
                    let init_ty = type_of(table, env, current_class, init, diags);
                    if !table.conforms(&init_ty, &declared, current_class) {
                        diags.push(Diagnostic::new(format!(
                            "let binding {} initializer has type {init_ty}, expected {declared}",
                            b.name
                        )));
                    }
                }

                // Bound after its own initializer: later bindings see it.
                env.bind(b.name.clone(), declared);
            }

            let body_ty = type_of(table, env, current_class, body, diags);
            env.pop();
            body_ty
        }

        Expr::Case { expr, arms } => {
            let _ = type_of(table, env, current_class, expr, diags);

            let mut seen = Vec::new();
            let mut joined: Option<TypeRef> = None;

            for arm in arms {
                let arm_ty = TypeRef::parse(&arm.ty);
                if let TypeRef::Class(name) = &arm_ty {
                    if !table.has(name) {
                        diags.push(Diagnostic::new(format!(
                            "undefined type {name} in case branch {}",
                            arm.name
                        )));
                    }
                }
                if seen.contains(&arm.ty) {
                    diags.push(Diagnostic::new(format!(
                        "duplicate branch type {} in case expression",
                        arm.ty
                    )));
                } else {
                    seen.push(arm.ty.clone());
                }

                env.push();
                env.bind(arm.name.clone(), arm_ty);
                let branch_ty = type_of(table, env, current_class, &arm.expr, diags);
                env.pop();

                joined = Some(match joined {
                    None => branch_ty,
                    Some(prev) => table.join(&prev, &branch_ty, current_class),
                });
            }

            joined.unwrap_or_else(|| TypeRef::class(OBJECT))
        }

        Expr::New(ty) => {
            if ty == SELF_TYPE {
                TypeRef::SelfType
            } else if !table.has(ty) {
                diags.push(Diagnostic::new(format!(
                    "undefined type {ty} in new expression"
                )));
                TypeRef::class(OBJECT)
            } else {
                TypeRef::class(ty.as_str())
            }
        }

        Expr::IsVoid(inner) => {
            let _ = type_of(table, env, current_class, inner, diags);
            TypeRef::class(BOOL)
        }

        Expr::Not(inner) => {
            let ty = type_of(table, env, current_class, inner, diags);
            if table.resolve_self(&ty, current_class) != TypeRef::class(BOOL) {
                diags.push(Diagnostic::new(format!(
                    "logical negation on non-Bool type: {ty}"
                )));
            }
            TypeRef::class(BOOL)
        }

        Expr::Neg(inner) => {
            let ty = type_of(table, env, current_class, inner, diags);
            if table.resolve_self(&ty, current_class) != TypeRef::class(INT) {
                diags.push(Diagnostic::new(format!(
                    "arithmetic negation on non-Int type: {ty}"
                )));
            }
            TypeRef::class(INT)
        }

        Expr::Bin { op, lhs, rhs } => {
            let lt = type_of(table, env, current_class, lhs, diags);
            let rt = type_of(table, env, current_class, rhs, diags);

            match op {
                BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                    if table.resolve_self(&lt, current_class) != TypeRef::class(INT)
                        || table.resolve_self(&rt, current_class) != TypeRef::class(INT)
                    {
                        diags.push(Diagnostic::new(format!(
                            "arithmetic operation on non-Int types: {lt} {op} {rt}"
                        )));
                    }
                    TypeRef::class(INT)
                }

                BinOp::Lt | BinOp::Le => {
                    if table.resolve_self(&lt, current_class) != TypeRef::class(INT)
                        || table.resolve_self(&rt, current_class) != TypeRef::class(INT)
                    {
                        diags.push(Diagnostic::new(format!(
                            "comparison on non-Int types: {lt} {op} {rt}"
                        )));
                    }
                    TypeRef::class(BOOL)
                }

                BinOp::Eq => {
                    let l = table.resolve_self(&lt, current_class);
                    let r = table.resolve_self(&rt, current_class);

                    // A primitive operand requires the same primitive on the
                    // other side; everything else needs conformance in at
                    // least one direction.
                    let ok = if l.is_primitive() || r.is_primitive() {
                        l == r
                    } else {
                        table.conforms(&l, &r, current_class)
                            || table.conforms(&r, &l, current_class)
                    };
                    if !ok {
                        diags.push(Diagnostic::new(format!(
                            "illegal equality comparison between {l} and {r}"
                        )));
                    }
                    TypeRef::class(BOOL)
                }
            }
        }

        Expr::Dispatch {
            recv,
            static_type,
            method,
            args,
        } => {
            let recv_ty = type_of(table, env, current_class, recv, diags);
            let recv_class = match table.resolve_self(&recv_ty, current_class) {
                TypeRef::Class(name) => name,
                TypeRef::SelfType => current_class.to_string(),
            };

            // Static dispatch narrows the lookup to the named ancestor.
            let lookup_class = match static_type {
                Some(static_ty) if !table.has(static_ty) => {
                    diags.push(Diagnostic::new(format!(
                        "undefined static dispatch type {static_ty}"
                    )));
                    recv_class
                }
                Some(static_ty) => {
                    if !table.conforms(&recv_ty, &TypeRef::class(static_ty.as_str()), current_class)
                    {
                        diags.push(Diagnostic::new(format!(
                            "static dispatch receiver has type {recv_ty}, expected {static_ty}"
                        )));
                    }
                    static_ty.clone()
                }
                None => recv_class,
            };

            let Some(sig) = table.lookup_method(&lookup_class, method) else {
                diags.push(Diagnostic::new(format!(
                    "undefined method {method} in class {lookup_class}"
                )));
                for arg in args {
                    let _ = type_of(table, env, current_class, arg, diags);
                }
                return TypeRef::class(OBJECT);
            };
            let sig = sig.clone();

            if sig.formals.len() != args.len() {
                diags.push(Diagnostic::new(format!(
                    "method {lookup_class}.{method} called with {} arguments, expected {}",
                    args.len(),
                    sig.formals.len()
                )));
            }

            for (i, arg) in args.iter().enumerate() {
                let arg_ty = type_of(table, env, current_class, arg, diags);
                if let Some((_, formal_ty)) = sig.formals.get(i) {
                    if !table.conforms(&arg_ty, formal_ty, current_class) {
                        diags.push(Diagnostic::new(format!(
                            "argument {} of call to {lookup_class}.{method} has type {arg_ty}, expected {formal_ty}",
                            i + 1
                        )));
                    }
                }
            }

            // A SELF_TYPE return resolves to the receiver's static type.
            match sig.ret {
                TypeRef::SelfType => recv_ty,
                other => other,
            }
        }
    }
}

fn check_bool(
    table: &ClassTable,
    env: &mut ScopeStack,
    current_class: &str,
    cond: &Expr,
    construct: &str,
    diags: &mut Vec<Diagnostic>,
) {
    let ty = type_of(table, env, current_class, cond, diags);
    if table.resolve_self(&ty, current_class) != TypeRef::class(BOOL) {
        diags.push(Diagnostic::new(format!(
            "condition of {construct} expression is of type {ty}, expected Bool"
        )));
    }
}
