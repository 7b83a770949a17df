//! Semantic analysis: class hierarchy construction, scope building and
//! expression type-checking.
//!
//! Three passes over the program, in order:
//!
//! 1. class names and parent links ([`SemanticAnalyzer::collect_classes`]
//!    plus hierarchy validation),
//! 2. per-class feature tables: attribute types and method signatures,
//! 3. body checking: every method body and attribute initializer is typed
//!    against its declaration.
//!
//! The table is append-only during passes 1-2 and read-only during pass 3;
//! `let`/`case` scopes are transient frames on a [`ScopeStack`]. Analysis
//! never bails out: each failure is one diagnostic and checking continues
//! with a safe fallback type.

mod expr;
mod scope;
mod table;

use std::collections::BTreeSet;

use crate::ast::{Class, Feature, Program};
use crate::diag::Diagnostic;

pub use scope::ScopeStack;
pub use table::{ClassEntry, ClassTable, MethodSig, TypeRef, BUILTIN_CLASSES, OBJECT, SELF_TYPE};

/// Analyze a program, returning every semantic diagnostic found.
pub fn analyze(program: &Program) -> Vec<Diagnostic> {
    let mut analyzer = SemanticAnalyzer::new();
    analyzer.analyze(program);
    analyzer.into_diagnostics()
}

pub struct SemanticAnalyzer {
    table: ClassTable,
    diagnostics: Vec<Diagnostic>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            table: ClassTable::with_builtins(),
            diagnostics: Vec::new(),
        }
    }

    /// The hierarchy table, useful for conformance queries after analysis.
    pub fn class_table(&self) -> &ClassTable {
        &self.table
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn analyze(&mut self, program: &Program) {
        let unique = self.collect_classes(program);
        self.validate_hierarchy(&unique);
        self.collect_features(&unique);
        self.check_overrides(&unique);
        self.check_bodies(&unique);
    }

    fn report<S: Into<String>>(&mut self, msg: S) {
        self.diagnostics.push(Diagnostic::new(msg));
    }

    /// Pass 1: register class names and parent links. Duplicates are
    /// diagnosed and dropped; the first definition wins. Returns the
    /// classes that made it into the table, in program order.
    fn collect_classes<'p>(&mut self, program: &'p Program) -> Vec<&'p Class> {
        let mut kept = Vec::new();

        for class in &program.classes {
            let name = class.name.as_str();
            if self.table.has(name) {
                self.report(format!("class {name} is already defined"));
                continue;
            }

            let mut parent = class
                .parent
                .clone()
                .unwrap_or_else(|| OBJECT.to_string());
            if parent == "Int" || parent == "String" || parent == "Bool" || parent == SELF_TYPE {
                self.report(format!("class {name} may not inherit from {parent}"));
                parent = OBJECT.to_string();
            }

            self.table.insert(
                name.to_string(),
                ClassEntry {
                    parent: Some(parent),
                    ..Default::default()
                },
            );
            kept.push(class);
        }

        kept
    }

    /// Pass 1b: every declared parent must exist and chain to `Object`
    /// without revisiting a class.
    fn validate_hierarchy(&mut self, classes: &[&Class]) {
        for class in classes {
            let name = class.name.as_str();

            let parent = self.table.get(name).and_then(|e| e.parent.clone());
            if let Some(parent) = &parent {
                if !self.table.has(parent) {
                    self.report(format!(
                        "class {name} inherits from undefined class {parent}"
                    ));
                }
            }

            let mut seen = BTreeSet::new();
            let mut cur = name.to_string();
            let mut cyclic = false;
            loop {
                if !seen.insert(cur.clone()) {
                    cyclic = true;
                    break;
                }
                match self.table.get(&cur).and_then(|e| e.parent.clone()) {
                    Some(next) => cur = next,
                    None => break,
                }
            }
            if cyclic {
                self.report(format!(
                    "inheritance cycle detected involving class {name}"
                ));
            }
        }
    }

    /// Pass 2: attribute types and method signatures, with duplicate and
    /// undefined-type diagnostics.
    fn collect_features(&mut self, classes: &[&Class]) {
        for class in classes {
            let cname = class.name.as_str();

            for feature in &class.features {
                match feature {
                    Feature::Attr { name, ty, .. } => {
                        let declared = TypeRef::parse(ty);
                        self.check_declared(&declared, || {
                            format!("undefined type {ty} for attribute {cname}.{name}")
                        });

                        let duplicate = self
                            .table
                            .get(cname)
                            .is_some_and(|e| e.attrs.contains_key(name));
                        if duplicate {
                            self.report(format!(
                                "attribute {name} is already defined in class {cname}"
                            ));
                            continue;
                        }
                        if let Some(entry) = self.table.get_mut(cname) {
                            entry.attrs.insert(name.clone(), declared);
                        }
                    }

                    Feature::Method {
                        name,
                        formals,
                        ret_type,
                        ..
                    } => {
                        let mut formal_names = BTreeSet::new();
                        let mut sig_formals = Vec::with_capacity(formals.len());

                        for formal in formals {
                            if !formal_names.insert(formal.name.clone()) {
                                self.report(format!(
                                    "argument {} in method {cname}.{name} is already defined",
                                    formal.name
                                ));
                            }
                            let fty = TypeRef::parse(&formal.ty);
                            self.check_declared(&fty, || {
                                format!(
                                    "undefined type {} for argument {} of method {cname}.{name}",
                                    formal.ty, formal.name
                                )
                            });
                            sig_formals.push((formal.name.clone(), fty));
                        }

                        let ret = TypeRef::parse(ret_type);
                        self.check_declared(&ret, || {
                            format!("undefined return type {ret_type} for method {cname}.{name}")
                        });

                        let duplicate = self
                            .table
                            .get(cname)
                            .is_some_and(|e| e.methods.contains_key(name));
                        if duplicate {
                            self.report(format!(
                                "method {name} is already defined in class {cname}"
                            ));
                            continue;
                        }
                        if let Some(entry) = self.table.get_mut(cname) {
                            entry.methods.insert(
                                name.clone(),
                                MethodSig {
                                    formals: sig_formals,
                                    ret,
                                },
                            );
                        }
                    }
                }
            }
        }
    }

    fn check_declared<F: FnOnce() -> String>(&mut self, ty: &TypeRef, msg: F) {
        if let TypeRef::Class(name) = ty {
            if !self.table.has(name) {
                self.report(msg());
            }
        }
    }

    /// Pass 2b: an override must keep the inherited signature's shape.
    fn check_overrides(&mut self, classes: &[&Class]) {
        for class in classes {
            let cname = class.name.as_str();
            let Some(parent) = self.table.get(cname).and_then(|e| e.parent.clone()) else {
                continue;
            };

            for feature in &class.features {
                let Feature::Method { name, .. } = feature else {
                    continue;
                };
                let mismatch = match (
                    self.table.lookup_method(&parent, name),
                    self.table.get(cname).and_then(|e| e.methods.get(name)),
                ) {
                    (Some(inherited), Some(own)) => !own.same_shape(inherited),
                    _ => false,
                };
                if mismatch {
                    self.report(format!(
                        "method {cname}.{name} overrides an inherited method with a different signature"
                    ));
                }
            }
        }
    }

    /// Pass 3: type-check every attribute initializer and method body.
    fn check_bodies(&mut self, classes: &[&Class]) {
        for class in classes {
            let cname = class.name.as_str();

            let mut env = ScopeStack::new();
            env.bind("self", TypeRef::SelfType);
            // Root-first so that a derived class's attribute shadows an
            // inherited one of the same name.
            for ancestor in self.table.ancestors(cname).into_iter().rev() {
                if let Some(entry) = self.table.get(&ancestor) {
                    for (attr, ty) in &entry.attrs {
                        env.bind(attr.clone(), ty.clone());
                    }
                }
            }

            for feature in &class.features {
                match feature {
                    Feature::Attr { name, ty, init } => {
                        let Some(init) = init else { continue };
                        let declared = TypeRef::parse(ty);
                        let init_ty = expr::type_of(
                            &self.table,
                            &mut env,
                            cname,
                            init,
                            &mut self.diagnostics,
                        );
                        if !self.table.conforms(&init_ty, &declared, cname) {
                            self.report(format!(
                                "attribute {cname}.{name} initializer has type {init_ty}, expected {declared}"
                            ));
                        }
                    }

                    Feature::Method {
                        name,
                        formals,
                        ret_type,
                        body,
                    } => {
                        env.push();
                        for formal in formals {
                            env.bind(formal.name.clone(), TypeRef::parse(&formal.ty));
                        }

                        let body_ty = expr::type_of(
                            &self.table,
                            &mut env,
                            cname,
                            body,
                            &mut self.diagnostics,
                        );
                        let declared = TypeRef::parse(ret_type);
                        if !self.table.conforms(&body_ty, &declared, cname) {
                            self.report(format!(
                                "method {cname}.{name} is expected to return {declared}, found {body_ty}"
                            ));
                        }
                        env.pop();
                    }
                }
            }
        }
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse_program;

    fn parse(src: &str) -> Program {
        let (toks, lex_diags) = lex(src);
        assert!(lex_diags.is_empty(), "{lex_diags:?}");
        let (prog, diags) = parse_program(&toks);
        assert!(diags.is_empty(), "{diags:?}");
        prog.unwrap()
    }

    fn analyze_src(src: &str) -> Vec<Diagnostic> {
        analyze(&parse(src))
    }

    #[test]
    fn accepts_a_well_typed_attribute() {
        assert_eq!(analyze_src("class Main { x : Int <- 42; };"), vec![]);
    }

    #[test]
    fn rejects_an_int_initializer_for_a_string_attribute() {
        let diags = analyze_src("class Main { x : String <- 42; };");
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].msg.contains("Int"));
        assert!(diags[0].msg.contains("String"));
    }

    #[test]
    fn uninitialized_attributes_are_fine() {
        assert_eq!(analyze_src("class Main { x : Int; };"), vec![]);
    }

    #[test]
    fn conditional_branches_join_at_their_common_ancestor() {
        // Int and String only share Object, which does not conform to Int.
        let diags =
            analyze_src(r#"class Main { x : Int <- if true then 42 else "Hello" fi; };"#);
        assert_eq!(diags.len(), 1, "{diags:?}");
    }

    #[test]
    fn inheritance_establishes_conformance() {
        let prog = parse("class A { }; class B inherits A { };");
        let mut analyzer = SemanticAnalyzer::new();
        analyzer.analyze(&prog);
        assert!(analyzer.diagnostics().is_empty());
        assert!(analyzer.class_table().conforms(
            &TypeRef::class("B"),
            &TypeRef::class("A"),
            "B"
        ));
    }

    #[test]
    fn assignment_to_an_undefined_identifier_is_reported() {
        let diags = analyze_src("class Main { x : Int; foo() : Int { y <- x; }; };");
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].msg.contains("y"), "{}", diags[0].msg);
    }

    #[test]
    fn undefined_identifier_reads_fall_back_to_object() {
        let diags = analyze_src("class Main { foo() : Int { ghost + 1 }; };");
        // one for the identifier, one for the arithmetic operand
        assert_eq!(diags.len(), 2, "{diags:?}");
        assert!(diags[0].msg.contains("undefined identifier ghost"));
    }

    #[test]
    fn duplicate_classes_are_reported_once() {
        let diags = analyze_src("class A { }; class A { x : Int; };");
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].msg.contains("already defined"));
    }

    #[test]
    fn redefining_a_builtin_class_is_reported() {
        let diags = analyze_src("class Int { };");
        assert_eq!(diags.len(), 1, "{diags:?}");
    }

    #[test]
    fn inheriting_from_a_primitive_is_rejected() {
        let diags = analyze_src("class Bad inherits Int { x : Int <- 42; };");
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].msg.contains("may not inherit"));
    }

    #[test]
    fn undefined_parents_are_reported() {
        let diags = analyze_src("class A inherits Ghost { };");
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].msg.contains("undefined class Ghost"));
    }

    #[test]
    fn inheritance_cycles_are_detected() {
        let diags = analyze_src("class A inherits B { }; class B inherits A { };");
        assert!(
            diags.iter().any(|d| d.msg.contains("cycle")),
            "{diags:?}"
        );
    }

    #[test]
    fn self_type_features_check_against_the_enclosing_class() {
        let diags = analyze_src(
            r#"
            class Main {
                same() : SELF_TYPE { self };
                fresh() : SELF_TYPE { new SELF_TYPE };
            };
        "#,
        );
        assert_eq!(diags, vec![]);
    }

    #[test]
    fn self_type_attribute_rejects_unrelated_initializer() {
        let diags = analyze_src("class Main { x : SELF_TYPE <- new Int; };");
        assert_eq!(diags.len(), 1, "{diags:?}");
    }

    #[test]
    fn dispatch_checks_arity_and_argument_types() {
        let ok = analyze_src(
            "class Main { foo(x : Int) : Int { x + 1 }; bar() : Int { foo(42) }; };",
        );
        assert_eq!(ok, vec![]);

        let bad_arg = analyze_src(
            r#"class Main { foo(x : Int) : Int { x + 1 }; bar() : Int { foo("s") }; };"#,
        );
        assert_eq!(bad_arg.len(), 1, "{bad_arg:?}");
        assert!(bad_arg[0].msg.contains("argument 1"));

        let bad_arity = analyze_src(
            "class Main { foo(x : Int) : Int { x + 1 }; bar() : Int { foo() }; };",
        );
        assert_eq!(bad_arity.len(), 1, "{bad_arity:?}");
        assert!(bad_arity[0].msg.contains("expected 1"));
    }

    #[test]
    fn dispatch_resolves_methods_through_ancestors() {
        let diags = analyze_src(
            r#"
            class A { m() : Int { 1 }; };
            class B inherits A { test() : Int { self.m() }; };
        "#,
        );
        assert_eq!(diags, vec![]);
    }

    #[test]
    fn undefined_methods_are_reported() {
        let diags = analyze_src("class Main { bar() : Object { self.nope() }; };");
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].msg.contains("undefined method nope"));
    }

    #[test]
    fn static_dispatch_narrows_to_the_named_ancestor() {
        let diags = analyze_src(
            r#"
            class A { m() : Int { 1 }; };
            class B inherits A { m() : Int { 2 }; test() : Int { self@A.m() }; };
        "#,
        );
        assert_eq!(diags, vec![]);
    }

    #[test]
    fn static_dispatch_requires_receiver_conformance() {
        let diags = analyze_src(
            r#"
            class A { m() : Int { 1 }; };
            class C { test() : Int { self@A.m() }; };
        "#,
        );
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].msg.contains("static dispatch"));
    }

    #[test]
    fn self_type_returns_resolve_to_the_receiver() {
        // out_string returns SELF_TYPE, so chained IO calls keep working.
        let diags = analyze_src(
            r#"
            class Main inherits IO {
                greet() : SELF_TYPE { self.out_string("hi").out_string("there") };
            };
        "#,
        );
        assert_eq!(diags, vec![]);
    }

    #[test]
    fn method_body_must_conform_to_the_declared_return() {
        let diags =
            analyze_src("class Main { add(x : Int, y : Int) : String { x + y }; };");
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].msg.contains("expected to return"));
    }

    #[test]
    fn duplicate_methods_and_attributes_are_reported() {
        let diags = analyze_src(
            r#"
            class Main {
                x : Int;
                x : String;
                f() : Int { 1 };
                f() : String { "s" };
            };
        "#,
        );
        assert_eq!(diags.len(), 2, "{diags:?}");
    }

    #[test]
    fn duplicate_formals_are_reported() {
        let diags = analyze_src("class Main { f(a : Int, a : Int) : Int { a }; };");
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].msg.contains("already defined"));
    }

    #[test]
    fn overrides_must_keep_the_inherited_shape() {
        let diags = analyze_src(
            r#"
            class A { m() : Int { 1 }; };
            class B inherits A { m() : String { "s" }; };
        "#,
        );
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].msg.contains("overrides"));
    }

    #[test]
    fn let_bindings_shadow_and_scope_out() {
        let ok = analyze_src(
            r#"
            class Main {
                x : Int;
                test() : Int { let x : Int <- 1 in x };
            };
        "#,
        );
        assert_eq!(ok, vec![]);

        let out_of_scope = analyze_src(
            r#"
            class Main {
                test() : Object {
                    {
                        let y : Int <- 1 in y;
                        y;
                    }
                };
            };
        "#,
        );
        assert_eq!(out_of_scope.len(), 1, "{out_of_scope:?}");
        assert!(out_of_scope[0].msg.contains("undefined identifier y"));
    }

    #[test]
    fn let_initializer_must_conform() {
        let diags =
            analyze_src(r#"class Main { t() : Int { let x : Int <- "s" in x }; };"#);
        assert_eq!(diags.len(), 1, "{diags:?}");
    }

    #[test]
    fn case_branches_join_and_bind_their_variable() {
        let ok = analyze_src(
            r#"
            class Main {
                t(v : Object) : Object {
                    case v of i : Int => i + 1; s : String => s.length(); esac
                };
            };
        "#,
        );
        assert_eq!(ok, vec![]);

        let join_too_wide = analyze_src(
            r#"
            class Main {
                t(v : Object) : Int {
                    case v of i : Int => i; s : String => s; esac
                };
            };
        "#,
        );
        assert_eq!(join_too_wide.len(), 1, "{join_too_wide:?}");
    }

    #[test]
    fn duplicate_case_branch_types_are_reported() {
        let diags = analyze_src(
            r#"
            class Main {
                t(v : Object) : Object {
                    case v of a : Int => a; b : Int => b; esac
                };
            };
        "#,
        );
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].msg.contains("duplicate branch type"));
    }

    #[test]
    fn loops_always_have_type_object() {
        let diags = analyze_src(
            "class Main { t() : Int { while false loop 1 pool }; };",
        );
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].msg.contains("found Object"), "{}", diags[0].msg);
    }

    #[test]
    fn conditions_must_be_bool() {
        let diags = analyze_src("class Main { t() : Object { if 1 then 2 else 3 fi }; };");
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].msg.contains("expected Bool"));
    }

    #[test]
    fn unary_operators_check_their_operand() {
        let diags = analyze_src(r#"class Main { t() : Int { ~"s" }; };"#);
        assert_eq!(diags.len(), 1, "{diags:?}");

        let diags = analyze_src("class Main { t() : Bool { not 1 }; };");
        assert_eq!(diags.len(), 1, "{diags:?}");
    }

    #[test]
    fn isvoid_is_always_bool() {
        assert_eq!(
            analyze_src("class Main { t() : Bool { isvoid 42 }; };"),
            vec![]
        );
    }

    #[test]
    fn equality_rejects_mixed_primitives() {
        let diags = analyze_src(r#"class Main { t() : Bool { 1 = "x" }; };"#);
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].msg.contains("equality"));
    }

    #[test]
    fn equality_allows_related_classes() {
        let diags = analyze_src(
            r#"
            class A { };
            class B inherits A { };
            class Main { t(a : A, b : B) : Bool { a = b }; };
        "#,
        );
        assert_eq!(diags, vec![]);
    }

    #[test]
    fn new_requires_a_declared_type() {
        let diags = analyze_src("class Main { t() : Object { new Ghost }; };");
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].msg.contains("new"));
    }

    #[test]
    fn undefined_declared_types_are_reported_per_site() {
        let diags = analyze_src(
            "class Main { x : Ghost; f(a : Ghost) : Ghost { a }; };",
        );
        assert_eq!(diags.len(), 3, "{diags:?}");
    }

    #[test]
    fn assigning_to_self_is_rejected() {
        let diags = analyze_src("class Main { t() : Object { self <- new Main }; };");
        assert_eq!(diags.len(), 1, "{diags:?}");
        assert!(diags[0].msg.contains("self"));
    }
}
