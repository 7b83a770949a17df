use std::collections::{BTreeSet, HashMap};
use std::fmt;

pub const OBJECT: &str = "Object";
pub const IO: &str = "IO";
pub const INT: &str = "Int";
pub const STRING: &str = "String";
pub const BOOL: &str = "Bool";
pub const SELF_TYPE: &str = "SELF_TYPE";

pub const BUILTIN_CLASSES: [&str; 5] = [OBJECT, IO, INT, STRING, BOOL];

/// A static type: either a concrete class name or `SELF_TYPE`, which is
/// resolved against the enclosing class at each use site.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Class(String),
    SelfType,
}

impl TypeRef {
    pub fn class<S: Into<String>>(name: S) -> Self {
        TypeRef::Class(name.into())
    }

    /// Interpret a declared type name from the AST.
    pub fn parse(name: &str) -> Self {
        if name == SELF_TYPE {
            TypeRef::SelfType
        } else {
            TypeRef::Class(name.to_string())
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            TypeRef::Class(n) => Some(n.as_str()),
            TypeRef::SelfType => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Class(n) if n == INT || n == STRING || n == BOOL)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Class(n) => f.write_str(n),
            TypeRef::SelfType => f.write_str(SELF_TYPE),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSig {
    pub formals: Vec<(String, TypeRef)>,
    pub ret: TypeRef,
}

impl MethodSig {
    /// Override compatibility ignores formal names; only the shape counts.
    pub fn same_shape(&self, other: &MethodSig) -> bool {
        self.ret == other.ret
            && self.formals.len() == other.formals.len()
            && self
                .formals
                .iter()
                .zip(&other.formals)
                .all(|((_, a), (_, b))| a == b)
    }
}

/// Per-class scope kept on the hierarchy table: attribute types and method
/// signatures, plus the parent link (`None` only for the root `Object`).
#[derive(Clone, Debug, Default)]
pub struct ClassEntry {
    pub parent: Option<String>,
    pub attrs: HashMap<String, TypeRef>,
    pub methods: HashMap<String, MethodSig>,
}

/// The global class hierarchy, built once per compilation unit and
/// read-only during the type-checking pass.
#[derive(Clone, Debug)]
pub struct ClassTable {
    classes: HashMap<String, ClassEntry>,
}

impl ClassTable {
    /// A table pre-seeded with the built-in classes and their method
    /// signatures from the reference language.
    pub fn with_builtins() -> Self {
        let mut table = ClassTable {
            classes: HashMap::new(),
        };

        let object = ClassEntry {
            parent: None,
            attrs: HashMap::new(),
            methods: HashMap::from([
                (
                    "abort".to_string(),
                    MethodSig {
                        formals: vec![],
                        ret: TypeRef::class(OBJECT),
                    },
                ),
                (
                    "type_name".to_string(),
                    MethodSig {
                        formals: vec![],
                        ret: TypeRef::class(STRING),
                    },
                ),
                (
                    "copy".to_string(),
                    MethodSig {
                        formals: vec![],
                        ret: TypeRef::SelfType,
                    },
                ),
            ]),
        };
        table.classes.insert(OBJECT.to_string(), object);

        let io = ClassEntry {
            parent: Some(OBJECT.to_string()),
            attrs: HashMap::new(),
            methods: HashMap::from([
                (
                    "out_string".to_string(),
                    MethodSig {
                        formals: vec![("x".to_string(), TypeRef::class(STRING))],
                        ret: TypeRef::SelfType,
                    },
                ),
                (
                    "out_int".to_string(),
                    MethodSig {
                        formals: vec![("x".to_string(), TypeRef::class(INT))],
                        ret: TypeRef::SelfType,
                    },
                ),
                (
                    "in_string".to_string(),
                    MethodSig {
                        formals: vec![],
                        ret: TypeRef::class(STRING),
                    },
                ),
                (
                    "in_int".to_string(),
                    MethodSig {
                        formals: vec![],
                        ret: TypeRef::class(INT),
                    },
                ),
            ]),
        };
        table.classes.insert(IO.to_string(), io);

        table.classes.insert(
            INT.to_string(),
            ClassEntry {
                parent: Some(OBJECT.to_string()),
                ..Default::default()
            },
        );
        table.classes.insert(
            BOOL.to_string(),
            ClassEntry {
                parent: Some(OBJECT.to_string()),
                ..Default::default()
            },
        );

        let string = ClassEntry {
            parent: Some(OBJECT.to_string()),
            attrs: HashMap::new(),
            methods: HashMap::from([
                (
                    "length".to_string(),
                    MethodSig {
                        formals: vec![],
                        ret: TypeRef::class(INT),
                    },
                ),
                (
                    "concat".to_string(),
                    MethodSig {
                        formals: vec![("s".to_string(), TypeRef::class(STRING))],
                        ret: TypeRef::class(STRING),
                    },
                ),
                (
                    "substr".to_string(),
                    MethodSig {
                        formals: vec![
                            ("i".to_string(), TypeRef::class(INT)),
                            ("l".to_string(), TypeRef::class(INT)),
                        ],
                        ret: TypeRef::class(STRING),
                    },
                ),
            ]),
        };
        table.classes.insert(STRING.to_string(), string);

        table
    }

    pub fn has(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ClassEntry> {
        self.classes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ClassEntry> {
        self.classes.get_mut(name)
    }

    pub fn insert(&mut self, name: String, entry: ClassEntry) {
        self.classes.insert(name, entry);
    }

    pub fn resolve_self(&self, ty: &TypeRef, current_class: &str) -> TypeRef {
        match ty {
            TypeRef::SelfType => TypeRef::class(current_class),
            TypeRef::Class(_) => ty.clone(),
        }
    }

    /// The ancestor chain of `class`, starting at the class itself and
    /// ending at the root. Cycle-safe: a repeated class stops the walk, so
    /// this stays total even on hierarchies that failed validation.
    pub fn ancestors(&self, class: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = BTreeSet::new();
        let mut cur = class.to_string();

        loop {
            if !seen.insert(cur.clone()) {
                break;
            }
            chain.push(cur.clone());
            match self.classes.get(&cur).and_then(|e| e.parent.clone()) {
                Some(parent) => cur = parent,
                None => break,
            }
        }
        chain
    }

    /// Conformance: `sub` ≤ `sup` along the single-inheritance chain.
    /// An undeclared `sub` conforms only to its own name.
    pub fn conforms(&self, sub: &TypeRef, sup: &TypeRef, current_class: &str) -> bool {
        let sub = self.resolve_self(sub, current_class);
        let sup = self.resolve_self(sup, current_class);

        let (Some(sub_name), Some(sup_name)) = (sub.name(), sup.name()) else {
            return false;
        };
        // Identical names conform even when undeclared, so a type that was
        // already diagnosed does not cascade into every use site.
        if sub_name == sup_name {
            return true;
        }
        if !self.has(sub_name) {
            return false;
        }

        self.ancestors(sub_name).iter().any(|a| a == sup_name)
    }

    /// Least common ancestor of two types. `Object` is the safe terminal
    /// answer for anything undeclared.
    pub fn join(&self, a: &TypeRef, b: &TypeRef, current_class: &str) -> TypeRef {
        let a = self.resolve_self(a, current_class);
        let b = self.resolve_self(b, current_class);

        let (Some(a_name), Some(b_name)) = (a.name(), b.name()) else {
            return TypeRef::class(OBJECT);
        };
        if a_name == b_name {
            return a.clone();
        }

        let b_chain: BTreeSet<String> = self.ancestors(b_name).into_iter().collect();
        for candidate in self.ancestors(a_name) {
            if b_chain.contains(&candidate) {
                return TypeRef::Class(candidate);
            }
        }
        TypeRef::class(OBJECT)
    }

    /// Look a method up in `class` or the nearest ancestor declaring it.
    pub fn lookup_method(&self, class: &str, method: &str) -> Option<&MethodSig> {
        for ancestor in self.ancestors(class) {
            if let Some(sig) = self.classes.get(&ancestor).and_then(|e| e.methods.get(method)) {
                return Some(sig);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(classes: &[(&str, &str)]) -> ClassTable {
        let mut t = ClassTable::with_builtins();
        for (name, parent) in classes {
            t.insert(
                name.to_string(),
                ClassEntry {
                    parent: Some(parent.to_string()),
                    ..Default::default()
                },
            );
        }
        t
    }

    #[test]
    fn conformance_is_reflexive() {
        let t = table_with(&[("A", "Object"), ("B", "A")]);
        for name in ["Object", "IO", "Int", "String", "Bool", "A", "B"] {
            assert!(
                t.conforms(&TypeRef::class(name), &TypeRef::class(name), "A"),
                "{name} should conform to itself"
            );
        }
    }

    #[test]
    fn conformance_follows_parents_to_object() {
        let t = table_with(&[("A", "Object"), ("B", "A"), ("C", "B")]);
        assert!(t.conforms(&TypeRef::class("B"), &TypeRef::class("A"), "B"));
        assert!(t.conforms(&TypeRef::class("C"), &TypeRef::class("A"), "C"));
        assert!(t.conforms(&TypeRef::class("C"), &TypeRef::class("Object"), "C"));
        assert!(!t.conforms(&TypeRef::class("A"), &TypeRef::class("B"), "A"));
    }

    #[test]
    fn undeclared_types_conform_to_nothing() {
        let t = ClassTable::with_builtins();
        assert!(!t.conforms(&TypeRef::class("Ghost"), &TypeRef::class("Object"), "Main"));
    }

    #[test]
    fn self_type_resolves_to_the_current_class() {
        let t = table_with(&[("A", "Object"), ("B", "A")]);
        assert!(t.conforms(&TypeRef::SelfType, &TypeRef::class("A"), "B"));
        assert!(!t.conforms(&TypeRef::SelfType, &TypeRef::class("B"), "A"));
    }

    #[test]
    fn join_is_symmetric() {
        let t = table_with(&[("A", "Object"), ("B", "A"), ("C", "A"), ("D", "C")]);
        let pairs = [
            ("B", "C"),
            ("B", "D"),
            ("C", "D"),
            ("Int", "String"),
            ("A", "D"),
        ];
        for (x, y) in pairs {
            assert_eq!(
                t.join(&TypeRef::class(x), &TypeRef::class(y), "A"),
                t.join(&TypeRef::class(y), &TypeRef::class(x), "A"),
                "join({x}, {y})"
            );
        }
    }

    #[test]
    fn join_finds_the_least_common_ancestor() {
        let t = table_with(&[("A", "Object"), ("B", "A"), ("C", "A"), ("D", "C")]);
        assert_eq!(
            t.join(&TypeRef::class("B"), &TypeRef::class("D"), "A"),
            TypeRef::class("A")
        );
        assert_eq!(
            t.join(&TypeRef::class("C"), &TypeRef::class("D"), "A"),
            TypeRef::class("C")
        );
        assert_eq!(
            t.join(&TypeRef::class("Int"), &TypeRef::class("String"), "A"),
            TypeRef::class("Object")
        );
    }

    #[test]
    fn ancestor_walk_terminates_on_cycles() {
        let mut t = ClassTable::with_builtins();
        t.insert(
            "A".to_string(),
            ClassEntry {
                parent: Some("B".to_string()),
                ..Default::default()
            },
        );
        t.insert(
            "B".to_string(),
            ClassEntry {
                parent: Some("A".to_string()),
                ..Default::default()
            },
        );
        let chain = t.ancestors("A");
        assert_eq!(chain, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn method_lookup_walks_ancestors() {
        let t = table_with(&[("A", "IO"), ("B", "A")]);
        assert!(t.lookup_method("B", "out_string").is_some());
        assert!(t.lookup_method("B", "abort").is_some());
        assert!(t.lookup_method("B", "missing").is_none());
    }
}
