use std::collections::HashMap;

use super::table::TypeRef;

/// Lexically-chained object environment: a stack of binding frames.
///
/// The class frame (attributes plus `self`) sits at the bottom, method
/// formals above it, and `let`/`case` push transient frames on top.
/// Lookup walks outward; the innermost binding shadows.
#[derive(Clone, Debug)]
pub struct ScopeStack {
    frames: Vec<HashMap<String, TypeRef>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        debug_assert!(self.frames.len() > 1, "popping the class frame");
        self.frames.pop();
    }

    pub fn bind<S: Into<String>>(&mut self, name: S, ty: TypeRef) {
        self.frames
            .last_mut()
            .expect("scope stack always has a frame")
            .insert(name.into(), ty);
    }

    pub fn lookup(&self, name: &str) -> Option<&TypeRef> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
