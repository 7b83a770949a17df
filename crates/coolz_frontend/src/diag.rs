use std::fmt;

/// A human-readable diagnostic accumulated by a pipeline stage.
///
/// Every stage reports through these instead of failing: the lexer emits
/// error tokens, the parser resynchronizes, the analyzer falls back to
/// `Object`, and in all cases the message ends up here in source order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub msg: String,
}

impl Diagnostic {
    pub fn new<S: Into<String>>(msg: S) -> Self {
        Self { msg: msg.into() }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.msg)
    }
}
