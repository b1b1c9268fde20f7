use serde::{Deserialize, Serialize};

/// A literal or placeholder appearing in an expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    /// Numeric literal, kept as written so regeneration is exact.
    Number(String),
    /// String literal with escapes already decoded.
    String(String),
    /// Positional placeholder (?)
    Placeholder,
    /// Named placeholder (:name)
    NamedPlaceholder(String),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(true) => write!(f, "TRUE"),
            Value::Bool(false) => write!(f, "FALSE"),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "'{}'", escape_string(s)),
            Value::Placeholder => write!(f, "?"),
            Value::NamedPlaceholder(name) => write!(f, ":{}", name),
        }
    }
}

/// Encode a decoded string body for a single-quoted literal.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}
