//! Generator traits and identifier utilities.

/// Words the parser never accepts as a bare identifier (outside of dotted paths).
pub const RESERVED_WORDS: &[&str] = &[
    "select",
    "from",
    "where",
    "group",
    "by",
    "having",
    "order",
    "limit",
    "union",
    "all",
    "distinct",
    "join",
    "inner",
    "left",
    "right",
    "cross",
    "outer",
    "natural",
    "straight_join",
    "on",
    "using",
    "as",
    "and",
    "or",
    "xor",
    "not",
    "in",
    "is",
    "null",
    "like",
    "regexp",
    "between",
    "case",
    "when",
    "then",
    "else",
    "end",
    "exists",
    "interval",
    "insert",
    "into",
    "values",
    "update",
    "set",
    "delete",
    "replace",
    "ignore",
    "for",
    "key",
    "asc",
    "desc",
    "div",
    "mod",
    "true",
    "false",
    "lock",
    "with",
    "table",
    "index",
    "opt_block",
];

/// Trait for rendering AST nodes back to template text.
pub trait ToSql {
    fn to_sql(&self) -> String;
}

pub fn is_reserved(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    RESERVED_WORDS.contains(&lower.as_str())
}

/// True when `name` would not lex back as the same plain word.
pub fn needs_quoting(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    if first.is_ascii_digit() || !(first.is_alphanumeric() || first == '_' || first == '$') {
        return true;
    }
    if chars.any(|c| !(c.is_alphanumeric() || c == '_' || c == '$')) {
        return true;
    }
    is_reserved(name) || crate::ast::MacroKind::from_keyword(name).is_some()
}

/// Wrap an identifier in backticks, doubling any embedded backtick.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote only when required.
pub fn escape_identifier(name: &str) -> String {
    if needs_quoting(name) {
        quote_identifier(name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_identifier() {
        assert_eq!(escape_identifier("users"), "users");
        assert_eq!(escape_identifier("order"), "`order`");
        assert_eq!(escape_identifier("ORDER"), "`ORDER`");
        assert_eq!(escape_identifier("first name"), "`first name`");
        assert_eq!(escape_identifier("2fa"), "`2fa`");
        assert_eq!(escape_identifier("odd`name"), "`odd``name`");
    }

    #[test]
    fn test_macro_keywords_need_quoting() {
        assert!(needs_quoting("opt_block"));
        assert!(needs_quoting("Loop"));
        assert!(!needs_quoting("offset"));
    }
}
