//! Normalization of raw template text before parsing.

use crate::parser::tokens::is_dash_comment;

/// Clean with brace rewriting enabled.
pub fn clean(raw: &str) -> String {
    clean_with(raw, true)
}

/// Replace literal `\n` escape pairs with newlines, optionally rewrite `{`/`}`
/// to `[`/`]` outside quoted literals, then trim. Comments are not literals:
/// quotes inside them open nothing and their braces are rewritten.
pub fn clean_with(raw: &str, rewrite_braces: bool) -> String {
    let unescaped = raw.replace("\\n", "\n");
    if !rewrite_braces {
        return unescaped.trim().to_string();
    }

    let mut out = String::with_capacity(unescaped.len());
    let mut rest = unescaped.as_str();
    while let Some(c) = rest.chars().next() {
        let len = match c {
            '\'' | '"' | '`' => {
                let len = quoted_len(rest, c);
                out.push_str(&rest[..len]);
                len
            }
            _ => {
                let len = comment_len(rest).unwrap_or(c.len_utf8());
                out.extend(rest[..len].chars().map(|c| match c {
                    '{' => '[',
                    '}' => ']',
                    c => c,
                }));
                len
            }
        };
        rest = &rest[len..];
    }
    out.trim().to_string()
}

/// Byte length of the quoted span at the start of `input`, closing quote
/// included. An unterminated span runs to the end.
fn quoted_len(input: &str, quote: char) -> usize {
    let mut chars = input.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\\' && quote != '`' {
            chars.next();
        } else if c == quote {
            match chars.peek() {
                Some(&(_, next)) if next == quote => {
                    chars.next();
                }
                _ => return i + c.len_utf8(),
            }
        }
    }
    input.len()
}

/// Byte length of the comment at the start of `input`, if one starts there.
/// Line comments stop before their newline.
fn comment_len(input: &str) -> Option<usize> {
    if let Some(body) = input.strip_prefix("/*") {
        return Some(body.find("*/").map_or(input.len(), |i| i + 4));
    }
    if input.starts_with('#') || is_dash_comment(input) {
        return Some(input.find('\n').unwrap_or(input.len()));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_escapes_and_braces() {
        assert_eq!(clean("a\\nb{x}"), "a\nb[x]");
    }

    #[test]
    fn test_clean_trims() {
        assert_eq!(clean("  \\n SELECT 1 \\n "), "SELECT 1");
    }

    #[test]
    fn test_braces_inside_strings_survive() {
        assert_eq!(
            clean("WHERE OPT_BLOCK f { a = '{x}' AND b = \"it\\\"s {y}\" AND `c{d}` = 1 }"),
            "WHERE OPT_BLOCK f [ a = '{x}' AND b = \"it\\\"s {y}\" AND `c{d}` = 1 ]"
        );
    }

    #[test]
    fn test_doubled_quote_stays_in_literal() {
        assert_eq!(clean("'it''s {a}' {b}"), "'it''s {a}' [b]");
    }

    #[test]
    fn test_quotes_inside_comments_open_nothing() {
        assert_eq!(
            clean("SELECT id FROM users -- user's filters\\nWHERE OPT_BLOCK f { OPTIONAL(a = ?) }"),
            "SELECT id FROM users -- user's filters\nWHERE OPT_BLOCK f [ OPTIONAL(a = ?) ]"
        );
        assert_eq!(clean("# it's {a}\n{b}"), "# it's [a]\n[b]");
        assert_eq!(clean("/* don't */ {b} '{c}'"), "/* don't */ [b] '{c}'");
    }

    #[test]
    fn test_dash_without_space_is_not_a_comment() {
        assert_eq!(clean("a --'{x}' {y}"), "a --'{x}' [y]");
    }

    #[test]
    fn test_rewrite_disabled() {
        assert_eq!(clean_with("a\\n{b}", false), "a\n{b}");
    }
}
