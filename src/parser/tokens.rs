//! Tokenizer for template text.
//!
//! Recognizes the MySQL token set plus the macro introducers. `OPT_BLOCK` is
//! always a macro token; `REQUIRED`, `OPTIONAL` and `LOOP` become macro tokens
//! only when the next token is `(` (comments in between are skipped), so
//! columns with those names keep working.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_until, take_while, take_while1},
    character::complete::{char, digit0, digit1, hex_digit1, multispace1, one_of},
    combinator::{map, opt, recognize, value},
    sequence::{pair, preceded, tuple},
};

use crate::ast::MacroKind;
use crate::error::{PatternError, PatternResult, Position};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Word(String),
    /// `name` with backticks stripped and doubled backticks collapsed.
    QuotedIdent(String),
    Macro(MacroKind),
    Number(String),
    /// String literal, escapes decoded.
    String(String),
    Placeholder,
    NamedPlaceholder(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Semicolon,
    Star,
    Plus,
    Minus,
    Slash,
    Percent,
    Tilde,
    Bang,
    Eq,
    NullSafeEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    ShiftLeft,
    ShiftRight,
    Pipe,
    DoublePipe,
    Amp,
    DoubleAmp,
}

impl TokenKind {
    /// True for a bare word equal to `keyword`, ignoring case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, TokenKind::Word(w) if w.eq_ignore_ascii_case(keyword))
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Word(w) => write!(f, "{}", w),
            TokenKind::QuotedIdent(w) => write!(f, "`{}`", w),
            TokenKind::Macro(kind) => write!(f, "{}", kind),
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::String(s) => write!(f, "'{}'", s),
            TokenKind::Placeholder => write!(f, "?"),
            TokenKind::NamedPlaceholder(n) => write!(f, ":{}", n),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Tilde => write!(f, "~"),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::Eq => write!(f, "="),
            TokenKind::NullSafeEq => write!(f, "<=>"),
            TokenKind::NotEq => write!(f, "<>"),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::LtEq => write!(f, "<="),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::GtEq => write!(f, ">="),
            TokenKind::ShiftLeft => write!(f, "<<"),
            TokenKind::ShiftRight => write!(f, ">>"),
            TokenKind::Pipe => write!(f, "|"),
            TokenKind::DoublePipe => write!(f, "||"),
            TokenKind::Amp => write!(f, "&"),
            TokenKind::DoubleAmp => write!(f, "&&"),
        }
    }
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Split `source` into tokens, skipping whitespace and comments.
pub fn tokenize(source: &str) -> PatternResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut input = source;
    loop {
        input = skip_trivia(input).map_err(|rest| {
            PatternError::parse(
                Some(Position::locate(source, source.len() - rest.len())),
                "unterminated comment",
            )
        })?;
        if input.is_empty() {
            return Ok(tokens);
        }
        let offset = source.len() - input.len();
        match token(input) {
            Ok((rest, kind)) => {
                tokens.push(Token { kind, offset });
                input = rest;
            }
            Err(_) => {
                let position = Some(Position::locate(source, offset));
                let message = match input.chars().next() {
                    Some('\'') | Some('"') => "unterminated string literal".to_string(),
                    Some('`') => "unterminated quoted identifier".to_string(),
                    Some(c) => format!("unexpected character '{}'", c),
                    None => "unexpected end of input".to_string(),
                };
                return Err(PatternError::parse(position, message));
            }
        }
    }
}

/// Consume whitespace and comments. On an unterminated block comment, returns
/// the input starting at the comment.
fn skip_trivia(mut input: &str) -> Result<&str, &str> {
    loop {
        let before = input.len();
        if let Ok((rest, _)) = multispace1::<_, nom::error::Error<&str>>(input) {
            input = rest;
        }
        if let Some(rest) = input.strip_prefix("/*") {
            match take_until::<_, _, nom::error::Error<&str>>("*/")(rest) {
                Ok((rest, _)) => input = &rest[2..],
                Err(_) => return Err(input),
            }
        } else if input.starts_with('#') || is_dash_comment(input) {
            input = input.find('\n').map_or("", |i| &input[i..]);
        }
        if input.len() == before {
            return Ok(input);
        }
    }
}

/// `--` starts a comment only when followed by whitespace or end of input.
pub(crate) fn is_dash_comment(input: &str) -> bool {
    input
        .strip_prefix("--")
        .is_some_and(|rest| rest.chars().next().is_none_or(char::is_whitespace))
}

fn token(input: &str) -> IResult<&str, TokenKind> {
    alt((
        word_or_macro,
        number,
        string_literal,
        quoted_ident,
        named_placeholder,
        value(TokenKind::Placeholder, char('?')),
        operator,
        punctuation,
    ))(input)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn word_or_macro(input: &str) -> IResult<&str, TokenKind> {
    let (rest, word) = recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_' || c == '$'),
        take_while(is_word_char),
    ))(input)?;
    let kind = match MacroKind::from_keyword(word) {
        Some(MacroKind::OptionalBlock) => TokenKind::Macro(MacroKind::OptionalBlock),
        Some(kind) if skip_trivia(rest).is_ok_and(|next| next.starts_with('(')) => {
            TokenKind::Macro(kind)
        }
        _ => TokenKind::Word(word.to_string()),
    };
    Ok((rest, kind))
}

fn number(input: &str) -> IResult<&str, TokenKind> {
    let hex = recognize(preceded(tag_no_case("0x"), hex_digit1));
    let decimal = recognize(tuple((
        digit1,
        opt(pair(char('.'), digit0)),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )));
    let (rest, text) = alt((hex, decimal))(input)?;
    if rest.starts_with(is_word_char) {
        // 1abc is not a number followed by a word
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        )));
    }
    Ok((rest, TokenKind::Number(text.to_string())))
}

/// Quoted text with `quote` doubled or backslash-escaped.
fn quoted_body(input: &str, quote: char, backslash: bool) -> IResult<&str, String> {
    let (mut rest, _) = char(quote)(input)?;
    let mut out = String::new();
    loop {
        let mut chars = rest.chars();
        match chars.next() {
            None => {
                return Err(nom::Err::Error(nom::error::Error::new(
                    rest,
                    nom::error::ErrorKind::Char,
                )));
            }
            Some(c) if c == quote => {
                if chars.next() == Some(quote) {
                    out.push(quote);
                    rest = &rest[2 * quote.len_utf8()..];
                } else {
                    return Ok((&rest[quote.len_utf8()..], out));
                }
            }
            Some('\\') if backslash => {
                let escaped = chars.next().ok_or_else(|| {
                    nom::Err::Error(nom::error::Error::new(rest, nom::error::ErrorKind::Char))
                })?;
                match escaped {
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    '0' => out.push('\0'),
                    '\\' | '\'' | '"' => out.push(escaped),
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
                rest = &rest[1 + escaped.len_utf8()..];
            }
            Some(c) => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
}

fn string_literal(input: &str) -> IResult<&str, TokenKind> {
    let (rest, body) = alt((
        |i| quoted_body(i, '\'', true),
        |i| quoted_body(i, '"', true),
    ))(input)?;
    Ok((rest, TokenKind::String(body)))
}

fn quoted_ident(input: &str) -> IResult<&str, TokenKind> {
    map(|i| quoted_body(i, '`', false), TokenKind::QuotedIdent)(input)
}

fn named_placeholder(input: &str) -> IResult<&str, TokenKind> {
    map(preceded(char(':'), take_while1(is_word_char)), |name: &str| {
        TokenKind::NamedPlaceholder(name.to_string())
    })(input)
}

fn operator(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::NullSafeEq, tag("<=>")),
        value(TokenKind::LtEq, tag("<=")),
        value(TokenKind::NotEq, tag("<>")),
        value(TokenKind::ShiftLeft, tag("<<")),
        value(TokenKind::GtEq, tag(">=")),
        value(TokenKind::ShiftRight, tag(">>")),
        value(TokenKind::NotEq, tag("!=")),
        value(TokenKind::DoublePipe, tag("||")),
        value(TokenKind::DoubleAmp, tag("&&")),
        value(TokenKind::Lt, char('<')),
        value(TokenKind::Gt, char('>')),
        value(TokenKind::Eq, char('=')),
        value(TokenKind::Bang, char('!')),
        value(TokenKind::Pipe, char('|')),
        value(TokenKind::Amp, char('&')),
        value(TokenKind::Tilde, char('~')),
    ))(input)
}

fn punctuation(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::LParen, char('(')),
        value(TokenKind::RParen, char(')')),
        value(TokenKind::LBracket, char('[')),
        value(TokenKind::RBracket, char(']')),
        value(TokenKind::Comma, char(',')),
        value(TokenKind::Dot, char('.')),
        value(TokenKind::Semicolon, char(';')),
        value(TokenKind::Star, char('*')),
        value(TokenKind::Plus, char('+')),
        value(TokenKind::Minus, char('-')),
        value(TokenKind::Slash, char('/')),
        value(TokenKind::Percent, char('%')),
    ))(input)
}
