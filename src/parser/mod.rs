//! Template parser.
//!
//! A recursive-descent parser over the token stream from [`tokens`]. The
//! base grammar is a MySQL-flavoured subset; macros are parsed wherever an
//! expression or clause item may appear.
//!
//! ```text
//! SELECT OPT_BLOCK proj [ REQUIRED(id, name), OPTIONAL(age, email) ]
//! FROM users
//! WHERE OPT_BLOCK filt [ OPTIONAL(status = ?, age > ?) ]
//! ```

pub mod context;
pub mod grammar;
pub mod tokens;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use crate::ast::*;
use crate::error::{PatternError, PatternResult, Position};
use crate::transpiler::traits::is_reserved;

use self::context::ClauseResolver;
use self::tokens::{Token, TokenKind, tokenize};

pub use self::context::ClauseContext;

/// Nesting limit used by [`parse`].
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Highest accepted nesting limit. Deeper recursion can exhaust a 2 MiB
/// worker stack in debug builds.
pub const MAX_DEPTH_LIMIT: usize = 64;

/// Parse one template into a statement.
pub fn parse(input: &str) -> PatternResult<Statement> {
    parse_with_depth(input, DEFAULT_MAX_DEPTH)
}

/// Parse one template, failing once expressions nest deeper than `max_depth`
/// (clamped to `1..=MAX_DEPTH_LIMIT`).
pub fn parse_with_depth(input: &str, max_depth: usize) -> PatternResult<Statement> {
    let mut parser = Parser::new(input)?;
    parser.max_depth = max_depth.clamp(1, MAX_DEPTH_LIMIT);
    parser.parse_statement()
}

/// OPT_BLOCK names seen so far in one template, and how many blocks are open.
#[derive(Debug, Default)]
pub(crate) struct BlockScope {
    declared: HashMap<String, Position>,
    open: usize,
}

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    clauses: ClauseResolver,
    blocks: BlockScope,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> PatternResult<Self> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            pos: 0,
            clauses: ClauseResolver::new(),
            blocks: BlockScope::default(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    pub(crate) fn peek(&self) -> Option<&TokenKind> {
        self.peek_nth(0)
    }

    pub(crate) fn peek_nth(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + n).map(|t| &t.kind)
    }

    pub(crate) fn next_token(&mut self) -> Option<TokenKind> {
        let token = self.tokens.get(self.pos)?.kind.clone();
        self.pos += 1;
        Some(token)
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Position of the next token, or end of input.
    pub(crate) fn position(&self) -> Position {
        let offset = self
            .tokens
            .get(self.pos)
            .map_or(self.source.len(), |t| t.offset);
        Position::locate(self.source, offset)
    }

    pub(crate) fn peek_keyword(&self, keyword: &str) -> bool {
        self.peek().is_some_and(|t| t.is_keyword(keyword))
    }

    /// Consume `keyword` if it is next.
    pub(crate) fn parse_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume the whole keyword sequence, or nothing.
    pub(crate) fn parse_keywords(&mut self, keywords: &[&str]) -> bool {
        let matched = keywords
            .iter()
            .enumerate()
            .all(|(i, kw)| self.peek_nth(i).is_some_and(|t| t.is_keyword(kw)));
        if matched {
            self.pos += keywords.len();
        }
        matched
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> PatternResult<()> {
        if self.parse_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    pub(crate) fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind) -> PatternResult<()> {
        if self.consume(kind) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", kind)))
        }
    }

    /// Error describing the next token against what was `expected`.
    pub(crate) fn unexpected(&self, expected: &str) -> PatternError {
        match self.peek() {
            Some(found) => PatternError::parse(
                Some(self.position()),
                format!("expected {}, found '{}'", expected, found),
            ),
            None => PatternError::parse(None, format!("expected {}, found end of input", expected)),
        }
    }

    pub(crate) fn parse_comma_separated<T>(
        &mut self,
        mut f: impl FnMut(&mut Self) -> PatternResult<T>,
    ) -> PatternResult<Vec<T>> {
        let mut items = vec![f(self)?];
        while self.consume(&TokenKind::Comma) {
            items.push(f(self)?);
        }
        Ok(items)
    }

    /// A plain word that is not reserved, or a backticked name.
    pub(crate) fn parse_identifier(&mut self) -> PatternResult<Ident> {
        match self.peek() {
            Some(TokenKind::Word(w)) if !is_reserved(w) => {
                let ident = Ident::bare(w.clone());
                self.pos += 1;
                Ok(ident)
            }
            Some(TokenKind::QuotedIdent(w)) => {
                let ident = Ident::quoted(w.clone());
                self.pos += 1;
                Ok(ident)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// After a dot any word names a member, reserved or not.
    pub(crate) fn parse_member(&mut self) -> PatternResult<Ident> {
        match self.peek() {
            Some(TokenKind::Word(w)) => {
                let ident = Ident::bare(w.clone());
                self.pos += 1;
                Ok(ident)
            }
            _ => self.parse_identifier(),
        }
    }

    /// name or db.name
    pub(crate) fn parse_object_name(&mut self) -> PatternResult<Vec<Ident>> {
        let mut parts = vec![self.parse_identifier()?];
        while self.consume(&TokenKind::Dot) {
            parts.push(self.parse_member()?);
        }
        Ok(parts)
    }

    /// Run `f` one nesting level deeper, failing past `max_depth`.
    pub(crate) fn descend<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> PatternResult<T>,
    ) -> PatternResult<T> {
        if self.depth >= self.max_depth {
            return Err(PatternError::parse(
                Some(self.position()),
                format!("nesting exceeds maximum depth of {}", self.max_depth),
            ));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}
