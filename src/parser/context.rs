//! Clause-context tracking.
//!
//! The parser pushes a frame when it enters a clause and pops it when the
//! clause ends. Macro bodies read the innermost frame to pick their item
//! grammar. Opaque frames mark places where no clause grammar applies
//! (function arguments, `IN` lists, join conditions, table references,
//! `LIMIT`), so a block opened there is rejected.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use super::Parser;
use crate::error::{PatternError, PatternResult, Position};

/// Which item grammar governs a macro body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClauseContext {
    /// WHERE, HAVING, SET and other plain expression positions.
    #[default]
    Expression,
    /// SELECT list: items may carry an alias.
    Projection,
    GroupBy,
    /// ORDER BY: items may carry ASC/DESC.
    OrderBy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    Clause(ClauseContext),
    Opaque(&'static str),
}

/// Stack of clause frames owned by one parse.
#[derive(Debug, Default)]
pub struct ClauseResolver {
    frames: Vec<Frame>,
}

impl ClauseResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Innermost clause context; Expression when no clause has narrowed it.
    pub fn current(&self) -> ClauseContext {
        match self.frames.last() {
            Some(Frame::Clause(ctx)) => *ctx,
            _ => ClauseContext::Expression,
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Fails when the innermost frame is opaque.
    pub fn check_block_allowed(&self, position: Position) -> PatternResult<()> {
        match self.frames.last() {
            Some(Frame::Opaque(label)) => Err(PatternError::clause(
                position,
                format!("OPT_BLOCK is not allowed inside {}", label),
            )),
            _ => Ok(()),
        }
    }
}

/// Keeps a frame pushed for as long as it lives.
pub struct ClauseGuard<'p, 'a> {
    parser: &'p mut Parser<'a>,
}

impl<'a> Parser<'a> {
    /// Push `frame`; it is popped when the returned guard drops.
    pub(crate) fn enter(&mut self, frame: Frame) -> ClauseGuard<'_, 'a> {
        self.clauses.push(frame);
        ClauseGuard { parser: self }
    }

    pub(crate) fn enter_clause(&mut self, ctx: ClauseContext) -> ClauseGuard<'_, 'a> {
        self.enter(Frame::Clause(ctx))
    }

    pub(crate) fn enter_opaque(&mut self, label: &'static str) -> ClauseGuard<'_, 'a> {
        self.enter(Frame::Opaque(label))
    }
}

impl<'a> Deref for ClauseGuard<'_, 'a> {
    type Target = Parser<'a>;

    fn deref(&self) -> &Self::Target {
        self.parser
    }
}

impl DerefMut for ClauseGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.parser
    }
}

impl Drop for ClauseGuard<'_, '_> {
    fn drop(&mut self) {
        self.parser.clauses.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_expression() {
        let resolver = ClauseResolver::new();
        assert_eq!(resolver.current(), ClauseContext::Expression);
    }

    #[test]
    fn test_opaque_frame_reads_as_expression_but_blocks_macros() {
        let mut resolver = ClauseResolver::new();
        resolver.push(Frame::Clause(ClauseContext::OrderBy));
        resolver.push(Frame::Opaque("function arguments"));
        assert_eq!(resolver.current(), ClauseContext::Expression);
        let err = resolver
            .check_block_allowed(Position::locate("", 0))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "OPT_BLOCK is not allowed inside function arguments (line 1, column 1)"
        );
        resolver.pop();
        assert_eq!(resolver.current(), ClauseContext::OrderBy);
        assert!(resolver.check_block_allowed(Position::locate("", 0)).is_ok());
    }

    #[test]
    fn test_guard_pops_on_drop() {
        let mut parser = Parser::new("SELECT 1").unwrap();
        {
            let mut guard = parser.enter_clause(ClauseContext::GroupBy);
            assert_eq!(guard.clauses.current(), ClauseContext::GroupBy);
            let inner = guard.enter_clause(ClauseContext::OrderBy);
            assert_eq!(inner.clauses.depth(), 2);
        }
        assert_eq!(parser.clauses.depth(), 0);
    }
}
