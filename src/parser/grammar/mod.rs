//! Grammar rules, one file per statement family.
//!
//! Each file adds an `impl Parser` block; rules call each other as methods.

pub mod clauses;
pub mod dml;
pub mod expressions;
pub mod macros;
pub mod query;

use crate::ast::Statement;
use crate::error::{PatternError, PatternResult};
use crate::parser::Parser;
use crate::parser::tokens::TokenKind;

impl<'a> Parser<'a> {
    /// Parse exactly one statement with an optional trailing `;`.
    pub fn parse_statement(&mut self) -> PatternResult<Statement> {
        if self.at_end() {
            return Err(PatternError::parse(None, "empty template"));
        }

        let statement = match self.peek() {
            Some(t) if t.is_keyword("SELECT") => Statement::Query(Box::new(self.parse_query()?)),
            Some(t) if t.is_keyword("INSERT") || t.is_keyword("REPLACE") => {
                Statement::Insert(self.parse_insert()?)
            }
            Some(t) if t.is_keyword("UPDATE") => Statement::Update(self.parse_update()?),
            Some(t) if t.is_keyword("DELETE") => Statement::Delete(self.parse_delete()?),
            _ => return Err(self.unexpected("SELECT, INSERT, REPLACE, UPDATE or DELETE")),
        };

        while self.consume(&TokenKind::Semicolon) {}
        if !self.at_end() {
            return Err(self.unexpected("end of statement"));
        }
        Ok(statement)
    }
}
