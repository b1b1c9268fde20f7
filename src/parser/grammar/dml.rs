//! INSERT, REPLACE, UPDATE and DELETE.

use crate::ast::*;
use crate::error::{PatternError, PatternResult};
use crate::parser::Parser;
use crate::parser::context::ClauseContext;
use crate::parser::tokens::TokenKind;

impl<'a> Parser<'a> {
    /// INSERT [IGNORE] INTO t [(cols)] VALUES rows | SELECT ... [ON DUPLICATE KEY UPDATE ...]
    pub(crate) fn parse_insert(&mut self) -> PatternResult<Insert> {
        let replace = if self.parse_keyword("REPLACE") {
            true
        } else {
            self.expect_keyword("INSERT")?;
            false
        };
        let ignore = self.parse_keyword("IGNORE");
        self.expect_keyword("INTO")?;
        let table = self.parse_object_name()?;

        let columns = if self.peek() == Some(&TokenKind::LParen) && !self.peek_nth_keyword(1, "SELECT") {
            self.pos += 1;
            let columns = {
                let mut p = self.enter_clause(ClauseContext::Expression);
                p.parse_comma_separated(|p| p.parse_insert_column())?
            };
            self.expect(&TokenKind::RParen)?;
            columns
        } else {
            Vec::new()
        };

        let source = if self.parse_keyword("VALUES") || self.parse_keyword("VALUE") {
            let mut p = self.enter_clause(ClauseContext::Expression);
            InsertSource::Values(p.parse_comma_separated(|p| p.parse_values_row())?)
        } else if self.peek_keyword("SELECT") {
            InsertSource::Query(Box::new(self.parse_query()?))
        } else if self.peek() == Some(&TokenKind::LParen) {
            self.pos += 1;
            let query = self.parse_query()?;
            self.expect(&TokenKind::RParen)?;
            InsertSource::Query(Box::new(query))
        } else {
            return Err(self.unexpected("VALUES or SELECT"));
        };

        let on_duplicate = if self.parse_keywords(&["ON", "DUPLICATE", "KEY", "UPDATE"]) {
            self.parse_assignments()?
        } else {
            Vec::new()
        };

        Ok(Insert {
            replace,
            ignore,
            table,
            columns,
            source,
            on_duplicate,
        })
    }

    fn peek_nth_keyword(&self, n: usize, keyword: &str) -> bool {
        self.peek_nth(n).is_some_and(|t| t.is_keyword(keyword))
    }

    /// A column name, or a macro whose items are all column names.
    fn parse_insert_column(&mut self) -> PatternResult<Expr> {
        let position = self.position();
        let expr = self.parse_clause_item()?;
        if is_column_list_item(&expr) {
            Ok(expr)
        } else {
            Err(PatternError::parse(Some(position), "expected column name"))
        }
    }

    /// `( values )` or a macro producing rows.
    fn parse_values_row(&mut self) -> PatternResult<Expr> {
        if self.consume(&TokenKind::LParen) {
            let row = if self.peek() == Some(&TokenKind::RParen) {
                Vec::new()
            } else {
                self.parse_comma_separated(|p| p.parse_clause_item())?
            };
            self.expect(&TokenKind::RParen)?;
            return Ok(Expr::Tuple(row));
        }
        if let Some(TokenKind::Macro(kind)) = self.peek().cloned() {
            return self.parse_macro(kind);
        }
        Err(self.unexpected("'(' or a macro"))
    }

    /// col = expr, ... in the Expression context.
    fn parse_assignments(&mut self) -> PatternResult<Vec<Expr>> {
        let mut p = self.enter_clause(ClauseContext::Expression);
        p.parse_comma_separated(|p| {
            let position = p.position();
            let item = p.parse_clause_item()?;
            if is_assignment(&item) {
                Ok(item)
            } else {
                Err(PatternError::parse(
                    Some(position),
                    "expected assignment 'column = value'",
                ))
            }
        })
    }

    /// UPDATE t [JOIN ...] SET assignments [WHERE] [ORDER BY] [LIMIT]
    pub(crate) fn parse_update(&mut self) -> PatternResult<Update> {
        self.expect_keyword("UPDATE")?;
        let table = {
            let mut p = self.enter_opaque("table references");
            p.parse_table_with_joins()?
        };
        self.expect_keyword("SET")?;
        let assignments = self.parse_assignments()?;
        let selection = self.parse_where()?;
        let order_by = self.parse_order_by()?;
        let limit = self.parse_limit()?;
        Ok(Update {
            table,
            assignments,
            selection,
            order_by,
            limit,
        })
    }

    /// DELETE FROM t [alias] [WHERE] [ORDER BY] [LIMIT]
    pub(crate) fn parse_delete(&mut self) -> PatternResult<Delete> {
        self.expect_keyword("DELETE")?;
        self.expect_keyword("FROM")?;
        let table = self.parse_object_name()?;
        let alias = self.parse_optional_alias()?;
        let selection = self.parse_where()?;
        let order_by = self.parse_order_by()?;
        let limit = self.parse_limit()?;
        Ok(Delete {
            table,
            alias,
            selection,
            order_by,
            limit,
        })
    }
}

fn is_column_list_item(expr: &Expr) -> bool {
    match expr {
        Expr::Macro(m) => m.children().iter().all(is_column_list_item),
        e => e.is_column(),
    }
}

fn is_assignment(expr: &Expr) -> bool {
    match expr {
        Expr::Macro(m) => m.children().iter().all(is_assignment),
        Expr::Binary {
            left,
            op: BinaryOp::Eq,
            ..
        } => left.is_column(),
        _ => false,
    }
}
