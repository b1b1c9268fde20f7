//! Clause-level rules shared by SELECT, UPDATE and DELETE: table references,
//! joins, clause items, ORDER BY and LIMIT.

use crate::ast::*;
use crate::error::PatternResult;
use crate::parser::Parser;
use crate::parser::context::ClauseContext;
use crate::parser::tokens::TokenKind;
use crate::transpiler::traits::is_reserved;

impl<'a> Parser<'a> {
    /// One item of the current clause, parsed with that clause's grammar.
    /// Macro bodies call this too, so their items follow the enclosing clause.
    pub(crate) fn parse_clause_item(&mut self) -> PatternResult<Expr> {
        match self.clauses.current() {
            ClauseContext::Projection => self.parse_select_item(),
            ClauseContext::OrderBy => self.parse_order_item(),
            ClauseContext::Expression | ClauseContext::GroupBy => self.parse_expr(),
        }
    }

    /// expr [[AS] alias] or *
    fn parse_select_item(&mut self) -> PatternResult<Expr> {
        if self.consume(&TokenKind::Star) {
            return Ok(Expr::Wildcard);
        }
        let expr = self.parse_expr()?;
        if matches!(expr, Expr::Macro(_) | Expr::QualifiedWildcard(_)) {
            return Ok(expr);
        }
        Ok(match self.parse_optional_alias()? {
            Some(alias) => Expr::Alias {
                expr: Box::new(expr),
                alias,
            },
            None => expr,
        })
    }

    /// expr [ASC|DESC]
    fn parse_order_item(&mut self) -> PatternResult<Expr> {
        let expr = self.parse_expr()?;
        let order = if self.parse_keyword("ASC") {
            SortOrder::Asc
        } else if self.parse_keyword("DESC") {
            SortOrder::Desc
        } else {
            return Ok(expr);
        };
        Ok(expr.ordered(order))
    }

    /// `AS name`, or a bare non-reserved name.
    pub(crate) fn parse_optional_alias(&mut self) -> PatternResult<Option<Ident>> {
        if self.parse_keyword("AS") {
            return self.parse_identifier().map(Some);
        }
        match self.peek() {
            Some(TokenKind::Word(w)) if !is_reserved(w) => self.parse_identifier().map(Some),
            Some(TokenKind::QuotedIdent(_)) => self.parse_identifier().map(Some),
            _ => Ok(None),
        }
    }

    pub(crate) fn parse_where(&mut self) -> PatternResult<Option<Expr>> {
        if !self.parse_keyword("WHERE") {
            return Ok(None);
        }
        let mut p = self.enter_clause(ClauseContext::Expression);
        p.parse_expr().map(Some)
    }

    pub(crate) fn parse_order_by(&mut self) -> PatternResult<Vec<Expr>> {
        if !self.parse_keywords(&["ORDER", "BY"]) {
            return Ok(Vec::new());
        }
        let mut p = self.enter_clause(ClauseContext::OrderBy);
        p.parse_comma_separated(|p| p.parse_clause_item())
    }

    /// LIMIT n | LIMIT o, n | LIMIT n OFFSET o
    pub(crate) fn parse_limit(&mut self) -> PatternResult<Option<Limit>> {
        if !self.parse_keyword("LIMIT") {
            return Ok(None);
        }
        let mut p = self.enter_opaque("LIMIT");
        let first = p.parse_expr()?;
        let limit = if p.consume(&TokenKind::Comma) {
            Limit {
                count: p.parse_expr()?,
                offset: Some(first),
            }
        } else if p.parse_keyword("OFFSET") {
            Limit {
                count: first,
                offset: Some(p.parse_expr()?),
            }
        } else {
            Limit {
                count: first,
                offset: None,
            }
        };
        Ok(Some(limit))
    }

    pub(crate) fn parse_table_with_joins(&mut self) -> PatternResult<TableWithJoins> {
        let relation = self.parse_table_factor()?;
        let mut joins = Vec::new();
        while let Some(kind) = self.parse_join_kind() {
            let relation = self.parse_table_factor()?;
            let constraint = if self.parse_keyword("ON") {
                let mut p = self.enter_opaque("a join condition");
                JoinConstraint::On(p.parse_expr()?)
            } else if self.parse_keyword("USING") {
                self.expect(&TokenKind::LParen)?;
                let columns = self.parse_comma_separated(|p| p.parse_identifier())?;
                self.expect(&TokenKind::RParen)?;
                JoinConstraint::Using(columns)
            } else {
                JoinConstraint::None
            };
            joins.push(Join {
                kind,
                relation,
                constraint,
            });
        }
        Ok(TableWithJoins { relation, joins })
    }

    fn parse_join_kind(&mut self) -> Option<JoinKind> {
        if self.parse_keyword("JOIN") || self.parse_keywords(&["INNER", "JOIN"]) {
            Some(JoinKind::Inner)
        } else if self.parse_keywords(&["LEFT", "JOIN"])
            || self.parse_keywords(&["LEFT", "OUTER", "JOIN"])
        {
            Some(JoinKind::Left)
        } else if self.parse_keywords(&["RIGHT", "JOIN"])
            || self.parse_keywords(&["RIGHT", "OUTER", "JOIN"])
        {
            Some(JoinKind::Right)
        } else if self.parse_keywords(&["CROSS", "JOIN"]) {
            Some(JoinKind::Cross)
        } else if self.parse_keyword("STRAIGHT_JOIN") {
            Some(JoinKind::Straight)
        } else {
            None
        }
    }

    /// table [AS alias] or ( SELECT ... ) [AS alias]
    fn parse_table_factor(&mut self) -> PatternResult<TableFactor> {
        if self.consume(&TokenKind::LParen) {
            if !self.peek_keyword("SELECT") {
                return Err(self.unexpected("SELECT"));
            }
            let subquery = self.parse_query()?;
            self.expect(&TokenKind::RParen)?;
            let alias = self.parse_optional_alias()?;
            return Ok(TableFactor::Derived {
                subquery: Box::new(subquery),
                alias,
            });
        }
        let name = self.parse_object_name()?;
        let alias = self.parse_optional_alias()?;
        Ok(TableFactor::Table { name, alias })
    }
}
