//! SELECT and UNION.

use crate::ast::*;
use crate::error::PatternResult;
use crate::parser::Parser;
use crate::parser::context::ClauseContext;

impl<'a> Parser<'a> {
    pub(crate) fn parse_query(&mut self) -> PatternResult<Query> {
        self.descend(|p| {
            let select = p.parse_select()?;
            let mut unions = Vec::new();
            while p.parse_keyword("UNION") {
                let all = p.parse_keyword("ALL");
                if !all {
                    p.parse_keyword("DISTINCT");
                }
                unions.push(Union {
                    all,
                    select: p.parse_select()?,
                });
            }
            Ok(Query { select, unions })
        })
    }

    fn parse_select(&mut self) -> PatternResult<Select> {
        self.expect_keyword("SELECT")?;
        let distinct = self.parse_keyword("DISTINCT");
        if !distinct {
            self.parse_keyword("ALL");
        }

        let projection = {
            let mut p = self.enter_clause(ClauseContext::Projection);
            p.parse_comma_separated(|p| p.parse_clause_item())?
        };

        let from = if self.parse_keyword("FROM") {
            let mut p = self.enter_opaque("FROM");
            p.parse_comma_separated(|p| p.parse_table_with_joins())?
        } else {
            Vec::new()
        };

        let selection = self.parse_where()?;

        let group_by = if self.parse_keywords(&["GROUP", "BY"]) {
            let mut p = self.enter_clause(ClauseContext::GroupBy);
            p.parse_comma_separated(|p| p.parse_clause_item())?
        } else {
            Vec::new()
        };

        let having = if self.parse_keyword("HAVING") {
            let mut p = self.enter_clause(ClauseContext::Expression);
            Some(p.parse_expr()?)
        } else {
            None
        };

        let order_by = self.parse_order_by()?;
        let limit = self.parse_limit()?;
        let lock = self.parse_lock();

        Ok(Select {
            distinct,
            projection,
            from,
            selection,
            group_by,
            having,
            order_by,
            limit,
            lock,
        })
    }

    /// FOR UPDATE | FOR SHARE | LOCK IN SHARE MODE
    fn parse_lock(&mut self) -> Option<LockMode> {
        if self.parse_keywords(&["FOR", "UPDATE"]) {
            Some(LockMode::Update)
        } else if self.parse_keywords(&["FOR", "SHARE"])
            || self.parse_keywords(&["LOCK", "IN", "SHARE", "MODE"])
        {
            Some(LockMode::Share)
        } else {
            None
        }
    }
}
