//! Template generator.
//!
//! Renders a parsed statement back into canonical single-line template text:
//! keywords upper-case, one space between tokens, `, ` between list items,
//! macros in their source shape.

pub mod traits;

pub use traits::{ToSql, escape_identifier, quote_identifier};

use crate::ast::*;

/// Binding strength of an expression when rendered.
fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary { op, .. } => op.precedence(),
        Expr::Unary {
            op: UnaryOp::Not, ..
        } => 4,
        Expr::Unary { .. } => 11,
        Expr::IsNull { .. }
        | Expr::IsBool { .. }
        | Expr::InList { .. }
        | Expr::InSubquery { .. }
        | Expr::Between { .. }
        | Expr::Like { .. }
        | Expr::Regexp { .. } => 5,
        Expr::Alias { .. } | Expr::Ordered { .. } => 0,
        _ => 12,
    }
}

/// Render `expr`, parenthesized when it binds looser than `min`.
fn operand(expr: &Expr, min: u8) -> String {
    let sql = expr.to_sql();
    if precedence(expr) < min {
        format!("({})", sql)
    } else {
        sql
    }
}

fn join<T: ToSql>(items: &[T]) -> String {
    items.iter().map(ToSql::to_sql).collect::<Vec<_>>().join(", ")
}

fn object_name(parts: &[Ident]) -> String {
    parts.iter().map(ToSql::to_sql).collect::<Vec<_>>().join(".")
}

impl ToSql for Ident {
    fn to_sql(&self) -> String {
        if self.quoted {
            quote_identifier(&self.value)
        } else {
            self.value.clone()
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> String {
        self.to_string()
    }
}

impl ToSql for Macro {
    fn to_sql(&self) -> String {
        match self {
            Macro::OptionalBlock { name, children } => {
                format!("OPT_BLOCK {} [{}]", escape_identifier(name), join(children))
            }
            group => format!("{}({})", group.kind().keyword(), join(group.children())),
        }
    }
}

impl ToSql for Expr {
    fn to_sql(&self) -> String {
        match self {
            Expr::Identifier(ident) => ident.to_sql(),
            Expr::CompoundIdentifier(parts) => object_name(parts),
            Expr::Wildcard => "*".to_string(),
            Expr::QualifiedWildcard(parts) => format!("{}.*", object_name(parts)),
            Expr::Value(v) => v.to_sql(),
            Expr::Unary { op, expr } => match op {
                UnaryOp::Not => format!("NOT {}", operand(expr, 4)),
                _ => {
                    let inner = operand(expr, 11);
                    // "- -x" must not collapse into a "--" comment
                    if matches!(op, UnaryOp::Minus | UnaryOp::Plus) && inner.starts_with(['-', '+']) {
                        format!("{} {}", op, inner)
                    } else {
                        format!("{}{}", op, inner)
                    }
                }
            },
            Expr::Binary { left, op, right } => {
                let p = op.precedence();
                format!("{} {} {}", operand(left, p), op, operand(right, p + 1))
            }
            Expr::IsNull { expr, negated } => {
                let not = if *negated { "NOT " } else { "" };
                format!("{} IS {}NULL", operand(expr, 5), not)
            }
            Expr::IsBool {
                expr,
                value,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                let value = if *value { "TRUE" } else { "FALSE" };
                format!("{} IS {}{}", operand(expr, 5), not, value)
            }
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                format!("{} {}IN ({})", operand(expr, 5), not, join(list))
            }
            Expr::InSubquery {
                expr,
                subquery,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                format!("{} {}IN ({})", operand(expr, 5), not, subquery.to_sql())
            }
            Expr::Between {
                expr,
                negated,
                low,
                high,
            } => {
                let not = if *negated { "NOT " } else { "" };
                format!(
                    "{} {}BETWEEN {} AND {}",
                    operand(expr, 5),
                    not,
                    operand(low, 6),
                    operand(high, 6)
                )
            }
            Expr::Like {
                expr,
                negated,
                pattern,
                escape,
            } => {
                let not = if *negated { "NOT " } else { "" };
                let mut sql = format!("{} {}LIKE {}", operand(expr, 5), not, operand(pattern, 6));
                if let Some(escape) = escape {
                    sql.push_str(" ESCAPE ");
                    sql.push_str(&operand(escape, 12));
                }
                sql
            }
            Expr::Regexp {
                expr,
                negated,
                pattern,
            } => {
                let not = if *negated { "NOT " } else { "" };
                format!("{} {}REGEXP {}", operand(expr, 5), not, operand(pattern, 6))
            }
            Expr::Function(func) => {
                let distinct = if func.distinct { "DISTINCT " } else { "" };
                format!("{}({}{})", func.name, distinct, join(&func.args))
            }
            Expr::Case {
                operand: subject,
                when_clauses,
                else_result,
            } => {
                let mut sql = String::from("CASE");
                if let Some(subject) = subject {
                    sql.push(' ');
                    sql.push_str(&subject.to_sql());
                }
                for when in when_clauses {
                    sql.push_str(&format!(
                        " WHEN {} THEN {}",
                        when.condition.to_sql(),
                        when.result.to_sql()
                    ));
                }
                if let Some(else_result) = else_result {
                    sql.push_str(" ELSE ");
                    sql.push_str(&else_result.to_sql());
                }
                sql.push_str(" END");
                sql
            }
            Expr::Cast { expr, data_type } => format!("CAST({} AS {})", expr.to_sql(), data_type),
            Expr::Interval { value, unit } => format!("INTERVAL {} {}", operand(value, 6), unit),
            Expr::Exists(q) => format!("EXISTS ({})", q.to_sql()),
            Expr::Subquery(q) => format!("({})", q.to_sql()),
            Expr::Nested(inner) => format!("({})", inner.to_sql()),
            Expr::Tuple(items) => format!("({})", join(items)),
            Expr::Alias { expr, alias } => format!("{} AS {}", operand(expr, 1), alias.to_sql()),
            Expr::Ordered { expr, order } => format!("{} {}", operand(expr, 1), order),
            Expr::Macro(m) => m.to_sql(),
        }
    }
}

impl ToSql for TableFactor {
    fn to_sql(&self) -> String {
        let (mut sql, alias) = match self {
            TableFactor::Table { name, alias } => (object_name(name), alias),
            TableFactor::Derived { subquery, alias } => (format!("({})", subquery.to_sql()), alias),
        };
        if let Some(alias) = alias {
            sql.push_str(" AS ");
            sql.push_str(&alias.to_sql());
        }
        sql
    }
}

impl ToSql for TableWithJoins {
    fn to_sql(&self) -> String {
        let mut sql = self.relation.to_sql();
        for join in &self.joins {
            sql.push_str(&format!(" {} {}", join.kind, join.relation.to_sql()));
            match &join.constraint {
                JoinConstraint::On(expr) => {
                    sql.push_str(" ON ");
                    sql.push_str(&expr.to_sql());
                }
                JoinConstraint::Using(cols) => {
                    sql.push_str(&format!(" USING ({})", join_idents(cols)));
                }
                JoinConstraint::None => {}
            }
        }
        sql
    }
}

fn join_idents(idents: &[Ident]) -> String {
    idents.iter().map(ToSql::to_sql).collect::<Vec<_>>().join(", ")
}

impl ToSql for Limit {
    fn to_sql(&self) -> String {
        match &self.offset {
            Some(offset) => format!("LIMIT {} OFFSET {}", self.count.to_sql(), offset.to_sql()),
            None => format!("LIMIT {}", self.count.to_sql()),
        }
    }
}

/// Shared tail for SELECT, UPDATE and DELETE.
fn push_tail(sql: &mut String, selection: Option<&Expr>, order_by: &[Expr], limit: Option<&Limit>) {
    if let Some(selection) = selection {
        sql.push_str(" WHERE ");
        sql.push_str(&selection.to_sql());
    }
    if !order_by.is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(&join(order_by));
    }
    if let Some(limit) = limit {
        sql.push(' ');
        sql.push_str(&limit.to_sql());
    }
}

impl ToSql for Select {
    fn to_sql(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&join(&self.projection));

        if !self.from.is_empty() {
            sql.push_str(" FROM ");
            sql.push_str(&join(&self.from));
        }
        if let Some(selection) = &self.selection {
            sql.push_str(" WHERE ");
            sql.push_str(&selection.to_sql());
        }
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&join(&self.group_by));
        }
        if let Some(having) = &self.having {
            sql.push_str(" HAVING ");
            sql.push_str(&having.to_sql());
        }
        push_tail(&mut sql, None, &self.order_by, self.limit.as_ref());
        match self.lock {
            Some(LockMode::Update) => sql.push_str(" FOR UPDATE"),
            Some(LockMode::Share) => sql.push_str(" FOR SHARE"),
            None => {}
        }
        sql
    }
}

impl ToSql for Query {
    fn to_sql(&self) -> String {
        let mut sql = self.select.to_sql();
        for union in &self.unions {
            sql.push_str(if union.all { " UNION ALL " } else { " UNION " });
            sql.push_str(&union.select.to_sql());
        }
        sql
    }
}

impl ToSql for Insert {
    fn to_sql(&self) -> String {
        let mut sql = String::from(if self.replace { "REPLACE " } else { "INSERT " });
        if self.ignore {
            sql.push_str("IGNORE ");
        }
        sql.push_str("INTO ");
        sql.push_str(&object_name(&self.table));
        if !self.columns.is_empty() {
            sql.push_str(&format!(" ({})", join(&self.columns)));
        }
        match &self.source {
            InsertSource::Values(rows) => {
                sql.push_str(" VALUES ");
                sql.push_str(&join(rows));
            }
            InsertSource::Query(q) => {
                sql.push(' ');
                sql.push_str(&q.to_sql());
            }
        }
        if !self.on_duplicate.is_empty() {
            sql.push_str(" ON DUPLICATE KEY UPDATE ");
            sql.push_str(&join(&self.on_duplicate));
        }
        sql
    }
}

impl ToSql for Update {
    fn to_sql(&self) -> String {
        let mut sql = format!("UPDATE {} SET {}", self.table.to_sql(), join(&self.assignments));
        push_tail(
            &mut sql,
            self.selection.as_ref(),
            &self.order_by,
            self.limit.as_ref(),
        );
        sql
    }
}

impl ToSql for Delete {
    fn to_sql(&self) -> String {
        let mut sql = format!("DELETE FROM {}", object_name(&self.table));
        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            sql.push_str(&alias.to_sql());
        }
        push_tail(
            &mut sql,
            self.selection.as_ref(),
            &self.order_by,
            self.limit.as_ref(),
        );
        sql
    }
}

impl ToSql for Statement {
    fn to_sql(&self) -> String {
        match self {
            Statement::Query(q) => q.to_sql(),
            Statement::Insert(ins) => ins.to_sql(),
            Statement::Update(upd) => upd.to_sql(),
            Statement::Delete(del) => del.to_sql(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Position;
    use pretty_assertions::assert_eq;

    fn at() -> Position {
        Position::locate("", 0)
    }

    #[test]
    fn test_group_and_block_shape() {
        let group = Macro::group(
            MacroKind::OptionalGroup,
            vec![
                Expr::binary(Expr::ident("status"), BinaryOp::Eq, Expr::placeholder()),
                Expr::binary(Expr::ident("age"), BinaryOp::Gt, Expr::placeholder()),
            ],
            at(),
        )
        .unwrap();
        let block = Macro::optional_block("filt", vec![group.into()], at()).unwrap();
        assert_eq!(block.to_sql(), "OPT_BLOCK filt [OPTIONAL(status = ?, age > ?)]");
    }

    #[test]
    fn test_precedence_parens() {
        let sum = Expr::binary(Expr::ident("a"), BinaryOp::Plus, Expr::ident("b"));
        let product = Expr::binary(sum.clone(), BinaryOp::Multiply, Expr::ident("c"));
        assert_eq!(product.to_sql(), "(a + b) * c");

        let right_nested = Expr::binary(Expr::ident("a"), BinaryOp::Minus, sum);
        assert_eq!(right_nested.to_sql(), "a - (a + b)");

        let or = Expr::binary(Expr::ident("x"), BinaryOp::Or, Expr::ident("y"));
        let and = Expr::binary(or, BinaryOp::And, Expr::ident("z"));
        assert_eq!(and.to_sql(), "(x OR y) AND z");
    }

    #[test]
    fn test_double_minus_keeps_space() {
        let inner = Expr::Unary {
            op: UnaryOp::Minus,
            expr: Box::new(Expr::number(1)),
        };
        let outer = Expr::Unary {
            op: UnaryOp::Minus,
            expr: Box::new(inner),
        };
        assert_eq!(outer.to_sql(), "- -1");
    }

    #[test]
    fn test_select_clauses_in_order() {
        let select = Select {
            distinct: true,
            projection: vec![Expr::ident("id"), Expr::ident("name").alias("n")],
            from: vec![TableWithJoins {
                relation: TableFactor::table("users"),
                joins: vec![],
            }],
            selection: Some(Expr::binary(
                Expr::ident("id"),
                BinaryOp::Gt,
                Expr::placeholder(),
            )),
            order_by: vec![Expr::ident("name").ordered(SortOrder::Desc)],
            limit: Some(Limit {
                count: Expr::number(10),
                offset: Some(Expr::number(20)),
            }),
            ..Default::default()
        };
        assert_eq!(
            select.to_sql(),
            "SELECT DISTINCT id, name AS n FROM users WHERE id > ? ORDER BY name DESC LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_quoted_identifier_round() {
        let expr = Expr::CompoundIdentifier(vec![Ident::bare("t"), Ident::new("order")]);
        assert_eq!(expr.to_sql(), "t.`order`");
    }
}
