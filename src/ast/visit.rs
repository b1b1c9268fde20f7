//! Pre-order traversal over every expression in a statement.

use crate::ast::*;

/// Call `f` on every expression reachable from `stmt`, parents before children.
pub fn walk_statement<'a>(stmt: &'a Statement, f: &mut dyn FnMut(&'a Expr)) {
    match stmt {
        Statement::Query(q) => walk_query(q, f),
        Statement::Insert(ins) => {
            walk_all(&ins.columns, f);
            match &ins.source {
                InsertSource::Values(rows) => walk_all(rows, f),
                InsertSource::Query(q) => walk_query(q, f),
            }
            walk_all(&ins.on_duplicate, f);
        }
        Statement::Update(upd) => {
            walk_table(&upd.table, f);
            walk_all(&upd.assignments, f);
            walk_opt(upd.selection.as_ref(), f);
            walk_all(&upd.order_by, f);
            walk_limit(upd.limit.as_ref(), f);
        }
        Statement::Delete(del) => {
            walk_opt(del.selection.as_ref(), f);
            walk_all(&del.order_by, f);
            walk_limit(del.limit.as_ref(), f);
        }
    }
}

pub fn walk_query<'a>(query: &'a Query, f: &mut dyn FnMut(&'a Expr)) {
    walk_select(&query.select, f);
    for union in &query.unions {
        walk_select(&union.select, f);
    }
}

fn walk_select<'a>(select: &'a Select, f: &mut dyn FnMut(&'a Expr)) {
    walk_all(&select.projection, f);
    for table in &select.from {
        walk_table(table, f);
    }
    walk_opt(select.selection.as_ref(), f);
    walk_all(&select.group_by, f);
    walk_opt(select.having.as_ref(), f);
    walk_all(&select.order_by, f);
    walk_limit(select.limit.as_ref(), f);
}

fn walk_table<'a>(table: &'a TableWithJoins, f: &mut dyn FnMut(&'a Expr)) {
    walk_factor(&table.relation, f);
    for join in &table.joins {
        walk_factor(&join.relation, f);
        if let JoinConstraint::On(expr) = &join.constraint {
            walk_expr(expr, f);
        }
    }
}

fn walk_factor<'a>(factor: &'a TableFactor, f: &mut dyn FnMut(&'a Expr)) {
    if let TableFactor::Derived { subquery, .. } = factor {
        walk_query(subquery, f);
    }
}

fn walk_limit<'a>(limit: Option<&'a Limit>, f: &mut dyn FnMut(&'a Expr)) {
    if let Some(limit) = limit {
        walk_expr(&limit.count, f);
        walk_opt(limit.offset.as_ref(), f);
    }
}

fn walk_opt<'a>(expr: Option<&'a Expr>, f: &mut dyn FnMut(&'a Expr)) {
    if let Some(expr) = expr {
        walk_expr(expr, f);
    }
}

fn walk_all<'a>(exprs: &'a [Expr], f: &mut dyn FnMut(&'a Expr)) {
    for expr in exprs {
        walk_expr(expr, f);
    }
}

pub fn walk_expr<'a>(expr: &'a Expr, f: &mut dyn FnMut(&'a Expr)) {
    f(expr);
    match expr {
        Expr::Identifier(_)
        | Expr::CompoundIdentifier(_)
        | Expr::Wildcard
        | Expr::QualifiedWildcard(_)
        | Expr::Value(_) => {}
        Expr::Unary { expr, .. }
        | Expr::IsNull { expr, .. }
        | Expr::IsBool { expr, .. }
        | Expr::Cast { expr, .. }
        | Expr::Nested(expr)
        | Expr::Alias { expr, .. }
        | Expr::Ordered { expr, .. } => walk_expr(expr, f),
        Expr::Interval { value, .. } => walk_expr(value, f),
        Expr::Binary { left, right, .. } => {
            walk_expr(left, f);
            walk_expr(right, f);
        }
        Expr::InList { expr, list, .. } => {
            walk_expr(expr, f);
            walk_all(list, f);
        }
        Expr::InSubquery { expr, subquery, .. } => {
            walk_expr(expr, f);
            walk_query(subquery, f);
        }
        Expr::Between {
            expr, low, high, ..
        } => {
            walk_expr(expr, f);
            walk_expr(low, f);
            walk_expr(high, f);
        }
        Expr::Like {
            expr,
            pattern,
            escape,
            ..
        } => {
            walk_expr(expr, f);
            walk_expr(pattern, f);
            if let Some(escape) = escape {
                walk_expr(escape, f);
            }
        }
        Expr::Regexp { expr, pattern, .. } => {
            walk_expr(expr, f);
            walk_expr(pattern, f);
        }
        Expr::Function(func) => walk_all(&func.args, f),
        Expr::Case {
            operand,
            when_clauses,
            else_result,
        } => {
            if let Some(operand) = operand {
                walk_expr(operand, f);
            }
            for when in when_clauses {
                walk_expr(&when.condition, f);
                walk_expr(&when.result, f);
            }
            if let Some(else_result) = else_result {
                walk_expr(else_result, f);
            }
        }
        Expr::Exists(q) | Expr::Subquery(q) => walk_query(q, f),
        Expr::Tuple(items) => walk_all(items, f),
        Expr::Macro(m) => walk_all(m.children(), f),
    }
}

impl Statement {
    /// Every macro in the statement, outermost first.
    pub fn macros(&self) -> Vec<&Macro> {
        let mut found = Vec::new();
        walk_statement(self, &mut |expr| {
            if let Expr::Macro(m) = expr {
                found.push(m);
            }
        });
        found
    }

    /// Names of all OPT_BLOCKs in source order.
    pub fn block_names(&self) -> Vec<&str> {
        self.macros().into_iter().filter_map(Macro::name).collect()
    }
}
