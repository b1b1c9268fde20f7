use crate::ast::{Expr, Ident, JoinKind, LockMode};
use serde::{Deserialize, Serialize};

/// A complete template statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Query(Box<Query>),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

/// SELECT optionally chained with UNION.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub select: Select,
    pub unions: Vec<Union>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Union {
    pub all: bool,
    pub select: Select,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Select {
    pub distinct: bool,
    /// Projection items: expressions, aliases, wildcards or macros.
    pub projection: Vec<Expr>,
    pub from: Vec<TableWithJoins>,
    pub selection: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    /// Plain expressions or `Expr::Ordered`, possibly inside macros.
    pub order_by: Vec<Expr>,
    pub limit: Option<Limit>,
    pub lock: Option<LockMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableWithJoins {
    pub relation: TableFactor,
    pub joins: Vec<Join>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableFactor {
    Table {
        /// db.table or table
        name: Vec<Ident>,
        alias: Option<Ident>,
    },
    Derived {
        subquery: Box<Query>,
        alias: Option<Ident>,
    },
}

impl TableFactor {
    pub fn table(name: &str) -> Self {
        TableFactor::Table {
            name: name.split('.').map(Ident::new).collect(),
            alias: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub relation: TableFactor,
    pub constraint: JoinConstraint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JoinConstraint {
    On(Expr),
    Using(Vec<Ident>),
    None,
}

/// LIMIT count [OFFSET offset]; `LIMIT offset, count` parses to the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limit {
    pub count: Expr,
    pub offset: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InsertSource {
    /// VALUES rows; each row is a tuple or a macro producing tuples.
    Values(Vec<Expr>),
    Query(Box<Query>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insert {
    /// REPLACE INTO instead of INSERT INTO
    pub replace: bool,
    pub ignore: bool,
    pub table: Vec<Ident>,
    /// Column names or macros over column names.
    pub columns: Vec<Expr>,
    pub source: InsertSource,
    /// ON DUPLICATE KEY UPDATE assignments
    pub on_duplicate: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub table: TableWithJoins,
    /// `col = expr` items or macros over them.
    pub assignments: Vec<Expr>,
    pub selection: Option<Expr>,
    pub order_by: Vec<Expr>,
    pub limit: Option<Limit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delete {
    pub table: Vec<Ident>,
    pub alias: Option<Ident>,
    pub selection: Option<Expr>,
    pub order_by: Vec<Expr>,
    pub limit: Option<Limit>,
}
