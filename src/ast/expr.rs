use crate::ast::{BinaryOp, Macro, Query, SortOrder, UnaryOp, Value};
use crate::transpiler::traits::needs_quoting;
use serde::{Deserialize, Serialize};

/// An identifier. `quoted` records whether it is rendered inside backticks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    pub value: String,
    pub quoted: bool,
}

impl Ident {
    /// Build an identifier, quoting it when it would not lex as a plain word.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let quoted = needs_quoting(&value);
        Self { value, quoted }
    }

    pub fn quoted(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: true,
        }
    }

    /// Unquoted identifier exactly as written, even if it is a reserved word.
    pub fn bare(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quoted: false,
        }
    }
}

/// A function call: name(args).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// Function name as written (COUNT, IFNULL, DATE_FORMAT, ...)
    pub name: String,
    pub args: Vec<Expr>,
    /// COUNT(DISTINCT col)
    pub distinct: bool,
}

/// WHEN condition THEN result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenClause {
    pub condition: Expr,
    pub result: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Identifier(Ident),
    /// Dotted name: t.col or db.t.col
    CompoundIdentifier(Vec<Ident>),
    /// * (projection lists and COUNT(*))
    Wildcard,
    /// t.*
    QualifiedWildcard(Vec<Ident>),
    Value(Value),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// expr IS [NOT] NULL
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    /// expr IS [NOT] TRUE / FALSE
    IsBool {
        expr: Box<Expr>,
        value: bool,
        negated: bool,
    },
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    InSubquery {
        expr: Box<Expr>,
        subquery: Box<Query>,
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        negated: bool,
        low: Box<Expr>,
        high: Box<Expr>,
    },
    Like {
        expr: Box<Expr>,
        negated: bool,
        pattern: Box<Expr>,
        escape: Option<Box<Expr>>,
    },
    Regexp {
        expr: Box<Expr>,
        negated: bool,
        pattern: Box<Expr>,
    },
    Function(Function),
    Case {
        operand: Option<Box<Expr>>,
        when_clauses: Vec<WhenClause>,
        else_result: Option<Box<Expr>>,
    },
    /// CAST(expr AS type)
    Cast {
        expr: Box<Expr>,
        data_type: String,
    },
    /// INTERVAL expr unit
    Interval {
        value: Box<Expr>,
        unit: String,
    },
    Exists(Box<Query>),
    /// Scalar subquery: (SELECT ...)
    Subquery(Box<Query>),
    /// Explicitly parenthesized expression
    Nested(Box<Expr>),
    /// Row constructor: (a, b, ...)
    Tuple(Vec<Expr>),
    /// Projection item with an alias: expr AS alias
    Alias {
        expr: Box<Expr>,
        alias: Ident,
    },
    /// ORDER BY item with an explicit direction
    Ordered {
        expr: Box<Expr>,
        order: SortOrder,
    },
    Macro(Macro),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Identifier(Ident::new(name))
    }

    /// t.col built from dotted text.
    pub fn compound(path: &str) -> Self {
        let parts: Vec<Ident> = path.split('.').map(Ident::new).collect();
        if parts.len() == 1 {
            Expr::Identifier(parts.into_iter().next().unwrap_or_else(|| Ident::new(path)))
        } else {
            Expr::CompoundIdentifier(parts)
        }
    }

    pub fn placeholder() -> Self {
        Expr::Value(Value::Placeholder)
    }

    pub fn number(n: impl std::fmt::Display) -> Self {
        Expr::Value(Value::Number(n.to_string()))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::Value(Value::String(s.into()))
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn alias(self, alias: impl Into<String>) -> Self {
        Expr::Alias {
            expr: Box::new(self),
            alias: Ident::new(alias),
        }
    }

    pub fn ordered(self, order: SortOrder) -> Self {
        Expr::Ordered {
            expr: Box::new(self),
            order,
        }
    }

    pub fn as_macro(&self) -> Option<&Macro> {
        match self {
            Expr::Macro(m) => Some(m),
            _ => None,
        }
    }

    /// True for bare or dotted column references.
    pub fn is_column(&self) -> bool {
        matches!(self, Expr::Identifier(_) | Expr::CompoundIdentifier(_))
    }
}

impl From<Macro> for Expr {
    fn from(m: Macro) -> Self {
        Expr::Macro(m)
    }
}
