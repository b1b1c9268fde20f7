//! Expression grammar.
//!
//! Precedence, loosest first:
//! `OR ||`, `XOR`, `AND &&`, `NOT`, comparisons, `|`, `&`, `<< >>`, `+ -`,
//! `* / % DIV MOD`, unary `- + ! ~`, primaries.

use crate::ast::*;
use crate::error::{PatternError, PatternResult};
use crate::parser::Parser;
use crate::parser::tokens::TokenKind;
use crate::transpiler::traits::is_reserved;

/// Words that never start a function call even when followed by `(`.
const NOT_FUNCTIONS: &[&str] = &[
    "AND", "OR", "NOT", "XOR", "IN", "EXISTS", "SELECT", "CASE", "CAST", "INTERVAL", "LIKE",
    "REGEXP", "BETWEEN", "IS", "WHERE", "ON", "USING", "FROM", "AS",
];

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self) -> PatternResult<Expr> {
        self.descend(Self::parse_or)
    }

    /// Generic left-associative binary chain.
    fn parse_binary_chain(
        &mut self,
        operand: fn(&mut Self) -> PatternResult<Expr>,
        operator: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> PatternResult<Expr> {
        let mut left = operand(self)?;
        while let Some(op) = self.peek().and_then(operator) {
            self.pos += 1;
            let right = operand(self)?;
            left = Expr::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> PatternResult<Expr> {
        self.parse_binary_chain(Self::parse_xor, |t| match t {
            TokenKind::DoublePipe => Some(BinaryOp::Or),
            t if t.is_keyword("OR") => Some(BinaryOp::Or),
            _ => None,
        })
    }

    fn parse_xor(&mut self) -> PatternResult<Expr> {
        self.parse_binary_chain(Self::parse_and, |t| {
            t.is_keyword("XOR").then_some(BinaryOp::Xor)
        })
    }

    fn parse_and(&mut self) -> PatternResult<Expr> {
        self.parse_binary_chain(Self::parse_not, |t| match t {
            TokenKind::DoubleAmp => Some(BinaryOp::And),
            t if t.is_keyword("AND") => Some(BinaryOp::And),
            _ => None,
        })
    }

    fn parse_not(&mut self) -> PatternResult<Expr> {
        if self.parse_keyword("NOT") {
            let expr = self.descend(Self::parse_not)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(expr),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> PatternResult<Expr> {
        let mut expr = self.parse_bitor()?;
        loop {
            if self.parse_keyword("IS") {
                let negated = self.parse_keyword("NOT");
                expr = if self.parse_keyword("NULL") {
                    Expr::IsNull {
                        expr: Box::new(expr),
                        negated,
                    }
                } else if self.parse_keyword("TRUE") || self.peek_keyword("FALSE") {
                    let value = !self.parse_keyword("FALSE");
                    Expr::IsBool {
                        expr: Box::new(expr),
                        value,
                        negated,
                    }
                } else {
                    return Err(self.unexpected("NULL, TRUE or FALSE"));
                };
                continue;
            }

            let negated = self.peek_keyword("NOT")
                && self.peek_nth(1).is_some_and(|t| {
                    ["IN", "BETWEEN", "LIKE", "REGEXP", "RLIKE"]
                        .iter()
                        .any(|kw| t.is_keyword(kw))
                });
            if negated {
                self.pos += 1;
            }

            if self.parse_keyword("IN") {
                expr = self.parse_in(expr, negated)?;
            } else if self.parse_keyword("BETWEEN") {
                let low = self.parse_bitor()?;
                self.expect_keyword("AND")?;
                let high = self.parse_bitor()?;
                expr = Expr::Between {
                    expr: Box::new(expr),
                    negated,
                    low: Box::new(low),
                    high: Box::new(high),
                };
            } else if self.parse_keyword("LIKE") {
                let pattern = self.parse_bitor()?;
                let escape = if self.parse_keyword("ESCAPE") {
                    Some(Box::new(self.parse_primary()?))
                } else {
                    None
                };
                expr = Expr::Like {
                    expr: Box::new(expr),
                    negated,
                    pattern: Box::new(pattern),
                    escape,
                };
            } else if self.parse_keyword("REGEXP") || self.parse_keyword("RLIKE") {
                let pattern = self.parse_bitor()?;
                expr = Expr::Regexp {
                    expr: Box::new(expr),
                    negated,
                    pattern: Box::new(pattern),
                };
            } else if let Some(op) = self.peek().and_then(comparison_op) {
                self.pos += 1;
                let right = self.parse_bitor()?;
                expr = Expr::binary(expr, op, right);
            } else {
                return Ok(expr);
            }
        }
    }

    /// After `[NOT] IN`: a subquery or a value list.
    fn parse_in(&mut self, expr: Expr, negated: bool) -> PatternResult<Expr> {
        self.expect(&TokenKind::LParen)?;
        let result = if self.peek_keyword("SELECT") {
            let subquery = self.parse_query()?;
            Expr::InSubquery {
                expr: Box::new(expr),
                subquery: Box::new(subquery),
                negated,
            }
        } else {
            let list = {
                let mut p = self.enter_opaque("an IN list");
                p.parse_comma_separated(|p| p.parse_expr())?
            };
            Expr::InList {
                expr: Box::new(expr),
                list,
                negated,
            }
        };
        self.expect(&TokenKind::RParen)?;
        Ok(result)
    }

    pub(crate) fn parse_bitor(&mut self) -> PatternResult<Expr> {
        self.parse_binary_chain(Self::parse_bitand, |t| {
            matches!(t, TokenKind::Pipe).then_some(BinaryOp::BitOr)
        })
    }

    fn parse_bitand(&mut self) -> PatternResult<Expr> {
        self.parse_binary_chain(Self::parse_shift, |t| {
            matches!(t, TokenKind::Amp).then_some(BinaryOp::BitAnd)
        })
    }

    fn parse_shift(&mut self) -> PatternResult<Expr> {
        self.parse_binary_chain(Self::parse_additive, |t| match t {
            TokenKind::ShiftLeft => Some(BinaryOp::ShiftLeft),
            TokenKind::ShiftRight => Some(BinaryOp::ShiftRight),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> PatternResult<Expr> {
        self.parse_binary_chain(Self::parse_multiplicative, |t| match t {
            TokenKind::Plus => Some(BinaryOp::Plus),
            TokenKind::Minus => Some(BinaryOp::Minus),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> PatternResult<Expr> {
        self.parse_binary_chain(Self::parse_unary, |t| match t {
            TokenKind::Star => Some(BinaryOp::Multiply),
            TokenKind::Slash => Some(BinaryOp::Divide),
            TokenKind::Percent => Some(BinaryOp::Modulo),
            t if t.is_keyword("DIV") => Some(BinaryOp::IntDiv),
            t if t.is_keyword("MOD") => Some(BinaryOp::Modulo),
            _ => None,
        })
    }

    fn parse_unary(&mut self) -> PatternResult<Expr> {
        let op = match self.peek() {
            Some(TokenKind::Minus) => UnaryOp::Minus,
            Some(TokenKind::Plus) => UnaryOp::Plus,
            Some(TokenKind::Bang) => UnaryOp::Bang,
            Some(TokenKind::Tilde) => UnaryOp::BitNot,
            _ => return self.parse_primary(),
        };
        self.pos += 1;
        let expr = self.descend(Self::parse_unary)?;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    pub(crate) fn parse_primary(&mut self) -> PatternResult<Expr> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.unexpected("expression"));
        };
        let value = match token {
            TokenKind::Number(n) => Value::Number(n),
            TokenKind::String(s) => Value::String(s),
            TokenKind::Placeholder => Value::Placeholder,
            TokenKind::NamedPlaceholder(name) => Value::NamedPlaceholder(name),
            TokenKind::Macro(kind) => return self.parse_macro(kind),
            TokenKind::LParen => return self.parse_parenthesized(),
            TokenKind::QuotedIdent(_) => return self.parse_column_ref(),
            TokenKind::Word(word) => return self.parse_word(&word),
            _ => return Err(self.unexpected("expression")),
        };
        self.pos += 1;
        Ok(Expr::Value(value))
    }

    fn parse_word(&mut self, word: &str) -> PatternResult<Expr> {
        let upper = word.to_ascii_uppercase();
        match upper.as_str() {
            "NULL" => {
                self.pos += 1;
                return Ok(Expr::Value(Value::Null));
            }
            "TRUE" | "FALSE" => {
                self.pos += 1;
                return Ok(Expr::Value(Value::Bool(upper == "TRUE")));
            }
            "CASE" => return self.parse_case(),
            "CAST" => return self.parse_cast(),
            "INTERVAL" => return self.parse_interval(),
            "EXISTS" => {
                self.pos += 1;
                self.expect(&TokenKind::LParen)?;
                let query = self.parse_query()?;
                self.expect(&TokenKind::RParen)?;
                return Ok(Expr::Exists(Box::new(query)));
            }
            _ => {}
        }

        let is_call = self.peek_nth(1) == Some(&TokenKind::LParen)
            && !NOT_FUNCTIONS.contains(&upper.as_str());
        if is_call {
            self.pos += 1;
            return self.parse_function(upper);
        }
        if is_reserved(word) {
            return Err(PatternError::parse(
                Some(self.position()),
                format!("unexpected keyword '{}'", upper),
            ));
        }
        self.parse_column_ref()
    }

    /// col, t.col, db.t.col or t.*
    fn parse_column_ref(&mut self) -> PatternResult<Expr> {
        let mut parts = vec![self.parse_identifier()?];
        while self.consume(&TokenKind::Dot) {
            if self.consume(&TokenKind::Star) {
                return Ok(Expr::QualifiedWildcard(parts));
            }
            parts.push(self.parse_member()?);
        }
        Ok(match parts.len() {
            1 => Expr::Identifier(parts.remove(0)),
            _ => Expr::CompoundIdentifier(parts),
        })
    }

    /// After the function name; `(` is next.
    fn parse_function(&mut self, name: String) -> PatternResult<Expr> {
        self.expect(&TokenKind::LParen)?;
        let mut p = self.enter_opaque("function arguments");
        let mut distinct = false;
        let args = if p.peek() == Some(&TokenKind::RParen) {
            Vec::new()
        } else if p.peek() == Some(&TokenKind::Star) && p.peek_nth(1) == Some(&TokenKind::RParen) {
            p.pos += 1;
            vec![Expr::Wildcard]
        } else {
            distinct = p.parse_keyword("DISTINCT");
            p.parse_comma_separated(|p| p.parse_expr())?
        };
        p.expect(&TokenKind::RParen)?;
        Ok(Expr::Function(Function {
            name,
            args,
            distinct,
        }))
    }

    /// `( SELECT ... )`, `( expr )` or `( a, b, ... )`.
    fn parse_parenthesized(&mut self) -> PatternResult<Expr> {
        self.expect(&TokenKind::LParen)?;
        if self.peek_keyword("SELECT") {
            let query = self.parse_query()?;
            self.expect(&TokenKind::RParen)?;
            return Ok(Expr::Subquery(Box::new(query)));
        }
        let first = self.parse_expr()?;
        if self.consume(&TokenKind::Comma) {
            let mut items = vec![first];
            items.extend(self.parse_comma_separated(|p| p.parse_expr())?);
            self.expect(&TokenKind::RParen)?;
            return Ok(Expr::Tuple(items));
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Expr::Nested(Box::new(first)))
    }

    fn parse_case(&mut self) -> PatternResult<Expr> {
        self.expect_keyword("CASE")?;
        let operand = if self.peek_keyword("WHEN") {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        let mut when_clauses = Vec::new();
        while self.parse_keyword("WHEN") {
            let condition = self.parse_expr()?;
            self.expect_keyword("THEN")?;
            let result = self.parse_expr()?;
            when_clauses.push(WhenClause { condition, result });
        }
        if when_clauses.is_empty() {
            return Err(self.unexpected("WHEN"));
        }
        let else_result = if self.parse_keyword("ELSE") {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        self.expect_keyword("END")?;
        Ok(Expr::Case {
            operand,
            when_clauses,
            else_result,
        })
    }

    fn parse_cast(&mut self) -> PatternResult<Expr> {
        self.expect_keyword("CAST")?;
        self.expect(&TokenKind::LParen)?;
        let mut p = self.enter_opaque("CAST");
        let expr = p.parse_expr()?;
        p.expect_keyword("AS")?;
        let data_type = p.parse_data_type()?;
        p.expect(&TokenKind::RParen)?;
        Ok(Expr::Cast {
            expr: Box::new(expr),
            data_type,
        })
    }

    /// Type name words plus an optional `(n[, m])`, normalized upper-case.
    fn parse_data_type(&mut self) -> PatternResult<String> {
        let mut words = Vec::new();
        while let Some(TokenKind::Word(w)) = self.peek() {
            words.push(w.to_ascii_uppercase());
            self.pos += 1;
        }
        if words.is_empty() {
            return Err(self.unexpected("type name"));
        }
        let mut data_type = words.join(" ");
        if self.consume(&TokenKind::LParen) {
            let params = self.parse_comma_separated(|p| match p.next_token() {
                Some(TokenKind::Number(n)) => Ok(n),
                _ => Err(PatternError::parse(
                    Some(p.position()),
                    "expected numeric type parameter",
                )),
            })?;
            self.expect(&TokenKind::RParen)?;
            data_type.push_str(&format!("({})", params.join(", ")));
        }
        Ok(data_type)
    }

    fn parse_interval(&mut self) -> PatternResult<Expr> {
        self.expect_keyword("INTERVAL")?;
        let value = self.parse_bitor()?;
        let unit = match self.peek() {
            Some(TokenKind::Word(w)) => w.to_ascii_uppercase(),
            _ => return Err(self.unexpected("interval unit")),
        };
        self.pos += 1;
        Ok(Expr::Interval {
            value: Box::new(value),
            unit,
        })
    }
}

fn comparison_op(token: &TokenKind) -> Option<BinaryOp> {
    match token {
        TokenKind::Eq => Some(BinaryOp::Eq),
        TokenKind::NullSafeEq => Some(BinaryOp::NullSafeEq),
        TokenKind::NotEq => Some(BinaryOp::NotEq),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::LtEq => Some(BinaryOp::LtEq),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::GtEq => Some(BinaryOp::GtEq),
        _ => None,
    }
}
