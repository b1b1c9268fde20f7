use crate::ast::*;
use crate::error::{ErrorKind, PatternError};
use crate::parser::{parse, parse_with_depth, DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};
use pretty_assertions::assert_eq;

fn select_of(sql: &str) -> Select {
    match parse(sql).unwrap() {
        Statement::Query(q) => q.select,
        other => panic!("expected query, got {:?}", other),
    }
}

#[test]
fn test_simple_select() {
    let select = select_of("SELECT id, name AS n FROM users WHERE id = ?");
    assert_eq!(
        select.projection,
        vec![Expr::ident("id"), Expr::ident("name").alias("n")]
    );
    assert_eq!(select.from[0].relation, TableFactor::table("users"));
    assert_eq!(
        select.selection,
        Some(Expr::binary(
            Expr::ident("id"),
            BinaryOp::Eq,
            Expr::placeholder()
        ))
    );
}

#[test]
fn test_implicit_alias_and_wildcards() {
    let select = select_of("select u.*, count(*) total from users u");
    assert_eq!(
        select.projection[0],
        Expr::QualifiedWildcard(vec![Ident::bare("u")])
    );
    assert_eq!(
        select.projection[1],
        Expr::Function(Function {
            name: "COUNT".into(),
            args: vec![Expr::Wildcard],
            distinct: false,
        })
        .alias("total")
    );
    assert_eq!(
        select.from[0].relation,
        TableFactor::Table {
            name: vec![Ident::bare("users")],
            alias: Some(Ident::bare("u")),
        }
    );
}

#[test]
fn test_and_binds_tighter_than_or() {
    let select = select_of("SELECT a FROM t WHERE a = 1 OR b = 2 AND c = 3");
    let eq = |col: &str, n: i32| Expr::binary(Expr::ident(col), BinaryOp::Eq, Expr::number(n));
    assert_eq!(
        select.selection,
        Some(Expr::binary(
            eq("a", 1),
            BinaryOp::Or,
            Expr::binary(eq("b", 2), BinaryOp::And, eq("c", 3))
        ))
    );
}

#[test]
fn test_predicates() {
    let select = select_of(
        "SELECT id FROM t WHERE deleted_at IS NULL AND status NOT IN (1, 2) \
         AND age BETWEEN ? AND ? AND name LIKE :pattern",
    );
    let Some(Expr::Binary { left, right, .. }) = select.selection else {
        panic!("expected AND chain");
    };
    assert_eq!(
        *right,
        Expr::Like {
            expr: Box::new(Expr::ident("name")),
            negated: false,
            pattern: Box::new(Expr::Value(Value::NamedPlaceholder("pattern".into()))),
            escape: None,
        }
    );
    let Expr::Binary { left, right, .. } = *left else {
        panic!("expected AND chain");
    };
    assert_eq!(
        *right,
        Expr::Between {
            expr: Box::new(Expr::ident("age")),
            negated: false,
            low: Box::new(Expr::placeholder()),
            high: Box::new(Expr::placeholder()),
        }
    );
    let Expr::Binary { left, right, .. } = *left else {
        panic!("expected AND chain");
    };
    assert_eq!(
        *left,
        Expr::IsNull {
            expr: Box::new(Expr::ident("deleted_at")),
            negated: false,
        }
    );
    assert_eq!(
        *right,
        Expr::InList {
            expr: Box::new(Expr::ident("status")),
            list: vec![Expr::number(1), Expr::number(2)],
            negated: true,
        }
    );
}

#[test]
fn test_joins() {
    let select = select_of(
        "SELECT u.id FROM users u LEFT OUTER JOIN orders AS o ON o.user_id = u.id JOIN items USING (order_id)",
    );
    let joins = &select.from[0].joins;
    assert_eq!(joins.len(), 2);
    assert_eq!(joins[0].kind, JoinKind::Left);
    assert_eq!(
        joins[0].constraint,
        JoinConstraint::On(Expr::binary(
            Expr::compound("o.user_id"),
            BinaryOp::Eq,
            Expr::compound("u.id")
        ))
    );
    assert_eq!(joins[1].kind, JoinKind::Inner);
    assert_eq!(
        joins[1].constraint,
        JoinConstraint::Using(vec![Ident::bare("order_id")])
    );
}

#[test]
fn test_limit_forms() {
    let comma = select_of("SELECT a FROM t LIMIT 5, 10");
    let offset = select_of("SELECT a FROM t LIMIT 10 OFFSET 5");
    let expected = Some(Limit {
        count: Expr::number(10),
        offset: Some(Expr::number(5)),
    });
    assert_eq!(comma.limit, expected);
    assert_eq!(offset.limit, expected);
}

#[test]
fn test_group_by_having_order_by() {
    let select = select_of(
        "SELECT dept, COUNT(*) FROM emp GROUP BY dept HAVING COUNT(*) > 1 ORDER BY dept DESC, 2",
    );
    assert_eq!(select.group_by, vec![Expr::ident("dept")]);
    assert!(select.having.is_some());
    assert_eq!(
        select.order_by,
        vec![Expr::ident("dept").ordered(SortOrder::Desc), Expr::number(2)]
    );
}

#[test]
fn test_cast_and_case() {
    let select = select_of(
        "SELECT CAST(price AS decimal(10,2)), CASE WHEN a > 0 THEN 'pos' ELSE 'neg' END FROM t",
    );
    assert_eq!(
        select.projection[0],
        Expr::Cast {
            expr: Box::new(Expr::ident("price")),
            data_type: "DECIMAL(10, 2)".into(),
        }
    );
    assert!(matches!(select.projection[1], Expr::Case { operand: None, .. }));
}

#[test]
fn test_subqueries() {
    let select = select_of(
        "SELECT x.id FROM (SELECT id FROM t) x WHERE EXISTS (SELECT 1 FROM s WHERE s.id = x.id)",
    );
    assert!(matches!(
        select.from[0].relation,
        TableFactor::Derived { alias: Some(_), .. }
    ));
    assert!(matches!(select.selection, Some(Expr::Exists(_))));
}

#[test]
fn test_reserved_word_needs_backticks() {
    let err = parse("SELECT order FROM t").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Parse error at line 1, column 8: unexpected keyword 'ORDER'"
    );

    let select = select_of("SELECT `order`, t.order FROM t");
    assert_eq!(
        select.projection,
        vec![
            Expr::Identifier(Ident::quoted("order")),
            Expr::CompoundIdentifier(vec![Ident::bare("t"), Ident::bare("order")]),
        ]
    );
}

#[test]
fn test_trailing_content_rejected() {
    let err = parse("SELECT a FROM t u extra").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Parse error at line 1, column 19: expected end of statement, found 'extra'"
    );
    assert!(parse("SELECT a FROM t;").is_ok());
}

#[test]
fn test_empty_template() {
    let err = parse("   ").unwrap_err();
    assert_eq!(err.to_string(), "Parse error at end of input: empty template");
}

#[test]
fn test_depth_limit() {
    let err = parse_with_depth("SELECT ((((1))))", 3).unwrap_err();
    assert!(matches!(err, PatternError::Parse { .. }));
    assert!(err.to_string().contains("maximum depth of 3"));
    assert!(parse_with_depth("SELECT ((((1))))", 16).is_ok());
    // Oversized limits are clamped.
    let err = parse_with_depth(&nested_parens(MAX_DEPTH_LIMIT), usize::MAX).unwrap_err();
    assert!(err.to_string().contains(&format!("maximum depth of {}", MAX_DEPTH_LIMIT)));
}

fn nested_parens(depth: usize) -> String {
    format!("SELECT {}1{}", "(".repeat(depth), ")".repeat(depth))
}

fn parse_on_small_stack(sql: String) -> Result<(), ErrorKind> {
    std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || parse(&sql).map(|_| ()).map_err(|e| e.kind()))
        .unwrap()
        .join()
        .unwrap()
}

#[test]
fn test_deep_nesting_fails_cleanly_on_worker_stack() {
    // The statement and projection take two levels before the first paren.
    assert_eq!(
        parse_on_small_stack(nested_parens(DEFAULT_MAX_DEPTH)),
        Err(ErrorKind::BaseGrammar)
    );
    assert_eq!(parse_on_small_stack(nested_parens(1000)), Err(ErrorKind::BaseGrammar));
    assert_eq!(parse_on_small_stack(nested_parens(40)), Ok(()));
}

#[test]
fn test_union_and_lock() {
    match parse("SELECT a FROM t UNION ALL SELECT b FROM s FOR UPDATE").unwrap() {
        Statement::Query(q) => {
            assert_eq!(q.unions.len(), 1);
            assert!(q.unions[0].all);
            assert_eq!(q.unions[0].select.lock, Some(LockMode::Update));
        }
        other => panic!("expected query, got {:?}", other),
    }
}
