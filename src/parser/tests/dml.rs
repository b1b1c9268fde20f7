use crate::ast::*;
use crate::error::ErrorKind;
use crate::parser::parse;
use pretty_assertions::assert_eq;

#[test]
fn test_insert_with_optional_columns() {
    let stmt = parse(
        "INSERT INTO users (id, OPT_BLOCK extra [ OPTIONAL(email, phone) ]) \
         VALUES (?, OPT_BLOCK extra_v [ OPTIONAL(?, ?) ])",
    )
    .unwrap();
    let Statement::Insert(insert) = stmt else {
        panic!("expected insert");
    };
    assert!(!insert.replace);
    assert_eq!(insert.table, vec![Ident::bare("users")]);
    assert_eq!(insert.columns.len(), 2);
    assert_eq!(insert.columns[0], Expr::ident("id"));
    let InsertSource::Values(rows) = &insert.source else {
        panic!("expected VALUES");
    };
    assert_eq!(rows.len(), 1);
    assert!(matches!(&rows[0], Expr::Tuple(items) if items.len() == 2));
}

#[test]
fn test_insert_rows_from_loop() {
    let stmt =
        parse("INSERT IGNORE INTO t (a, b) VALUES OPT_BLOCK rows [ LOOP((?, ?)) ]").unwrap();
    let Statement::Insert(insert) = stmt else {
        panic!("expected insert");
    };
    assert!(insert.ignore);
    assert_eq!(
        insert.source,
        InsertSource::Values(vec![Expr::Macro(Macro::OptionalBlock {
            name: "rows".into(),
            children: vec![Expr::Macro(Macro::LoopGroup(vec![Expr::Tuple(vec![
                Expr::placeholder(),
                Expr::placeholder(),
            ])]))],
        })])
    );
}

#[test]
fn test_insert_column_must_be_name() {
    let err = parse("INSERT INTO t (a + 1) VALUES (1)").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Parse error at line 1, column 16: expected column name"
    );
}

#[test]
fn test_replace_and_on_duplicate() {
    let stmt = parse("INSERT INTO t (a) VALUES (?) ON DUPLICATE KEY UPDATE a = VALUES(a)").unwrap();
    let Statement::Insert(insert) = stmt else {
        panic!("expected insert");
    };
    assert_eq!(insert.on_duplicate.len(), 1);

    let stmt = parse("REPLACE INTO t SELECT * FROM s").unwrap();
    assert!(matches!(
        stmt,
        Statement::Insert(Insert {
            replace: true,
            source: InsertSource::Query(_),
            ..
        })
    ));
}

#[test]
fn test_update_with_optional_assignments() {
    let stmt = parse(
        "UPDATE users SET OPT_BLOCK s [ REQUIRED(name = ?), OPTIONAL(age = ?, email = ?) ] \
         WHERE id = ? LIMIT 1",
    )
    .unwrap();
    let Statement::Update(update) = stmt else {
        panic!("expected update");
    };
    assert_eq!(update.assignments.len(), 1);
    assert!(update.selection.is_some());
    assert_eq!(
        update.limit,
        Some(Limit {
            count: Expr::number(1),
            offset: None,
        })
    );
}

#[test]
fn test_update_rejects_non_assignment() {
    assert_eq!(
        parse("UPDATE t SET a > 1").unwrap_err().kind(),
        ErrorKind::BaseGrammar
    );
    assert_eq!(
        parse("UPDATE t SET OPT_BLOCK s [ OPTIONAL(a = 1, b) ]")
            .unwrap_err()
            .kind(),
        ErrorKind::BaseGrammar
    );
}

#[test]
fn test_update_with_join() {
    let stmt = parse("UPDATE orders o JOIN users u ON u.id = o.user_id SET o.total = 0").unwrap();
    let Statement::Update(update) = stmt else {
        panic!("expected update");
    };
    assert_eq!(update.table.joins.len(), 1);
    assert_eq!(
        update.assignments,
        vec![Expr::binary(
            Expr::compound("o.total"),
            BinaryOp::Eq,
            Expr::number(0)
        )]
    );
}

#[test]
fn test_delete() {
    let stmt =
        parse("DELETE FROM sessions WHERE OPT_BLOCK f [ OPTIONAL(expired_at < NOW(), user_id = ?) ] ORDER BY id LIMIT 100")
            .unwrap();
    let Statement::Delete(delete) = stmt else {
        panic!("expected delete");
    };
    assert_eq!(delete.table, vec![Ident::bare("sessions")]);
    assert_eq!(delete.order_by, vec![Expr::ident("id")]);
    assert!(matches!(delete.selection, Some(Expr::Macro(_))));
}

#[test]
fn test_unknown_statement() {
    let err = parse("TRUNCATE t").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Parse error at line 1, column 1: expected SELECT, INSERT, REPLACE, UPDATE or DELETE, found 'TRUNCATE'"
    );
}
