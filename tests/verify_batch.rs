use pretty_assertions::assert_eq;
use sqlpattern::load::{extract_templates, parse_batches};
use sqlpattern::prelude::*;

fn batch(id: &str, templates: &[(&str, &str)]) -> Batch {
    Batch {
        id: id.to_string(),
        templates: templates
            .iter()
            .map(|(id, template)| TemplateSource::new(*id, *template))
            .collect(),
    }
}

#[test]
fn test_cleaning_normalizes_upstream_text() {
    assert_eq!(sqlpattern::clean("a\\nb{x}"), "a\nb[x]");
    assert_eq!(
        sqlpattern::clean("  SELECT '{a}' FROM t WHERE OPT_BLOCK f {\\n OPTIONAL(a = ?) } "),
        "SELECT '{a}' FROM t WHERE OPT_BLOCK f [\n OPTIONAL(a = ?) ]"
    );
}

#[test]
fn test_malformed_template_does_not_affect_siblings() {
    let report = Verifier::default().verify_batch(&batch(
        "orders.py:list",
        &[
            ("SQL-1", "SELECT id FROM orders WHERE OPT_BLOCK f { OPTIONAL(status = ?, total > ?) }"),
            ("SQL-2", "SELECT OPTIONAL(id, total) FROM orders"),
            ("SQL-3", "SELECT id FROM orders ORDER BY id DESC"),
        ],
    ));

    assert_eq!(report.disposition, Disposition::PartialSuccess);
    assert_eq!((report.success_count, report.failure_count), (2, 1));

    let first = &report.templates[0];
    assert!(first.success);
    assert_eq!(
        first.generated_text.as_deref(),
        Some("SELECT id FROM orders WHERE OPT_BLOCK f [OPTIONAL(status = ?, total > ?)]")
    );
    assert_eq!(first.blocks, vec!["f".to_string()]);

    let second = &report.templates[1];
    assert!(!second.success);
    assert_eq!(second.generated_text, None);
    assert_eq!(second.error.as_ref().map(|e| e.kind), Some(ErrorKind::UnscopedGroup));

    assert!(report.templates[2].success);
}

#[test]
fn test_dispositions_across_batches() {
    let run = Verifier::default().verify_batches(&[
        batch("all_good", &[("1", "SELECT 1"), ("2", "DELETE FROM t WHERE id = ?")]),
        batch("all_bad", &[("1", "SELECT OPT_BLOCK p [ ] FROM t"), ("2", "DROP TABLE t")]),
        batch("empty", &[]),
    ]);
    let dispositions: Vec<Disposition> = run.batches.iter().map(|b| b.disposition).collect();
    assert_eq!(
        dispositions,
        vec![Disposition::FullSuccess, Disposition::Failure, Disposition::Failure]
    );
    assert_eq!(run.totals.templates, 4);
    assert_eq!(run.totals.succeeded, 2);
    assert_eq!(run.totals.error_kinds.get(&ErrorKind::EmptyBlock), Some(&1));
    assert_eq!(run.totals.error_kinds.get(&ErrorKind::BaseGrammar), Some(&1));
}

#[tokio::test]
async fn test_workflow_output_end_to_end() {
    let json = r#"[
      {"key": "users.py:search",
       "model_output": {"formatted_templates": [
         {"id": "SQL-1", "template": "SELECT OPT_BLOCK proj {REQUIRED(id, name), OPTIONAL(age, email)}\nFROM users"},
         {"id": "SQL-2", "template": "SELECT id FROM users LIMIT"}
       ]}},
      {"key": "users.py:broken", "model_output": {"formatted_templates": "not a list"}}
    ]"#;
    let batches = parse_batches(json).unwrap();
    let verifier = Verifier::new(Config::builder().concurrency(2).include_cleaned(true).build());
    let run = verifier.verify_batches_concurrent(batches).await;

    assert_eq!(run.batches.len(), 2);
    assert_eq!(run.batches[0].disposition, Disposition::PartialSuccess);
    assert_eq!(
        run.batches[0].templates[0].cleaned_text.as_deref(),
        Some("SELECT OPT_BLOCK proj [REQUIRED(id, name), OPTIONAL(age, email)]\nFROM users")
    );
    assert_eq!(run.batches[1].disposition, Disposition::Failure);
    assert!(run.batches[1].templates.is_empty());

    let json = run.to_json(false).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["totals"]["full_success"], 0);
    assert_eq!(value["totals"]["partial_success"], 1);
    assert_eq!(value["batches"][1]["id"], "users.py:broken");
}

#[test]
fn test_extracted_templates_verify() {
    let text = "```json\n[{\"id\": \"SQL-1\", \"template\": \"UPDATE t SET OPT_BLOCK s {OPTIONAL(a = ?, b = ?)} WHERE id = ?\"}]\n```";
    let templates = extract_templates(text).unwrap();
    let report = Verifier::default().verify_batch(&Batch {
        id: "fn".into(),
        templates,
    });
    assert_eq!(report.disposition, Disposition::FullSuccess);
}
