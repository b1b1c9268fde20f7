//! Reading template batches from JSON.
//!
//! Accepted shapes:
//!
//! ```text
//! [ {"id": "SQL-1", "template": "..."}, ... ]                 one batch
//! { "SQL-1": "...", "SQL-2": "..." }                           one batch
//! [ {"id": "fn_a", "templates": [ {"id", "template"}, ... ]} ] many batches
//! [ {"key": "fn_a", "model_output": {"formatted_templates": [...]}} ]
//! ```

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{PatternError, PatternResult};
use crate::verify::{Batch, TemplateSource};

/// Batch id used for the single-batch shapes when no better name is known.
pub const DEFAULT_BATCH_ID: &str = "batch";

#[derive(Deserialize)]
struct WorkflowRecord {
    key: String,
    #[serde(default)]
    model_output: Option<Value>,
}

#[derive(Deserialize)]
struct BatchRecord {
    id: String,
    templates: Vec<TemplateSource>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Input {
    Workflow(Vec<WorkflowRecord>),
    Batches(Vec<BatchRecord>),
    Templates(Vec<TemplateSource>),
    Map(serde_json::Map<String, Value>),
}

/// Parse any accepted shape into batches, in input order.
pub fn parse_batches(json: &str) -> PatternResult<Vec<Batch>> {
    parse_batches_named(json, DEFAULT_BATCH_ID)
}

/// As [`parse_batches`], naming single-batch input `default_id`.
pub fn parse_batches_named(json: &str, default_id: &str) -> PatternResult<Vec<Batch>> {
    let input: Input = serde_json::from_str(json)?;
    let batches = match input {
        Input::Workflow(records) => records.into_iter().map(workflow_batch).collect(),
        Input::Batches(records) => records
            .into_iter()
            .map(|r| Batch {
                id: r.id,
                templates: r.templates,
            })
            .collect(),
        Input::Templates(templates) => vec![Batch {
            id: default_id.to_string(),
            templates,
        }],
        Input::Map(map) => {
            let templates = map
                .into_iter()
                .map(|(id, value)| match value {
                    Value::String(template) => Ok(TemplateSource { id, template }),
                    other => Err(PatternError::Config(format!(
                        "template '{}' must be a string, found {}",
                        id, other
                    ))),
                })
                .collect::<PatternResult<Vec<_>>>()?;
            vec![Batch {
                id: default_id.to_string(),
                templates,
            }]
        }
    };
    debug!(batches = batches.len(), "loaded batches");
    Ok(batches)
}

/// Read a batch file; single-batch input is named after the file stem.
pub fn load_batches(path: &Path) -> PatternResult<Vec<Batch>> {
    let content = std::fs::read_to_string(path)?;
    let default_id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(DEFAULT_BATCH_ID);
    parse_batches_named(&content, default_id)
}

fn workflow_batch(record: WorkflowRecord) -> Batch {
    let formatted = record
        .model_output
        .as_ref()
        .and_then(|output| output.get("formatted_templates"));
    let templates = match formatted {
        Some(Value::Array(items)) => items.iter().enumerate().map(workflow_template).collect(),
        _ => {
            warn!(key = %record.key, "formatted_templates is not a list; batch has no templates");
            Vec::new()
        }
    };
    Batch {
        id: record.key,
        templates,
    }
}

/// Lenient element read: a missing id becomes `SQL-<n>`, a missing template
/// becomes empty text, which then fails verification.
fn workflow_template((index, item): (usize, &Value)) -> TemplateSource {
    let id = match item.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("SQL-{}", index + 1),
    };
    let template = item
        .get("template")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    TemplateSource { id, template }
}

/// Pull a `[{"id", "template"}]` list out of raw model text.
///
/// Strips markdown code fences, then tries the text as-is, then with `\n`
/// and `\"` unescaped, then the outermost `[...]` span.
pub fn extract_templates(model_text: &str) -> PatternResult<Vec<TemplateSource>> {
    let stripped = strip_fences(model_text);
    let first = match serde_json::from_str(stripped) {
        Ok(templates) => return Ok(templates),
        Err(e) => e,
    };
    debug!(error = %first, "model output is not valid JSON, retrying unescaped");

    let unescaped = stripped.replace("\\n", "\n").replace("\\\"", "\"");
    if let Ok(templates) = serde_json::from_str(&unescaped) {
        return Ok(templates);
    }

    let span = unescaped
        .find('[')
        .zip(unescaped.rfind(']'))
        .filter(|(start, end)| start < end)
        .map(|(start, end)| &unescaped[start..=end]);
    match span {
        Some(span) => serde_json::from_str(span).map_err(PatternError::from),
        None => Err(PatternError::from(first)),
    }
}

fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_template_list() {
        let batches =
            parse_batches(r#"[{"id": "SQL-1", "template": "SELECT 1"}, {"id": "SQL-2", "template": "SELECT 2"}]"#)
                .unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].id, DEFAULT_BATCH_ID);
        assert_eq!(batches[0].templates[1], TemplateSource::new("SQL-2", "SELECT 2"));
    }

    #[test]
    fn test_map_keeps_order() {
        let batches = parse_batches(r#"{"b": "SELECT 2", "a": "SELECT 1"}"#).unwrap();
        let ids: Vec<&str> = batches[0].templates.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_map_rejects_non_string() {
        assert!(parse_batches(r#"{"a": 1}"#).is_err());
    }

    #[test]
    fn test_batch_list() {
        let batches = parse_batches(
            r#"[{"id": "fn_a", "templates": [{"id": "1", "template": "SELECT 1"}]},
                {"id": "fn_b", "templates": []}]"#,
        )
        .unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].id, "fn_b");
        assert!(batches[1].templates.is_empty());
    }

    #[test]
    fn test_workflow_output() {
        let batches = parse_batches(
            r#"[
              {"key": "orders.py:list", "success": true, "input_data": {},
               "model_output": {"formatted_templates": [{"id": "SQL-1", "template": "SELECT 1"}, {"template": "SELECT 2"}]}},
              {"key": "orders.py:broken", "success": false,
               "model_output": {"formatted_templates": {"error": "unparseable"}}}
            ]"#,
        )
        .unwrap();
        assert_eq!(batches[0].id, "orders.py:list");
        assert_eq!(batches[0].templates[1].id, "SQL-2");
        assert!(batches[1].templates.is_empty());
    }

    #[test]
    fn test_extract_with_fences() {
        let text = "```json\n[{\"id\": \"SQL-1\", \"template\": \"SELECT 1\"}]\n```";
        let templates = extract_templates(text).unwrap();
        assert_eq!(templates, vec![TemplateSource::new("SQL-1", "SELECT 1")]);
    }

    #[test]
    fn test_extract_escaped() {
        let text = r#"[{\"id\": \"SQL-1\", \"template\": \"SELECT 1\"}]"#;
        let templates = extract_templates(text).unwrap();
        assert_eq!(templates[0].template, "SELECT 1");
    }

    #[test]
    fn test_extract_embedded_list() {
        let text = r#"Here you go: [{"id": "SQL-1", "template": "SELECT 1"}] done"#;
        assert_eq!(extract_templates(text).unwrap().len(), 1);
        assert!(extract_templates("no json here").is_err());
    }
}
