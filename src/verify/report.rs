//! Serializable verification reports.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::template::Template;
use crate::error::{ErrorKind, PatternResult, Position};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateReport {
    pub id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleaned_text: Option<String>,
    /// OPT_BLOCK names declared by the template.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<String>,
}

impl TemplateReport {
    pub fn from_template(template: &Template, include_cleaned: bool) -> Self {
        Self {
            id: template.id.clone(),
            success: template.success(),
            generated_text: template.generated.clone(),
            error: template.error.as_ref().map(|e| ErrorReport {
                kind: e.kind(),
                message: e.to_string(),
                position: e.position(),
            }),
            cleaned_text: include_cleaned.then(|| template.cleaned.clone()),
            blocks: template
                .statement
                .as_ref()
                .map(|s| s.block_names().into_iter().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }
}

/// Outcome of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Every template verified.
    FullSuccess,
    /// At least one, but not every, template verified.
    PartialSuccess,
    /// Nothing verified, including empty batches.
    Failure,
}

impl Disposition {
    pub fn classify(succeeded: usize, total: usize) -> Self {
        if total == 0 || succeeded == 0 {
            Disposition::Failure
        } else if succeeded == total {
            Disposition::FullSuccess
        } else {
            Disposition::PartialSuccess
        }
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disposition::FullSuccess => write!(f, "full success"),
            Disposition::PartialSuccess => write!(f, "partial success"),
            Disposition::Failure => write!(f, "failure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub id: String,
    pub disposition: Disposition,
    pub success_count: usize,
    pub failure_count: usize,
    pub templates: Vec<TemplateReport>,
}

impl BatchReport {
    pub fn new(id: impl Into<String>, templates: Vec<TemplateReport>) -> Self {
        let success_count = templates.iter().filter(|t| t.success).count();
        let failure_count = templates.len() - success_count;
        Self {
            id: id.into(),
            disposition: Disposition::classify(success_count, templates.len()),
            success_count,
            failure_count,
            templates,
        }
    }
}

/// Counts rolled up across every batch in a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub templates: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub full_success: usize,
    pub partial_success: usize,
    pub failure: usize,
    pub error_kinds: BTreeMap<ErrorKind, usize>,
}

impl Totals {
    fn add(&mut self, batch: &BatchReport) {
        self.templates += batch.templates.len();
        self.succeeded += batch.success_count;
        self.failed += batch.failure_count;
        match batch.disposition {
            Disposition::FullSuccess => self.full_success += 1,
            Disposition::PartialSuccess => self.partial_success += 1,
            Disposition::Failure => self.failure += 1,
        }
        for error in batch.templates.iter().filter_map(|t| t.error.as_ref()) {
            *self.error_kinds.entry(error.kind).or_default() += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub totals: Totals,
    pub batches: Vec<BatchReport>,
}

impl RunReport {
    pub fn new(batches: Vec<BatchReport>) -> Self {
        let mut totals = Totals::default();
        for batch in &batches {
            totals.add(batch);
        }
        Self {
            generated_at: Utc::now(),
            totals,
            batches,
        }
    }

    pub fn to_json(&self, pretty: bool) -> PatternResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    pub fn write_to(&self, path: &Path, pretty: bool) -> PatternResult<()> {
        std::fs::write(path, self.to_json(pretty)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn report(id: &str, success: bool) -> TemplateReport {
        TemplateReport {
            id: id.to_string(),
            success,
            generated_text: None,
            error: (!success).then(|| ErrorReport {
                kind: ErrorKind::UnscopedGroup,
                message: "x".into(),
                position: None,
            }),
            cleaned_text: None,
            blocks: vec![],
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(Disposition::classify(3, 3), Disposition::FullSuccess);
        assert_eq!(Disposition::classify(1, 3), Disposition::PartialSuccess);
        assert_eq!(Disposition::classify(0, 3), Disposition::Failure);
        assert_eq!(Disposition::classify(0, 0), Disposition::Failure);
    }

    #[test]
    fn test_totals_roll_up() {
        let run = RunReport::new(vec![
            BatchReport::new("a", vec![report("1", true), report("2", false)]),
            BatchReport::new("b", vec![report("3", true)]),
            BatchReport::new("c", vec![]),
        ]);
        assert_eq!(run.totals.templates, 3);
        assert_eq!(run.totals.succeeded, 2);
        assert_eq!(run.totals.failed, 1);
        assert_eq!(
            (
                run.totals.full_success,
                run.totals.partial_success,
                run.totals.failure
            ),
            (1, 1, 1)
        );
        assert_eq!(run.totals.error_kinds.get(&ErrorKind::UnscopedGroup), Some(&1));
    }

    #[test]
    fn test_json_shape() {
        let batch = BatchReport::new("b", vec![report("SQL-1", false)]);
        let value = serde_json::to_value(&batch).unwrap();
        assert_eq!(value["disposition"], "failure");
        assert_eq!(value["templates"][0]["error"]["kind"], "unscoped_group");
        assert!(value["templates"][0].get("generated_text").is_none());
        let run = RunReport::new(vec![batch]);
        let json = run.to_json(false).unwrap();
        assert!(json.contains("\"error_kinds\":{\"unscoped_group\":1}"));
    }
}
