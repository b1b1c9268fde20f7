//! Round-trip verification of template batches.
//!
//! Each template is cleaned, parsed, regenerated and re-parsed on its own;
//! one template failing never affects its siblings.

pub mod clean;
pub mod report;
pub mod template;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::PatternError;

pub use self::clean::{clean, clean_with};
pub use self::report::{BatchReport, Disposition, ErrorReport, RunReport, TemplateReport, Totals};
pub use self::template::Template;

/// One raw template as received from upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSource {
    pub id: String,
    pub template: String,
}

impl TemplateSource {
    pub fn new(id: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            template: template.into(),
        }
    }
}

/// Templates belonging to one source unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: String,
    pub templates: Vec<TemplateSource>,
}

#[derive(Debug, Clone, Default)]
pub struct Verifier {
    config: Config,
}

impl Verifier {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn verify_template(&self, source: &TemplateSource) -> Template {
        let template = Template::verify(&source.id, &source.template, &self.config.verify);
        match &template.error {
            None => debug!(id = %template.id, "template verified"),
            Some(e) => debug!(id = %template.id, kind = %e.kind(), error = %e, "template failed"),
        }
        template
    }

    fn report(&self, template: &Template) -> TemplateReport {
        TemplateReport::from_template(template, self.config.report.include_cleaned)
    }

    /// Verify every template in `batch` in order.
    pub fn verify_batch(&self, batch: &Batch) -> BatchReport {
        let templates = batch
            .templates
            .iter()
            .map(|source| self.report(&self.verify_template(source)))
            .collect();
        finish_batch(&batch.id, templates)
    }

    pub fn verify_batches(&self, batches: &[Batch]) -> RunReport {
        finish_run(batches.iter().map(|b| self.verify_batch(b)).collect())
    }

    /// Verify all templates of all batches on tokio's blocking pool, with at
    /// most `verify.concurrency` in flight. Report order matches input order.
    pub async fn verify_batches_concurrent(&self, batches: Vec<Batch>) -> RunReport {
        let permits = Arc::new(Semaphore::new(self.config.verify.concurrency.max(1)));
        let mut pending = Vec::with_capacity(batches.len());
        for batch in batches {
            let mut handles = Vec::with_capacity(batch.templates.len());
            for source in batch.templates {
                let permits = Arc::clone(&permits);
                let verifier = self.clone();
                let task_source = source.clone();
                let handle = tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await.map_err(|e| {
                        PatternError::Internal(format!("semaphore closed: {}", e))
                    })?;
                    tokio::task::spawn_blocking(move || {
                        let template = verifier.verify_template(&task_source);
                        verifier.report(&template)
                    })
                    .await
                    .map_err(|e| PatternError::Internal(format!("verification task failed: {}", e)))
                });
                handles.push((source, handle));
            }
            pending.push((batch.id, handles));
        }

        let mut reports = Vec::with_capacity(pending.len());
        for (batch_id, handles) in pending {
            let mut templates = Vec::with_capacity(handles.len());
            for (source, handle) in handles {
                let result = handle
                    .await
                    .map_err(|e| PatternError::Internal(format!("verification task failed: {}", e)))
                    .and_then(|r| r);
                let report = match result {
                    Ok(report) => report,
                    Err(e) => {
                        warn!(id = %source.id, error = %e, "verification task aborted");
                        self.report(&Template::failed(source.id, source.template, e))
                    }
                };
                templates.push(report);
            }
            reports.push(finish_batch(&batch_id, templates));
        }
        finish_run(reports)
    }
}

fn finish_batch(id: &str, templates: Vec<TemplateReport>) -> BatchReport {
    let batch = BatchReport::new(id, templates);
    match batch.disposition {
        Disposition::Failure => warn!(
            batch = %batch.id,
            failed = batch.failure_count,
            "no template in batch verified"
        ),
        _ => debug!(
            batch = %batch.id,
            succeeded = batch.success_count,
            failed = batch.failure_count,
            disposition = %batch.disposition,
            "batch verified"
        ),
    }
    batch
}

fn finish_run(batches: Vec<BatchReport>) -> RunReport {
    let run = RunReport::new(batches);
    info!(
        templates = run.totals.templates,
        succeeded = run.totals.succeeded,
        failed = run.totals.failed,
        full_success = run.totals.full_success,
        partial_success = run.totals.partial_success,
        failure = run.totals.failure,
        "verification finished"
    );
    run
}
