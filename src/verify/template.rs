use crate::ast::Statement;
use crate::error::{PatternError, PatternResult};
use crate::parser::parse_with_depth;
use crate::transpiler::ToSql;

use super::clean::clean_with;
use crate::config::VerifyConfig;

/// One template after verification. Built once by [`Template::verify`].
#[derive(Debug)]
pub struct Template {
    pub id: String,
    pub raw: String,
    pub cleaned: String,
    pub statement: Option<Statement>,
    pub generated: Option<String>,
    pub error: Option<PatternError>,
}

impl Template {
    /// Clean, parse, regenerate and (optionally) re-parse `raw`.
    pub fn verify(id: impl Into<String>, raw: impl Into<String>, config: &VerifyConfig) -> Self {
        let raw = raw.into();
        let cleaned = clean_with(&raw, config.rewrite_braces);
        let (statement, generated, error) = match round_trip(&cleaned, config) {
            Ok((statement, generated)) => (Some(statement), Some(generated), None),
            Err(Failure {
                statement,
                generated,
                error,
            }) => (statement, generated, Some(error)),
        };
        Self {
            id: id.into(),
            raw,
            cleaned,
            statement,
            generated,
            error,
        }
    }

    /// A failed record for a template whose verification never ran to completion.
    pub fn failed(id: impl Into<String>, raw: impl Into<String>, error: PatternError) -> Self {
        let raw = raw.into();
        Self {
            id: id.into(),
            cleaned: raw.trim().to_string(),
            raw,
            statement: None,
            generated: None,
            error: Some(error),
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

struct Failure {
    statement: Option<Statement>,
    generated: Option<String>,
    error: PatternError,
}

impl From<PatternError> for Failure {
    fn from(error: PatternError) -> Self {
        Self {
            statement: None,
            generated: None,
            error,
        }
    }
}

fn round_trip(cleaned: &str, config: &VerifyConfig) -> Result<(Statement, String), Failure> {
    let statement = parse_with_depth(cleaned, config.max_depth)?;
    let generated = statement.to_sql();
    if !config.check_round_trip {
        return Ok((statement, generated));
    }
    match check_regenerated(&statement, &generated, config) {
        Ok(()) => Ok((statement, generated)),
        Err(error) => Err(Failure {
            statement: Some(statement),
            generated: Some(generated),
            error,
        }),
    }
}

fn check_regenerated(
    statement: &Statement,
    generated: &str,
    config: &VerifyConfig,
) -> PatternResult<()> {
    let reparsed = parse_with_depth(generated, config.max_depth).map_err(|e| {
        PatternError::RoundTrip(format!("generated text does not parse: {}", e))
    })?;
    if &reparsed != statement {
        return Err(PatternError::RoundTrip(format!(
            "generated text parses to a different statement: {}",
            generated
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_verify_success() {
        let t = Template::verify(
            "SQL-1",
            "SELECT id FROM t WHERE OPT_BLOCK f {\\n OPTIONAL(a = ?, b = ?) }",
            &VerifyConfig::default(),
        );
        assert!(t.success());
        assert_eq!(
            t.generated.as_deref(),
            Some("SELECT id FROM t WHERE OPT_BLOCK f [OPTIONAL(a = ?, b = ?)]")
        );
        assert!(t.statement.is_some());
    }

    #[test]
    fn test_apostrophe_in_comment_does_not_hide_braces() {
        let t = Template::verify(
            "SQL-4",
            "SELECT id FROM users -- user's filters\\nWHERE OPT_BLOCK f { OPTIONAL(a = ?, b = ?) }",
            &VerifyConfig::default(),
        );
        assert!(t.success(), "{:?}", t.error);
        assert_eq!(
            t.generated.as_deref(),
            Some("SELECT id FROM users WHERE OPT_BLOCK f [OPTIONAL(a = ?, b = ?)]")
        );
    }

    #[test]
    fn test_verify_failure_keeps_error() {
        let t = Template::verify("SQL-2", "SELECT REQUIRED(a) FROM t", &VerifyConfig::default());
        assert!(!t.success());
        assert!(t.statement.is_none());
        assert_eq!(
            t.error.as_ref().map(PatternError::kind),
            Some(ErrorKind::UnscopedGroup)
        );
    }

    #[test]
    fn test_braces_kept_when_rewrite_disabled() {
        let config = VerifyConfig {
            rewrite_braces: false,
            ..VerifyConfig::default()
        };
        let t = Template::verify("SQL-3", "SELECT * FROM t WHERE OPT_BLOCK f { a = 1 }", &config);
        assert_eq!(t.error.as_ref().map(PatternError::kind), Some(ErrorKind::BaseGrammar));
    }
}
