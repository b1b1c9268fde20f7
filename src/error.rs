//! Error types for sqlpattern.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::ast::MacroKind;

/// A location in template text. `line` and `column` are 1-based, `offset` is a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Resolve a byte offset into line/column coordinates within `source`.
    pub fn locate(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let mut line = 1;
        let mut column = 1;
        for (i, c) in source.char_indices() {
            if i >= offset {
                break;
            }
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// The main error type for sqlpattern operations.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A macro was built or parsed with an empty body.
    #[error("{kind} body must not be empty ({position})")]
    MalformedMacro { kind: MacroKind, position: Position },

    /// An OPT_BLOCK name was declared twice in one template.
    #[error("OPT_BLOCK '{name}' already declared at {first}; redeclared at {position}")]
    DuplicateBlockName {
        name: String,
        first: Position,
        position: Position,
    },

    /// `OPT_BLOCK name []` with nothing between the brackets.
    #[error("OPT_BLOCK '{name}' has no items ({position})")]
    EmptyBlock { name: String, position: Position },

    /// A group body starting with `,`, `AND` or `OR`.
    #[error("{kind} cannot start with '{found}' ({position})")]
    InvalidGroupStart {
        kind: MacroKind,
        found: String,
        position: Position,
    },

    /// REQUIRED/OPTIONAL/LOOP outside of any OPT_BLOCK.
    #[error("{kind} must be nested inside an OPT_BLOCK ({position})")]
    UnscopedGroup { kind: MacroKind, position: Position },

    /// A macro appeared where no clause grammar can govern its body.
    #[error("{message} ({position})")]
    ClauseContext { message: String, position: Position },

    /// Failure in the underlying SQL grammar, unrelated to macros.
    #[error("Parse error at {}: {message}", display_position(.position))]
    Parse {
        message: String,
        position: Option<Position>,
    },

    /// The regenerated text did not parse back to the same statement.
    #[error("Round-trip mismatch: {0}")]
    RoundTrip(String),

    /// A verification task died before producing a result.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON input or output error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_position(position: &Option<Position>) -> String {
    match position {
        Some(p) => p.to_string(),
        None => "end of input".to_string(),
    }
}

/// Coarse error category recorded in verification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedMacro,
    DuplicateBlockName,
    EmptyBlock,
    InvalidGroupStart,
    UnscopedGroup,
    ClauseContext,
    BaseGrammar,
    RoundTrip,
    Internal,
    Config,
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedMacro => "malformed_macro",
            ErrorKind::DuplicateBlockName => "duplicate_block_name",
            ErrorKind::EmptyBlock => "empty_block",
            ErrorKind::InvalidGroupStart => "invalid_group_start",
            ErrorKind::UnscopedGroup => "unscoped_group",
            ErrorKind::ClauseContext => "clause_context",
            ErrorKind::BaseGrammar => "base_grammar",
            ErrorKind::RoundTrip => "round_trip",
            ErrorKind::Internal => "internal",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
        }
    }

    /// Kinds raised by the macro layer rather than the base SQL grammar.
    pub fn is_macro_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::MalformedMacro
                | ErrorKind::DuplicateBlockName
                | ErrorKind::EmptyBlock
                | ErrorKind::InvalidGroupStart
                | ErrorKind::UnscopedGroup
                | ErrorKind::ClauseContext
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PatternError {
    /// Create a base-grammar parse error at the given position.
    pub fn parse(position: Option<Position>, message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            position,
        }
    }

    /// Create a clause-context error.
    pub fn clause(position: Position, message: impl Into<String>) -> Self {
        Self::ClauseContext {
            message: message.into(),
            position,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedMacro { .. } => ErrorKind::MalformedMacro,
            Self::DuplicateBlockName { .. } => ErrorKind::DuplicateBlockName,
            Self::EmptyBlock { .. } => ErrorKind::EmptyBlock,
            Self::InvalidGroupStart { .. } => ErrorKind::InvalidGroupStart,
            Self::UnscopedGroup { .. } => ErrorKind::UnscopedGroup,
            Self::ClauseContext { .. } => ErrorKind::ClauseContext,
            Self::Parse { .. } => ErrorKind::BaseGrammar,
            Self::RoundTrip(_) => ErrorKind::RoundTrip,
            Self::Internal(_) => ErrorKind::Internal,
            Self::Config(_) | Self::Json(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Source position of the failure, when one is known.
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::MalformedMacro { position, .. }
            | Self::DuplicateBlockName { position, .. }
            | Self::EmptyBlock { position, .. }
            | Self::InvalidGroupStart { position, .. }
            | Self::UnscopedGroup { position, .. }
            | Self::ClauseContext { position, .. } => Some(*position),
            Self::Parse { position, .. } => *position,
            _ => None,
        }
    }
}

/// Result type alias for sqlpattern operations.
pub type PatternResult<T> = Result<T, PatternError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PatternError::parse(Some(Position::locate("SELECT\n  x y z", 13)), "unexpected 'z'");
        assert_eq!(err.to_string(), "Parse error at line 2, column 7: unexpected 'z'");
    }

    #[test]
    fn test_error_display_at_end() {
        let err = PatternError::parse(None, "unexpected end of input");
        assert_eq!(
            err.to_string(),
            "Parse error at end of input: unexpected end of input"
        );
    }

    #[test]
    fn test_locate_clamps_offset() {
        let pos = Position::locate("ab", 10);
        assert_eq!(pos.offset, 2);
        assert_eq!((pos.line, pos.column), (1, 3));
    }

    #[test]
    fn test_kind_mapping() {
        let err = PatternError::UnscopedGroup {
            kind: MacroKind::RequiredGroup,
            position: Position::locate("", 0),
        };
        assert_eq!(err.kind(), ErrorKind::UnscopedGroup);
        assert!(err.kind().is_macro_error());
        assert_eq!(err.to_string(), "REQUIRED must be nested inside an OPT_BLOCK (line 1, column 1)");
        assert!(!PatternError::RoundTrip("x".into()).kind().is_macro_error());
    }
}
