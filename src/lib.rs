//! # sqlpattern: templated SQL with optional blocks
//!
//! One template describes every statement shape a piece of dynamic ORM code
//! can emit. Four macros extend a MySQL-flavoured grammar:
//!
//! | Macro                    | Meaning                                   |
//! |--------------------------|-------------------------------------------|
//! | `OPT_BLOCK name [ ... ]` | named group that appears entirely or not  |
//! | `REQUIRED( ... )`        | every item appears                        |
//! | `OPTIONAL( ... )`        | at most one item appears                  |
//! | `LOOP( ... )`            | the pattern repeats zero or more times    |
//!
//! ## Quick Example
//!
//! ```rust
//! use sqlpattern::prelude::*;
//!
//! let stmt = sqlpattern::parse(
//!     "SELECT OPT_BLOCK proj [ REQUIRED(id, name), OPTIONAL(age, email) ] \
//!      FROM users WHERE OPT_BLOCK filt [ OPTIONAL(status = ?, age > ?) ]",
//! )
//! .unwrap();
//! assert_eq!(stmt.block_names(), vec!["proj", "filt"]);
//! assert_eq!(
//!     stmt.to_sql(),
//!     "SELECT OPT_BLOCK proj [REQUIRED(id, name), OPTIONAL(age, email)] \
//!      FROM users WHERE OPT_BLOCK filt [OPTIONAL(status = ?, age > ?)]"
//! );
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod load;
pub mod parser;
pub mod transpiler;
pub mod verify;

pub mod prelude {
    pub use crate::ast::*;
    pub use crate::config::Config;
    pub use crate::error::*;
    pub use crate::parser::{ClauseContext, parse};
    pub use crate::transpiler::ToSql;
    pub use crate::verify::{Batch, BatchReport, Disposition, RunReport, TemplateSource, Verifier};
}

/// Parse one template (already cleaned) into a statement.
pub fn parse(input: &str) -> error::PatternResult<ast::Statement> {
    parser::parse(input)
}

/// Render a statement back to canonical template text.
pub fn generate(statement: &ast::Statement) -> String {
    use transpiler::ToSql;
    statement.to_sql()
}

/// Clean raw upstream text: unescape `\n`, rewrite braces to brackets, trim.
///
/// ```
/// assert_eq!(sqlpattern::clean("a\\nb{x}"), "a\nb[x]");
/// ```
pub fn clean(raw: &str) -> String {
    verify::clean(raw)
}
