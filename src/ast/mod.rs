//! Syntax tree for SQL templates: ordinary SQL nodes with macros embedded as expressions.

pub mod expr;
pub mod operators;
pub mod pattern;
pub mod stmt;
pub mod values;
pub mod visit;

pub use expr::*;
pub use operators::*;
pub use pattern::*;
pub use stmt::*;
pub use values::*;
