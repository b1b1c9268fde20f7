//! Template macros layered onto SQL expressions.
//!
//! ```text
//! OPT_BLOCK <name> [ item, ... ]   named all-or-nothing group, unique per template
//! REQUIRED( item, ... )            every item is rendered
//! OPTIONAL( item, ... )            at most one item is rendered
//! LOOP( item, ... )                the pattern repeats zero or more times
//! ```
//!
//! The three group macros are only legal inside an `OPT_BLOCK`.

use crate::ast::Expr;
use crate::error::{PatternError, PatternResult, Position};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MacroKind {
    OptionalBlock,
    RequiredGroup,
    OptionalGroup,
    LoopGroup,
}

impl MacroKind {
    pub const ALL: [MacroKind; 4] = [
        MacroKind::OptionalBlock,
        MacroKind::RequiredGroup,
        MacroKind::OptionalGroup,
        MacroKind::LoopGroup,
    ];

    /// The template keyword introducing this macro.
    pub fn keyword(&self) -> &'static str {
        match self {
            MacroKind::OptionalBlock => "OPT_BLOCK",
            MacroKind::RequiredGroup => "REQUIRED",
            MacroKind::OptionalGroup => "OPTIONAL",
            MacroKind::LoopGroup => "LOOP",
        }
    }

    /// Case-insensitive keyword lookup.
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.keyword().eq_ignore_ascii_case(word))
    }

    pub fn is_group(&self) -> bool {
        !matches!(self, MacroKind::OptionalBlock)
    }
}

impl std::fmt::Display for MacroKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Macro {
    OptionalBlock { name: String, children: Vec<Expr> },
    RequiredGroup(Vec<Expr>),
    OptionalGroup(Vec<Expr>),
    LoopGroup(Vec<Expr>),
}

impl Macro {
    /// Build an `OPT_BLOCK`. Fails with `MalformedMacro` when `children` is empty.
    pub fn optional_block(
        name: impl Into<String>,
        children: Vec<Expr>,
        position: Position,
    ) -> PatternResult<Self> {
        if children.is_empty() {
            return Err(PatternError::MalformedMacro {
                kind: MacroKind::OptionalBlock,
                position,
            });
        }
        Ok(Macro::OptionalBlock {
            name: name.into(),
            children,
        })
    }

    /// Build a REQUIRED/OPTIONAL/LOOP group. Fails with `MalformedMacro` when
    /// `children` is empty or `kind` is not a group kind.
    pub fn group(kind: MacroKind, children: Vec<Expr>, position: Position) -> PatternResult<Self> {
        if children.is_empty() {
            return Err(PatternError::MalformedMacro { kind, position });
        }
        match kind {
            MacroKind::RequiredGroup => Ok(Macro::RequiredGroup(children)),
            MacroKind::OptionalGroup => Ok(Macro::OptionalGroup(children)),
            MacroKind::LoopGroup => Ok(Macro::LoopGroup(children)),
            MacroKind::OptionalBlock => Err(PatternError::MalformedMacro { kind, position }),
        }
    }

    pub fn kind(&self) -> MacroKind {
        match self {
            Macro::OptionalBlock { .. } => MacroKind::OptionalBlock,
            Macro::RequiredGroup(_) => MacroKind::RequiredGroup,
            Macro::OptionalGroup(_) => MacroKind::OptionalGroup,
            Macro::LoopGroup(_) => MacroKind::LoopGroup,
        }
    }

    /// Block name, for `OPT_BLOCK` only.
    pub fn name(&self) -> Option<&str> {
        match self {
            Macro::OptionalBlock { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Expr] {
        match self {
            Macro::OptionalBlock { children, .. }
            | Macro::RequiredGroup(children)
            | Macro::OptionalGroup(children)
            | Macro::LoopGroup(children) => children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Position {
        Position::locate("", 0)
    }

    #[test]
    fn test_keyword_lookup_is_case_insensitive() {
        assert_eq!(MacroKind::from_keyword("opt_block"), Some(MacroKind::OptionalBlock));
        assert_eq!(MacroKind::from_keyword("Loop"), Some(MacroKind::LoopGroup));
        assert_eq!(MacroKind::from_keyword("optionally"), None);
    }

    #[test]
    fn test_group_rejects_empty_body() {
        let err = Macro::group(MacroKind::LoopGroup, vec![], origin()).unwrap_err();
        assert!(matches!(
            err,
            PatternError::MalformedMacro {
                kind: MacroKind::LoopGroup,
                ..
            }
        ));
    }

    #[test]
    fn test_block_rejects_empty_body() {
        let err = Macro::optional_block("filters", vec![], origin()).unwrap_err();
        assert!(matches!(
            err,
            PatternError::MalformedMacro {
                kind: MacroKind::OptionalBlock,
                ..
            }
        ));
    }

    #[test]
    fn test_group_constructor_refuses_block_kind() {
        let err = Macro::group(MacroKind::OptionalBlock, vec![Expr::ident("a")], origin());
        assert!(err.is_err());
    }

    #[test]
    fn test_accessors() {
        let block = Macro::optional_block(
            "proj",
            vec![Macro::group(MacroKind::RequiredGroup, vec![Expr::ident("id")], origin())
                .unwrap()
                .into()],
            origin(),
        )
        .unwrap();
        assert_eq!(block.kind(), MacroKind::OptionalBlock);
        assert_eq!(block.name(), Some("proj"));
        assert_eq!(block.children().len(), 1);
        assert_eq!(
            block.children()[0].as_macro().map(Macro::kind),
            Some(MacroKind::RequiredGroup)
        );
    }
}
