//! OPT_BLOCK and group macro rules.

use crate::ast::*;
use crate::error::{PatternError, PatternResult};
use crate::parser::Parser;
use crate::parser::tokens::TokenKind;

impl<'a> Parser<'a> {
    /// Dispatch on the macro token at the cursor.
    pub(crate) fn parse_macro(&mut self, kind: MacroKind) -> PatternResult<Expr> {
        let m = match kind {
            MacroKind::OptionalBlock => self.parse_block()?,
            group => self.parse_group(group)?,
        };
        Ok(Expr::Macro(m))
    }

    /// OPT_BLOCK name [ item, ... ]
    fn parse_block(&mut self) -> PatternResult<Macro> {
        let position = self.position();
        self.clauses.check_block_allowed(position)?;
        self.pos += 1;

        let name = match self.peek() {
            Some(TokenKind::Word(w)) | Some(TokenKind::QuotedIdent(w)) => w.clone(),
            _ => return Err(self.unexpected("OPT_BLOCK name")),
        };
        self.pos += 1;
        if let Some(first) = self.blocks.declared.get(&name) {
            return Err(PatternError::DuplicateBlockName {
                name,
                first: *first,
                position,
            });
        }
        self.blocks.declared.insert(name.clone(), position);

        self.expect(&TokenKind::LBracket)?;
        if self.peek() == Some(&TokenKind::RBracket) {
            return Err(PatternError::EmptyBlock { name, position });
        }

        self.blocks.open += 1;
        let children = self.descend(|p| p.parse_comma_separated(|p| p.parse_clause_item()));
        self.blocks.open -= 1;
        let children = children?;

        self.expect(&TokenKind::RBracket)?;
        Macro::optional_block(name, children, position)
    }

    /// REQUIRED( ... ), OPTIONAL( ... ) or LOOP( ... )
    fn parse_group(&mut self, kind: MacroKind) -> PatternResult<Macro> {
        let position = self.position();
        self.pos += 1;
        self.expect(&TokenKind::LParen)?;
        if self.consume(&TokenKind::RParen) {
            return Macro::group(kind, Vec::new(), position);
        }
        if self.blocks.open == 0 {
            return Err(PatternError::UnscopedGroup { kind, position });
        }

        let leading = match self.peek() {
            Some(t @ (TokenKind::Comma | TokenKind::DoublePipe | TokenKind::DoubleAmp)) => Some(t),
            Some(t) if t.is_keyword("AND") || t.is_keyword("OR") => Some(t),
            _ => None,
        };
        if let Some(found) = leading {
            return Err(PatternError::InvalidGroupStart {
                kind,
                found: found.to_string().to_ascii_uppercase(),
                position: self.position(),
            });
        }

        let children = self.descend(|p| p.parse_comma_separated(|p| p.parse_clause_item()))?;
        self.expect(&TokenKind::RParen)?;
        Macro::group(kind, children, position)
    }
}
