//! Symbol-level edits handed to the emitter.

use std::fmt;

use enc_ir::{StringInterner, SymbolKey};

use crate::SyntaxMap;

/// What the emitter does with a runtime symbol.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum SemanticEditKind {
    Insert,
    Update,
    Delete,
    /// Emit a new version of a reloadable type instead of patching it.
    Replace,
}

impl fmt::Display for SemanticEditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SemanticEditKind::Insert => "insert",
            SemanticEditKind::Update => "update",
            SemanticEditKind::Delete => "delete",
            SemanticEditKind::Replace => "replace",
        })
    }
}

/// One runtime symbol to regenerate.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct SemanticEdit {
    pub kind: SemanticEditKind,
    pub symbol: SymbolKey,
    /// For updated bodies, where suspended state moves to.
    pub syntax_map: Option<SyntaxMap>,
    /// For updates of members of a type declared across several
    /// documents: that type. The emitter processes such a type once.
    pub partial_type: Option<SymbolKey>,
}

impl SemanticEdit {
    pub fn new(kind: SemanticEditKind, symbol: SymbolKey) -> Self {
        SemanticEdit {
            kind,
            symbol,
            syntax_map: None,
            partial_type: None,
        }
    }

    #[must_use]
    pub fn with_syntax_map(mut self, syntax_map: Option<SyntaxMap>) -> Self {
        self.syntax_map = syntax_map;
        self
    }

    #[must_use]
    pub fn with_partial_type(mut self, partial_type: Option<SymbolKey>) -> Self {
        self.partial_type = partial_type;
        self
    }

    /// `update N.C.F(Integer)` style rendering.
    pub fn display(&self, interner: &StringInterner) -> String {
        format!("{} {}", self.kind, self.symbol.display(interner))
    }
}
