//! Per-document analysis inputs.

use std::fmt;

use enc_ir::{DeclId, DeclTree, DocumentId, Span};
use enc_match::EditScript;

/// A declaration in one version of one document.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeRef {
    pub document: DocumentId,
    pub id: DeclId,
}

impl NodeRef {
    #[inline]
    pub const fn new(document: DocumentId, id: DeclId) -> Self {
        NodeRef { document, id }
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.document, self.id)
    }
}

/// One document after matching: both tree versions and the script between
/// them.
///
/// Documents are identified by their position in the slice handed to the
/// analysis; the position is the [`DocumentId`].
#[derive(Debug)]
pub struct DocumentDiff<'d> {
    pub old: &'d DeclTree,
    pub new: &'d DeclTree,
    pub script: EditScript,
    /// Spans of the statements the running program is suspended at, in old
    /// document coordinates.
    pub active_statements: &'d [Span],
}
