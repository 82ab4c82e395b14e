//! Document identity.

use std::fmt;

/// Index of a document in the session's document list.
///
/// Declaration order of partial types follows document order, so ids are
/// also the deterministic tie-break for ownership of synthesized members.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct DocumentId(pub u32);

impl DocumentId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document#{}", self.0)
    }
}
