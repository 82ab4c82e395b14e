//! Stable declaration identity keys.
//!
//! A key is what survives between two versions of a document: name, generic
//! arity and (for callables) the parameter type shape. Positions never take
//! part in identity.

use std::fmt::Write;

use smallvec::SmallVec;

use crate::{Name, StringInterner};

/// Identity of a declaration among its siblings of the same kind.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct DeclKey {
    pub name: Name,
    /// Number of type parameters.
    pub arity: u16,
    /// Parameter types, `None` for kinds without a signature.
    pub signature: Option<SmallVec<[Name; 4]>>,
}

impl DeclKey {
    /// Key with a name only.
    pub fn named(name: Name) -> Self {
        DeclKey {
            name,
            arity: 0,
            signature: None,
        }
    }

    /// Whether two keys differ only by name.
    pub fn same_shape(&self, other: &DeclKey) -> bool {
        self.arity == other.arity && self.signature == other.signature
    }

    /// Human-readable rendering, e.g. `F(Integer, String)` or ``List`1``.
    pub fn display(&self, interner: &StringInterner) -> String {
        let mut out = interner.lookup(self.name).to_owned();
        if self.arity > 0 {
            let _ = write!(out, "`{}", self.arity);
        }
        if let Some(signature) = &self.signature {
            out.push('(');
            for (i, ty) in signature.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(interner.lookup(*ty));
            }
            out.push(')');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use smallvec::smallvec;

    use super::*;

    #[test]
    fn display_includes_arity_and_signature() {
        let interner = StringInterner::new();
        let key = DeclKey {
            name: interner.intern("F"),
            arity: 1,
            signature: Some(smallvec![interner.intern("Integer"), interner.intern("T")]),
        };
        assert_eq!(key.display(&interner), "F`1(Integer, T)");
    }

    #[test]
    fn same_shape_ignores_name() {
        let interner = StringInterner::new();
        let a = DeclKey::named(interner.intern("a"));
        let b = DeclKey::named(interner.intern("b"));
        assert!(a.same_shape(&b));
        assert_ne!(a, b);
    }
}
