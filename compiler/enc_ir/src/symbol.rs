//! Runtime symbol keys.
//!
//! A [`SymbolKey`] names the runtime symbol an edit applies to. It is the
//! chain of identity keys from the outermost namespace down to the symbol,
//! skipping nodes with no runtime identity (the compilation unit and field
//! groups). Constructors are keyed `.ctor(...)` / `.cctor()`, so a
//! user-written parameterless constructor and the implicit one share a key.

use smallvec::{smallvec, SmallVec};

use crate::{DeclId, DeclKey, DeclKind, DeclTree, Modifiers, StringInterner};

/// Name of instance constructors.
pub const CONSTRUCTOR_NAME: &str = ".ctor";
/// Name of static constructors.
pub const STATIC_CONSTRUCTOR_NAME: &str = ".cctor";

/// Qualified identity of a runtime symbol.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct SymbolKey {
    path: SmallVec<[DeclKey; 4]>,
}

impl SymbolKey {
    /// Key of the declaration `id` in `tree`.
    pub fn of(tree: &DeclTree, id: DeclId) -> Self {
        let mut path: SmallVec<[DeclKey; 4]> = std::iter::once(id)
            .chain(tree.ancestors(id))
            .filter(|&a| {
                let kind = tree.kind(a);
                kind != DeclKind::CompilationUnit && !kind.is_grouping()
            })
            .map(|a| tree.node(a).key.clone())
            .collect();
        path.reverse();
        SymbolKey { path }
    }

    /// Key of a member named by `key` inside this symbol.
    #[must_use]
    pub fn child(&self, key: DeclKey) -> Self {
        let mut path = self.path.clone();
        path.push(key);
        SymbolKey { path }
    }

    /// Key of the (possibly implicit) parameterless instance constructor, or
    /// of the static constructor, of the type named by this key.
    #[must_use]
    pub fn constructor(&self, interner: &StringInterner, is_static: bool) -> Self {
        let name = if is_static {
            STATIC_CONSTRUCTOR_NAME
        } else {
            CONSTRUCTOR_NAME
        };
        self.child(DeclKey {
            name: interner.intern(name),
            arity: 0,
            signature: Some(smallvec![]),
        })
    }

    /// The key of the enclosing symbol, if any.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.path.split_last()?;
        (!rest.is_empty()).then(|| SymbolKey {
            path: rest.iter().cloned().collect(),
        })
    }

    pub fn segments(&self) -> &[DeclKey] {
        &self.path
    }

    /// Dotted rendering, e.g. `N.C.F(Integer)`.
    pub fn display(&self, interner: &StringInterner) -> String {
        self.path
            .iter()
            .map(|k| k.display(interner))
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Constructor name for a constructor node's modifiers.
pub(crate) fn constructor_name(modifiers: Modifiers) -> &'static str {
    if modifiers.contains(Modifiers::STATIC) {
        STATIC_CONSTRUCTOR_NAME
    } else {
        CONSTRUCTOR_NAME
    }
}
