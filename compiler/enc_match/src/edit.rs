//! Structural edits.

use bitflags::bitflags;
use enc_ir::{DeclId, DeclNode, DeclTree};

/// Kind of a structural edit.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum EditKind {
    /// New node with no old counterpart.
    Insert,
    /// Old node with no new counterpart.
    Delete,
    /// Matched nodes under matching parents whose content differs.
    Update,
    /// Matched nodes whose parent changed.
    Move,
    /// Matched nodes under matching parents whose sibling position changed.
    Reorder,
}

bitflags! {
    /// Facts that differ between two matched nodes.
    ///
    /// Field facts are compared on the node itself, not inherited from a
    /// field group, so a change to a group's shared type is reported once,
    /// on the group.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct ContentChange: u32 {
        const NAME = 1 << 0;
        /// Parameter types in the identity key.
        const SIGNATURE = 1 << 1;
        /// Number of type parameters.
        const ARITY = 1 << 2;
        const MODIFIERS = 1 << 3;
        const ACCESSIBILITY = 1 << 4;
        const ATTRIBUTES = 1 << 5;
        const TYPE = 1 << 6;
        const INITIALIZER = 1 << 7;
        /// Body added, removed or changed.
        const BODY = 1 << 8;
        const BODY_KIND = 1 << 9;
        const CHAIN = 1 << 10;
        const BASE_TYPE = 1 << 11;
        const INTERFACES = 1 << 12;
        const UNDERLYING = 1 << 13;
        /// Layout or value-type-ness.
        const LAYOUT = 1 << 14;
        const INTEROP_LIBRARY = 1 << 15;
        const INTEROP_ALIAS = 1 << 16;
    }
}

impl ContentChange {
    /// Changes that alter the runtime symbol's identity key.
    pub const IDENTITY: Self = Self::NAME.union(Self::SIGNATURE).union(Self::ARITY);

    /// Compare the facts of two matched nodes.
    pub fn between(old: &DeclNode, new: &DeclNode) -> ContentChange {
        let mut changes = ContentChange::empty();
        let mut flag = |changed: bool, bit: ContentChange| {
            if changed {
                changes |= bit;
            }
        };

        flag(old.key.name != new.key.name, Self::NAME);
        flag(old.key.signature != new.key.signature, Self::SIGNATURE);
        flag(old.key.arity != new.key.arity, Self::ARITY);
        flag(old.modifiers != new.modifiers, Self::MODIFIERS);
        flag(old.accessibility != new.accessibility, Self::ACCESSIBILITY);
        flag(old.attributes != new.attributes, Self::ATTRIBUTES);
        flag(old.type_ref != new.type_ref, Self::TYPE);
        flag(old.initializer != new.initializer, Self::INITIALIZER);
        flag(
            old.body.as_ref().map(|b| b.fingerprint) != new.body.as_ref().map(|b| b.fingerprint),
            Self::BODY,
        );
        flag(
            old.body.as_ref().map(|b| b.kind) != new.body.as_ref().map(|b| b.kind),
            Self::BODY_KIND,
        );
        flag(old.chain != new.chain, Self::CHAIN);

        if let (Some(o), Some(n)) = (&old.type_facts, &new.type_facts) {
            flag(o.base != n.base, Self::BASE_TYPE);
            flag(o.interfaces != n.interfaces, Self::INTERFACES);
            flag(o.underlying != n.underlying, Self::UNDERLYING);
            flag(
                o.layout != n.layout || o.value_type != n.value_type,
                Self::LAYOUT,
            );
        }
        if let (Some(o), Some(n)) = (&old.interop, &new.interop) {
            flag(o.library != n.library, Self::INTEROP_LIBRARY);
            flag(o.alias != n.alias, Self::INTEROP_ALIAS);
        }
        changes
    }
}

/// One structural difference between the old and new tree of a document.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Edit {
    pub kind: EditKind,
    /// Present for every kind but `Insert`.
    pub old: Option<DeclId>,
    /// Present for every kind but `Delete`.
    pub new: Option<DeclId>,
    pub old_parent: Option<DeclId>,
    pub new_parent: Option<DeclId>,
    /// Content differences of a matched pair (`Update`, `Move`, `Reorder`).
    pub changes: ContentChange,
}

impl Edit {
    pub(crate) fn insert(new: &DeclTree, id: DeclId) -> Self {
        Edit {
            kind: EditKind::Insert,
            old: None,
            new: Some(id),
            old_parent: None,
            new_parent: new.parent(id),
            changes: ContentChange::empty(),
        }
    }

    pub(crate) fn delete(old: &DeclTree, id: DeclId) -> Self {
        Edit {
            kind: EditKind::Delete,
            old: Some(id),
            new: None,
            old_parent: old.parent(id),
            new_parent: None,
            changes: ContentChange::empty(),
        }
    }

    pub(crate) fn pair(
        kind: EditKind,
        (old_tree, old): (&DeclTree, DeclId),
        (new_tree, new): (&DeclTree, DeclId),
        changes: ContentChange,
    ) -> Self {
        Edit {
            kind,
            old: Some(old),
            new: Some(new),
            old_parent: old_tree.parent(old),
            new_parent: new_tree.parent(new),
            changes,
        }
    }
}

/// Edits of one document plus the node correspondence they were derived
/// from.
#[derive(Clone, Debug, Default)]
pub struct EditScript {
    edits: Vec<Edit>,
    old_to_new: Vec<Option<DeclId>>,
    new_to_old: Vec<Option<DeclId>>,
    edit_of_old: Vec<Option<u32>>,
    edit_of_new: Vec<Option<u32>>,
}

impl EditScript {
    pub(crate) fn new(
        edits: Vec<Edit>,
        old_to_new: Vec<Option<DeclId>>,
        new_to_old: Vec<Option<DeclId>>,
    ) -> Self {
        let mut edit_of_old = vec![None; old_to_new.len()];
        let mut edit_of_new = vec![None; new_to_old.len()];
        for (i, edit) in edits.iter().enumerate() {
            let index = u32::try_from(i).ok();
            if let Some(old) = edit.old {
                edit_of_old[old.index()] = index;
            }
            if let Some(new) = edit.new {
                edit_of_new[new.index()] = index;
            }
        }
        EditScript {
            edits,
            old_to_new,
            new_to_old,
            edit_of_old,
            edit_of_new,
        }
    }

    #[inline]
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// New counterpart of an old node.
    pub fn new_of(&self, old: DeclId) -> Option<DeclId> {
        self.old_to_new.get(old.index()).copied().flatten()
    }

    /// Old counterpart of a new node.
    pub fn old_of(&self, new: DeclId) -> Option<DeclId> {
        self.new_to_old.get(new.index()).copied().flatten()
    }

    /// The edit covering an old node, if it has one.
    pub fn edit_of_old(&self, old: DeclId) -> Option<&Edit> {
        let index = self.edit_of_old.get(old.index()).copied().flatten()?;
        self.edits.get(index as usize)
    }

    /// The edit covering a new node, if it has one.
    pub fn edit_of_new(&self, new: DeclId) -> Option<&Edit> {
        let index = self.edit_of_new.get(new.index()).copied().flatten()?;
        self.edits.get(index as usize)
    }
}
