//! Similarity pairing of declarations whose identity keys differ.

use enc_ir::{DeclId, DeclKey, DeclKind, DeclNode, DeclTree};
use rustc_hash::FxHashSet;

/// Whether `old_id` and `new_id` (same kind, different keys) most likely
/// denote one declaration that was renamed or re-signatured.
///
/// Parameters and type parameters pair by position instead and are never
/// similar here.
pub(crate) fn is_similar(old: &DeclTree, old_id: DeclId, new: &DeclTree, new_id: DeclId) -> bool {
    let (a, b) = (old.node(old_id), new.node(new_id));
    if a.kind != b.kind {
        return false;
    }
    match a.kind {
        DeclKind::Constructor => {
            a.key.name == b.key.name || (a.key.same_shape(&b.key) && same_body(a, b))
        }
        DeclKind::Method | DeclKind::Operator | DeclKind::Declare => {
            a.key.name == b.key.name
                || (a.key.same_shape(&b.key) && (same_body(a, b) || same_bodyless(a, b)))
        }
        DeclKind::Namespace
        | DeclKind::Class
        | DeclKind::Struct
        | DeclKind::Interface
        | DeclKind::Enum
        | DeclKind::Module
        | DeclKind::Delegate => {
            a.key.name == b.key.name
                || (a.key.arity == b.key.arity
                    && shares_most_children(old, old_id, new, new_id))
        }
        DeclKind::Field => {
            old.effective_type(old_id) == new.effective_type(new_id)
                && old.effective_initializer(old_id) == new.effective_initializer(new_id)
                && old.effective_modifiers(old_id) == new.effective_modifiers(new_id)
        }
        DeclKind::EnumMember => a.initializer.is_some() && a.initializer == b.initializer,
        DeclKind::Property | DeclKind::Event => {
            a.type_ref == b.type_ref && accessor_bodies(old, old_id) == accessor_bodies(new, new_id)
        }
        DeclKind::CompilationUnit => true,
        DeclKind::FieldGroup
        | DeclKind::Accessor
        | DeclKind::Parameter
        | DeclKind::TypeParameter => false,
    }
}

fn same_body(a: &DeclNode, b: &DeclNode) -> bool {
    match (&a.body, &b.body) {
        (Some(x), Some(y)) => x.fingerprint == y.fingerprint,
        _ => false,
    }
}

/// Neither side has a body (abstract, interface or interop members), so
/// everything the declaration header carries must agree instead.
fn same_bodyless(a: &DeclNode, b: &DeclNode) -> bool {
    a.body.is_none()
        && b.body.is_none()
        && a.modifiers == b.modifiers
        && a.accessibility == b.accessibility
        && a.type_ref == b.type_ref
        && a.interop == b.interop
}

fn accessor_bodies(tree: &DeclTree, id: DeclId) -> Vec<Option<u64>> {
    tree.children(id)
        .iter()
        .filter(|&&c| tree.kind(c) == DeclKind::Accessor)
        .map(|&c| tree.node(c).body.as_ref().map(|b| b.fingerprint))
        .collect()
}

/// At least half of the larger child key set is shared. Two childless
/// declarations share everything.
fn shares_most_children(old: &DeclTree, old_id: DeclId, new: &DeclTree, new_id: DeclId) -> bool {
    let keys = |tree: &DeclTree, id: DeclId| -> Vec<(DeclKind, DeclKey)> {
        tree.members(id)
            .chain(
                tree.children(id)
                    .iter()
                    .copied()
                    .filter(|&c| tree.kind(c) == DeclKind::TypeParameter),
            )
            .map(|c| (tree.kind(c), tree.node(c).key.clone()))
            .collect()
    };
    let old_keys = keys(old, old_id);
    let new_keys = keys(new, new_id);
    let larger = old_keys.len().max(new_keys.len());
    let new_set: FxHashSet<&(DeclKind, DeclKey)> = new_keys.iter().collect();
    let shared = old_keys.iter().filter(|k| new_set.contains(k)).count();
    shared * 2 >= larger
}
