//! Partial declaration aggregation.
//!
//! A type may be declared in pieces across several documents. Analysis
//! works on one merged view of all documents of a session:
//!
//! - every type declaration is grouped with the other parts sharing its
//!   [`SymbolKey`] into a [`LogicalType`], in both versions;
//! - a declaration deleted from one document and inserted with the same key
//!   into another is a relocation, re-matched with
//!   [`match_subtrees`] and reported as an `Update` owned by the document
//!   it moved to;
//! - a type part that appears or disappears while other parts of the same
//!   type exist is not a type insert or delete.
//!
//! Correspondence queries ([`Aggregate::new_of`], [`Aggregate::old_of`])
//! answer across documents, so later stages never look up one document
//! from another directly.

use std::collections::BTreeMap;

use enc_ir::{
    CancellationToken, Cancelled, DeclId, DeclKind, DeclNode, DeclTree, DocumentId, Span,
    SymbolKey,
};
use enc_match::{match_subtrees, ContentChange, EditKind, EditScript};
use smallvec::SmallVec;

use crate::{DocumentDiff, NodeRef};

/// All parts of one type, across documents.
#[derive(Clone, Debug, Default)]
pub struct LogicalType {
    /// Parts in the old versions, in document order.
    pub old_parts: SmallVec<[NodeRef; 2]>,
    /// Parts in the new versions, in document order.
    pub new_parts: SmallVec<[NodeRef; 2]>,
}

impl LogicalType {
    /// The type is declared in more than one piece, before or after.
    pub fn is_partial(&self) -> bool {
        self.old_parts.len() > 1 || self.new_parts.len() > 1
    }

    pub fn existed_before(&self) -> bool {
        !self.old_parts.is_empty()
    }

    pub fn exists_after(&self) -> bool {
        !self.new_parts.is_empty()
    }

    /// Earliest document declaring a part after the edit, else before it.
    pub fn first_document(&self) -> Option<DocumentId> {
        self.new_parts
            .first()
            .or_else(|| self.old_parts.first())
            .map(|part| part.document)
    }
}

/// One edit of the merged session script.
#[derive(Clone, Debug)]
pub struct AggregatedEdit {
    pub kind: EditKind,
    pub old: Option<NodeRef>,
    pub new: Option<NodeRef>,
    pub changes: ContentChange,
    /// Document the edit is reported in.
    pub owner: DocumentId,
    /// The root of a declaration relocated from another document.
    pub relocated: bool,
}

/// A declaration deleted from one document and inserted into another.
#[derive(Debug)]
struct Relocation {
    old: NodeRef,
    new: NodeRef,
    /// Correspondence inside the relocated subtrees.
    script: EditScript,
}

/// Merged view of every document of a session.
pub struct Aggregate<'d> {
    documents: &'d [DocumentDiff<'d>],
    types: BTreeMap<SymbolKey, LogicalType>,
    relocations: Vec<Relocation>,
    edits: Vec<AggregatedEdit>,
}

impl<'d> Aggregate<'d> {
    /// Merge the matched documents of a session.
    #[tracing::instrument(level = "debug", skip_all, fields(documents = documents.len()))]
    pub fn build(
        documents: &'d [DocumentDiff<'d>],
        cancel: &CancellationToken,
    ) -> Result<Self, Cancelled> {
        let mut aggregate = Aggregate {
            documents,
            types: collect_types(documents),
            relocations: Vec::new(),
            edits: Vec::new(),
        };
        aggregate.pair_relocations(cancel)?;
        aggregate.merge_edits();
        tracing::debug!(
            types = aggregate.types.len(),
            relocations = aggregate.relocations.len(),
            edits = aggregate.edits.len(),
            "aggregated documents"
        );
        Ok(aggregate)
    }

    #[inline]
    pub fn documents(&self) -> &'d [DocumentDiff<'d>] {
        self.documents
    }

    #[inline]
    pub fn edits(&self) -> &[AggregatedEdit] {
        &self.edits
    }

    #[inline]
    pub fn old_tree(&self, document: DocumentId) -> &'d DeclTree {
        self.documents[document.index()].old
    }

    #[inline]
    pub fn new_tree(&self, document: DocumentId) -> &'d DeclTree {
        self.documents[document.index()].new
    }

    #[inline]
    pub fn old_node(&self, node: NodeRef) -> &'d DeclNode {
        self.old_tree(node.document).node(node.id)
    }

    #[inline]
    pub fn new_node(&self, node: NodeRef) -> &'d DeclNode {
        self.new_tree(node.document).node(node.id)
    }

    pub fn logical_type(&self, key: &SymbolKey) -> Option<&LogicalType> {
        self.types.get(key)
    }

    pub fn types(&self) -> impl Iterator<Item = (&SymbolKey, &LogicalType)> {
        self.types.iter()
    }

    /// New counterpart of an old declaration, following relocations.
    pub fn new_of(&self, old: NodeRef) -> Option<NodeRef> {
        let script = &self.documents[old.document.index()].script;
        if let Some(id) = script.new_of(old.id) {
            return Some(NodeRef::new(old.document, id));
        }
        let tree = self.old_tree(old.document);
        self.relocations
            .iter()
            .filter(|r| r.old.document == old.document && tree.is_within(old.id, r.old.id))
            .find_map(|r| {
                if old.id == r.old.id {
                    Some(r.new)
                } else {
                    r.script
                        .new_of(old.id)
                        .map(|id| NodeRef::new(r.new.document, id))
                }
            })
    }

    /// Old counterpart of a new declaration, following relocations.
    pub fn old_of(&self, new: NodeRef) -> Option<NodeRef> {
        let script = &self.documents[new.document.index()].script;
        if let Some(id) = script.old_of(new.id) {
            return Some(NodeRef::new(new.document, id));
        }
        let tree = self.new_tree(new.document);
        self.relocations
            .iter()
            .filter(|r| r.new.document == new.document && tree.is_within(new.id, r.new.id))
            .find_map(|r| {
                if new.id == r.new.id {
                    Some(r.old)
                } else {
                    r.script
                        .old_of(new.id)
                        .map(|id| NodeRef::new(r.old.document, id))
                }
            })
    }

    /// The new declaration did not exist before anywhere in the session.
    ///
    /// A new part of a type that already had parts is not new.
    pub fn is_inserted(&self, new: NodeRef) -> bool {
        if self.old_of(new).is_some() {
            return false;
        }
        let tree = self.new_tree(new.document);
        !tree.kind(new.id).is_type()
            || !self
                .types
                .get(&SymbolKey::of(tree, new.id))
                .is_some_and(LogicalType::existed_before)
    }

    /// The old declaration no longer exists anywhere in the session.
    pub fn is_deleted(&self, old: NodeRef) -> bool {
        if self.new_of(old).is_some() {
            return false;
        }
        let tree = self.old_tree(old.document);
        !tree.kind(old.id).is_type()
            || !self
                .types
                .get(&SymbolKey::of(tree, old.id))
                .is_some_and(LogicalType::exists_after)
    }

    /// Document and new-coordinate span of the nearest surviving ancestor of
    /// a deleted declaration. Diagnostics about deletions anchor there.
    pub fn surviving_span(&self, old: NodeRef) -> (DocumentId, Span) {
        let tree = self.old_tree(old.document);
        tree.ancestors(old.id)
            .find_map(|a| self.new_of(NodeRef::new(old.document, a)))
            .map_or((old.document, Span::DUMMY), |n| {
                (n.document, self.new_node(n).span)
            })
    }

    /// Key of the reloadable type an edit falls in, when whole-type
    /// replacement applies to it: the type existed before and still exists.
    pub fn reloadable_type(&self, edit: &AggregatedEdit) -> Option<SymbolKey> {
        let (tree, id) = match (edit.new, edit.old) {
            (Some(n), _) => (self.new_tree(n.document), n.id),
            (None, Some(o)) => (self.old_tree(o.document), o.id),
            (None, None) => return None,
        };
        let ty = std::iter::once(id).chain(tree.ancestors(id)).find(|&a| {
            tree.node(a)
                .type_facts
                .as_ref()
                .is_some_and(|facts| facts.reloadable)
        })?;
        let key = SymbolKey::of(tree, ty);
        let logical = self.types.get(&key)?;
        (logical.existed_before() && logical.exists_after()).then_some(key)
    }

    /// Key of the type enclosing (or being) a declaration.
    pub fn type_key(tree: &DeclTree, id: DeclId) -> Option<SymbolKey> {
        let ty = if tree.kind(id).is_type() {
            Some(id)
        } else {
            tree.enclosing_type(id)
        };
        ty.map(|t| SymbolKey::of(tree, t))
    }

    /// Pair roots of deleted subtrees with roots of inserted subtrees in
    /// other documents that carry the same kind and symbol key.
    fn pair_relocations(&mut self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        let documents = self.documents;
        let mut candidates: Vec<(NodeRef, DeclKind, SymbolKey)> = Vec::new();
        for (index, doc) in documents.iter().enumerate() {
            let document = document_id(index);
            for edit in doc.script.edits() {
                let Some(new) = edit.new.filter(|_| edit.kind == EditKind::Insert) else {
                    continue;
                };
                if self.is_relocation_root(doc.new, new, |id| {
                    self.part_is_new(NodeRef::new(document, id))
                }) {
                    candidates.push((
                        NodeRef::new(document, new),
                        doc.new.kind(new),
                        SymbolKey::of(doc.new, new),
                    ));
                }
            }
        }
        if candidates.is_empty() {
            return Ok(());
        }

        for (index, doc) in documents.iter().enumerate() {
            let document = document_id(index);
            // Parents precede their children in arena order.
            let mut deleted: Vec<DeclId> = doc
                .script
                .edits()
                .iter()
                .filter(|edit| edit.kind == EditKind::Delete)
                .filter_map(|edit| edit.old)
                .filter(|&old| {
                    self.is_relocation_root(doc.old, old, |id| {
                        self.part_is_gone(NodeRef::new(document, id))
                    })
                })
                .collect();
            deleted.sort_unstable();

            for old in deleted {
                let old = NodeRef::new(document, old);
                if self.is_relocated_old(old) {
                    continue;
                }
                let kind = doc.old.kind(old.id);
                let key = SymbolKey::of(doc.old, old.id);
                let Some(found) = candidates.iter().position(|(n, k, s)| {
                    n.document != document && *k == kind && *s == key && !self.is_relocated_new(*n)
                }) else {
                    continue;
                };
                let (new, _, _) = candidates.remove(found);
                let script = match_subtrees(
                    (doc.old, old.id),
                    (self.new_tree(new.document), new.id),
                    cancel,
                )?;
                tracing::debug!(?old, ?new, %kind, "declaration relocated across documents");
                self.relocations.push(Relocation { old, new, script });
            }
        }
        Ok(())
    }

    fn is_relocated_old(&self, old: NodeRef) -> bool {
        let tree = self.old_tree(old.document);
        self.relocations
            .iter()
            .any(|r| r.old.document == old.document && tree.is_within(old.id, r.old.id))
    }

    fn is_relocated_new(&self, new: NodeRef) -> bool {
        let tree = self.new_tree(new.document);
        self.relocations
            .iter()
            .any(|r| r.new.document == new.document && tree.is_within(new.id, r.new.id))
    }

    /// A relocatable node whose nearest owning ancestor survived; `gone`
    /// tells whether an ancestor is itself part of the insert or delete.
    fn is_relocation_root(
        &self,
        tree: &DeclTree,
        id: DeclId,
        gone: impl Fn(DeclId) -> bool,
    ) -> bool {
        let kind = tree.kind(id);
        let relocatable = kind.is_type() || (kind.is_member() && !kind.is_grouping());
        relocatable
            && tree
                .ancestors(id)
                .find(|&a| !tree.kind(a).is_grouping())
                .is_some_and(|a| !gone(a))
    }

    /// Same-document test used before relocations are known.
    fn part_is_new(&self, new: NodeRef) -> bool {
        let doc = &self.documents[new.document.index()];
        let kind = doc.new.kind(new.id);
        if kind == DeclKind::CompilationUnit || doc.script.old_of(new.id).is_some() {
            return false;
        }
        !kind.is_type()
            || !self
                .types
                .get(&SymbolKey::of(doc.new, new.id))
                .is_some_and(LogicalType::existed_before)
    }

    fn part_is_gone(&self, old: NodeRef) -> bool {
        let doc = &self.documents[old.document.index()];
        let kind = doc.old.kind(old.id);
        if kind == DeclKind::CompilationUnit || doc.script.new_of(old.id).is_some() {
            return false;
        }
        !kind.is_type()
            || !self
                .types
                .get(&SymbolKey::of(doc.old, old.id))
                .is_some_and(LogicalType::exists_after)
    }

    /// Per-document edits minus relocated subtrees, plus the relocations'
    /// own edits.
    fn merge_edits(&mut self) {
        let mut edits = Vec::new();
        for (index, doc) in self.documents.iter().enumerate() {
            let document = document_id(index);
            let in_relocated_old = |id: DeclId| {
                self.relocations
                    .iter()
                    .any(|r| r.old.document == document && doc.old.is_within(id, r.old.id))
            };
            let in_relocated_new = |id: DeclId| {
                self.relocations
                    .iter()
                    .any(|r| r.new.document == document && doc.new.is_within(id, r.new.id))
            };
            for edit in doc.script.edits() {
                if edit.old.is_some_and(|id| in_relocated_old(id))
                    || edit.new.is_some_and(|id| in_relocated_new(id))
                {
                    continue;
                }
                edits.push(AggregatedEdit {
                    kind: edit.kind,
                    old: edit.old.map(|id| NodeRef::new(document, id)),
                    new: edit.new.map(|id| NodeRef::new(document, id)),
                    changes: edit.changes,
                    owner: document,
                    relocated: false,
                });
            }
        }

        for r in &self.relocations {
            edits.push(AggregatedEdit {
                kind: EditKind::Update,
                old: Some(r.old),
                new: Some(r.new),
                changes: ContentChange::between(self.old_node(r.old), self.new_node(r.new)),
                owner: r.new.document,
                relocated: true,
            });
            edits.extend(r.script.edits().iter().map(|edit| AggregatedEdit {
                kind: edit.kind,
                old: edit.old.map(|id| NodeRef::new(r.old.document, id)),
                new: edit.new.map(|id| NodeRef::new(r.new.document, id)),
                changes: edit.changes,
                owner: r.new.document,
                relocated: false,
            }));
        }
        self.edits = edits;
    }
}

/// Document id of the document at `index` in the session.
pub(crate) fn document_id(index: usize) -> DocumentId {
    DocumentId(u32::try_from(index).unwrap_or(u32::MAX))
}

fn collect_types(documents: &[DocumentDiff<'_>]) -> BTreeMap<SymbolKey, LogicalType> {
    let mut types: BTreeMap<SymbolKey, LogicalType> = BTreeMap::new();
    for (index, doc) in documents.iter().enumerate() {
        let document = document_id(index);
        for id in doc.old.ids().filter(|&id| doc.old.kind(id).is_type()) {
            types
                .entry(SymbolKey::of(doc.old, id))
                .or_default()
                .old_parts
                .push(NodeRef::new(document, id));
        }
        for id in doc.new.ids().filter(|&id| doc.new.kind(id).is_type()) {
            types
                .entry(SymbolKey::of(doc.new, id))
                .or_default()
                .new_parts
                .push(NodeRef::new(document, id));
        }
    }
    types
}
