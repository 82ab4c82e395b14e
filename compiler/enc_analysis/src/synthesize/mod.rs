//! Semantic edit synthesis.
//!
//! Allowed edits become symbol-level edits in two passes. The first pass
//! emits one edit per directly edited runtime symbol and records what each
//! edit implies for its type's constructors. The second pass, once every
//! direct edit of the session is known, derives the constructor edits:
//!
//! - a changed field or auto-property initializer updates every constructor
//!   of the type that runs initializers (those not chaining to a sibling),
//!   or the implicit constructor when the type has none;
//! - the first static initializer of a type without a static constructor
//!   inserts one;
//! - deleting the last user-written instance constructor brings back the
//!   implicit one.
//!
//! Derived edits on the implicit constructor of a partial type belong to
//! the earliest document whose edits caused them.

use std::collections::{BTreeMap, BTreeSet};

use enc_diagnostic::{RudeEditDiagnostic, RudeEditKind};
use enc_ir::{
    ConstructorChain, DeclId, DeclKind, DeclTree, DocumentId, Modifiers, StringInterner,
    SymbolKey,
};
use enc_match::{ContentChange, EditKind};

use crate::rules::is_static;
use crate::{
    Aggregate, AggregatedEdit, LogicalType, NodeRef, SemanticEdit, SemanticEditKind, SyntaxMap,
};

/// Result of synthesis: edits and the diagnostics synthesis itself raised,
/// each with the document it belongs to.
#[derive(Debug, Default)]
pub struct Synthesis {
    pub edits: Vec<(DocumentId, SemanticEdit)>,
    pub diagnostics: Vec<(DocumentId, RudeEditDiagnostic)>,
}

/// Turns allowed edits into semantic edits.
pub struct Synthesizer<'a> {
    aggregate: &'a Aggregate<'a>,
    interner: &'a StringInterner,
    edits: Vec<(DocumentId, SemanticEdit)>,
    diagnostics: Vec<(DocumentId, RudeEditDiagnostic)>,
    /// Initializer changes per type and staticness, with the documents that
    /// made them.
    initializers: BTreeMap<(SymbolKey, bool), BTreeSet<DocumentId>>,
    /// Constructor deletions per type and staticness.
    constructor_deletes: BTreeMap<(SymbolKey, bool), BTreeSet<DocumentId>>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(aggregate: &'a Aggregate<'a>, interner: &'a StringInterner) -> Self {
        Synthesizer {
            aggregate,
            interner,
            edits: Vec::new(),
            diagnostics: Vec::new(),
            initializers: BTreeMap::new(),
            constructor_deletes: BTreeMap::new(),
        }
    }

    /// Record the direct semantic edits of one allowed edit.
    pub fn add(&mut self, edit: &AggregatedEdit) {
        match (edit.kind, edit.old, edit.new) {
            (EditKind::Insert, _, Some(new)) => self.inserted(edit.owner, new),
            (EditKind::Delete, Some(old), _) => self.deleted(edit.owner, old),
            (EditKind::Update | EditKind::Move | EditKind::Reorder, Some(old), Some(new)) => {
                self.paired(edit, old, new);
            }
            _ => {}
        }
    }

    /// Replace a reloadable type as a whole.
    pub fn replace(&mut self, ty: SymbolKey, owner: DocumentId) {
        tracing::debug!(%owner, "replacing reloadable type");
        self.edits
            .push((owner, SemanticEdit::new(SemanticEditKind::Replace, ty)));
    }

    /// Derive constructor edits and produce the final, deduplicated list.
    pub fn finish(mut self) -> Synthesis {
        self.derive_initializer_updates();
        self.reintroduce_implicit_constructors();

        let mut edits = self.edits;
        edits.sort_by(|(da, a), (db, b)| (da, &a.symbol, a.kind).cmp(&(db, &b.symbol, b.kind)));
        edits.dedup_by(|next, kept| {
            let same = kept.0 == next.0 && kept.1.symbol == next.1.symbol;
            if same && kept.1.kind == next.1.kind {
                if kept.1.syntax_map.is_none() {
                    kept.1.syntax_map = next.1.syntax_map.take();
                }
                return true;
            }
            // An inserted symbol is emitted whole; updates to it are moot.
            same && kept.1.kind == SemanticEditKind::Insert && next.1.kind == SemanticEditKind::Update
        });
        Synthesis {
            edits,
            diagnostics: self.diagnostics,
        }
    }

    // ── Direct edits ────────────────────────────────────────────────

    fn inserted(&mut self, owner: DocumentId, new: NodeRef) {
        let tree = self.aggregate.new_tree(new.document);
        let node = tree.node(new.id);
        let symbol = SymbolKey::of(tree, new.id);

        match node.kind {
            DeclKind::Class
            | DeclKind::Struct
            | DeclKind::Interface
            | DeclKind::Enum
            | DeclKind::Delegate
            | DeclKind::Module => {
                if self.aggregate.is_inserted(new) {
                    self.emit(owner, SemanticEdit::new(SemanticEditKind::Insert, symbol));
                }
            }
            DeclKind::Field => {
                self.emit(owner, SemanticEdit::new(SemanticEditKind::Insert, symbol));
                if tree.effective_initializer(new.id).is_some() {
                    self.initializer_changed(owner, tree, new.id);
                }
            }
            DeclKind::Property | DeclKind::Event => {
                self.emit(owner, SemanticEdit::new(SemanticEditKind::Insert, symbol));
                if node.is_auto(tree) && node.initializer.is_some() {
                    self.initializer_changed(owner, tree, new.id);
                }
            }
            DeclKind::Method | DeclKind::Operator | DeclKind::Accessor => {
                self.emit(owner, SemanticEdit::new(SemanticEditKind::Insert, symbol));
            }
            DeclKind::Constructor => {
                self.emit(owner, SemanticEdit::new(SemanticEditKind::Insert, symbol));
                self.check_captured_initializers(owner, tree, new.id);
            }
            DeclKind::Parameter => {
                if let Some(member) = tree.parent(new.id) {
                    self.signature_changed(owner, NodeRef::new(new.document, member));
                }
            }
            DeclKind::CompilationUnit
            | DeclKind::Namespace
            | DeclKind::FieldGroup
            | DeclKind::EnumMember
            | DeclKind::Declare
            | DeclKind::TypeParameter => {}
        }
    }

    fn deleted(&mut self, owner: DocumentId, old: NodeRef) {
        let tree = self.aggregate.old_tree(old.document);
        let node = tree.node(old.id);
        let symbol = SymbolKey::of(tree, old.id);

        match node.kind {
            DeclKind::Method | DeclKind::Operator | DeclKind::Accessor => {
                self.emit(owner, SemanticEdit::new(SemanticEditKind::Delete, symbol));
            }
            DeclKind::Property | DeclKind::Event if !node.is_auto(tree) => {
                self.emit(owner, SemanticEdit::new(SemanticEditKind::Delete, symbol));
            }
            DeclKind::Constructor => {
                self.emit(owner, SemanticEdit::new(SemanticEditKind::Delete, symbol));
                if let Some(ty) = Aggregate::type_key(tree, old.id) {
                    let is_static = node.modifiers.contains(Modifiers::STATIC);
                    self.constructor_deletes
                        .entry((ty, is_static))
                        .or_default()
                        .insert(owner);
                }
            }
            DeclKind::Parameter => {
                let member = tree
                    .parent(old.id)
                    .and_then(|m| self.aggregate.new_of(NodeRef::new(old.document, m)));
                if let Some(member) = member {
                    self.signature_changed(owner, member);
                }
            }
            _ => {}
        }
    }

    fn paired(&mut self, edit: &AggregatedEdit, old: NodeRef, new: NodeRef) {
        let old_tree = self.aggregate.old_tree(old.document);
        let new_tree = self.aggregate.new_tree(new.document);
        let old_node = old_tree.node(old.id);
        let node = new_tree.node(new.id);
        let changes = edit.changes;
        let symbol = SymbolKey::of(new_tree, new.id);
        let reordered = edit.kind == EditKind::Reorder;

        match node.kind {
            DeclKind::Method | DeclKind::Operator | DeclKind::Constructor | DeclKind::Accessor => {
                if changes.intersects(ContentChange::IDENTITY) {
                    self.replace_symbol(edit.owner, (old_tree, old.id), (new_tree, new.id));
                } else if edit.kind == EditKind::Update || !changes.is_empty() {
                    let syntax_map = match (&old_node.body, &node.body) {
                        (Some(before), Some(after)) if changes.contains(ContentChange::BODY) => {
                            SyntaxMap::build(before, after)
                        }
                        _ => None,
                    };
                    let partial = self.partial_type(new_tree, new.id);
                    self.emit(
                        edit.owner,
                        SemanticEdit::new(SemanticEditKind::Update, symbol)
                            .with_syntax_map(syntax_map)
                            .with_partial_type(partial),
                    );
                }
            }
            DeclKind::Property | DeclKind::Event => {
                if changes.intersects(ContentChange::IDENTITY) {
                    self.replace_symbol(edit.owner, (old_tree, old.id), (new_tree, new.id));
                } else if changes.contains(ContentChange::ATTRIBUTES) || edit.relocated {
                    self.update(edit.owner, new_tree, new.id);
                }
                if node.is_auto(new_tree)
                    && (changes.contains(ContentChange::INITIALIZER)
                        || (reordered && node.initializer.is_some()))
                {
                    self.initializer_changed(edit.owner, new_tree, new.id);
                }
            }
            DeclKind::Field => {
                if changes.contains(ContentChange::ATTRIBUTES) || edit.relocated {
                    self.update(edit.owner, new_tree, new.id);
                }
                let initializer = new_tree.effective_initializer(new.id);
                if old_tree.effective_initializer(old.id) != initializer
                    || (reordered && initializer.is_some())
                {
                    self.initializer_changed(edit.owner, new_tree, new.id);
                }
            }
            DeclKind::FieldGroup => {
                if changes.contains(ContentChange::ATTRIBUTES) {
                    for &variable in new_tree.children(new.id) {
                        self.update(edit.owner, new_tree, variable);
                    }
                }
                if changes.contains(ContentChange::INITIALIZER) {
                    self.initializer_changed(edit.owner, new_tree, new.id);
                }
            }
            DeclKind::Parameter => {
                if !changes.is_empty() || reordered {
                    if let Some(member) = new_tree.parent(new.id) {
                        self.signature_changed(edit.owner, NodeRef::new(new.document, member));
                    }
                }
            }
            DeclKind::Class
            | DeclKind::Struct
            | DeclKind::Interface
            | DeclKind::Enum
            | DeclKind::Delegate
            | DeclKind::Module => {
                if changes.contains(ContentChange::ATTRIBUTES) {
                    self.update(edit.owner, new_tree, new.id);
                }
            }
            DeclKind::CompilationUnit
            | DeclKind::Namespace
            | DeclKind::EnumMember
            | DeclKind::Declare
            | DeclKind::TypeParameter => {}
        }
    }

    /// A parameter of `member` changed. When the member's key changed its
    /// own edit replaces the symbol; otherwise the member is updated.
    fn signature_changed(&mut self, owner: DocumentId, member: NodeRef) {
        let new_tree = self.aggregate.new_tree(member.document);
        let Some(old) = self.aggregate.old_of(member) else {
            return;
        };
        let old_key = SymbolKey::of(self.aggregate.old_tree(old.document), old.id);
        if old_key == SymbolKey::of(new_tree, member.id) {
            self.update(owner, new_tree, member.id);
        }
    }

    /// The symbol's key changed: the old symbol goes away and a new one
    /// takes its place.
    fn replace_symbol(
        &mut self,
        owner: DocumentId,
        (old_tree, old): (&DeclTree, DeclId),
        (new_tree, new): (&DeclTree, DeclId),
    ) {
        self.emit(
            owner,
            SemanticEdit::new(SemanticEditKind::Delete, SymbolKey::of(old_tree, old)),
        );
        self.emit(
            owner,
            SemanticEdit::new(SemanticEditKind::Insert, SymbolKey::of(new_tree, new)),
        );
        if new_tree.kind(new) == DeclKind::Constructor {
            self.check_captured_initializers(owner, new_tree, new);
        }
    }

    fn update(&mut self, owner: DocumentId, tree: &DeclTree, id: DeclId) {
        let partial = self.partial_type(tree, id);
        self.emit(
            owner,
            SemanticEdit::new(SemanticEditKind::Update, SymbolKey::of(tree, id))
                .with_partial_type(partial),
        );
    }

    fn emit(&mut self, owner: DocumentId, edit: SemanticEdit) {
        tracing::trace!(%owner, kind = %edit.kind, "semantic edit");
        self.edits.push((owner, edit));
    }

    // ── Constructor derivation ──────────────────────────────────────

    fn initializer_changed(&mut self, owner: DocumentId, tree: &DeclTree, id: DeclId) {
        let node = tree.node(id);
        if node.unresolved {
            tracing::warn!(
                name = %tree.display_name(id, self.interner),
                "unresolved declaration; skipping constructor updates"
            );
            return;
        }
        if tree.effective_modifiers(id).contains(Modifiers::CONST) {
            return;
        }
        if let Some(ty) = Aggregate::type_key(tree, id) {
            self.initializers
                .entry((ty, is_static(tree, id)))
                .or_default()
                .insert(owner);
        }
    }

    fn derive_initializer_updates(&mut self) {
        let aggregate = self.aggregate;
        for ((ty, is_static), documents) in std::mem::take(&mut self.initializers) {
            let Some(logical) = aggregate.logical_type(&ty) else {
                continue;
            };
            if logical
                .new_parts
                .iter()
                .any(|&part| aggregate.new_node(part).unresolved)
            {
                tracing::warn!("unresolved type; skipping constructor updates");
                continue;
            }
            let partial = logical.is_partial().then(|| ty.clone());

            let constructors = self.new_constructors(logical, is_static);
            if !constructors.is_empty() {
                for ctor in constructors {
                    let tree = aggregate.new_tree(ctor.document);
                    if tree.node(ctor.id).chain == ConstructorChain::This {
                        continue;
                    }
                    self.emit(
                        ctor.document,
                        SemanticEdit::new(SemanticEditKind::Update, SymbolKey::of(tree, ctor.id))
                            .with_partial_type(partial.clone()),
                    );
                }
                continue;
            }

            let Some(&owner) = documents.first() else {
                continue;
            };
            let symbol = ty.constructor(self.interner, is_static);
            if !is_static || had_static_initialization(aggregate, logical) {
                self.emit(
                    owner,
                    SemanticEdit::new(SemanticEditKind::Update, symbol).with_partial_type(partial),
                );
            } else {
                self.emit(owner, SemanticEdit::new(SemanticEditKind::Insert, symbol));
            }
        }
    }

    /// A type left without user-written constructors of one staticness
    /// falls back to the implicit one.
    fn reintroduce_implicit_constructors(&mut self) {
        let aggregate = self.aggregate;
        for ((ty, is_static), documents) in std::mem::take(&mut self.constructor_deletes) {
            let Some(logical) = aggregate.logical_type(&ty) else {
                continue;
            };
            if !logical.exists_after() || !self.new_constructors(logical, is_static).is_empty() {
                continue;
            }
            let implicit = ty.constructor(self.interner, is_static);
            let deleted = self.edits.iter_mut().find(|(_, e)| {
                e.kind == SemanticEditKind::Delete && e.symbol == implicit
            });

            if is_static {
                let needed = logical.new_parts.iter().any(|&part| {
                    let tree = aggregate.new_tree(part.document);
                    tree.initialized_members(part.id, true).next().is_some()
                });
                if let (true, Some((_, edit))) = (needed, deleted) {
                    edit.kind = SemanticEditKind::Update;
                }
                continue;
            }

            match deleted {
                Some((_, edit)) => edit.kind = SemanticEditKind::Update,
                None => {
                    if let Some(&owner) = documents.first() {
                        tracing::debug!(%owner, "implicit constructor reintroduced");
                        if self.has_captured_initializers(logical, false) {
                            let span = logical
                                .new_parts
                                .iter()
                                .find(|part| part.document == owner)
                                .map(|part| aggregate.new_tree(part.document).node(part.id).span)
                                .unwrap_or_default();
                            self.diagnostics.push((
                                owner,
                                RudeEditDiagnostic::declaration(
                                    RudeEditKind::InsertConstructorWithCapturedInitializers,
                                    span,
                                    DeclKind::Constructor.label(),
                                    implicit.display(self.interner),
                                ),
                            ));
                        }
                        self.emit(owner, SemanticEdit::new(SemanticEditKind::Insert, implicit));
                    }
                }
            }
        }
    }

    /// User-written constructors across all new parts of a type.
    fn new_constructors(&self, logical: &LogicalType, is_static: bool) -> Vec<NodeRef> {
        logical
            .new_parts
            .iter()
            .flat_map(|&part| {
                self.aggregate
                    .new_tree(part.document)
                    .constructors(part.id, is_static)
                    .map(move |c| NodeRef::new(part.document, c))
            })
            .collect()
    }

    /// A constructor cannot be inserted into a type whose initializers
    /// already run lambdas in the existing constructors' closure.
    fn check_captured_initializers(&mut self, owner: DocumentId, tree: &DeclTree, ctor: DeclId) {
        let is_static = tree.node(ctor).modifiers.contains(Modifiers::STATIC);
        let Some(logical) =
            Aggregate::type_key(tree, ctor).and_then(|ty| self.aggregate.logical_type(&ty))
        else {
            return;
        };
        if self.has_captured_initializers(logical, is_static) {
            let node = tree.node(ctor);
            self.diagnostics.push((
                owner,
                RudeEditDiagnostic::declaration(
                    RudeEditKind::InsertConstructorWithCapturedInitializers,
                    node.span,
                    node.label(tree),
                    tree.display_name(ctor, self.interner),
                ),
            ));
        }
    }

    /// Initializers of the old type that run lambdas.
    fn has_captured_initializers(&self, logical: &LogicalType, is_static: bool) -> bool {
        logical.old_parts.iter().any(|&part| {
            let old = self.aggregate.old_tree(part.document);
            old.initialized_members(part.id, is_static).any(|m| {
                old.effective_initializer(m)
                    .is_some_and(|init| init.has_lambdas)
            })
        })
    }

    fn partial_type(&self, tree: &DeclTree, id: DeclId) -> Option<SymbolKey> {
        let ty = Aggregate::type_key(tree, id)?;
        self.aggregate
            .logical_type(&ty)
            .is_some_and(LogicalType::is_partial)
            .then_some(ty)
    }
}

/// The type had a static constructor, written or implied by initializers.
fn had_static_initialization(aggregate: &Aggregate<'_>, logical: &LogicalType) -> bool {
    logical.old_parts.iter().any(|&part| {
        let tree = aggregate.old_tree(part.document);
        tree.constructors(part.id, true).next().is_some()
            || tree.initialized_members(part.id, true).next().is_some()
    })
}
