//! Rude edit rules.
//!
//! Every aggregated edit is classified by one exhaustive dispatch on the
//! edit kind and the declaration kind, refined by the declaration's
//! context: the enclosing type's genericity, value-type-ness and layout, the
//! member's vtable participation, and the facts that changed. Rules gated
//! by a runtime capability report the missing capabilities, so the
//! diagnostic can tell "not on this runtime" from "never". A runtime
//! without `Baseline` applies no edit at all.
//!
//! Classification is a pure function of the edit, the merged session view
//! and the capability set passed in.

use enc_capabilities::Capabilities;
use enc_diagnostic::{RudeEditDiagnostic, RudeEditKind};
use enc_ir::{DeclId, DeclKind, DeclTree, Modifiers, Name, Span, StringInterner};
use enc_match::{ContentChange, EditKind};
use smallvec::SmallVec;

use crate::syntax_map::SyntaxMap;
use crate::{Aggregate, AggregatedEdit, NodeRef};

type Diagnostics = SmallVec<[RudeEditDiagnostic; 1]>;

/// Outcome of classifying one edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The edit lies inside a declaration that is itself inserted or
    /// deleted; that edit speaks for it.
    Subsumed,
    /// The edit can be applied to the running program.
    Allowed,
    /// The edit needs a restart.
    Rude(Diagnostics),
}

/// Capabilities that make a regular body a state machine.
const STATE_MACHINE: Capabilities =
    Capabilities::NEW_TYPE_DEFINITION.union(Capabilities::ADD_INSTANCE_FIELD_TO_EXISTING_TYPE);

/// Classifies aggregated edits against a fixed capability set.
pub struct RuleEngine<'a> {
    aggregate: &'a Aggregate<'a>,
    interner: &'a StringInterner,
    capabilities: Capabilities,
}

impl<'a> RuleEngine<'a> {
    pub fn new(
        aggregate: &'a Aggregate<'a>,
        interner: &'a StringInterner,
        capabilities: Capabilities,
    ) -> Self {
        RuleEngine {
            aggregate,
            interner,
            capabilities,
        }
    }

    #[tracing::instrument(level = "trace", skip_all, fields(kind = ?edit.kind, owner = %edit.owner))]
    pub fn classify(&self, edit: &AggregatedEdit) -> Verdict {
        let mut out = Diagnostics::new();
        match (edit.kind, edit.old, edit.new) {
            (EditKind::Insert, _, Some(new)) => {
                if self.is_subsumed_insert(new) {
                    return Verdict::Subsumed;
                }
                self.insert(new, &mut out);
            }
            (EditKind::Delete, Some(old), _) => {
                if self.is_subsumed_delete(old) {
                    return Verdict::Subsumed;
                }
                self.delete(old, &mut out);
            }
            (EditKind::Update | EditKind::Move | EditKind::Reorder, Some(old), Some(new)) => {
                self.pair(edit, old, new, &mut out);
            }
            (kind, old, new) => {
                tracing::warn!(?kind, ?old, ?new, "edit without the nodes its kind requires");
                return Verdict::Subsumed;
            }
        }
        if out.is_empty() {
            if let Some(diagnostic) = self.applied_edit(edit) {
                self.require(Capabilities::BASELINE, diagnostic, &mut out);
            }
        }
        if out.is_empty() {
            Verdict::Allowed
        } else {
            Verdict::Rude(out)
        }
    }

    // ── Insert ──────────────────────────────────────────────────────

    fn insert(&self, new: NodeRef, out: &mut Diagnostics) {
        let tree = self.aggregate.new_tree(new.document);
        let node = tree.node(new.id);
        let rude = |kind| self.diagnostic(kind, tree, new.id, node.span);

        match node.kind {
            DeclKind::CompilationUnit | DeclKind::Namespace | DeclKind::FieldGroup => {}
            DeclKind::Class
            | DeclKind::Struct
            | DeclKind::Interface
            | DeclKind::Enum
            | DeclKind::Delegate
            | DeclKind::Module => {
                if !self.aggregate.is_inserted(new) {
                    return;
                }
                if tree
                    .enclosing_type(new.id)
                    .is_some_and(|t| tree.is_in_generic_context(t))
                {
                    out.push(rude(RudeEditKind::InsertIntoGenericType));
                } else {
                    self.require(
                        Capabilities::NEW_TYPE_DEFINITION,
                        rude(RudeEditKind::Inserted),
                        out,
                    );
                }
            }
            DeclKind::EnumMember => out.push(rude(RudeEditKind::Inserted)),
            DeclKind::Declare => out.push(rude(RudeEditKind::InsertDeclare)),
            DeclKind::TypeParameter => self.generic_update(tree, new.id, out),
            DeclKind::Parameter => {
                if let Some(member) = tree.parent(new.id) {
                    let span = tree.node(member).span;
                    self.signature_update(tree, member, span, out);
                }
            }
            DeclKind::Field
            | DeclKind::Property
            | DeclKind::Event
            | DeclKind::Method
            | DeclKind::Constructor
            | DeclKind::Operator
            | DeclKind::Accessor => self.insert_member(tree, new.id, out),
        }
    }

    fn insert_member(&self, tree: &DeclTree, id: DeclId, out: &mut Diagnostics) {
        let node = tree.node(id);
        let rude = |kind| self.diagnostic(kind, tree, id, node.span);

        if tree.is_in_generic_context(id) {
            out.push(rude(RudeEditKind::InsertIntoGenericType));
            return;
        }
        if self.occupies_vtable_slot(tree, id) {
            out.push(rude(RudeEditKind::InsertVirtual));
            return;
        }

        let needs_field = match node.kind {
            DeclKind::Field => true,
            DeclKind::Property | DeclKind::Event => node.is_auto(tree),
            _ => false,
        };
        let mut required = Capabilities::empty();
        if needs_field {
            if is_static(tree, id) {
                required |= Capabilities::ADD_STATIC_FIELD_TO_EXISTING_TYPE;
            } else {
                let facts = tree.enclosing_type_facts(id);
                if facts.is_some_and(|f| f.value_type) {
                    out.push(rude(RudeEditKind::InsertIntoValueType));
                    return;
                }
                if facts.is_some_and(|f| f.has_fixed_layout()) {
                    out.push(rude(RudeEditKind::InsertIntoLaidOutType));
                    return;
                }
                required |= Capabilities::ADD_INSTANCE_FIELD_TO_EXISTING_TYPE;
            }
        }
        if node.kind != DeclKind::Field {
            required |= Capabilities::ADD_METHOD_TO_EXISTING_TYPE;
        }
        self.require(required, rude(RudeEditKind::Inserted), out);
    }

    // ── Delete ──────────────────────────────────────────────────────

    fn delete(&self, old: NodeRef, out: &mut Diagnostics) {
        let tree = self.aggregate.old_tree(old.document);
        let node = tree.node(old.id);
        let (_, span) = self.aggregate.surviving_span(old);
        let rude = |kind| self.diagnostic(kind, tree, old.id, span);

        match node.kind {
            DeclKind::CompilationUnit | DeclKind::Namespace | DeclKind::FieldGroup => {}
            DeclKind::Class
            | DeclKind::Struct
            | DeclKind::Interface
            | DeclKind::Enum
            | DeclKind::Delegate
            | DeclKind::Module => {
                if self.aggregate.is_deleted(old) {
                    out.push(rude(RudeEditKind::Deleted));
                }
            }
            DeclKind::Field | DeclKind::EnumMember | DeclKind::Declare => {
                out.push(rude(RudeEditKind::Deleted));
            }
            DeclKind::TypeParameter => {
                if let Some(owner) = tree.parent(old.id) {
                    out.push(self.diagnostic(RudeEditKind::GenericUpdate, tree, owner, span));
                }
            }
            DeclKind::Parameter => {
                if let Some(member) = tree.parent(old.id) {
                    self.signature_update(tree, member, span, out);
                }
            }
            DeclKind::Property | DeclKind::Event if node.is_auto(tree) => {
                out.push(rude(RudeEditKind::Deleted));
            }
            DeclKind::Property
            | DeclKind::Event
            | DeclKind::Method
            | DeclKind::Constructor
            | DeclKind::Operator
            | DeclKind::Accessor => {
                if self.occupies_vtable_slot(tree, old.id) {
                    out.push(rude(RudeEditKind::Deleted));
                } else {
                    self.require(
                        Capabilities::ADD_METHOD_TO_EXISTING_TYPE,
                        rude(RudeEditKind::Deleted),
                        out,
                    );
                }
            }
        }
    }

    // ── Matched pairs ───────────────────────────────────────────────

    fn pair(&self, edit: &AggregatedEdit, old: NodeRef, new: NodeRef, out: &mut Diagnostics) {
        let old_tree = self.aggregate.old_tree(old.document);
        let new_tree = self.aggregate.new_tree(new.document);
        let span = new_tree.node(new.id).span;

        match edit.kind {
            EditKind::Move => {
                if !self.is_regrouped_variable(old, new) {
                    out.push(self.diagnostic(RudeEditKind::Moved, new_tree, new.id, span));
                    return;
                }
                self.regrouped_variable(old_tree, old.id, new_tree, new.id, out);
            }
            EditKind::Reorder => self.reorder(new_tree, new.id, out),
            EditKind::Update | EditKind::Insert | EditKind::Delete => {}
        }
        self.content(edit.changes, (old_tree, old.id), (new_tree, new.id), out);
    }

    /// A variable moved into another field group of the same type.
    fn is_regrouped_variable(&self, old: NodeRef, new: NodeRef) -> bool {
        let old_tree = self.aggregate.old_tree(old.document);
        let new_tree = self.aggregate.new_tree(new.document);
        if old_tree.kind(old.id) != DeclKind::Field {
            return false;
        }
        let old_type = old_tree
            .enclosing_type(old.id)
            .and_then(|t| self.aggregate.new_of(NodeRef::new(old.document, t)));
        let new_type = new_tree
            .enclosing_type(new.id)
            .map(|t| NodeRef::new(new.document, t));
        old_type.is_some() && old_type == new_type
    }

    /// Regrouping keeps the field unless its shared facts differ.
    fn regrouped_variable(
        &self,
        old_tree: &DeclTree,
        old: DeclId,
        new_tree: &DeclTree,
        new: DeclId,
        out: &mut Diagnostics,
    ) {
        let span = new_tree.node(new).span;
        let rude = |kind| self.diagnostic(kind, new_tree, new, span);
        if old_tree.effective_type(old) != new_tree.effective_type(new) {
            out.push(rude(RudeEditKind::TypeUpdate));
        }
        if old_tree.effective_modifiers(old) != new_tree.effective_modifiers(new) {
            out.push(rude(RudeEditKind::ModifiersUpdate));
        }
        if old_tree.effective_accessibility(old) != new_tree.effective_accessibility(new) {
            out.push(rude(RudeEditKind::AccessibilityUpdate));
        }
    }

    fn reorder(&self, tree: &DeclTree, id: DeclId, out: &mut Diagnostics) {
        let node = tree.node(id);
        let rude = |kind| self.diagnostic(kind, tree, id, node.span);
        let in_interface = tree
            .enclosing_type(id)
            .is_some_and(|t| tree.kind(t) == DeclKind::Interface);
        let fixed_layout = tree
            .enclosing_type_facts(id)
            .is_some_and(|f| f.has_fixed_layout());

        match node.kind {
            DeclKind::TypeParameter => out.push(rude(RudeEditKind::Moved)),
            DeclKind::Parameter => {
                if let Some(member) = tree.parent(id) {
                    let span = tree.node(member).span;
                    self.signature_update(tree, member, span, out);
                }
            }
            DeclKind::EnumMember => {
                if node.initializer.is_none() {
                    out.push(rude(RudeEditKind::Moved));
                }
            }
            DeclKind::Field | DeclKind::Property | DeclKind::Event
                if fixed_layout && !is_static(tree, id) && holds_instance_data(tree, id) =>
            {
                out.push(rude(RudeEditKind::Moved));
            }
            _ if in_interface => out.push(rude(RudeEditKind::Moved)),
            _ => {}
        }
    }

    /// Rules keyed on the facts that changed between two matched nodes.
    fn content(
        &self,
        changes: ContentChange,
        (old_tree, old): (&DeclTree, DeclId),
        (new_tree, new): (&DeclTree, DeclId),
        out: &mut Diagnostics,
    ) {
        let old_node = old_tree.node(old);
        let new_node = new_tree.node(new);
        let kind = new_node.kind;
        let span = new_node.span;
        let rude = |kind| self.diagnostic(kind, new_tree, new, span);

        if changes.contains(ContentChange::NAME) {
            match kind {
                DeclKind::Parameter => self.require(
                    Capabilities::RENAME_PARAMETER,
                    rude(RudeEditKind::Renamed),
                    out,
                ),
                _ => out.push(rude(RudeEditKind::Renamed)),
            }
        }

        if changes.contains(ContentChange::MODIFIERS) {
            let gained = new_node.modifiers.difference(old_node.modifiers);
            let differing = old_node
                .modifiers
                .symmetric_difference(new_node.modifiers)
                .difference(Modifiers::PARTIAL);
            if !kind.is_type() && gained.is_overridable_slot() {
                out.push(rude(RudeEditKind::InsertVirtual));
            } else if !differing.is_empty() {
                out.push(rude(RudeEditKind::ModifiersUpdate));
            }
        }

        if changes.contains(ContentChange::ACCESSIBILITY) {
            out.push(rude(RudeEditKind::AccessibilityUpdate));
        }

        if changes.contains(ContentChange::ATTRIBUTES) {
            self.require(
                Capabilities::CHANGE_CUSTOM_ATTRIBUTES,
                rude(RudeEditKind::AttributeUpdate),
                out,
            );
        }

        if changes.contains(ContentChange::TYPE) {
            match kind {
                DeclKind::Parameter => {
                    if let Some(member) = new_tree.parent(new) {
                        let span = new_tree.node(member).span;
                        self.signature_update(new_tree, member, span, out);
                    }
                }
                DeclKind::Method | DeclKind::Operator | DeclKind::Delegate => {
                    self.signature_update(new_tree, new, span, out);
                }
                _ => out.push(rude(RudeEditKind::TypeUpdate)),
            }
        }

        if changes.contains(ContentChange::INITIALIZER) {
            match kind {
                DeclKind::EnumMember => out.push(rude(RudeEditKind::ConstInitializerUpdate)),
                DeclKind::Parameter => out.push(rude(RudeEditKind::DefaultValueUpdate)),
                DeclKind::Field | DeclKind::FieldGroup | DeclKind::Property
                    if new_tree
                        .effective_modifiers(new)
                        .contains(Modifiers::CONST) =>
                {
                    out.push(rude(RudeEditKind::ConstInitializerUpdate));
                }
                _ => {}
            }
        }

        if changes.contains(ContentChange::BODY_KIND) {
            let was = old_node.body.as_ref().map(|b| b.kind).unwrap_or_default();
            let is = new_node.body.as_ref().map(|b| b.kind).unwrap_or_default();
            if !was.is_state_machine() && is.is_state_machine() {
                self.require(STATE_MACHINE, rude(RudeEditKind::MakeStateMachine), out);
            } else {
                out.push(rude(RudeEditKind::AwaitShapeChange));
            }
        }

        if changes.contains(ContentChange::BODY) {
            if let (Some(old_body), Some(new_body)) = (&old_node.body, &new_node.body) {
                if SyntaxMap::build(old_body, new_body).is_none() {
                    out.push(rude(RudeEditKind::UpdateStaticLocal));
                }
                let before = old_body.captured_variables();
                let after = new_body.captured_variables();
                let lifted = lifted_parameters(new_tree, new);
                for &name in after.iter().filter(|n| !before.contains(*n)) {
                    let diagnostic = RudeEditDiagnostic::declaration(
                        RudeEditKind::CapturingVariable,
                        span,
                        "variable",
                        self.interner.lookup(name),
                    );
                    if lifted.contains(&name) {
                        out.push(diagnostic);
                    } else {
                        self.require(Capabilities::NEW_TYPE_DEFINITION, diagnostic, out);
                    }
                }
                for &name in before.iter().filter(|n| !after.contains(*n)) {
                    self.require(
                        Capabilities::NEW_TYPE_DEFINITION,
                        RudeEditDiagnostic::declaration(
                            RudeEditKind::NotCapturingVariable,
                            span,
                            "variable",
                            self.interner.lookup(name),
                        ),
                        out,
                    );
                }
            }
        }

        let type_rules = [
            (ContentChange::BASE_TYPE, RudeEditKind::BaseTypeUpdate),
            (ContentChange::INTERFACES, RudeEditKind::InterfacesUpdate),
            (ContentChange::UNDERLYING, RudeEditKind::EnumUnderlyingTypeUpdate),
            (ContentChange::LAYOUT, RudeEditKind::LayoutUpdate),
            (ContentChange::INTEROP_LIBRARY, RudeEditKind::DeclareLibraryUpdate),
            (ContentChange::INTEROP_ALIAS, RudeEditKind::DeclareAliasUpdate),
        ];
        for (change, category) in type_rules {
            if changes.contains(change) {
                out.push(rude(category));
            }
        }
    }

    // ── Shared rules ────────────────────────────────────────────────

    /// A parameter list changed. Delegates, vtable members and interface
    /// members cannot change signature at all; other members need
    /// `UpdateParameters`.
    fn signature_update(&self, tree: &DeclTree, member: DeclId, span: Span, out: &mut Diagnostics) {
        let diagnostic = self.diagnostic(RudeEditKind::SignatureUpdate, tree, member, span);
        if tree.kind(member) == DeclKind::Delegate || self.occupies_vtable_slot(tree, member) {
            out.push(diagnostic);
        } else {
            self.require(Capabilities::UPDATE_PARAMETERS, diagnostic, out);
        }
    }

    fn generic_update(&self, tree: &DeclTree, type_parameter: DeclId, out: &mut Diagnostics) {
        if let Some(owner) = tree.parent(type_parameter) {
            let span = tree.node(owner).span;
            out.push(self.diagnostic(RudeEditKind::GenericUpdate, tree, owner, span));
        }
    }

    /// Push `diagnostic` unless the runtime has every capability in
    /// `required`. Every edit needs `BASELINE` on top.
    fn require(
        &self,
        required: Capabilities,
        diagnostic: RudeEditDiagnostic,
        out: &mut Diagnostics,
    ) {
        let missing = self
            .capabilities
            .missing(required | Capabilities::BASELINE);
        if !missing.is_empty() {
            out.push(diagnostic.unsupported_by_runtime(missing));
        }
    }

    /// Diagnostic for an edit that passed every rule, reported when the
    /// runtime cannot apply edits at all.
    fn applied_edit(&self, edit: &AggregatedEdit) -> Option<RudeEditDiagnostic> {
        let (kind, tree, node) = match (edit.kind, edit.old, edit.new) {
            (EditKind::Insert, _, Some(new)) => (
                RudeEditKind::Inserted,
                self.aggregate.new_tree(new.document),
                new,
            ),
            (EditKind::Delete, Some(old), _) => (
                RudeEditKind::Deleted,
                self.aggregate.old_tree(old.document),
                old,
            ),
            (_, _, Some(new)) => (
                RudeEditKind::Updated,
                self.aggregate.new_tree(new.document),
                new,
            ),
            _ => return None,
        };
        Some(self.diagnostic(kind, tree, node.id, tree.node(node.id).span))
    }

    /// Members that own or reuse a vtable slot, including every interface
    /// member. Accessors follow their property or event.
    fn occupies_vtable_slot(&self, tree: &DeclTree, id: DeclId) -> bool {
        let member = if tree.kind(id) == DeclKind::Accessor {
            tree.parent(id).unwrap_or(id)
        } else {
            id
        };
        tree.node(member).modifiers.is_overridable_slot()
            || tree
                .enclosing_type(member)
                .is_some_and(|t| tree.kind(t) == DeclKind::Interface)
    }

    fn is_subsumed_insert(&self, new: NodeRef) -> bool {
        let tree = self.aggregate.new_tree(new.document);
        owning_ancestor(tree, new.id)
            .is_some_and(|a| self.aggregate.is_inserted(NodeRef::new(new.document, a)))
    }

    fn is_subsumed_delete(&self, old: NodeRef) -> bool {
        let tree = self.aggregate.old_tree(old.document);
        owning_ancestor(tree, old.id)
            .is_some_and(|a| self.aggregate.is_deleted(NodeRef::new(old.document, a)))
    }

    fn diagnostic(
        &self,
        kind: RudeEditKind,
        tree: &DeclTree,
        id: DeclId,
        span: Span,
    ) -> RudeEditDiagnostic {
        RudeEditDiagnostic::declaration(
            kind,
            span,
            tree.node(id).label(tree),
            tree.display_name(id, self.interner),
        )
    }
}

/// Nearest ancestor with a runtime identity of its own: a type or a
/// member. Namespaces and field groups carry none.
fn owning_ancestor(tree: &DeclTree, id: DeclId) -> Option<DeclId> {
    tree.ancestors(id)
        .find(|&a| !tree.kind(a).is_grouping())
        .filter(|&a| {
            let kind = tree.kind(a);
            kind.is_type() || kind.is_member() || kind == DeclKind::Accessor
        })
}

/// Static storage: `Shared`, `Const`, or any member of a module.
pub(crate) fn is_static(tree: &DeclTree, id: DeclId) -> bool {
    tree.effective_modifiers(id)
        .intersects(Modifiers::STATIC | Modifiers::CONST)
        || tree
            .enclosing_type(id)
            .is_some_and(|t| tree.kind(t) == DeclKind::Module)
}

/// Parameters of the property an accessor belongs to. The accessor reads
/// them from a lifted frame that cannot hold a new closure.
fn lifted_parameters(tree: &DeclTree, id: DeclId) -> SmallVec<[Name; 4]> {
    let Some(property) = tree
        .parent(id)
        .filter(|&p| tree.kind(id) == DeclKind::Accessor && tree.kind(p) == DeclKind::Property)
    else {
        return SmallVec::new();
    };
    tree.children(property)
        .iter()
        .filter(|&&c| tree.kind(c) == DeclKind::Parameter)
        .map(|&c| tree.node(c).key.name)
        .collect()
}

/// Fields and auto-properties carry instance data.
fn holds_instance_data(tree: &DeclTree, id: DeclId) -> bool {
    let node = tree.node(id);
    node.kind == DeclKind::Field || node.is_auto(tree)
}
