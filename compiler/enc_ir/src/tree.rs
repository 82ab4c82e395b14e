//! Declaration trees.
//!
//! One [`DeclTree`] holds the declarations of one version of one document.
//! Nodes live in a flat arena and refer to each other by [`DeclId`].

use std::fmt;

use smallvec::SmallVec;

use crate::{
    Accessibility, Attribute, Body, ConstructorChain, DeclKey, DeclKind, Initializer, Interop,
    Modifiers, Span, StringInterner, TypeFacts, TypeRef,
};

/// Index of a node in its tree's arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct DeclId(u32);

impl DeclId {
    /// The compilation unit root of every tree.
    pub const ROOT: DeclId = DeclId(0);

    #[inline]
    pub(crate) const fn new(index: u32) -> Self {
        DeclId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeclId({})", self.0)
    }
}

/// One declaration.
#[derive(Clone, Debug)]
pub struct DeclNode {
    pub kind: DeclKind,
    pub key: DeclKey,
    pub span: Span,
    pub parent: Option<DeclId>,
    pub children: Vec<DeclId>,
    pub modifiers: Modifiers,
    pub accessibility: Accessibility,
    /// Sorted by name, then arguments.
    pub attributes: SmallVec<[Attribute; 2]>,
    /// Field, property, event or parameter type; method return type.
    pub type_ref: Option<TypeRef>,
    pub initializer: Option<Initializer>,
    pub body: Option<Body>,
    /// Present on type declarations.
    pub type_facts: Option<TypeFacts>,
    /// Present on `Declare` statements.
    pub interop: Option<Interop>,
    /// Constructors only.
    pub chain: ConstructorChain,
    /// The binder could not resolve this declaration.
    pub unresolved: bool,
}

impl DeclNode {
    /// A property or event whose accessors are all compiler-synthesized.
    pub fn is_auto(&self, tree: &DeclTree) -> bool {
        matches!(self.kind, DeclKind::Property | DeclKind::Event)
            && !self.modifiers.contains(Modifiers::ABSTRACT)
            && self
                .children
                .iter()
                .map(|&c| tree.node(c))
                .filter(|c| c.kind == DeclKind::Accessor)
                .all(|c| c.body.is_none())
    }

    /// Label used in diagnostic messages (`auto-property` for auto
    /// properties).
    pub fn label(&self, tree: &DeclTree) -> &'static str {
        match self.kind {
            DeclKind::Property if self.is_auto(tree) => "auto-property",
            DeclKind::Event if self.is_auto(tree) => "event",
            DeclKind::Constructor if self.modifiers.contains(Modifiers::STATIC) => {
                "static constructor"
            }
            kind => kind.label(),
        }
    }
}

/// Declarations of one document version.
#[derive(Clone, Debug)]
pub struct DeclTree {
    nodes: Vec<DeclNode>,
}

impl DeclTree {
    pub(crate) fn from_nodes(nodes: Vec<DeclNode>) -> Self {
        DeclTree { nodes }
    }

    #[inline]
    pub fn root(&self) -> DeclId {
        DeclId::ROOT
    }

    #[inline]
    pub fn node(&self, id: DeclId) -> &DeclNode {
        &self.nodes[id.index()]
    }

    /// Node lookup that tolerates ids from another tree.
    #[inline]
    pub fn get(&self, id: DeclId) -> Option<&DeclNode> {
        self.nodes.get(id.index())
    }

    #[inline]
    pub fn kind(&self, id: DeclId) -> DeclKind {
        self.node(id).kind
    }

    #[inline]
    pub fn parent(&self, id: DeclId) -> Option<DeclId> {
        self.node(id).parent
    }

    #[inline]
    pub fn children(&self, id: DeclId) -> &[DeclId] {
        &self.node(id).children
    }

    /// Number of nodes, including the root.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always has its root.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// All node ids in pre-order.
    pub fn ids(&self) -> impl Iterator<Item = DeclId> + '_ {
        let mut stack = vec![DeclId::ROOT];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            stack.extend(self.children(id).iter().rev().copied());
            Some(id)
        })
    }

    /// Strict ancestors, innermost first.
    pub fn ancestors(&self, id: DeclId) -> impl Iterator<Item = DeclId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_within(&self, id: DeclId, ancestor: DeclId) -> bool {
        id == ancestor || self.ancestors(id).any(|a| a == ancestor)
    }

    /// Nearest strictly enclosing type declaration.
    pub fn enclosing_type(&self, id: DeclId) -> Option<DeclId> {
        self.ancestors(id).find(|&a| self.kind(a).is_type())
    }

    /// Nearest strictly enclosing member (method, property, ...).
    pub fn enclosing_member(&self, id: DeclId) -> Option<DeclId> {
        self.ancestors(id)
            .find(|&a| self.kind(a).is_member() && !self.kind(a).is_grouping())
    }

    /// Type facts of the nearest enclosing type, if any.
    pub fn enclosing_type_facts(&self, id: DeclId) -> Option<&TypeFacts> {
        self.enclosing_type(id)
            .and_then(|t| self.node(t).type_facts.as_ref())
    }

    /// The node or one of its enclosing declarations declares type
    /// parameters.
    pub fn is_in_generic_context(&self, id: DeclId) -> bool {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .any(|a| self.node(a).key.arity > 0)
    }

    /// Innermost node carrying a body that contains `span`.
    pub fn body_owner_at(&self, span: Span) -> Option<DeclId> {
        self.ids()
            .filter(|&id| {
                self.node(id)
                    .body
                    .as_ref()
                    .is_some_and(|b| b.span.contains_span(span))
            })
            .last()
    }

    /// Modifiers of a field, falling back to its group's.
    pub fn effective_modifiers(&self, id: DeclId) -> Modifiers {
        self.group_of(id)
            .map_or(self.node(id).modifiers, |g| {
                self.node(g).modifiers | self.node(id).modifiers
            })
    }

    /// Accessibility of a field, taken from its group when grouped.
    pub fn effective_accessibility(&self, id: DeclId) -> Accessibility {
        self.group_of(id)
            .map_or(self.node(id).accessibility, |g| self.node(g).accessibility)
    }

    /// Type of a field, falling back to its group's.
    pub fn effective_type(&self, id: DeclId) -> Option<TypeRef> {
        self.node(id)
            .type_ref
            .or_else(|| self.group_of(id).and_then(|g| self.node(g).type_ref))
    }

    /// Initializer of a field, falling back to its group's.
    pub fn effective_initializer(&self, id: DeclId) -> Option<Initializer> {
        self.node(id)
            .initializer
            .or_else(|| self.group_of(id).and_then(|g| self.node(g).initializer))
    }

    /// Members of a type, looking through field groups.
    pub fn members(&self, type_id: DeclId) -> impl Iterator<Item = DeclId> + '_ {
        self.children(type_id).iter().flat_map(move |&c| {
            let flattened: SmallVec<[DeclId; 4]> = if self.kind(c).is_grouping() {
                self.children(c).iter().copied().collect()
            } else {
                SmallVec::from_elem(c, 1)
            };
            flattened
        })
    }

    /// Data members with initializers that run in constructors.
    pub fn initialized_members(
        &self,
        type_id: DeclId,
        is_static: bool,
    ) -> impl Iterator<Item = DeclId> + '_ {
        self.members(type_id).filter(move |&m| {
            let node = self.node(m);
            matches!(node.kind, DeclKind::Field | DeclKind::Property)
                && !self.effective_modifiers(m).contains(Modifiers::CONST)
                && self.effective_modifiers(m).contains(Modifiers::STATIC) == is_static
                && self.effective_initializer(m).is_some()
        })
    }

    /// User-written constructors of a type.
    pub fn constructors(
        &self,
        type_id: DeclId,
        is_static: bool,
    ) -> impl Iterator<Item = DeclId> + '_ {
        self.children(type_id).iter().copied().filter(move |&c| {
            let node = self.node(c);
            node.kind == DeclKind::Constructor
                && node.modifiers.contains(Modifiers::STATIC) == is_static
        })
    }

    /// `Type.Member` style name of a declaration, for messages.
    pub fn display_name(&self, id: DeclId, interner: &StringInterner) -> String {
        let node = self.node(id);
        match node.kind {
            DeclKind::Constructor | DeclKind::Accessor => {
                let owner = self
                    .parent(id)
                    .filter(|&p| p != DeclId::ROOT)
                    .map(|p| interner.lookup(self.node(p).key.name))
                    .unwrap_or_default();
                format!("{owner}.{}", interner.lookup(node.key.name))
            }
            _ => interner.lookup(node.key.name).to_owned(),
        }
    }

    fn group_of(&self, id: DeclId) -> Option<DeclId> {
        self.parent(id).filter(|&p| self.kind(p).is_grouping())
    }
}
