//! Tree construction.
//!
//! The parser/binder collaborators describe declarations with [`Decl`] values
//! and assemble them with a [`TreeBuilder`]. The builder interns names,
//! derives identity keys (signatures from parameter types, arity from type
//! parameters) and validates the sibling-uniqueness invariant.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::symbol::constructor_name;
use crate::{
    Accessibility, AccessorKind, AnchorKind, Attribute, Body, BodyKind, ConstructorChain, DeclId,
    DeclKey, DeclKind, DeclNode, DeclTree, Initializer, Interop, Layout, Modifiers, Name, Span,
    StateAnchor, StringInterner, TypeFacts, TypeRef,
};

/// Width reserved for each node when no span is given.
const AUTO_SPAN_STRIDE: u32 = 16;

/// A tree that violates a structural invariant.
#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
pub enum TreeError {
    #[error("parent {parent:?} does not exist")]
    UnknownParent { parent: DeclId },
    #[error("a {parent} cannot contain a {child}")]
    InvalidChild { parent: DeclKind, child: DeclKind },
    #[error("duplicate {kind} `{key}` in {parent:?}")]
    DuplicateKey {
        parent: DeclId,
        kind: DeclKind,
        key: String,
    },
}

#[derive(Clone, Debug, Default)]
struct BodyDecl {
    fingerprint: u64,
    kind: BodyKind,
    span: Option<Span>,
    anchors: Vec<(AnchorKind, String, Span, Vec<String>)>,
}

/// Description of one declaration, with unresolved (string) names.
#[derive(Clone, Debug)]
pub struct Decl {
    kind: DeclKind,
    name: String,
    span: Option<Span>,
    modifiers: Modifiers,
    accessibility: Accessibility,
    attributes: Vec<(String, u64)>,
    type_ref: Option<String>,
    initializer: Option<Initializer>,
    body: Option<BodyDecl>,
    value_type: Option<bool>,
    layout: Layout,
    base: Option<String>,
    interfaces: Vec<String>,
    underlying: Option<String>,
    reloadable: bool,
    interop: Option<(String, Option<String>)>,
    chain: ConstructorChain,
    unresolved: bool,
}

impl Decl {
    pub fn new(kind: DeclKind, name: impl Into<String>) -> Self {
        Decl {
            kind,
            name: name.into(),
            span: None,
            modifiers: Modifiers::empty(),
            accessibility: Accessibility::default(),
            attributes: Vec::new(),
            type_ref: None,
            initializer: None,
            body: None,
            value_type: None,
            layout: Layout::Auto,
            base: None,
            interfaces: Vec::new(),
            underlying: None,
            reloadable: false,
            interop: None,
            chain: ConstructorChain::Implicit,
            unresolved: false,
        }
    }

    // ── Declaration shapes ──────────────────────────────────────────

    pub fn namespace(name: impl Into<String>) -> Self {
        Self::new(DeclKind::Namespace, name)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(DeclKind::Class, name)
    }

    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(DeclKind::Struct, name)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(DeclKind::Interface, name)
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(DeclKind::Enum, name)
    }

    pub fn module(name: impl Into<String>) -> Self {
        Self::new(DeclKind::Module, name).modifiers(Modifiers::STATIC)
    }

    pub fn delegate(name: impl Into<String>) -> Self {
        Self::new(DeclKind::Delegate, name)
    }

    /// A standalone field variable with its own type.
    pub fn field(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self::new(DeclKind::Field, name).typed(ty)
    }

    /// A declaration statement whose variables share `ty`.
    pub fn field_group(ty: impl Into<String>) -> Self {
        Self::new(DeclKind::FieldGroup, "").typed(ty)
    }

    /// A variable inside a field group; type and initializer come from the
    /// group unless set here.
    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(DeclKind::Field, name)
    }

    pub fn enum_member(name: impl Into<String>) -> Self {
        Self::new(DeclKind::EnumMember, name)
    }

    pub fn property(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self::new(DeclKind::Property, name).typed(ty)
    }

    pub fn event(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self::new(DeclKind::Event, name).typed(ty)
    }

    pub fn method(name: impl Into<String>) -> Self {
        Self::new(DeclKind::Method, name)
    }

    pub fn constructor() -> Self {
        Self::new(DeclKind::Constructor, constructor_name(Modifiers::empty()))
    }

    pub fn static_constructor() -> Self {
        Self::new(DeclKind::Constructor, constructor_name(Modifiers::STATIC))
            .modifiers(Modifiers::STATIC)
    }

    pub fn operator(name: impl Into<String>) -> Self {
        Self::new(DeclKind::Operator, name).modifiers(Modifiers::STATIC)
    }

    /// A native interop declaration bound to `library`.
    pub fn declare(name: impl Into<String>, library: impl Into<String>) -> Self {
        let mut decl = Self::new(DeclKind::Declare, name).modifiers(Modifiers::STATIC);
        decl.interop = Some((library.into(), None));
        decl
    }

    pub fn accessor(kind: AccessorKind) -> Self {
        Self::new(DeclKind::Accessor, kind.keyword())
    }

    pub fn parameter(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self::new(DeclKind::Parameter, name).typed(ty)
    }

    pub fn type_parameter(name: impl Into<String>) -> Self {
        Self::new(DeclKind::TypeParameter, name)
    }

    // ── Facts ───────────────────────────────────────────────────────

    #[must_use]
    pub fn span(mut self, start: u32, end: u32) -> Self {
        self.span = Some(Span::new(start, end));
        self
    }

    #[must_use]
    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    #[must_use]
    pub fn accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, arguments: u64) -> Self {
        self.attributes.push((name.into(), arguments));
        self
    }

    #[must_use]
    pub fn typed(mut self, ty: impl Into<String>) -> Self {
        self.type_ref = Some(ty.into());
        self
    }

    /// Return type of a method, operator or `Declare`.
    #[must_use]
    pub fn returns(self, ty: impl Into<String>) -> Self {
        self.typed(ty)
    }

    #[must_use]
    pub fn initializer(mut self, fingerprint: u64) -> Self {
        self.initializer = Some(Initializer::new(fingerprint));
        self
    }

    #[must_use]
    pub fn initializer_with_lambdas(mut self, fingerprint: u64) -> Self {
        self.initializer = Some(Initializer::new(fingerprint).with_lambdas());
        self
    }

    /// Give the declaration an executable body with the given content
    /// fingerprint.
    #[must_use]
    pub fn body(mut self, fingerprint: u64) -> Self {
        self.body.get_or_insert_with(BodyDecl::default).fingerprint = fingerprint;
        self
    }

    #[must_use]
    pub fn body_kind(mut self, kind: BodyKind) -> Self {
        self.body.get_or_insert_with(BodyDecl::default).kind = kind;
        self
    }

    #[must_use]
    pub fn body_span(mut self, start: u32, end: u32) -> Self {
        self.body.get_or_insert_with(BodyDecl::default).span = Some(Span::new(start, end));
        self
    }

    /// Add a state anchor to the body.
    #[must_use]
    pub fn anchor(mut self, kind: AnchorKind, label: impl Into<String>, span: Span) -> Self {
        self.body
            .get_or_insert_with(BodyDecl::default)
            .anchors
            .push((kind, label.into(), span, Vec::new()));
        self
    }

    /// Add a lambda anchor capturing `captures`.
    #[must_use]
    pub fn lambda(mut self, label: impl Into<String>, span: Span, captures: &[&str]) -> Self {
        self.body.get_or_insert_with(BodyDecl::default).anchors.push((
            AnchorKind::Lambda,
            label.into(),
            span,
            captures.iter().map(|&c| c.to_owned()).collect(),
        ));
        self
    }

    #[must_use]
    pub fn value_type(mut self, value_type: bool) -> Self {
        self.value_type = Some(value_type);
        self
    }

    #[must_use]
    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn inherits(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    #[must_use]
    pub fn underlying(mut self, ty: impl Into<String>) -> Self {
        self.underlying = Some(ty.into());
        self
    }

    /// Opt the type into whole-type replacement.
    #[must_use]
    pub fn reloadable(mut self) -> Self {
        self.reloadable = true;
        self
    }

    /// Entry point alias of a `Declare` statement.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        if let Some((_, slot)) = &mut self.interop {
            *slot = Some(alias.into());
        }
        self
    }

    #[must_use]
    pub fn chain(mut self, chain: ConstructorChain) -> Self {
        self.chain = chain;
        self
    }

    /// Mark the declaration as one the binder could not resolve.
    #[must_use]
    pub fn unresolved(mut self) -> Self {
        self.unresolved = true;
        self
    }
}

/// Assembles a [`DeclTree`] from [`Decl`] descriptions.
pub struct TreeBuilder<'i> {
    interner: &'i StringInterner,
    nodes: Vec<DeclNode>,
    error: Option<TreeError>,
    next_offset: u32,
}

impl<'i> TreeBuilder<'i> {
    pub fn new(interner: &'i StringInterner) -> Self {
        let root = DeclNode {
            kind: DeclKind::CompilationUnit,
            key: DeclKey::default(),
            span: Span::DUMMY,
            parent: None,
            children: Vec::new(),
            modifiers: Modifiers::empty(),
            accessibility: Accessibility::Public,
            attributes: SmallVec::new(),
            type_ref: None,
            initializer: None,
            body: None,
            type_facts: None,
            interop: None,
            chain: ConstructorChain::Implicit,
            unresolved: false,
        };
        TreeBuilder {
            interner,
            nodes: vec![root],
            error: None,
            next_offset: AUTO_SPAN_STRIDE,
        }
    }

    #[inline]
    pub fn root(&self) -> DeclId {
        DeclId::ROOT
    }

    /// Add `decl` as the last child of `parent`.
    ///
    /// Structural errors are recorded and reported by [`finish`](Self::finish);
    /// the returned id stays usable so construction code needs no error
    /// plumbing.
    pub fn add(&mut self, parent: DeclId, decl: Decl) -> DeclId {
        let id = DeclId::new(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        match self.nodes.get(parent.index()).map(|p| p.kind) {
            None => self.record(TreeError::UnknownParent { parent }),
            Some(parent_kind) if !parent_kind.can_contain(decl.kind) => {
                self.record(TreeError::InvalidChild {
                    parent: parent_kind,
                    child: decl.kind,
                });
            }
            Some(_) => {}
        }

        let span = decl.span.unwrap_or_else(|| self.auto_span());
        let node = self.lower(decl, span, parent);
        if let Some(p) = self.nodes.get_mut(parent.index()) {
            p.children.push(id);
        }
        self.nodes.push(node);
        id
    }

    /// Derive identity keys, validate, and produce the tree.
    pub fn finish(mut self) -> Result<DeclTree, TreeError> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        self.derive_keys();
        let tree = DeclTree::from_nodes(self.nodes);
        check_unique_keys(&tree, self.interner)?;
        Ok(tree)
    }

    fn record(&mut self, error: TreeError) {
        self.error.get_or_insert(error);
    }

    fn auto_span(&mut self) -> Span {
        let start = self.next_offset;
        self.next_offset += AUTO_SPAN_STRIDE;
        Span::new(start, start + AUTO_SPAN_STRIDE / 2)
    }

    fn lower(&self, decl: Decl, span: Span, parent: DeclId) -> DeclNode {
        let intern = |s: &str| self.interner.intern(s);
        let mut attributes: SmallVec<[Attribute; 2]> = decl
            .attributes
            .iter()
            .map(|(name, arguments)| Attribute {
                name: intern(name),
                arguments: *arguments,
            })
            .collect();
        attributes.sort_unstable();

        let type_facts = decl.kind.is_type().then(|| TypeFacts {
            value_type: decl.value_type.unwrap_or(decl.kind.is_value_type()),
            layout: if decl.kind == DeclKind::Struct && decl.layout == Layout::Auto {
                Layout::Sequential
            } else {
                decl.layout
            },
            base: decl.base.as_deref().map(|b| TypeRef(intern(b))),
            interfaces: decl.interfaces.iter().map(|i| TypeRef(intern(i))).collect(),
            underlying: decl.underlying.as_deref().map(|u| TypeRef(intern(u))),
            reloadable: decl.reloadable,
        });

        let body = decl.body.map(|b| Body {
            span: b.span.unwrap_or(span),
            fingerprint: b.fingerprint,
            kind: b.kind,
            anchors: b
                .anchors
                .into_iter()
                .map(|(kind, label, span, captures)| StateAnchor {
                    kind,
                    label: intern(&label),
                    span,
                    captures: captures.iter().map(|c| intern(c)).collect(),
                })
                .collect(),
        });

        DeclNode {
            kind: decl.kind,
            key: DeclKey::named(intern(&decl.name)),
            span,
            parent: Some(parent),
            children: Vec::new(),
            modifiers: decl.modifiers,
            accessibility: decl.accessibility,
            attributes,
            type_ref: decl.type_ref.as_deref().map(|t| TypeRef(intern(t))),
            initializer: decl.initializer,
            body,
            type_facts,
            interop: decl.interop.map(|(library, alias)| Interop {
                library: intern(&library),
                alias: alias.as_deref().map(intern),
            }),
            chain: decl.chain,
            unresolved: decl.unresolved,
        }
    }

    /// Fill in arity and signature from the children.
    fn derive_keys(&mut self) {
        for index in 0..self.nodes.len() {
            let node = &self.nodes[index];
            let mut arity: u16 = 0;
            let mut parameters: SmallVec<[Name; 4]> = SmallVec::new();
            for &child in &node.children {
                let child = &self.nodes[child.index()];
                match child.kind {
                    DeclKind::TypeParameter => arity = arity.saturating_add(1),
                    DeclKind::Parameter => {
                        parameters.push(child.type_ref.map_or(Name::EMPTY, |t| t.0));
                    }
                    _ => {}
                }
            }
            let signature = (node.kind.has_signature()
                || (node.kind == DeclKind::Property && !parameters.is_empty()))
            .then_some(parameters);

            let node = &mut self.nodes[index];
            node.key.arity = arity;
            node.key.signature = signature;
        }
    }
}

/// Identity keys must be unique among same-kind siblings. Variables of all
/// field groups of one type share a single scope.
fn check_unique_keys(tree: &DeclTree, interner: &StringInterner) -> Result<(), TreeError> {
    for parent in tree.ids() {
        if tree.kind(parent).is_grouping() {
            continue;
        }
        let mut seen: FxHashSet<(DeclKind, &DeclKey)> = FxHashSet::default();
        let scope = tree.children(parent).iter().flat_map(|&c| {
            let nested: SmallVec<[DeclId; 4]> = if tree.kind(c).is_grouping() {
                tree.children(c).iter().copied().collect()
            } else {
                SmallVec::from_elem(c, 1)
            };
            nested
        });
        for child in scope {
            let node = tree.node(child);
            if !seen.insert((node.kind, &node.key)) {
                return Err(TreeError::DuplicateKey {
                    parent,
                    kind: node.kind,
                    key: node.key.display(interner),
                });
            }
        }
    }
    Ok(())
}
