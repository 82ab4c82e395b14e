//! Enc IR - declaration trees for edit-and-continue analysis
//!
//! This crate holds the inputs every analysis stage consumes:
//! - Spans for source locations
//! - Interned names for identifiers and type references
//! - Declaration trees (one per document version) with stable identity keys
//! - Resolved symbol facts supplied by the binder (modifiers, accessibility,
//!   attributes, layout, interop)
//! - Opaque executable bodies exposing only their state anchors
//! - Symbol keys naming runtime symbols in emitted edits
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: identifiers and type names are `Name(u32)`
//! - **Flatten Everything**: trees are arenas addressed by `DeclId(u32)`
//! - **Facts, not binding**: the core never resolves anything itself; it
//!   compares facts the binder already computed.

mod body;
mod builder;
mod cancel;
mod document;
mod facts;
mod interner;
mod key;
mod kind;
mod name;
mod span;
mod symbol;
mod tree;

pub use body::{AnchorKind, Body, BodyKind, StateAnchor};
pub use builder::{Decl, TreeBuilder, TreeError};
pub use cancel::{CancellationToken, Cancelled};
pub use document::DocumentId;
pub use facts::{
    Accessibility, Attribute, ConstructorChain, Initializer, Interop, Layout, Modifiers, TypeFacts,
    TypeRef,
};
pub use interner::{SharedInterner, StringInterner};
pub use key::DeclKey;
pub use kind::{AccessorKind, DeclKind};
pub use name::Name;
pub use span::Span;
pub use symbol::{SymbolKey, CONSTRUCTOR_NAME, STATIC_CONSTRUCTOR_NAME};
pub use tree::{DeclId, DeclNode, DeclTree};
