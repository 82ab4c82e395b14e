//! Resolved symbol facts attached to declaration nodes.
//!
//! These come from the binder. The analysis compares them between versions
//! but never derives them.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::Name;

bitflags! {
    /// Declaration modifiers relevant to patching.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct Modifiers: u16 {
        /// `Shared` / `static`.
        const STATIC = 1 << 0;
        /// `Overridable` / `virtual`.
        const VIRTUAL = 1 << 1;
        /// `MustOverride` / `abstract`.
        const ABSTRACT = 1 << 2;
        /// `Overrides` / `override`.
        const OVERRIDE = 1 << 3;
        /// `NotOverridable` / `NotInheritable` / `sealed`.
        const SEALED = 1 << 4;
        const READONLY = 1 << 5;
        const CONST = 1 << 6;
        const PARTIAL = 1 << 7;
        /// `Shadows` / `new`.
        const SHADOWS = 1 << 8;
        const EXTERN = 1 << 9;
        const WITH_EVENTS = 1 << 10;
    }
}

impl Modifiers {
    /// Modifiers that give a member its own vtable slot or reuse one.
    pub const VTABLE: Self = Self::VIRTUAL.union(Self::ABSTRACT).union(Self::OVERRIDE);

    /// Whether the member occupies a vtable slot.
    #[inline]
    pub const fn is_overridable_slot(self) -> bool {
        self.intersects(Self::VTABLE)
    }
}

/// Declared accessibility.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Accessibility {
    Public,
    Protected,
    /// `Friend` / `internal`.
    Friend,
    ProtectedFriend,
    PrivateProtected,
    #[default]
    Private,
}

/// An applied attribute: its resolved type name and a fingerprint of its
/// arguments.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Attribute {
    pub name: Name,
    pub arguments: u64,
}

/// Resolved type reference, by display name.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct TypeRef(pub Name);

/// Initializer expression of a field, property, enum value or parameter
/// default.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Initializer {
    /// Fingerprint of the expression text; equal fingerprints mean no change.
    pub fingerprint: u64,
    /// The expression contains lambdas (closures live in the constructor).
    pub has_lambdas: bool,
}

impl Initializer {
    pub const fn new(fingerprint: u64) -> Self {
        Initializer {
            fingerprint,
            has_lambdas: false,
        }
    }

    #[must_use]
    pub const fn with_lambdas(mut self) -> Self {
        self.has_lambdas = true;
        self
    }
}

/// Memory layout of a type's instance data.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Layout {
    #[default]
    Auto,
    Sequential,
    Explicit,
}

/// Facts about a type declaration.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct TypeFacts {
    pub value_type: bool,
    pub layout: Layout,
    pub base: Option<TypeRef>,
    pub interfaces: SmallVec<[TypeRef; 2]>,
    /// Underlying integral type of an enum.
    pub underlying: Option<TypeRef>,
    /// The type opted into whole-type replacement.
    pub reloadable: bool,
}

impl TypeFacts {
    /// Instance field order is observable (explicit/sequential layout or an
    /// inline value type).
    pub fn has_fixed_layout(&self) -> bool {
        self.value_type || self.layout != Layout::Auto
    }
}

/// Native interop facts of a `Declare` statement.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Interop {
    pub library: Name,
    pub alias: Option<Name>,
}

/// How a constructor starts: implicitly, through the base type, or by
/// chaining to a sibling constructor of the same type.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum ConstructorChain {
    #[default]
    Implicit,
    Base,
    /// `Me.New(...)` / `this(...)`.
    This,
}
