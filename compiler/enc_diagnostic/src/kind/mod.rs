//! Rude edit categories.
//!
//! Each category is a unique code (`ENC0001`...) used for documentation
//! lookups and by tooling that suppresses or groups diagnostics. Codes are
//! never reused or renumbered.

use std::fmt;

/// Category of a rude edit.
///
/// Message templates take positional arguments: `{0}` is the declaration's
/// kind label (`method`, `auto-property`, ...), `{1}` its display name.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum RudeEditKind {
    // Declaration identity (ENC00xx)
    /// Declaration renamed.
    Renamed,
    /// Declaration moved to another type, or reordered where order is
    /// observable.
    Moved,
    Deleted,
    /// Inserting a declaration that no capability allows.
    Inserted,
    /// Updating a declaration on a runtime without body updates.
    Updated,

    // Declaration facts (ENC01xx)
    TypeUpdate,
    ModifiersUpdate,
    AccessibilityUpdate,
    /// Type parameter list changed.
    GenericUpdate,
    AttributeUpdate,
    SignatureUpdate,
    ConstInitializerUpdate,
    /// Parameter default value changed.
    DefaultValueUpdate,

    // Type shape (ENC02xx)
    /// New or existing member becomes virtual, abstract or overriding.
    InsertVirtual,
    InsertIntoGenericType,
    InsertIntoValueType,
    /// Type has explicit or sequential layout.
    InsertIntoLaidOutType,
    BaseTypeUpdate,
    InterfacesUpdate,
    EnumUnderlyingTypeUpdate,
    LayoutUpdate,
    InsertConstructorWithCapturedInitializers,

    // Native interop (ENC03xx)
    InsertDeclare,
    DeclareLibraryUpdate,
    DeclareAliasUpdate,

    // Executable state (ENC04xx)
    CapturingVariable,
    NotCapturingVariable,
    /// Suspension points of a state machine changed in a way existing
    /// instances cannot follow.
    AwaitShapeChange,
    /// A regular body becomes async or an iterator.
    MakeStateMachine,
    DeleteActiveStatement,
    UpdateStaticLocal,
}

impl RudeEditKind {
    /// All categories, for exhaustive testing.
    ///
    /// Kept in sync with `code()` which is exhaustive (Rust match enforces
    /// it). The `codes_are_unique` test catches any omission.
    pub const ALL: &[RudeEditKind] = &[
        RudeEditKind::Renamed,
        RudeEditKind::Moved,
        RudeEditKind::Deleted,
        RudeEditKind::Inserted,
        RudeEditKind::Updated,
        RudeEditKind::TypeUpdate,
        RudeEditKind::ModifiersUpdate,
        RudeEditKind::AccessibilityUpdate,
        RudeEditKind::GenericUpdate,
        RudeEditKind::AttributeUpdate,
        RudeEditKind::SignatureUpdate,
        RudeEditKind::ConstInitializerUpdate,
        RudeEditKind::DefaultValueUpdate,
        RudeEditKind::InsertVirtual,
        RudeEditKind::InsertIntoGenericType,
        RudeEditKind::InsertIntoValueType,
        RudeEditKind::InsertIntoLaidOutType,
        RudeEditKind::BaseTypeUpdate,
        RudeEditKind::InterfacesUpdate,
        RudeEditKind::EnumUnderlyingTypeUpdate,
        RudeEditKind::LayoutUpdate,
        RudeEditKind::InsertConstructorWithCapturedInitializers,
        RudeEditKind::InsertDeclare,
        RudeEditKind::DeclareLibraryUpdate,
        RudeEditKind::DeclareAliasUpdate,
        RudeEditKind::CapturingVariable,
        RudeEditKind::NotCapturingVariable,
        RudeEditKind::AwaitShapeChange,
        RudeEditKind::MakeStateMachine,
        RudeEditKind::DeleteActiveStatement,
        RudeEditKind::UpdateStaticLocal,
    ];

    /// Stable code of this category.
    pub const fn code(self) -> &'static str {
        match self {
            RudeEditKind::Renamed => "ENC0001",
            RudeEditKind::Moved => "ENC0002",
            RudeEditKind::Deleted => "ENC0003",
            RudeEditKind::Inserted => "ENC0004",
            RudeEditKind::Updated => "ENC0005",
            RudeEditKind::TypeUpdate => "ENC0101",
            RudeEditKind::ModifiersUpdate => "ENC0102",
            RudeEditKind::AccessibilityUpdate => "ENC0103",
            RudeEditKind::GenericUpdate => "ENC0104",
            RudeEditKind::AttributeUpdate => "ENC0105",
            RudeEditKind::SignatureUpdate => "ENC0106",
            RudeEditKind::ConstInitializerUpdate => "ENC0107",
            RudeEditKind::DefaultValueUpdate => "ENC0108",
            RudeEditKind::InsertVirtual => "ENC0201",
            RudeEditKind::InsertIntoGenericType => "ENC0202",
            RudeEditKind::InsertIntoValueType => "ENC0203",
            RudeEditKind::InsertIntoLaidOutType => "ENC0204",
            RudeEditKind::BaseTypeUpdate => "ENC0205",
            RudeEditKind::InterfacesUpdate => "ENC0206",
            RudeEditKind::EnumUnderlyingTypeUpdate => "ENC0207",
            RudeEditKind::LayoutUpdate => "ENC0208",
            RudeEditKind::InsertConstructorWithCapturedInitializers => "ENC0209",
            RudeEditKind::InsertDeclare => "ENC0301",
            RudeEditKind::DeclareLibraryUpdate => "ENC0302",
            RudeEditKind::DeclareAliasUpdate => "ENC0303",
            RudeEditKind::CapturingVariable => "ENC0401",
            RudeEditKind::NotCapturingVariable => "ENC0402",
            RudeEditKind::AwaitShapeChange => "ENC0403",
            RudeEditKind::MakeStateMachine => "ENC0404",
            RudeEditKind::DeleteActiveStatement => "ENC0405",
            RudeEditKind::UpdateStaticLocal => "ENC0406",
        }
    }

    /// Message template describing the edit.
    pub const fn template(self) -> &'static str {
        match self {
            RudeEditKind::Renamed => "Renaming {0} '{1}'",
            RudeEditKind::Moved => "Moving {0} '{1}'",
            RudeEditKind::Deleted => "Deleting {0} '{1}'",
            RudeEditKind::Inserted => "Adding {0} '{1}'",
            RudeEditKind::Updated => "Updating {0} '{1}'",
            RudeEditKind::TypeUpdate => "Changing the type of {0} '{1}'",
            RudeEditKind::ModifiersUpdate => "Updating the modifiers of {0} '{1}'",
            RudeEditKind::AccessibilityUpdate => "Changing the accessibility of {0} '{1}'",
            RudeEditKind::GenericUpdate => "Changing the type parameters of {0} '{1}'",
            RudeEditKind::AttributeUpdate => "Changing the attributes of {0} '{1}'",
            RudeEditKind::SignatureUpdate => "Changing the signature of {0} '{1}'",
            RudeEditKind::ConstInitializerUpdate => "Changing the value of constant {0} '{1}'",
            RudeEditKind::DefaultValueUpdate => "Changing the default value of {0} '{1}'",
            RudeEditKind::InsertVirtual => "Making {0} '{1}' overridable",
            RudeEditKind::InsertIntoGenericType => {
                "Adding {0} '{1}' into a generic type or method"
            }
            RudeEditKind::InsertIntoValueType => "Adding instance {0} '{1}' into a structure",
            RudeEditKind::InsertIntoLaidOutType => {
                "Adding {0} '{1}' into a type with a fixed memory layout"
            }
            RudeEditKind::BaseTypeUpdate => "Changing the base type of {0} '{1}'",
            RudeEditKind::InterfacesUpdate => "Changing the implemented interfaces of {0} '{1}'",
            RudeEditKind::EnumUnderlyingTypeUpdate => "Changing the underlying type of {0} '{1}'",
            RudeEditKind::LayoutUpdate => "Changing the memory layout of {0} '{1}'",
            RudeEditKind::InsertConstructorWithCapturedInitializers => {
                "Adding {0} '{1}' to a type whose initializers capture variables"
            }
            RudeEditKind::InsertDeclare => "Adding {0} '{1}'",
            RudeEditKind::DeclareLibraryUpdate => "Changing the library name of {0} '{1}'",
            RudeEditKind::DeclareAliasUpdate => "Changing the alias of {0} '{1}'",
            RudeEditKind::CapturingVariable => "Capturing {0} '{1}' that was not captured before",
            RudeEditKind::NotCapturingVariable => "Ceasing to capture {0} '{1}'",
            RudeEditKind::AwaitShapeChange => "Changing the suspension points of {0} '{1}'",
            RudeEditKind::MakeStateMachine => "Making {0} '{1}' async or an iterator",
            RudeEditKind::DeleteActiveStatement => "Removing an active statement from {0} '{1}'",
            RudeEditKind::UpdateStaticLocal => "Updating {0} '{1}' which contains a static local",
        }
    }

    /// Categories describing state held by the running program rather than
    /// the declaration shape. Reloadable types cannot replace these away.
    pub const fn is_active_state(self) -> bool {
        matches!(
            self,
            RudeEditKind::DeleteActiveStatement
                | RudeEditKind::AwaitShapeChange
                | RudeEditKind::UpdateStaticLocal
        )
    }
}

impl fmt::Display for RudeEditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Parse a code like `"ENC0001"`. Case-insensitive.
impl std::str::FromStr for RudeEditKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|kind| kind.code().eq_ignore_ascii_case(s))
            .copied()
            .ok_or(())
    }
}
