//! Declaration kinds.

use std::fmt;

/// Kind tag of a declaration node.
///
/// Matching never pairs nodes whose kinds differ, so a class turned into a
/// struct is a delete of one declaration and an insert of another.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum DeclKind {
    /// Root of a document tree. Exactly one per tree, always matched.
    CompilationUnit,
    Namespace,
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
    /// Standard module (all members implicitly static).
    Module,
    /// One declaration statement sharing type, modifiers and initializer
    /// among its variables (`Dim a, b As T`).
    FieldGroup,
    /// One field variable, standalone or inside a [`DeclKind::FieldGroup`].
    Field,
    EnumMember,
    Property,
    Event,
    Method,
    /// Instance constructor, or static constructor when marked static.
    Constructor,
    Operator,
    /// Native interop declaration (`Declare Function ... Lib "..."`).
    Declare,
    Accessor,
    Parameter,
    TypeParameter,
}

impl DeclKind {
    /// Type declarations (can contain members).
    pub const fn is_type(self) -> bool {
        matches!(
            self,
            DeclKind::Class
                | DeclKind::Struct
                | DeclKind::Interface
                | DeclKind::Enum
                | DeclKind::Delegate
                | DeclKind::Module
        )
    }

    /// Types whose instances are laid out inline.
    pub const fn is_value_type(self) -> bool {
        matches!(self, DeclKind::Struct | DeclKind::Enum)
    }

    /// Direct members of a type.
    pub const fn is_member(self) -> bool {
        matches!(
            self,
            DeclKind::FieldGroup
                | DeclKind::Field
                | DeclKind::EnumMember
                | DeclKind::Property
                | DeclKind::Event
                | DeclKind::Method
                | DeclKind::Constructor
                | DeclKind::Operator
                | DeclKind::Declare
        )
    }

    /// Kinds whose identity always includes a parameter signature.
    /// Properties carry one only when they are indexed.
    pub const fn has_signature(self) -> bool {
        matches!(
            self,
            DeclKind::Method | DeclKind::Constructor | DeclKind::Operator | DeclKind::Declare
        )
    }

    /// Kinds that compile to a method with an executable body.
    pub const fn is_method_like(self) -> bool {
        matches!(
            self,
            DeclKind::Method | DeclKind::Constructor | DeclKind::Operator | DeclKind::Accessor
        )
    }

    /// Kinds that have no identity of their own at runtime and are matched
    /// through their children.
    pub const fn is_grouping(self) -> bool {
        matches!(self, DeclKind::FieldGroup)
    }

    /// Whether `child` may appear directly under a node of this kind.
    pub fn can_contain(self, child: DeclKind) -> bool {
        match self {
            DeclKind::CompilationUnit | DeclKind::Namespace => {
                child == DeclKind::Namespace || child.is_type()
            }
            DeclKind::Class | DeclKind::Struct | DeclKind::Module => {
                child.is_type()
                    || child.is_member()
                    || (child == DeclKind::TypeParameter && self != DeclKind::Module)
            }
            DeclKind::Interface => matches!(
                child,
                DeclKind::Method
                    | DeclKind::Property
                    | DeclKind::Event
                    | DeclKind::TypeParameter
                    | DeclKind::Class
                    | DeclKind::Struct
                    | DeclKind::Interface
                    | DeclKind::Enum
                    | DeclKind::Delegate
            ),
            DeclKind::Enum => child == DeclKind::EnumMember,
            DeclKind::Delegate => {
                matches!(child, DeclKind::Parameter | DeclKind::TypeParameter)
            }
            DeclKind::FieldGroup => child == DeclKind::Field,
            DeclKind::Property => matches!(child, DeclKind::Accessor | DeclKind::Parameter),
            DeclKind::Event => matches!(child, DeclKind::Accessor | DeclKind::Parameter),
            DeclKind::Method | DeclKind::Operator => {
                matches!(child, DeclKind::Parameter | DeclKind::TypeParameter)
            }
            DeclKind::Constructor | DeclKind::Declare | DeclKind::Accessor => {
                child == DeclKind::Parameter
            }
            DeclKind::Field
            | DeclKind::EnumMember
            | DeclKind::Parameter
            | DeclKind::TypeParameter => false,
        }
    }

    /// Label used in diagnostic messages.
    pub const fn label(self) -> &'static str {
        match self {
            DeclKind::CompilationUnit => "compilation unit",
            DeclKind::Namespace => "namespace",
            DeclKind::Class => "class",
            DeclKind::Struct => "structure",
            DeclKind::Interface => "interface",
            DeclKind::Enum => "enum",
            DeclKind::Delegate => "delegate",
            DeclKind::Module => "module",
            DeclKind::FieldGroup => "field declaration",
            DeclKind::Field => "field",
            DeclKind::EnumMember => "enum value",
            DeclKind::Property => "property",
            DeclKind::Event => "event",
            DeclKind::Method => "method",
            DeclKind::Constructor => "constructor",
            DeclKind::Operator => "operator",
            DeclKind::Declare => "Declare statement",
            DeclKind::Accessor => "accessor",
            DeclKind::Parameter => "parameter",
            DeclKind::TypeParameter => "type parameter",
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accessor flavors. The accessor's identity key is its keyword.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AccessorKind {
    Get,
    Set,
    Init,
    AddHandler,
    RemoveHandler,
    RaiseEvent,
}

impl AccessorKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            AccessorKind::Get => "get",
            AccessorKind::Set => "set",
            AccessorKind::Init => "init",
            AccessorKind::AddHandler => "add",
            AccessorKind::RemoveHandler => "remove",
            AccessorKind::RaiseEvent => "raise",
        }
    }
}
