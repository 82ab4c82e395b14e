//! Runtime capabilities.
//!
//! The attached runtime advertises which kinds of live patches it can apply.
//! The set is read once when a session starts and passed by value into every
//! classification call; nothing in the analysis mutates it.
//!
//! Names match the runtime's advertised capability strings, so
//! [`Capabilities::parse`] accepts the runtime's answer verbatim.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Kinds of live patch the attached runtime supports.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct Capabilities: u16 {
        /// Method body updates. Every runtime that supports patching at all.
        const BASELINE = 1 << 0;
        /// New methods, accessors and constructors in an existing type, and
        /// deletion of non-virtual ones.
        const ADD_METHOD_TO_EXISTING_TYPE = 1 << 1;
        const ADD_STATIC_FIELD_TO_EXISTING_TYPE = 1 << 2;
        const ADD_INSTANCE_FIELD_TO_EXISTING_TYPE = 1 << 3;
        /// New types, including compiler-synthesized closure and state
        /// machine types, and whole-type replacement of reloadable types.
        const NEW_TYPE_DEFINITION = 1 << 4;
        /// Updating custom attribute data baked into metadata.
        const CHANGE_CUSTOM_ATTRIBUTES = 1 << 5;
        /// Inserting, deleting, reordering or retyping parameters.
        const UPDATE_PARAMETERS = 1 << 6;
        const RENAME_PARAMETER = 1 << 7;
    }
}

/// Advertised name of each capability, in bit order.
const NAMES: [(&str, Capabilities); 8] = [
    ("Baseline", Capabilities::BASELINE),
    ("AddMethodToExistingType", Capabilities::ADD_METHOD_TO_EXISTING_TYPE),
    (
        "AddStaticFieldToExistingType",
        Capabilities::ADD_STATIC_FIELD_TO_EXISTING_TYPE,
    ),
    (
        "AddInstanceFieldToExistingType",
        Capabilities::ADD_INSTANCE_FIELD_TO_EXISTING_TYPE,
    ),
    ("NewTypeDefinition", Capabilities::NEW_TYPE_DEFINITION),
    ("ChangeCustomAttributes", Capabilities::CHANGE_CUSTOM_ATTRIBUTES),
    ("UpdateParameters", Capabilities::UPDATE_PARAMETERS),
    ("RenameParameter", Capabilities::RENAME_PARAMETER),
];

impl Capabilities {
    /// Whether every capability in `required` is present.
    #[inline]
    pub const fn has(self, required: Capabilities) -> bool {
        self.contains(required)
    }

    /// The capabilities of `required` this runtime lacks.
    #[inline]
    #[must_use]
    pub const fn missing(self, required: Capabilities) -> Capabilities {
        required.difference(self)
    }

    /// Look up a single capability by its advertised name.
    pub fn from_advertised(name: &str) -> Option<Capabilities> {
        NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, c)| c)
    }

    /// Parse the runtime's answer: capability names separated by whitespace
    /// or commas. Unknown names are skipped; newer runtimes advertise
    /// capabilities this analysis does not know about.
    pub fn parse(text: &str) -> Capabilities {
        text.split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .fold(Capabilities::empty(), |acc, name| {
                match Capabilities::from_advertised(name) {
                    Some(c) => acc | c,
                    None => {
                        tracing::debug!(name, "ignoring unknown runtime capability");
                        acc
                    }
                }
            })
    }

    /// Advertised names of the capabilities in this set, in bit order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        NAMES
            .iter()
            .filter(move |&&(_, c)| self.contains(c))
            .map(|&(n, _)| n)
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.names().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}
