//! Reference evidence recorded for a compiled unit.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a symbolic reference was resolved as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// A type name, qualified or simple.
    Type,
    /// A field name.
    Field,
    /// A method selector with its argument count.
    Method {
        /// Number of arguments at the call site.
        arity: u8,
    },
    /// A name that could be a type or a field.
    Ambiguous,
}

/// One symbolic name a unit relied on during its last successful analysis.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// The symbolic name as written or resolved.
    pub name: String,
    /// How the name was used.
    pub kind: ReferenceKind,
}

impl Reference {
    /// A type reference.
    pub fn type_ref(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ReferenceKind::Type }
    }

    /// A field reference.
    pub fn field(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ReferenceKind::Field }
    }

    /// A method reference with the call-site arity.
    pub fn method(name: impl Into<String>, arity: u8) -> Self {
        Self { name: name.into(), kind: ReferenceKind::Method { arity } }
    }

    /// A reference that may be a type or a field.
    pub fn ambiguous(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: ReferenceKind::Ambiguous }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ReferenceKind::Type => write!(f, "type {}", self.name),
            ReferenceKind::Field => write!(f, "field {}", self.name),
            ReferenceKind::Method { arity } => write!(f, "method {}/{}", self.name, arity),
            ReferenceKind::Ambiguous => write!(f, "name {}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_kind() {
        assert_eq!(Reference::type_ref("p.A").to_string(), "type p.A");
        assert_eq!(Reference::field("count").to_string(), "field count");
        assert_eq!(Reference::method("foo", 2).to_string(), "method foo/2");
        assert_eq!(Reference::ambiguous("X").to_string(), "name X");
    }
}
