//! Trial outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};
use verdict_common::TypeName;

/// The outcome of trying one unit against an indictment set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// The unit is unaffected.
    Innocent,
    /// The unit must recompile.
    Guilty(Charge),
}

impl Verdict {
    /// Returns `true` for [`Verdict::Guilty`].
    pub fn is_guilty(&self) -> bool {
        matches!(self, Verdict::Guilty(_))
    }

    /// The charge, if guilty.
    pub fn charge(&self) -> Option<&Charge> {
        match self {
            Verdict::Innocent => None,
            Verdict::Guilty(charge) => Some(charge),
        }
    }
}

/// Which check found a unit guilty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Charge {
    /// Some type hierarchy changed during the pass.
    HierarchyChanged,
    /// The unit has no recorded evidence.
    MissingEvidence,
    /// A type reference matched a TypeShape indictment.
    TypeReference(String),
    /// A field reference matched a Field indictment.
    FieldReference(String),
    /// A method reference matched a Method indictment.
    MethodReference(String, u8),
    /// An ambiguous reference matched a Field or TypeShape indictment.
    AmbiguousReference(String),
    /// A declared method overrides or implements an indicted method of a
    /// supertype.
    Override {
        /// The declaring type in the unit.
        declared: TypeName,
        /// The overriding method's selector.
        selector: String,
        /// The overriding method's arity.
        arity: u8,
    },
    /// A concrete declared type inherits from a type whose abstract contract
    /// changed.
    AbstractContract {
        /// The concrete type in the unit.
        declared: TypeName,
        /// The supertype with the changed contract.
        owner: TypeName,
    },
    /// A declared type's direct superclass had a constructor indicted.
    SuperConstructor {
        /// The subclass in the unit.
        declared: TypeName,
        /// Its direct superclass.
        superclass: TypeName,
    },
}

impl fmt::Display for Charge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Charge::HierarchyChanged => write!(f, "a type hierarchy changed"),
            Charge::MissingEvidence => write!(f, "no reference evidence recorded"),
            Charge::TypeReference(name) => write!(f, "references type {name}"),
            Charge::FieldReference(name) => write!(f, "references field {name}"),
            Charge::MethodReference(name, arity) => {
                write!(f, "references method {name}/{arity}")
            }
            Charge::AmbiguousReference(name) => write!(f, "references name {name}"),
            Charge::Override { declared, selector, arity } => {
                write!(f, "{declared} overrides indicted method {selector}/{arity}")
            }
            Charge::AbstractContract { declared, owner } => {
                write!(f, "{declared} inherits the changed abstract contract of {owner}")
            }
            Charge::SuperConstructor { declared, superclass } => {
                write!(f, "{declared} implicitly calls a changed constructor of {superclass}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guilty_carries_charge() {
        let v = Verdict::Guilty(Charge::MethodReference("foo".into(), 0));
        assert!(v.is_guilty());
        assert_eq!(v.charge().map(ToString::to_string).as_deref(), Some("references method foo/0"));
        assert!(!Verdict::Innocent.is_guilty());
        assert!(Verdict::Innocent.charge().is_none());
    }

    #[test]
    fn verdict_serializes() {
        let v = Verdict::Guilty(Charge::SuperConstructor {
            declared: TypeName::new("p.C"),
            superclass: TypeName::new("p.A"),
        });
        let json = serde_json::to_string(&v).expect("serialize");
        let back: Verdict = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, v);
    }
}
