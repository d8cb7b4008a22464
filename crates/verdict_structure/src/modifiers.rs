//! Modifier bits of types and members.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Access and shape modifiers as recorded by the compiler.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
    pub struct Modifiers: u16 {
        /// Visible everywhere.
        const PUBLIC = 1 << 0;
        /// Visible to subclasses and the namespace.
        const PROTECTED = 1 << 1;
        /// Visible only inside the declaring type.
        const PRIVATE = 1 << 2;
        /// Belongs to the type rather than an instance.
        const STATIC = 1 << 3;
        /// Cannot be overridden, subclassed or reassigned.
        const FINAL = 1 << 4;
        /// Has no implementation.
        const ABSTRACT = 1 << 5;
        /// The type is an interface.
        const INTERFACE = 1 << 6;
        /// Marked deprecated.
        const DEPRECATED = 1 << 7;
        /// Method holds the instance monitor.
        const SYNCHRONIZED = 1 << 8;
        /// Method is implemented natively.
        const NATIVE = 1 << 9;
        /// Field is not serialized.
        const TRANSIENT = 1 << 10;
        /// Field has volatile access semantics.
        const VOLATILE = 1 << 11;
        /// Generated by the compiler.
        const SYNTHETIC = 1 << 12;
    }
}

impl Modifiers {
    /// Bits of a type's modifiers that callers can observe.
    const TYPE_SHAPE: Modifiers = Modifiers::PUBLIC
        .union(Modifiers::PROTECTED)
        .union(Modifiers::PRIVATE)
        .union(Modifiers::STATIC)
        .union(Modifiers::FINAL)
        .union(Modifiers::ABSTRACT)
        .union(Modifiers::INTERFACE)
        .union(Modifiers::DEPRECATED);

    /// Bits of a member's modifiers that callers can observe.
    /// `SYNCHRONIZED` and `NATIVE` only affect the implementation.
    const MEMBER_SHAPE: Modifiers = Modifiers::PUBLIC
        .union(Modifiers::PROTECTED)
        .union(Modifiers::PRIVATE)
        .union(Modifiers::STATIC)
        .union(Modifiers::FINAL)
        .union(Modifiers::ABSTRACT)
        .union(Modifiers::DEPRECATED)
        .union(Modifiers::TRANSIENT)
        .union(Modifiers::VOLATILE)
        .union(Modifiers::SYNTHETIC);

    /// The modifier bits compared for a TypeShape indictment.
    pub fn type_shape(self) -> Modifiers {
        self & Self::TYPE_SHAPE
    }

    /// The modifier bits compared for Field and Method indictments.
    pub fn member_shape(self) -> Modifiers {
        self & Self::MEMBER_SHAPE
    }

    /// Returns `true` if the `ABSTRACT` bit is set.
    pub fn is_abstract(self) -> bool {
        self.contains(Modifiers::ABSTRACT)
    }
}
