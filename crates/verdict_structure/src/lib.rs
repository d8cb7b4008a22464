//! Structural facts about compiled types and how changes to them are
//! expressed.
//!
//! A [`TypeDescriptor`] records the shape of one compiled type. Comparing two
//! versions of a descriptor with the [`StructuralComparator`] yields an
//! [`IndictmentSet`]: typed records of which structural facts changed.
//! [`Reference`] evidence recorded per compiled unit is later matched
//! against those indictments by the trial engine.

#![warn(missing_docs)]

pub mod compare;
pub mod descriptor;
pub mod evidence;
pub mod indictment;
pub mod lookup;
pub mod modifiers;

pub use compare::StructuralComparator;
pub use descriptor::{FieldInfo, MethodInfo, TypeDescriptor, CONSTRUCTOR_SELECTOR};
pub use evidence::{Reference, ReferenceKind};
pub use indictment::{Indictment, IndictmentSet};
pub use lookup::{supertype_closure, SupertypeClosure, TypeLookup};
pub use modifiers::Modifiers;
