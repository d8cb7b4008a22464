//! Read access to recorded descriptors.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use verdict_common::TypeName;

use crate::descriptor::TypeDescriptor;

/// Looks up the recorded descriptor of a type by name.
pub trait TypeLookup {
    /// Returns the descriptor recorded for `name`, if any.
    fn lookup(&self, name: &TypeName) -> Option<&TypeDescriptor>;
}

impl TypeLookup for BTreeMap<TypeName, Arc<TypeDescriptor>> {
    fn lookup(&self, name: &TypeName) -> Option<&TypeDescriptor> {
        self.get(name).map(|d| d.as_ref())
    }
}

/// Every transitive supertype of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupertypeClosure {
    /// The type itself plus its transitive superclasses and interfaces.
    pub types: BTreeSet<TypeName>,
    /// `false` if some supertype had no recorded descriptor, so the walk
    /// stopped early on that branch.
    pub complete: bool,
}

impl SupertypeClosure {
    /// Returns `true` if `name` is in the closure.
    pub fn contains(&self, name: &TypeName) -> bool {
        self.types.contains(name)
    }
}

/// Computes the supertype closure of `descriptor`.
pub fn supertype_closure<L: TypeLookup + ?Sized>(
    lookup: &L,
    descriptor: &TypeDescriptor,
) -> SupertypeClosure {
    let mut types = BTreeSet::new();
    types.insert(descriptor.name.clone());
    let mut complete = true;
    let mut stack: Vec<&TypeName> = descriptor.supertypes().collect();
    while let Some(name) = stack.pop() {
        if !types.insert(name.clone()) {
            continue;
        }
        match lookup.lookup(name) {
            Some(supertype) => stack.extend(supertype.supertypes()),
            None => complete = false,
        }
    }
    SupertypeClosure { types, complete }
}
