//! The structural comparator: turns two versions of a type into
//! indictments.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::trace;
use verdict_common::TypeName;

use crate::descriptor::{FieldInfo, MethodInfo, TypeDescriptor};
use crate::indictment::{Indictment, IndictmentSet};

/// Compares old and new descriptors of one logical type.
///
/// The comparator remembers every type whose hierarchy it indicted, so a
/// later comparison of a subtype in the same pass also indicts the subtype's
/// hierarchy. Use one comparator per build pass.
#[derive(Debug, Default)]
pub struct StructuralComparator {
    hierarchy_indicted: HashSet<TypeName>,
}

impl StructuralComparator {
    /// Creates a comparator with no hierarchy indictments yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Types whose hierarchy was indicted so far.
    pub fn hierarchy_indicted(&self) -> &HashSet<TypeName> {
        &self.hierarchy_indicted
    }

    /// Compares two versions of a type. `None` means the type is absent on
    /// that side.
    pub fn compare(
        &mut self,
        old: Option<&Arc<TypeDescriptor>>,
        new: Option<&Arc<TypeDescriptor>>,
    ) -> IndictmentSet {
        let mut set = IndictmentSet::new();
        match (old, new) {
            (None, None) => {}
            (Some(present), None) | (None, Some(present)) => {
                indict_everything(present, &mut set);
            }
            (Some(old), Some(new)) if Arc::ptr_eq(old, new) => {}
            (Some(old), Some(new)) => {
                if self.hierarchy_changed(old, new) {
                    self.hierarchy_indicted.insert(new.name.clone());
                    set.insert(Indictment::Hierarchy);
                }
                if old.modifiers.type_shape() != new.modifiers.type_shape() {
                    set.insert(Indictment::TypeShape(new.name.clone()));
                }
                diff_fields(&new.name, &old.fields, &new.fields, &mut set);
                let abstract_changed =
                    diff_methods(&new.name, &old.methods, &new.methods, &mut set);
                if abstract_changed || old.is_abstract() != new.is_abstract() {
                    set.insert(Indictment::AbstractMethodShape(new.name.clone()));
                }
            }
        }
        if !set.is_empty() {
            let name = new.or(old).map(|d| d.name.as_str()).unwrap_or_default();
            trace!(type_name = name, indictments = set.len(), "structural change");
        }
        set
    }

    fn hierarchy_changed(&self, old: &TypeDescriptor, new: &TypeDescriptor) -> bool {
        old.superclass != new.superclass
            || old.interfaces != new.interfaces
            || new.supertypes().any(|t| self.hierarchy_indicted.contains(t))
    }
}

fn indict_everything(descriptor: &TypeDescriptor, set: &mut IndictmentSet) {
    let owner = &descriptor.name;
    set.insert(Indictment::TypeShape(owner.clone()));
    for field in &descriptor.fields {
        set.insert(Indictment::Field(owner.clone(), field.name.clone()));
    }
    for method in &descriptor.methods {
        set.insert(method_indictment(owner, method));
    }
    if descriptor.has_abstract_methods() {
        set.insert(Indictment::AbstractMethodShape(owner.clone()));
    }
}

fn method_indictment(owner: &TypeName, method: &MethodInfo) -> Indictment {
    Indictment::Method(owner.clone(), method.selector.clone(), method.arity())
}

fn diff_fields(owner: &TypeName, old: &[FieldInfo], new: &[FieldInfo], set: &mut IndictmentSet) {
    let old_by_name: HashMap<&str, &FieldInfo> = old.iter().map(|f| (f.name.as_str(), f)).collect();
    let mut seen = HashSet::new();
    for field in new {
        seen.insert(field.name.as_str());
        let changed = match old_by_name.get(field.name.as_str()) {
            None => true,
            Some(previous) => {
                previous.type_signature != field.type_signature
                    || previous.modifiers.member_shape() != field.modifiers.member_shape()
                    || previous.constant != field.constant
            }
        };
        if changed {
            set.insert(Indictment::Field(owner.clone(), field.name.clone()));
        }
    }
    for field in old {
        if !seen.contains(field.name.as_str()) {
            set.insert(Indictment::Field(owner.clone(), field.name.clone()));
        }
    }
}

/// Returns `true` if some method's abstract-ness changed, counting added and
/// removed abstract methods.
fn diff_methods(
    owner: &TypeName,
    old: &[MethodInfo],
    new: &[MethodInfo],
    set: &mut IndictmentSet,
) -> bool {
    let key = |m: &MethodInfo| (m.selector.clone(), m.parameters.clone());
    let old_by_key: HashMap<(String, Vec<String>), &MethodInfo> =
        old.iter().map(|m| (key(m), m)).collect();
    let mut seen = HashSet::new();
    let mut abstract_changed = false;
    for method in new {
        let k = key(method);
        let changed = match old_by_key.get(&k) {
            None => {
                abstract_changed |= method.is_abstract();
                true
            }
            Some(previous) => {
                abstract_changed |= previous.is_abstract() != method.is_abstract();
                previous.return_type != method.return_type
                    || previous.modifiers.member_shape() != method.modifiers.member_shape()
                    || thrown_set(previous) != thrown_set(method)
            }
        };
        if changed {
            set.insert(method_indictment(owner, method));
        }
        seen.insert(k);
    }
    for method in old {
        if !seen.contains(&key(method)) {
            abstract_changed |= method.is_abstract();
            set.insert(method_indictment(owner, method));
        }
    }
    abstract_changed
}

fn thrown_set(method: &MethodInfo) -> BTreeSet<&TypeName> {
    method.thrown.iter().collect()
}
