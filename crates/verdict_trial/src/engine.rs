//! Trying units against indictments.
//!
//! Checks run in a fixed order and the first one that fires decides the
//! verdict:
//!
//! 0. an empty set acquits; a hierarchy indictment or missing evidence
//!    convicts,
//! 1. direct evidence against the type, field and method tables,
//! 2. declared methods overriding an indicted supertype method,
//! 3. concrete types inheriting a changed abstract contract,
//! 4. implicit calls to an indicted direct superclass constructor.

use std::collections::HashSet;

use tracing::trace;
use verdict_common::names::last_segment;
use verdict_common::TypeName;
use verdict_structure::{
    supertype_closure, IndictmentSet, MethodInfo, Reference, ReferenceKind, TypeDescriptor,
    TypeLookup,
};

use crate::verdict::{Charge, Verdict};

/// Decides whether units must recompile given an indictment set.
///
/// Descriptors of declared types and their supertypes are read through a
/// [`TypeLookup`], normally the build state being assembled.
pub struct TrialEngine<'a> {
    lookup: &'a dyn TypeLookup,
}

impl<'a> TrialEngine<'a> {
    /// Creates an engine reading descriptors from `lookup`.
    pub fn new(lookup: &'a dyn TypeLookup) -> Self {
        Self { lookup }
    }

    /// Tries one unit.
    ///
    /// `declared` lists the types the unit produced at its last compile and
    /// `evidence` its recorded references, or `None` if nothing is recorded.
    pub fn try_unit(
        &self,
        declared: &[TypeName],
        evidence: Option<&[Reference]>,
        indictments: &IndictmentSet,
    ) -> Verdict {
        if indictments.is_empty() {
            return Verdict::Innocent;
        }
        if indictments.has_hierarchy() {
            return Verdict::Guilty(Charge::HierarchyChanged);
        }
        let Some(evidence) = evidence else {
            return Verdict::Guilty(Charge::MissingEvidence);
        };

        let declared: Vec<&TypeDescriptor> = declared
            .iter()
            .filter_map(|name| self.lookup.lookup(name))
            .collect();

        let charge = direct_evidence(evidence, indictments)
            .or_else(|| self.overrides(&declared, indictments))
            .or_else(|| self.abstract_contract(&declared, indictments))
            .or_else(|| super_constructor(&declared, indictments));
        match charge {
            Some(charge) => {
                trace!(%charge, "guilty");
                Verdict::Guilty(charge)
            }
            None => Verdict::Innocent,
        }
    }

    fn overrides(
        &self,
        declared: &[&TypeDescriptor],
        indictments: &IndictmentSet,
    ) -> Option<Charge> {
        for &descriptor in declared {
            let closure = supertype_closure(self.lookup, descriptor);
            for method in self.methods_with_superinterfaces(descriptor) {
                if method.is_constructor() {
                    continue;
                }
                let Some(owners) = indictments.method_owners(&method.selector, method.arity())
                else {
                    continue;
                };
                if !closure.complete || owners.iter().any(|owner| closure.contains(owner)) {
                    return Some(Charge::Override {
                        declared: descriptor.name.clone(),
                        selector: method.selector.clone(),
                        arity: method.arity(),
                    });
                }
            }
        }
        None
    }

    /// Methods declared by `descriptor` and, recursively, by its
    /// superinterfaces.
    fn methods_with_superinterfaces<'d>(
        &'d self,
        descriptor: &'d TypeDescriptor,
    ) -> Vec<&'d MethodInfo> {
        let mut methods: Vec<&MethodInfo> = descriptor.methods.iter().collect();
        let mut visited: HashSet<&TypeName> = HashSet::new();
        let mut stack: Vec<&TypeName> = descriptor.interfaces.iter().collect();
        while let Some(name) = stack.pop() {
            if !visited.insert(name) {
                continue;
            }
            if let Some(interface) = self.lookup.lookup(name) {
                methods.extend(interface.methods.iter());
                stack.extend(interface.interfaces.iter());
            }
        }
        methods
    }

    fn abstract_contract(
        &self,
        declared: &[&TypeDescriptor],
        indictments: &IndictmentSet,
    ) -> Option<Charge> {
        let owners = indictments.abstract_owners();
        if owners.is_empty() {
            return None;
        }
        for &descriptor in declared {
            if descriptor.is_abstract() {
                continue;
            }
            let closure = supertype_closure(self.lookup, descriptor);
            let inherited = closure
                .types
                .iter()
                .filter(|name| **name != descriptor.name)
                .find(|name| owners.contains(*name));
            if let Some(owner) = inherited {
                return Some(Charge::AbstractContract {
                    declared: descriptor.name.clone(),
                    owner: owner.clone(),
                });
            }
        }
        None
    }
}

fn direct_evidence(evidence: &[Reference], indictments: &IndictmentSet) -> Option<Charge> {
    for reference in evidence {
        let name = reference.name.as_str();
        let fired = match reference.kind {
            ReferenceKind::Type => {
                type_indicted(name, indictments).then(|| Charge::TypeReference(name.to_string()))
            }
            ReferenceKind::Field => indictments
                .field_owners(last_segment(name))
                .map(|_| Charge::FieldReference(name.to_string())),
            ReferenceKind::Method { arity } => indictments
                .has_method(last_segment(name), arity)
                .then(|| Charge::MethodReference(name.to_string(), arity)),
            ReferenceKind::Ambiguous => (indictments.field_owners(last_segment(name)).is_some()
                || type_indicted(name, indictments))
            .then(|| Charge::AmbiguousReference(name.to_string())),
        };
        if fired.is_some() {
            return fired;
        }
    }
    None
}

/// Qualified match first, then the simple name against indicted simple
/// names.
fn type_indicted(name: &str, indictments: &IndictmentSet) -> bool {
    if indictments.has_type(name) {
        return true;
    }
    let last = last_segment(name);
    let simple = last.rsplit_once('$').map_or(last, |(_, inner)| inner);
    indictments.has_simple_type(simple)
}

fn super_constructor(declared: &[&TypeDescriptor], indictments: &IndictmentSet) -> Option<Charge> {
    if !indictments.has_constructor_indictments() {
        return None;
    }
    let owners = indictments.constructor_owners();
    declared.iter().find_map(|descriptor| {
        let superclass = descriptor.superclass.as_ref()?;
        owners.contains(superclass).then(|| Charge::SuperConstructor {
            declared: descriptor.name.clone(),
            superclass: superclass.clone(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use verdict_structure::{FieldInfo, Indictment, Modifiers, StructuralComparator};

    type Table = BTreeMap<TypeName, Arc<TypeDescriptor>>;

    fn t(name: &str) -> TypeName {
        TypeName::new(name)
    }

    fn no_args() -> Vec<String> {
        Vec::new()
    }

    fn table(descriptors: Vec<TypeDescriptor>) -> Table {
        descriptors
            .into_iter()
            .map(|d| (d.name.clone(), Arc::new(d)))
            .collect()
    }

    fn set(indictments: Vec<Indictment>) -> IndictmentSet {
        indictments.into_iter().collect()
    }

    fn abstract_method(name: &str) -> MethodInfo {
        MethodInfo::new(name, no_args(), "V")
            .with_modifiers(Modifiers::PUBLIC | Modifiers::ABSTRACT)
    }

    #[test]
    fn empty_set_acquits_even_without_evidence() {
        let types = Table::new();
        let engine = TrialEngine::new(&types);
        assert_eq!(engine.try_unit(&[t("p.B")], None, &IndictmentSet::new()), Verdict::Innocent);
    }

    #[test]
    fn hierarchy_convicts_everyone() {
        let types = Table::new();
        let engine = TrialEngine::new(&types);
        let verdict = engine.try_unit(&[t("p.B")], Some(&[]), &set(vec![Indictment::Hierarchy]));
        assert_eq!(verdict, Verdict::Guilty(Charge::HierarchyChanged));
    }

    #[test]
    fn missing_evidence_convicts() {
        let types = Table::new();
        let engine = TrialEngine::new(&types);
        let indictments = set(vec![Indictment::TypeShape(t("p.X"))]);
        let verdict = engine.try_unit(&[t("p.B")], None, &indictments);
        assert_eq!(verdict, Verdict::Guilty(Charge::MissingEvidence));
    }

    #[test]
    fn removed_method_convicts_caller() {
        let old_a = Arc::new(
            TypeDescriptor::class("p.A")
                .with_method(MethodInfo::new("foo", no_args(), "V"))
                .with_method(MethodInfo::new("keep", no_args(), "V")),
        );
        let new_a = Arc::new(
            TypeDescriptor::class("p.A").with_method(MethodInfo::new("keep", no_args(), "V")),
        );
        let indictments = StructuralComparator::new().compare(Some(&old_a), Some(&new_a));

        let types = table(vec![TypeDescriptor::class("p.B")]);
        let engine = TrialEngine::new(&types);
        let evidence = [Reference::type_ref("p.A"), Reference::method("foo", 0)];
        let verdict = engine.try_unit(&[t("p.B")], Some(&evidence), &indictments);
        assert_eq!(verdict, Verdict::Guilty(Charge::MethodReference("foo".into(), 0)));
    }

    #[test]
    fn method_arity_must_match() {
        let types = table(vec![TypeDescriptor::class("p.B")]);
        let engine = TrialEngine::new(&types);
        let indictments = set(vec![Indictment::Method(t("p.A"), "foo".into(), 1)]);
        let evidence = [Reference::method("foo", 0)];
        assert_eq!(engine.try_unit(&[t("p.B")], Some(&evidence), &indictments), Verdict::Innocent);
    }

    #[test]
    fn subclass_without_evidence_on_change_is_innocent() {
        let old_a = Arc::new(
            TypeDescriptor::class("p.A").with_method(MethodInfo::new("foo", no_args(), "V")),
        );
        let new_a = Arc::new(TypeDescriptor::class("p.A"));
        let indictments = StructuralComparator::new().compare(Some(&old_a), Some(&new_a));

        let types = table(vec![
            TypeDescriptor::class("p.A"),
            TypeDescriptor::class("p.C").extends("p.A"),
        ]);
        let engine = TrialEngine::new(&types);
        let evidence = [Reference::type_ref("p.A")];
        assert_eq!(engine.try_unit(&[t("p.C")], Some(&evidence), &indictments), Verdict::Innocent);
    }

    #[test]
    fn removed_abstract_method_convicts_concrete_subclass() {
        let old_a = Arc::new(TypeDescriptor::class("p.A").with_method(abstract_method("bar")));
        let new_a = Arc::new(TypeDescriptor::class("p.A"));
        let indictments = StructuralComparator::new().compare(Some(&old_a), Some(&new_a));

        let types = table(vec![
            TypeDescriptor::class("p.A"),
            TypeDescriptor::class("p.D").extends("p.A"),
        ]);
        let engine = TrialEngine::new(&types);
        let verdict = engine.try_unit(&[t("p.D")], Some(&[]), &indictments);
        assert_eq!(
            verdict,
            Verdict::Guilty(Charge::AbstractContract { declared: t("p.D"), owner: t("p.A") })
        );
    }

    #[test]
    fn abstract_subclass_is_not_convicted_by_contract() {
        let types = table(vec![
            TypeDescriptor::interface("p.I"),
            TypeDescriptor::class("p.M").implements("p.I").with_modifiers(Modifiers::ABSTRACT),
            TypeDescriptor::class("p.N").extends("p.M"),
        ]);
        let engine = TrialEngine::new(&types);
        let indictments = set(vec![Indictment::AbstractMethodShape(t("p.I"))]);
        assert_eq!(engine.try_unit(&[t("p.M")], Some(&[]), &indictments), Verdict::Innocent);
        assert!(engine.try_unit(&[t("p.N")], Some(&[]), &indictments).is_guilty());
    }

    #[test]
    fn type_reference_matches_qualified_then_simple() {
        let types = table(vec![TypeDescriptor::class("q.B")]);
        let engine = TrialEngine::new(&types);
        let indictments = set(vec![Indictment::TypeShape(t("p.Outer$Inner"))]);
        for name in ["p.Outer$Inner", "Inner", "r.Inner"] {
            let evidence = [Reference::type_ref(name)];
            assert_eq!(
                engine.try_unit(&[t("q.B")], Some(&evidence), &indictments),
                Verdict::Guilty(Charge::TypeReference(name.into())),
                "{name}"
            );
        }
        let evidence = [Reference::type_ref("Outer")];
        assert_eq!(engine.try_unit(&[t("q.B")], Some(&evidence), &indictments), Verdict::Innocent);
    }

    #[test]
    fn field_and_ambiguous_references() {
        let types = table(vec![TypeDescriptor::class("q.B")]);
        let engine = TrialEngine::new(&types);
        let indictments = set(vec![
            Indictment::Field(t("p.A"), "LIMIT".into()),
            Indictment::TypeShape(t("p.Widget")),
        ]);
        let field = [Reference::field("A.LIMIT")];
        assert_eq!(
            engine.try_unit(&[t("q.B")], Some(&field), &indictments),
            Verdict::Guilty(Charge::FieldReference("A.LIMIT".into()))
        );
        let ambiguous_field = [Reference::ambiguous("LIMIT")];
        assert!(engine.try_unit(&[t("q.B")], Some(&ambiguous_field), &indictments).is_guilty());
        let ambiguous_type = [Reference::ambiguous("Widget")];
        assert_eq!(
            engine.try_unit(&[t("q.B")], Some(&ambiguous_type), &indictments),
            Verdict::Guilty(Charge::AmbiguousReference("Widget".into()))
        );
        let unrelated = [Reference::field("OTHER"), Reference::ambiguous("Gadget")];
        assert_eq!(engine.try_unit(&[t("q.B")], Some(&unrelated), &indictments), Verdict::Innocent);
    }

    #[test]
    fn override_of_indicted_supertype_method() {
        let types = table(vec![
            TypeDescriptor::class("p.A").with_method(MethodInfo::new("run", ["I"], "V")),
            TypeDescriptor::class("p.C")
                .extends("p.A")
                .with_method(MethodInfo::new("run", ["I"], "V")),
            TypeDescriptor::class("p.Other").with_method(MethodInfo::new("run", ["I"], "V")),
        ]);
        let engine = TrialEngine::new(&types);
        let indictments = set(vec![Indictment::Method(t("p.A"), "run".into(), 1)]);
        assert_eq!(
            engine.try_unit(&[t("p.C")], Some(&[]), &indictments),
            Verdict::Guilty(Charge::Override {
                declared: t("p.C"),
                selector: "run".into(),
                arity: 1,
            })
        );
        assert_eq!(engine.try_unit(&[t("p.Other")], Some(&[]), &indictments), Verdict::Innocent);
    }

    #[test]
    fn override_with_unknown_supertype_matches_any_owner() {
        let types = table(vec![TypeDescriptor::class("p.C")
            .extends("lib.Base")
            .with_method(MethodInfo::new("run", ["I"], "V"))]);
        let engine = TrialEngine::new(&types);
        let indictments = set(vec![Indictment::Method(t("x.Elsewhere"), "run".into(), 1)]);
        assert!(engine.try_unit(&[t("p.C")], Some(&[]), &indictments).is_guilty());
    }

    #[test]
    fn override_checks_superinterface_methods() {
        let types = table(vec![
            TypeDescriptor::interface("p.I").with_method(abstract_method("close")),
            TypeDescriptor::interface("p.J").implements("p.I"),
            TypeDescriptor::class("p.Base").with_method(MethodInfo::new("close", no_args(), "V")),
            TypeDescriptor::class("p.K").with_modifiers(Modifiers::ABSTRACT).implements("p.J"),
        ]);
        let engine = TrialEngine::new(&types);
        let indictments = set(vec![Indictment::Method(t("p.I"), "close".into(), 0)]);
        assert!(matches!(
            engine.try_unit(&[t("p.K")], Some(&[]), &indictments),
            Verdict::Guilty(Charge::Override { .. })
        ));
    }

    #[test]
    fn implicit_super_constructor_call() {
        let types = table(vec![
            TypeDescriptor::class("p.A").with_field(FieldInfo::new("x", "I")),
            TypeDescriptor::class("p.C").extends("p.A"),
            TypeDescriptor::class("p.E").extends("p.C"),
        ]);
        let engine = TrialEngine::new(&types);
        let indictments = set(vec![Indictment::Method(t("p.A"), "<init>".into(), 0)]);
        assert_eq!(
            engine.try_unit(&[t("p.C")], Some(&[]), &indictments),
            Verdict::Guilty(Charge::SuperConstructor { declared: t("p.C"), superclass: t("p.A") })
        );
        assert_eq!(engine.try_unit(&[t("p.E")], Some(&[]), &indictments), Verdict::Innocent);
    }
}
