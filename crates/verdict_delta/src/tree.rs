//! The delta tree.

use std::collections::BTreeMap;
use std::fmt;

use verdict_common::{NamespaceName, UnitId};

/// How an element differs between two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeltaKind {
    /// Only in the new state.
    Added,
    /// Only in the old state.
    Removed,
    /// In both, different.
    Changed,
    /// In both, identical.
    Same,
}

impl fmt::Display for DeltaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeltaKind::Added => write!(f, "ADDED"),
            DeltaKind::Removed => write!(f, "REMOVED"),
            DeltaKind::Changed => write!(f, "CHANGED"),
            DeltaKind::Same => write!(f, "SAME"),
        }
    }
}

/// The three top-level branches of a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeltaCategory {
    /// Namespace membership.
    Namespaces,
    /// Structural change of the units' types.
    Types,
    /// Checksum change of units whose types kept their shape.
    Binaries,
}

impl DeltaCategory {
    /// All categories in tree order.
    pub const ALL: [DeltaCategory; 3] = [
        DeltaCategory::Namespaces,
        DeltaCategory::Types,
        DeltaCategory::Binaries,
    ];

    /// The path segment naming this category.
    pub fn as_str(self) -> &'static str {
        match self {
            DeltaCategory::Namespaces => "namespaces",
            DeltaCategory::Types => "types",
            DeltaCategory::Binaries => "binaries",
        }
    }

    /// Parses a path segment.
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == segment)
    }
}

/// One namespace under a category, with its unit leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDelta {
    /// Tag of the namespace node.
    pub kind: DeltaKind,
    /// Unit leaves.
    pub units: BTreeMap<UnitId, DeltaKind>,
}

impl NamespaceDelta {
    /// Derives the namespace tag from its leaves unless it was added or
    /// removed outright.
    pub(crate) fn from_units(units: BTreeMap<UnitId, DeltaKind>, presence: DeltaKind) -> Self {
        let kind = match presence {
            DeltaKind::Added | DeltaKind::Removed => presence,
            _ if units.values().any(|k| *k != DeltaKind::Same) => DeltaKind::Changed,
            _ => DeltaKind::Same,
        };
        Self { kind, units }
    }
}

/// A non-`Same` node of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaEntry {
    /// Top-level branch.
    pub category: DeltaCategory,
    /// Namespace node.
    pub namespace: NamespaceName,
    /// Unit leaf, or `None` for the namespace node itself.
    pub unit: Option<UnitId>,
    /// The tag.
    pub kind: DeltaKind,
}

/// Root of the delta tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    categories: BTreeMap<DeltaCategory, BTreeMap<NamespaceName, NamespaceDelta>>,
}

impl Delta {
    pub(crate) fn insert(
        &mut self,
        category: DeltaCategory,
        namespace: NamespaceName,
        node: NamespaceDelta,
    ) {
        self.categories.entry(category).or_default().insert(namespace, node);
    }

    /// Namespaces under a category.
    pub fn category(
        &self,
        category: DeltaCategory,
    ) -> Option<&BTreeMap<NamespaceName, NamespaceDelta>> {
        self.categories.get(&category)
    }

    /// Tag of a namespace node, or of one of its unit leaves.
    pub fn get(
        &self,
        category: DeltaCategory,
        namespace: &NamespaceName,
        unit: Option<&UnitId>,
    ) -> Option<DeltaKind> {
        let node = self.categories.get(&category)?.get(namespace)?;
        match unit {
            None => Some(node.kind),
            Some(unit) => node.units.get(unit).copied(),
        }
    }

    /// Looks up a node by path: `[category]`, `[category, namespace]` or
    /// `[category, namespace, unit]`. A category node is `Changed` if anything
    /// under it changed.
    pub fn lookup(&self, path: &[&str]) -> Option<DeltaKind> {
        let (first, rest) = path.split_first()?;
        let category = DeltaCategory::from_segment(first)?;
        match rest {
            [] => {
                let namespaces = self.categories.get(&category)?;
                let changed = namespaces.values().any(|n| n.kind != DeltaKind::Same);
                Some(if changed { DeltaKind::Changed } else { DeltaKind::Same })
            }
            [namespace] => self.get(category, &NamespaceName::new(*namespace), None),
            [namespace, unit] => {
                let unit = UnitId::new(*unit);
                self.get(category, &NamespaceName::new(*namespace), Some(&unit))
            }
            _ => None,
        }
    }

    /// Every namespace node and unit leaf not tagged `Same`, in tree order.
    pub fn changes(&self) -> impl Iterator<Item = DeltaEntry> + '_ {
        self.categories.iter().flat_map(|(&category, namespaces)| {
            namespaces.iter().flat_map(move |(namespace, node)| {
                let own = (node.kind != DeltaKind::Same).then(|| DeltaEntry {
                    category,
                    namespace: namespace.clone(),
                    unit: None,
                    kind: node.kind,
                });
                let leaves = node
                    .units
                    .iter()
                    .filter(|(_, kind)| **kind != DeltaKind::Same)
                    .map(move |(unit, kind)| DeltaEntry {
                        category,
                        namespace: namespace.clone(),
                        unit: Some(unit.clone()),
                        kind: *kind,
                    });
                own.into_iter().chain(leaves)
            })
        })
    }

    /// Returns `true` if every node is `Same`.
    pub fn is_unchanged(&self) -> bool {
        self.changes().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(entries: &[(&str, DeltaKind)]) -> BTreeMap<UnitId, DeltaKind> {
        entries.iter().map(|(u, k)| (UnitId::new(*u), *k)).collect()
    }

    fn sample() -> Delta {
        let mut delta = Delta::default();
        delta.insert(
            DeltaCategory::Types,
            NamespaceName::new("p"),
            NamespaceDelta::from_units(
                units(&[("p/A.java", DeltaKind::Changed), ("p/B.java", DeltaKind::Same)]),
                DeltaKind::Same,
            ),
        );
        delta.insert(
            DeltaCategory::Binaries,
            NamespaceName::new("p"),
            NamespaceDelta::from_units(units(&[("p/B.java", DeltaKind::Same)]), DeltaKind::Same),
        );
        delta
    }

    #[test]
    fn namespace_tag_follows_leaves() {
        let delta = sample();
        assert_eq!(delta.lookup(&["types", "p"]), Some(DeltaKind::Changed));
        assert_eq!(delta.lookup(&["binaries", "p"]), Some(DeltaKind::Same));
        assert_eq!(delta.lookup(&["types"]), Some(DeltaKind::Changed));
        assert_eq!(delta.lookup(&["binaries"]), Some(DeltaKind::Same));
    }

    #[test]
    fn lookup_by_path() {
        let delta = sample();
        assert_eq!(delta.lookup(&["types", "p", "p/A.java"]), Some(DeltaKind::Changed));
        assert_eq!(delta.lookup(&["types", "p", "p/Z.java"]), None);
        assert_eq!(delta.lookup(&["nonsense"]), None);
        assert_eq!(delta.lookup(&[]), None);
    }

    #[test]
    fn changes_skip_same_nodes() {
        let entries: Vec<DeltaEntry> = sample().changes().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].unit, None);
        assert_eq!(entries[1].unit, Some(UnitId::new("p/A.java")));
        assert!(!sample().is_unchanged());
    }

    #[test]
    fn added_namespace_keeps_its_tag() {
        let node =
            NamespaceDelta::from_units(units(&[("q/C.java", DeltaKind::Added)]), DeltaKind::Added);
        assert_eq!(node.kind, DeltaKind::Added);
        assert_eq!(DeltaKind::Added.to_string(), "ADDED");
    }
}
