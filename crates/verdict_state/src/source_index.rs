//! Known sources grouped by namespace.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use verdict_common::{ContentHash, NamespaceName, SourceLocation, UnitId};

/// One known source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Where the source lives.
    pub location: SourceLocation,
    /// Hash of the content last seen for it.
    pub content_hash: ContentHash,
}

/// Namespace -> unit -> source entry, ordered at both levels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceIndex {
    namespaces: BTreeMap<NamespaceName, BTreeMap<UnitId, SourceEntry>>,
}

impl SourceIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records or replaces an entry. Returns the previous one.
    pub fn insert(&mut self, entry: SourceEntry) -> Option<SourceEntry> {
        let unit = entry.location.unit_id();
        self.namespaces
            .entry(entry.location.namespace.clone())
            .or_default()
            .insert(unit, entry)
    }

    /// Removes the entry at `location`. A namespace left empty disappears.
    pub fn remove(&mut self, location: &SourceLocation) -> Option<SourceEntry> {
        let members = self.namespaces.get_mut(&location.namespace)?;
        let removed = members.remove(&location.unit_id());
        if members.is_empty() {
            self.namespaces.remove(&location.namespace);
        }
        removed
    }

    /// Returns the entry at `location`.
    pub fn get(&self, location: &SourceLocation) -> Option<&SourceEntry> {
        self.namespaces
            .get(&location.namespace)?
            .get(&location.unit_id())
    }

    /// Returns `true` if `location` is known.
    pub fn contains(&self, location: &SourceLocation) -> bool {
        self.get(location).is_some()
    }

    /// Members of one namespace.
    pub fn namespace(&self, name: &NamespaceName) -> Option<&BTreeMap<UnitId, SourceEntry>> {
        self.namespaces.get(name)
    }

    /// Returns `true` if the namespace has at least one member.
    pub fn has_namespace(&self, name: &NamespaceName) -> bool {
        self.namespaces.contains_key(name)
    }

    /// Namespace names in order.
    pub fn namespaces(&self) -> impl Iterator<Item = &NamespaceName> {
        self.namespaces.keys()
    }

    /// Every entry, ordered by namespace then unit.
    pub fn entries(&self) -> impl Iterator<Item = &SourceEntry> {
        self.namespaces.values().flat_map(BTreeMap::values)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.namespaces.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` if no sources are known.
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ns: &str, file: &str, content: &str) -> SourceEntry {
        SourceEntry {
            location: SourceLocation::new(ns, file),
            content_hash: ContentHash::from_str_content(content),
        }
    }

    #[test]
    fn insert_groups_by_namespace() {
        let mut index = SourceIndex::new();
        index.insert(entry("p", "A.java", "a"));
        index.insert(entry("p", "B.java", "b"));
        index.insert(entry("q", "C.java", "c"));
        assert_eq!(index.len(), 3);
        let names: Vec<&str> = index.namespaces().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["p", "q"]);
        assert_eq!(index.namespace(&NamespaceName::new("p")).map(BTreeMap::len), Some(2));
    }

    #[test]
    fn insert_replaces_and_returns_previous() {
        let mut index = SourceIndex::new();
        assert!(index.insert(entry("p", "A.java", "v1")).is_none());
        let previous = index.insert(entry("p", "A.java", "v2"));
        assert_eq!(previous.map(|e| e.content_hash), Some(ContentHash::from_str_content("v1")));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn removing_last_member_drops_namespace() {
        let mut index = SourceIndex::new();
        let a = entry("p", "A.java", "a");
        index.insert(a.clone());
        assert!(index.has_namespace(&NamespaceName::new("p")));
        assert_eq!(index.remove(&a.location), Some(a.clone()));
        assert!(!index.has_namespace(&NamespaceName::new("p")));
        assert!(index.is_empty());
        assert!(index.remove(&a.location).is_none());
    }
}
