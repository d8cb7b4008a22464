//! The change set a host hands to a build pass.

use std::collections::BTreeSet;

use verdict_common::{NamespaceName, SourceLocation};

/// One added or changed source, with its content if the host has it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceChange {
    /// Where the source lives.
    pub location: SourceLocation,
    /// Raw content. `None` means the compiler loads it.
    pub content: Option<String>,
}

impl SourceChange {
    /// A change with content supplied.
    pub fn with_content(location: SourceLocation, content: impl Into<String>) -> Self {
        Self {
            location,
            content: Some(content.into()),
        }
    }

    /// A change whose content the compiler loads on demand.
    pub fn without_content(location: SourceLocation) -> Self {
        Self {
            location,
            content: None,
        }
    }
}

/// Sources added, removed and changed since the previous state, plus
/// archives on the class path whose contents changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangedLocations {
    /// New sources.
    pub added: Vec<SourceChange>,
    /// Deleted sources.
    pub removed: Vec<SourceLocation>,
    /// Edited sources.
    pub changed: Vec<SourceChange>,
    /// Changed archive files, by path.
    pub archives: Vec<String>,
}

impl ChangedLocations {
    /// An empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new source.
    pub fn add(mut self, location: SourceLocation, content: impl Into<String>) -> Self {
        self.added.push(SourceChange::with_content(location, content));
        self
    }

    /// Marks a source as edited.
    pub fn change(mut self, location: SourceLocation, content: impl Into<String>) -> Self {
        self.changed.push(SourceChange::with_content(location, content));
        self
    }

    /// Marks a source as deleted.
    pub fn remove(mut self, location: SourceLocation) -> Self {
        self.removed.push(location);
        self
    }

    /// Marks an archive as changed.
    pub fn archive(mut self, path: impl Into<String>) -> Self {
        self.archives.push(path.into());
        self
    }

    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.changed.is_empty()
            && self.archives.is_empty()
    }

    /// Content supplied for `location`, if any.
    pub fn content_for(&self, location: &SourceLocation) -> Option<&str> {
        self.added
            .iter()
            .chain(&self.changed)
            .find(|c| &c.location == location)
            .and_then(|c| c.content.as_deref())
    }

    /// Every namespace touched by a source change.
    pub fn touched_namespaces(&self) -> BTreeSet<NamespaceName> {
        self.added
            .iter()
            .chain(&self.changed)
            .map(|c| &c.location)
            .chain(&self.removed)
            .map(|loc| loc.namespace.clone())
            .collect()
    }
}
