//! Names of build elements: types, compiled units, namespaces and source
//! locations.
//!
//! All names are plain owned strings behind newtypes so tables keyed by one
//! kind of name cannot be indexed with another. Type and namespace names are
//! dotted (`com.acme.Widget`, `com.acme`); nested types use `$`
//! (`com.acme.Widget$Part`). The default namespace is the empty string.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_name {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a name from anything string-like.
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// Returns the name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self(name.to_string())
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(name)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_name!(
    /// Fully qualified name of a compiled type.
    TypeName
);

string_name!(
    /// Identity of one compiled unit (one source file's worth of output).
    ///
    /// Derived from its [`SourceLocation`] as `namespace/path/File.ext`.
    UnitId
);

string_name!(
    /// Dotted name of a namespace (package). Empty for the default namespace.
    NamespaceName
);

/// Returns the part of a dotted name after its last `.`.
///
/// `"a.b.C"` yields `"C"`, a name without dots is returned unchanged.
pub fn last_segment(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(_, last)| last)
}

/// Returns the part of a dotted name before its last `.`, if any.
pub fn qualifier(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(head, _)| head)
}

impl TypeName {
    /// The simple name: the last dotted segment, with any enclosing type
    /// prefix (`Outer$`) stripped.
    pub fn simple_name(&self) -> &str {
        let last = last_segment(&self.0);
        last.rsplit_once('$').map_or(last, |(_, inner)| inner)
    }

    /// The namespace the type lives in.
    pub fn namespace(&self) -> NamespaceName {
        NamespaceName::new(qualifier(&self.0).unwrap_or(""))
    }
}

impl NamespaceName {
    /// The default (unnamed) namespace.
    pub fn default_namespace() -> Self {
        Self(String::new())
    }

    /// Returns `true` for the default namespace.
    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }

    /// The first dotted segment (`com` for `com.acme.util`).
    pub fn first_segment(&self) -> &str {
        self.0.split('.').next().unwrap_or("")
    }

    /// The last dotted segment (`util` for `com.acme.util`).
    pub fn last_segment(&self) -> &str {
        last_segment(&self.0)
    }

    /// Qualifies a simple type name with this namespace.
    pub fn qualify(&self, simple: &str) -> TypeName {
        if self.is_default() {
            TypeName::new(simple)
        } else {
            TypeName::new(format!("{}.{simple}", self.0))
        }
    }
}

impl UnitId {
    /// The file stem of the unit (`Widget` for `com/acme/Widget.java`).
    pub fn simple_name(&self) -> &str {
        let file = self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, f)| f);
        file.split_once('.').map_or(file, |(stem, _)| stem)
    }
}

/// Where a compiled unit's source lives: its namespace and file name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct SourceLocation {
    /// The namespace that owns the file.
    pub namespace: NamespaceName,
    /// The file name within the namespace (`Widget.java`).
    pub file: String,
}

impl SourceLocation {
    /// Creates a source location.
    pub fn new(namespace: impl Into<NamespaceName>, file: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            file: file.into(),
        }
    }

    /// The compiled-unit identity for this location.
    pub fn unit_id(&self) -> UnitId {
        if self.namespace.is_default() {
            UnitId::new(self.file.clone())
        } else {
            UnitId::new(format!(
                "{}/{}",
                self.namespace.as_str().replace('.', "/"),
                self.file
            ))
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.unit_id())
    }
}
