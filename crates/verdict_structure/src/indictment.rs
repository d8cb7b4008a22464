//! Indictments: typed records of structural change.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use verdict_common::TypeName;

use crate::descriptor::CONSTRUCTOR_SELECTOR;

/// One structural fact that changed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Indictment {
    /// Some type's supertype chain changed.
    Hierarchy,
    /// The owner's type-level modifiers changed, or the type appeared or
    /// disappeared.
    TypeShape(TypeName),
    /// A field of the owner was added, removed or changed.
    Field(TypeName, String),
    /// A method of the owner was added, removed or changed. Constructors use
    /// the `<init>` selector.
    Method(TypeName, String, u8),
    /// The owner's abstract contract changed.
    AbstractMethodShape(TypeName),
}

impl Indictment {
    /// The type the indictment is about, if it names one.
    pub fn owner(&self) -> Option<&TypeName> {
        match self {
            Indictment::Hierarchy => None,
            Indictment::TypeShape(owner)
            | Indictment::Field(owner, _)
            | Indictment::Method(owner, _, _)
            | Indictment::AbstractMethodShape(owner) => Some(owner),
        }
    }
}

impl fmt::Display for Indictment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indictment::Hierarchy => write!(f, "hierarchy"),
            Indictment::TypeShape(owner) => write!(f, "shape of {owner}"),
            Indictment::Field(owner, name) => write!(f, "field {owner}.{name}"),
            Indictment::Method(owner, selector, arity) => {
                write!(f, "method {owner}.{selector}/{arity}")
            }
            Indictment::AbstractMethodShape(owner) => write!(f, "abstract contract of {owner}"),
        }
    }
}

/// Indictments aggregated for constant-time lookup per kind.
#[derive(Debug, Clone, Default)]
pub struct IndictmentSet {
    all: BTreeSet<Indictment>,
    hierarchy: bool,
    types: HashSet<TypeName>,
    simple_types: HashSet<String>,
    fields: HashMap<String, BTreeSet<TypeName>>,
    methods: HashMap<(String, u8), BTreeSet<TypeName>>,
    abstract_owners: HashSet<TypeName>,
    constructor_owners: HashSet<TypeName>,
}

impl IndictmentSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an indictment. Returns `false` if it was already present.
    pub fn insert(&mut self, indictment: Indictment) -> bool {
        if self.all.contains(&indictment) {
            return false;
        }
        match &indictment {
            Indictment::Hierarchy => self.hierarchy = true,
            Indictment::TypeShape(owner) => {
                self.simple_types.insert(owner.simple_name().to_string());
                self.types.insert(owner.clone());
            }
            Indictment::Field(owner, name) => {
                self.fields
                    .entry(name.clone())
                    .or_default()
                    .insert(owner.clone());
            }
            Indictment::Method(owner, selector, arity) => {
                if selector == CONSTRUCTOR_SELECTOR {
                    self.constructor_owners.insert(owner.clone());
                }
                self.methods
                    .entry((selector.clone(), *arity))
                    .or_default()
                    .insert(owner.clone());
            }
            Indictment::AbstractMethodShape(owner) => {
                self.abstract_owners.insert(owner.clone());
            }
        }
        self.all.insert(indictment)
    }

    /// Adds every indictment of `other`.
    pub fn merge(&mut self, other: &IndictmentSet) {
        for indictment in &other.all {
            self.insert(indictment.clone());
        }
    }

    /// Number of distinct indictments.
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Returns `true` if nothing was indicted.
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// All indictments in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = &Indictment> {
        self.all.iter()
    }

    /// Returns `true` if a Hierarchy indictment is present.
    pub fn has_hierarchy(&self) -> bool {
        self.hierarchy
    }

    /// Returns `true` if the qualified type has a TypeShape indictment.
    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains(name)
    }

    /// Returns `true` if any TypeShape indictment has this simple name.
    pub fn has_simple_type(&self, simple: &str) -> bool {
        self.simple_types.contains(simple)
    }

    /// Owners with an indicted field of this name.
    pub fn field_owners(&self, name: &str) -> Option<&BTreeSet<TypeName>> {
        self.fields.get(name)
    }

    /// Owners with an indicted method of this selector and arity.
    pub fn method_owners(&self, selector: &str, arity: u8) -> Option<&BTreeSet<TypeName>> {
        self.methods.get(&(selector.to_string(), arity))
    }

    /// Returns `true` if some method with this selector and arity is
    /// indicted, regardless of owner.
    pub fn has_method(&self, selector: &str, arity: u8) -> bool {
        self.method_owners(selector, arity).is_some()
    }

    /// Owners with an AbstractMethodShape indictment.
    pub fn abstract_owners(&self) -> &HashSet<TypeName> {
        &self.abstract_owners
    }

    /// Owners with an indicted constructor.
    pub fn constructor_owners(&self) -> &HashSet<TypeName> {
        &self.constructor_owners
    }

    /// Returns `true` if any constructor is indicted.
    pub fn has_constructor_indictments(&self) -> bool {
        !self.constructor_owners.is_empty()
    }
}

impl Extend<Indictment> for IndictmentSet {
    fn extend<T: IntoIterator<Item = Indictment>>(&mut self, iter: T) {
        for indictment in iter {
            self.insert(indictment);
        }
    }
}

impl FromIterator<Indictment> for IndictmentSet {
    fn from_iter<T: IntoIterator<Item = Indictment>>(iter: T) -> Self {
        let mut set = IndictmentSet::new();
        set.extend(iter);
        set
    }
}

impl PartialEq for IndictmentSet {
    fn eq(&self, other: &Self) -> bool {
        self.all == other.all
    }
}

impl Eq for IndictmentSet {}
