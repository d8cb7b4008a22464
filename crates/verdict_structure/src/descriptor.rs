//! Structural descriptors of compiled types.
//!
//! Descriptors are produced by the compiler and are immutable once recorded;
//! the build state shares them as `Arc<TypeDescriptor>`.

use serde::{Deserialize, Serialize};
use verdict_common::TypeName;

use crate::modifiers::Modifiers;

/// Selector under which constructors are recorded.
pub const CONSTRUCTOR_SELECTOR: &str = "<init>";

/// The externally observable shape of one compiled type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Fully qualified name of the type.
    pub name: TypeName,
    /// Direct superclass, if any.
    pub superclass: Option<TypeName>,
    /// Directly implemented (or extended, for interfaces) interfaces, in
    /// declaration order.
    pub interfaces: Vec<TypeName>,
    /// Type-level modifiers.
    pub modifiers: Modifiers,
    /// Declared fields.
    pub fields: Vec<FieldInfo>,
    /// Declared methods and constructors.
    pub methods: Vec<MethodInfo>,
}

impl TypeDescriptor {
    /// A public class with no supertypes or members.
    pub fn class(name: impl Into<TypeName>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            interfaces: Vec::new(),
            modifiers: Modifiers::PUBLIC,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// A public interface with no supertypes or members.
    pub fn interface(name: impl Into<TypeName>) -> Self {
        let mut descriptor = Self::class(name);
        descriptor.modifiers |= Modifiers::INTERFACE | Modifiers::ABSTRACT;
        descriptor
    }

    /// Sets the direct superclass.
    pub fn extends(mut self, superclass: impl Into<TypeName>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Appends a direct interface.
    pub fn implements(mut self, interface: impl Into<TypeName>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Adds modifier bits.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    /// Appends a field.
    pub fn with_field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends a method.
    pub fn with_method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    /// Returns `true` for interfaces.
    pub fn is_interface(&self) -> bool {
        self.modifiers.contains(Modifiers::INTERFACE)
    }

    /// Returns `true` for abstract classes and interfaces.
    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract() || self.is_interface()
    }

    /// Returns `true` if any declared method is abstract.
    pub fn has_abstract_methods(&self) -> bool {
        self.methods.iter().any(MethodInfo::is_abstract)
    }

    /// Direct supertypes: the superclass followed by the interfaces.
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeName> {
        self.superclass.iter().chain(self.interfaces.iter())
    }

    /// Finds a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Finds a method by selector and parameter descriptors.
    pub fn method(&self, selector: &str, parameters: &[String]) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|m| m.selector == selector && m.parameters == parameters)
    }
}

/// A declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Field name.
    pub name: String,
    /// Type descriptor of the field.
    pub type_signature: String,
    /// Field modifiers.
    pub modifiers: Modifiers,
    /// Compile-time constant value, rendered as text.
    pub constant: Option<String>,
}

impl FieldInfo {
    /// A public field without a constant value.
    pub fn new(name: impl Into<String>, type_signature: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_signature: type_signature.into(),
            modifiers: Modifiers::PUBLIC,
            constant: None,
        }
    }

    /// Replaces the modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Sets the constant value.
    pub fn with_constant(mut self, constant: impl Into<String>) -> Self {
        self.constant = Some(constant.into());
        self
    }
}

/// A declared method or constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    /// Method name, or [`CONSTRUCTOR_SELECTOR`] for constructors.
    pub selector: String,
    /// Parameter type descriptors.
    pub parameters: Vec<String>,
    /// Return type descriptor.
    pub return_type: String,
    /// Method modifiers.
    pub modifiers: Modifiers,
    /// Declared thrown types. Compared as a set.
    pub thrown: Vec<TypeName>,
}

impl MethodInfo {
    /// A public method.
    pub fn new<P: Into<String>>(
        selector: impl Into<String>,
        parameters: impl IntoIterator<Item = P>,
        return_type: impl Into<String>,
    ) -> Self {
        Self {
            selector: selector.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
            return_type: return_type.into(),
            modifiers: Modifiers::PUBLIC,
            thrown: Vec::new(),
        }
    }

    /// A public constructor.
    pub fn constructor<P: Into<String>>(parameters: impl IntoIterator<Item = P>) -> Self {
        Self::new(CONSTRUCTOR_SELECTOR, parameters, "V")
    }

    /// Replaces the modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Appends a thrown type.
    pub fn throws(mut self, thrown: impl Into<TypeName>) -> Self {
        self.thrown.push(thrown.into());
        self
    }

    /// Number of parameters, saturating at `u8::MAX`.
    pub fn arity(&self) -> u8 {
        u8::try_from(self.parameters.len()).unwrap_or(u8::MAX)
    }

    /// Returns `true` for constructors.
    pub fn is_constructor(&self) -> bool {
        self.selector == CONSTRUCTOR_SELECTOR
    }

    /// Returns `true` if the method has no implementation.
    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract()
    }
}
