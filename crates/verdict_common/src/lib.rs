//! Shared foundational types used across the Verdict incremental build engine.
//!
//! This crate provides content hashing for checksums and the element names
//! (types, compiled units, namespaces, source locations) that every other
//! crate keys its tables by.

#![warn(missing_docs)]

pub mod hash;
pub mod names;

pub use hash::ContentHash;
pub use names::{NamespaceName, SourceLocation, TypeName, UnitId};
