//! Differences between two build states.
//!
//! [`compute_delta`] compares an old and a new state and produces a
//! [`Delta`] tree:
//!
//! ```text
//! root
//! ├── namespaces / <namespace> / <unit>   membership
//! ├── types      / <namespace> / <unit>   structural change
//! └── binaries   / <namespace> / <unit>   checksum-only change
//! ```
//!
//! Every node is tagged with a [`DeltaKind`].

#![warn(missing_docs)]

pub mod reporter;
pub mod tree;

pub use reporter::compute_delta;
pub use tree::{Delta, DeltaCategory, DeltaEntry, DeltaKind, NamespaceDelta};
