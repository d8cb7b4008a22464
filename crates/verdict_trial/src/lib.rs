//! The indictment trial engine.
//!
//! Given the types a compiled unit declares, the reference evidence recorded
//! at its last successful analysis, and a set of indictments, the
//! [`TrialEngine`] decides whether the unit must recompile.

#![warn(missing_docs)]

pub mod engine;
pub mod verdict;

pub use engine::TrialEngine;
pub use verdict::{Charge, Verdict};
