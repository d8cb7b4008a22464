//! The incremental build orchestrator.
//!
//! A [`Builder`] derives a new [`BuildState`](verdict_state::BuildState)
//! from an old one and a [`ChangedLocations`] set. It recompiles added and
//! changed units through the host's [`Compiler`], compares the descriptors
//! they produce with the recorded ones, tries every dependent against the
//! resulting indictments and keeps compiling guilty units until nothing is
//! left. A pass runs through explicit [`Phase`]s on a [`BuildSession`].
//!
//! ```text
//! Idle -> ComputePackageDelta -> ComputeNamespaceIndictments
//!      -> ComputeClassDelta -> Compile(1..n) -> FinalizeDelta -> Done
//! ```

#![warn(missing_docs)]

pub mod builder;
pub mod cancel;
pub mod changes;
pub mod compiler;
pub mod error;
pub mod phase;
pub mod progress;
pub mod queue;
pub mod session;
pub mod summary;

mod analysis;
mod compile;
mod finalize;

pub use builder::{BuildOutcome, Builder};
pub use cancel::CancellationToken;
pub use changes::{ChangedLocations, SourceChange};
pub use compiler::{CompileRequest, CompileResult, Compiler, DependencyRef, ProducedType};
pub use error::BuildError;
pub use phase::Phase;
pub use progress::{ProgressMonitor, ProgressSink};
pub use queue::WorkQueue;
pub use session::BuildSession;
pub use summary::BuildSummary;
