//! Configuration types deserialized from `verdict.toml`.

use serde::Deserialize;

/// Default number of units handed to the compiler per batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// The top-level configuration parsed from `verdict.toml`.
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BuilderConfig {
    /// Incremental build settings.
    #[serde(default)]
    pub build: BuildSettings,
}

/// Settings for the incremental build loop.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Maximum number of units compiled per batch.
    pub batch_size: usize,
    /// What to do when the dependency graph contains a cycle.
    pub cycle_policy: CyclePolicy,
    /// Re-run a failed incremental pass as a full build.
    pub full_build_fallback: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            cycle_policy: CyclePolicy::default(),
            full_build_fallback: true,
        }
    }
}

/// Handling of dependency cycles when ordering the graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Order cycle members approximately and report a warning.
    #[default]
    Approximate,
    /// Treat any cycle as a graph integrity violation.
    Reject,
}
