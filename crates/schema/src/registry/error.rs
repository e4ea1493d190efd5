//! Error types and per-file load outcomes for the schema registry.

use std::path::PathBuf;

use serde::Serialize;

/// Errors fatal to a whole load pass. Anything less (a malformed file, a
/// duplicate kind) is a per-file [`LoadOutcome`], not an error.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The schema directory itself could not be enumerated.
    #[error("cannot enumerate schema directory {dir}: {source}")]
    Enumerate {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Outcome of loading a single schema file.
#[derive(Debug, Clone, Serialize)]
pub struct LoadOutcome {
    /// Path to the file.
    pub path: PathBuf,
    /// Status of the load attempt.
    pub status: LoadStatus,
}

/// Status of a single file load attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    /// Schema compiled and registered under its declared kind.
    Loaded { kind: String },
    /// File was not schema content (dotfile, non-JSON extension).
    Skipped { reason: String },
    /// Read, parse, kind-extraction, or compile error.
    Failed { reason: String },
}

/// Aggregated result of one load pass, surfaced to logs and the reload
/// endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadReport {
    /// Kinds registered in the published snapshot, sorted.
    pub kinds: Vec<String>,
    /// Per-file outcomes in the order files were visited.
    pub outcomes: Vec<LoadOutcome>,
}

impl ReloadReport {
    /// Files that contributed nothing to the snapshot.
    pub fn rejected(&self) -> impl Iterator<Item = &LoadOutcome> {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o.status, LoadStatus::Loaded { .. }))
    }
}
