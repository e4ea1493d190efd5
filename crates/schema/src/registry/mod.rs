//! Filesystem-backed schema registry with atomic snapshot publication.
//!
//! Loads one JSON Schema file per panel kind from a directory, keyed by
//! the kind each schema declares. Reloads build a complete new snapshot
//! off to the side and publish it with a single reference swap; a failed
//! pass leaves the previous snapshot serving.

mod core;
mod error;

#[cfg(test)]
mod tests;

pub use self::core::{CompiledSchema, SchemaRegistry, Snapshot};
pub use self::error::{LoadOutcome, LoadStatus, RegistryError, ReloadReport, Result};
