//! Kind-keyed panel schema registry with hot-reload, and the validation
//! pipeline that consumes it.
//!
//! This crate provides:
//! - A thin wrapper over the `jsonschema` evaluator (compile, field lookup,
//!   conformance check with structured violations)
//! - A filesystem-backed registry publishing immutable snapshots with a
//!   single atomic reference swap
//! - A dashboard validator that fails on the first offending panel
//! - A `notify`-based watcher that keeps the registry current with on-disk
//!   schema edits

pub mod engine;
pub mod registry;
pub mod validator;
pub mod watcher;

pub use engine::{EngineError, Violation, Violations};
pub use registry::{
    CompiledSchema, LoadOutcome, LoadStatus, RegistryError, ReloadReport, SchemaRegistry, Snapshot,
};
pub use validator::{PanelFault, Validator};
pub use watcher::{SchemaWatcher, WatchError};
