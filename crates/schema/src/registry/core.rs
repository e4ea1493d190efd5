//! Core [`SchemaRegistry`]: batch loading and atomic snapshot publication.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use jsonschema::Validator;
use serde_json::Value;
use tracing::{info, warn};

use crate::engine::{self, EvalContext, Violations};

use super::error::{LoadOutcome, LoadStatus, RegistryError, ReloadReport, Result};

/// One kind's compiled constraints. Immutable once placed in a snapshot.
#[derive(Debug)]
pub struct CompiledSchema {
    kind: String,
    source: PathBuf,
    checker: Validator,
}

impl CompiledSchema {
    /// The discriminant this schema was registered under.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// File the schema was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Check a panel value against this schema.
    pub fn check(&self, panel: &Value) -> std::result::Result<(), Violations> {
        engine::check(&self.checker, panel)
    }
}

/// One immutable generation of the kind→schema mapping.
#[derive(Debug)]
pub struct Snapshot {
    schemas: HashMap<String, CompiledSchema>,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Look up the schema registered for `kind`.
    pub fn get(&self, kind: &str) -> Option<&CompiledSchema> {
        self.schemas.get(kind)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.schemas.keys().cloned().collect();
        kinds.sort();
        kinds
    }
}

/// Filesystem-backed schema registry.
///
/// A load pass scans the schema directory (non-recursive), compiles every
/// file under one shared evaluation context, and builds a brand-new
/// snapshot off to the side. [`SchemaRegistry::reload`] publishes it with
/// a single reference swap, so concurrent readers only ever see a fully
/// formed generation.
#[derive(Debug)]
pub struct SchemaRegistry {
    schemas_dir: PathBuf,
    /// Live snapshot. Swapped wholesale, never mutated in place.
    snapshot: RwLock<Arc<Snapshot>>,
    /// Serializes load passes so only one reload is in flight.
    reload_guard: Mutex<()>,
}

impl SchemaRegistry {
    /// Create the registry and run the initial load.
    ///
    /// Fails only if the directory cannot be enumerated; the caller treats
    /// that as a startup abort.
    pub fn open(schemas_dir: impl Into<PathBuf>) -> Result<Self> {
        let registry = Self {
            schemas_dir: schemas_dir.into(),
            snapshot: RwLock::new(Arc::new(Snapshot::empty())),
            reload_guard: Mutex::new(()),
        };
        registry.reload()?;
        Ok(registry)
    }

    /// Directory scanned for schema files.
    pub fn schemas_dir(&self) -> &Path {
        &self.schemas_dir
    }

    /// The live snapshot.
    ///
    /// Callers hold one generation for as long as they keep the `Arc`; a
    /// concurrent reload publishes a new generation without touching it.
    pub fn current(&self) -> Arc<Snapshot> {
        self.snapshot.read().expect("snapshot lock poisoned").clone()
    }

    /// Rebuild the snapshot from disk and publish it atomically.
    ///
    /// A failed load pass returns the error and leaves the live snapshot
    /// untouched. Concurrent callers are serialized; the last pass to
    /// complete determines the live snapshot.
    pub fn reload(&self) -> Result<ReloadReport> {
        let _inflight = self.reload_guard.lock().expect("reload guard poisoned");
        let (next, report) = self.load()?;
        *self.snapshot.write().expect("snapshot lock poisoned") = Arc::new(next);
        info!(
            kinds = report.kinds.len(),
            rejected = report.rejected().count(),
            dir = %self.schemas_dir.display(),
            "published schema snapshot"
        );
        Ok(report)
    }

    /// One load pass: enumerate, parse, then compile everything under a
    /// single shared evaluation context.
    fn load(&self) -> Result<(Snapshot, ReloadReport)> {
        let entries = fs::read_dir(&self.schemas_dir).map_err(|source| RegistryError::Enumerate {
            dir: self.schemas_dir.clone(),
            source,
        })?;

        // Sorted so duplicate-kind resolution is deterministic: the first
        // file (by name) to declare a kind wins.
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| RegistryError::Enumerate {
                dir: self.schemas_dir.clone(),
                source,
            })?;
            paths.push(entry.path());
        }
        paths.sort();

        // Phase one: read and parse every candidate file.
        let mut outcomes: Vec<LoadOutcome> = Vec::new();
        let mut parsed: Vec<(PathBuf, String, Value)> = Vec::new();
        for path in paths {
            // Non-recursive scan.
            if path.is_dir() {
                continue;
            }
            let Some(name) = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.to_string())
            else {
                continue;
            };
            if name.starts_with('.') {
                outcomes.push(LoadOutcome {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "dotfile".to_string(),
                    },
                });
                continue;
            }
            let is_json = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "json")
                .unwrap_or(false);
            if !is_json {
                outcomes.push(LoadOutcome {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a JSON schema file".to_string(),
                    },
                });
                continue;
            }

            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read schema file");
                    outcomes.push(LoadOutcome {
                        path,
                        status: LoadStatus::Failed {
                            reason: format!("cannot read file: {e}"),
                        },
                    });
                    continue;
                }
            };
            match engine::compile(&bytes) {
                Ok(value) => parsed.push((path, name.to_string(), value)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse schema file");
                    outcomes.push(LoadOutcome {
                        path,
                        status: LoadStatus::Failed {
                            reason: e.to_string(),
                        },
                    });
                }
            }
        }

        // Phase two: register everything first so cross-schema refs resolve
        // within this generation, then compile each schema.
        let mut context = EvalContext::new();
        for (_, name, value) in &parsed {
            context.register(name, value);
        }

        let mut schemas: HashMap<String, CompiledSchema> = HashMap::new();
        for (path, _name, value) in parsed {
            let kind = match engine::declared_kind(&value) {
                Ok(kind) => kind.to_string(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "schema declares no readable kind");
                    outcomes.push(LoadOutcome {
                        path,
                        status: LoadStatus::Failed {
                            reason: format!("no readable kind: {e}"),
                        },
                    });
                    continue;
                }
            };

            if schemas.contains_key(&kind) {
                warn!(kind = %kind, path = %path.display(), "duplicate kind, keeping first-loaded schema");
                outcomes.push(LoadOutcome {
                    path,
                    status: LoadStatus::Failed {
                        reason: format!("duplicate kind '{kind}'"),
                    },
                });
                continue;
            }

            match context.compile_schema(&value) {
                Ok(checker) => {
                    info!(kind = %kind, path = %path.display(), "loaded schema");
                    outcomes.push(LoadOutcome {
                        path: path.clone(),
                        status: LoadStatus::Loaded { kind: kind.clone() },
                    });
                    schemas.insert(
                        kind.clone(),
                        CompiledSchema {
                            kind,
                            source: path,
                            checker,
                        },
                    );
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to compile schema");
                    outcomes.push(LoadOutcome {
                        path,
                        status: LoadStatus::Failed {
                            reason: e.to_string(),
                        },
                    });
                }
            }
        }

        let mut kinds: Vec<String> = schemas.keys().cloned().collect();
        kinds.sort();
        Ok((Snapshot { schemas }, ReloadReport { kinds, outcomes }))
    }
}
