//! Dashboard validation against the registry's live snapshot.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use panelcheck_core::Dashboard;

use crate::engine::{self, Violations};
use crate::registry::SchemaRegistry;

/// The first offending panel of an invalid dashboard.
///
/// This is the product of a validation run, not an internal failure; it
/// propagates to the boundary verbatim, violation detail included.
#[derive(Debug, Error)]
pub enum PanelFault {
    #[error("panel '{panel}' is missing the required kind discriminant")]
    MissingKind { panel: String },

    #[error("panel '{panel}' declares unknown kind '{kind}'")]
    UnknownKind { panel: String, kind: String },

    #[error("panel '{panel}' does not conform to schema for kind '{kind}':\n{violations}")]
    Mismatch {
        panel: String,
        kind: String,
        violations: Violations,
    },
}

impl PanelFault {
    /// Identifier of the offending panel.
    pub fn panel(&self) -> &str {
        match self {
            PanelFault::MissingKind { panel }
            | PanelFault::UnknownKind { panel, .. }
            | PanelFault::Mismatch { panel, .. } => panel,
        }
    }

    /// Declared kind, when it could be determined.
    pub fn kind(&self) -> Option<&str> {
        match self {
            PanelFault::MissingKind { .. } => None,
            PanelFault::UnknownKind { kind, .. } | PanelFault::Mismatch { kind, .. } => Some(kind),
        }
    }
}

/// Validates dashboards against the current schema snapshot.
#[derive(Clone)]
pub struct Validator {
    registry: Arc<SchemaRegistry>,
}

impl Validator {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    /// Check every panel of `dashboard` against the schema its kind selects.
    ///
    /// The snapshot is captured once at entry, so the whole run is
    /// evaluated against a single generation even if a reload lands
    /// mid-call. Stops at the first failing panel; later panels are not
    /// checked.
    pub fn validate(&self, dashboard: &Dashboard) -> Result<(), PanelFault> {
        let snapshot = self.registry.current();

        for (id, body) in &dashboard.spec.panels {
            let kind = match engine::lookup_string(body, "kind") {
                Ok(kind) => kind,
                Err(e) => {
                    warn!(panel = %id, error = %e, "panel rejected: missing kind discriminant");
                    return Err(PanelFault::MissingKind { panel: id.clone() });
                }
            };

            let Some(schema) = snapshot.get(kind) else {
                warn!(panel = %id, kind = %kind, "panel rejected: no schema registered for kind");
                return Err(PanelFault::UnknownKind {
                    panel: id.clone(),
                    kind: kind.to_string(),
                });
            };

            if let Err(violations) = schema.check(body) {
                warn!(panel = %id, kind = %kind, violations = violations.len(), "panel rejected: schema mismatch");
                return Err(PanelFault::Mismatch {
                    panel: id.clone(),
                    kind: kind.to_string(),
                    violations,
                });
            }

            debug!(panel = %id, kind = %kind, "panel valid");
        }

        info!(
            dashboard = %dashboard.metadata.name,
            panels = dashboard.spec.panels.len(),
            "dashboard valid"
        );
        Ok(())
    }
}
