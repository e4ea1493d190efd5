//! Dashboard document model.
//!
//! Fork of the upstream dashboard type with the panel struct left out:
//! panel bodies are kind-dependent, so they stay raw JSON values until the
//! validator matches them against a schema.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A dashboard as received from the caller. Built per-request, discarded
/// after validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: DashboardMetadata,
    pub spec: DashboardSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSpec {
    /// Panels keyed by identifier. A BTreeMap keeps validation order
    /// deterministic across runs.
    #[serde(default)]
    pub panels: BTreeMap<String, Value>,
    /// Default lookback window. Passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layouts: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserialize_full_dashboard() {
        let doc = json!({
            "kind": "Dashboard",
            "metadata": { "name": "node-overview", "project": "infra" },
            "spec": {
                "duration": "1h",
                "panels": {
                    "cpu": { "kind": "Line", "title": "CPU" },
                    "mem": { "kind": "Gauge", "title": "Memory" }
                }
            }
        });

        let dashboard: Dashboard = serde_json::from_value(doc).unwrap();
        assert_eq!(dashboard.kind, "Dashboard");
        assert_eq!(dashboard.metadata.name, "node-overview");
        assert_eq!(dashboard.spec.panels.len(), 2);
        assert_eq!(dashboard.spec.panels["cpu"]["kind"], "Line");
    }

    #[test]
    fn panels_iterate_in_key_order() {
        let doc = json!({
            "spec": {
                "panels": {
                    "zz": { "kind": "Line" },
                    "aa": { "kind": "Line" },
                    "mm": { "kind": "Line" }
                }
            }
        });

        let dashboard: Dashboard = serde_json::from_value(doc).unwrap();
        let ids: Vec<&str> = dashboard.spec.panels.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["aa", "mm", "zz"]);
    }

    #[test]
    fn missing_metadata_defaults() {
        let doc = json!({ "spec": { "panels": {} } });
        let dashboard: Dashboard = serde_json::from_value(doc).unwrap();
        assert!(dashboard.kind.is_empty());
        assert!(dashboard.spec.panels.is_empty());
    }
}
