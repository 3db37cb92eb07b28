//! A `ValueResolver` backed by fixed tables.
//!
//! Used by the CLI's values file and by tests. Its JSON form:
//!
//! ```json
//! {
//!   "dataPoints":     { "consent": "yes" },
//!   "visualizations": { "overview/0/0/1": [3, 5] },
//!   "conditions":     { "hasConsent": true },
//!   "placeholders":   { "districtName": "North" }
//! }
//! ```

use std::{collections::BTreeMap, path::Path};

use dossier_schema::{hook::HookName, visualization::VisualizationKey, DossierError, DossierResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::traits::ValueResolver;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaticValues {
    pub data_points: BTreeMap<String, Value>,
    pub visualizations: BTreeMap<VisualizationKey, Value>,
    pub conditions: BTreeMap<HookName, bool>,
    pub placeholders: BTreeMap<HookName, String>,
}

impl StaticValues {
    pub fn from_json_str(json: &str) -> DossierResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> DossierResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| DossierError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&content)
    }

    pub fn with_data_point(mut self, id: impl Into<String>, value: Value) -> Self {
        self.data_points.insert(id.into(), value);
        self
    }

    pub fn with_visualization(mut self, key: VisualizationKey, value: Value) -> Self {
        self.visualizations.insert(key, value);
        self
    }

    pub fn with_condition(mut self, hook: impl Into<String>, visible: bool) -> Self {
        self.conditions.insert(HookName::new(hook), visible);
        self
    }

    pub fn with_placeholder(mut self, hook: impl Into<String>, text: impl Into<String>) -> Self {
        self.placeholders.insert(HookName::new(hook), text.into());
        self
    }
}

impl ValueResolver for StaticValues {
    fn data_point_value(&self, id: &str) -> Option<Value> {
        self.data_points.get(id).cloned()
    }

    fn visualization_value(&self, key: &VisualizationKey) -> Option<Value> {
        self.visualizations.get(key).cloned()
    }

    fn evaluate_condition(&self, hook: &HookName) -> Option<bool> {
        self.conditions.get(hook).copied()
    }

    fn resolve_placeholder(&self, hook: &HookName) -> Option<String> {
        self.placeholders.get(hook).cloned()
    }
}
