//! The render model: a validated document with every value resolved.
//!
//! The render model mirrors the document's page/block/segment structure but
//! replaces raw values with `Binding`s, so a renderer never sees a value that
//! breaks its declared shape.

use dossier_schema::{
    datapoint::{DataPointType, DataPointValue},
    hook::HookName,
    visualization::{VisualizationKey, VisualizationType, VisualizationValue},
    DossierResult, ShapeMismatch,
};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// The outcome of resolving one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Binding<T> {
    /// A value that satisfies the entry's shape contract.
    Resolved { value: T },
    /// Neither a computed nor a literal value exists.
    Missing,
    /// The supplied value broke the contract. Only this entry is affected.
    Errored { errors: Vec<ShapeMismatch> },
}

impl<T> Binding<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Binding::Resolved { .. })
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, Binding::Errored { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Binding::Resolved { value } => Some(value),
            Binding::Missing | Binding::Errored { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderModel {
    pub name: String,
    pub main_page: String,
    pub data_points: Vec<RenderDataPoint>,
    pub pages: Vec<RenderPage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderDataPoint {
    pub id: String,
    #[serde(rename = "type")]
    pub data_point_type: DataPointType,
    pub label: String,
    pub multiple: bool,
    pub binding: Binding<DataPointValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPage {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entity_path: Vec<String>,
    pub description: String,
    pub with_navigation: bool,
    /// Text produced by the page's placeholder function, if it resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub blocks: Vec<RenderBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RenderBlock {
    Dashboard {
        name: String,
        segments: Vec<RenderSegment>,
    },
    Questionnaire {
        name: String,
        sections: Vec<RenderSection>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSegment {
    pub title: String,
    pub page_link: String,
    pub visualizations: Vec<RenderVisualization>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderVisualization {
    pub key: VisualizationKey,
    #[serde(rename = "type")]
    pub visualization_type: VisualizationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation_function: Option<HookName>,
    /// The variant's `visualizationOptions`, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
    pub binding: Binding<VisualizationValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub cards: Vec<RenderCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderCard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "dataPointIDs")]
    pub data_point_ids: Vec<String>,
    pub visible: bool,
}

impl RenderModel {
    /// SHA-256 over the model's canonical JSON, as lowercase hex.
    ///
    /// Binding the same document with the same values always yields the same
    /// fingerprint.
    pub fn fingerprint(&self) -> DossierResult<String> {
        let canonical = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Every visualization in document order.
    pub fn visualizations(&self) -> impl Iterator<Item = &RenderVisualization> {
        self.pages
            .iter()
            .flat_map(|p| &p.blocks)
            .filter_map(|b| match b {
                RenderBlock::Dashboard { segments, .. } => Some(segments),
                RenderBlock::Questionnaire { .. } => None,
            })
            .flatten()
            .flat_map(|s| &s.visualizations)
    }

    pub fn visualization(&self, key: &VisualizationKey) -> Option<&RenderVisualization> {
        self.visualizations().find(|v| &v.key == key)
    }

    pub fn data_point(&self, id: &str) -> Option<&RenderDataPoint> {
        self.data_points.iter().find(|d| d.id == id)
    }

    /// Number of entries whose supplied value broke its contract.
    pub fn errored_count(&self) -> usize {
        self.data_points.iter().filter(|d| d.binding.is_errored()).count()
            + self.visualizations().filter(|v| v.binding.is_errored()).count()
    }
}
