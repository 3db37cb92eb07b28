//! Pages and the blocks they are built from.
//!
//! Pages refer to data points and to other pages by ID only. Lookups go
//! through [`crate::index::DocumentIndex`].

use serde::{Deserialize, Serialize};

use crate::{error::SchemaError, hook::HookName, visualization::VisualizationConfig};

/// A navigable page of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Ancestor entity IDs placing the page inside a hierarchical list,
    /// e.g. `["listID1", "listID2"]`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity_path: Vec<String>,
    pub description: String,
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_function: Option<HookName>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub with_navigation: bool,
}

impl Page {
    /// Page-level checks not expressed in the types. Blocks are checked by
    /// their own owners.
    pub fn check(&self, path: &str) -> Vec<SchemaError> {
        check_entity_path(&self.entity_path, path).into_iter().collect()
    }
}

pub(crate) fn check_entity_path(entries: &[String], path: &str) -> Option<SchemaError> {
    entries.iter().any(String::is_empty).then(|| SchemaError::InvalidField {
        path: format!("{path}.entityPath"),
        message: "entity ids must not be empty".to_string(),
    })
}

/// A page section, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Dashboard(DashboardBlock),
    Questionnaire(QuestionnaireBlock),
}

impl Block {
    pub fn name(&self) -> &str {
        match self {
            Block::Dashboard(b) => &b.name,
            Block::Questionnaire(b) => &b.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardBlock {
    pub name: String,
    pub segments: Vec<SegmentConfig>,
}

/// A titled group of visualizations linking to a detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentConfig {
    pub title: String,
    pub visualizations: Vec<VisualizationConfig>,
    /// ID of the page this segment navigates to.
    pub page_link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireBlock {
    pub name: String,
    pub sections: Vec<QuestionnaireSectionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireSectionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub cards: Vec<QuestionnaireCardConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireCardConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "dataPointIDs")]
    pub data_point_ids: Vec<String>,
    /// Predicate deciding whether the card is shown. Evaluated externally;
    /// it never affects structural validity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_condition: Option<HookName>,
}
