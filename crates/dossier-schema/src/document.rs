//! The report document root.

use serde::{Deserialize, Serialize};

use crate::{
    datapoint::DataPointConfig,
    error::{DossierResult, SchemaError},
    page::{Block, Page},
};

/// A complete report config document.
///
/// The document owns its data points and pages. Everything else refers to
/// them by ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    pub name: String,
    pub data_points: Vec<DataPointConfig>,
    pub pages: Vec<Page>,
    /// ID of the entry page.
    pub main_page: String,
}

impl ReportConfig {
    /// Run every node-level check on an already-typed document.
    ///
    /// Parsing runs the same checks node by node; this entry point covers
    /// documents built in code.
    pub fn schema_issues(&self) -> Vec<SchemaError> {
        let mut issues = Vec::new();

        for (i, dp) in self.data_points.iter().enumerate() {
            issues.extend(dp.check(&format!("dataPoints[{i}]")));
        }

        for (p, page) in self.pages.iter().enumerate() {
            issues.extend(page.check(&format!("pages[{p}]")));
            for (b, block) in page.blocks.iter().enumerate() {
                let block_path = format!("pages[{p}].blocks[{b}]");
                match block {
                    Block::Dashboard(dashboard) => {
                        for (s, segment) in dashboard.segments.iter().enumerate() {
                            for (v, vis) in segment.visualizations.iter().enumerate() {
                                issues.extend(vis.kind.check(&format!(
                                    "{block_path}.segments[{s}].visualizations[{v}]"
                                )));
                            }
                        }
                    }
                    Block::Questionnaire(questionnaire) => {
                        for (s, section) in questionnaire.sections.iter().enumerate() {
                            for (c, card) in section.cards.iter().enumerate() {
                                if card.data_point_ids.is_empty() {
                                    issues.push(SchemaError::EmptyCollection {
                                        path: format!("{block_path}.sections[{s}].cards[{c}]"),
                                        field: "dataPointIDs".to_string(),
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }

        issues
    }

    /// Serialize to canonical, compact JSON.
    pub fn to_json_string(&self) -> DossierResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON for people to read.
    pub fn to_json_pretty(&self) -> DossierResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
