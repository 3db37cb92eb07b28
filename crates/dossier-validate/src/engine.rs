//! Whole-document validator for report configs.
//!
//! `ReportValidator` implements the `DocumentValidator` trait from
//! `dossier-core`. Validation runs in two phases:
//!
//! 1. **Schema**: every node is parsed and checked on its own. All node
//!    errors are collected; if there are any, the document phase is skipped.
//! 2. **Document**: cross-references, ID uniqueness and stored table rows
//!    are checked against the whole document. All problems are collected in
//!    document order so callers see the full set in one pass.

use std::collections::HashSet;

use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info, warn};

use dossier_core::traits::DocumentValidator;
use dossier_schema::{
    datapoint::{DataPointConfig, DataPointKind},
    error::IdScope,
    index::DocumentIndex,
    page::{Block, Page},
    parse_document, parse_document_str,
    table::RowIssue,
    DossierResult, Issue, ReportConfig, SchemaError, ShapeMismatch, ValidationError,
    ValidationReport,
};

use crate::settings::ValidatorSettings;

/// The report config validator.
#[derive(Debug, Clone, Default)]
pub struct ReportValidator {
    settings: ValidatorSettings,
}

impl ReportValidator {
    /// Create a validator with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: ValidatorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    /// Parse and validate a raw document.
    ///
    /// Returns the typed document when both phases pass, or the report with
    /// every issue found otherwise.
    pub fn validate_value(&self, raw: &Value) -> Result<ReportConfig, ValidationReport> {
        let parsed = parse_document(raw, self.settings.parse_options());
        self.finish(parsed)
    }

    /// Parse and validate a document from JSON text.
    pub fn validate_str(&self, json: &str) -> Result<ReportConfig, ValidationReport> {
        let parsed = parse_document_str(json, self.settings.parse_options());
        self.finish(parsed)
    }

    fn finish(
        &self,
        parsed: Result<ReportConfig, Vec<SchemaError>>,
    ) -> Result<ReportConfig, ValidationReport> {
        let doc = match parsed {
            Ok(doc) => doc,
            Err(errors) => return Err(self.schema_report(errors)),
        };

        let report = self.check(&doc);
        if report.passed {
            Ok(doc)
        } else {
            Err(report)
        }
    }

    fn schema_report(&self, errors: Vec<SchemaError>) -> ValidationReport {
        for error in &errors {
            warn!(error = %error, "schema error");
        }
        let mut report = ValidationReport::from_issues(errors.into_iter().map(Issue::from).collect());
        report.truncate(self.settings.max_issues);
        info!(
            issues = report.issues.len(),
            truncated = report.truncated,
            "schema phase failed, document checks skipped"
        );
        report
    }

    /// Run both phases on a typed document.
    fn check(&self, doc: &ReportConfig) -> ValidationReport {
        debug!(document = %doc.name, "validating document");

        // ── Phase 1: Node-level checks ────────────────────────────────────────
        //
        // Parsed documents already passed these; documents built in code may not.
        let schema_errors = doc.schema_issues();
        if !schema_errors.is_empty() {
            return self.schema_report(schema_errors);
        }

        // ── Phase 2: Document-scope checks ───────────────────────────────────
        let errors = self.document_errors(doc);
        for error in &errors {
            warn!(document = %doc.name, error = %error, "validation error");
        }

        let mut report = ValidationReport::from_issues(errors.into_iter().map(Issue::from).collect());
        report.truncate(self.settings.max_issues);
        info!(
            document = %doc.name,
            passed = report.passed,
            issues = report.issues.len(),
            truncated = report.truncated,
            "document validated"
        );
        report
    }

    fn document_errors(&self, doc: &ReportConfig) -> Vec<ValidationError> {
        let index = DocumentIndex::build(doc);
        let mut errors = Vec::new();

        // ── Data points: unique IDs, stored table rows ───────────────────────
        let mut seen = HashSet::new();
        for dp in &doc.data_points {
            if !seen.insert(dp.id.as_str()) {
                errors.push(ValidationError::DuplicateId {
                    scope: IdScope::DataPoint,
                    id: dp.id.clone(),
                });
            }
            errors.extend(table_row_errors(dp));
        }

        // ── Pages: unique IDs ────────────────────────────────────────────────
        let mut seen = HashSet::new();
        for page in &doc.pages {
            if !seen.insert(page.id.as_str()) {
                errors.push(ValidationError::DuplicateId {
                    scope: IdScope::Page,
                    id: page.id.clone(),
                });
            }
        }

        // ── Pages: cross-references ──────────────────────────────────────────
        //
        // Pages are checked independently; collect keeps document order.
        let per_page: Vec<Vec<ValidationError>> = if self.settings.parallel {
            doc.pages
                .par_iter()
                .enumerate()
                .map(|(p, page)| page_errors(p, page, &index))
                .collect()
        } else {
            doc.pages
                .iter()
                .enumerate()
                .map(|(p, page)| page_errors(p, page, &index))
                .collect()
        };
        errors.extend(per_page.into_iter().flatten());

        // ── Main page ────────────────────────────────────────────────────────
        if !index.has_page(&doc.main_page) {
            errors.push(ValidationError::DanglingMainPage {
                main_page: doc.main_page.clone(),
            });
        }

        errors
    }
}

/// Check rows stored in a table data point against its columns.
fn table_row_errors(dp: &DataPointConfig) -> Vec<ValidationError> {
    let DataPointKind::Table {
        value,
        value_options,
    } = &dp.kind
    else {
        return Vec::new();
    };

    debug!(data_point = %dp.id, rows = value.len(), "checking table rows");
    value_options
        .check_rows(value)
        .into_iter()
        .map(|issue| match issue {
            RowIssue::UnknownColumn { row, column } => ValidationError::UnknownTableColumn {
                data_point_id: dp.id.clone(),
                row,
                column,
            },
            RowIssue::Cell {
                row,
                column,
                problem: ShapeMismatch::NotAnOption { value },
            } => ValidationError::InvalidChoiceValue {
                data_point_id: dp.id.clone(),
                row,
                column,
                value,
            },
            RowIssue::Cell { row, column, problem } => ValidationError::CellTypeMismatch {
                data_point_id: dp.id.clone(),
                row,
                column,
                problem: problem.to_string(),
            },
            RowIssue::TooManyRows { rows, labels } => ValidationError::TooManyNamedRows {
                data_point_id: dp.id.clone(),
                rows,
                labels,
            },
        })
        .collect()
}

/// Check every page link and data point reference on one page.
fn page_errors(p: usize, page: &Page, index: &DocumentIndex<'_>) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (b, block) in page.blocks.iter().enumerate() {
        let block_path = format!("pages[{p}].blocks[{b}]");
        match block {
            Block::Dashboard(dashboard) => {
                for (s, segment) in dashboard.segments.iter().enumerate() {
                    if !index.has_page(&segment.page_link) {
                        errors.push(ValidationError::DanglingPageLink {
                            path: format!("{block_path}.segments[{s}]"),
                            page_link: segment.page_link.clone(),
                        });
                    }
                }
            }
            Block::Questionnaire(questionnaire) => {
                for (s, section) in questionnaire.sections.iter().enumerate() {
                    for (c, card) in section.cards.iter().enumerate() {
                        for id in &card.data_point_ids {
                            if !index.has_data_point(id) {
                                errors.push(ValidationError::DanglingDataPointRef {
                                    path: format!("{block_path}.sections[{s}].cards[{c}]"),
                                    data_point_id: id.clone(),
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    debug!(page = %page.id, errors = errors.len(), "page checked");
    errors
}

impl DocumentValidator for ReportValidator {
    /// Run both phases on an already-typed document.
    ///
    /// Never fails: every problem is reported in the returned report.
    fn validate(&self, doc: &ReportConfig) -> DossierResult<ValidationReport> {
        Ok(self.check(doc))
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
