//! Validation report types.

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, ValidationError};

/// A single problem found while validating a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "error", rename_all = "camelCase")]
pub enum Issue {
    Schema(SchemaError),
    Document(ValidationError),
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Issue::Schema(e) => write!(f, "schema: {e}"),
            Issue::Document(e) => write!(f, "document: {e}"),
        }
    }
}

impl From<SchemaError> for Issue {
    fn from(e: SchemaError) -> Self {
        Issue::Schema(e)
    }
}

impl From<ValidationError> for Issue {
    fn from(e: ValidationError) -> Self {
        Issue::Document(e)
    }
}

/// The outcome of validating one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True only if no issue was found.
    pub passed: bool,
    /// Every issue, in document order. Empty on pass.
    pub issues: Vec<Issue>,
    /// Issues dropped by a configured cap on the report length.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub truncated: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl ValidationReport {
    pub fn passed() -> Self {
        Self {
            passed: true,
            issues: Vec::new(),
            truncated: 0,
        }
    }

    pub fn from_issues(issues: Vec<Issue>) -> Self {
        Self {
            passed: issues.is_empty(),
            issues,
            truncated: 0,
        }
    }

    /// Keep at most `max` issues. Zero means no cap.
    pub fn truncate(&mut self, max: usize) {
        if max > 0 && self.issues.len() > max {
            self.truncated += self.issues.len() - max;
            self.issues.truncate(max);
        }
    }

    /// All schema-stage errors in the report.
    pub fn schema_errors(&self) -> impl Iterator<Item = &SchemaError> {
        self.issues.iter().filter_map(|i| match i {
            Issue::Schema(e) => Some(e),
            Issue::Document(_) => None,
        })
    }

    /// All document-stage errors in the report.
    pub fn validation_errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.issues.iter().filter_map(|i| match i {
            Issue::Document(e) => Some(e),
            Issue::Schema(_) => None,
        })
    }

    /// One-line summary joining every issue.
    pub fn summary(&self) -> String {
        self.issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
