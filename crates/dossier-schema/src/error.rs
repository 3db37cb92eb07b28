//! Error types for report config documents.
//!
//! Diagnostics come in three families, one per pipeline stage:
//!
//! - `SchemaError`     — a single node is malformed (raised while parsing)
//! - `ValidationError` — a document-scope problem (dangling or duplicate IDs,
//!   table rows that break their column contracts)
//! - `ShapeMismatch`   — a value violates the shape its variant declares
//!
//! None of these are fatal. They are collected into reports and handed back to
//! the caller. `DossierError` is the error type of operations that cannot
//! produce a result at all.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A problem with a single node of the document.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaError {
    /// The `type` discriminant names no known variant of its family.
    #[error("{path}: unknown {family} type '{found}'")]
    UnknownVariant {
        path: String,
        family: String,
        found: String,
    },

    /// A required field is absent.
    #[error("{path}: missing required field '{field}'")]
    MissingField { path: String, field: String },

    /// A field that belongs to no member of the node's variant.
    #[error("{path}: unexpected field '{field}'")]
    UnexpectedField { path: String, field: String },

    /// A field is present but has the wrong JSON shape.
    #[error("{path}: {message}")]
    InvalidField { path: String, message: String },

    /// A collection that must hold at least one entry is empty.
    #[error("{path}: '{field}' must not be empty")]
    EmptyCollection { path: String, field: String },

    /// A collection that must hold unique entries repeats one.
    #[error("{path}: duplicate entry '{entry}'")]
    DuplicateEntry { path: String, entry: String },

    /// A literal value embedded in the document breaks its shape contract.
    #[error("{path}: invalid value: {reason}")]
    InvalidValue { path: String, reason: ShapeMismatch },
}

/// Which ID namespace a duplicate was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdScope {
    DataPoint,
    Page,
}

impl fmt::Display for IdScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdScope::DataPoint => f.write_str("data point"),
            IdScope::Page => f.write_str("page"),
        }
    }
}

/// A document-scope problem found by the validator.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("mainPage '{main_page}' does not match any page id")]
    DanglingMainPage { main_page: String },

    #[error("{path}: pageLink '{page_link}' does not match any page id")]
    DanglingPageLink { path: String, page_link: String },

    #[error("{path}: data point '{data_point_id}' is not declared")]
    DanglingDataPointRef { path: String, data_point_id: String },

    #[error("data point '{data_point_id}' row {row}: unknown column '{column}'")]
    UnknownTableColumn {
        data_point_id: String,
        row: usize,
        column: String,
    },

    #[error("data point '{data_point_id}' row {row}: '{value}' is not an option of column '{column}'")]
    InvalidChoiceValue {
        data_point_id: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("data point '{data_point_id}' row {row}, column '{column}': {problem}")]
    CellTypeMismatch {
        data_point_id: String,
        row: usize,
        column: String,
        problem: String,
    },

    #[error("data point '{data_point_id}' has {rows} rows but only {labels} named indexes")]
    TooManyNamedRows {
        data_point_id: String,
        rows: usize,
        labels: usize,
    },

    #[error("duplicate {scope} id '{id}'")]
    DuplicateId { scope: IdScope, id: String },
}

/// A value that does not conform to the shape its variant declares.
///
/// Raised for literal values while parsing (wrapped in
/// `SchemaError::InvalidValue`) and for computed values while binding.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeMismatch {
    #[error("expected {expected}, found {found}")]
    WrongType { expected: String, found: String },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: String, value: f64 },

    #[error("completed ({completed}) exceeds total ({total})")]
    CompletedExceedsTotal { completed: f64, total: f64 },

    #[error("{value} is outside [0, 1]")]
    OutOfUnitRange { value: f64 },

    #[error("'{value}' is not one of the declared options")]
    NotAnOption { value: String },

    #[error("entry {index} is not a [label, value] pair")]
    MalformedPair { index: usize },

    #[error("'{value}' is not a date-like value")]
    InvalidDate { value: String },

    #[error("'{value}' does not have {expected} granularity")]
    WrongGranularity { value: String, expected: String },

    #[error("range ends ({end}) before it starts ({start})")]
    ReversedRange { start: String, end: String },

    #[error("row {row}: unknown column '{column}'")]
    UnknownColumn { row: usize, column: String },

    #[error("row {row}, column '{column}': {problem}")]
    Cell {
        row: usize,
        column: String,
        problem: Box<ShapeMismatch>,
    },

    #[error("{rows} rows exceed the {labels} named indexes")]
    TooManyRows { rows: usize, labels: usize },
}

impl ShapeMismatch {
    /// Shorthand for `WrongType`, naming the JSON kind that was found.
    pub fn wrong_type(expected: impl Into<String>, found: &serde_json::Value) -> Self {
        ShapeMismatch::WrongType {
            expected: expected.into(),
            found: json_kind(found).to_string(),
        }
    }
}

/// Name the JSON kind of `value` for diagnostics.
pub fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// The error type for operations that fail outright.
#[derive(Debug, Error)]
pub enum DossierError {
    /// The document failed validation and cannot be bound.
    #[error("document failed validation with {count} issue(s): {summary}")]
    InvalidDocument { count: usize, summary: String },

    /// A settings file is missing or malformed.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// A file could not be read.
    #[error("I/O error on '{path}': {reason}")]
    Io { path: String, reason: String },

    /// A value could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the dossier crates.
pub type DossierResult<T> = Result<T, DossierError>;
