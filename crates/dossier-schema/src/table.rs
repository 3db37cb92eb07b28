//! Table data points: column cell configs, row values and row checks.
//!
//! Row checks are shared by the validator (for rows stored in the document)
//! and the binder (for rows supplied at render time) so both stages apply the
//! same column contracts.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    date::{DateLike, TimeType},
    datapoint::{check_options, ChoiceOptions, NumberOptions, TextOptions},
    error::{SchemaError, ShapeMismatch},
};

/// A single cell value: a number, a string, or a list of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableCellValue {
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl TableCellValue {
    fn kind(&self) -> &'static str {
        match self {
            TableCellValue::Number(_) => "number",
            TableCellValue::Text(_) => "string",
            TableCellValue::List(_) => "list of strings",
        }
    }

    /// Convert a raw JSON cell, rejecting anything outside the three cell kinds.
    pub fn from_json(raw: &serde_json::Value) -> Result<Self, ShapeMismatch> {
        let wrong = || ShapeMismatch::wrong_type("number, string or list of strings", raw);
        match raw {
            serde_json::Value::Number(n) => n.as_f64().map(TableCellValue::Number).ok_or_else(wrong),
            serde_json::Value::String(s) => Ok(TableCellValue::Text(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(TableCellValue::List)
                .ok_or_else(wrong),
            _ => Err(wrong()),
        }
    }
}

/// One table row keyed by column `field`.
pub type TableRow = BTreeMap<String, TableCellValue>;

/// Options of a time cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeCellOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_type: Option<TimeType>,
}

/// The input a table column collects, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TableCellConfig {
    Text {
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        multiple: bool,
        #[serde(default)]
        value_options: TextOptions,
    },
    Time {
        #[serde(default)]
        value_options: TimeCellOptions,
    },
    Number { value_options: NumberOptions },
    Choice {
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        multiple: bool,
        value_options: ChoiceOptions,
    },
}

impl TableCellConfig {
    /// Check a single cell against this column's contract.
    pub fn check_cell(&self, cell: &TableCellValue) -> Result<(), ShapeMismatch> {
        let wrong = |expected: &str| ShapeMismatch::WrongType {
            expected: expected.to_string(),
            found: cell.kind().to_string(),
        };

        match (self, cell) {
            (TableCellConfig::Text { .. }, TableCellValue::Text(_)) => Ok(()),
            (TableCellConfig::Text { multiple: true, .. }, TableCellValue::List(_)) => Ok(()),
            (TableCellConfig::Text { multiple: true, .. }, _) => Err(wrong("string or list of strings")),
            (TableCellConfig::Text { .. }, _) => Err(wrong("string")),

            (TableCellConfig::Number { .. }, TableCellValue::Number(_)) => Ok(()),
            (TableCellConfig::Number { .. }, _) => Err(wrong("number")),

            (TableCellConfig::Choice { value_options, .. }, TableCellValue::Text(choice)) => {
                value_options.check_choice(choice)
            }
            (TableCellConfig::Choice { multiple: true, value_options }, TableCellValue::List(choices)) => {
                choices.iter().try_for_each(|c| value_options.check_choice(c))
            }
            (TableCellConfig::Choice { multiple: true, .. }, _) => Err(wrong("option or list of options")),
            (TableCellConfig::Choice { .. }, _) => Err(wrong("option")),

            (TableCellConfig::Time { value_options }, TableCellValue::Text(raw)) => {
                let date: DateLike = raw.parse()?;
                match value_options.time_type {
                    Some(expected) => date.expect_granularity(expected),
                    None => Ok(()),
                }
            }
            (TableCellConfig::Time { .. }, _) => Err(wrong("date string")),
        }
    }
}

/// A declared table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    /// Key under which the column's cells appear in each row.
    pub field: String,
    pub header_name: String,
    pub input: TableCellConfig,
}

/// Fixed, pre-seeded named rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedIndexesColumn {
    pub header_name: String,
    pub labels: Vec<String>,
}

/// `valueOptions` of a table data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOptions {
    /// When absent, users may add arbitrary rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_indexes_column: Option<NamedIndexesColumn>,
    pub columns: Vec<TableColumn>,
}

impl TableOptions {
    pub fn column(&self, field: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// Node-level checks: unique column fields, unique named indexes and
    /// well-formed cell options.
    pub fn check(&self, path: &str) -> Vec<SchemaError> {
        let mut errors = Vec::new();

        let mut seen = HashSet::new();
        for (i, column) in self.columns.iter().enumerate() {
            if !seen.insert(column.field.as_str()) {
                errors.push(SchemaError::DuplicateEntry {
                    path: format!("{path}.columns[{i}].field"),
                    entry: column.field.clone(),
                });
            }
            if let TableCellConfig::Choice { value_options, .. } = &column.input {
                errors.extend(check_options(
                    &value_options.options,
                    &format!("{path}.columns[{i}].input.valueOptions"),
                ));
            }
        }

        if let Some(named) = &self.named_indexes_column {
            let mut seen = HashSet::new();
            for label in &named.labels {
                if !seen.insert(label.as_str()) {
                    errors.push(SchemaError::DuplicateEntry {
                        path: format!("{path}.namedIndexesColumn.labels"),
                        entry: label.clone(),
                    });
                }
            }
        }

        errors
    }

    /// Check `rows` against the declared columns.
    ///
    /// Every problem is reported, in row order.
    pub fn check_rows(&self, rows: &[TableRow]) -> Vec<RowIssue> {
        let mut issues = Vec::new();

        for (row, cells) in rows.iter().enumerate() {
            for (field, cell) in cells {
                match self.column(field) {
                    None => issues.push(RowIssue::UnknownColumn {
                        row,
                        column: field.clone(),
                    }),
                    Some(column) => {
                        if let Err(problem) = column.input.check_cell(cell) {
                            issues.push(RowIssue::Cell {
                                row,
                                column: field.clone(),
                                problem,
                            });
                        }
                    }
                }
            }
        }

        if let Some(named) = &self.named_indexes_column {
            if rows.len() > named.labels.len() {
                issues.push(RowIssue::TooManyRows {
                    rows: rows.len(),
                    labels: named.labels.len(),
                });
            }
        }

        issues
    }
}

/// A row-level problem found by [`TableOptions::check_rows`].
#[derive(Debug, Clone, PartialEq)]
pub enum RowIssue {
    UnknownColumn { row: usize, column: String },
    Cell { row: usize, column: String, problem: ShapeMismatch },
    TooManyRows { rows: usize, labels: usize },
}

impl From<RowIssue> for ShapeMismatch {
    fn from(issue: RowIssue) -> Self {
        match issue {
            RowIssue::UnknownColumn { row, column } => ShapeMismatch::UnknownColumn { row, column },
            RowIssue::Cell { row, column, problem } => ShapeMismatch::Cell {
                row,
                column,
                problem: Box::new(problem),
            },
            RowIssue::TooManyRows { rows, labels } => ShapeMismatch::TooManyRows { rows, labels },
        }
    }
}

/// Convert a raw JSON value into table rows.
pub fn rows_from_json(raw: &serde_json::Value) -> Result<Vec<TableRow>, Vec<ShapeMismatch>> {
    let Some(items) = raw.as_array() else {
        return Err(vec![ShapeMismatch::wrong_type("sequence of rows", raw)]);
    };

    let mut rows = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    for (row, item) in items.iter().enumerate() {
        let Some(cells) = item.as_object() else {
            errors.push(ShapeMismatch::wrong_type("row object", item));
            continue;
        };
        let mut parsed = TableRow::new();
        for (column, cell) in cells {
            match TableCellValue::from_json(cell) {
                Ok(value) => {
                    parsed.insert(column.clone(), value);
                }
                Err(problem) => errors.push(ShapeMismatch::Cell {
                    row,
                    column: column.clone(),
                    problem: Box::new(problem),
                }),
            }
        }
        rows.push(parsed);
    }

    if errors.is_empty() {
        Ok(rows)
    } else {
        Err(errors)
    }
}
