//! Data point definitions.
//!
//! A data point is one declared input of a report. Its `type` selects one of
//! eight variants, each narrowing `valueOptions` (and for some, `value`) to
//! its own contract.

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    date::{parse_dates, DateLike, RangeValue, TimeRange, TimeType},
    error::{SchemaError, ShapeMismatch},
    table::{rows_from_json, TableOptions, TableRow},
};

/// The `type` discriminant of a data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataPointType {
    Text,
    Number,
    Choice,
    Table,
    Address,
    File,
    Time,
    TimeRange,
}

impl DataPointType {
    pub const ALL: [DataPointType; 8] = [
        DataPointType::Text,
        DataPointType::Number,
        DataPointType::Choice,
        DataPointType::Table,
        DataPointType::Address,
        DataPointType::File,
        DataPointType::Time,
        DataPointType::TimeRange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataPointType::Text => "text",
            DataPointType::Number => "number",
            DataPointType::Choice => "choice",
            DataPointType::Table => "table",
            DataPointType::Address => "address",
            DataPointType::File => "file",
            DataPointType::Time => "time",
            DataPointType::TimeRange => "time-range",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl fmt::Display for DataPointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOptions {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub multiline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOptions {
    pub options: Vec<String>,
}

impl ChoiceOptions {
    pub fn check_choice(&self, choice: &str) -> Result<(), ShapeMismatch> {
        if self.options.iter().any(|o| o == choice) {
            Ok(())
        } else {
            Err(ShapeMismatch::NotAnOption {
                value: choice.to_string(),
            })
        }
    }
}

/// `options` must be non-empty and free of duplicates.
pub fn check_options(options: &[String], path: &str) -> Vec<SchemaError> {
    if options.is_empty() {
        return vec![SchemaError::EmptyCollection {
            path: path.to_string(),
            field: "options".to_string(),
        }];
    }

    let mut seen = HashSet::new();
    options
        .iter()
        .filter(|o| !seen.insert(o.as_str()))
        .map(|o| SchemaError::DuplicateEntry {
            path: format!("{path}.options"),
            entry: o.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddressType {
    Full,
    City,
    Country,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressOptions {
    pub address_type: AddressType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOptions {
    /// Accepted file types, e.g. `".pdf,.docx"`.
    pub file_types: String,
}

/// An uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOptions {
    pub time_type: TimeType,
}

/// Variant-specific part of a data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum DataPointKind {
    Text {
        #[serde(default)]
        value_options: TextOptions,
    },
    Number {
        #[serde(default, alias = "valueOption")]
        value_options: NumberOptions,
    },
    Choice {
        value_options: ChoiceOptions,
    },
    Table {
        #[serde(default)]
        value: Vec<TableRow>,
        value_options: TableOptions,
    },
    Address {
        value_options: AddressOptions,
    },
    File {
        #[serde(default)]
        value: Vec<FileRef>,
        value_options: FileOptions,
    },
    Time {
        #[serde(default)]
        value: Vec<DateLike>,
        value_options: TimeOptions,
    },
    TimeRange {
        #[serde(default)]
        value: RangeValue,
        value_options: TimeOptions,
    },
}

impl DataPointKind {
    pub fn data_point_type(&self) -> DataPointType {
        match self {
            DataPointKind::Text { .. } => DataPointType::Text,
            DataPointKind::Number { .. } => DataPointType::Number,
            DataPointKind::Choice { .. } => DataPointType::Choice,
            DataPointKind::Table { .. } => DataPointType::Table,
            DataPointKind::Address { .. } => DataPointType::Address,
            DataPointKind::File { .. } => DataPointType::File,
            DataPointKind::Time { .. } => DataPointType::Time,
            DataPointKind::TimeRange { .. } => DataPointType::TimeRange,
        }
    }
}

/// A declared data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPointConfig {
    /// Unique key referenced by questionnaire cards.
    pub id: String,
    pub label: String,
    /// Whether the point collects a sequence of values instead of one.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub multiple: bool,
    #[serde(flatten)]
    pub kind: DataPointKind,
}

/// The concrete value a data point holds at render time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DataPointValue {
    Number(f64),
    Numbers(Vec<f64>),
    Text(String),
    Texts(Vec<String>),
    Table(Vec<TableRow>),
    Files(Vec<FileRef>),
    Dates(Vec<DateLike>),
    Range(Option<TimeRange>),
}

impl DataPointConfig {
    pub fn data_point_type(&self) -> DataPointType {
        self.kind.data_point_type()
    }

    /// Node-level checks beyond what deserialization enforces.
    pub fn check(&self, path: &str) -> Vec<SchemaError> {
        let options_path = format!("{path}.valueOptions");
        match &self.kind {
            DataPointKind::Choice { value_options } => {
                check_options(&value_options.options, &options_path)
            }
            DataPointKind::Table { value_options, .. } => value_options.check(&options_path),
            DataPointKind::Time { value, value_options } => value
                .iter()
                .enumerate()
                .filter_map(|(i, d)| {
                    d.expect_granularity(value_options.time_type)
                        .err()
                        .map(|reason| SchemaError::InvalidValue {
                            path: format!("{path}.value[{i}]"),
                            reason,
                        })
                })
                .collect(),
            DataPointKind::TimeRange { value, value_options } => value
                .0
                .iter()
                .flat_map(|range| [range.start, range.end])
                .filter_map(|d| d.expect_granularity(value_options.time_type).err())
                .map(|reason| SchemaError::InvalidValue {
                    path: format!("{path}.value"),
                    reason,
                })
                .collect(),
            DataPointKind::Text { .. }
            | DataPointKind::Number { .. }
            | DataPointKind::Address { .. }
            | DataPointKind::File { .. } => Vec::new(),
        }
    }

    /// The value stored in the document itself, for the variants that carry one.
    pub fn stored_value(&self) -> Option<DataPointValue> {
        match &self.kind {
            DataPointKind::Table { value, .. } => Some(DataPointValue::Table(value.clone())),
            DataPointKind::File { value, .. } => Some(DataPointValue::Files(value.clone())),
            DataPointKind::Time { value, .. } => Some(DataPointValue::Dates(value.clone())),
            DataPointKind::TimeRange { value, .. } => Some(DataPointValue::Range(value.0)),
            DataPointKind::Text { .. }
            | DataPointKind::Number { .. }
            | DataPointKind::Choice { .. }
            | DataPointKind::Address { .. } => None,
        }
    }

    /// Replace the stored value with `raw`, converting it to the variant's
    /// value type.
    ///
    /// Only the value's own shape is checked here. Table rows are checked
    /// against their columns at document scope.
    pub fn set_stored_value(&mut self, raw: &Value) -> Result<(), Vec<ShapeMismatch>> {
        match &mut self.kind {
            DataPointKind::Table { value, .. } => *value = rows_from_json(raw)?,
            DataPointKind::File { value, .. } => {
                *value = serde_json::from_value(raw.clone()).map_err(|_| {
                    vec![ShapeMismatch::wrong_type("sequence of {name, url} files", raw)]
                })?
            }
            DataPointKind::Time { value, value_options } => {
                *value = parse_dates(raw, value_options.time_type)?
            }
            DataPointKind::TimeRange { value, value_options } => {
                let dates = parse_dates(raw, value_options.time_type)?;
                *value = RangeValue(TimeRange::from_sequence(&dates).map_err(|e| vec![e])?);
            }
            DataPointKind::Text { .. }
            | DataPointKind::Number { .. }
            | DataPointKind::Choice { .. }
            | DataPointKind::Address { .. } => {
                return Err(vec![ShapeMismatch::wrong_type("no stored value", raw)])
            }
        }
        Ok(())
    }

    /// Check a raw value supplied for this data point and convert it.
    ///
    /// Text, address, number and choice points take a scalar, or an array
    /// when `multiple` is set. Table, file, time and time-range points take
    /// an array whatever `multiple` says.
    pub fn coerce_value(&self, raw: &Value) -> Result<DataPointValue, Vec<ShapeMismatch>> {
        match &self.kind {
            DataPointKind::Text { .. } | DataPointKind::Address { .. } => {
                if self.multiple {
                    strings(raw).map(DataPointValue::Texts).map_err(|e| vec![e])
                } else {
                    string(raw).map(DataPointValue::Text).map_err(|e| vec![e])
                }
            }
            DataPointKind::Number { .. } => {
                if self.multiple {
                    numbers(raw).map(DataPointValue::Numbers).map_err(|e| vec![e])
                } else {
                    number(raw).map(DataPointValue::Number).map_err(|e| vec![e])
                }
            }
            DataPointKind::Choice { value_options } => {
                let chosen = if self.multiple {
                    strings(raw).map_err(|e| vec![e])?
                } else {
                    vec![string(raw).map_err(|e| vec![e])?]
                };
                let errors: Vec<ShapeMismatch> = chosen
                    .iter()
                    .filter_map(|c| value_options.check_choice(c).err())
                    .collect();
                if !errors.is_empty() {
                    return Err(errors);
                }
                Ok(if self.multiple {
                    DataPointValue::Texts(chosen)
                } else {
                    DataPointValue::Text(chosen.into_iter().next().unwrap_or_default())
                })
            }
            DataPointKind::Table { value_options, .. } => {
                let rows = rows_from_json(raw)?;
                let issues: Vec<ShapeMismatch> = value_options
                    .check_rows(&rows)
                    .into_iter()
                    .map(ShapeMismatch::from)
                    .collect();
                if issues.is_empty() {
                    Ok(DataPointValue::Table(rows))
                } else {
                    Err(issues)
                }
            }
            DataPointKind::File { .. } => serde_json::from_value::<Vec<FileRef>>(raw.clone())
                .map(DataPointValue::Files)
                .map_err(|_| vec![ShapeMismatch::wrong_type("sequence of {name, url} files", raw)]),
            DataPointKind::Time { value_options, .. } => {
                parse_dates(raw, value_options.time_type).map(DataPointValue::Dates)
            }
            DataPointKind::TimeRange { value_options, .. } => {
                let dates = parse_dates(raw, value_options.time_type)?;
                TimeRange::from_sequence(&dates)
                    .map(DataPointValue::Range)
                    .map_err(|e| vec![e])
            }
        }
    }
}

fn string(raw: &Value) -> Result<String, ShapeMismatch> {
    raw.as_str()
        .map(str::to_string)
        .ok_or_else(|| ShapeMismatch::wrong_type("string", raw))
}

fn strings(raw: &Value) -> Result<Vec<String>, ShapeMismatch> {
    raw.as_array()
        .and_then(|items| items.iter().map(|i| i.as_str().map(str::to_string)).collect())
        .ok_or_else(|| ShapeMismatch::wrong_type("sequence of strings", raw))
}

fn number(raw: &Value) -> Result<f64, ShapeMismatch> {
    raw.as_f64().ok_or_else(|| ShapeMismatch::wrong_type("number", raw))
}

fn numbers(raw: &Value) -> Result<Vec<f64>, ShapeMismatch> {
    raw.as_array()
        .and_then(|items| items.iter().map(Value::as_f64).collect())
        .ok_or_else(|| ShapeMismatch::wrong_type("sequence of numbers", raw))
}
