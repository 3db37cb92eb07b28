//! Visualization definitions and the keys that address them.
//!
//! A visualization never computes its own value. The value comes either from
//! a literal `value` in the document or, at render time, from the external
//! aggregation function named by `aggregationFunction`. Either way it must
//! conform to the shape the variant declares.

use std::{collections::HashSet, fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::{
    error::{SchemaError, ShapeMismatch},
    hook::HookName,
    shape::{DonutValue, ProgressValue, SeriesValue, TextValue},
    table::{rows_from_json, TableCellValue, TableRow},
};

/// The `type` discriminant of a visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VisualizationType {
    Progress,
    BarChart,
    Table,
    DonutChart,
    LineChart,
    Text,
}

impl VisualizationType {
    pub const ALL: [VisualizationType; 6] = [
        VisualizationType::Progress,
        VisualizationType::BarChart,
        VisualizationType::Table,
        VisualizationType::DonutChart,
        VisualizationType::LineChart,
        VisualizationType::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisualizationType::Progress => "progress",
            VisualizationType::BarChart => "barChart",
            VisualizationType::Table => "table",
            VisualizationType::DonutChart => "donutChart",
            VisualizationType::LineChart => "lineChart",
            VisualizationType::Text => "text",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl fmt::Display for VisualizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProgressSize {
    Slim,
    Medium,
    Thick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextSize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BarDirection {
    Horizontal,
    #[default]
    Vertical,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ProgressSize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonutChartOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextVisualizationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<TextSize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChartOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_axis_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_axis_label: Option<String>,
    #[serde(default)]
    pub direction: BarDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChartOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_axis_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_axis_label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnType {
    Text,
    ProgressBar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableVisualizationColumn {
    pub field: String,
    pub header_name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableVisualizationOptions {
    pub columns: Vec<TableVisualizationColumn>,
}

impl TableVisualizationOptions {
    /// Check rows against the declared columns: keys must be declared fields
    /// and `progressBar` cells must be fractions.
    pub fn check_rows(&self, rows: &[TableRow]) -> Vec<ShapeMismatch> {
        let mut issues = Vec::new();
        for (row, cells) in rows.iter().enumerate() {
            for (field, cell) in cells {
                let Some(column) = self.columns.iter().find(|c| &c.field == field) else {
                    issues.push(ShapeMismatch::UnknownColumn {
                        row,
                        column: field.clone(),
                    });
                    continue;
                };
                let problem = match (column.column_type, cell) {
                    (ColumnType::Text, _) => None,
                    (ColumnType::ProgressBar, TableCellValue::Number(n)) if (0.0..=1.0).contains(n) => None,
                    (ColumnType::ProgressBar, TableCellValue::Number(n)) => {
                        Some(ShapeMismatch::OutOfUnitRange { value: *n })
                    }
                    (ColumnType::ProgressBar, _) => Some(ShapeMismatch::WrongType {
                        expected: "fraction between 0 and 1".to_string(),
                        found: "non-numeric cell".to_string(),
                    }),
                };
                if let Some(problem) = problem {
                    issues.push(ShapeMismatch::Cell {
                        row,
                        column: field.clone(),
                        problem: Box::new(problem),
                    });
                }
            }
        }
        issues
    }
}

/// Variant-specific part of a visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum VisualizationKind {
    Progress {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<ProgressValue>,
        #[serde(default)]
        visualization_options: ProgressOptions,
    },
    BarChart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<SeriesValue>,
        #[serde(default)]
        visualization_options: BarChartOptions,
    },
    Table {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Vec<TableRow>>,
        visualization_options: TableVisualizationOptions,
    },
    DonutChart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<DonutValue>,
        #[serde(default)]
        visualization_options: DonutChartOptions,
    },
    LineChart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<SeriesValue>,
        #[serde(default)]
        visualization_options: LineChartOptions,
    },
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<TextValue>,
        #[serde(default)]
        visualization_options: TextVisualizationOptions,
    },
}

/// A shape-checked visualization value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VisualizationValue {
    Progress(ProgressValue),
    Series(SeriesValue),
    Table(Vec<TableRow>),
    Donut(DonutValue),
    Text(TextValue),
}

impl VisualizationKind {
    pub fn visualization_type(&self) -> VisualizationType {
        match self {
            VisualizationKind::Progress { .. } => VisualizationType::Progress,
            VisualizationKind::BarChart { .. } => VisualizationType::BarChart,
            VisualizationKind::Table { .. } => VisualizationType::Table,
            VisualizationKind::DonutChart { .. } => VisualizationType::DonutChart,
            VisualizationKind::LineChart { .. } => VisualizationType::LineChart,
            VisualizationKind::Text { .. } => VisualizationType::Text,
        }
    }

    /// Check `raw` against this variant's value contract and convert it.
    pub fn coerce_value(&self, raw: &Value) -> Result<VisualizationValue, Vec<ShapeMismatch>> {
        let single = |e: ShapeMismatch| vec![e];
        match self {
            VisualizationKind::Progress { .. } => ProgressValue::try_from(raw.clone())
                .map(VisualizationValue::Progress)
                .map_err(single),
            VisualizationKind::BarChart { .. } | VisualizationKind::LineChart { .. } => {
                SeriesValue::try_from(raw.clone())
                    .map(VisualizationValue::Series)
                    .map_err(single)
            }
            VisualizationKind::DonutChart { .. } => DonutValue::try_from(raw.clone())
                .map(VisualizationValue::Donut)
                .map_err(single),
            VisualizationKind::Text { .. } => TextValue::try_from(raw.clone())
                .map(VisualizationValue::Text)
                .map_err(single),
            VisualizationKind::Table {
                visualization_options,
                ..
            } => {
                let rows = rows_from_json(raw)?;
                let issues = visualization_options.check_rows(&rows);
                if issues.is_empty() {
                    Ok(VisualizationValue::Table(rows))
                } else {
                    Err(issues)
                }
            }
        }
    }

    /// Store an already-coerced value as this visualization's literal value.
    ///
    /// Returns `false` when the value belongs to a different variant.
    pub fn set_literal(&mut self, value: VisualizationValue) -> bool {
        match (self, value) {
            (VisualizationKind::Progress { value, .. }, VisualizationValue::Progress(v)) => *value = Some(v),
            (VisualizationKind::BarChart { value, .. }, VisualizationValue::Series(v)) => *value = Some(v),
            (VisualizationKind::LineChart { value, .. }, VisualizationValue::Series(v)) => *value = Some(v),
            (VisualizationKind::Table { value, .. }, VisualizationValue::Table(v)) => *value = Some(v),
            (VisualizationKind::DonutChart { value, .. }, VisualizationValue::Donut(v)) => *value = Some(v),
            (VisualizationKind::Text { value, .. }, VisualizationValue::Text(v)) => *value = Some(v),
            _ => return false,
        }
        true
    }

    /// The literal value written in the document, if any.
    pub fn literal(&self) -> Option<VisualizationValue> {
        match self {
            VisualizationKind::Progress { value, .. } => value.map(VisualizationValue::Progress),
            VisualizationKind::BarChart { value, .. } | VisualizationKind::LineChart { value, .. } => {
                value.clone().map(VisualizationValue::Series)
            }
            VisualizationKind::Table { value, .. } => value.clone().map(VisualizationValue::Table),
            VisualizationKind::DonutChart { value, .. } => value.map(VisualizationValue::Donut),
            VisualizationKind::Text { value, .. } => value.clone().map(VisualizationValue::Text),
        }
    }

    /// Node-level checks beyond what deserialization enforces: unique table
    /// column fields, and literal table rows that match those columns.
    pub fn check(&self, path: &str) -> Vec<SchemaError> {
        let VisualizationKind::Table {
            value,
            visualization_options,
        } = self
        else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut errors: Vec<SchemaError> = visualization_options
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !seen.insert(c.field.as_str()))
            .map(|(i, c)| SchemaError::DuplicateEntry {
                path: format!("{path}.visualizationOptions.columns[{i}].field"),
                entry: c.field.clone(),
            })
            .collect();

        if let Some(rows) = value {
            errors.extend(visualization_options.check_rows(rows).into_iter().map(|reason| {
                SchemaError::InvalidValue {
                    path: format!("{path}.value"),
                    reason,
                }
            }));
        }
        errors
    }
}

/// A visualization inside a dashboard segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationConfig {
    /// External producer of the value. Never invoked by this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation_function: Option<HookName>,
    #[serde(flatten)]
    pub kind: VisualizationKind,
}

/// Position of a visualization within a document.
///
/// Written as `page/block/segment/index`, e.g. `overview/0/1/2`. The page
/// part may itself contain `/`; the three trailing indexes are split off
/// from the right.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualizationKey {
    pub page: String,
    pub block: usize,
    pub segment: usize,
    pub index: usize,
}

impl fmt::Display for VisualizationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.page, self.block, self.segment, self.index)
    }
}

impl FromStr for VisualizationKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(4, '/');
        let mut next_index = |what: &str| -> Result<usize, String> {
            parts
                .next()
                .and_then(|p| p.parse().ok())
                .ok_or_else(|| format!("visualization key '{s}' has no valid {what} index"))
        };
        let index = next_index("visualization")?;
        let segment = next_index("segment")?;
        let block = next_index("block")?;
        let page = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| format!("visualization key '{s}' has no page id"))?;
        Ok(VisualizationKey {
            page: page.to_string(),
            block,
            segment,
            index,
        })
    }
}

impl Serialize for VisualizationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VisualizationKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn visualization(raw: Value) -> VisualizationConfig {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn bar_chart_direction_defaults_to_vertical() {
        let vis = visualization(json!({ "type": "barChart", "visualizationOptions": {} }));
        match vis.kind {
            VisualizationKind::BarChart { visualization_options, .. } => {
                assert_eq!(visualization_options.direction, BarDirection::Vertical)
            }
            other => panic!("expected barChart, got {other:?}"),
        }
    }

    #[test]
    fn aggregation_function_is_kept_as_a_name() {
        let vis = visualization(json!({
            "type": "donutChart",
            "aggregationFunction": "completionRate",
            "visualizationOptions": { "label": "Done" }
        }));
        assert_eq!(vis.aggregation_function, Some(HookName::new("completionRate")));
    }

    #[test]
    fn table_value_keys_must_be_declared_columns() {
        let vis = visualization(json!({
            "type": "table",
            "visualizationOptions": { "columns": [
                { "field": "city", "headerName": "City", "type": "text" },
                { "field": "share", "headerName": "Share", "type": "progressBar" }
            ] }
        }));
        let errors = vis
            .kind
            .coerce_value(&json!([{ "city": "Berlin", "share": 1.5, "extra": "x" }]))
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| matches!(e, ShapeMismatch::UnknownColumn { column, .. } if column == "extra")));
        assert!(errors.iter().any(|e| matches!(e, ShapeMismatch::Cell { column, .. } if column == "share")));
    }

    #[test]
    fn literal_table_rows_are_checked_against_columns() {
        let vis = visualization(json!({
            "type": "table",
            "value": [{ "extra": "x", "share": 7 }],
            "visualizationOptions": { "columns": [
                { "field": "share", "headerName": "Share", "type": "progressBar" }
            ] }
        }));
        let errors = vis.kind.check("pages[0].blocks[0].segments[0].visualizations[0]");
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(
            e,
            SchemaError::InvalidValue { path, .. } if path == "pages[0].blocks[0].segments[0].visualizations[0].value"
        )));
        assert!(errors.iter().any(|e| matches!(
            e,
            SchemaError::InvalidValue { reason: ShapeMismatch::Cell { column, .. }, .. } if column == "share"
        )));
    }

    #[test]
    fn set_literal_rejects_foreign_variants() {
        let mut vis = visualization(json!({ "type": "text" }));
        assert!(!vis.kind.set_literal(VisualizationValue::Donut(DonutValue(0.5))));
        assert!(vis.kind.set_literal(VisualizationValue::Text(TextValue::Number(7.0))));
        assert_eq!(
            vis.kind.literal(),
            Some(VisualizationValue::Text(TextValue::Number(7.0)))
        );
    }

    #[test]
    fn visualization_key_round_trips_through_its_string_form() {
        let key: VisualizationKey = "lists/berlin/0/2/1".parse().unwrap();
        assert_eq!(
            key,
            VisualizationKey { page: "lists/berlin".into(), block: 0, segment: 2, index: 1 }
        );
        assert_eq!(key.to_string(), "lists/berlin/0/2/1");
        assert!("overview/0/x/1".parse::<VisualizationKey>().is_err());
        assert!("0/1/2".parse::<VisualizationKey>().is_err());
    }
}
