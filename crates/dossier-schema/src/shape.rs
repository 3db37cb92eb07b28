//! Value shapes expected by visualizations.
//!
//! Each type converts from a raw `serde_json::Value` and back. The same
//! conversion checks literal values written into a document and values
//! computed by aggregation functions at render time.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::ShapeMismatch;

/// The value under `key` when `map` holds that key and nothing else.
fn sole_entry<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    match map.len() {
        1 => map.get(key),
        _ => None,
    }
}

/// A progress value: `completed` out of `total` steps.
///
/// Accepts `[completed, total]` or `{ "values": [completed, total] }` and
/// writes the latter. The wrapper object takes no other keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct ProgressValue {
    pub completed: f64,
    pub total: f64,
}

impl TryFrom<Value> for ProgressValue {
    type Error = ShapeMismatch;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        let pair = match &raw {
            Value::Object(map) => sole_entry(map, "values"),
            Value::Array(_) => Some(&raw),
            _ => None,
        };
        let wrong = || ShapeMismatch::wrong_type("[completed, total] pair", &raw);

        let (completed, total) = match pair.and_then(Value::as_array).map(Vec::as_slice) {
            Some([c, t]) => (
                c.as_f64().ok_or_else(wrong)?,
                t.as_f64().ok_or_else(wrong)?,
            ),
            _ => return Err(wrong()),
        };

        if completed < 0.0 {
            return Err(ShapeMismatch::Negative {
                field: "completed".to_string(),
                value: completed,
            });
        }
        if total < 0.0 {
            return Err(ShapeMismatch::Negative {
                field: "total".to_string(),
                value: total,
            });
        }
        if completed > total {
            return Err(ShapeMismatch::CompletedExceedsTotal { completed, total });
        }
        Ok(ProgressValue { completed, total })
    }
}

impl From<ProgressValue> for Value {
    fn from(v: ProgressValue) -> Self {
        json!({ "values": [v.completed, v.total] })
    }
}

/// A donut chart fraction in `[0, 1]`.
///
/// Accepts a bare number or `{ "percentValue": x }` and writes the latter.
/// The wrapper object takes no other keys, and `{}` is not a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct DonutValue(pub f64);

impl TryFrom<Value> for DonutValue {
    type Error = ShapeMismatch;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        let fraction = match &raw {
            Value::Number(n) => n.as_f64(),
            Value::Object(map) => sole_entry(map, "percentValue").and_then(Value::as_f64),
            _ => None,
        }
        .ok_or_else(|| ShapeMismatch::wrong_type("fraction between 0 and 1", &raw))?;

        if !(0.0..=1.0).contains(&fraction) {
            return Err(ShapeMismatch::OutOfUnitRange { value: fraction });
        }
        Ok(DonutValue(fraction))
    }
}

impl From<DonutValue> for Value {
    fn from(v: DonutValue) -> Self {
        json!({ "percentValue": v.0 })
    }
}

/// The scalar shown by a text visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum TextValue {
    Number(f64),
    Text(String),
}

impl TryFrom<Value> for TextValue {
    type Error = ShapeMismatch;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        match &raw {
            Value::String(s) => Ok(TextValue::Text(s.clone())),
            Value::Number(n) => n
                .as_f64()
                .map(TextValue::Number)
                .ok_or_else(|| ShapeMismatch::wrong_type("number or string", &raw)),
            other => Err(ShapeMismatch::wrong_type("number or string", other)),
        }
    }
}

impl From<TextValue> for Value {
    fn from(v: TextValue) -> Self {
        match v {
            TextValue::Number(n) => json!(n),
            TextValue::Text(s) => Value::String(s),
        }
    }
}

/// Bars or line points as `[label, value]` pairs,
/// e.g. `[["Berlin", 3.5], ["Cologne", 1.1]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct SeriesValue(pub Vec<(String, f64)>);

impl TryFrom<Value> for SeriesValue {
    type Error = ShapeMismatch;

    fn try_from(raw: Value) -> Result<Self, Self::Error> {
        let items = raw
            .as_array()
            .ok_or_else(|| ShapeMismatch::wrong_type("sequence of [label, value] pairs", &raw))?;

        items
            .iter()
            .enumerate()
            .map(|(index, item)| match item.as_array().map(Vec::as_slice) {
                Some([Value::String(label), value]) => value
                    .as_f64()
                    .map(|v| (label.clone(), v))
                    .ok_or(ShapeMismatch::MalformedPair { index }),
                _ => Err(ShapeMismatch::MalformedPair { index }),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(SeriesValue)
    }
}

impl From<SeriesValue> for Value {
    fn from(v: SeriesValue) -> Self {
        Value::Array(v.0.into_iter().map(|(label, value)| json!([label, value])).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_accepts_both_wire_forms() {
        let bare = ProgressValue::try_from(json!([3, 5])).unwrap();
        let wrapped = ProgressValue::try_from(json!({ "values": [3, 5] })).unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare, ProgressValue { completed: 3.0, total: 5.0 });
    }

    #[test]
    fn progress_rejects_completed_above_total() {
        assert_eq!(
            ProgressValue::try_from(json!([6, 5])).unwrap_err(),
            ShapeMismatch::CompletedExceedsTotal { completed: 6.0, total: 5.0 }
        );
    }

    #[test]
    fn progress_rejects_negatives_and_bad_arity() {
        assert!(matches!(
            ProgressValue::try_from(json!([-1, 5])).unwrap_err(),
            ShapeMismatch::Negative { .. }
        ));
        assert!(matches!(
            ProgressValue::try_from(json!([1, 2, 3])).unwrap_err(),
            ShapeMismatch::WrongType { .. }
        ));
    }

    #[test]
    fn donut_must_be_a_fraction() {
        assert_eq!(DonutValue::try_from(json!(0.38)).unwrap(), DonutValue(0.38));
        assert_eq!(
            DonutValue::try_from(json!({ "percentValue": 1 })).unwrap(),
            DonutValue(1.0)
        );
        assert_eq!(
            DonutValue::try_from(json!(1.2)).unwrap_err(),
            ShapeMismatch::OutOfUnitRange { value: 1.2 }
        );
    }

    #[test]
    fn wrapper_objects_take_only_their_own_key() {
        assert!(matches!(
            ProgressValue::try_from(json!({ "values": [3, 5], "junk": 1 })).unwrap_err(),
            ShapeMismatch::WrongType { .. }
        ));
        assert!(matches!(
            DonutValue::try_from(json!({ "percentValue": 0.5, "label": "x" })).unwrap_err(),
            ShapeMismatch::WrongType { .. }
        ));
        assert!(matches!(
            DonutValue::try_from(json!({})).unwrap_err(),
            ShapeMismatch::WrongType { .. }
        ));
    }

    #[test]
    fn text_value_is_scalar() {
        assert_eq!(TextValue::try_from(json!("42 %")).unwrap(), TextValue::Text("42 %".into()));
        assert_eq!(TextValue::try_from(json!(42)).unwrap(), TextValue::Number(42.0));
        assert!(TextValue::try_from(json!([42])).is_err());
    }

    #[test]
    fn series_reports_the_malformed_pair() {
        assert_eq!(
            SeriesValue::try_from(json!([["Berlin", 3.5], [1.1, "Cologne"]])).unwrap_err(),
            ShapeMismatch::MalformedPair { index: 1 }
        );
        let series = SeriesValue::try_from(json!([["Berlin", 3.5]])).unwrap();
        assert_eq!(Value::from(series), json!([["Berlin", 3.5]]));
    }
}
