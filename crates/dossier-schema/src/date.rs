//! Date-like values and time ranges.
//!
//! A date-like value is a string in one of four granularities, mirroring the
//! `timeType` vocabulary of time data points:
//!
//! | granularity | example                  |
//! |-------------|--------------------------|
//! | `dateTime`  | `2024-05-01T10:00:00Z`   |
//! | `date`      | `2024-05-01`             |
//! | `month`     | `2024-05`                |
//! | `year`      | `2024`                   |

use std::{fmt, str::FromStr};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ShapeMismatch;

/// The granularity a time data point or time cell collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeType {
    DateTime,
    Date,
    Month,
    Year,
}

impl fmt::Display for TimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeType::DateTime => "dateTime",
            TimeType::Date => "date",
            TimeType::Month => "month",
            TimeType::Year => "year",
        })
    }
}

/// A parsed date-like value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLike {
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
    Month { year: i32, month: u32 },
    Year(i32),
}

impl DateLike {
    /// The granularity this value was written in.
    pub fn granularity(&self) -> TimeType {
        match self {
            DateLike::DateTime(_) => TimeType::DateTime,
            DateLike::Date(_) => TimeType::Date,
            DateLike::Month { .. } => TimeType::Month,
            DateLike::Year(_) => TimeType::Year,
        }
    }

    /// The earliest instant the value covers, used to order values of mixed
    /// granularity. Date-times are compared in UTC.
    pub fn earliest(&self) -> NaiveDateTime {
        let date = match self {
            DateLike::DateTime(dt) => return dt.naive_utc(),
            DateLike::Date(d) => *d,
            DateLike::Month { year, month } => {
                NaiveDate::from_ymd_opt(*year, *month, 1).unwrap_or(NaiveDate::MIN)
            }
            DateLike::Year(year) => NaiveDate::from_ymd_opt(*year, 1, 1).unwrap_or(NaiveDate::MIN),
        };
        date.and_time(NaiveTime::MIN)
    }

    /// Check that the value was written with `expected` granularity.
    pub fn expect_granularity(&self, expected: TimeType) -> Result<(), ShapeMismatch> {
        if self.granularity() == expected {
            Ok(())
        } else {
            Err(ShapeMismatch::WrongGranularity {
                value: self.to_string(),
                expected: expected.to_string(),
            })
        }
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for DateLike {
    type Err = ShapeMismatch;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ShapeMismatch::InvalidDate { value: s.to_string() };

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(DateLike::DateTime(dt));
        }

        match s.len() {
            10 => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(DateLike::Date)
                .map_err(|_| invalid()),
            7 => {
                let (year, month) = s.split_once('-').ok_or_else(invalid)?;
                if year.len() != 4 || month.len() != 2 || !all_digits(year) || !all_digits(month) {
                    return Err(invalid());
                }
                let year: i32 = year.parse().map_err(|_| invalid())?;
                let month: u32 = month.parse().map_err(|_| invalid())?;
                if !(1..=12).contains(&month) {
                    return Err(invalid());
                }
                Ok(DateLike::Month { year, month })
            }
            4 if all_digits(s) => s.parse().map(DateLike::Year).map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for DateLike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateLike::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
            DateLike::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DateLike::Month { year, month } => write!(f, "{year:04}-{month:02}"),
            DateLike::Year(year) => write!(f, "{year:04}"),
        }
    }
}

impl Serialize for DateLike {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateLike {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// A single `[start, end]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateLike,
    pub end: DateLike,
}

impl TimeRange {
    /// Normalize a sequence of date-like values into one range.
    ///
    /// The first element is the start and the last element the end; any
    /// elements in between are ignored. An empty sequence has no range and a
    /// single element is a zero-length range.
    pub fn from_sequence(values: &[DateLike]) -> Result<Option<Self>, ShapeMismatch> {
        let (Some(start), Some(end)) = (values.first(), values.last()) else {
            return Ok(None);
        };
        if end.earliest() < start.earliest() {
            return Err(ShapeMismatch::ReversedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Some(TimeRange {
            start: *start,
            end: *end,
        }))
    }
}

impl Serialize for TimeRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.start, self.end].serialize(serializer)
    }
}

/// The stored value of a time-range data point.
///
/// Both wire forms, a free sequence of dates and a literal `[start, end]`
/// tuple, deserialize into the same normalized range and serialize back as the
/// tuple (or `[]` when empty).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DateLike>", into = "Vec<DateLike>")]
pub struct RangeValue(pub Option<TimeRange>);

impl TryFrom<Vec<DateLike>> for RangeValue {
    type Error = ShapeMismatch;

    fn try_from(values: Vec<DateLike>) -> Result<Self, Self::Error> {
        TimeRange::from_sequence(&values).map(RangeValue)
    }
}

impl From<RangeValue> for Vec<DateLike> {
    fn from(value: RangeValue) -> Self {
        match value.0 {
            Some(range) => vec![range.start, range.end],
            None => Vec::new(),
        }
    }
}

/// Parse every string in `raw` as a date-like value of `time_type`.
///
/// Collects every failure rather than stopping at the first one.
pub fn parse_dates(
    raw: &serde_json::Value,
    time_type: TimeType,
) -> Result<Vec<DateLike>, Vec<ShapeMismatch>> {
    let Some(items) = raw.as_array() else {
        return Err(vec![ShapeMismatch::wrong_type("sequence of dates", raw)]);
    };

    let mut dates = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    for item in items {
        let parsed = match item.as_str() {
            Some(s) => s
                .parse::<DateLike>()
                .and_then(|d| d.expect_granularity(time_type).map(|()| d)),
            None => Err(ShapeMismatch::wrong_type("date string", item)),
        };
        match parsed {
            Ok(d) => dates.push(d),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(dates)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_granularity() {
        assert_eq!(
            "2024-05-01T10:00:00Z".parse::<DateLike>().unwrap().granularity(),
            TimeType::DateTime
        );
        assert_eq!("2024-05-01".parse::<DateLike>().unwrap().granularity(), TimeType::Date);
        assert_eq!(
            "2024-05".parse::<DateLike>().unwrap(),
            DateLike::Month { year: 2024, month: 5 }
        );
        assert_eq!("2024".parse::<DateLike>().unwrap(), DateLike::Year(2024));
    }

    #[test]
    fn rejects_non_dates() {
        for bad in ["", "yesterday", "2024-13", "2024-02-30", "24-05", "20240"] {
            assert!(bad.parse::<DateLike>().is_err(), "'{bad}' should not parse");
        }
    }

    #[test]
    fn display_matches_input_for_calendar_granularities() {
        for s in ["2024-05-01", "2024-05", "0999"] {
            assert_eq!(s.parse::<DateLike>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn range_uses_first_and_last_elements() {
        let dates: Vec<DateLike> = ["2024-01-01", "2024-03-01", "2024-02-01"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let range = TimeRange::from_sequence(&dates).unwrap().unwrap();
        assert_eq!(range.start.to_string(), "2024-01-01");
        assert_eq!(range.end.to_string(), "2024-02-01");
    }

    #[test]
    fn reversed_range_is_rejected() {
        let dates: Vec<DateLike> = ["2024-05", "2024-01"].iter().map(|s| s.parse().unwrap()).collect();
        let err = TimeRange::from_sequence(&dates).unwrap_err();
        assert!(matches!(err, ShapeMismatch::ReversedRange { .. }));
    }

    #[test]
    fn range_value_serializes_as_tuple() {
        let value: RangeValue =
            serde_json::from_value(serde_json::json!(["2024", "2025", "2026"])).unwrap();
        assert_eq!(serde_json::to_value(value).unwrap(), serde_json::json!(["2024", "2026"]));

        let empty: RangeValue = serde_json::from_value(serde_json::json!([])).unwrap();
        assert_eq!(empty, RangeValue(None));
    }

    #[test]
    fn parse_dates_checks_granularity() {
        let errors = parse_dates(&serde_json::json!(["2024-05-01", "2024", 7]), TimeType::Date)
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ShapeMismatch::WrongGranularity { .. }));
        assert!(matches!(errors[1], ShapeMismatch::WrongType { .. }));
    }
}
