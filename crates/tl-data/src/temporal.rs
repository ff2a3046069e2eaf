//! Temporal and text cell reading
//!
//! Start and end columns arrive in whatever type the host's model uses:
//! native timestamps and dates, epoch milliseconds as numbers, or text.
//! Everything is normalized to UTC. Cells that are present but unreadable
//! become [`TimeValue::Malformed`] so the row is still mapped.

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Date64Type, Float64Type, Int64Type, TimeUnit, TimestampMillisecondType,
};
use arrow::error::ArrowError;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::config::NullConfig;
use crate::item::TimeValue;
use crate::DataError;

/// Naive layouts tried after RFC 3339, in order
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a textual timestamp; naive values are taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();

    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Some(t.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(value, format) {
            return Some(t.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|t| t.and_utc());
    }

    // Epoch milliseconds
    value.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)
}

/// Read a start or end column into one value per row
pub fn read_temporal_column(values: &ArrayRef, nulls: &NullConfig) -> Result<Vec<TimeValue>, DataError> {
    match values.data_type() {
        DataType::Timestamp(_, _) => {
            // Relabelling as UTC keeps the stored instant for zoned input
            let utc = cast(values, &DataType::Timestamp(TimeUnit::Millisecond, Some("+00:00".into())))?;
            let millis = utc
                .as_primitive_opt::<TimestampMillisecondType>()
                .ok_or_else(|| cast_failure(values.data_type()))?;
            Ok(millis.iter().map(from_millis).collect())
        }
        DataType::Date32 | DataType::Date64 => {
            let dates = cast(values, &DataType::Date64)?;
            let millis = dates
                .as_primitive_opt::<Date64Type>()
                .ok_or_else(|| cast_failure(values.data_type()))?;
            Ok(millis.iter().map(from_millis).collect())
        }
        dt if dt.is_integer() => {
            let ints = cast(values, &DataType::Int64)?;
            let millis = ints
                .as_primitive_opt::<Int64Type>()
                .ok_or_else(|| cast_failure(values.data_type()))?;
            Ok(millis.iter().map(from_millis).collect())
        }
        dt if dt.is_floating() => {
            let floats = cast(values, &DataType::Float64)?;
            let millis = floats
                .as_primitive_opt::<Float64Type>()
                .ok_or_else(|| cast_failure(values.data_type()))?;
            Ok(millis
                .iter()
                .map(|v| match v {
                    Some(f) if f.is_finite() => from_millis(Some(f.round() as i64)),
                    Some(f) => TimeValue::Malformed(f.to_string()),
                    None => TimeValue::Missing,
                })
                .collect())
        }
        _ => Ok(read_text_column(values, nulls)?
            .into_iter()
            .map(|cell| match cell {
                Some(text) => match parse_timestamp(&text) {
                    Some(t) => TimeValue::At(t),
                    None => TimeValue::Malformed(text),
                },
                None => TimeValue::Missing,
            })
            .collect()),
    }
}

/// Read any column as display text, mapping nulls and null patterns to `None`
pub fn read_text_column(values: &ArrayRef, nulls: &NullConfig) -> Result<Vec<Option<String>>, DataError> {
    let keep = |text: &str| (!nulls.is_null(text)).then(|| text.to_string());

    match values.data_type() {
        DataType::Utf8 => {
            let strings = values
                .as_string_opt::<i32>()
                .ok_or_else(|| cast_failure(values.data_type()))?;
            Ok(strings.iter().map(|v| v.and_then(keep)).collect())
        }
        DataType::LargeUtf8 => {
            let strings = values
                .as_string_opt::<i64>()
                .ok_or_else(|| cast_failure(values.data_type()))?;
            Ok(strings.iter().map(|v| v.and_then(keep)).collect())
        }
        _ => {
            let options = FormatOptions::default();
            let formatter = ArrayFormatter::try_new(values.as_ref(), &options)?;
            Ok((0..values.len())
                .map(|row| {
                    if values.is_null(row) {
                        None
                    } else {
                        keep(&formatter.value(row).to_string())
                    }
                })
                .collect())
        }
    }
}

fn from_millis(value: Option<i64>) -> TimeValue {
    match value {
        Some(ms) => DateTime::from_timestamp_millis(ms)
            .map(TimeValue::At)
            .unwrap_or_else(|| TimeValue::Malformed(ms.to_string())),
        None => TimeValue::Missing,
    }
}

fn cast_failure(data_type: &DataType) -> DataError {
    DataError::Arrow(ArrowError::CastError(format!(
        "Cannot read {} as a temporal column",
        data_type
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray, TimestampSecondArray};
    use chrono::TimeZone;
    use std::sync::Arc;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> TimeValue {
        TimeValue::At(Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap())
    }

    #[test]
    fn test_parse_text_layouts() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-01T02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T02:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01 02:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T04:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp(" 2024-01-01T02:00:00Z "), Some(expected));
        assert_eq!(parse_timestamp("1704074400000"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-01"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("next tuesday"), None);
    }

    #[test]
    fn test_text_column_with_malformed_and_null() {
        let values: ArrayRef = Arc::new(StringArray::from(vec![
            Some("2024-01-01T00:00"),
            Some("garbage"),
            None,
            Some("N/A"),
        ]));
        let parsed = read_temporal_column(&values, &NullConfig::default()).unwrap();
        assert_eq!(
            parsed,
            vec![
                at(2024, 1, 1, 0, 0),
                TimeValue::Malformed("garbage".into()),
                TimeValue::Missing,
                TimeValue::Missing,
            ]
        );
    }

    #[test]
    fn test_native_temporal_columns() {
        let seconds: ArrayRef = Arc::new(TimestampSecondArray::from(vec![Some(1_704_067_200), None]));
        assert_eq!(
            read_temporal_column(&seconds, &NullConfig::default()).unwrap(),
            vec![at(2024, 1, 1, 0, 0), TimeValue::Missing]
        );

        let dates: ArrayRef = Arc::new(Date32Array::from(vec![19_723]));
        assert_eq!(
            read_temporal_column(&dates, &NullConfig::default()).unwrap(),
            vec![at(2024, 1, 1, 0, 0)]
        );
    }

    #[test]
    fn test_numeric_epoch_millis() {
        let ints: ArrayRef = Arc::new(Int64Array::from(vec![1_704_067_200_000]));
        assert_eq!(
            read_temporal_column(&ints, &NullConfig::default()).unwrap(),
            vec![at(2024, 1, 1, 0, 0)]
        );

        let floats: ArrayRef = Arc::new(Float64Array::from(vec![1_704_067_200_000.4, f64::NAN]));
        let parsed = read_temporal_column(&floats, &NullConfig::default()).unwrap();
        assert_eq!(parsed[0], at(2024, 1, 1, 0, 0));
        assert!(matches!(parsed[1], TimeValue::Malformed(_)));
    }

    #[test]
    fn test_text_column_from_numbers() {
        let ints: ArrayRef = Arc::new(Int64Array::from(vec![Some(1), None, Some(30)]));
        assert_eq!(
            read_text_column(&ints, &NullConfig::default()).unwrap(),
            vec![Some("1".to_string()), None, Some("30".to_string())]
        );
    }
}
