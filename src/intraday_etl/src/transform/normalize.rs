//! Record normalizer: one raw series entry in, one typed record or one
//! rejection out.
//!
//! Validation runs in two steps. The presence check compares the field map
//! against the caller's required labels and reports *every* missing label at
//! once (set difference); coercion is only attempted when nothing is missing.
//! Coercion is a direct parse of the API text, so values pass through
//! unmodified. Prices must be finite: `NaN` and infinities parse as floats
//! but have no JSON number form.

use std::borrow::Cow;

use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::models::{
    raw::RawSeriesEntry,
    record::{
        CLOSE_FIELD, HIGH_FIELD, LOW_FIELD, NormalizedRecord, OPEN_FIELD, RAW_TIMESTAMP_FORMAT,
        VOLUME_FIELD,
    },
    rejection::RejectionReason,
};

/// Normalizes one entry and logs the rejection, if any.
///
/// Missing fields are logged at `warn`, conversion failures at `error`.
/// Successful entries produce no log output.
pub fn normalize(
    entry: &RawSeriesEntry,
    required_fields: &[String],
) -> Result<NormalizedRecord, RejectionReason> {
    normalize_entry(entry, required_fields).inspect_err(|reason| {
        if reason.is_missing_fields() {
            warn!(timestamp = %entry.key, %reason, "skipping series entry");
        } else {
            error!(timestamp = %entry.key, %reason, "failed to coerce series entry");
        }
    })
}

/// Side-effect free core of [`normalize`].
pub fn normalize_entry(
    entry: &RawSeriesEntry,
    required_fields: &[String],
) -> Result<NormalizedRecord, RejectionReason> {
    let Value::Object(fields) = &entry.fields else {
        return Err(RejectionReason::NotAFieldMap);
    };

    let missing: Vec<String> = required_fields
        .iter()
        .filter(|label| !fields.contains_key(label.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(RejectionReason::MissingFields { missing });
    }

    let timestamp = NaiveDateTime::parse_from_str(&entry.key, RAW_TIMESTAMP_FORMAT).map_err(
        |source| RejectionReason::InvalidTimestamp {
            value: entry.key.clone(),
            source,
        },
    )?;

    Ok(NormalizedRecord {
        timestamp,
        open: float_field(fields, OPEN_FIELD)?,
        high: float_field(fields, HIGH_FIELD)?,
        low: float_field(fields, LOW_FIELD)?,
        close: float_field(fields, CLOSE_FIELD)?,
        volume: integer_field(fields, VOLUME_FIELD)?,
    })
}

fn scalar_text<'a>(
    fields: &'a Map<String, Value>,
    field: &str,
) -> Result<Cow<'a, str>, RejectionReason> {
    match fields.get(field) {
        Some(Value::String(text)) => Ok(Cow::Borrowed(text.trim())),
        Some(Value::Number(number)) => Ok(Cow::Owned(number.to_string())),
        Some(_) => Err(RejectionReason::NonScalarValue {
            field: field.to_string(),
        }),
        None => Err(RejectionReason::AbsentValue {
            field: field.to_string(),
        }),
    }
}

fn float_field(fields: &Map<String, Value>, field: &str) -> Result<f64, RejectionReason> {
    let text = scalar_text(fields, field)?;
    let value = text
        .parse::<f64>()
        .map_err(|source| RejectionReason::InvalidFloat {
            field: field.to_string(),
            value: text.to_string(),
            source,
        })?;
    if !value.is_finite() {
        return Err(RejectionReason::NonFinite {
            field: field.to_string(),
            value: text.to_string(),
        });
    }
    Ok(value)
}

fn integer_field(fields: &Map<String, Value>, field: &str) -> Result<i64, RejectionReason> {
    let text = scalar_text(fields, field)?;
    text.parse::<i64>()
        .map_err(|source| RejectionReason::InvalidInteger {
            field: field.to_string(),
            value: text.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::models::record::OHLCV_FIELDS;

    fn required() -> Vec<String> {
        OHLCV_FIELDS.iter().map(|f| f.to_string()).collect()
    }

    fn entry(key: &str, fields: Value) -> RawSeriesEntry {
        RawSeriesEntry::new(key, fields)
    }

    #[test]
    fn coerces_a_complete_entry() {
        let raw = entry(
            "2024-01-01 09:30:00",
            json!({
                "1. open": "10.5",
                "2. high": "11.25",
                "3. low": "10.125",
                "4. close": "11.0",
                "5. volume": "1000"
            }),
        );

        let record = normalize(&raw, &required()).unwrap();
        assert_eq!(
            record,
            NormalizedRecord {
                timestamp: NaiveDate::from_ymd_opt(2024, 1, 1)
                    .unwrap()
                    .and_hms_opt(9, 30, 0)
                    .unwrap(),
                open: 10.5,
                high: 11.25,
                low: 10.125,
                close: 11.0,
                volume: 1000,
            }
        );
    }

    #[test]
    fn missing_fields_are_all_reported_without_coercion() {
        // The open value is garbage, but presence is checked first.
        let raw = entry(
            "not a timestamp",
            json!({"1. open": "abc", "2. high": "1", "3. low": "1"}),
        );

        let reason = normalize(&raw, &required()).unwrap_err();
        assert_eq!(
            reason,
            RejectionReason::MissingFields {
                missing: vec!["4. close".into(), "5. volume".into()]
            }
        );
        assert_eq!(
            reason.to_string(),
            "missing required fields: 4. close, 5. volume"
        );
    }

    #[test]
    fn non_numeric_text_is_a_conversion_error() {
        let raw = entry(
            "2024-01-01 09:30:00",
            json!({"1. open": "ten", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1"}),
        );
        let reason = normalize(&raw, &required()).unwrap_err();
        assert!(matches!(reason, RejectionReason::InvalidFloat { ref field, .. } if field == "1. open"));
        assert!(!reason.is_missing_fields());
    }

    #[test]
    fn fractional_volume_is_rejected() {
        let raw = entry(
            "2024-01-01 09:30:00",
            json!({"1. open": "1", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "10.5"}),
        );
        assert!(matches!(
            normalize(&raw, &required()),
            Err(RejectionReason::InvalidInteger { .. })
        ));
    }

    #[test]
    fn non_finite_prices_are_conversion_errors() {
        for (text, field) in [("NaN", "1. open"), ("inf", "2. high"), ("-infinity", "4. close")] {
            let mut fields = json!({"1. open": "1", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1"});
            fields[field] = json!(text);
            let raw = entry("2024-01-01 09:30:00", fields);

            let reason = normalize(&raw, &required()).unwrap_err();
            assert_eq!(
                reason,
                RejectionReason::NonFinite {
                    field: field.into(),
                    value: text.into()
                }
            );
            assert!(!reason.is_missing_fields());
        }
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        let raw = entry(
            "2024/01/01 09:30",
            json!({"1. open": "1", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1"}),
        );
        assert!(matches!(
            normalize(&raw, &required()),
            Err(RejectionReason::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn json_numbers_and_padding_are_accepted() {
        let raw = entry(
            "2024-01-01 09:30:00",
            json!({"1. open": 10.5, "2. high": " 12.0 ", "3. low": "9.75", "4. close": "11", "5. volume": 42}),
        );
        let record = normalize(&raw, &required()).unwrap();
        assert_eq!(record.open, 10.5);
        assert_eq!(record.high, 12.0);
        assert_eq!(record.volume, 42);
    }

    #[test]
    fn nested_values_and_non_objects_are_rejected() {
        let nested = entry(
            "2024-01-01 09:30:00",
            json!({"1. open": {"v": 1}, "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1"}),
        );
        assert!(matches!(
            normalize(&nested, &required()),
            Err(RejectionReason::NonScalarValue { .. })
        ));

        let scalar = entry("2024-01-01 09:30:00", json!("1. open"));
        assert_eq!(
            normalize(&scalar, &required()),
            Err(RejectionReason::NotAFieldMap)
        );
    }

    #[test]
    fn value_absent_from_a_shorter_required_list_is_still_rejected() {
        let raw = entry(
            "2024-01-01 09:30:00",
            json!({"1. open": "1", "2. high": "1", "3. low": "1", "4. close": "1"}),
        );
        let only_prices: Vec<String> = OHLCV_FIELDS[..4].iter().map(|f| f.to_string()).collect();
        assert_eq!(
            normalize(&raw, &only_prices),
            Err(RejectionReason::AbsentValue {
                field: "5. volume".into()
            })
        );
    }

    proptest! {
        #[test]
        fn parsed_values_are_passed_through_unmodified(
            open in proptest::num::f64::NORMAL,
            close in proptest::num::f64::NORMAL,
            volume in any::<i64>(),
        ) {
            let raw = entry(
                "2024-03-15 15:55:00",
                json!({
                    "1. open": open.to_string(),
                    "2. high": open.to_string(),
                    "3. low": close.to_string(),
                    "4. close": close.to_string(),
                    "5. volume": volume.to_string(),
                }),
            );
            let record = normalize_entry(&raw, &required()).unwrap();
            prop_assert_eq!(record.open, open);
            prop_assert_eq!(record.low, close);
            prop_assert_eq!(record.volume, volume);
        }
    }
}
