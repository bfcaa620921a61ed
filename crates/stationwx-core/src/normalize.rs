//! Raw record normalization

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::push_id::decode_instant;
use crate::types::{Field, RawFields, RawSnapshot, WeatherRecord};

/// Normalize one raw record, falling back to the current time when the key
/// carries no usable timestamp
pub fn normalize(key: &str, raw: &RawFields) -> WeatherRecord {
    normalize_at(key, raw, Utc::now())
}

/// Normalize one raw record with an explicit processing time.
///
/// Only the eight known fields are read; missing or non-numeric values
/// become `0.0` and unknown fields are ignored.
pub fn normalize_at(key: &str, raw: &RawFields, now: DateTime<Utc>) -> WeatherRecord {
    let timestamp = match decode_instant(key) {
        Ok(instant) => instant,
        Err(e) => {
            debug!(%key, error = %e, "undecodable key, using processing time");
            now
        }
    };

    let mut record = WeatherRecord::zeroed(timestamp);
    for field in Field::ALL {
        let Some(value) = raw.get(field.name()) else {
            continue;
        };
        match value.coerce() {
            Ok(v) => record.set(field, v),
            Err(e) => debug!(%key, field = field.name(), error = %e, "coercing to 0.0"),
        }
    }
    record
}

/// Normalize a whole snapshot, newest record first
pub fn normalize_all(snapshot: &RawSnapshot, now: DateTime<Utc>) -> Vec<WeatherRecord> {
    let mut records: Vec<WeatherRecord> = snapshot
        .iter()
        .map(|(key, raw)| normalize_at(key, raw, now))
        .collect();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records
}
