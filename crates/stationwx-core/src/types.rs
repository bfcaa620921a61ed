//! Core data types for station records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Raw fields of one record as delivered by a source (field name -> value)
pub type RawFields = HashMap<String, FieldValue>;

/// A loosely typed field value as it arrives from the database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Null,
    Other(Value),
}

/// Value could not be turned into a finite number
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoercionError {
    #[error("not numeric: {0}")]
    NotNumeric(String),

    #[error("not finite: {0}")]
    NonFinite(f64),
}

impl FieldValue {
    /// Coerce to a finite `f64`.
    ///
    /// Numeric strings are trimmed and parsed, booleans count as 1/0.
    pub fn coerce(&self) -> Result<f64, CoercionError> {
        let value = match self {
            FieldValue::Integer(v) => *v as f64,
            FieldValue::Float(v) => *v,
            FieldValue::Bool(b) => f64::from(u8::from(*b)),
            FieldValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| CoercionError::NotNumeric(s.clone()))?,
            FieldValue::Null => return Err(CoercionError::NotNumeric("null".into())),
            FieldValue::Other(v) => return Err(CoercionError::NotNumeric(v.to_string())),
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(CoercionError::NonFinite(value))
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => n
                    .as_f64()
                    .map(FieldValue::Float)
                    .unwrap_or(FieldValue::Other(Value::Number(n))),
            },
            Value::String(s) => FieldValue::Text(s),
            other => FieldValue::Other(other),
        }
    }
}

/// Snapshot of the raw push mapping, ordered by key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSnapshot {
    entries: BTreeMap<String, RawFields>,
}

impl RawSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from a JSON document.
    ///
    /// `null` is an empty snapshot. Children that are not objects are
    /// skipped.
    pub fn from_json(document: Value) -> Self {
        let map = match document {
            Value::Object(map) => map,
            Value::Null => return Self::default(),
            other => {
                tracing::warn!(kind = json_kind(&other), "snapshot root is not an object");
                return Self::default();
            }
        };

        let mut snapshot = Self::default();
        for (key, record) in map {
            match record {
                Value::Object(fields) => {
                    let fields = fields
                        .into_iter()
                        .map(|(name, value)| (name, FieldValue::from(value)))
                        .collect();
                    snapshot.insert(key, fields);
                }
                other => {
                    tracing::warn!(%key, kind = json_kind(&other), "skipping non-object record");
                }
            }
        }
        snapshot
    }

    pub fn insert(&mut self, key: impl Into<String>, fields: RawFields) {
        self.entries.insert(key.into(), fields);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawFields)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, RawFields)> for RawSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, RawFields)>>(iter: I) -> Self {
        let mut snapshot = Self::default();
        for (key, fields) in iter {
            snapshot.insert(key, fields);
        }
        snapshot
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One normalized sensor observation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeatherRecord {
    /// Observation instant
    #[serde(rename = "datetime")]
    pub timestamp: DateTime<Utc>,

    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub rain: f64,

    #[serde(rename = "sustain_windSpd")]
    pub sustain_wind_speed: f64,

    #[serde(rename = "sustain_windDir")]
    pub sustain_wind_direction: f64,

    #[serde(rename = "gust_windSpd")]
    pub gust_wind_speed: f64,

    #[serde(rename = "gust_windDir")]
    pub gust_wind_direction: f64,
}

impl WeatherRecord {
    /// Record at `timestamp` with every measurement zeroed
    pub fn zeroed(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            temperature: 0.0,
            humidity: 0.0,
            pressure: 0.0,
            rain: 0.0,
            sustain_wind_speed: 0.0,
            sustain_wind_direction: 0.0,
            gust_wind_speed: 0.0,
            gust_wind_direction: 0.0,
        }
    }

    pub fn get(&self, field: Field) -> f64 {
        match field {
            Field::Temperature => self.temperature,
            Field::Humidity => self.humidity,
            Field::Pressure => self.pressure,
            Field::Rain => self.rain,
            Field::SustainWindSpeed => self.sustain_wind_speed,
            Field::SustainWindDirection => self.sustain_wind_direction,
            Field::GustWindSpeed => self.gust_wind_speed,
            Field::GustWindDirection => self.gust_wind_direction,
        }
    }

    pub fn set(&mut self, field: Field, value: f64) {
        let slot = match field {
            Field::Temperature => &mut self.temperature,
            Field::Humidity => &mut self.humidity,
            Field::Pressure => &mut self.pressure,
            Field::Rain => &mut self.rain,
            Field::SustainWindSpeed => &mut self.sustain_wind_speed,
            Field::SustainWindDirection => &mut self.sustain_wind_direction,
            Field::GustWindSpeed => &mut self.gust_wind_speed,
            Field::GustWindDirection => &mut self.gust_wind_direction,
        };
        *slot = value;
    }
}

/// The measurements every record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Temperature,
    Humidity,
    Pressure,
    Rain,
    SustainWindSpeed,
    SustainWindDirection,
    GustWindSpeed,
    GustWindDirection,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Temperature,
        Field::Humidity,
        Field::Pressure,
        Field::Rain,
        Field::SustainWindSpeed,
        Field::SustainWindDirection,
        Field::GustWindSpeed,
        Field::GustWindDirection,
    ];

    /// Field name used by the firmware and on the wire
    pub fn name(self) -> &'static str {
        match self {
            Field::Temperature => "temperature",
            Field::Humidity => "humidity",
            Field::Pressure => "pressure",
            Field::Rain => "rain",
            Field::SustainWindSpeed => "sustain_windSpd",
            Field::SustainWindDirection => "sustain_windDir",
            Field::GustWindSpeed => "gust_windSpd",
            Field::GustWindDirection => "gust_windDir",
        }
    }
}

/// Aggregation type for rollups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateType {
    Min,
    Max,
    Sum,
    Avg,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_value_coercion() {
        assert_eq!(FieldValue::Float(25.5).coerce(), Ok(25.5));
        assert_eq!(FieldValue::Integer(42).coerce(), Ok(42.0));
        assert_eq!(FieldValue::Text(" 25.6 ".into()).coerce(), Ok(25.6));
        assert_eq!(FieldValue::Bool(true).coerce(), Ok(1.0));

        assert!(FieldValue::Null.is_null());
        assert!(FieldValue::Null.coerce().is_err());
        assert!(FieldValue::Text("n/a".into()).coerce().is_err());
        assert!(FieldValue::Text("NaN".into()).coerce().is_err());
        assert!(FieldValue::Float(f64::INFINITY).coerce().is_err());
        assert!(FieldValue::Other(json!([1, 2])).coerce().is_err());
    }

    #[test]
    fn test_snapshot_from_json() {
        let doc = json!({
            "-NjX2kLm0001": {"temperature": 21.5, "humidity": "60"},
            "-NjX2kLm0002": 17,
            "-NjX2kLm0003": {"rain": null, "meta": {"fw": "1.2"}}
        });
        let snapshot = RawSnapshot::from_json(doc);
        assert_eq!(snapshot.len(), 2);

        let (key, fields) = snapshot.iter().next().unwrap();
        assert_eq!(key, "-NjX2kLm0001");
        assert_eq!(fields["temperature"], FieldValue::Float(21.5));
        assert_eq!(fields["humidity"], FieldValue::Text("60".into()));

        let (_, fields) = snapshot.iter().nth(1).unwrap();
        assert!(fields["rain"].is_null());
        assert!(matches!(fields["meta"], FieldValue::Other(_)));
    }

    #[test]
    fn test_snapshot_from_null_is_empty() {
        assert!(RawSnapshot::from_json(Value::Null).is_empty());
        assert!(RawSnapshot::from_json(json!("oops")).is_empty());
    }

    #[test]
    fn test_weather_record_serde_names() {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut record = WeatherRecord::zeroed(ts);
        record.set(Field::GustWindSpeed, 7.5);

        let value = serde_json::to_value(record).unwrap();
        assert_eq!(value["gust_windSpd"], json!(7.5));
        assert_eq!(value["sustain_windDir"], json!(0.0));
        assert!(value["datetime"].as_str().unwrap().starts_with("2024-05-01T10:00:00"));
        assert_eq!(value.as_object().unwrap().len(), 9);
    }

    #[test]
    fn test_field_accessors_cover_all_fields() {
        let mut record = WeatherRecord::zeroed(Utc::now());
        for (i, field) in Field::ALL.iter().enumerate() {
            record.set(*field, i as f64);
        }
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(record.get(*field), i as f64);
        }
    }
}
