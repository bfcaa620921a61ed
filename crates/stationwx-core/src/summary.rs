//! Snapshot statistics over a record set

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::rollups::Accumulator;
use crate::types::{AggregateType, Field, WeatherRecord};

/// No records reached summarization
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no records to summarize")]
pub struct EmptyInputError;

/// Current conditions plus extremes and totals over a record set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub current_temperature: f64,
    pub current_humidity: f64,
    pub current_pressure: f64,
    pub high_temperature: f64,
    pub low_temperature: f64,
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub rain_total: f64,
    pub sustain_wind_speed: f64,
    pub sustain_wind_direction: f64,
    pub gust_wind_speed: f64,
    pub gust_wind_direction: f64,
    pub last_update: DateTime<Utc>,
}

/// Overview block for record listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherStats {
    pub total_records: usize,
    pub latest_temperature: f64,
    pub latest_humidity: f64,
    pub latest_pressure: f64,
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub max_temperature: f64,
    pub min_temperature: f64,
    pub last_update: DateTime<Utc>,
}

fn fold(records: &[WeatherRecord], field: Field, aggregate_type: AggregateType) -> f64 {
    let mut acc = Accumulator::new(aggregate_type);
    for record in records {
        acc.add(record.get(field));
    }
    acc.result().unwrap_or(0.0)
}

/// Summarize newest-first `records`; the first record is the current one
pub fn summarize(records: &[WeatherRecord]) -> Result<Summary, EmptyInputError> {
    let latest = records.first().ok_or(EmptyInputError)?;

    Ok(Summary {
        current_temperature: latest.temperature,
        current_humidity: latest.humidity,
        current_pressure: latest.pressure,
        high_temperature: fold(records, Field::Temperature, AggregateType::Max),
        low_temperature: fold(records, Field::Temperature, AggregateType::Min),
        avg_temperature: fold(records, Field::Temperature, AggregateType::Avg),
        avg_humidity: fold(records, Field::Humidity, AggregateType::Avg),
        rain_total: fold(records, Field::Rain, AggregateType::Sum),
        sustain_wind_speed: latest.sustain_wind_speed,
        sustain_wind_direction: latest.sustain_wind_direction,
        gust_wind_speed: latest.gust_wind_speed,
        gust_wind_direction: latest.gust_wind_direction,
        last_update: latest.timestamp,
    })
}

/// Listing statistics over newest-first `records`
pub fn stats(records: &[WeatherRecord]) -> Result<WeatherStats, EmptyInputError> {
    let latest = records.first().ok_or(EmptyInputError)?;

    Ok(WeatherStats {
        total_records: records.len(),
        latest_temperature: latest.temperature,
        latest_humidity: latest.humidity,
        latest_pressure: latest.pressure,
        avg_temperature: fold(records, Field::Temperature, AggregateType::Avg),
        avg_humidity: fold(records, Field::Humidity, AggregateType::Avg),
        max_temperature: fold(records, Field::Temperature, AggregateType::Max),
        min_temperature: fold(records, Field::Temperature, AggregateType::Min),
        last_update: latest.timestamp,
    })
}
