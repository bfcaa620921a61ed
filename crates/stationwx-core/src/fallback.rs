//! Synthetic records for when no live data is available

use chrono::{DateTime, Duration, Utc};

use crate::types::WeatherRecord;

/// Days of synthetic history generated when nothing else is configured
pub const DEFAULT_FALLBACK_DAYS: usize = 30;

/// Generate `count` daily records going back from `reference`, newest first.
///
/// Output depends only on the arguments. A `count` of zero still yields one
/// record so callers always have something to summarize.
pub fn generate(reference: DateTime<Utc>, count: usize) -> Vec<WeatherRecord> {
    (0..count.max(1))
        .map(|i| {
            let day = i as i64;
            let offset = |modulus: i64| (day % modulus) as f64;
            WeatherRecord {
                timestamp: reference - Duration::days(day),
                temperature: 20.0 + offset(10),
                humidity: 60.0 + offset(20),
                pressure: 1008.25 + offset(10),
                rain: offset(3) * 2.5,
                sustain_wind_speed: 5.0 + offset(8),
                sustain_wind_direction: 180.0 + offset(180),
                gust_wind_speed: 8.0 + offset(12),
                gust_wind_direction: 180.0 + offset(180),
            }
        })
        .collect()
}
