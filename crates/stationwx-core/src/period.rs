//! Period bucketing for chart series
//!
//! Raw modes plot individual records, week and month modes collapse records
//! into calendar buckets. Every mode yields the same [`ChartSeries`] shape,
//! ordered oldest to newest.

use chrono::{
    DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::rollups::Bucket;
use crate::types::{Field, WeatherRecord};

/// Most records plotted in the raw modes
pub const RAW_POINT_LIMIT: usize = 10;

/// Most calendar buckets kept in week and month modes
pub const BUCKET_LIMIT: usize = 7;

/// Chart granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    /// Latest records, no time window
    Latest,
    /// Latest records within a rolling 24 hour window
    Day,
    /// Daily buckets
    Week,
    /// Monthly buckets
    Month,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Latest => "latest",
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
        }
    }
}

impl From<&str> for Period {
    /// Unknown names select [`Period::Latest`]
    fn from(name: &str) -> Self {
        match name {
            "day" => Period::Day,
            "week" => Period::Week,
            "month" => Period::Month,
            _ => Period::Latest,
        }
    }
}

/// Parallel per-point series for charting
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub timestamps: Vec<String>,
    pub dates: Vec<String>,
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
    pub pressure: Vec<f64>,
    pub rain: Vec<f64>,
    #[serde(rename = "gust_windSpd")]
    pub gust_wind_speed: Vec<f64>,
    #[serde(rename = "gust_windDir")]
    pub gust_wind_direction: Vec<f64>,
    #[serde(rename = "sustain_windSpd")]
    pub sustain_wind_speed: Vec<f64>,
    #[serde(rename = "sustain_windDir")]
    pub sustain_wind_direction: Vec<f64>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn series(&self, field: Field) -> &[f64] {
        match field {
            Field::Temperature => &self.temperature,
            Field::Humidity => &self.humidity,
            Field::Pressure => &self.pressure,
            Field::Rain => &self.rain,
            Field::SustainWindSpeed => &self.sustain_wind_speed,
            Field::SustainWindDirection => &self.sustain_wind_direction,
            Field::GustWindSpeed => &self.gust_wind_speed,
            Field::GustWindDirection => &self.gust_wind_direction,
        }
    }

    fn series_mut(&mut self, field: Field) -> &mut Vec<f64> {
        match field {
            Field::Temperature => &mut self.temperature,
            Field::Humidity => &mut self.humidity,
            Field::Pressure => &mut self.pressure,
            Field::Rain => &mut self.rain,
            Field::SustainWindSpeed => &mut self.sustain_wind_speed,
            Field::SustainWindDirection => &mut self.sustain_wind_direction,
            Field::GustWindSpeed => &mut self.gust_wind_speed,
            Field::GustWindDirection => &mut self.gust_wind_direction,
        }
    }

    fn push(&mut self, time: NaiveDateTime, date_format: &str, value: impl Fn(Field) -> f64) {
        self.timestamps.push(time.format("%H:%M").to_string());
        self.dates.push(time.format(date_format).to_string());
        for field in Field::ALL {
            self.series_mut(field).push(value(field));
        }
    }
}

/// Aggregate newest-first `records` for `period` in the local time zone
pub fn aggregate(records: &[WeatherRecord], period: Period, now: DateTime<Utc>) -> ChartSeries {
    aggregate_in(records, period, now, &Local)
}

/// Aggregate newest-first `records` for `period`, bucketing and labelling
/// in `tz`
pub fn aggregate_in<Tz: TimeZone>(
    records: &[WeatherRecord],
    period: Period,
    now: DateTime<Utc>,
    tz: &Tz,
) -> ChartSeries {
    match period {
        Period::Latest => latest_points(records.iter(), tz),
        Period::Day => {
            // Rolling window from the request time, not a calendar day
            let start = now - Duration::hours(24);
            latest_points(records.iter().filter(|r| r.timestamp >= start), tz)
        }
        Period::Week => calendar_buckets(records, tz, |date| date, "%d/%m"),
        Period::Month => calendar_buckets(records, tz, first_of_month, "%m/%Y"),
    }
}

fn local_time<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> NaiveDateTime {
    instant.with_timezone(tz).naive_local()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn latest_points<'a, Tz: TimeZone>(
    records: impl Iterator<Item = &'a WeatherRecord>,
    tz: &Tz,
) -> ChartSeries {
    let mut selected: Vec<&WeatherRecord> = records.take(RAW_POINT_LIMIT).collect();
    selected.sort_by_key(|r| r.timestamp);

    let mut series = ChartSeries::default();
    for record in selected {
        series.push(local_time(record.timestamp, tz), "%d/%m", |f| record.get(f));
    }
    series
}

fn calendar_buckets<Tz: TimeZone>(
    records: &[WeatherRecord],
    tz: &Tz,
    bucket_key: impl Fn(NaiveDate) -> NaiveDate,
    date_format: &str,
) -> ChartSeries {
    let mut buckets: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
    for record in records {
        let key = bucket_key(local_time(record.timestamp, tz).date());
        buckets.entry(key).or_default().add(record);
    }

    let mut newest: Vec<(NaiveDate, Bucket)> =
        buckets.into_iter().rev().take(BUCKET_LIMIT).collect();
    newest.reverse();

    let mut series = ChartSeries::default();
    for (date, bucket) in newest {
        series.push(date.and_time(NaiveTime::MIN), date_format, |f| bucket.value(f));
    }
    series
}
