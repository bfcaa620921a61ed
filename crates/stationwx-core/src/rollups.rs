//! Aggregation and rollup calculations over record buckets

use crate::types::{AggregateType, Field, WeatherRecord};

/// Running min, max and sum of one field, folded as values arrive
#[derive(Debug, Clone, Copy)]
pub struct Accumulator {
    aggregate_type: AggregateType,
    seen: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Accumulator {
    pub fn new(aggregate_type: AggregateType) -> Self {
        Self {
            aggregate_type,
            seen: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn add(&mut self, value: f64) {
        self.seen += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// `None` until a value has been added
    pub fn result(&self) -> Option<f64> {
        (self.seen > 0).then(|| match self.aggregate_type {
            AggregateType::Min => self.min,
            AggregateType::Max => self.max,
            AggregateType::Sum => self.sum,
            AggregateType::Avg => self.sum / self.seen as f64,
        })
    }
}

/// How a field collapses within a day or month bucket
pub fn bucket_aggregate_type(field: Field) -> AggregateType {
    match field {
        Field::Rain => AggregateType::Sum,
        _ => AggregateType::Avg,
    }
}

/// All records that fell into one period bucket
#[derive(Debug, Clone)]
pub struct Bucket {
    records: usize,
    accumulators: Vec<(Field, Accumulator)>,
}

impl Bucket {
    pub fn new() -> Self {
        Self {
            records: 0,
            accumulators: Field::ALL
                .into_iter()
                .map(|field| (field, Accumulator::new(bucket_aggregate_type(field))))
                .collect(),
        }
    }

    pub fn add(&mut self, record: &WeatherRecord) {
        self.records += 1;
        for (field, acc) in &mut self.accumulators {
            acc.add(record.get(*field));
        }
    }

    /// Collapsed value of one field; an empty bucket yields `0.0`
    pub fn value(&self, field: Field) -> f64 {
        self.accumulators
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, acc)| acc.result())
            .unwrap_or(0.0)
    }

    /// Number of records added
    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Bucket {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(temperature: f64, rain: f64) -> WeatherRecord {
        let mut r = WeatherRecord::zeroed(Utc::now());
        r.temperature = temperature;
        r.rain = rain;
        r
    }

    #[test]
    fn test_accumulator_folds() {
        let readings = [12.5, -3.0, 7.5, 0.0];
        for (aggregate_type, expected) in [
            (AggregateType::Min, -3.0),
            (AggregateType::Max, 12.5),
            (AggregateType::Sum, 17.0),
            (AggregateType::Avg, 4.25),
        ] {
            let mut acc = Accumulator::new(aggregate_type);
            assert_eq!(acc.result(), None, "{aggregate_type:?} before any value");
            readings.iter().for_each(|v| acc.add(*v));
            assert_eq!(acc.result(), Some(expected), "{aggregate_type:?}");
        }
    }

    #[test]
    fn test_bucket_aggregate_types() {
        assert_eq!(bucket_aggregate_type(Field::Rain), AggregateType::Sum);
        assert_eq!(bucket_aggregate_type(Field::Temperature), AggregateType::Avg);
        assert_eq!(
            bucket_aggregate_type(Field::GustWindDirection),
            AggregateType::Avg
        );
    }

    #[test]
    fn test_bucket_sums_rain_and_averages_the_rest() {
        let mut bucket = Bucket::new();
        bucket.add(&record(20.0, 1.0));
        bucket.add(&record(22.0, 2.0));
        bucket.add(&record(24.0, 0.5));

        assert_eq!(bucket.len(), 3);
        assert_eq!(bucket.value(Field::Rain), 3.5);
        assert_eq!(bucket.value(Field::Temperature), 22.0);
    }

    #[test]
    fn test_empty_bucket_is_zero() {
        let bucket = Bucket::new();
        assert!(bucket.is_empty());
        assert_eq!(bucket.value(Field::Humidity), 0.0);
    }
}
