//! Loading records from a live source with synthetic fallback
//!
//! Every handler goes through [`load_records`], which never comes back empty.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::fallback::generate;
use crate::normalize::normalize_all;
use crate::types::{RawSnapshot, WeatherRecord};

/// Tag reported for synthetic data
pub const FALLBACK_TAG: &str = "default";

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("request failed: {0}")]
    Http(String),

    #[error("source answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid document: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// External store holding the raw push records
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    /// Provenance tag for data served from this source
    fn name(&self) -> &str;

    /// Fetch the key -> fields mapping of pushed records
    async fn fetch_raw(&self) -> Result<RawSnapshot, SourceError>;

    /// Fetch the whole database document, unprocessed
    async fn fetch_tree(&self) -> Result<serde_json::Value, SourceError>;
}

/// Where a record set came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    Live(String),
    Fallback,
}

impl Provenance {
    pub fn tag(&self) -> &str {
        match self {
            Provenance::Live(name) => name,
            Provenance::Fallback => FALLBACK_TAG,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Provenance::Live(_))
    }
}

impl Serialize for Provenance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

/// Newest-first records ready for aggregation, never empty
#[derive(Debug, Clone)]
pub struct LoadedRecords {
    pub records: Vec<WeatherRecord>,
    pub provenance: Provenance,
}

/// Fetch and normalize live records, substituting `fallback_days` of
/// synthetic history when the source is missing, failing or empty
pub async fn load_records(
    source: Option<&dyn RecordSource>,
    now: DateTime<Utc>,
    fallback_days: usize,
) -> LoadedRecords {
    match source {
        Some(src) => match src.fetch_raw().await {
            Ok(snapshot) => {
                let records = normalize_all(&snapshot, now);
                if !records.is_empty() {
                    info!(source = src.name(), count = records.len(), "live records loaded");
                    return LoadedRecords {
                        records,
                        provenance: Provenance::Live(src.name().to_string()),
                    };
                }
                warn!(source = src.name(), "live source is empty, using fallback data");
            }
            Err(e) => {
                warn!(source = src.name(), error = %e, "live source failed, using fallback data");
            }
        },
        None => debug!("no live source configured, using fallback data"),
    }

    LoadedRecords {
        records: generate(now, fallback_days),
        provenance: Provenance::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push_id::encode;
    use crate::summary::summarize;
    use crate::types::{FieldValue, RawFields};

    struct FixedSource(RawSnapshot);

    #[async_trait::async_trait]
    impl RecordSource for FixedSource {
        fn name(&self) -> &str {
            "firebase"
        }

        async fn fetch_raw(&self) -> Result<RawSnapshot, SourceError> {
            Ok(self.0.clone())
        }

        async fn fetch_tree(&self) -> Result<serde_json::Value, SourceError> {
            Ok(serde_json::Value::Null)
        }
    }

    struct BrokenSource;

    #[async_trait::async_trait]
    impl RecordSource for BrokenSource {
        fn name(&self) -> &str {
            "firebase"
        }

        async fn fetch_raw(&self) -> Result<RawSnapshot, SourceError> {
            Err(SourceError::Http("connection refused".into()))
        }

        async fn fetch_tree(&self) -> Result<serde_json::Value, SourceError> {
            Err(SourceError::Http("connection refused".into()))
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-31T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn test_live_records_are_tagged_live() {
        let mut fields = RawFields::new();
        fields.insert("temperature".into(), FieldValue::Float(21.0));
        let snapshot: RawSnapshot = [(encode(now().timestamp_millis()), fields)]
            .into_iter()
            .collect();
        let source = FixedSource(snapshot);

        let loaded = load_records(Some(&source), now(), 30).await;
        assert_eq!(loaded.provenance, Provenance::Live("firebase".into()));
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].temperature, 21.0);
    }

    #[tokio::test]
    async fn test_empty_source_falls_back() {
        let source = FixedSource(RawSnapshot::new());
        let loaded = load_records(Some(&source), now(), 30).await;

        assert_eq!(loaded.provenance.tag(), "default");
        assert!(!loaded.provenance.is_live());
        assert_eq!(loaded.records, generate(now(), 30));
        assert!(summarize(&loaded.records).is_ok());
    }

    #[tokio::test]
    async fn test_failing_or_missing_source_falls_back() {
        let loaded = load_records(Some(&BrokenSource), now(), 5).await;
        assert_eq!(loaded.provenance, Provenance::Fallback);
        assert_eq!(loaded.records.len(), 5);

        let loaded = load_records(None, now(), 5).await;
        assert_eq!(loaded.provenance, Provenance::Fallback);
    }

    #[test]
    fn test_provenance_serializes_as_tag() {
        let json = serde_json::to_string(&Provenance::Live("firebase".into())).unwrap();
        assert_eq!(json, "\"firebase\"");
        let json = serde_json::to_string(&Provenance::Fallback).unwrap();
        assert_eq!(json, "\"default\"");
    }
}
