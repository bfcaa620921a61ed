//! Records read from a JSON export of the database

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use stationwx_core::{RawSnapshot, RecordSource, SourceError};

/// Serves a database export file, re-read on every fetch
pub struct ExportFileSource {
    file: PathBuf,
    push_path: String,
}

impl ExportFileSource {
    pub fn new<P: AsRef<Path>>(file: P, push_path: &str) -> Result<Self, SourceError> {
        let file = file.as_ref().to_path_buf();
        if !file.is_file() {
            return Err(SourceError::Unavailable(format!(
                "export file {} not found",
                file.display()
            )));
        }
        Ok(Self {
            file,
            push_path: push_path.trim_matches('/').to_string(),
        })
    }

    async fn read_document(&self) -> Result<Value, SourceError> {
        let text = tokio::fs::read_to_string(&self.file).await?;
        serde_json::from_str(&text).map_err(|e| SourceError::Decode(e.to_string()))
    }
}

/// Descend into `document` along a slash separated path.
///
/// An export of just the push node lacks even the first segment and is
/// returned unchanged. Once the first segment matches, a missing node below
/// it means there are no records.
fn select_path(document: Value, path: &str) -> Value {
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let Some(first) = segments.next() else {
        return document;
    };
    let Some(root) = document.get(first) else {
        return document;
    };
    segments
        .try_fold(root, |node, segment| node.get(segment))
        .cloned()
        .unwrap_or(Value::Null)
}

#[async_trait::async_trait]
impl RecordSource for ExportFileSource {
    fn name(&self) -> &str {
        "export"
    }

    #[instrument(skip(self))]
    async fn fetch_raw(&self) -> Result<RawSnapshot, SourceError> {
        let document = self.read_document().await?;
        let snapshot = RawSnapshot::from_json(select_path(document, &self.push_path));
        debug!(records = snapshot.len(), file = %self.file.display(), "read export");
        Ok(snapshot)
    }

    async fn fetch_tree(&self) -> Result<Value, SourceError> {
        self.read_document().await
    }
}
