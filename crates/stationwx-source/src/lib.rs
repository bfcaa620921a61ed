//! Record sources backing the dashboard
//!
//! The live source is the Firebase Realtime Database the station pushes
//! into. A JSON export of that database can stand in for it offline.

pub mod export;
pub mod firebase;

pub use export::*;
pub use firebase::*;

use std::sync::Arc;

use stationwx_config::AppConfig;
use stationwx_core::{RecordSource, SourceError};

/// Build the configured source.
///
/// Returns `Ok(None)` when neither a database URL nor an export file is
/// configured. The database URL wins when both are set.
pub fn connect(cfg: &AppConfig) -> Result<Option<Arc<dyn RecordSource>>, SourceError> {
    if let Some(url) = cfg.firebase_url() {
        let source = FirebaseSource::new(
            &url,
            &cfg.firebase_path(),
            cfg.firebase_auth(),
            cfg.firebase_timeout(),
        )?;
        tracing::info!(%url, path = %cfg.firebase_path(), "using Firebase source");
        return Ok(Some(Arc::new(source)));
    }

    if let Some(path) = cfg.export_path() {
        let source = ExportFileSource::new(&path, &cfg.firebase_path())?;
        tracing::info!(%path, "using export file source");
        return Ok(Some(Arc::new(source)));
    }

    Ok(None)
}
