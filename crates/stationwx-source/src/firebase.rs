//! Firebase Realtime Database REST client

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use stationwx_core::{RawSnapshot, RecordSource, SourceError};

pub struct FirebaseSource {
    client: Client,
    base_url: Url,
    push_path: String,
    auth: Option<String>,
}

impl FirebaseSource {
    pub fn new(
        database_url: &str,
        push_path: &str,
        auth: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let mut base_url = Url::parse(database_url.trim())
            .map_err(|e| SourceError::Unavailable(format!("invalid database url: {}", e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            push_path: push_path.trim_matches('/').to_string(),
            auth,
        })
    }

    /// REST URL of `path` below the database root
    fn document_url(&self, path: &str) -> Result<Url, SourceError> {
        let mut url = self
            .base_url
            .join(&format!("{}.json", path))
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;
        if let Some(auth) = &self.auth {
            url.query_pairs_mut().append_pair("auth", auth);
        }
        Ok(url)
    }

    async fn get_json(&self, path: &str) -> Result<Value, SourceError> {
        let url = self.document_url(path)?;
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::Status { status, body });
        }
        resp.json::<Value>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl RecordSource for FirebaseSource {
    fn name(&self) -> &str {
        "firebase"
    }

    #[instrument(skip(self))]
    async fn fetch_raw(&self) -> Result<RawSnapshot, SourceError> {
        let document = self.get_json(&self.push_path).await?;
        let snapshot = RawSnapshot::from_json(document);
        debug!(records = snapshot.len(), "fetched push records");
        Ok(snapshot)
    }

    #[instrument(skip(self))]
    async fn fetch_tree(&self) -> Result<Value, SourceError> {
        self.get_json("").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    async fn push_records(Query(q): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
        if q.get("auth").map(String::as_str) != Some("s3cret") {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Permission denied"})),
            );
        }
        (
            StatusCode::OK,
            Json(json!({
                "-NjX2kLm0001": {"temperature": 21.5, "humidity": 60},
                "-NjX2kLn0002": {"temperature": "22.0"}
            })),
        )
    }

    async fn root() -> Json<Value> {
        Json(json!({"0001": {"push": {}, "realtime": {"temperature": 20.1}}}))
    }

    async fn serve() -> SocketAddr {
        let app = Router::new()
            .route("/0001/push.json", get(push_records))
            .route("/.json", get(root));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn source(addr: SocketAddr, auth: Option<&str>) -> FirebaseSource {
        FirebaseSource::new(
            &format!("http://{}", addr),
            "/0001/push/",
            auth.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_document_url() {
        let src = FirebaseSource::new(
            "https://station-default-rtdb.example.app",
            "0001/push",
            Some("a b".into()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            src.document_url("0001/push").unwrap().as_str(),
            "https://station-default-rtdb.example.app/0001/push.json?auth=a+b"
        );
        assert_eq!(
            src.document_url("").unwrap().as_str(),
            "https://station-default-rtdb.example.app/.json?auth=a+b"
        );
    }

    #[test]
    fn test_invalid_url() {
        let err = FirebaseSource::new("not a url", "0001/push", None, Duration::from_secs(1));
        assert!(matches!(err, Err(SourceError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_fetch_raw() {
        let addr = serve().await;
        let snapshot = source(addr, Some("s3cret")).fetch_raw().await.unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_request() {
        let addr = serve().await;
        let err = source(addr, None).fetch_raw().await.unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_fetch_tree() {
        let addr = serve().await;
        let tree = source(addr, None).fetch_tree().await.unwrap();
        assert_eq!(tree["0001"]["realtime"]["temperature"], json!(20.1));
    }
}
