use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_PUSH_PATH: &str = "0001/push";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_FALLBACK_DAYS: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FirebaseConfig {
    /// Realtime Database root, e.g. `https://<project>.firebasedatabase.app`
    pub database_url: Option<String>,
    /// Location of the push records below the root
    pub path: Option<String>,
    /// Database secret or ID token sent as `auth`
    pub auth: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExportConfig {
    /// JSON export of the database used instead of the live REST API
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FallbackConfig {
    pub days: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub server: Option<ServerConfig>,
    pub firebase: Option<FirebaseConfig>,
    pub export: Option<ExportConfig>,
    pub fallback: Option<FallbackConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },
}

impl AppConfig {
    /// Load configuration from the STATIONWX_CONFIG path (TOML) if present,
    /// then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("STATIONWX_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = if Path::new(&path).exists() {
            let s = fs::read_to_string(&path)?;
            Self::from_toml(&s)?
        } else {
            AppConfig::default()
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str::<AppConfig>(s)?)
    }

    /// Override file values with HOST, PORT, FIREBASE_DATABASE_URL,
    /// FIREBASE_PATH, FIREBASE_AUTH, STATIONWX_EXPORT and FALLBACK_DAYS
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server = self.server.get_or_insert_with(Default::default);
        if let Some(host) = lookup("HOST") {
            server.host = Some(host);
        }
        if let Some(port) = lookup("PORT") {
            server.port = Some(parse_env("PORT", port)?);
        }

        let firebase = self.firebase.get_or_insert_with(Default::default);
        if let Some(url) = lookup("FIREBASE_DATABASE_URL") {
            firebase.database_url = Some(url);
        }
        if let Some(path) = lookup("FIREBASE_PATH") {
            firebase.path = Some(path);
        }
        if let Some(auth) = lookup("FIREBASE_AUTH") {
            firebase.auth = Some(auth);
        }

        if let Some(path) = lookup("STATIONWX_EXPORT") {
            self.export.get_or_insert_with(Default::default).path = Some(path);
        }
        if let Some(days) = lookup("FALLBACK_DAYS") {
            self.fallback.get_or_insert_with(Default::default).days =
                Some(parse_env("FALLBACK_DAYS", days)?);
        }
        Ok(())
    }

    /// Get HTTP bind address (default 0.0.0.0:5000)
    pub fn http_bind(&self) -> String {
        let server = self.server.as_ref();
        let host = server
            .and_then(|s| s.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = server.and_then(|s| s.port).unwrap_or(DEFAULT_PORT);
        format!("{}:{}", host, port)
    }

    pub fn firebase_url(&self) -> Option<String> {
        self.firebase
            .as_ref()
            .and_then(|f| f.database_url.clone())
            .filter(|u| !u.trim().is_empty())
    }

    pub fn firebase_path(&self) -> String {
        self.firebase
            .as_ref()
            .and_then(|f| f.path.clone())
            .unwrap_or_else(|| DEFAULT_PUSH_PATH.to_string())
    }

    pub fn firebase_auth(&self) -> Option<String> {
        self.firebase
            .as_ref()
            .and_then(|f| f.auth.clone())
            .filter(|a| !a.is_empty())
    }

    pub fn firebase_timeout(&self) -> Duration {
        let secs = self
            .firebase
            .as_ref()
            .and_then(|f| f.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn export_path(&self) -> Option<String> {
        self.export.as_ref().and_then(|e| e.path.clone())
    }

    /// Days of synthetic history served when no live data exists (default 30)
    pub fn fallback_days(&self) -> usize {
        self.fallback
            .as_ref()
            .and_then(|f| f.days)
            .unwrap_or(DEFAULT_FALLBACK_DAYS)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.http_bind(), "0.0.0.0:5000");
        assert_eq!(cfg.firebase_url(), None);
        assert_eq!(cfg.firebase_path(), "0001/push");
        assert_eq!(cfg.firebase_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.fallback_days(), 30);
    }

    #[test]
    fn parses_toml() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            port = 8080

            [firebase]
            database_url = "https://station-default-rtdb.example.app"
            path = "0002/push"
            timeout_secs = 3

            [fallback]
            days = 7
            "#,
        )
        .unwrap();
        assert_eq!(cfg.http_bind(), "0.0.0.0:8080");
        assert_eq!(
            cfg.firebase_url().as_deref(),
            Some("https://station-default-rtdb.example.app")
        );
        assert_eq!(cfg.firebase_path(), "0002/push");
        assert_eq!(cfg.firebase_timeout(), Duration::from_secs(3));
        assert_eq!(cfg.fallback_days(), 7);
    }

    #[test]
    fn env_overrides_file() {
        let mut cfg = AppConfig::from_toml("[server]\nport = 8080\n").unwrap();
        cfg.apply_env(env(&[
            ("PORT", "9000"),
            ("HOST", "127.0.0.1"),
            ("FIREBASE_AUTH", "secret"),
            ("STATIONWX_EXPORT", "export.json"),
        ]))
        .unwrap();
        assert_eq!(cfg.http_bind(), "127.0.0.1:9000");
        assert_eq!(cfg.firebase_auth().as_deref(), Some("secret"));
        assert_eq!(cfg.export_path().as_deref(), Some("export.json"));
    }

    #[test]
    fn invalid_env_value() {
        let mut cfg = AppConfig::default();
        let err = cfg.apply_env(env(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn blank_url_means_unconfigured() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[("FIREBASE_DATABASE_URL", " ")])).unwrap();
        assert_eq!(cfg.firebase_url(), None);
    }
}
