use url::Url;

use crate::dashboard::Dashboard;
use crate::error::{ClientError, Result};
use crate::session::Session;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/predict";

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub session_db: String,
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            session_db: "./fraudboard.sqlite".to_string(),
            http_timeout_secs: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            endpoint: std::env::var("FRAUD_ENDPOINT").unwrap_or(d.endpoint),
            session_db: std::env::var("SESSION_DB").unwrap_or(d.session_db),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(d.http_timeout_secs),
        }
    }

    pub fn endpoint_url(&self) -> Result<Url> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| ClientError::Config(format!("invalid endpoint {:?}: {}", self.endpoint, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ClientError::Config(format!("unsupported endpoint scheme {:?}", other))),
        }
    }
}

/// Everything a command needs: config, the session gate, and the
/// dashboard's in-memory state.
pub struct AppContext {
    pub config: Config,
    pub session: Session,
    pub dashboard: Dashboard,
}

impl AppContext {
    pub fn open(config: Config) -> anyhow::Result<Self> {
        let session = Session::open(&config.session_db)?;
        Ok(Self {
            config,
            session,
            dashboard: Dashboard::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint_parses() {
        let url = Config::default().endpoint_url().unwrap();
        assert_eq!(url.path(), "/predict");
        assert_eq!(url.port(), Some(8000));
    }

    #[test]
    fn test_rejects_bad_endpoints() {
        let mut cfg = Config::default();
        cfg.endpoint = "not a url".to_string();
        assert!(matches!(cfg.endpoint_url(), Err(ClientError::Config(_))));
        cfg.endpoint = "ftp://host/predict".to_string();
        assert!(matches!(cfg.endpoint_url(), Err(ClientError::Config(_))));
    }
}
