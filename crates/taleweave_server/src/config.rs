//! Server configuration from the environment.

use std::env;

/// Process-wide server configuration.
///
/// Every key has a default except the gateway's API key, which the gateway
/// reads for itself.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listening port
    pub port: u16,
    /// Allowed CORS origin, `*` for any
    pub cors_origin: String,
    /// Document store location
    pub mongo_url: String,
    /// Document store database name
    pub mongo_db: String,
    /// Firebase service-account credential, JSON or base64; `None` falls back
    /// to application-default credentials
    pub firebase_credentials: Option<String>,
    /// Idle HTTP timeout in seconds; must exceed the LLM's worst-case latency
    pub idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            cors_origin: "*".to_string(),
            mongo_url: "mongodb://mongo:27017".to_string(),
            mongo_db: "taletwo".to_string(),
            firebase_credentials: None,
            idle_timeout_secs: 255,
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    ///
    /// Reads:
    /// - `PORT` (default: 3000)
    /// - `CORS_ORIGIN` (default: `*`)
    /// - `MONGO_URL` (default: `mongodb://mongo:27017`)
    /// - `MONGO_DB` (default: `taletwo`)
    /// - `FIREBASE_SERVICE_ACCOUNT` / `FIREBASE_SERVICE_ACCOUNT_BASE64`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(port) = env::var("PORT").ok().and_then(|v| v.parse().ok()) {
            config.port = port;
        }
        if let Ok(origin) = env::var("CORS_ORIGIN") {
            config.cors_origin = origin;
        }
        if let Ok(url) = env::var("MONGO_URL") {
            config.mongo_url = url;
        }
        if let Ok(db) = env::var("MONGO_DB") {
            config.mongo_db = db;
        }
        config.firebase_credentials = env::var("FIREBASE_SERVICE_ACCOUNT")
            .or_else(|_| env::var("FIREBASE_SERVICE_ACCOUNT_BASE64"))
            .ok();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_deployment_contract() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origin, "*");
        assert_eq!(config.mongo_url, "mongodb://mongo:27017");
        assert_eq!(config.mongo_db, "taletwo");
        assert!(config.idle_timeout_secs > 240);
    }
}
