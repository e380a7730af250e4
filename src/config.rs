use anyhow::{Context, Result};
use std::net::SocketAddr;

// Service configuration sourced from environment variables. The variable
// names (`dataString`, `JWT_SECRET`, ...) are the deployment contract and
// predate this service; do not rename them.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    /// Postgres connection string; the in-memory backend is used when unset.
    pub database_url: Option<String>,
    /// HMAC key for the credential codec.
    pub jwt_secret: String,
    /// Enables the root-account setup endpoint.
    pub allow_admin: bool,
    /// Honor `X-Forwarded-For` for rate limiting. Only safe behind a proxy
    /// that strips the client-supplied header.
    pub trust_proxy: bool,
    /// Cache-tier address. The cache tier is an external collaborator; the
    /// core records the address so operators see it in startup logs.
    pub cache_addr: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let port: u16 = std::env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .with_context(|| "parse SERVER_PORT")?;
        let metrics_port: u16 = std::env::var("METRICS_PORT")
            .unwrap_or_else(|_| "9100".to_string())
            .parse()
            .with_context(|| "parse METRICS_PORT")?;
        let jwt_secret = std::env::var("JWT_SECRET").with_context(|| "JWT_SECRET must be set")?;
        let allow_admin = std::env::var("ALLOW_ADMIN")
            .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes"))
            .unwrap_or(false);
        let trust_proxy = std::env::var("TRUST_PROXY")
            .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes"))
            .unwrap_or(false);
        Ok(Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            metrics_bind: SocketAddr::from(([0, 0, 0, 0], metrics_port)),
            database_url: std::env::var("dataString").ok().filter(|s| !s.is_empty()),
            jwt_secret,
            allow_admin,
            trust_proxy,
            cache_addr: std::env::var("REDIS").ok().filter(|s| !s.is_empty()),
        })
    }
}
