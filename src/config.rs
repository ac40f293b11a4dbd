// Environment configuration for the session service

use std::env;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_STORE_HOST: &str = "127.0.0.1";
pub const DEFAULT_STORE_PORT: u16 = 3000;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 1800;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Which key-value backend to connect to at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process store, for development and tests.
    Memory,
    /// Redis, the production backend.
    Redis,
}

/// Process-wide configuration, read once at startup and passed explicitly
/// to the components that need it.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub store_host: String,
    pub store_port: u16,
    pub session_ttl_secs: u64,
    /// Legacy log format flag: store the ip value in the audit entry's
    /// user_agent field for create/validate events. See DESIGN.md.
    pub audit_ua_from_ip: bool,
    pub bind_addr: String,
}

impl Config {
    /// Load configuration from the environment. Every value has a default;
    /// unparsable values fall back to the default with a warning.
    pub fn from_env() -> Self {
        Self {
            store_backend: parse_backend(env::var("STORE_BACKEND").ok()),
            store_host: env::var("STORE_HOST").unwrap_or_else(|_| DEFAULT_STORE_HOST.to_string()),
            store_port: parse_port(env::var("STORE_PORT").ok()),
            session_ttl_secs: parse_ttl_secs(env::var("SESSION_TTL").ok()),
            audit_ua_from_ip: parse_bool(env::var("AUDIT_UA_FROM_IP").ok(), true),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
        }
    }

    /// Connection URL for the Redis backend.
    pub fn store_url(&self) -> String {
        format!("redis://{}:{}", self.store_host, self.store_port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

fn parse_backend(raw: Option<String>) -> StoreBackend {
    match raw.as_deref() {
        None | Some("redis") => StoreBackend::Redis,
        Some("memory") => StoreBackend::Memory,
        Some(other) => {
            warn!("unknown STORE_BACKEND '{}', falling back to redis", other);
            StoreBackend::Redis
        }
    }
}

fn parse_port(raw: Option<String>) -> u16 {
    match raw.as_deref().map(str::parse::<u16>) {
        Some(Ok(port)) => port,
        Some(Err(_)) => {
            warn!("unparsable STORE_PORT, falling back to {}", DEFAULT_STORE_PORT);
            DEFAULT_STORE_PORT
        }
        None => DEFAULT_STORE_PORT,
    }
}

/// Session TTL in seconds. Non-positive or unparsable values fall back to
/// the default.
fn parse_ttl_secs(raw: Option<String>) -> u64 {
    match raw.as_deref().map(str::parse::<i64>) {
        Some(Ok(ttl)) if ttl > 0 => ttl as u64,
        Some(_) => {
            warn!(
                "invalid SESSION_TTL, falling back to {}",
                DEFAULT_SESSION_TTL_SECS
            );
            DEFAULT_SESSION_TTL_SECS
        }
        None => DEFAULT_SESSION_TTL_SECS,
    }
}

fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match raw.as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_defaults() {
        assert_eq!(parse_ttl_secs(None), DEFAULT_SESSION_TTL_SECS);
        assert_eq!(
            parse_ttl_secs(Some("abc".to_string())),
            DEFAULT_SESSION_TTL_SECS
        );
        assert_eq!(
            parse_ttl_secs(Some("0".to_string())),
            DEFAULT_SESSION_TTL_SECS
        );
        assert_eq!(
            parse_ttl_secs(Some("-60".to_string())),
            DEFAULT_SESSION_TTL_SECS
        );
    }

    #[test]
    fn test_ttl_valid() {
        assert_eq!(parse_ttl_secs(Some("60".to_string())), 60);
        assert_eq!(parse_ttl_secs(Some("86400".to_string())), 86400);
    }

    #[test]
    fn test_port_fallback() {
        assert_eq!(parse_port(None), DEFAULT_STORE_PORT);
        assert_eq!(parse_port(Some("not-a-port".to_string())), DEFAULT_STORE_PORT);
        assert_eq!(parse_port(Some("6379".to_string())), 6379);
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!(parse_backend(None), StoreBackend::Redis);
        assert_eq!(
            parse_backend(Some("memory".to_string())),
            StoreBackend::Memory
        );
        assert_eq!(parse_backend(Some("redis".to_string())), StoreBackend::Redis);
        assert_eq!(
            parse_backend(Some("cassandra".to_string())),
            StoreBackend::Redis
        );
    }

    #[test]
    fn test_bool_parsing() {
        assert!(parse_bool(None, true));
        assert!(!parse_bool(None, false));
        assert!(parse_bool(Some("1".to_string()), false));
        assert!(!parse_bool(Some("false".to_string()), true));
        assert!(parse_bool(Some("garbage".to_string()), true));
    }
}
