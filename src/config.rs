use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "LifeLink";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default listen address for the HTTP API.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Sessions last 12 hours unless overridden.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 12 * 60 * 60;

/// Donor search page size when the client does not ask for one.
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;

/// Upper bound on a single donor search page.
pub const MAX_SEARCH_LIMIT: u32 = 200;

const ENV_BIND: &str = "LIFELINK_BIND";
const ENV_DB_PATH: &str = "LIFELINK_DB_PATH";
const ENV_SESSION_TTL: &str = "LIFELINK_SESSION_TTL_SECS";
const ENV_TRUSTED_PROXIES: &str = "LIFELINK_TRUSTED_PROXIES";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "lifelink_lib=info,lifelink=info,tower_http=warn"
}

/// Get the application data directory
/// ~/LifeLink/ on all platforms, falling back to the working directory.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default database location.
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("lifelink.db")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidBind { var: &'static str, value: String },
    #[error("{var} must be a positive number of seconds: {value}")]
    InvalidTtl { var: &'static str, value: String },
    #[error("{var} contains an invalid IP address: {value}")]
    InvalidProxy { var: &'static str, value: String },
}

/// Runtime configuration resolved at start-up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub session_ttl: Duration,
    /// Peers allowed to name the real client in `X-Forwarded-For`.
    pub trusted_proxies: Vec<IpAddr>,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::InvalidBind {
            var: ENV_BIND,
            value: bind_raw.clone(),
        })?;

        let db_path = lookup(ENV_DB_PATH)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let session_ttl = match lookup(ENV_SESSION_TTL) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidTtl {
                        var: ENV_SESSION_TTL,
                        value: raw,
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
        };

        let trusted_proxies = match lookup(ENV_TRUSTED_PROXIES) {
            Some(raw) => parse_proxies(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            bind_addr,
            db_path,
            session_ttl,
            trusted_proxies,
        })
    }
}

fn parse_proxies(raw: &str) -> Result<Vec<IpAddr>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry.parse().map_err(|_| ConfigError::InvalidProxy {
                var: ENV_TRUSTED_PROXIES,
                value: entry.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_empty() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.db_path, default_db_path());
        assert_eq!(config.session_ttl, Duration::from_secs(DEFAULT_SESSION_TTL_SECS));
        assert!(config.trusted_proxies.is_empty());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("LIFELINK_BIND", "0.0.0.0:9000"),
            ("LIFELINK_DB_PATH", "/tmp/ll.db"),
            ("LIFELINK_SESSION_TTL_SECS", "600"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.db_path, PathBuf::from("/tmp/ll.db"));
        assert_eq!(config.session_ttl, Duration::from_secs(600));
    }

    #[test]
    fn bad_bind_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("LIFELINK_BIND", "not-an-addr")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBind { .. }));
    }

    #[test]
    fn trusted_proxies_parse_as_ip_list() {
        let config = AppConfig::from_lookup(lookup_from(&[(
            "LIFELINK_TRUSTED_PROXIES",
            "10.0.0.1, ::1,",
        )]))
        .unwrap();
        let expected: Vec<IpAddr> = vec!["10.0.0.1".parse().unwrap(), "::1".parse().unwrap()];
        assert_eq!(config.trusted_proxies, expected);

        let err = AppConfig::from_lookup(lookup_from(&[("LIFELINK_TRUSTED_PROXIES", "10.0.0.1,proxy")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProxy { value, .. } if value == "proxy"));
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("LIFELINK_SESSION_TTL_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTtl { .. }));
    }

    #[test]
    fn db_path_under_app_data() {
        assert!(default_db_path().starts_with(app_data_dir()));
        assert!(app_data_dir().ends_with("LifeLink"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }
}
