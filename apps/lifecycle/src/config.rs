//! # Server Configuration
//!
//! Resolves one [`ServerConfig`] value from, in increasing precedence:
//! built-in defaults, an optional TOML file, the environment, and CLI flags.
//!
//! ## Environment Variables
//!
//! - `DB_PATH`: SQLite file (default: `lifecycle.db`)
//! - `LIFECYCLE_STATIC_DIR`: front-end bundle root (default: `build`)
//! - `WEBSITE_HOSTNAME`: presence selects the hosted profile (`0.0.0.0:$PORT`)
//! - `PORT`: listening port in the hosted profile (default: 8080)
//! - `LIFECYCLE_REQUEST_TIMEOUT_SECS`: per-request timeout (default: 30)
//! - `LIFECYCLE_RATE_LIMIT`: requests per second, 0 disables (default: 100)
//! - `LIFECYCLE_CORS_ORIGINS`: comma-separated origins or `*` (default: localhost only)
//!
//! Without `WEBSITE_HOSTNAME` the server uses the local profile on
//! `127.0.0.1:5000`.

use lifecycle_core::LifecycleError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DB_PATH: &str = "lifecycle.db";
pub const DEFAULT_STATIC_DIR: &str = "build";
pub const DEFAULT_HOSTED_PORT: u16 = 8080;
pub const LOCAL_HOST: &str = "127.0.0.1";
pub const LOCAL_PORT: u16 = 5000;
pub const HOSTED_HOST: &str = "0.0.0.0";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RATE_LIMIT: u32 = 100;

// =============================================================================
// INPUT LAYERS
// =============================================================================

/// Settings read from a TOML file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub database: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub request_timeout_secs: Option<u64>,
    pub rate_limit: Option<u32>,
    pub cors_origins: Option<Vec<String>>,
}

impl FileConfig {
    /// Parse a TOML config file.
    pub fn from_path(path: &Path) -> Result<Self, LifecycleError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LifecycleError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Parse TOML text.
    pub fn from_toml(text: &str) -> Result<Self, LifecycleError> {
        toml::from_str(text).map_err(|e| LifecycleError::Config(e.to_string()))
    }
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

// =============================================================================
// RESOLVED CONFIG
// =============================================================================

/// Which listening profile the hosting signal selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostingProfile {
    /// `WEBSITE_HOSTNAME` is set: public host, port from `PORT`.
    Hosted,
    /// Local development on loopback.
    Local,
}

/// Allowed CORS origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    /// Only the usual localhost development origins.
    Localhost,
    /// Any origin.
    Any,
    /// An explicit list.
    List(Vec<String>),
}

impl CorsOrigins {
    fn parse(items: &[String]) -> Self {
        let items: Vec<String> = items
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if items.iter().any(|s| s == "*") {
            Self::Any
        } else if items.is_empty() {
            Self::Localhost
        } else {
            Self::List(items)
        }
    }
}

/// Everything the server needs at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database: PathBuf,
    pub static_dir: PathBuf,
    pub profile: HostingProfile,
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    pub cors_origins: CorsOrigins,
}

impl ServerConfig {
    /// Resolve configuration from the process environment and an optional
    /// TOML file.
    pub fn load(config_file: Option<&Path>, overrides: Overrides) -> Result<Self, LifecycleError> {
        let file = match config_file {
            Some(path) => FileConfig::from_path(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok(), overrides)
    }

    /// Resolve configuration from explicit layers.
    ///
    /// `env` looks up an environment variable by name.
    pub fn resolve<E>(file: FileConfig, env: E, overrides: Overrides) -> Result<Self, LifecycleError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let profile = if env("WEBSITE_HOSTNAME").is_some() {
            HostingProfile::Hosted
        } else {
            HostingProfile::Local
        };

        let database = overrides
            .database
            .or_else(|| env("DB_PATH").map(PathBuf::from))
            .or(file.database)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let static_dir = overrides
            .static_dir
            .or_else(|| env("LIFECYCLE_STATIC_DIR").map(PathBuf::from))
            .or(file.static_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        let (default_host, default_port) = match profile {
            HostingProfile::Hosted => (HOSTED_HOST, DEFAULT_HOSTED_PORT),
            HostingProfile::Local => (LOCAL_HOST, LOCAL_PORT),
        };

        let host = overrides
            .host
            .or(file.host)
            .unwrap_or_else(|| default_host.to_string());

        // PORT is only honoured by the hosted profile.
        let env_port = match profile {
            HostingProfile::Hosted => parse_env::<u16, _>(&env, "PORT")?,
            HostingProfile::Local => None,
        };
        let port = overrides
            .port
            .or(env_port)
            .or(file.port)
            .unwrap_or(default_port);

        let timeout_secs = parse_env::<u64, _>(&env, "LIFECYCLE_REQUEST_TIMEOUT_SECS")?
            .or(file.request_timeout_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(LifecycleError::Config(
                "request timeout must be at least 1 second".to_string(),
            ));
        }

        let rate_limit = parse_env::<u32, _>(&env, "LIFECYCLE_RATE_LIMIT")?
            .or(file.rate_limit)
            .unwrap_or(DEFAULT_RATE_LIMIT);

        let cors_origins = match env("LIFECYCLE_CORS_ORIGINS") {
            Some(raw) => {
                let items: Vec<String> = raw.split(',').map(str::to_string).collect();
                CorsOrigins::parse(&items)
            }
            None => file
                .cors_origins
                .as_deref()
                .map(CorsOrigins::parse)
                .unwrap_or(CorsOrigins::Localhost),
        };

        Ok(Self {
            database,
            static_dir,
            profile,
            host,
            port,
            request_timeout: Duration::from_secs(timeout_secs),
            rate_limit,
            cors_origins,
        })
    }

    /// `host:port` to bind.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T, E>(env: &E, key: &str) -> Result<Option<T>, LifecycleError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    E: Fn(&str) -> Option<String>,
{
    match env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| LifecycleError::Config(format!("{key}={raw:?}: {e}"))),
        None => Ok(None),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_use_local_profile() {
        let config =
            ServerConfig::resolve(FileConfig::default(), env_of(&[]), Overrides::default())
                .expect("resolve");
        assert_eq!(config.profile, HostingProfile::Local);
        assert_eq!(config.addr(), "127.0.0.1:5000");
        assert_eq!(config.database, PathBuf::from("lifecycle.db"));
        assert_eq!(config.static_dir, PathBuf::from("build"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.rate_limit, 100);
        assert_eq!(config.cors_origins, CorsOrigins::Localhost);
    }

    #[test]
    fn hosting_signal_selects_public_profile() {
        let env = env_of(&[("WEBSITE_HOSTNAME", "app.example.net"), ("PORT", "9000")]);
        let config = ServerConfig::resolve(FileConfig::default(), env, Overrides::default())
            .expect("resolve");
        assert_eq!(config.profile, HostingProfile::Hosted);
        assert_eq!(config.addr(), "0.0.0.0:9000");
    }

    #[test]
    fn hosted_profile_defaults_to_8080() {
        let env = env_of(&[("WEBSITE_HOSTNAME", "app.example.net")]);
        let config = ServerConfig::resolve(FileConfig::default(), env, Overrides::default())
            .expect("resolve");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn port_is_ignored_without_hosting_signal() {
        let env = env_of(&[("PORT", "9000")]);
        let config = ServerConfig::resolve(FileConfig::default(), env, Overrides::default())
            .expect("resolve");
        assert_eq!(config.port, LOCAL_PORT);
    }

    #[test]
    fn precedence_is_cli_then_env_then_file() {
        let file = FileConfig::from_toml(
            r#"
            database = "from-file.db"
            static_dir = "dist"
            rate_limit = 5
            "#,
        )
        .expect("toml");
        let env = env_of(&[("DB_PATH", "from-env.db")]);

        let config = ServerConfig::resolve(file.clone(), &env, Overrides::default())
            .expect("resolve");
        assert_eq!(config.database, PathBuf::from("from-env.db"));
        assert_eq!(config.static_dir, PathBuf::from("dist"));
        assert_eq!(config.rate_limit, 5);

        let overrides = Overrides {
            database: Some(PathBuf::from("from-cli.db")),
            ..Overrides::default()
        };
        let config = ServerConfig::resolve(file, &env, overrides).expect("resolve");
        assert_eq!(config.database, PathBuf::from("from-cli.db"));
    }

    #[test]
    fn invalid_numbers_are_config_errors() {
        let env = env_of(&[("WEBSITE_HOSTNAME", "x"), ("PORT", "eighty")]);
        let err = ServerConfig::resolve(FileConfig::default(), env, Overrides::default())
            .expect_err("should fail");
        assert!(matches!(err, LifecycleError::Config(_)));

        let env = env_of(&[("LIFECYCLE_REQUEST_TIMEOUT_SECS", "0")]);
        assert!(
            ServerConfig::resolve(FileConfig::default(), env, Overrides::default()).is_err()
        );
    }

    #[test]
    fn cors_origins_parse() {
        let env = env_of(&[("LIFECYCLE_CORS_ORIGINS", " https://a.org , https://b.org ")]);
        let config = ServerConfig::resolve(FileConfig::default(), env, Overrides::default())
            .expect("resolve");
        assert_eq!(
            config.cors_origins,
            CorsOrigins::List(vec!["https://a.org".to_string(), "https://b.org".to_string()])
        );

        let env = env_of(&[("LIFECYCLE_CORS_ORIGINS", "*")]);
        let config = ServerConfig::resolve(FileConfig::default(), env, Overrides::default())
            .expect("resolve");
        assert_eq!(config.cors_origins, CorsOrigins::Any);
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        assert!(FileConfig::from_toml("listen = \"0.0.0.0\"").is_err());
    }
}
