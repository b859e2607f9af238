//! Environment configuration.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

const ENV_PREFIX: &str = "CLIPIFY";
const DOCKERISED_VAR: &str = "IS_DOCKERISED";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Plain HTTP port that redirects to HTTPS. Port values may be written
    /// with a leading `:`.
    #[serde(default = "default_http_port")]
    pub http_port: String,
    #[serde(default = "default_https_port")]
    pub https_port: String,
    #[serde(default = "default_tls_cert_path")]
    pub tls_cert_path: PathBuf,
    #[serde(default = "default_tls_key_path")]
    pub tls_key_path: PathBuf,
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    /// Bind every interface instead of the resolved LAN address.
    #[serde(skip)]
    pub dockerised: bool,
}

fn default_http_port() -> String {
    "8080".to_string()
}

fn default_https_port() -> String {
    "8443".to_string()
}

fn default_tls_cert_path() -> PathBuf {
    PathBuf::from("localhost.crt")
}

fn default_tls_key_path() -> PathBuf {
    PathBuf::from("localhost.key")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./clips.db")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            https_port: default_https_port(),
            tls_cert_path: default_tls_cert_path(),
            tls_key_path: default_tls_key_path(),
            db_path: default_db_path(),
            static_dir: default_static_dir(),
            dockerised: false,
        }
    }
}

impl Config {
    /// Loads `CLIPIFY_*` variables plus `IS_DOCKERISED` from the process
    /// environment.
    pub fn load() -> AppResult<Self> {
        let dockerised = std::env::var_os(DOCKERISED_VAR).is_some_and(|v| !v.is_empty());
        Self::from_env(config::Environment::with_prefix(ENV_PREFIX), dockerised)
    }

    pub fn from_env(env: config::Environment, dockerised: bool) -> AppResult<Self> {
        let mut loaded: Self = config::Config::builder()
            .add_source(env)
            .build()?
            .try_deserialize()?;
        loaded.dockerised = dockerised;
        loaded.port()?;
        loaded.https_port()?;
        Ok(loaded)
    }

    pub fn port(&self) -> AppResult<u16> {
        parse_port(&self.http_port)
    }

    pub fn https_port(&self) -> AppResult<u16> {
        parse_port(&self.https_port)
    }
}

/// Accepts `"8080"` as well as `":8080"`.
pub fn parse_port(raw: &str) -> AppResult<u16> {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix(':')
        .unwrap_or(trimmed)
        .parse::<u16>()
        .map_err(|_| AppError::InvalidPort(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn defaults_apply_without_variables() {
        let loaded = Config::from_env(env(&[]), false).expect("load");
        assert_eq!(loaded, Config::default());
        assert_eq!(loaded.port().expect("port"), 8080);
        assert_eq!(loaded.https_port().expect("https port"), 8443);
        assert_eq!(loaded.tls_cert_path, PathBuf::from("localhost.crt"));
        assert_eq!(loaded.tls_key_path, PathBuf::from("localhost.key"));
    }

    #[test]
    fn reads_prefixed_variables() {
        let loaded = Config::from_env(
            env(&[
                ("CLIPIFY_HTTP_PORT", ":9000"),
                ("CLIPIFY_HTTPS_PORT", ":9443"),
                ("CLIPIFY_TLS_CERT_PATH", "/etc/clipify/cert.pem"),
                ("CLIPIFY_TLS_KEY_PATH", "/etc/clipify/key.pem"),
                ("CLIPIFY_DB_PATH", "/var/lib/clipify/clips.db"),
                ("CLIPIFY_STATIC_DIR", "/srv/www"),
            ]),
            true,
        )
        .expect("load");
        assert_eq!(loaded.port().expect("port"), 9000);
        assert_eq!(loaded.https_port().expect("https port"), 9443);
        assert_eq!(loaded.tls_cert_path, PathBuf::from("/etc/clipify/cert.pem"));
        assert_eq!(loaded.tls_key_path, PathBuf::from("/etc/clipify/key.pem"));
        assert_eq!(loaded.db_path, PathBuf::from("/var/lib/clipify/clips.db"));
        assert_eq!(loaded.static_dir, PathBuf::from("/srv/www"));
        assert!(loaded.dockerised);
    }

    #[test]
    fn rejects_non_numeric_port() {
        let err = Config::from_env(env(&[("CLIPIFY_HTTP_PORT", "http")]), false)
            .expect_err("bad port");
        assert!(matches!(err, AppError::InvalidPort(ref p) if p == "http"));
    }

    #[test]
    fn rejects_non_numeric_https_port() {
        let err = Config::from_env(env(&[("CLIPIFY_HTTPS_PORT", "tls")]), false)
            .expect_err("bad port");
        assert!(matches!(err, AppError::InvalidPort(ref p) if p == "tls"));
    }

    #[test]
    fn port_accepts_optional_colon() {
        assert_eq!(parse_port("8443").expect("port"), 8443);
        assert_eq!(parse_port(":8443").expect("port"), 8443);
        assert!(parse_port("::8443").is_err());
        assert!(parse_port("70000").is_err());
    }
}
