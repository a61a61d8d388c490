use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::Secret;
use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::with_security_headers;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ASSET_FOLDER: &str = "DevEvent";
const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";
const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AssetStoreConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: Secret<String>,
    pub api_base: String,
    /// Destination folder for event images.
    pub folder: String,
    pub timeout_secs: u64,
}

/// Settings consumed while assembling the router.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<String>,
    /// Production mode turns on HSTS.
    pub production: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_origins: split_origins(DEFAULT_ALLOWED_ORIGINS),
            production: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database: DatabaseConfig,
    pub assets: AssetStoreConfig,
    pub http: HttpConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let or_default = |key: &str, default: &str| -> String {
            lookup(key).unwrap_or_else(|| default.to_string())
        };

        let host: IpAddr = parse("SERVER_HOST", or_default("SERVER_HOST", DEFAULT_HOST))?;
        let port: u16 = parse(
            "SERVER_PORT",
            or_default("SERVER_PORT", &DEFAULT_PORT.to_string()),
        )?;

        let database = DatabaseConfig {
            url: Secret::new(required("DATABASE_URL")?),
            max_connections: parse(
                "DATABASE_MAX_CONNECTIONS",
                or_default(
                    "DATABASE_MAX_CONNECTIONS",
                    &DEFAULT_MAX_CONNECTIONS.to_string(),
                ),
            )?,
        };

        let assets = AssetStoreConfig {
            cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
            api_key: required("CLOUDINARY_API_KEY")?,
            api_secret: Secret::new(required("CLOUDINARY_API_SECRET")?),
            api_base: or_default("CLOUDINARY_API_BASE", DEFAULT_CLOUDINARY_API_BASE),
            folder: or_default("CLOUDINARY_FOLDER", DEFAULT_ASSET_FOLDER),
            timeout_secs: parse(
                "ASSET_UPLOAD_TIMEOUT_SECS",
                or_default(
                    "ASSET_UPLOAD_TIMEOUT_SECS",
                    &DEFAULT_UPLOAD_TIMEOUT_SECS.to_string(),
                ),
            )?,
        };

        let max_upload_bytes = parse(
            "MAX_UPLOAD_BYTES",
            or_default("MAX_UPLOAD_BYTES", &DEFAULT_MAX_UPLOAD_BYTES.to_string()),
        )?;

        let allowed_origins = split_origins(&or_default(
            "CORS_ALLOWED_ORIGINS",
            DEFAULT_ALLOWED_ORIGINS,
        ));

        let production = lookup("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            database,
            assets,
            http: HttpConfig {
                max_upload_bytes,
                allowed_origins,
                production,
            },
        })
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

pub fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/devevent"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_API_KEY", "key"),
            ("CLOUDINARY_API_SECRET", "secret"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_fill_optional_values() {
        let config = load(&base_env()).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3001".parse::<SocketAddr>().unwrap());
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.url.expose_secret(), "postgres://localhost/devevent");
        assert_eq!(config.assets.folder, "DevEvent");
        assert_eq!(config.http.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(
            config.http.allowed_origins,
            vec!["http://localhost:3000", "http://localhost:5173"]
        );
        assert!(!config.http.production);
    }

    #[test]
    fn missing_credentials_are_reported_by_name() {
        let mut env = base_env();
        env.remove("CLOUDINARY_API_SECRET");

        let err = load(&env).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CLOUDINARY_API_SECRET")));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let mut env = base_env();
        env.insert("SERVER_PORT", "eighty");

        let err = load(&env).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SERVER_PORT", .. }));
    }

    #[test]
    fn production_flag_is_case_insensitive() {
        let mut env = base_env();
        env.insert("RUST_ENV", "Production");
        env.insert("CLOUDINARY_FOLDER", "Events");

        let config = load(&env).unwrap();
        assert!(config.http.production);
        assert_eq!(config.assets.folder, "Events");
    }

    #[test]
    fn origins_skip_blank_entries() {
        assert_eq!(
            split_origins(" https://a.dev , ,https://b.dev"),
            vec!["https://a.dev", "https://b.dev"]
        );
    }
}
