//! Bootstrap configuration.
//!
//! Values are layered with figment, lowest precedence first:
//! - built-in defaults
//! - a TOML file (`bootstrap.toml` in the working directory, or `--config`)
//! - `SCHEMA_BOOTSTRAP_*` environment variables, nested keys split on `__`
//!
//! The binary applies command-line overrides on top of the loaded value.

use crate::error::BootstrapError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "SCHEMA_BOOTSTRAP_";
pub const DEFAULT_CONFIG_FILE: &str = "bootstrap.toml";
pub const DEFAULT_SCHEMA_PATH: &str = "database/schema.sql";

/// MySQL limits database names to 64 characters.
const MAX_DATABASE_NAME_LEN: usize = 64;

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectionConfig {
    #[serde(deserialize_with = "string_like")]
    pub host: String,
    pub port: u16,
    #[serde(deserialize_with = "string_like")]
    pub username: String,
    #[serde(deserialize_with = "string_like")]
    pub password: String,
    /// Character set negotiated for the client connection.
    #[serde(deserialize_with = "string_like")]
    pub charset: String,
    #[serde(deserialize_with = "string_like")]
    pub database: String,
}

/// String fields of [`ConnectionConfig`] read verbatim from the environment.
const RAW_STRING_KEYS: &[&str] = &["host", "username", "password", "charset", "database"];

/// Accept scalars for string fields: figment types `PASSWORD=12345` as a number.
fn string_like<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringLike;

    impl Visitor<'_> for StringLike {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, number or boolean")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_char<E: de::Error>(self, v: char) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i128<E: de::Error>(self, v: i128) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(StringLike)
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            username: "root".to_string(),
            password: String::new(),
            charset: "utf8mb4".to_string(),
            database: String::new(),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("charset", &self.charset)
            .field("database", &self.database)
            .finish()
    }
}

impl ConnectionConfig {
    /// Reject configurations that cannot possibly work, before any I/O.
    pub fn validate(&self) -> Result<(), BootstrapError> {
        if self.host.trim().is_empty() {
            return Err(BootstrapError::Config("host must not be empty".into()));
        }
        let name = &self.database;
        if name.trim().is_empty() {
            return Err(BootstrapError::Config(
                "database name must not be empty".into(),
            ));
        }
        if name.chars().count() > MAX_DATABASE_NAME_LEN {
            return Err(BootstrapError::Config(format!(
                "database name exceeds {MAX_DATABASE_NAME_LEN} characters"
            )));
        }
        if name.ends_with(' ') {
            return Err(BootstrapError::Config(
                "database name must not end with a space".into(),
            ));
        }
        if name.contains('\0') {
            return Err(BootstrapError::Config(
                "database name must not contain NUL".into(),
            ));
        }
        if self.charset.trim().is_empty() {
            return Err(BootstrapError::Config("charset must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BootstrapConfig {
    pub database: ConnectionConfig,
    pub schema_path: PathBuf,
    pub loglevel: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            database: ConnectionConfig::default(),
            schema_path: PathBuf::from(DEFAULT_SCHEMA_PATH),
            loglevel: "info".to_string(),
        }
    }
}

impl BootstrapConfig {
    /// Load configuration from defaults, a TOML file and the environment.
    ///
    /// An explicit `path` must exist; the implicit `bootstrap.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, BootstrapError> {
        let mut figment = Figment::from(Serialized::defaults(BootstrapConfig::default()));

        match path {
            Some(p) => {
                if !p.is_file() {
                    return Err(BootstrapError::Config(format!(
                        "config file {} not found",
                        p.display()
                    )));
                }
                figment = figment.merge(Toml::file_exact(p));
            }
            None => {
                if Path::new(DEFAULT_CONFIG_FILE).is_file() {
                    figment = figment.merge(Toml::file_exact(DEFAULT_CONFIG_FILE));
                }
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        // figment parses env values, which would turn a password of `0012` into 12
        for key in RAW_STRING_KEYS {
            let var = format!("{ENV_PREFIX}DATABASE__{}", key.to_ascii_uppercase());
            if let Ok(raw) = std::env::var(&var) {
                figment = figment.merge(Serialized::default(&format!("database.{key}"), raw));
            }
        }

        figment
            .extract()
            .map_err(|e| BootstrapError::Config(e.to_string()))
    }
}
