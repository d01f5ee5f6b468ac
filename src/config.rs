//! Configuration types for bit-installer
//!
//! The installable apps are described by a TOML manifest:
//!
//! ```toml
//! [[apps]]
//! package_name = "com.example.game"
//! app_name = "Example Game"
//! target_path = "files/patch.bin"
//!
//! [apps.github]
//! release_tag = "v1.2.0"
//! asset_name = "patch.bin"
//! expected_sha256 = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
//! ```
//!
//! Values from any configuration source are re-validated by
//! [`Config::validate`]; nothing here is trusted on its own.

use crate::error::{Error, Result};
use crate::hashing::is_valid_digest;
use crate::validation::{
    DEFAULT_PRIVILEGED_ROOT, validate_package_identifier, validate_relative_path,
    validate_source_identifier,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Download behavior configuration (temp directory, space threshold, timeouts)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory holding temporary download artifacts (default: system temp dir)
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Minimum free space in bytes before an attempt may start (default: 50 MiB)
    #[serde(default = "default_min_free_space")]
    pub min_free_space: u64,

    /// Connect timeout (default: 30 seconds)
    #[serde(with = "duration_secs", default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// Timeout for each body chunk read (default: 30 seconds)
    #[serde(with = "duration_secs", default = "default_read_timeout")]
    pub read_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept plain `http://` URLs (default: false, HTTPS only)
    #[serde(default)]
    pub allow_http: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            min_free_space: default_min_free_space(),
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
            user_agent: default_user_agent(),
            allow_http: false,
        }
    }
}

/// Privileged placement configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstallConfig {
    /// Root holding per-package private data directories (default: "/data/data")
    #[serde(default = "default_privileged_root")]
    pub privileged_root: PathBuf,

    /// Binary invoked as `[copy_binary, source, destination]` (default: "cp")
    #[serde(default = "default_copy_binary")]
    pub copy_binary: String,

    /// Token passed along with authorization requests
    #[serde(default = "default_authorization_token")]
    pub authorization_token: u32,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            privileged_root: default_privileged_root(),
            copy_binary: default_copy_binary(),
            authorization_token: default_authorization_token(),
        }
    }
}

/// Release catalog configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the releases API (default: "https://api.github.com")
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Source repository in `owner/repository` form
    #[serde(default = "default_source")]
    pub source: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            source: default_source(),
        }
    }
}

/// Release coordinates of a single installable app
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSourceConfig {
    /// Release tag holding the asset
    pub release_tag: String,
    /// Asset file name inside that release
    pub asset_name: String,
    /// Expected SHA-256 of the asset (hex)
    #[serde(default)]
    pub expected_sha256: Option<String>,
}

/// One installable item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Dotted identifier of the target app
    pub package_name: String,
    /// Display name
    pub app_name: String,
    /// Destination path relative to the app's data directory
    pub target_path: String,
    /// Where to fetch the artifact from
    pub github: ReleaseSourceConfig,
}

/// Main configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Privileged placement settings
    #[serde(default)]
    pub install: InstallConfig,

    /// Release catalog settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Installable apps
    #[serde(default)]
    pub apps: Vec<AppConfig>,
}

impl Config {
    /// Parse a TOML manifest and validate it
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML manifest from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), apps = config.apps.len(), "loaded configuration");
        Ok(config)
    }

    /// Re-run every identifier and path check on the loaded values
    pub fn validate(&self) -> Result<()> {
        if !validate_source_identifier(&self.catalog.source) {
            return Err(config_error(
                "catalog.source",
                format!("'{}' is not in owner/repository format", self.catalog.source),
            ));
        }
        if self.install.copy_binary.trim().is_empty() {
            return Err(config_error("install.copy_binary", "must not be empty"));
        }
        if self.apps.is_empty() {
            return Err(config_error("apps", "no apps configured"));
        }
        for (i, app) in self.apps.iter().enumerate() {
            app.validate(i)?;
        }
        Ok(())
    }
}

impl AppConfig {
    fn validate(&self, index: usize) -> Result<()> {
        let key = |field: &str| format!("apps[{index}].{field}");
        let required = [
            ("package_name", &self.package_name),
            ("app_name", &self.app_name),
            ("target_path", &self.target_path),
            ("github.release_tag", &self.github.release_tag),
            ("github.asset_name", &self.github.asset_name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(config_error(
                    key(field),
                    format!("app '{}' has empty {field}", self.app_name),
                ));
            }
        }

        if !validate_package_identifier(&self.package_name) {
            return Err(config_error(
                key("package_name"),
                format!(
                    "app '{}' has invalid package_name: {}",
                    self.app_name, self.package_name
                ),
            ));
        }
        if !validate_relative_path(&self.target_path) {
            return Err(config_error(
                key("target_path"),
                format!(
                    "app '{}' has invalid target_path: {}",
                    self.app_name, self.target_path
                ),
            ));
        }
        if let Some(expected) = &self.github.expected_sha256
            && !is_valid_digest(expected)
        {
            return Err(config_error(
                key("github.expected_sha256"),
                format!("app '{}' has a malformed expected_sha256", self.app_name),
            ));
        }
        Ok(())
    }
}

fn config_error(key: impl Into<String>, message: impl Into<String>) -> Error {
    Error::Config {
        message: message.into(),
        key: Some(key.into()),
    }
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_min_free_space() -> u64 {
    50 * 1024 * 1024
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_read_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("bit-installer/{}", env!("CARGO_PKG_VERSION"))
}

fn default_privileged_root() -> PathBuf {
    PathBuf::from(DEFAULT_PRIVILEGED_ROOT)
}

fn default_copy_binary() -> String {
    "cp".to_string()
}

fn default_authorization_token() -> u32 {
    1001
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_source() -> String {
    "S0methingSomething/BitBot".to_string()
}

/// Serialize durations as whole seconds
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
