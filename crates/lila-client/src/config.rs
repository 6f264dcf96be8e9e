//! Client configuration.
//!
//! Loaded from TOML (or JSON, by extension), then overridden from the
//! environment and validated.

use lila_commerce::checkout::GhnSettings;
use lila_commerce::voucher::{StoreClock, STORE_UTC_OFFSET_HOURS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding `api.base_url`.
pub const ENV_API_BASE_URL: &str = "LILA_API_BASE_URL";
/// Environment variable overriding `storage.path`.
pub const ENV_STORAGE_PATH: &str = "LILA_STORAGE_PATH";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Full client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,

    /// GHN origin warehouse and parcel defaults.
    #[serde(default)]
    pub ghn: GhnSettings,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

/// Backend connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL including the context path, e.g. `http://localhost:8080/lila_shop`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/lila_shop".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Chat polling cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub message_poll_secs: u64,
    pub unread_poll_secs: u64,
    pub conversation_poll_secs: u64,
    /// Distance from the bottom, in pixels, that still counts as "at the bottom".
    pub near_bottom_px: f64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            message_poll_secs: 3,
            unread_poll_secs: 15,
            conversation_poll_secs: 15,
            near_bottom_px: lila_commerce::chat::NEAR_BOTTOM_PX,
        }
    }
}

impl ChatConfig {
    pub fn message_interval(&self) -> Duration {
        Duration::from_secs(self.message_poll_secs)
    }

    pub fn unread_interval(&self) -> Duration {
        Duration::from_secs(self.unread_poll_secs)
    }

    pub fn conversation_interval(&self) -> Duration {
        Duration::from_secs(self.conversation_poll_secs)
    }
}

/// Where the local key-value snapshot lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Defaults to `$HOME/.local/share/lila/storage.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(default_storage_path)
    }
}

fn default_storage_path() -> PathBuf {
    let base = match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".local").join("share"),
        None => std::env::temp_dir(),
    };
    base.join("lila").join("storage.json")
}

/// Store-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// UTC offset of the store's calendar day, used for voucher windows.
    #[serde(default = "default_offset")]
    pub utc_offset_hours: i32,
}

fn default_offset() -> i32 {
    STORE_UTC_OFFSET_HOURS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_offset(),
        }
    }
}

impl ClientConfig {
    /// Load, apply environment overrides, and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: display.clone(),
            message: e.to_string(),
        })?;

        let mut config: Self = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: display,
                message: e.to_string(),
            })?
        } else {
            Self::from_toml_str(&content).map_err(|e| match e {
                ConfigError::Parse { message, .. } => ConfigError::Parse {
                    path: display,
                    message,
                },
                other => other,
            })?
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for when no file exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Apply `LILA_API_BASE_URL` and `LILA_STORAGE_PATH`.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Blank values are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(url) = get(ENV_API_BASE_URL) {
            self.api.base_url = url;
        }
        if let Some(path) = get(ENV_STORAGE_PATH) {
            self.storage.path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api.base_url must start with http:// or https://, got {url:?}"
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs must be non-zero".into()));
        }
        let intervals = [
            ("chat.message_poll_secs", self.chat.message_poll_secs),
            ("chat.unread_poll_secs", self.chat.unread_poll_secs),
            ("chat.conversation_poll_secs", self.chat.conversation_poll_secs),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be non-zero")));
        }
        if !(self.chat.near_bottom_px.is_finite() && self.chat.near_bottom_px >= 0.0) {
            return Err(ConfigError::Invalid(
                "chat.near_bottom_px must be a non-negative number".into(),
            ));
        }
        self.clock()?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// The calendar the voucher rules use.
    pub fn clock(&self) -> Result<StoreClock, ConfigError> {
        StoreClock::from_offset_hours(self.store.utc_offset_hours).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "store.utc_offset_hours out of range: {}",
                self.store.utc_offset_hours
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.ghn.from_district_id, 1454);
        assert_eq!(config.ghn.from_ward_code, "21211");
        assert_eq!(config.chat.message_interval(), Duration::from_secs(3));
        assert_eq!(config.chat.unread_interval(), Duration::from_secs(15));
        assert_eq!(config.store.utc_offset_hours, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = ClientConfig::from_toml_str(
            r#"
            [api]
            base_url = "https://api.lilashop.vn/lila_shop"

            [ghn]
            heavy_weight_threshold_grams = 15000

            [chat]
            message_poll_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://api.lilashop.vn/lila_shop");
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.ghn.heavy_weight_threshold_grams, 15_000);
        assert_eq!(config.ghn.service_type_heavy, 5);
        assert_eq!(config.chat.message_poll_secs, 5);
        assert_eq!(config.chat.unread_poll_secs, 15);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ClientConfig::default();
        config.apply_env_with(|key| match key {
            ENV_API_BASE_URL => Some("https://staging.lilashop.vn".to_string()),
            ENV_STORAGE_PATH => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.api.base_url, "https://staging.lilashop.vn");
        assert_eq!(config.storage.path, None);
    }

    #[test]
    fn test_validation() {
        let mut config = ClientConfig::default();
        config.api.base_url = "localhost:8080".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ClientConfig::default();
        config.chat.unread_poll_secs = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.store.utc_offset_hours = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("lila-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let toml_path = dir.join("lila.toml");
        std::fs::write(&toml_path, "[store]\nutc_offset_hours = 8\n").unwrap();
        let config = ClientConfig::load(&toml_path).unwrap();
        assert_eq!(config.store.utc_offset_hours, 8);

        let json_path = dir.join("lila.json");
        std::fs::write(&json_path, r#"{"chat": {"message_poll_secs": 0}}"#).unwrap();
        assert!(matches!(
            ClientConfig::load(&json_path),
            Err(ConfigError::Invalid(_))
        ));

        let missing = ClientConfig::load(dir.join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));

        std::fs::remove_dir_all(&dir).ok();
    }
}
