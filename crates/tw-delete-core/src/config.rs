use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Maximum number of posts the timeline endpoint returns per page
pub const MAX_PAGE_SIZE: u32 = 200;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Delete posts older than this (e.g. "120h", "30d")
    #[serde(default = "default_after")]
    pub after: String,
    /// Directory to archive posts into before deleting them
    #[serde(default)]
    pub archive_dir: Option<PathBuf>,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            after: default_after(),
            archive_dir: None,
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// REST API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Posts requested per timeline page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// HTTP/SOCKS proxy URL
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            request_timeout_secs: default_timeout(),
            proxy_url: None,
        }
    }
}

fn default_after() -> String {
    "120h".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "https://api.twitter.com/1.1/".to_string()
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_timeout() -> u64 {
    30
}

/// Expand tilde (~) in path to user's home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

/// Directory holding both config.toml and the auth file
fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("tw-delete")
}

impl AppConfig {
    /// Load configuration from the default location or return defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(expand_tilde(path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Always ~/.config/tw-delete/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Archive directory (with tilde expansion), if archiving is configured
    pub fn archive_dir(&self) -> Option<PathBuf> {
        self.general.archive_dir.as_deref().map(expand_tilde)
    }

    /// Page size clamped to what the timeline endpoint accepts
    pub fn page_size(&self) -> u32 {
        self.api.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

/// OAuth 1.0a user-context credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "ConsumerKey", alias = "consumer_key")]
    pub consumer_key: String,
    #[serde(rename = "ConsumerSecret", alias = "consumer_secret")]
    pub consumer_secret: String,
    #[serde(rename = "AccessToken", alias = "access_token")]
    pub access_token: String,
    #[serde(rename = "AccessSecret", alias = "access_secret")]
    pub access_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// ~/.config/tw-delete/auth
    pub fn default_path() -> PathBuf {
        config_dir().join("auth")
    }

    /// Load credentials from a TOML auth file
    pub fn load(path: &Path) -> crate::Result<Self> {
        let path = expand_tilde(path);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            crate::Error::Config(format!(
                "Failed to read auth file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let credentials: Self =
            toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))?;
        credentials.validate()?;
        Ok(credentials)
    }

    /// Build credentials from discrete values.
    ///
    /// Returns `Ok(None)` when no value is given at all, and an error naming
    /// the missing values when only some of them are given.
    pub fn from_parts(
        consumer_key: Option<String>,
        consumer_secret: Option<String>,
        access_token: Option<String>,
        access_secret: Option<String>,
    ) -> crate::Result<Option<Self>> {
        match (consumer_key, consumer_secret, access_token, access_secret) {
            (None, None, None, None) => Ok(None),
            (Some(consumer_key), Some(consumer_secret), Some(access_token), Some(access_secret)) => {
                let credentials = Self {
                    consumer_key,
                    consumer_secret,
                    access_token,
                    access_secret,
                };
                credentials.validate()?;
                Ok(Some(credentials))
            }
            (consumer_key, consumer_secret, access_token, access_secret) => {
                let missing: Vec<&str> = [
                    ("consumer key", consumer_key.is_none()),
                    ("consumer secret", consumer_secret.is_none()),
                    ("access token", access_token.is_none()),
                    ("access secret", access_secret.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, is_missing)| is_missing.then_some(name))
                .collect();

                Err(crate::Error::Config(format!(
                    "Incomplete credentials, missing: {}",
                    missing.join(", ")
                )))
            }
        }
    }

    /// Resolve credentials: discrete values first, then the given auth
    /// file, then the default auth file.
    pub fn resolve(discrete: Option<Self>, auth_path: Option<&Path>) -> crate::Result<Self> {
        if let Some(credentials) = discrete {
            return Ok(credentials);
        }

        match auth_path {
            Some(path) => Self::load(path),
            None => Self::load(&Self::default_path()),
        }
    }

    fn validate(&self) -> crate::Result<()> {
        let empty: Vec<&str> = [
            ("consumer key", &self.consumer_key),
            ("consumer secret", &self.consumer_secret),
            ("access token", &self.access_token),
            ("access secret", &self.access_secret),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.trim().is_empty().then_some(name))
        .collect();

        if empty.is_empty() {
            Ok(())
        } else {
            Err(crate::Error::Config(format!(
                "Empty credentials: {}",
                empty.join(", ")
            )))
        }
    }
}
