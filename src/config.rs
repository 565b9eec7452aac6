//! Strongly-typed configuration for the WhatsApp client.
//!
//! Mirrors the resolved values the client consumes: profile and downloads
//! directories, the target URL, wait timeouts, and logging knobs.
//! Configuration can be constructed from defaults, loaded from environment
//! variables (with optional `.env` support), or merged with explicit
//! overrides for programmatic updates.

use std::env;
use std::fmt;
use std::num::ParseIntError;
use std::path::PathBuf;

use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LogCallback;

/// Default WhatsApp Web entry point.
pub const DEFAULT_URL: &str = "https://web.whatsapp.com/";

/// Default bound for login and per-operation waits, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Default pause inserted around the delivery probe to tolerate UI animation.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 3_000;

/// Default browser locale. The default locator table assumes the
/// Portuguese-language interface, so the two must move together.
pub const DEFAULT_LOCALE: &str = "pt-BR";

/// Verbosity level for client logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Minimal,
    Medium,
    Detailed,
}

impl Verbosity {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Verbosity::Minimal => 0,
            Verbosity::Medium => 1,
            Verbosity::Detailed => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Verbosity::Minimal),
            1 => Some(Verbosity::Medium),
            2 => Some(Verbosity::Detailed),
            _ => None,
        }
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Medium
    }
}

impl Serialize for Verbosity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for Verbosity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Verbosity::from_u8(value).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid verbosity value {value}; expected 0, 1, or 2"
            ))
        })
    }
}

/// Configuration values for the WhatsApp client.
///
/// Immutable for the lifetime of a session.
#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct WhatsappConfig {
    /// Persistent browser profile directory holding the linked session.
    #[serde(alias = "userDataDir")]
    pub user_data_dir: PathBuf,
    /// Directory the browser downloads into.
    #[serde(alias = "downloadsDir")]
    pub downloads_dir: PathBuf,
    /// WhatsApp Web URL the session navigates to.
    pub url: String,
    /// Bound for login and per-operation waits, in milliseconds.
    #[serde(alias = "timeoutMs")]
    pub timeout_ms: u64,
    /// Pause around the delivery probe, in milliseconds.
    #[serde(alias = "settleDelayMs")]
    pub settle_delay_ms: u64,
    /// Browser locale passed at launch.
    pub locale: String,
    /// Run the browser without a visible window.
    pub headless: bool,
    /// Explicit Chrome/Chromium executable, if autodetection is not wanted.
    #[serde(alias = "chromeExecutable")]
    pub chrome_executable: Option<PathBuf>,
    pub verbose: Verbosity,
    /// External log sink; the default console handler is used when absent.
    #[serde(skip_serializing, skip_deserializing)]
    pub logger: Option<LogCallback>,
}

impl Default for WhatsappConfig {
    fn default() -> Self {
        WhatsappConfig {
            user_data_dir: PathBuf::from("./session"),
            downloads_dir: PathBuf::from("./downloads"),
            url: DEFAULT_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            locale: DEFAULT_LOCALE.to_string(),
            headless: true,
            chrome_executable: None,
            verbose: Verbosity::default(),
            logger: None,
        }
    }
}

impl WhatsappConfig {
    /// Construct a configuration by reading relevant environment variables,
    /// after loading a `.env` file if present.
    pub fn from_env() -> Result<Self, WhatsappConfigError> {
        let _ = dotenv();
        let mut config = WhatsappConfig::default();

        if let Some(value) = env_var("WHATSAPP_USER_DATA_DIR") {
            config.user_data_dir = PathBuf::from(value);
        }

        if let Some(value) = env_var("WHATSAPP_DOWNLOADS_DIR") {
            config.downloads_dir = PathBuf::from(value);
        }

        if let Some(value) = env_var("WHATSAPP_URL") {
            config.url = value;
        }

        if let Some(value) = env_var("WHATSAPP_TIMEOUT_MS") {
            config.timeout_ms = parse_u64("WHATSAPP_TIMEOUT_MS", &value)?;
        }

        if let Some(value) = env_var("WHATSAPP_SETTLE_DELAY_MS") {
            config.settle_delay_ms = parse_u64("WHATSAPP_SETTLE_DELAY_MS", &value)?;
        }

        if let Some(value) = env_var("WHATSAPP_LOCALE") {
            config.locale = value;
        }

        if let Some(value) = env_var("WHATSAPP_HEADLESS") {
            config.headless = parse_bool("WHATSAPP_HEADLESS", &value)?;
        }

        if let Some(value) = env_var("WHATSAPP_CHROME_BIN") {
            config.chrome_executable = Some(PathBuf::from(value));
        }

        if let Some(value) = env_var("WHATSAPP_VERBOSE") {
            let parsed = parse_u8("WHATSAPP_VERBOSE", &value)?;
            config.verbose = Verbosity::from_u8(parsed).ok_or_else(|| {
                WhatsappConfigError::invalid_enum("WHATSAPP_VERBOSE", parsed.to_string())
            })?;
        }

        Ok(config)
    }

    /// Create a new configuration with explicit field overrides applied.
    pub fn with_overrides(&self, overrides: WhatsappConfigOverrides) -> WhatsappConfig {
        let mut next = self.clone();

        if let Some(value) = overrides.user_data_dir {
            next.user_data_dir = value;
        }
        if let Some(value) = overrides.downloads_dir {
            next.downloads_dir = value;
        }
        if let Some(value) = overrides.url {
            next.url = value;
        }
        if let Some(value) = overrides.timeout_ms {
            next.timeout_ms = value;
        }
        if let Some(value) = overrides.settle_delay_ms {
            next.settle_delay_ms = value;
        }
        if let Some(value) = overrides.locale {
            next.locale = value;
        }
        if let Some(value) = overrides.headless {
            next.headless = value;
        }
        if let Some(value) = overrides.chrome_executable {
            next.chrome_executable = value;
        }
        if let Some(value) = overrides.verbose {
            next.verbose = value;
        }
        if let Some(value) = overrides.logger {
            next.logger = value;
        }

        next
    }
}

/// Field-level overrides for [`WhatsappConfig::with_overrides`].
///
/// `Option<Option<T>>` fields distinguish "leave unchanged" from "set to
/// None".
#[derive(Default, Clone)]
pub struct WhatsappConfigOverrides {
    pub user_data_dir: Option<PathBuf>,
    pub downloads_dir: Option<PathBuf>,
    pub url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub locale: Option<String>,
    pub headless: Option<bool>,
    pub chrome_executable: Option<Option<PathBuf>>,
    pub verbose: Option<Verbosity>,
    pub logger: Option<Option<LogCallback>>,
}

impl fmt::Debug for WhatsappConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhatsappConfig")
            .field("user_data_dir", &self.user_data_dir)
            .field("downloads_dir", &self.downloads_dir)
            .field("url", &self.url)
            .field("timeout_ms", &self.timeout_ms)
            .field("settle_delay_ms", &self.settle_delay_ms)
            .field("locale", &self.locale)
            .field("headless", &self.headless)
            .field("chrome_executable", &self.chrome_executable)
            .field("verbose", &self.verbose)
            .field("logger_present", &self.logger.is_some())
            .finish()
    }
}

/// Errors that can arise while constructing a [`WhatsappConfig`].
#[derive(Debug, Error)]
pub enum WhatsappConfigError {
    #[error("invalid value '{value}' for {field}")]
    InvalidEnumVariant { field: &'static str, value: String },
    #[error("invalid boolean '{value}' for {field}")]
    InvalidBool { field: &'static str, value: String },
    #[error("invalid number '{value}' for {field}: {source}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

impl WhatsappConfigError {
    fn invalid_enum(field: &'static str, value: String) -> Self {
        WhatsappConfigError::InvalidEnumVariant { field, value }
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_bool(field: &'static str, value: &str) -> Result<bool, WhatsappConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(WhatsappConfigError::InvalidBool {
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_u8(field: &'static str, value: &str) -> Result<u8, WhatsappConfigError> {
    value
        .trim()
        .parse::<u8>()
        .map_err(|source| WhatsappConfigError::InvalidNumber {
            field,
            value: value.to_string(),
            source,
        })
}

fn parse_u64(field: &'static str, value: &str) -> Result<u64, WhatsappConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|source| WhatsappConfigError::InvalidNumber {
            field,
            value: value.to_string(),
            source,
        })
}
