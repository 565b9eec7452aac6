//! Browser-driver seam for the WhatsApp client.
//!
//! This module turns the high-level configuration into a strongly-typed
//! launch plan and defines the [`WhatsappDriver`] trait the client drives the
//! page through. The client never touches the automation engine directly:
//! navigation, bounded marker waits, clicks, fills, keypresses, and
//! file-input population all go through this seam, so tests can substitute a
//! scripted fake for the real browser.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::WhatsappConfig;

/// Error surfaced by driver implementations.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("timed out after {timeout_ms}ms waiting for '{selector}'")]
    Timeout { selector: String, timeout_ms: u64 },
    #[error("browser driver error: {0}")]
    Message(String),
    #[error("browser driver not started")]
    NotStarted,
}

impl DriverError {
    /// Whether this error is a bounded-wait expiry rather than a hard fault.
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout { .. })
    }
}

/// Condition a marker wait resolves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// The selector matches an element in the live document.
    Visible,
    /// The selector no longer matches any element.
    Detached,
}

/// Normalised launch parameters derived from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub user_data_dir: PathBuf,
    pub downloads_dir: PathBuf,
    pub headless: bool,
    pub locale: String,
    pub launch_timeout_ms: u64,
    pub chrome_executable: Option<PathBuf>,
}

impl LaunchPlan {
    /// Build a launch plan from the client configuration.
    pub fn from_config(config: &WhatsappConfig) -> Self {
        LaunchPlan {
            user_data_dir: config.user_data_dir.clone(),
            downloads_dir: config.downloads_dir.clone(),
            headless: config.headless,
            locale: config.locale.clone(),
            launch_timeout_ms: config.timeout_ms,
            chrome_executable: config.chrome_executable.clone(),
        }
    }
}

/// Abstraction over the browser-automation engine.
///
/// Selector strings are opaque to implementations except for dialect
/// detection: expressions starting with `//` (or `(`) are XPath, everything
/// else is CSS.
#[async_trait]
pub trait WhatsappDriver: Send + Sync {
    /// Launch the browser with a persistent profile. Fatal on failure.
    async fn launch(&self, plan: &LaunchPlan) -> Result<(), DriverError>;

    /// Navigate the session page to `url`, creating the page if needed.
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    /// Wait until `selector` satisfies `condition`, bounded by `timeout_ms`.
    async fn wait_for(
        &self,
        selector: &str,
        condition: WaitCondition,
        timeout_ms: u64,
    ) -> Result<(), DriverError>;

    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<(), DriverError>;

    /// Replace the content of the element matching `selector` with `text`
    /// (prior input is selected and overwritten).
    async fn fill(&self, selector: &str, text: &str) -> Result<(), DriverError>;

    /// Dispatch a key press to the element matching `selector`.
    async fn press(&self, selector: &str, key: &str) -> Result<(), DriverError>;

    /// Supply `file` to the file input matching `selector`.
    async fn set_files(&self, selector: &str, file: &Path) -> Result<(), DriverError>;

    /// Tear the browser session down. Must be safe to call on every exit
    /// path, including before a successful launch.
    async fn shutdown(&self) -> Result<(), DriverError>;
}

#[async_trait]
impl<T: WhatsappDriver + ?Sized> WhatsappDriver for Arc<T> {
    async fn launch(&self, plan: &LaunchPlan) -> Result<(), DriverError> {
        (**self).launch(plan).await
    }

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        (**self).goto(url).await
    }

    async fn wait_for(
        &self,
        selector: &str,
        condition: WaitCondition,
        timeout_ms: u64,
    ) -> Result<(), DriverError> {
        (**self).wait_for(selector, condition, timeout_ms).await
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        (**self).click(selector).await
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        (**self).fill(selector, text).await
    }

    async fn press(&self, selector: &str, key: &str) -> Result<(), DriverError> {
        (**self).press(selector, key).await
    }

    async fn set_files(&self, selector: &str, file: &Path) -> Result<(), DriverError> {
        (**self).set_files(selector, file).await
    }

    async fn shutdown(&self) -> Result<(), DriverError> {
        (**self).shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_LOCALE, WhatsappConfig};

    #[test]
    fn launch_plan_mirrors_config() {
        let config = WhatsappConfig::default();
        let plan = LaunchPlan::from_config(&config);
        assert_eq!(plan.user_data_dir, config.user_data_dir);
        assert_eq!(plan.downloads_dir, config.downloads_dir);
        assert!(plan.headless);
        assert_eq!(plan.locale, DEFAULT_LOCALE);
        assert_eq!(plan.launch_timeout_ms, config.timeout_ms);
        assert!(plan.chrome_executable.is_none());
    }

    #[test]
    fn launch_plan_honours_overridden_fields() {
        let mut config = WhatsappConfig::default();
        config.headless = false;
        config.timeout_ms = 5_000;
        config.chrome_executable = Some(PathBuf::from("/opt/chrome"));

        let plan = LaunchPlan::from_config(&config);
        assert!(!plan.headless);
        assert_eq!(plan.launch_timeout_ms, 5_000);
        assert_eq!(
            plan.chrome_executable.as_deref(),
            Some(Path::new("/opt/chrome"))
        );
    }

    #[test]
    fn timeout_detection_only_matches_timeouts() {
        let timeout = DriverError::Timeout {
            selector: "#probe".into(),
            timeout_ms: 10,
        };
        assert!(timeout.is_timeout());
        assert!(!DriverError::NotStarted.is_timeout());
        assert!(!DriverError::Launch("boom".into()).is_timeout());
        assert!(!DriverError::Message("boom".into()).is_timeout());
    }
}
