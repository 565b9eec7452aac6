//! High-level WhatsApp Web client.
//!
//! [`WhatsappClient`] stitches the configuration, the locator table, and an
//! injected [`WhatsappDriver`] into the session workflow: start the browser,
//! resolve the login state, open a conversation by search, and send text or
//! file messages. Only authentication failures surface as errors; per-send
//! failures degrade to a `false` result so a caller looping over many sends
//! can continue past individual failures.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::browser::{DriverError, LaunchPlan, WaitCondition, WhatsappDriver};
use crate::config::WhatsappConfig;
use crate::locators::{LocatorSet, UiRole};
use crate::logging::{LogConfig, WhatsappLogger};
use crate::metrics::{SendKind, WhatsappMetrics};

/// Errors surfaced by [`WhatsappClient`].
#[derive(Debug, Error)]
pub enum WhatsappError {
    #[error(transparent)]
    Driver(#[from] DriverError),
    #[error("login not completed within {timeout_ms}ms; scan the QR code and try again")]
    LoginTimeout { timeout_ms: u64 },
}

/// Media kinds supported by the attachment flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    #[default]
    Document,
}

impl MediaKind {
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Document => "document",
        }
    }

    fn attach_option(self) -> UiRole {
        match self {
            MediaKind::Image => UiRole::ImageOption,
            MediaKind::Document => UiRole::DocumentOption,
        }
    }

    fn file_input(self) -> UiRole {
        match self {
            MediaKind::Image => UiRole::ImageFileInput,
            MediaKind::Document => UiRole::DocumentFileInput,
        }
    }
}

/// Authentication probe states. The login flow walks this machine instead of
/// nesting timeout handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginState {
    Unauthenticated,
    AwaitingScan,
    Authenticated,
    TimedOut,
}

/// Client owning one browser session and the operations on it.
pub struct WhatsappClient<D: WhatsappDriver> {
    driver: D,
    config: WhatsappConfig,
    locators: LocatorSet,
    logger: WhatsappLogger,
    metrics: Mutex<WhatsappMetrics>,
}

impl<D: WhatsappDriver> std::fmt::Debug for WhatsappClient<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsappClient")
            .field("config", &self.config)
            .finish()
    }
}

impl<D: WhatsappDriver> WhatsappClient<D> {
    /// Construct a client with the default WhatsApp Web locator table.
    pub fn new(config: WhatsappConfig, driver: D) -> Self {
        Self::with_locators(config, driver, LocatorSet::default())
    }

    /// Construct a client with a substituted locator table.
    pub fn with_locators(config: WhatsappConfig, driver: D, locators: LocatorSet) -> Self {
        let logger = WhatsappLogger::with_config(LogConfig {
            verbose: config.verbose,
            external_logger: config.logger.clone(),
        });
        Self {
            driver,
            config,
            locators,
            logger,
            metrics: Mutex::new(WhatsappMetrics::default()),
        }
    }

    pub fn config(&self) -> &WhatsappConfig {
        &self.config
    }

    pub fn locators(&self) -> &LocatorSet {
        &self.locators
    }

    pub fn logger(&self) -> &WhatsappLogger {
        &self.logger
    }

    /// Snapshot of the per-operation counters.
    pub fn metrics(&self) -> WhatsappMetrics {
        self.metrics
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn record_metrics(&self, f: impl FnOnce(&mut WhatsappMetrics)) {
        if let Ok(mut guard) = self.metrics.lock() {
            f(&mut guard);
        }
    }

    /// Launch the browser session and navigate to WhatsApp Web.
    ///
    /// Launch failure is fatal and propagates; no recovery is attempted.
    pub async fn start(&self) -> Result<(), WhatsappError> {
        let plan = LaunchPlan::from_config(&self.config);
        self.driver.launch(&plan).await?;
        self.driver.goto(&self.config.url).await?;
        self.logger.debug(
            format!("Session started at {}", self.config.url),
            Some("session"),
        );
        Ok(())
    }

    /// Tear the browser session down.
    pub async fn shutdown(&self) -> Result<(), WhatsappError> {
        self.driver.shutdown().await?;
        self.logger.debug("Session closed", Some("session"));
        Ok(())
    }

    /// Run `f` against a started client, guaranteeing the browser session is
    /// released on every exit path.
    pub async fn scoped<T, F>(config: WhatsappConfig, driver: D, f: F) -> Result<T, WhatsappError>
    where
        F: for<'c> FnOnce(&'c WhatsappClient<D>) -> BoxFuture<'c, T>,
    {
        let client = WhatsappClient::new(config, driver);
        let result = match client.start().await {
            Ok(()) => Ok(f(&client).await),
            Err(err) => Err(err),
        };
        if let Err(err) = client.shutdown().await {
            client.logger.warn(
                format!("Failed to shut down browser session: {err}"),
                Some("session"),
            );
        }
        result
    }

    /// Resolve the authentication state of the session.
    ///
    /// Returns `Ok(true)` once the conversation-search marker is present,
    /// prompting for a QR scan in between if the session is not yet linked.
    /// Never returns an ambiguous falsy result: if authentication does not
    /// complete within the configured timeout on either probe phase, the call
    /// fails with [`WhatsappError::LoginTimeout`].
    pub async fn login(&self) -> Result<bool, WhatsappError> {
        let timeout_ms = self.config.timeout_ms;
        let search = self.locators.selector(UiRole::ConversationSearch);
        let mut state = LoginState::Unauthenticated;

        loop {
            state = match state {
                LoginState::Unauthenticated => {
                    match self
                        .driver
                        .wait_for(search, WaitCondition::Visible, timeout_ms)
                        .await
                    {
                        Ok(()) => LoginState::Authenticated,
                        Err(err) if err.is_timeout() => LoginState::AwaitingScan,
                        Err(err) => return Err(err.into()),
                    }
                }
                LoginState::AwaitingScan => {
                    let qr = self.locators.selector(UiRole::QrCode);
                    match self
                        .driver
                        .wait_for(qr, WaitCondition::Visible, timeout_ms)
                        .await
                    {
                        Ok(()) => {
                            self.logger.info(
                                "Scan the QR code to log in to WhatsApp Web",
                                Some("login"),
                            );
                            self.record_metrics(|metrics| metrics.record_qr_prompt());
                            match self
                                .driver
                                .wait_for(search, WaitCondition::Visible, timeout_ms)
                                .await
                            {
                                Ok(()) => LoginState::Authenticated,
                                Err(err) if err.is_timeout() => LoginState::TimedOut,
                                Err(err) => return Err(err.into()),
                            }
                        }
                        Err(err) if err.is_timeout() => LoginState::TimedOut,
                        Err(err) => return Err(err.into()),
                    }
                }
                LoginState::Authenticated => {
                    self.logger.info("Logged in to WhatsApp Web", Some("login"));
                    self.record_metrics(|metrics| metrics.record_login());
                    return Ok(true);
                }
                LoginState::TimedOut => {
                    self.logger.error(
                        format!("Login timed out after {timeout_ms}ms"),
                        Some("login"),
                    );
                    return Err(WhatsappError::LoginTimeout { timeout_ms });
                }
            };
        }
    }

    /// Search for a contact or group and open the conversation.
    ///
    /// A single attempt is made; a missing message-input marker within the
    /// timeout is recoverable and reported as `false` with a warning, never
    /// as an error.
    pub async fn find_contact(&self, contact: &str) -> bool {
        match self.open_conversation(contact).await {
            Ok(()) => true,
            Err(err) => {
                self.logger.warn(
                    format!("Contact '{contact}' not found: {err}"),
                    Some("contact"),
                );
                false
            }
        }
    }

    async fn open_conversation(&self, contact: &str) -> Result<(), DriverError> {
        let search = self.locators.selector(UiRole::ConversationSearch);
        self.driver.fill(search, contact).await?;
        self.driver.press(search, "Enter").await?;
        self.driver
            .wait_for(
                self.locators.selector(UiRole::MessageInput),
                WaitCondition::Visible,
                self.config.timeout_ms,
            )
            .await
    }

    /// Send a text message to a contact or group.
    ///
    /// Returns `false` without touching the conversation when login or
    /// contact resolution fails; any failure during the send sequence is
    /// caught, logged, and converted to `false`.
    pub async fn send_text(&self, contact: &str, message: &str) -> bool {
        if !self.ensure_authenticated(contact).await {
            self.record_metrics(|metrics| metrics.record_send(SendKind::Text, false));
            return false;
        }
        if !self.find_contact(contact).await {
            self.record_metrics(|metrics| metrics.record_send(SendKind::Text, false));
            return false;
        }

        let delivered = match self.deliver_text(message).await {
            Ok(()) => {
                self.logger.info(
                    format!("Message '{message}' sent to {contact}."),
                    Some("send"),
                );
                true
            }
            Err(err) => {
                self.logger.warn(
                    format!("Failed to send message to {contact}: {err}"),
                    Some("send"),
                );
                false
            }
        };
        self.record_metrics(|metrics| metrics.record_send(SendKind::Text, delivered));
        delivered
    }

    /// Send a file attachment to a contact or group, with an optional
    /// caption.
    ///
    /// The caption is entered into the message input before the attachment
    /// flow opens, since the input target changes once the attachment is
    /// staged. Same failure semantics as [`WhatsappClient::send_text`].
    pub async fn send_file(
        &self,
        file: &Path,
        contact: &str,
        caption: Option<&str>,
        mediatype: MediaKind,
    ) -> bool {
        if !self.ensure_authenticated(contact).await {
            self.record_metrics(|metrics| metrics.record_send(SendKind::File, false));
            return false;
        }
        if !self.find_contact(contact).await {
            self.record_metrics(|metrics| metrics.record_send(SendKind::File, false));
            return false;
        }

        let delivered = match self.deliver_file(file, caption, mediatype).await {
            Ok(()) => {
                let name = file
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.display().to_string());
                self.logger
                    .info(format!("File '{name}' sent to {contact}."), Some("send"));
                true
            }
            Err(err) => {
                self.logger.warn(
                    format!("Failed to send file '{}' to {contact}: {err}", file.display()),
                    Some("send"),
                );
                false
            }
        };
        self.record_metrics(|metrics| metrics.record_send(SendKind::File, delivered));
        delivered
    }

    async fn ensure_authenticated(&self, contact: &str) -> bool {
        match self.login().await {
            Ok(authenticated) => authenticated,
            Err(err) => {
                self.logger
                    .warn(format!("Cannot send to '{contact}': {err}"), Some("send"));
                false
            }
        }
    }

    async fn deliver_text(&self, message: &str) -> Result<(), DriverError> {
        self.driver
            .fill(self.locators.selector(UiRole::MessageInput), message)
            .await?;
        self.driver
            .click(self.locators.selector(UiRole::SendButton))
            .await?;
        self.await_delivery().await
    }

    async fn deliver_file(
        &self,
        file: &Path,
        caption: Option<&str>,
        mediatype: MediaKind,
    ) -> Result<(), DriverError> {
        if let Some(caption) = caption {
            self.driver
                .fill(self.locators.selector(UiRole::MessageInput), caption)
                .await?;
        }

        self.logger
            .info(format!("Sending {}", mediatype.label()), Some("attach"));
        self.driver
            .click(self.locators.selector(UiRole::AttachMenu))
            .await?;
        self.driver
            .click(self.locators.selector(mediatype.attach_option()))
            .await?;
        self.driver
            .set_files(self.locators.selector(mediatype.file_input()), file)
            .await?;
        self.driver
            .click(self.locators.selector(UiRole::AttachmentSendButton))
            .await?;
        self.await_delivery().await
    }

    /// Wait for the transient sending indicator to leave the DOM, padded with
    /// a settle delay on both sides to tolerate UI animation.
    async fn await_delivery(&self) -> Result<(), DriverError> {
        self.settle().await;
        self.driver
            .wait_for(
                self.locators.selector(UiRole::SendingIndicator),
                WaitCondition::Detached,
                self.config.timeout_ms,
            )
            .await?;
        self.settle().await;
        Ok(())
    }

    async fn settle(&self) {
        if self.config.settle_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
        }
    }
}
