//! WhatsApp Web automation client.
//!
//! Drives a Chromium browser over CDP to log a WhatsApp Web session in, open
//! a conversation by search, and send text messages or file attachments. The
//! browser engine sits behind the [`browser::WhatsappDriver`] trait so the
//! whole workflow can be exercised against a scripted fake DOM; the default
//! implementation is [`runtime::ChromiumoxideDriver`].
//!
//! ```no_run
//! use futures_util::FutureExt;
//! use whatsapp_rs::{ChromiumoxideDriver, WhatsappClient, WhatsappConfig};
//!
//! # async fn run() -> Result<(), whatsapp_rs::WhatsappError> {
//! let config = WhatsappConfig::default();
//! let sent = WhatsappClient::scoped(config, ChromiumoxideDriver::new(), |client| {
//!     async move { client.send_text("Alice", "hi").await }.boxed()
//! })
//! .await?;
//! assert!(sent);
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod client;
pub mod config;
pub mod locators;
pub mod logging;
pub mod metrics;
pub mod runtime;

pub use browser::{DriverError, LaunchPlan, WaitCondition, WhatsappDriver};
pub use client::{MediaKind, WhatsappClient, WhatsappError};
pub use config::{WhatsappConfig, WhatsappConfigError, WhatsappConfigOverrides};
pub use locators::{LocatorSet, UiRole};
pub use metrics::WhatsappMetrics;
pub use runtime::ChromiumoxideDriver;
