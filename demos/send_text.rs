//! Minimal quickstart: send a text message through a scoped session.
//!
//! Usage:
//!   $ WHATSAPP_USER_DATA_DIR=./session WHATSAPP_CHROME_BIN=/path/to/chrome \
//!     cargo run --example send_text -- "Alice" "hi from whatsapp-rs"

use anyhow::{Context, Result, bail};
use futures_util::FutureExt;

use whatsapp_rs::{ChromiumoxideDriver, WhatsappClient, WhatsappConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let contact = args.next().context("usage: send_text <contact> <message>")?;
    let message = args.next().context("usage: send_text <contact> <message>")?;

    let config = WhatsappConfig::from_env().context("failed to load configuration")?;

    let sent = WhatsappClient::scoped(config, ChromiumoxideDriver::new(), |client| {
        async move { client.send_text(&contact, &message).await }.boxed()
    })
    .await
    .context("session failed")?;

    if !sent {
        bail!("message was not delivered");
    }
    Ok(())
}
