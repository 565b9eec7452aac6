//! WhatsApp Web automation CLI.
//!
//! Thin wrapper around [`WhatsappClient`] for sending a single message or
//! attachment from the command line. Configuration is read from the
//! environment (and `.env`), see `WhatsappConfig::from_env`.
//!
//! Usage examples:
//!   $ WHATSAPP_USER_DATA_DIR=./session \
//!     cargo run --bin whatsapp -- send-text --contact "Alice" "hi"
//!   $ cargo run --bin whatsapp -- send-file --contact "Bob" \
//!     --mediatype document --caption "see attached" ./doc.pdf

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use futures_util::FutureExt;
use log::info;

use whatsapp_rs::config::Verbosity;
use whatsapp_rs::logging::{LogCallback, LogLevel, LogRecord};
use whatsapp_rs::{ChromiumoxideDriver, MediaKind, WhatsappClient, WhatsappConfig};

#[derive(Parser)]
#[command(
    name = "whatsapp",
    author,
    version,
    about = "Send WhatsApp messages through a browser-driven WhatsApp Web session"
)]
struct Cli {
    /// Increase log verbosity (pass twice for DEBUG).
    #[arg(long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Show the launched browser window.
    #[arg(long, global = true)]
    show_browser: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a text message to a contact or group.
    SendText(SendTextArgs),
    /// Send a file attachment to a contact or group.
    SendFile(SendFileArgs),
}

#[derive(Args)]
struct SendTextArgs {
    /// Contact or group name (or phone number) to search for.
    #[arg(long)]
    contact: String,

    /// Message text to send.
    message: String,
}

#[derive(Args)]
struct SendFileArgs {
    /// Contact or group name (or phone number) to search for.
    #[arg(long)]
    contact: String,

    /// Caption added to the attachment.
    #[arg(long)]
    caption: Option<String>,

    /// Kind of attachment being sent.
    #[arg(long, value_enum, default_value_t = MediaKindArg::Document)]
    mediatype: MediaKindArg,

    /// Path of the file to send.
    file: PathBuf,
}

#[derive(Clone, Copy, ValueEnum, Debug)]
enum MediaKindArg {
    Image,
    Document,
}

impl From<MediaKindArg> for MediaKind {
    fn from(value: MediaKindArg) -> Self {
        match value {
            MediaKindArg::Image => MediaKind::Image,
            MediaKindArg::Document => MediaKind::Document,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_env_logger();

    let cli = Cli::parse();

    let mut config = WhatsappConfig::from_env().context("failed to load configuration")?;
    config.verbose = verbosity_from_count(cli.verbose);
    config.headless = !cli.show_browser;
    config.logger = Some(make_logger_callback());

    let driver = ChromiumoxideDriver::new();

    let sent = match cli.command {
        Command::SendText(args) => {
            WhatsappClient::scoped(config, driver, move |client| {
                async move { client.send_text(&args.contact, &args.message).await }.boxed()
            })
            .await
            .context("session failed")?
        }
        Command::SendFile(args) => {
            WhatsappClient::scoped(config, driver, move |client| {
                async move {
                    client
                        .send_file(
                            &args.file,
                            &args.contact,
                            args.caption.as_deref(),
                            args.mediatype.into(),
                        )
                        .await
                }
                .boxed()
            })
            .await
            .context("session failed")?
        }
    };

    if !sent {
        bail!("message was not delivered");
    }

    info!("Done");
    Ok(())
}

fn make_logger_callback() -> LogCallback {
    std::sync::Arc::new(|record: &LogRecord| {
        let message = match &record.category {
            Some(category) => format!("[{category}] {}", record.message),
            None => record.message.clone(),
        };
        match record.level {
            LogLevel::Error => log::error!("{message}"),
            LogLevel::Warn => log::warn!("{message}"),
            LogLevel::Info => log::info!("{message}"),
            LogLevel::Debug => log::debug!("{message}"),
        }
    })
}

fn verbosity_from_count(count: u8) -> Verbosity {
    match count {
        0 => Verbosity::Medium,
        _ => Verbosity::Detailed,
    }
}

fn init_env_logger() {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    let _ = env_logger::Builder::from_env(env_logger::Env::default())
        .format_timestamp_secs()
        .try_init();
}
