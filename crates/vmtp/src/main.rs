//! VMTP command-line client and server.
//!
//! # Commands
//!
//! - `send` - Send one message, using VMTP when the server supports it
//! - `serve` - Run a server that logs received messages

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vmtp_core::{Attachment, Config, LoggingHandler, OutgoingMessage};

#[derive(Debug, Parser)]
#[command(name = "vmtp")]
#[command(version)]
#[command(about = "SMTP with bulk recipients and metadata", long_about = None)]
struct Cli {
    /// Configuration file (default: <config dir>/vmtp/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send a message
    Send {
        /// Recipient addresses
        #[arg(required = true)]
        recipients: Vec<String>,

        /// Message body
        body: String,

        /// SMTP server host (default: localhost)
        #[arg(long)]
        server: Option<String>,

        /// SMTP server port (default: 25)
        #[arg(long)]
        port: Option<u16>,

        /// Sender address (default: noreply@example.com)
        #[arg(long)]
        sender: Option<String>,

        /// Subject line
        #[arg(long, default_value = "VMTP Test")]
        subject: String,

        /// Metadata key=value pair (can be repeated)
        #[arg(long = "metadata", value_name = "KEY=VALUE")]
        metadata: Vec<String>,

        /// JSON file with metadata, merged over the pairs
        #[arg(long)]
        metadata_file: Option<PathBuf>,

        /// File attachment (can be repeated)
        #[arg(long = "attach", value_name = "PATH")]
        attachments: Vec<PathBuf>,
    },

    /// Run a server
    Serve {
        /// Listen host (default: localhost)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (default: 8025)
        #[arg(long)]
        port: Option<u16>,

        /// Hostname announced to clients
        #[arg(long)]
        hostname: Option<String>,

        /// Do not advertise or accept VMTP
        #[arg(long)]
        disable_vmtp: bool,

        /// Maximum message size in bytes
        #[arg(long)]
        max_size: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vmtp=info,vmtp_smtp=info,vmtp_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Send {
            recipients,
            body,
            server,
            port,
            sender,
            subject,
            metadata,
            metadata_file,
            attachments,
        } => {
            let mut client = config.client;
            client.host = server.unwrap_or(client.host);
            client.port = port.unwrap_or(client.port);
            client.sender = sender.unwrap_or(client.sender);

            let metadata = collect_metadata(&metadata, metadata_file.as_deref()).await?;

            let mut message = OutgoingMessage::new(client.sender.clone(), subject, body);
            message.to = recipients;
            message.metadata = metadata;
            for path in &attachments {
                let attachment = Attachment::from_path(path)
                    .await
                    .with_context(|| format!("Failed to read attachment {}", path.display()))?;
                message = message.attach(attachment);
            }

            let report = vmtp_core::send_message(&client, &message)
                .await
                .with_context(|| format!("Failed to send via {}:{}", client.host, client.port))?;
            info!(
                path = ?report.path,
                metadata_accepted = report.metadata_accepted,
                reply = report.outcome.text(),
                "Message sent"
            );
        }
        Commands::Serve {
            host,
            port,
            hostname,
            disable_vmtp,
            max_size,
        } => {
            let mut server = config.server;
            server.host = host.unwrap_or(server.host);
            server.port = port.unwrap_or(server.port);
            server.hostname = hostname.unwrap_or(server.hostname);
            server.enable_vmtp = server.enable_vmtp && !disable_vmtp;
            server.max_message_size = max_size.unwrap_or(server.max_message_size);

            info!("Press Ctrl-C to stop");
            vmtp_core::serve(&server, LoggingHandler, until_signal(tokio::signal::ctrl_c()))
            .await
            .with_context(|| format!("Failed to serve on {}", server.bind_address()))?;
        }
    }

    Ok(())
}

async fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => {
            let path = Config::default_path();
            Config::load_or_default(&path)
                .await
                .with_context(|| format!("Failed to load config {}", path.display()))
        }
    }
}

/// Resolves when `signal` fires; never resolves if the handler cannot be
/// installed.
async fn until_signal(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        warn!(error = %e, "Cannot listen for Ctrl-C; stop the process to shut down");
        std::future::pending::<()>().await;
    }
}

async fn collect_metadata(
    pairs: &[String],
    file: Option<&Path>,
) -> anyhow::Result<BTreeMap<String, String>> {
    let mut metadata = vmtp_core::metadata::parse_pairs(pairs);
    if let Some(file) = file {
        let from_file = vmtp_core::metadata::load_file(file)
            .await
            .with_context(|| format!("Failed to read metadata file {}", file.display()))?;
        metadata.extend(from_file);
    }
    Ok(metadata)
}
