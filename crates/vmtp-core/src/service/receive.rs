//! Receiving messages.

use crate::config::ServerConfig;
use crate::error::Result;
use crate::inspect::{Contents, summarize};
use std::future::Future;
use tracing::info;
use vmtp_smtp::{Address, MailHandler, ReceivedMail, Reply, Server};

/// Handler that accepts every message and logs what it contains.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHandler;

impl MailHandler for LoggingHandler {
    fn accept(&self, mail: &ReceivedMail) -> std::result::Result<(), Reply> {
        let recipients: Vec<&str> = mail.recipients.iter().map(Address::as_str).collect();
        info!(
            sender = %mail.sender,
            recipients = %recipients.join(", "),
            "Received message"
        );
        for (key, value) in &mail.metadata {
            info!(%key, %value, "Metadata");
        }

        let summary = summarize(&mail.data);
        match summary.contents {
            Contents::Attachments(files) => {
                for file in files {
                    info!(
                        filename = file.filename.as_deref().unwrap_or("(unnamed)"),
                        content_type = %file.content_type,
                        "Attachment"
                    );
                }
            }
            Contents::Text(body) => info!(subject = ?summary.subject, %body, "Body"),
        }
        Ok(())
    }
}

/// Runs a server with the given configuration until `shutdown` completes.
///
/// # Errors
///
/// Returns an error if the listening socket cannot be bound.
pub async fn serve(
    config: &ServerConfig,
    handler: impl MailHandler,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let server = Server::bind(config.bind_address(), config.dispatcher(), handler).await?;
    server.run_until(shutdown).await?;
    Ok(())
}
