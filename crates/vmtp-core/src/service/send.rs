//! Sending messages.

use crate::compose::compose;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::message::OutgoingMessage;
use tracing::{info, warn};
use vmtp_smtp::{Client, SendReport};

/// Sends one message over a fresh session.
///
/// The session is probed for VMTP once; metadata and the bulk recipient
/// declaration are used when the server supports them, with per-message
/// fallback to plain SMTP otherwise.
///
/// # Errors
///
/// Returns an error if the message is malformed, the connection fails, or
/// the server refuses the envelope or the content.
pub async fn send_message(config: &ClientConfig, message: &OutgoingMessage) -> Result<SendReport> {
    let envelope = message.envelope()?;
    let payload = compose(message);

    let client = Client::connect(&config.host, config.port).await?;
    let mut session = client.handshake(&config.client_hostname).await?;
    info!(
        host = session.host(),
        port = session.port(),
        vmtp = session.supports_extension(),
        "Session established"
    );

    match session.send(&envelope, payload.as_bytes()).await {
        Ok(report) => {
            session.quit().await?;
            Ok(report)
        }
        Err(e) if e.is_transport() => Err(e.into()),
        Err(e) => {
            warn!(
                code = ?e.reply_code(),
                permanent = e.is_permanent(),
                transient = e.is_transient(),
                "Message refused"
            );
            if let Err(quit) = session.quit().await {
                warn!(error = %quit, "QUIT failed after rejected send");
            }
            Err(e.into())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::{Arc, Mutex};
    use vmtp_smtp::{DispatcherConfig, Path, ReceivedMail, Reply, ReplyCode, Server};

    type Inbox = Arc<Mutex<Vec<ReceivedMail>>>;

    async fn server(enable_vmtp: bool) -> (ClientConfig, Inbox) {
        let inbox: Inbox = Arc::default();
        let sink = Arc::clone(&inbox);
        let handler = move |mail: &ReceivedMail| -> std::result::Result<(), Reply> {
            if mail.recipients.iter().any(|r| r.as_str() == "nobody@x.test") {
                return Err(Reply::single(ReplyCode::MAILBOX_UNAVAILABLE, "No such user"));
            }
            if mail.recipients.iter().any(|r| r.as_str() == "busy@x.test") {
                return Err(Reply::single(ReplyCode::MAILBOX_BUSY, "Try again later"));
            }
            sink.lock().unwrap().push(mail.clone());
            Ok(())
        };

        let config = DispatcherConfig::builder("mx.test")
            .enable_vmtp(enable_vmtp)
            .build();
        let server = Server::bind("127.0.0.1:0", config, handler).await.unwrap();
        let port = server.local_addr().unwrap().port();
        tokio::spawn(server.run());

        let client = ClientConfig {
            host: "127.0.0.1".into(),
            port,
            ..ClientConfig::default()
        };
        (client, inbox)
    }

    fn message() -> OutgoingMessage {
        OutgoingMessage::new("noreply@example.com", "VMTP Test", "hello there")
            .to("a@x.test")
            .to("b@x.test")
            .metadata("campaign", "spring")
    }

    #[tokio::test]
    async fn sends_with_vmtp() {
        let (config, inbox) = server(true).await;

        let report = send_message(&config, &message()).await.unwrap();
        assert_eq!(report.path, Path::Extended);
        assert_eq!(report.metadata_accepted, 1);

        let inbox = inbox.lock().unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].metadata["campaign"], "spring");
        assert_eq!(inbox[0].size_hint, Some("hello there".len()));
        let data = String::from_utf8_lossy(&inbox[0].data);
        assert!(data.contains("Subject: VMTP Test\r\n"));
        assert!(data.contains("\r\n\r\nhello there\r\n"));
    }

    #[tokio::test]
    async fn falls_back_without_vmtp() {
        let (config, inbox) = server(false).await;

        let report = send_message(&config, &message()).await.unwrap();
        assert_eq!(report.path, Path::Base);
        assert_eq!(report.metadata_accepted, 0);
        assert!(inbox.lock().unwrap()[0].metadata.is_empty());
    }

    #[tokio::test]
    async fn rejection_is_reported() {
        let (config, inbox) = server(true).await;

        let err = send_message(&config, &message().to("nobody@x.test"))
            .await
            .unwrap_err();
        let Error::Smtp(inner) = err else {
            panic!("expected a protocol error, got {err}");
        };
        assert!(matches!(inner, vmtp_smtp::Error::DataRejected { code: 550, .. }));
        assert!(inner.is_permanent());
        assert!(inbox.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn busy_mailbox_is_transient() {
        let (config, _inbox) = server(true).await;

        let err = send_message(&config, &message().to("busy@x.test"))
            .await
            .unwrap_err();
        let Error::Smtp(inner) = err else {
            panic!("expected a protocol error, got {err}");
        };
        assert_eq!(inner.reply_code(), Some(450));
        assert!(inner.is_transient());
        assert!(!inner.is_permanent());
    }

    #[tokio::test]
    async fn invalid_message_fails_before_connecting() {
        let config = ClientConfig {
            port: 1,
            ..ClientConfig::default()
        };
        let message = OutgoingMessage::new("noreply@example.com", "s", "b");
        let err = send_message(&config, &message).await.unwrap_err();
        assert!(matches!(err, Error::Smtp(vmtp_smtp::Error::NoRecipients)));
    }
}
