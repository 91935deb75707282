//! Greeted SMTP connection, before the handshake.

use std::collections::HashSet;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use super::{Endpoint, ServerInfo, Session, SmtpStream, connect};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::negotiate;

/// A connection whose `220` greeting has been read.
#[derive(Debug)]
pub struct Client<S = TcpStream> {
    stream: SmtpStream<S>,
    endpoint: Endpoint,
    hostname: String,
}

impl Client<TcpStream> {
    /// Opens a TCP connection and waits for the greeting.
    ///
    /// # Errors
    ///
    /// Connect failures, or [`Error::SmtpError`] when the greeting is not `2yz`.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = connect(host, port).await?;
        Self::from_stream(stream, Endpoint::new(host, port)).await
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Waits for the greeting on an already open stream.
    ///
    /// # Errors
    ///
    /// Read failures, or [`Error::SmtpError`] when the greeting is not `2yz`.
    pub async fn from_stream(mut stream: SmtpStream<S>, endpoint: Endpoint) -> Result<Self> {
        let greeting = stream.read_reply().await?;
        if !greeting.is_success() {
            return Err(Error::smtp_error(
                greeting.code.as_u16(),
                greeting.message_text(),
            ));
        }

        let hostname = greeting
            .message
            .first()
            .and_then(|line| line.split_whitespace().next())
            .map_or_else(|| "unknown".to_owned(), str::to_owned);

        debug!(%endpoint, %hostname, "Received greeting");
        Ok(Self {
            stream,
            endpoint,
            hostname,
        })
    }

    /// Sends EHLO, records whether the server speaks VMTP and opens a session.
    ///
    /// A refused EHLO is not an error: the client greets with HELO instead and
    /// the session runs on base SMTP.
    ///
    /// # Errors
    ///
    /// Returns an error only on transport failure.
    pub async fn handshake(mut self, client_hostname: &str) -> Result<Session<S>> {
        let ehlo = Command::Ehlo {
            hostname: client_hostname.to_string(),
        };
        self.stream.write_all(&ehlo.serialize()).await?;
        let reply = self.stream.read_reply().await?;

        let supports_vmtp = negotiate::probe(&reply);
        let extensions = if reply.is_success() {
            negotiate::extensions(&reply)
        } else {
            warn!(
                code = reply.code.as_u16(),
                "EHLO refused, greeting with HELO"
            );
            let helo = Command::Helo {
                hostname: client_hostname.to_string(),
            };
            self.stream.write_all(&helo.serialize()).await?;
            let reply = self.stream.read_reply().await?;
            if !reply.is_success() {
                warn!(code = reply.code.as_u16(), "HELO refused, continuing");
            }
            HashSet::new()
        };

        info!(endpoint = %self.endpoint, supports_vmtp, "Session established");
        let server_info = ServerInfo {
            hostname: self.hostname,
            extensions,
        };
        Ok(Session::new(
            self.stream,
            server_info,
            self.endpoint,
            supports_vmtp,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Extension;
    use tokio_test::io::Builder;

    fn endpoint() -> Endpoint {
        Endpoint::new("mx.example.com", 25)
    }

    #[tokio::test]
    async fn handshake_detects_vmtp() {
        let mock = Builder::new()
            .read(b"220 mx.example.com ESMTP ready\r\n")
            .write(b"EHLO client.example.com\r\n")
            .read(b"250-mx.example.com\r\n250-SIZE 1000\r\n250-VMTP\r\n250 HELP\r\n")
            .build();

        let client = Client::from_stream(SmtpStream::new(mock), endpoint())
            .await
            .unwrap();
        let session = client.handshake("client.example.com").await.unwrap();

        assert!(session.supports_extension());
        assert_eq!(session.server_info().hostname, "mx.example.com");
        assert!(session.server_info().supports(&Extension::Size(Some(1000))));
        assert_eq!(session.host(), "mx.example.com");
        assert_eq!(session.port(), 25);
    }

    #[tokio::test]
    async fn handshake_without_marker() {
        let mock = Builder::new()
            .read(b"220 relay.example.com ESMTP\r\n")
            .write(b"EHLO client\r\n")
            .read(b"250-mx.example.com greets client\r\n250 HELP\r\n")
            .build();

        let client = Client::from_stream(SmtpStream::new(mock), endpoint())
            .await
            .unwrap();
        let session = client.handshake("client").await.unwrap();

        assert!(!session.supports_extension());
        assert_eq!(session.server_info().hostname, "relay.example.com");
    }

    #[tokio::test]
    async fn refused_ehlo_falls_back_to_helo() {
        let mock = Builder::new()
            .read(b"220 mx.example.com SMTP\r\n")
            .write(b"EHLO client\r\n")
            .read(b"502 Command not implemented\r\n")
            .write(b"HELO client\r\n")
            .read(b"250 mx.example.com\r\n")
            .build();

        let client = Client::from_stream(SmtpStream::new(mock), endpoint())
            .await
            .unwrap();
        let session = client.handshake("client").await.unwrap();

        assert!(!session.supports_extension());
        assert!(session.server_info().extensions.is_empty());
    }

    #[tokio::test]
    async fn refused_helo_still_opens_session() {
        let mock = Builder::new()
            .read(b"220 mx.example.com SMTP\r\n")
            .write(b"EHLO client\r\n")
            .read(b"500 What?\r\n")
            .write(b"HELO client\r\n")
            .read(b"501 No\r\n")
            .build();

        let client = Client::from_stream(SmtpStream::new(mock), endpoint())
            .await
            .unwrap();
        let session = client.handshake("client").await.unwrap();

        assert!(!session.supports_extension());
    }

    #[tokio::test]
    async fn rejected_greeting_is_error() {
        let mock = Builder::new()
            .read(b"554 No SMTP service here\r\n")
            .build();

        let Err(err) = Client::from_stream(SmtpStream::new(mock), endpoint()).await else {
            panic!("greeting should be refused");
        };
        assert_eq!(err.reply_code(), Some(554));
    }
}
