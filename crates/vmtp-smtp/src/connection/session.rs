//! Negotiated SMTP session and the send loop.

use super::{Endpoint, ServerInfo, SmtpStream};
use crate::command::Command;
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::planner::{Next, Path, Step, first_step, next_step};
use crate::types::{CommandOutcome, ReplyCode};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Summary of a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    /// How recipients were declared.
    pub path: Path,
    /// Final reply to the message content.
    pub outcome: CommandOutcome,
    /// Metadata entries the server accepted.
    pub metadata_accepted: usize,
}

/// SMTP session after the handshake.
///
/// Whether the server speaks VMTP is decided once, during the handshake, and
/// never changes afterwards.
#[derive(Debug)]
pub struct Session<S = TcpStream> {
    stream: SmtpStream<S>,
    server_info: ServerInfo,
    endpoint: Endpoint,
    supports_extension: bool,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(super) const fn new(
        stream: SmtpStream<S>,
        server_info: ServerInfo,
        endpoint: Endpoint,
        supports_extension: bool,
    ) -> Self {
        Self {
            stream,
            server_info,
            endpoint,
            supports_extension,
        }
    }

    /// Returns true if the server advertised VMTP during the handshake.
    #[must_use]
    pub const fn supports_extension(&self) -> bool {
        self.supports_extension
    }

    /// Returns the server information.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Returns the server host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.endpoint.host
    }

    /// Returns the server port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.endpoint.port
    }

    /// Issues one command and returns the server's verdict.
    ///
    /// # Errors
    ///
    /// Returns an error only on transport failure or a malformed reply.
    pub async fn command(&mut self, cmd: &Command) -> Result<CommandOutcome> {
        self.stream.write_all(&cmd.serialize()).await?;
        let reply = self.stream.read_reply().await?;
        debug!(
            command = cmd.verb(),
            code = reply.code.as_u16(),
            "Command answered"
        );
        Ok(reply.into())
    }

    /// Issues one command and fails unless the server accepts it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SmtpError`] carrying the server's reply if the
    /// command is rejected, or a transport error.
    pub async fn expect(&mut self, cmd: &Command) -> Result<CommandOutcome> {
        let outcome = self.command(cmd).await?;
        if outcome.is_accepted() {
            Ok(outcome)
        } else {
            Err(Error::smtp_error(outcome.code().as_u16(), outcome.text()))
        }
    }

    /// Sends `DATA` followed by the message content.
    ///
    /// Line endings are normalized to CRLF and lines starting with `.` are
    /// byte-stuffed; the terminating `.` line is added here.
    ///
    /// # Errors
    ///
    /// Returns an error only on transport failure or a malformed reply.
    pub async fn transmit(&mut self, payload: &[u8]) -> Result<CommandOutcome> {
        let outcome = self.command(&Command::Data).await?;
        if outcome.code() != ReplyCode::START_DATA {
            return Ok(CommandOutcome::Rejected(
                outcome.code(),
                outcome.text().to_string(),
            ));
        }

        self.stream.write_all(&encode_data(payload)).await?;
        let reply = self.stream.read_reply().await?;
        debug!(code = reply.code.as_u16(), "Message content answered");
        Ok(reply.into())
    }

    /// Sends one message, using VMTP where the server supports it.
    ///
    /// Metadata goes out first as `METADATA` commands; the first rejection
    /// stops further metadata without failing the send. With more than one
    /// recipient the envelope is declared with a single `VECMAIL`; if that is
    /// rejected the client falls back to `MAIL FROM` plus one `RCPT TO` per
    /// recipient. Fallbacks apply to this message only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EnvelopeRejected`] if `MAIL FROM` or any `RCPT TO` is
    /// refused, [`Error::DataRejected`] if the content is refused, or a
    /// transport error. After a rejection the transaction is reset, so the
    /// session can carry the next message.
    pub async fn send(&mut self, envelope: &Envelope, payload: &[u8]) -> Result<SendReport> {
        let supports = self.supports_extension;
        let shape = envelope.shape();
        let mut path = Path::Base;
        let mut metadata_accepted = 0;
        let mut step = first_step(supports, shape);

        loop {
            let outcome = match step {
                Step::Metadata(i) => {
                    let Some((key, value)) = envelope.metadata().iter().nth(i) else {
                        return Err(Error::Protocol(format!("No metadata entry {i}")));
                    };
                    let cmd = Command::Metadata {
                        key: key.clone(),
                        value: value.clone(),
                    };
                    self.command(&cmd).await?
                }
                Step::BulkRecipients => {
                    let cmd = Command::VecMail {
                        from: envelope.sender().clone(),
                        to: envelope.recipients().to_vec(),
                        size: Some(envelope.size_hint()),
                    };
                    self.command(&cmd).await?
                }
                Step::Sender => {
                    let cmd = Command::MailFrom {
                        from: envelope.sender().clone(),
                        size: None,
                    };
                    self.command(&cmd).await?
                }
                Step::Recipient(i) => {
                    let Some(to) = envelope.recipients().get(i) else {
                        return Err(Error::Protocol(format!("No recipient {i}")));
                    };
                    self.command(&Command::RcptTo { to: to.clone() }).await?
                }
                Step::Payload => self.transmit(payload).await?,
            };

            match (step, outcome.is_accepted()) {
                (Step::Metadata(_), true) => metadata_accepted += 1,
                (Step::Metadata(_), false) => warn!(
                    code = outcome.code().as_u16(),
                    "METADATA rejected, skipping remaining metadata"
                ),
                (Step::BulkRecipients, true) => path = Path::Extended,
                (Step::BulkRecipients, false) => warn!(
                    code = outcome.code().as_u16(),
                    "VECMAIL rejected, falling back to MAIL/RCPT"
                ),
                _ => {}
            }

            match next_step(supports, shape, step, outcome.is_accepted()) {
                Next::Issue(next) => step = next,
                Next::Complete => {
                    info!(
                        recipients = shape.recipients,
                        ?path,
                        metadata_accepted,
                        "Message accepted"
                    );
                    return Ok(SendReport {
                        path,
                        outcome,
                        metadata_accepted,
                    });
                }
                Next::Abort(failed) => {
                    self.reset_transaction().await;
                    return Err(rejection(failed, &outcome));
                }
            }
        }
    }

    /// Sends QUIT and closes the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        let outcome = self.command(&Command::Quit).await?;

        if !outcome.is_accepted() {
            return Err(Error::smtp_error(
                outcome.code().as_u16(),
                outcome.text(),
            ));
        }

        Ok(())
    }

    async fn reset_transaction(&mut self) {
        match self.command(&Command::Rset).await {
            Ok(outcome) if outcome.is_accepted() => {}
            Ok(outcome) => warn!(code = outcome.code().as_u16(), "RSET refused"),
            Err(e) => warn!(error = %e, "RSET failed"),
        }
    }
}

fn rejection(step: Step, outcome: &CommandOutcome) -> Error {
    let code = outcome.code().as_u16();
    let message = outcome.text().to_string();
    match step {
        Step::Sender => Error::EnvelopeRejected {
            command: "MAIL",
            code,
            message,
        },
        Step::Recipient(_) => Error::EnvelopeRejected {
            command: "RCPT",
            code,
            message,
        },
        Step::Payload => Error::DataRejected { code, message },
        Step::Metadata(_) | Step::BulkRecipients => Error::smtp_error(code, message),
    }
}

/// Normalizes line endings to CRLF, byte-stuffs leading dots and appends the
/// end-of-data marker.
fn encode_data(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 8);
    let body = payload.strip_suffix(b"\n").unwrap_or(payload);

    if !payload.is_empty() {
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            if line.first() == Some(&b'.') {
                out.push(b'.');
            }

            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }

    out.extend_from_slice(b".\r\n");
    out
}
