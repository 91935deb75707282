//! Per-session command dispatch.
//!
//! The dispatcher is a synchronous state machine: it takes command lines
//! (and, while receiving a message, data lines) and says what to reply. The
//! network loop in [`super::serve_connection`] only moves bytes.

use super::config::DispatcherConfig;
use super::handler::ReceivedMail;
use crate::command::Command;
use crate::parser::{CommandError, parse_command};
use crate::types::{Address, Extension, Reply, ReplyCode};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Connected, waiting for EHLO or HELO.
    Greeting,
    /// Greeted; envelope commands (including VMTP ones) are legal.
    EnvelopeNegotiation,
    /// Receiving message content after `354`.
    DataTransfer,
}

/// What the network loop should do with a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send the reply and keep reading.
    Reply(Reply),
    /// Send the reply and close the connection.
    Close(Reply),
}

/// Envelope collected so far.
#[derive(Debug, Default)]
struct Transaction {
    sender: Option<Address>,
    recipients: Vec<Address>,
    metadata: BTreeMap<String, String>,
    size_hint: Option<usize>,
    data: Vec<u8>,
    overflow: bool,
}

/// SMTP command dispatcher with the VMTP extension.
#[derive(Debug)]
pub struct Dispatcher {
    config: Arc<DispatcherConfig>,
    peer: Option<SocketAddr>,
    phase: Phase,
    client_hostname: Option<String>,
    transaction: Transaction,
}

impl Dispatcher {
    /// Creates a dispatcher for one session.
    #[must_use]
    pub fn new(config: Arc<DispatcherConfig>, peer: Option<SocketAddr>) -> Self {
        Self {
            config,
            peer,
            phase: Phase::Greeting,
            client_hostname: None,
            transaction: Transaction::default(),
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the `220` greeting sent on connect.
    #[must_use]
    pub fn greeting(&self) -> Reply {
        Reply::single(
            ReplyCode::SERVICE_READY,
            format!("{} ESMTP ready", self.config.hostname),
        )
    }

    /// Returns the EHLO reply, advertising VMTP when enabled.
    #[must_use]
    pub fn ehlo_reply(&self) -> Reply {
        let mut lines = vec![
            self.config.hostname.clone(),
            Extension::Size(Some(self.config.max_message_size)).to_string(),
            Extension::EightBitMime.to_string(),
        ];
        if self.config.enable_vmtp {
            lines.push(Extension::Vmtp.to_string());
        }
        lines.push(Extension::Help.to_string());
        Reply::new(ReplyCode::OK, lines)
    }

    /// Handles one command line.
    pub fn handle_line(&mut self, line: &str) -> Action {
        match parse_command(line) {
            Ok(cmd) => self.handle(cmd),
            Err(CommandError::Unrecognized(verb)) => {
                debug!(%verb, "Unrecognized command");
                Action::Reply(Reply::single(
                    ReplyCode::SYNTAX_ERROR,
                    "Error: command not recognized",
                ))
            }
            Err(CommandError::Syntax(message)) => {
                Action::Reply(Reply::single(ReplyCode::PARAMETER_ERROR, message))
            }
        }
    }

    /// Handles one parsed command.
    pub fn handle(&mut self, cmd: Command) -> Action {
        if cmd.is_extension() && !self.config.enable_vmtp {
            return reply(ReplyCode::NOT_IMPLEMENTED, "Command not implemented");
        }

        match cmd {
            Command::Ehlo { hostname } => {
                self.greet(hostname);
                Action::Reply(self.ehlo_reply())
            }
            Command::Helo { hostname } => {
                self.greet(hostname);
                reply(ReplyCode::OK, &self.config.hostname)
            }
            Command::Quit => Action::Close(Reply::single(ReplyCode::CLOSING, "Bye")),
            Command::Noop => Action::Reply(Reply::ok()),
            Command::Rset => {
                self.transaction = Transaction::default();
                Action::Reply(Reply::ok())
            }
            _ if self.phase == Phase::Greeting => {
                reply(ReplyCode::BAD_SEQUENCE, "Error: send HELO first")
            }
            Command::MailFrom { from, size } => {
                if self.transaction.sender.is_some() {
                    return reply(ReplyCode::BAD_SEQUENCE, "Error: nested MAIL command");
                }
                debug!(sender = %from, "MAIL FROM");
                self.transaction.sender = Some(from);
                self.transaction.size_hint = size;
                Action::Reply(Reply::ok())
            }
            Command::RcptTo { to } => {
                if self.transaction.sender.is_none() {
                    return reply(ReplyCode::BAD_SEQUENCE, "Error: need MAIL command");
                }
                debug!(recipient = %to, "RCPT TO");
                self.transaction.recipients.push(to);
                Action::Reply(Reply::ok())
            }
            Command::VecMail { from, to, size } => {
                debug!(sender = %from, recipients = to.len(), ?size, "VECMAIL");
                self.transaction.sender = Some(from);
                self.transaction.recipients.extend(to);
                self.transaction.size_hint = size;
                Action::Reply(Reply::ok())
            }
            Command::Metadata { key, value } => {
                debug!(%key, %value, "METADATA");
                self.transaction.metadata.insert(key, value);
                Action::Reply(Reply::ok())
            }
            Command::Data => {
                if self.transaction.sender.is_none() {
                    return reply(ReplyCode::BAD_SEQUENCE, "Error: need MAIL command");
                }
                if self.transaction.recipients.is_empty() {
                    return reply(ReplyCode::BAD_SEQUENCE, "Error: need RCPT command");
                }
                self.phase = Phase::DataTransfer;
                reply(ReplyCode::START_DATA, "End data with <CR><LF>.<CR><LF>")
            }
        }
    }

    /// Feeds one line of message content (without CRLF).
    ///
    /// Returns `None` until the end-of-data marker, then either the complete
    /// message or the reply rejecting it. Either way the transaction is
    /// cleared and the session is back in envelope negotiation.
    pub fn data_line(&mut self, line: &[u8]) -> Option<Result<ReceivedMail, Reply>> {
        if line == b"." {
            return Some(self.finish_data());
        }

        let line = line.strip_prefix(b".").unwrap_or(line);
        let data = &mut self.transaction.data;
        if data.len() + line.len() + 2 > self.config.max_message_size {
            self.transaction.overflow = true;
        } else if !self.transaction.overflow {
            data.extend_from_slice(line);
            data.extend_from_slice(b"\r\n");
        }
        None
    }

    fn finish_data(&mut self) -> Result<ReceivedMail, Reply> {
        self.phase = Phase::EnvelopeNegotiation;
        let transaction = std::mem::take(&mut self.transaction);

        if transaction.overflow {
            return Err(Reply::single(
                ReplyCode::EXCEEDED_STORAGE,
                "Error: Too much mail data",
            ));
        }

        let Some(sender) = transaction.sender else {
            return Err(Reply::single(
                ReplyCode::BAD_SEQUENCE,
                "Error: need MAIL command",
            ));
        };

        Ok(ReceivedMail {
            peer: self.peer,
            client_hostname: self.client_hostname.clone(),
            sender,
            recipients: transaction.recipients,
            metadata: transaction.metadata,
            size_hint: transaction.size_hint,
            data: transaction.data,
        })
    }

    fn greet(&mut self, hostname: String) {
        debug!(client = %hostname, "Greeted");
        self.client_hostname = Some(hostname);
        self.transaction = Transaction::default();
        self.phase = Phase::EnvelopeNegotiation;
    }
}

fn reply(code: ReplyCode, text: &str) -> Action {
    Action::Reply(Reply::single(code, text))
}
