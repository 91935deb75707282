//! Message acceptance callback.

use crate::types::{Address, Reply};
use std::collections::BTreeMap;
use std::net::SocketAddr;

/// A message received by the server, as handed to a [`MailHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMail {
    /// Remote address of the client, when known.
    pub peer: Option<SocketAddr>,
    /// Hostname the client greeted with.
    pub client_hostname: Option<String>,
    /// Envelope sender.
    pub sender: Address,
    /// Envelope recipients, from `RCPT TO` or `VECMAIL`.
    pub recipients: Vec<Address>,
    /// Metadata attached with `METADATA`.
    pub metadata: BTreeMap<String, String>,
    /// Size announced by `VECMAIL` or `MAIL FROM ... SIZE=`.
    pub size_hint: Option<usize>,
    /// Message content, dot-unstuffed, CRLF line endings.
    pub data: Vec<u8>,
}

/// Decides whether a received message is accepted.
///
/// Called on the session's task once the end-of-data marker arrives; an
/// `Err` reply is sent to the client instead of `250 OK`.
pub trait MailHandler: Send + Sync + 'static {
    /// Accepts or rejects one message.
    ///
    /// # Errors
    ///
    /// Returns the reply to send when the message is rejected.
    fn accept(&self, mail: &ReceivedMail) -> Result<(), Reply>;
}

impl<F> MailHandler for F
where
    F: Fn(&ReceivedMail) -> Result<(), Reply> + Send + Sync + 'static,
{
    fn accept(&self, mail: &ReceivedMail) -> Result<(), Reply> {
        self(mail)
    }
}
