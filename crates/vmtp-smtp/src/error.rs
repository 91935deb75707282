//! Errors from the protocol layer.

use std::io;

use crate::types::ReplyCode;

/// `Result` with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop a command, a send or a connection.
///
/// Refused `VECMAIL` and `METADATA` commands are not errors; the client falls
/// back to base SMTP for that message instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// End of stream from the peer.
    #[error("Connection closed by peer")]
    ConnectionClosed,

    /// A command got a `4yz` or `5yz` reply outside the send sequence.
    #[error("Server replied {code}: {message}")]
    SmtpError {
        /// Numeric reply code.
        code: u16,
        /// Reply text.
        message: String,
    },

    /// A base SMTP sender or recipient declaration was refused.
    #[error("{command} rejected with {code}: {message}")]
    EnvelopeRejected {
        /// `MAIL` or `RCPT`.
        command: &'static str,
        /// Numeric reply code.
        code: u16,
        /// Reply text.
        message: String,
    },

    /// `DATA` itself, or the message after the final `.`, was refused.
    #[error("Message data rejected with {code}: {message}")]
    DataRejected {
        /// Numeric reply code.
        code: u16,
        /// Reply text.
        message: String,
    },

    /// A reply that could not be parsed.
    #[error("Malformed reply: {0}")]
    Protocol(String),

    /// An address failed the shape check.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// A metadata pair that does not fit on one `METADATA` line.
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// The peer sent more than the line limit without a line break.
    #[error("Line longer than {limit} bytes")]
    LineTooLong {
        /// Limit in bytes, terminator excluded.
        limit: usize,
    },

    /// An envelope with no recipients.
    #[error("No recipients")]
    NoRecipients,
}

impl Error {
    /// [`Error::SmtpError`] from a code and reply text.
    #[must_use]
    pub fn smtp_error(code: u16, message: impl Into<String>) -> Self {
        Self::SmtpError {
            code,
            message: message.into(),
        }
    }

    /// The server's reply code, for errors that carry one.
    #[must_use]
    pub const fn reply_code(&self) -> Option<u16> {
        match self {
            Self::SmtpError { code, .. }
            | Self::EnvelopeRejected { code, .. }
            | Self::DataRejected { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Refused with a `5yz` code; retrying the same message will not help.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self.reply_code(), Some(code) if ReplyCode::new(code).is_permanent())
    }

    /// Refused with a `4yz` code.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.reply_code(), Some(code) if ReplyCode::new(code).is_transient())
    }

    /// The connection is gone and the session cannot continue.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ConnectionClosed)
    }
}
