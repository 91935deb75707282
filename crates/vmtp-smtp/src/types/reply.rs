//! Server replies and their three-digit codes.

use std::fmt;

/// Category of a reply, taken from the first digit of its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyClass {
    /// `2yz`: the command completed.
    Completed,
    /// `3yz`: the server waits for more input, as after `DATA`.
    Intermediate,
    /// `4yz`: refused for now; the same command may succeed later.
    Transient,
    /// `5yz`: refused for good.
    Permanent,
    /// Any other first digit.
    Unknown,
}

/// Three-digit reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// `220`, greeting.
    pub const SERVICE_READY: Self = Self(220);
    /// `221`, reply to `QUIT`.
    pub const CLOSING: Self = Self(221);
    /// `250`, command done.
    pub const OK: Self = Self(250);
    /// `251`, recipient accepted for forwarding.
    pub const FORWARD: Self = Self(251);
    /// `354`, send the message data.
    pub const START_DATA: Self = Self(354);
    /// `421`, server is shutting the channel.
    pub const SERVICE_UNAVAILABLE: Self = Self(421);
    /// `450`, mailbox busy.
    pub const MAILBOX_BUSY: Self = Self(450);
    /// `451`, server-side processing error.
    pub const LOCAL_ERROR: Self = Self(451);
    /// `452`, out of storage for now.
    pub const INSUFFICIENT_STORAGE: Self = Self(452);
    /// `500`, unknown command.
    pub const SYNTAX_ERROR: Self = Self(500);
    /// `501`, bad arguments.
    pub const PARAMETER_ERROR: Self = Self(501);
    /// `502`, command known but not offered.
    pub const NOT_IMPLEMENTED: Self = Self(502);
    /// `503`, command out of order.
    pub const BAD_SEQUENCE: Self = Self(503);
    /// `550`, mailbox refused.
    pub const MAILBOX_UNAVAILABLE: Self = Self(550);
    /// `552`, message larger than the server accepts.
    pub const EXCEEDED_STORAGE: Self = Self(552);
    /// `554`, transaction refused.
    pub const TRANSACTION_FAILED: Self = Self(554);

    /// Wraps a numeric code. No range check is made.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Numeric value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Classifies the code by its first digit.
    #[must_use]
    pub const fn class(self) -> ReplyClass {
        match self.0 / 100 {
            2 => ReplyClass::Completed,
            3 => ReplyClass::Intermediate,
            4 => ReplyClass::Transient,
            5 => ReplyClass::Permanent,
            _ => ReplyClass::Unknown,
        }
    }

    /// `2yz`.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self.class(), ReplyClass::Completed)
    }

    /// `3yz`.
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        matches!(self.class(), ReplyClass::Intermediate)
    }

    /// `4yz`.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self.class(), ReplyClass::Transient)
    }

    /// `5yz`.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        matches!(self.class(), ReplyClass::Permanent)
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

/// A complete reply, one entry per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Code shared by every line.
    pub code: ReplyCode,
    /// Text of each line.
    pub message: Vec<String>,
}

impl Reply {
    /// Reply with the given lines.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(code: ReplyCode, message: Vec<String>) -> Self {
        Self { code, message }
    }

    /// One-line reply.
    #[must_use]
    pub fn single(code: ReplyCode, text: impl Into<String>) -> Self {
        Self {
            code,
            message: vec![text.into()],
        }
    }

    /// `250 OK`
    #[must_use]
    pub fn ok() -> Self {
        Self::single(ReplyCode::OK, "OK")
    }

    /// Whether the code is `2yz`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Lines joined with `\n`.
    #[must_use]
    pub fn message_text(&self) -> String {
        self.message.join("\n")
    }

    /// Wire form: `-` after the code on all lines but the last, CRLF endings.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((last, rest)) = self.message.split_last() else {
            return write!(f, "{}\r\n", self.code);
        };
        for line in rest {
            write!(f, "{}-{line}\r\n", self.code)?;
        }
        write!(f, "{} {last}\r\n", self.code)
    }
}
