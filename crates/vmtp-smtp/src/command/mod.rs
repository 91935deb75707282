//! Commands a client sends.
//!
//! `Display` writes the command line without its terminator;
//! [`Command::serialize`] adds CRLF for the wire.

use std::fmt;

use crate::types::Address;

/// A client command, base SMTP or VMTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `HELO <hostname>`, used when `EHLO` is refused.
    Helo {
        /// Name the client introduces itself with.
        hostname: String,
    },
    /// `EHLO <hostname>`.
    Ehlo {
        /// Name the client introduces itself with.
        hostname: String,
    },
    /// `MAIL FROM:<from> [SIZE=n]`.
    MailFrom {
        /// Reverse path.
        from: Address,
        /// Optional size declaration.
        size: Option<usize>,
    },
    /// `RCPT TO:<to>`.
    RcptTo {
        /// One forward path.
        to: Address,
    },
    /// `VECMAIL FROM:<from> TO:<a,b,...> [SIZE=n]`: the whole envelope in
    /// one command.
    VecMail {
        /// Reverse path.
        from: Address,
        /// Forward paths, sent comma-separated in this order.
        to: Vec<Address>,
        /// Optional size declaration.
        size: Option<usize>,
    },
    /// `METADATA <key> <value>`.
    Metadata {
        /// Single token.
        key: String,
        /// Rest of the line; may contain spaces.
        value: String,
    },
    /// `DATA`.
    Data,
    /// `RSET`.
    Rset,
    /// `NOOP`.
    Noop,
    /// `QUIT`.
    Quit,
}

impl Command {
    /// The leading keyword, for logging.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Helo { .. } => "HELO",
            Self::Ehlo { .. } => "EHLO",
            Self::MailFrom { .. } => "MAIL",
            Self::RcptTo { .. } => "RCPT",
            Self::VecMail { .. } => "VECMAIL",
            Self::Metadata { .. } => "METADATA",
            Self::Data => "DATA",
            Self::Rset => "RSET",
            Self::Noop => "NOOP",
            Self::Quit => "QUIT",
        }
    }

    /// Whether only a server advertising `VMTP` understands the command.
    #[must_use]
    pub const fn is_extension(&self) -> bool {
        matches!(self, Self::VecMail { .. } | Self::Metadata { .. })
    }

    /// The command line with CRLF.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        format!("{self}\r\n").into_bytes()
    }
}

fn write_size(f: &mut fmt::Formatter<'_>, size: Option<usize>) -> fmt::Result {
    match size {
        Some(size) => write!(f, " SIZE={size}"),
        None => Ok(()),
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Helo { hostname } | Self::Ehlo { hostname } => {
                write!(f, "{} {hostname}", self.verb())
            }
            Self::MailFrom { from, size } => {
                write!(f, "MAIL FROM:<{from}>")?;
                write_size(f, *size)
            }
            Self::RcptTo { to } => write!(f, "RCPT TO:<{to}>"),
            Self::VecMail { from, to, size } => {
                write!(f, "VECMAIL FROM:<{from}> TO:<")?;
                for (i, rcpt) in to.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str(rcpt.as_str())?;
                }
                f.write_str(">")?;
                write_size(f, *size)
            }
            Self::Metadata { key, value } => write!(f, "METADATA {key} {value}"),
            Self::Data | Self::Rset | Self::Noop | Self::Quit => f.write_str(self.verb()),
        }
    }
}
