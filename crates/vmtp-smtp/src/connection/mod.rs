//! SMTP client connection management.
//!
//! A [`Client`] holds a greeted connection that has not been through the
//! handshake yet. [`Client::handshake`] probes the server and yields a
//! [`Session`], whose VMTP capability flag is fixed for its whole lifetime.

mod client;
mod session;
mod stream;

pub use client::Client;
pub use session::{SendReport, Session};
pub use stream::{DEFAULT_MAX_LINE_LENGTH, SmtpStream, connect};

use std::collections::HashSet;
use std::fmt;

use crate::types::Extension;

/// What the server said about itself during the handshake.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// First word of the `220` greeting.
    pub hostname: String,
    /// Capabilities from the `EHLO` reply; empty after `HELO`.
    pub extensions: HashSet<Extension>,
}

impl ServerInfo {
    /// Whether `ext` was advertised exactly as given.
    #[must_use]
    pub fn supports(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }

    /// Whether `VMTP` was advertised.
    #[must_use]
    pub fn supports_vmtp(&self) -> bool {
        self.supports(&Extension::Vmtp)
    }

    /// Limit from `SIZE <n>`, if any.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::Size(limit) => *limit,
            _ => None,
        })
    }
}

/// `host:port` a client connected to, kept for log fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Host name or IP literal.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl Endpoint {
    /// Pairs a host with a port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_message_size_from_extensions() {
        let info = ServerInfo {
            hostname: "mx".into(),
            extensions: [Extension::Size(Some(1024)), Extension::Vmtp]
                .into_iter()
                .collect(),
        };
        assert_eq!(info.max_message_size(), Some(1024));
        assert!(info.supports_vmtp());
    }

    #[test]
    fn endpoint_display() {
        assert_eq!(Endpoint::new("localhost", 8025).to_string(), "localhost:8025");
    }
}
