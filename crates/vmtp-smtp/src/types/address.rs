//! Envelope addresses.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A `local@domain` mailbox as used in `MAIL FROM`, `RCPT TO` and `VECMAIL`.
///
/// Only the shape is checked: one `@`, both sides non-empty, and none of
/// the characters that delimit paths or the `VECMAIL` recipient list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Checks and wraps an address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] when the shape check fails.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        check(&addr).map_err(|reason| Error::InvalidAddress(format!("{reason}: {addr:?}")))?;
        Ok(Self(addr))
    }

    /// Reads a path as written after `FROM:` or `TO:`, e.g. `<user@example.com>`.
    ///
    /// Surrounding whitespace and one pair of angle brackets are removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] when what remains is not an address.
    pub fn from_path(path: &str) -> Result<Self> {
        let path = path.trim();
        Self::new(
            path.strip_prefix('<')
                .and_then(|inner| inner.strip_suffix('>'))
                .unwrap_or(path),
        )
    }

    /// The address text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn check(addr: &str) -> std::result::Result<(), &'static str> {
    if addr.contains(|c: char| c.is_whitespace() || matches!(c, '<' | '>' | ',')) {
        return Err("reserved character in address");
    }
    match addr.split_once('@') {
        None => Err("missing @"),
        Some((_, domain)) if domain.contains('@') => Err("more than one @"),
        Some(("", _) | (_, "")) => Err("empty local part or domain"),
        Some(_) => Ok(()),
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
