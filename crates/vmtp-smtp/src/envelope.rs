//! Message envelope handed to the send planner.

use crate::error::{Error, Result};
use crate::planner::MessageShape;
use crate::types::Address;
use std::collections::BTreeMap;

/// Sender, recipients and metadata of one outgoing message.
///
/// Metadata is kept in a sorted map, so `METADATA` commands go out in key
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    sender: Address,
    recipients: Vec<Address>,
    metadata: BTreeMap<String, String>,
    size_hint: usize,
}

impl Envelope {
    /// Creates an envelope.
    ///
    /// `size_hint` is advertised in `VECMAIL`; by convention it is the body
    /// length in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRecipients`] if `recipients` is empty.
    pub fn new(sender: Address, recipients: Vec<Address>, size_hint: usize) -> Result<Self> {
        if recipients.is_empty() {
            return Err(Error::NoRecipients);
        }
        Ok(Self {
            sender,
            recipients,
            metadata: BTreeMap::new(),
            size_hint,
        })
    }

    /// Adds one metadata pair, replacing any earlier value for the key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMetadata`] if the key is empty or contains
    /// whitespace, or if either part contains a line break.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let value = value.into();

        if key.is_empty() || key.chars().any(char::is_whitespace) {
            return Err(Error::InvalidMetadata(format!(
                "key must be a single word: {key:?}"
            )));
        }
        if value.contains(['\r', '\n']) {
            return Err(Error::InvalidMetadata(format!(
                "value for {key} contains a line break"
            )));
        }

        self.metadata.insert(key, value);
        Ok(self)
    }

    /// Returns the sender.
    #[must_use]
    pub const fn sender(&self) -> &Address {
        &self.sender
    }

    /// Returns the recipients in declaration order.
    #[must_use]
    pub fn recipients(&self) -> &[Address] {
        &self.recipients
    }

    /// Returns the metadata map.
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Returns the size hint.
    #[must_use]
    pub const fn size_hint(&self) -> usize {
        self.size_hint
    }

    /// Returns the shape the planner decides on.
    #[must_use]
    pub fn shape(&self) -> MessageShape {
        MessageShape {
            recipients: self.recipients.len(),
            metadata: self.metadata.len(),
        }
    }
}
