//! Outgoing message model.

use crate::error::Result;
use std::collections::BTreeMap;
use std::path::Path;
use vmtp_smtp::{Address, Envelope};

/// A file attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name announced in the MIME part.
    pub filename: String,
    /// Raw file content.
    pub content: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment from memory.
    #[must_use]
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Reads an attachment from disk, naming it after the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let content = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map_or_else(|| "attachment".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self { filename, content })
    }
}

/// An email message to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Sender address.
    pub from: String,
    /// Recipient addresses, in declaration order.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
    /// Metadata sent with `METADATA` when the server supports VMTP.
    pub metadata: BTreeMap<String, String>,
    /// File attachments.
    pub attachments: Vec<Attachment>,
}

impl OutgoingMessage {
    /// Creates a new outgoing message.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: Vec::new(),
            subject: subject.into(),
            body: body.into(),
            metadata: BTreeMap::new(),
            attachments: Vec::new(),
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Adds one metadata pair.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Adds an attachment.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Builds the SMTP envelope.
    ///
    /// The size hint is the length of the text body in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if an address is malformed, there are no recipients,
    /// or a metadata pair cannot be sent as a `METADATA` command.
    pub fn envelope(&self) -> Result<Envelope> {
        let sender = Address::new(&self.from)?;
        let recipients = self
            .to
            .iter()
            .map(Address::new)
            .collect::<vmtp_smtp::Result<Vec<_>>>()?;

        let mut envelope = Envelope::new(sender, recipients, self.body.len())?;
        for (key, value) in &self.metadata {
            envelope = envelope.with_metadata(key, value)?;
        }
        Ok(envelope)
    }
}
