//! # vmtp-smtp
//!
//! SMTP client and server implementing RFC 5321 plus the VMTP extension.
//!
//! ## Features
//!
//! - **Capability probing**: the `VMTP` EHLO keyword is detected once per
//!   session and fixed for its lifetime
//! - **Vectorized envelopes**: `VECMAIL FROM:<a> TO:<b,c> SIZE=n` declares
//!   sender and all recipients in one round trip
//! - **Metadata**: `METADATA <key> <value>` attaches key/value pairs to a
//!   transaction
//! - **Graceful fallback**: a rejected `VECMAIL` falls back to `MAIL FROM`
//!   plus one `RCPT TO` per recipient; rejected metadata is skipped
//! - **Server**: a per-connection dispatcher that accepts both paths
//!
//! ## Quick Start
//!
//! ```ignore
//! use vmtp_smtp::{Address, Client, Envelope};
//!
//! #[tokio::main]
//! async fn main() -> vmtp_smtp::Result<()> {
//!     let client = Client::connect("mx.example.com", 25).await?;
//!     let mut session = client.handshake("client.example.com").await?;
//!
//!     let body = b"Subject: Test\r\n\r\nHello, World!\r\n";
//!     let envelope = Envelope::new(
//!         Address::new("sender@example.com")?,
//!         vec![Address::new("a@example.com")?, Address::new("b@example.com")?],
//!         body.len(),
//!     )?
//!     .with_metadata("campaign", "spring")?;
//!
//!     let report = session.send(&envelope, body).await?;
//!     println!("sent via {:?}", report.path);
//!
//!     session.quit().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Send Sequence
//!
//! ```text
//! EHLO ──→ VMTP advertised? ── yes ──→ METADATA* ──→ VECMAIL ──→ DATA
//!                │                                      │
//!                no                                  rejected
//!                │                                      │
//!                └──────────→ MAIL FROM ──→ RCPT TO* ←──┘ ──→ DATA
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders
//! - [`connection`]: Client connection and session
//! - [`negotiate`]: EHLO capability probing
//! - [`parser`]: Reply and command parsers
//! - [`planner`]: Pure send-sequence decisions
//! - [`server`]: Listener and per-connection dispatcher
//! - [`types`]: Core SMTP types (addresses, extensions, replies)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod envelope;
mod error;
pub mod negotiate;
pub mod parser;
pub mod planner;
pub mod server;
pub mod types;

pub use command::Command;
pub use connection::{Client, SendReport, Session};
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use planner::Path;
pub use server::{Dispatcher, DispatcherConfig, MailHandler, ReceivedMail, Server};
pub use types::{Address, CommandOutcome, Extension, Reply, ReplyClass, ReplyCode};
