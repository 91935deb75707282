//! # vmtp-core
//!
//! Services on top of the VMTP protocol library.
//!
//! This crate provides:
//! - Outgoing message model with metadata and attachments
//! - RFC 5322 composition (`multipart/mixed` with base64 attachments)
//! - Client and server configuration files
//! - Metadata parsing from `key=value` pairs and JSON files
//! - High-level `send_message` and `serve` services

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod compose;
pub mod config;
mod error;
pub mod inspect;
pub mod message;
pub mod metadata;
pub mod service;

pub use compose::compose;
pub use config::{ClientConfig, Config, ServerConfig};
pub use error::{Error, Result};
pub use message::{Attachment, OutgoingMessage};
pub use service::{LoggingHandler, send_message, serve};
