//! Core SMTP types.

mod address;
mod extension;
mod outcome;
mod reply;

pub use address::Address;
pub use extension::{Extension, VMTP_KEYWORD};
pub use outcome::CommandOutcome;
pub use reply::{Reply, ReplyClass, ReplyCode};
