//! Reply parser (client side) and command parser (server side).

mod command;
mod reply;

pub use command::{CommandError, parse_command};
pub use reply::{is_last_reply_line, parse_reply};
