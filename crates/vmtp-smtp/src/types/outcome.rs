//! Per-command outcome.

use super::{Reply, ReplyCode};

/// Result of issuing one protocol command.
///
/// Rejections are values rather than errors: whether a rejection is fatal
/// depends on which step of a send produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Server replied with a 2xx code.
    Accepted(ReplyCode, String),
    /// Any other code. A `354` after `DATA` lands here too; the caller
    /// checks for it by code.
    Rejected(ReplyCode, String),
}

impl CommandOutcome {
    /// Returns true for [`CommandOutcome::Accepted`].
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(..))
    }

    /// Returns the reply code.
    #[must_use]
    pub const fn code(&self) -> ReplyCode {
        match self {
            Self::Accepted(code, _) | Self::Rejected(code, _) => *code,
        }
    }

    /// Returns the reply text.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Accepted(_, text) | Self::Rejected(_, text) => text,
        }
    }
}

impl From<Reply> for CommandOutcome {
    fn from(reply: Reply) -> Self {
        let text = reply.message_text();
        if reply.code.is_success() {
            Self::Accepted(reply.code, text)
        } else {
            Self::Rejected(reply.code, text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_accepted() {
        let outcome = CommandOutcome::from(Reply::ok());
        assert!(outcome.is_accepted());
        assert_eq!(outcome.code(), ReplyCode::OK);
        assert_eq!(outcome.text(), "OK");
    }

    #[test]
    fn intermediate_is_not_accepted() {
        let reply = Reply::single(ReplyCode::START_DATA, "End data with <CR><LF>.<CR><LF>");
        let outcome = CommandOutcome::from(reply);
        assert!(!outcome.is_accepted());
        assert_eq!(outcome.code(), ReplyCode::START_DATA);
    }

    #[test]
    fn errors_are_rejected() {
        let reply = Reply::single(ReplyCode::NOT_IMPLEMENTED, "Command not implemented");
        let outcome = CommandOutcome::from(reply);
        assert!(!outcome.is_accepted());
        assert_eq!(outcome.code().as_u16(), 502);
    }
}
