//! Reply parsing for the client side.
//!
//! A reply is one or more lines sharing a code. Every line but the last has
//! `-` after the code; the last has a space or nothing at all:
//!
//! ```text
//! 250-mx.example.com
//! 250-VMTP
//! 250 HELP
//! ```

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Builds a [`Reply`] from the lines read off the wire, CRLF already removed.
///
/// # Errors
///
/// Returns [`Error::Protocol`] for no lines, a line that does not start with
/// three digits, or lines with differing codes.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let (first, _) = lines
        .split_first()
        .ok_or_else(|| Error::Protocol("Empty reply".into()))?;
    let code = code_of(first)?;

    let message = lines
        .iter()
        .map(|line| {
            if code_of(line)? != code {
                return Err(Error::Protocol(format!("Reply code changed mid-reply: {line}")));
            }
            Ok(line.get(4..).unwrap_or_default().to_string())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Reply::new(code, message))
}

/// Whether `line` ends a reply: a space after the code, or the bare code.
#[must_use]
pub fn is_last_reply_line(line: &str) -> bool {
    matches!(line.as_bytes().get(3), Some(b' ') | None) && line.len() >= 3
}

fn code_of(line: &str) -> Result<ReplyCode> {
    let digits = line
        .get(..3)
        .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| Error::Protocol(format!("Malformed reply line: {line}")))?;
    let separator_ok = matches!(line.as_bytes().get(3), None | Some(b' ' | b'-'));
    if !separator_ok {
        return Err(Error::Protocol(format!("Malformed reply line: {line}")));
    }
    digits
        .parse()
        .map(ReplyCode::new)
        .map_err(|_| Error::Protocol(format!("Malformed reply line: {line}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn ehlo_reply_keeps_each_line() {
        let reply = parse_reply(&lines(&[
            "250-mx.example.com",
            "250-SIZE 33554432",
            "250-VMTP",
            "250 HELP",
        ]))
        .unwrap();
        assert_eq!(reply.code, ReplyCode::OK);
        assert_eq!(
            reply.message,
            vec!["mx.example.com", "SIZE 33554432", "VMTP", "HELP"]
        );
    }

    #[test]
    fn greeting_and_bare_code() {
        let greeting = parse_reply(&lines(&["220 mx.example.com ESMTP ready"])).unwrap();
        assert!(greeting.is_success());
        assert_eq!(greeting.message_text(), "mx.example.com ESMTP ready");

        let bare = parse_reply(&lines(&["354"])).unwrap();
        assert_eq!(bare.code, ReplyCode::START_DATA);
        assert_eq!(bare.message, vec![""]);
    }

    #[test]
    fn malformed_replies() {
        for bad in [
            lines(&[]),
            lines(&["25"]),
            lines(&["ABC OK"]),
            lines(&["250OK"]),
            lines(&["250-first", "251 second"]),
        ] {
            assert!(
                matches!(parse_reply(&bad), Err(Error::Protocol(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn last_line_detection() {
        assert!(is_last_reply_line("250 OK"));
        assert!(is_last_reply_line("354"));
        assert!(!is_last_reply_line("250-more"));
        assert!(!is_last_reply_line("25"));
        assert!(!is_last_reply_line(""));
    }
}
