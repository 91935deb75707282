//! Service extensions announced in the `EHLO` reply.

use std::fmt;

/// Keyword a server lists to offer `VECMAIL` and `METADATA`.
pub const VMTP_KEYWORD: &str = "VMTP";

/// One `EHLO` capability line.
///
/// Keywords are matched case-insensitively and as whole tokens, so `XVMTP`
/// is not `VMTP`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// `SIZE`, with the limit in bytes when the server gives one.
    Size(Option<usize>),
    /// `8BITMIME`.
    EightBitMime,
    /// `HELP`.
    Help,
    /// `VMTP`: bulk recipients and envelope metadata.
    Vmtp,
    /// Anything else, kept verbatim.
    Unknown(String),
}

impl Extension {
    /// Reads one capability line (without the `250-` prefix).
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            return Self::Unknown(line.to_string());
        };

        if keyword.eq_ignore_ascii_case("SIZE") {
            Self::Size(tokens.next().and_then(|limit| limit.parse().ok()))
        } else if keyword.eq_ignore_ascii_case("8BITMIME") {
            Self::EightBitMime
        } else if keyword.eq_ignore_ascii_case("HELP") {
            Self::Help
        } else if keyword.eq_ignore_ascii_case(VMTP_KEYWORD) {
            Self::Vmtp
        } else {
            Self::Unknown(line.to_string())
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Size(Some(limit)) => write!(f, "SIZE {limit}"),
            Self::Size(None) => f.write_str("SIZE"),
            Self::EightBitMime => f.write_str("8BITMIME"),
            Self::Help => f.write_str("HELP"),
            Self::Vmtp => f.write_str(VMTP_KEYWORD),
            Self::Unknown(line) => f.write_str(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vmtp_keyword_is_a_whole_token() {
        assert_eq!(Extension::parse("VMTP"), Extension::Vmtp);
        assert_eq!(Extension::parse("vmtp"), Extension::Vmtp);
        assert_eq!(Extension::parse("XVMTP"), Extension::Unknown("XVMTP".into()));
        assert_eq!(Extension::parse("VMTPX 1"), Extension::Unknown("VMTPX 1".into()));
    }

    #[test]
    fn size_limit_is_optional() {
        assert_eq!(Extension::parse("SIZE 52428800"), Extension::Size(Some(52_428_800)));
        assert_eq!(Extension::parse("size"), Extension::Size(None));
        assert_eq!(Extension::parse("SIZE lots"), Extension::Size(None));
    }

    #[test]
    fn unrecognized_lines_are_kept() {
        assert_eq!(Extension::parse(""), Extension::Unknown(String::new()));
        assert_eq!(
            Extension::parse("PIPELINING"),
            Extension::Unknown("PIPELINING".into())
        );
    }

    #[test]
    fn advertised_lines_read_back() {
        for ext in [
            Extension::Size(Some(1024)),
            Extension::EightBitMime,
            Extension::Help,
            Extension::Vmtp,
        ] {
            assert_eq!(Extension::parse(&ext.to_string()), ext);
        }
    }
}
