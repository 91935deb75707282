//! Server-side command line parser.

use crate::command::Command;
use crate::types::Address;

/// Why a command line could not be turned into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The verb is not known to this server (reply 500).
    #[error("Command not recognized: {0}")]
    Unrecognized(String),
    /// The verb is known but its arguments are malformed (reply 501).
    #[error("Syntax error in arguments: {0}")]
    Syntax(String),
}

/// Parses one command line (without the trailing CRLF).
///
/// Verbs and parameter keywords are case-insensitive.
///
/// # Errors
///
/// Returns [`CommandError::Unrecognized`] for unknown verbs and
/// [`CommandError::Syntax`] for malformed arguments.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (verb, args) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(v, a)| (v, a.trim()));

    match verb.to_ascii_uppercase().as_str() {
        "EHLO" => Ok(Command::Ehlo {
            hostname: required(args, "EHLO requires a domain")?.to_string(),
        }),
        "HELO" => Ok(Command::Helo {
            hostname: required(args, "HELO requires a domain")?.to_string(),
        }),
        "MAIL" => parse_mail(args),
        "RCPT" => {
            let path = strip_keyword(args, "TO:")
                .ok_or_else(|| syntax("Usage: RCPT TO:<address>"))?;
            Ok(Command::RcptTo {
                to: address(path)?,
            })
        }
        "VECMAIL" => parse_vecmail(args),
        "METADATA" => parse_metadata(args),
        "DATA" => Ok(Command::Data),
        "RSET" => Ok(Command::Rset),
        "NOOP" => Ok(Command::Noop),
        "QUIT" => Ok(Command::Quit),
        _ => Err(CommandError::Unrecognized(verb.to_string())),
    }
}

fn parse_mail(args: &str) -> Result<Command, CommandError> {
    let rest = strip_keyword(args, "FROM:")
        .ok_or_else(|| syntax("Usage: MAIL FROM:<address> [SIZE=n]"))?;
    let mut tokens = rest.split_whitespace();
    let from = address(tokens.next().unwrap_or_default())?;

    let mut size = None;
    for param in tokens {
        if let Some(value) = strip_keyword(param, "SIZE=") {
            size = Some(number(value)?);
        }
    }

    Ok(Command::MailFrom { from, size })
}

fn parse_vecmail(args: &str) -> Result<Command, CommandError> {
    let mut from = None;
    let mut to = None;
    let mut size = None;

    for token in args.split_whitespace() {
        if let Some(path) = strip_keyword(token, "FROM:") {
            from = Some(address(path)?);
        } else if let Some(list) = strip_keyword(token, "TO:") {
            to = Some(address_list(list)?);
        } else if let Some(value) = strip_keyword(token, "SIZE=") {
            size = Some(number(value)?);
        } else {
            return Err(syntax(&format!("Unexpected VECMAIL parameter: {token}")));
        }
    }

    match (from, to) {
        (Some(from), Some(to)) => Ok(Command::VecMail { from, to, size }),
        _ => Err(syntax("Usage: VECMAIL FROM:<address> TO:<address,...> SIZE=n")),
    }
}

/// A key with nothing after it carries an empty value.
fn parse_metadata(args: &str) -> Result<Command, CommandError> {
    let (key, value) = args
        .split_once(char::is_whitespace)
        .unwrap_or((args, ""));
    if key.is_empty() {
        return Err(syntax("Usage: METADATA <key> <value>"));
    }

    Ok(Command::Metadata {
        key: key.to_string(),
        value: value.trim_start().to_string(),
    })
}

fn address_list(list: &str) -> Result<Vec<Address>, CommandError> {
    let inner = list
        .strip_prefix('<')
        .and_then(|l| l.strip_suffix('>'))
        .unwrap_or(list);

    let addresses = inner
        .split(',')
        .map(|a| address(a.trim()))
        .collect::<Result<Vec<_>, _>>()?;

    if addresses.is_empty() {
        return Err(syntax("VECMAIL requires at least one recipient"));
    }
    Ok(addresses)
}

fn address(path: &str) -> Result<Address, CommandError> {
    Address::from_path(path).map_err(|e| CommandError::Syntax(e.to_string()))
}

fn number(value: &str) -> Result<usize, CommandError> {
    value
        .parse()
        .map_err(|_| syntax(&format!("Invalid SIZE value: {value}")))
}

fn required<'a>(args: &'a str, message: &str) -> Result<&'a str, CommandError> {
    if args.is_empty() {
        Err(syntax(message))
    } else {
        Ok(args)
    }
}

/// Strips an ASCII keyword such as `FROM:` case-insensitively.
fn strip_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    let head = s.get(..keyword.len())?;
    if head.eq_ignore_ascii_case(keyword) {
        s.get(keyword.len()..).map(str::trim_start)
    } else {
        None
    }
}

fn syntax(message: &str) -> CommandError {
    CommandError::Syntax(message.to_string())
}
