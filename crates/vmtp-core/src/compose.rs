//! RFC 5322 message composition.
//!
//! A message without attachments is a single `text/plain` part. With
//! attachments it becomes `multipart/mixed`: the text body first, then one
//! base64 `application/octet-stream` part per file.

use crate::message::{Attachment, OutgoingMessage};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, FixedOffset, Local};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

/// Maximum encoded line length for base64 bodies.
const MAX_LINE_LENGTH: usize = 76;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Builds the payload transmitted after `DATA`.
#[must_use]
pub fn compose(message: &OutgoingMessage) -> String {
    let date = Local::now().fixed_offset();
    let token = format!(
        "{}.{}.{}",
        date.timestamp_micros(),
        std::process::id(),
        SEQUENCE.fetch_add(1, Ordering::Relaxed)
    );
    render(message, &date, &token)
}

fn render(message: &OutgoingMessage, date: &DateTime<FixedOffset>, token: &str) -> String {
    let mut out = String::new();

    let from = single_line(&message.from);
    let _ = write!(out, "From: {from}\r\n");
    if !message.to.is_empty() {
        let _ = write!(out, "To: {}\r\n", single_line(&message.to.join(", ")));
    }
    let _ = write!(out, "Subject: {}\r\n", single_line(&message.subject));
    let _ = write!(out, "Date: {}\r\n", date.to_rfc2822());
    let _ = write!(
        out,
        "Message-ID: <{token}@{}>\r\n",
        domain_of(&from)
    );
    out.push_str("MIME-Version: 1.0\r\n");

    if message.attachments.is_empty() {
        push_text_headers(&mut out);
        out.push_str("\r\n");
        push_body(&mut out, &message.body);
        return out;
    }

    let boundary = format!("=_vmtp_{token}");
    let _ = write!(
        out,
        "Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n"
    );

    let _ = write!(out, "--{boundary}\r\n");
    push_text_headers(&mut out);
    out.push_str("\r\n");
    push_body(&mut out, &message.body);

    for attachment in &message.attachments {
        let _ = write!(out, "--{boundary}\r\n");
        push_attachment(&mut out, attachment);
    }
    let _ = write!(out, "--{boundary}--\r\n");

    out
}

fn push_text_headers(out: &mut String) {
    out.push_str("Content-Type: text/plain; charset=utf-8\r\n");
    out.push_str("Content-Transfer-Encoding: 8bit\r\n");
}

/// Appends the body with CRLF line endings and a final line break.
fn push_body(out: &mut String, body: &str) {
    for line in body.lines() {
        out.push_str(line);
        out.push_str("\r\n");
    }
}

fn push_attachment(out: &mut String, attachment: &Attachment) {
    let filename = quote(&attachment.filename);
    out.push_str("Content-Type: application/octet-stream\r\n");
    let _ = write!(
        out,
        "Content-Disposition: attachment; filename=\"{filename}\"\r\n"
    );
    out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");

    let encoded = STANDARD.encode(&attachment.content);
    // Base64 output is ASCII, so byte chunks are valid UTF-8.
    for chunk in encoded.as_bytes().chunks(MAX_LINE_LENGTH) {
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push_str("\r\n");
    }
}

/// Drops CR and LF so a value cannot start a new header.
fn single_line(value: &str) -> String {
    value.chars().filter(|c| !matches!(c, '\r' | '\n')).collect()
}

fn quote(value: &str) -> String {
    single_line(value)
        .chars()
        .flat_map(|c| match c {
            '"' | '\\' => vec!['\\', c],
            _ => vec![c],
        })
        .collect()
}

fn domain_of(address: &str) -> &str {
    address
        .rsplit_once('@')
        .map_or("localhost", |(_, domain)| domain)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc2822("Tue, 1 Jul 2025 10:00:00 +0000").unwrap()
    }

    fn message() -> OutgoingMessage {
        OutgoingMessage::new("s@example.com", "Greetings", "line one\nline two")
            .to("a@example.com")
            .to("b@example.com")
    }

    #[test]
    fn plain_message() {
        let text = render(&message(), &date(), "42");
        assert_eq!(
            text,
            "From: s@example.com\r\n\
             To: a@example.com, b@example.com\r\n\
             Subject: Greetings\r\n\
             Date: Tue, 1 Jul 2025 10:00:00 +0000\r\n\
             Message-ID: <42@example.com>\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             Content-Transfer-Encoding: 8bit\r\n\
             \r\n\
             line one\r\n\
             line two\r\n"
        );
    }

    #[test]
    fn attachments_make_multipart() {
        let message = message()
            .attach(Attachment::new("report.pdf", vec![0u8, 1, 2, 3]))
            .attach(Attachment::new("notes.txt", b"hi".to_vec()));
        let text = render(&message, &date(), "7");

        assert!(text.contains("Content-Type: multipart/mixed; boundary=\"=_vmtp_7\"\r\n"));
        assert!(text.contains("filename=\"report.pdf\"\r\n"));
        assert!(text.contains("Content-Transfer-Encoding: base64\r\n\r\nAAECAw==\r\n"));
        assert!(text.contains("filename=\"notes.txt\"\r\n"));
        assert!(text.contains("\r\n\r\naGk=\r\n"));
        assert!(text.ends_with("--=_vmtp_7--\r\n"));
        assert_eq!(text.matches("--=_vmtp_7\r\n").count(), 3);
    }

    #[test]
    fn base64_lines_are_wrapped() {
        let message = message().attach(Attachment::new("big.bin", vec![0xAB; 200]));
        let text = render(&message, &date(), "1");

        let encoded: Vec<&str> = text
            .split("\r\n")
            .skip_while(|l| !l.starts_with("Content-Transfer-Encoding: base64"))
            .skip(2)
            .take_while(|l| !l.starts_with("--"))
            .collect();
        assert!(encoded.len() > 1);
        assert!(encoded.iter().all(|l| l.len() <= MAX_LINE_LENGTH));
        assert_eq!(
            STANDARD.decode(encoded.concat()).unwrap(),
            vec![0xAB; 200]
        );
    }

    #[test]
    fn header_values_cannot_add_headers() {
        let mut message = message();
        message.subject = "x\r\nBcc: victim@example.com".into();
        message.to.push("c@example.com\nX-Evil: 1".into());
        let text = render(&message, &date(), "9");

        assert!(text.contains("Subject: xBcc: victim@example.com\r\n"));
        assert!(text.contains("c@example.comX-Evil: 1\r\n"));
        assert!(!text.lines().any(|l| l.starts_with("Bcc:") || l.starts_with("X-Evil:")));
    }

    #[test]
    fn filenames_are_quoted() {
        assert_eq!(quote("a\"b\\c\r\n.txt"), "a\\\"b\\\\c.txt");
    }

    #[test]
    fn message_ids_are_unique() {
        let a = compose(&message());
        let b = compose(&message());
        let id = |t: &str| {
            t.lines()
                .find(|l| l.starts_with("Message-ID:"))
                .unwrap()
                .to_string()
        };
        assert_ne!(id(&a), id(&b));
    }
}
