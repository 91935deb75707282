//! Summaries of received messages for logging.
//!
//! Only enough MIME is understood to tell a text message from a multipart
//! one and to name the attached files.

/// What a received message contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contents {
    /// A single-part message and its body text.
    Text(String),
    /// A multipart message and its attachments.
    Attachments(Vec<AttachmentInfo>),
}

/// One attached file of a multipart message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentInfo {
    /// File name from `Content-Disposition` or `Content-Type`.
    pub filename: Option<String>,
    /// Media type of the part.
    pub content_type: String,
}

/// Parsed view of a received message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// The `Subject` header, if present.
    pub subject: Option<String>,
    /// Body text or attachment list.
    pub contents: Contents,
}

/// Summarizes raw message data as received after `DATA`.
#[must_use]
pub fn summarize(data: &[u8]) -> Summary {
    let text = String::from_utf8_lossy(data);
    let (headers, body) = split_headers(&text);

    let subject = header(&headers, "Subject").map(str::to_string);
    let content_type = header(&headers, "Content-Type").unwrap_or("text/plain");

    let contents = match parameter(content_type, "boundary") {
        Some(boundary) if media_type(content_type).starts_with("multipart/") => {
            Contents::Attachments(attachments(body, boundary))
        }
        _ => Contents::Text(body.trim_end_matches(['\r', '\n']).to_string()),
    };

    Summary { subject, contents }
}

fn attachments(body: &str, boundary: &str) -> Vec<AttachmentInfo> {
    let delimiter = format!("--{boundary}");
    body.split(delimiter.as_str())
        .skip(1)
        .take_while(|part| !part.starts_with("--"))
        .filter_map(|part| {
            let (headers, _) = split_headers(part.trim_start_matches(['\r', '\n']));
            let content_type = header(&headers, "Content-Type").unwrap_or("text/plain");
            let disposition = header(&headers, "Content-Disposition");

            let is_attachment = disposition
                .is_some_and(|d| media_type(d).eq_ignore_ascii_case("attachment"));
            let filename = disposition
                .and_then(|d| parameter(d, "filename"))
                .or_else(|| parameter(content_type, "name"))
                .map(str::to_string);

            (is_attachment || filename.is_some()).then(|| AttachmentInfo {
                filename,
                content_type: media_type(content_type).to_string(),
            })
        })
        .collect()
}

/// Splits a message or part into unfolded headers and the body.
fn split_headers(text: &str) -> (Vec<(String, String)>, &str) {
    let (head, body) = text
        .split_once("\r\n\r\n")
        .or_else(|| text.split_once("\n\n"))
        .unwrap_or(("", text));

    let mut headers: Vec<(String, String)> = Vec::new();
    for line in head.lines() {
        if line.starts_with([' ', '\t']) {
            if let Some((_, value)) = headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
        } else if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    (headers, body)
}

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn media_type(value: &str) -> &str {
    value.split(';').next().unwrap_or_default().trim()
}

fn parameter<'a>(value: &'a str, name: &str) -> Option<&'a str> {
    value.split(';').skip(1).find_map(|param| {
        let (key, val) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| val.trim().trim_matches('"'))
    })
}
