//! CRLF-delimited line transport shared by client and server.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::Reply;

/// Longest line accepted by default, terminator excluded.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Buffered reader over a transport, with writes going straight through.
#[derive(Debug)]
pub struct SmtpStream<S = TcpStream> {
    reader: BufReader<S>,
    max_line_length: usize,
}

impl<S> SmtpStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps `stream`.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::new(stream),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    /// Sets the longest line [`Self::read_raw_line`] will buffer.
    #[must_use]
    pub const fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    /// Next line as bytes, line terminator removed. Used for message data,
    /// which need not be UTF-8.
    ///
    /// # Errors
    ///
    /// [`Error::ConnectionClosed`] when the peer has gone away, and
    /// [`Error::LineTooLong`] when no line break arrives within the limit.
    pub async fn read_raw_line(&mut self) -> Result<Vec<u8>> {
        // Room for the CRLF on a line of exactly the maximum length.
        let limit = self.max_line_length.saturating_add(2);
        let mut line = Vec::new();
        let n = (&mut self.reader)
            .take(limit as u64)
            .read_until(b'\n', &mut line)
            .await?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        if n == limit && !line.ends_with(b"\n") {
            return Err(Error::LineTooLong {
                limit: self.max_line_length,
            });
        }
        let keep = line
            .iter()
            .rposition(|b| !matches!(b, b'\r' | b'\n'))
            .map_or(0, |i| i + 1);
        line.truncate(keep);
        Ok(line)
    }

    /// Next line as text. Invalid UTF-8 becomes U+FFFD.
    ///
    /// # Errors
    ///
    /// Same as [`Self::read_raw_line`].
    pub async fn read_line(&mut self) -> Result<String> {
        let line = self.read_raw_line().await?;
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Writes and flushes `data`.
    ///
    /// # Errors
    ///
    /// Any I/O error from the transport.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Collects lines up to the last line of a reply and parses them.
    /// Blank lines in between are skipped.
    ///
    /// # Errors
    ///
    /// Transport errors, or [`Error::Protocol`] for a malformed reply.
    pub async fn read_reply(&mut self) -> Result<Reply> {
        let mut lines: Vec<String> = Vec::new();
        while !lines.last().is_some_and(|line| is_last_reply_line(line)) {
            let line = self.read_line().await?;
            if !line.is_empty() {
                lines.push(line);
            }
        }
        parse_reply(&lines)
    }

    /// Sends `reply` in wire form.
    ///
    /// # Errors
    ///
    /// Any I/O error from the transport.
    pub async fn write_reply(&mut self, reply: &Reply) -> Result<()> {
        self.write_all(&reply.serialize()).await
    }

    /// Gives the transport back; buffered unread input is lost.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

/// Opens a plain TCP connection to `host:port`.
///
/// # Errors
///
/// Resolution or connect failure, as [`Error::Io`].
pub async fn connect(host: &str, port: u16) -> Result<SmtpStream> {
    let tcp = TcpStream::connect((host, port)).await?;
    Ok(SmtpStream::new(tcp))
}
