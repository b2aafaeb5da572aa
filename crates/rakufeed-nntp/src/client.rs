//! Minimal NNTP client: greeting, GROUP, HEAD, QUIT (RFC 3977)

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::event::Header;

/// Longest response line accepted, terminator included
pub const MAX_LINE: usize = 8 * 1024;

/// Error talking to the news server
#[derive(Debug)]
pub enum NntpError {
    Io(std::io::Error),
    /// Server closed the connection mid-response
    Closed,
    /// Response line longer than [`MAX_LINE`]
    LineTooLong,
    /// Unexpected status line
    Protocol { command: String, line: String },
}

impl std::fmt::Display for NntpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Closed => f.write_str("connection closed by server"),
            Self::LineTooLong => write!(f, "response line exceeds {MAX_LINE} bytes"),
            Self::Protocol { command, line } => {
                write!(f, "unexpected response to {command}: {line}")
            }
        }
    }
}

impl std::error::Error for NntpError {}

impl From<std::io::Error> for NntpError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Article range reported by GROUP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupInfo {
    pub count: u64,
    pub first: u64,
    pub last: u64,
}

/// Connected session over any byte stream
pub struct Client<S> {
    stream: BufReader<S>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S> {
    /// Read the server greeting (200 posting allowed / 201 read-only).
    pub async fn handshake(stream: S) -> Result<Self, NntpError> {
        let mut client = Self {
            stream: BufReader::new(stream),
        };
        let line = client.read_line().await?;
        match status_code(&line) {
            Some(200 | 201) => Ok(client),
            _ => Err(NntpError::Protocol {
                command: "greeting".to_string(),
                line,
            }),
        }
    }

    /// Select `group`; the reply carries the current article range.
    pub async fn group(&mut self, group: &str) -> Result<GroupInfo, NntpError> {
        let command = format!("GROUP {group}");
        let line = self.command(&command).await?;
        if status_code(&line) != Some(211) {
            return Err(NntpError::Protocol { command, line });
        }
        parse_group_line(&line).ok_or(NntpError::Protocol { command, line })
    }

    /// Fetch the header block of article `id`, `None` if it no longer exists.
    pub async fn head(&mut self, id: u64) -> Result<Option<Header>, NntpError> {
        let command = format!("HEAD {id}");
        let line = self.command(&command).await?;
        match status_code(&line) {
            Some(221) => {
                let lines = self.read_block().await?;
                Ok(Some(Header::parse(&lines)))
            }
            Some(423 | 430) => Ok(None),
            _ => Err(NntpError::Protocol { command, line }),
        }
    }

    /// Say goodbye; errors are irrelevant at this point.
    pub async fn quit(mut self) {
        if let Err(e) = self.command("QUIT").await {
            log::debug!("QUIT failed: {e}");
        }
    }

    async fn command(&mut self, command: &str) -> Result<String, NntpError> {
        let writer = self.stream.get_mut();
        writer.write_all(command.as_bytes()).await?;
        writer.write_all(b"\r\n").await?;
        writer.flush().await?;
        self.read_line().await
    }

    async fn read_line(&mut self) -> Result<String, NntpError> {
        let mut buf = Vec::new();
        let n = (&mut self.stream)
            .take(MAX_LINE as u64)
            .read_until(b'\n', &mut buf)
            .await?;
        if n == 0 {
            return Err(NntpError::Closed);
        }
        if buf.last() != Some(&b'\n') && n == MAX_LINE {
            return Err(NntpError::LineTooLong);
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        // headers are not guaranteed to be UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Multi-line block terminated by a lone ".", with dot-stuffing removed
    async fn read_block(&mut self) -> Result<Vec<String>, NntpError> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await?;
            if line == "." {
                return Ok(lines);
            }
            match line.strip_prefix('.') {
                Some(rest) => lines.push(rest.to_string()),
                None => lines.push(line),
            }
        }
    }
}

fn status_code(line: &str) -> Option<u16> {
    line.get(..3)?.parse().ok()
}

/// `211 count first last group`
fn parse_group_line(line: &str) -> Option<GroupInfo> {
    let mut parts = line.split_whitespace().skip(1);
    let count = parts.next()?.parse().ok()?;
    let first = parts.next()?.parse().ok()?;
    let last = parts.next()?.parse().ok()?;
    Some(GroupInfo { count, first, last })
}
