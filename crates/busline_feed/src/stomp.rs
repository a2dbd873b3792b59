//! Minimal STOMP 1.2 framing, enough for a read-only topic subscription.
//!
//! A frame is `COMMAND\nheader:value\n...\n\nbody\0`. Lines may end with
//! `\r\n`, and a text message made only of end-of-lines is a heart-beat.

use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StompError {
    #[error("Empty frame")]
    Empty,

    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    #[error("Malformed header line '{0}'")]
    MalformedHeader(String),

    #[error("Invalid escape sequence in '{0}'")]
    InvalidEscape(String),

    #[error("Missing end of headers")]
    MissingHeaderTerminator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StompCommand {
    Connect,
    Connected,
    Subscribe,
    Unsubscribe,
    Message,
    Receipt,
    Error,
    Disconnect,
}

impl StompCommand {
    fn parse(raw: &str) -> Result<Self, StompError> {
        match raw {
            "CONNECT" | "STOMP" => Ok(StompCommand::Connect),
            "CONNECTED" => Ok(StompCommand::Connected),
            "SUBSCRIBE" => Ok(StompCommand::Subscribe),
            "UNSUBSCRIBE" => Ok(StompCommand::Unsubscribe),
            "MESSAGE" => Ok(StompCommand::Message),
            "RECEIPT" => Ok(StompCommand::Receipt),
            "ERROR" => Ok(StompCommand::Error),
            "DISCONNECT" => Ok(StompCommand::Disconnect),
            other => Err(StompError::UnknownCommand(other.to_string())),
        }
    }

    /// CONNECT and CONNECTED headers are never escaped.
    fn escapes_headers(&self) -> bool {
        !matches!(self, StompCommand::Connect | StompCommand::Connected)
    }
}

impl Display for StompCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                StompCommand::Connect => "CONNECT",
                StompCommand::Connected => "CONNECTED",
                StompCommand::Subscribe => "SUBSCRIBE",
                StompCommand::Unsubscribe => "UNSUBSCRIBE",
                StompCommand::Message => "MESSAGE",
                StompCommand::Receipt => "RECEIPT",
                StompCommand::Error => "ERROR",
                StompCommand::Disconnect => "DISCONNECT",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    pub command: StompCommand,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl StompFrame {
    pub fn new(command: StompCommand) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn connect(host: &str) -> Self {
        StompFrame::new(StompCommand::Connect)
            .header("accept-version", "1.2,1.1")
            .header("host", host)
            .header("heart-beat", "0,10000")
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        StompFrame::new(StompCommand::Subscribe)
            .header("id", id)
            .header("destination", destination)
            .header("ack", "auto")
    }

    pub fn disconnect() -> Self {
        StompFrame::new(StompCommand::Disconnect)
    }

    /// First value wins when a header is repeated.
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(64 + self.body.len());

        out.push_str(&self.command.to_string());
        out.push('\n');

        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }

        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Returns `Ok(None)` for heart-beats.
    pub fn decode(raw: &str) -> Result<Option<StompFrame>, StompError> {
        let raw = raw.trim_start_matches(['\r', '\n']);
        if raw.is_empty() {
            return Ok(None);
        }

        let (head, body) = split_head(raw)?;
        let mut lines = head.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));

        let command_line = lines.next().ok_or(StompError::Empty)?;
        let command = StompCommand::parse(command_line)?;
        let unescape = command.escapes_headers();

        let mut headers = Vec::new();
        for line in lines.filter(|line| !line.is_empty()) {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| StompError::MalformedHeader(line.to_string()))?;

            if unescape {
                headers.push((unescape_header(name)?, unescape_header(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let body = match body.find('\0') {
            Some(end) => &body[..end],
            None => body,
        };

        Ok(Some(StompFrame {
            command,
            headers,
            body: body.to_string(),
        }))
    }
}

fn split_head(raw: &str) -> Result<(&str, &str), StompError> {
    let lf = raw.find("\n\n").map(|index| (index, 2));
    let crlf = raw.find("\r\n\r\n").map(|index| (index, 4));

    if let Some((index, width)) = lf.into_iter().chain(crlf).min_by_key(|(index, _)| *index) {
        return Ok((&raw[..index], &raw[index + width..]));
    }

    // frames without headers or body, e.g. "DISCONNECT\n\0"
    let trimmed = raw.trim_end_matches(['\0', '\n', '\r']);
    if !trimmed.contains('\n') {
        return Ok((trimmed, ""));
    }

    Err(StompError::MissingHeaderTerminator)
}

fn escape_header(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            c => out.push(c),
        }
    }
    out
}

fn unescape_header(value: &str) -> Result<String, StompError> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            _ => return Err(StompError::InvalidEscape(value.to_string())),
        }
    }

    Ok(out)
}
