//! SMTP reply parsing.
//!
//! Every line of a (possibly multi-line) reply becomes its own
//! [`SmtpResponse`]; the separator is stripped from the value.

use std::fmt;

use crate::error::{Result, SmtpError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    /// 220
    ServiceReady,
    /// 250
    Ok,
    /// 421
    TransientError,
    Other(u16),
}

impl From<u16> for ResponseCode {
    fn from(value: u16) -> Self {
        match value {
            220 => Self::ServiceReady,
            250 => Self::Ok,
            421 => Self::TransientError,
            other => Self::Other(other),
        }
    }
}

impl From<ResponseCode> for u16 {
    fn from(code: ResponseCode) -> Self {
        match code {
            ResponseCode::ServiceReady => 220,
            ResponseCode::Ok => 250,
            ResponseCode::TransientError => 421,
            ResponseCode::Other(other) => other,
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u16::from(*self))
    }
}

/// One line of an SMTP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpResponse {
    pub code: ResponseCode,
    pub value: String,
}

impl SmtpResponse {
    #[must_use]
    pub fn new(code: impl Into<ResponseCode>, value: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            value: value.into(),
        }
    }

    /// Parses a single line (without its line terminator). The boolean is
    /// true when this is the final line of the reply.
    ///
    /// # Errors
    ///
    /// [`SmtpError::Parse`] if the line is shorter than four characters, the
    /// status code is not three digits, or the fourth character is neither
    /// `-` nor a space.
    pub fn parse_line(line: &str) -> Result<(Self, bool)> {
        let bytes = line.as_bytes();
        if bytes.len() < 4 {
            return Err(SmtpError::Parse(format!("Response line too short: '{line}'")));
        }

        if !bytes[..3].iter().all(u8::is_ascii_digit) {
            return Err(SmtpError::Parse(format!(
                "Invalid status code: '{}'",
                String::from_utf8_lossy(&bytes[..3])
            )));
        }

        let is_last = match bytes[3] {
            b' ' => true,
            b'-' => false,
            other => {
                return Err(SmtpError::Parse(format!(
                    "Invalid separator character: '{}'",
                    char::from(other)
                )));
            }
        };

        // Three ASCII digits followed by an ASCII separator, so byte 4 is a
        // char boundary.
        let code = line[..3]
            .parse::<u16>()
            .map_err(|err| SmtpError::Parse(err.to_string()))?;

        Ok((Self::new(code, &line[4..]), is_last))
    }

    /// Parses a whole reply block, one response per non-empty line.
    ///
    /// # Errors
    ///
    /// The first malformed line fails the whole block.
    pub fn parse(block: &str) -> Result<Vec<Self>> {
        block
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| Self::parse_line(line).map(|(response, _)| response))
            .collect()
    }

    /// True when this line advertises the given extension keyword.
    #[must_use]
    pub fn advertises(&self, keyword: &str) -> bool {
        self.code == ResponseCode::Ok && self.value.trim_end().eq_ignore_ascii_case(keyword)
    }
}

impl fmt::Display for SmtpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.value)
    }
}
