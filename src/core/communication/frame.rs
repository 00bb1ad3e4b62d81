use crate::core::codec::{decode_value, encode_value};
use crate::domain::error::{HuberError, HuberResult};
use std::fmt;

/// Line terminator of both request and response frames
pub const TERMINATOR: &[u8] = b"\r\n";

/// Value field sent when reading a register
pub const READ_PLACEHOLDER: &str = "****";

/// Length of a response frame without its terminator
pub const RESPONSE_LEN: usize = 8;

/// A single register request: `{M<AA><VVVV>\r\n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub address: u8,
    pub value: Option<i32>,
}

impl Command {
    pub fn read(address: u8) -> Self {
        Self {
            address,
            value: None,
        }
    }

    pub fn write(address: u8, value: i32) -> Self {
        Self {
            address,
            value: Some(value),
        }
    }

    pub fn is_write(&self) -> bool {
        self.value.is_some()
    }

    /// Wire bytes of the request, terminator included
    pub fn encode(&self) -> Vec<u8> {
        let value = match self.value {
            Some(n) => encode_value(n),
            None => READ_PLACEHOLDER.to_string(),
        };
        format!("{{M{:02X}{}\r\n", self.address, value).into_bytes()
    }

    /// Parse a request line as the device sees it
    pub fn parse_request(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.len() != RESPONSE_LEN || !line.is_ascii() || !line.starts_with("{M") {
            return None;
        }

        let address = u8::from_str_radix(&line[2..4], 16).ok()?;
        let value = match &line[4..] {
            READ_PLACEHOLDER => None,
            hex => {
                let raw = u16::from_str_radix(hex, 16).ok()?;
                Some(i32::from(raw as i16))
            }
        };
        Some(Self { address, value })
    }

    /// Response line a device sends for `value`, terminator included
    pub fn response(address: u8, value: i32) -> String {
        format!("{{S{:02X}{}\r\n", address, encode_value(value))
    }

    /// Prefix a valid response must start with
    pub fn response_prefix(&self) -> String {
        format!("{{S{:02X}", self.address)
    }

    /// Validate a response line against this request.
    ///
    /// Anything that is not an 8-character `{S<AA><VVVV>` echo of the same
    /// address is treated as no response. A `7FFF` value is an error.
    pub fn parse_response(&self, line: &str) -> HuberResult<Option<i32>> {
        let line = line.trim();
        if line.len() != RESPONSE_LEN
            || !line.is_ascii()
            || !line.starts_with(&self.response_prefix())
        {
            return Ok(None);
        }

        match decode_value(&line[4..]) {
            Ok(value) => Ok(Some(value)),
            Err(HuberError::Protocol(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.encode();
        let text = String::from_utf8_lossy(&frame);
        write!(f, "{}", text.trim_end())
    }
}
