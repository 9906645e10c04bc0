//! Just enough of the TLS wire format to offer an exact ClientHello and read
//! the server's first flight.

pub mod hello;
pub mod record;
pub mod server;

use crate::error::ProbeError;

pub const CONTENT_CHANGE_CIPHER_SPEC: u8 = 20;
pub const CONTENT_ALERT: u8 = 21;
pub const CONTENT_HANDSHAKE: u8 = 22;
pub const CONTENT_APPLICATION_DATA: u8 = 23;

pub const HANDSHAKE_CLIENT_HELLO: u8 = 1;
pub const HANDSHAKE_SERVER_HELLO: u8 = 2;
pub const HANDSHAKE_CERTIFICATE: u8 = 11;
pub const HANDSHAKE_SERVER_KEY_EXCHANGE: u8 = 12;
pub const HANDSHAKE_SERVER_HELLO_DONE: u8 = 14;

pub const EXT_SERVER_NAME: u16 = 0x0000;
pub const EXT_SUPPORTED_GROUPS: u16 = 0x000A;
pub const EXT_EC_POINT_FORMATS: u16 = 0x000B;
pub const EXT_SIGNATURE_ALGORITHMS: u16 = 0x000D;
pub const EXT_SUPPORTED_VERSIONS: u16 = 0x002B;
pub const EXT_KEY_SHARE: u16 = 0x0033;

/// Bounds-checked cursor over a received message.
pub struct Reader<'a> {
    buf: &'a [u8],
    what: &'static str,
}

impl<'a> Reader<'a> {
    pub const fn new(buf: &'a [u8], what: &'static str) -> Self {
        Self { buf, what }
    }

    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn take(&mut self, len: usize) -> Result<&'a [u8], ProbeError> {
        if self.buf.len() < len {
            return Err(ProbeError::Decode(format!(
                "{} truncated: wanted {len} bytes, {} left",
                self.what,
                self.buf.len()
            )));
        }

        let (head, rest) = self.buf.split_at(len);
        self.buf = rest;
        Ok(head)
    }

    pub fn u8(&mut self) -> Result<u8, ProbeError> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, ProbeError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn u24(&mut self) -> Result<usize, ProbeError> {
        let bytes = self.take(3)?;
        Ok(usize::from(bytes[0]) << 16 | usize::from(bytes[1]) << 8 | usize::from(bytes[2]))
    }

    pub fn vec8(&mut self) -> Result<&'a [u8], ProbeError> {
        let len = self.u8()?;
        self.take(usize::from(len))
    }

    pub fn vec16(&mut self) -> Result<&'a [u8], ProbeError> {
        let len = self.u16()?;
        self.take(usize::from(len))
    }

    pub fn vec24(&mut self) -> Result<&'a [u8], ProbeError> {
        let len = self.u24()?;
        self.take(len)
    }
}

/// Appends a vector with a big-endian length prefix of `width` bytes,
/// filled in once `body` has written its contents.
pub fn put_vec(out: &mut Vec<u8>, width: usize, body: impl FnOnce(&mut Vec<u8>)) {
    let start = out.len();
    out.resize(start + width, 0);
    body(out);

    let len = out.len() - start - width;
    let len_bytes = len.to_be_bytes();
    out[start..start + width].copy_from_slice(&len_bytes[len_bytes.len() - width..]);
}

pub fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

pub fn put_extension(out: &mut Vec<u8>, kind: u16, body: impl FnOnce(&mut Vec<u8>)) {
    put_u16(out, kind);
    put_vec(out, 2, body);
}
