//! Frame codec for plugin sessions
//!
//! Each message on a session channel is a single frame:
//!
//! ```text
//! [10 bytes] payload length, ASCII decimal, zero padded
//! [N bytes]  UTF-8 JSON payload
//! ```
//!
//! Requests and responses use the same framing.

use bytes::{BufMut, Bytes, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Width of the length header
pub const HEADER_LEN: usize = 10;

/// Largest payload the header can describe
const MAX_HEADER_VALUE: u64 = 9_999_999_999;

/// Length-prefixed frame codec
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_bytes: usize,
    /// Payload length of the frame being assembled
    pending: Option<usize>,
}

impl FrameCodec {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            max_frame_bytes,
            pending: None,
        }
    }

    fn parse_header(&self, header: &[u8]) -> io::Result<usize> {
        if !header.iter().all(u8::is_ascii_digit) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame header {:?} is not decimal", String::from_utf8_lossy(header)),
            ));
        }
        let len = header
            .iter()
            .fold(0u64, |acc, d| acc * 10 + u64::from(d - b'0'));
        if len > self.max_frame_bytes as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame of {} bytes exceeds limit of {}", len, self.max_frame_bytes),
            ));
        }
        // bounded by max_frame_bytes above
        Ok(len as usize)
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<Bytes>> {
        let len = match self.pending {
            Some(len) => len,
            None => {
                if src.len() < HEADER_LEN {
                    return Ok(None);
                }
                let len = self.parse_header(&src[..HEADER_LEN])?;
                let _ = src.split_to(HEADER_LEN);
                self.pending = Some(len);
                len
            }
        };

        if src.len() < len {
            src.reserve(len - src.len());
            return Ok(None);
        }

        self.pending = None;
        Ok(Some(src.split_to(len).freeze()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> io::Result<Option<Bytes>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() && self.pending.is_none() => Ok(None),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "channel closed in the middle of a frame",
            )),
        }
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = io::Error;

    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> io::Result<()> {
        if payload.len() as u64 > MAX_HEADER_VALUE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("payload of {} bytes cannot be framed", payload.len()),
            ));
        }
        dst.reserve(HEADER_LEN + payload.len());
        dst.put_slice(format!("{:010}", payload.len()).as_bytes());
        dst.put_slice(&payload);
        Ok(())
    }
}
