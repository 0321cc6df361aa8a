//! Length-prefixed framing for invocation requests.
//!
//! Used when a request queue is bridged over a byte stream instead of an
//! in-process channel. Each frame is a 4-byte big-endian length followed by
//! the JSON form of one [`InvocationRequest`]:
//!
//! ```text
//! +----------------+----------------------------------------+
//! |  4 bytes       |  N bytes                               |
//! |  (length BE)   |  {"methodName": "...", "args": [...]}  |
//! +----------------+----------------------------------------+
//! ```

use bytes::{Buf, BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

use crate::request::InvocationRequest;

/// Maximum frame payload (16 MB)
const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

const LENGTH_PREFIX_SIZE: usize = 4;

/// Codec for length-prefixed invocation requests
#[derive(Debug, Default)]
pub struct InvocationCodec {
    pending_length: Option<usize>,
}

impl InvocationCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for InvocationCodec {
    type Item = InvocationRequest;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let length = match self.pending_length {
            Some(length) => length,
            None => {
                if src.len() < LENGTH_PREFIX_SIZE {
                    return Ok(None);
                }

                let length = src.get_u32() as usize;
                if length > MAX_FRAME_SIZE {
                    return Err(CodecError::FrameTooLarge(length));
                }

                self.pending_length = Some(length);
                length
            }
        };

        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        let payload = src.split_to(length);
        self.pending_length = None;

        let text = std::str::from_utf8(&payload)?;
        Ok(Some(serde_json::from_str(text)?))
    }
}

impl Encoder<InvocationRequest> for InvocationCodec {
    type Error = CodecError;

    // Frame size is checked against MAX_FRAME_SIZE (fits in u32)
    #[allow(clippy::cast_possible_truncation)]
    fn encode(&mut self, item: InvocationRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_vec(&item)?;

        if json.len() > MAX_FRAME_SIZE {
            return Err(CodecError::FrameTooLarge(json.len()));
        }

        dst.reserve(LENGTH_PREFIX_SIZE + json.len());
        dst.put_u32(json.len() as u32);
        dst.put_slice(&json);

        Ok(())
    }
}

/// Errors that can occur during codec operations
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Frame too large: {0} bytes (max: {MAX_FRAME_SIZE})")]
    FrameTooLarge(usize),
}
