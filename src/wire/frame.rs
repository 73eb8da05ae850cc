use std::io;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec;

/// Width of the length prefix on the wire: a signed machine word, native
/// endianness. Both ends of a connection must agree on this width, which is
/// why the protocol is not portable across architectures of differing word
/// size — an accepted non-goal.
pub const LEN_PREFIX_BYTES: usize = std::mem::size_of::<isize>();

/// Encodes `n` as a bare machine word, with none of the usual trailing
/// payload. Used for POLL's leading count, which the wire protocol sends as
/// a standalone word rather than a length-prefixed frame (see
/// [`super::response::Response`]'s note on `PollEntry`).
pub fn raw_word(n: isize) -> [u8; LEN_PREFIX_BYTES] {
    n.to_ne_bytes()
}

/// A decoder/encoder for the length-prefixed frame protocol: every message on
/// the wire is `<len: isize><payload: bytes[len]>`. The codec never
/// interprets the payload; callers are responsible for parsing it.
#[derive(Debug)]
pub struct Decoder {
    state: DecoderState,
    max_payload: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            state: DecoderState::default(),
            max_payload: usize::MAX,
        }
    }
}

#[derive(Debug, Default)]
enum DecoderState {
    #[default]
    Length,
    Payload {
        len: usize,
    },
}

impl codec::Decoder for Decoder {
    type Item = Bytes;
    type Error = Error;

    fn decode(
        &mut self,
        src: &mut BytesMut,
    ) -> Result<Option<Self::Item>, Self::Error> {
        match self.state {
            DecoderState::Length => {
                if src.len() < LEN_PREFIX_BYTES {
                    src.reserve(LEN_PREFIX_BYTES - src.len());
                    return Ok(None);
                }

                let mut buf = [0u8; LEN_PREFIX_BYTES];
                buf.copy_from_slice(&src[..LEN_PREFIX_BYTES]);
                let len = isize::from_ne_bytes(buf);

                if len < 0 {
                    return Err(Error::NegativeLength(len));
                }

                let len = len as usize;
                if len > self.max_payload {
                    return Err(Error::FrameTooLarge(len));
                }

                src.advance(LEN_PREFIX_BYTES);
                src.reserve(len);
                self.state = DecoderState::Payload { len };
                self.decode(src)
            },
            DecoderState::Payload { len } => {
                if src.len() < len {
                    return Ok(None);
                }

                let payload = src.split_to(len).freeze();
                self.state = DecoderState::Length;
                Ok(Some(payload))
            },
        }
    }
}

/// Encodes a payload as `<len: isize><payload>`.
#[derive(Debug, Default)]
pub struct Encoder;

impl codec::Encoder<Bytes> for Encoder {
    type Error = Error;

    fn encode(
        &mut self,
        item: Bytes,
        dst: &mut BytesMut,
    ) -> Result<(), Self::Error> {
        let len: isize = item
            .len()
            .try_into()
            .map_err(|_| Error::PayloadTooLarge(item.len()))?;

        dst.reserve(LEN_PREFIX_BYTES + item.len());
        dst.put_slice(&len.to_ne_bytes());
        dst.put_slice(&item);

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Codec {
    d: Decoder,
    e: Encoder,
}

impl Codec {
    /// A codec that rejects any frame whose declared length exceeds
    /// `max_payload` before attempting to buffer its bytes (SPEC_FULL §3's
    /// `max_job_size`, applied before the payload ever reaches the command
    /// parser).
    pub fn with_max_payload(max_payload: usize) -> Self {
        Self {
            d: Decoder {
                state: DecoderState::default(),
                max_payload,
            },
            e: Encoder,
        }
    }
}

impl codec::Decoder for Codec {
    type Item = Bytes;
    type Error = Error;

    fn decode(
        &mut self,
        src: &mut BytesMut,
    ) -> Result<Option<Self::Item>, Self::Error> {
        self.d.decode(src)
    }
}

impl codec::Encoder<Bytes> for Codec {
    type Error = Error;

    fn encode(
        &mut self,
        item: Bytes,
        dst: &mut BytesMut,
    ) -> Result<(), Self::Error> {
        self.e.encode(item, dst)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error on framed connection")]
    Io(#[from] io::Error),
    #[error("frame declared a negative length: {0}")]
    NegativeLength(isize),
    #[error("payload of {0} bytes does not fit in the length prefix")]
    PayloadTooLarge(usize),
    #[error("frame of {0} bytes exceeds the configured maximum")]
    FrameTooLarge(usize),
}
