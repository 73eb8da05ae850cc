//! The wire protocol: a length-prefixed frame codec, a command parser that
//! classifies a frame's payload into one of five verbs, and the response
//! strings each verb's handler may send back.

pub mod command;
pub mod frame;
pub mod response;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

pub use command::Command;
pub use frame::{raw_word, Codec};
pub use response::Response;

/// Wraps a stream in the length-prefixed frame codec, rejecting any frame
/// whose declared length exceeds `max_payload`.
pub fn framed<T: AsyncRead + AsyncWrite>(
    stream: T,
    max_payload: usize,
) -> Framed<T, Codec> {
    Framed::new(stream, Codec::with_max_payload(max_payload))
}
