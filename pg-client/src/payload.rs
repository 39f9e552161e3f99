//! Length-prefixed padding of plaintext payloads.
//!
//! Before encryption, a plaintext object is serialized to JSON and framed as follows:
//!
//! ```text
//! LEN (2, big-endian) || JSON (LEN) || ZERO PADDING (*)
//! ```
//!
//! The total length is the smallest multiple of 512 that is strictly greater than `LEN + 1`,
//! such that ciphertext sizes only reveal a coarse bucket of the payload length.

use crate::consts::*;
use crate::error::Error;
use serde::{de::DeserializeOwned, Serialize};

/// Computes the padded length for a serialized payload of `len` bytes.
pub const fn padded_len(len: usize) -> usize {
    (((len + 1) >> PAYLOAD_BLOCK_BITS) + 1) << PAYLOAD_BLOCK_BITS
}

/// Frames already serialized bytes into a padded buffer.
pub fn pad(serialized: &[u8]) -> Result<Vec<u8>, Error> {
    let len = serialized.len();
    if len >= MAX_PAYLOAD_LEN {
        return Err(Error::PayloadTooLarge { len });
    }

    let mut out = vec![0u8; padded_len(len)];
    out[..PAYLOAD_LEN_SIZE].copy_from_slice(&u16::try_from(len)?.to_be_bytes());
    out[PAYLOAD_LEN_SIZE..PAYLOAD_LEN_SIZE + len].copy_from_slice(serialized);

    Ok(out)
}

/// Returns the serialized bytes framed in a padded buffer.
pub fn unpad(buf: &[u8]) -> Result<&[u8], Error> {
    if buf.len() < PAYLOAD_LEN_SIZE {
        return Err(Error::MalformedPayload);
    }

    let len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
    buf.get(PAYLOAD_LEN_SIZE..PAYLOAD_LEN_SIZE + len)
        .ok_or(Error::MalformedPayload)
}

/// Serializes and pads a plaintext object.
pub fn encode<T: Serialize + ?Sized>(plain: &T) -> Result<Vec<u8>, Error> {
    let serialized = serde_json::to_vec(plain)?;
    pad(&serialized)
}

/// Strips the padding and deserializes a plaintext object.
pub fn decode<T: DeserializeOwned>(buf: &[u8]) -> Result<T, Error> {
    let serialized = unpad(buf)?;
    let text = core::str::from_utf8(serialized).map_err(|_| Error::MalformedPayload)?;
    serde_json::from_str(text).map_err(|_| Error::MalformedPayload)
}
