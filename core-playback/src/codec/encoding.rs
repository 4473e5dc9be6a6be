//! Base64 transport encoding for synthesized audio payloads.

use crate::error::{PlaybackError, Result};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use bytes::Bytes;

/// Standard alphabet, padding optional on decode, always emitted on encode.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a base64 payload into raw bytes.
///
/// ASCII whitespace (line wraps from transport or JSON pretty-printing) is
/// stripped first. Any other character outside the standard alphabet yields
/// [`PlaybackError::Decode`].
pub fn decode_base64(text: &str) -> Result<Bytes> {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    PAYLOAD_ENGINE
        .decode(compact.as_bytes())
        .map(Bytes::from)
        .map_err(|e| PlaybackError::Decode(e.to_string()))
}

/// Encode bytes with the standard padded alphabet.
pub fn encode_base64(data: &[u8]) -> String {
    PAYLOAD_ENGINE.encode(data)
}
