//! Minimal RIFF/WAVE container synthesis.
//!
//! Generic platform decoders only accept self-describing containers, so raw
//! PCM is wrapped in a canonical 44-byte header before being handed over.

use bytes::{BufMut, Bytes, BytesMut};

/// Size of the canonical PCM WAVE header.
pub const WAV_HEADER_LEN: usize = 44;

const WAVE_FORMAT_PCM: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// Wrap raw little-endian linear PCM in a RIFF/WAVE container.
///
/// Pure and deterministic. Payloads larger than `u32::MAX` bytes get saturated
/// size fields.
pub fn wrap_pcm_as_container(
    pcm: &[u8],
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
) -> Bytes {
    let data_len = u32::try_from(pcm.len()).unwrap_or(u32::MAX);
    let block_align = channels.saturating_mul(bits_per_sample / 8);
    let byte_rate = sample_rate.saturating_mul(u32::from(block_align));

    let mut out = BytesMut::with_capacity(WAV_HEADER_LEN + pcm.len());

    // RIFF chunk descriptor
    out.put_slice(b"RIFF");
    out.put_u32_le(data_len.saturating_add(WAV_HEADER_LEN as u32 - 8));
    out.put_slice(b"WAVE");

    // fmt sub-chunk
    out.put_slice(b"fmt ");
    out.put_u32_le(FMT_CHUNK_LEN);
    out.put_u16_le(WAVE_FORMAT_PCM);
    out.put_u16_le(channels);
    out.put_u32_le(sample_rate);
    out.put_u32_le(byte_rate);
    out.put_u16_le(block_align);
    out.put_u16_le(bits_per_sample);

    // data sub-chunk
    out.put_slice(b"data");
    out.put_u32_le(data_len);
    out.put_slice(pcm);

    out.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Buf;

    #[test]
    fn header_describes_mono_pcm16() {
        let pcm = [0x01u8, 0x00, 0xff, 0x7f];
        let wav = wrap_pcm_as_container(&pcm, 24_000, 1, 16);

        assert_eq!(wav.len(), WAV_HEADER_LEN + pcm.len());
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..16], b"WAVEfmt ");
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(&wav[WAV_HEADER_LEN..], &pcm);

        let mut header = &wav[4..8];
        assert_eq!(header.get_u32_le(), 36 + 4);

        let mut fmt = &wav[20..36];
        assert_eq!(fmt.get_u16_le(), 1); // PCM
        assert_eq!(fmt.get_u16_le(), 1); // channels
        assert_eq!(fmt.get_u32_le(), 24_000); // sample rate
        assert_eq!(fmt.get_u32_le(), 48_000); // byte rate
        assert_eq!(fmt.get_u16_le(), 2); // block align
        assert_eq!(fmt.get_u16_le(), 16); // bits per sample

        let mut data_len = &wav[40..44];
        assert_eq!(data_len.get_u32_le(), 4);
    }

    #[test]
    fn stereo_block_align_and_byte_rate() {
        let wav = wrap_pcm_as_container(&[], 44_100, 2, 16);
        let mut fmt = &wav[28..34];
        assert_eq!(fmt.get_u32_le(), 176_400);
        assert_eq!(fmt.get_u16_le(), 4);
        assert_eq!(wav.len(), WAV_HEADER_LEN);
    }

    #[test]
    fn wrapping_is_deterministic() {
        let pcm = vec![7u8; 10];
        assert_eq!(
            wrap_pcm_as_container(&pcm, 16_000, 1, 16),
            wrap_pcm_as_container(&pcm, 16_000, 1, 16)
        );
    }
}
