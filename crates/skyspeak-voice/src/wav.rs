//! Minimal 16-bit PCM WAV encoding for scoring uploads.

use skyspeak_core::AudioClip;

const HEADER_LEN: usize = 44;
const BITS_PER_SAMPLE: u16 = 16;
const CHANNELS: u16 = 1;

/// Encode a mono clip as a RIFF/WAVE byte buffer (PCM, 16-bit little endian).
pub fn encode_pcm16(clip: &AudioClip) -> Vec<u8> {
    let data_len = clip.samples.len() * 2;
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let byte_rate = clip.sample_rate * u32::from(block_align);

    let mut out = Vec::with_capacity(HEADER_LEN + data_len);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&u32_len(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&CHANNELS.to_le_bytes());
    out.extend_from_slice(&clip.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&u32_len(data_len).to_le_bytes());
    for &sample in &clip.samples {
        out.extend_from_slice(&to_i16(sample).to_le_bytes());
    }
    out
}

#[allow(clippy::cast_possible_truncation)]
fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

fn u32_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_describes_mono_pcm16() {
        let clip = AudioClip::new(vec![0.0, 0.5, -0.5, 2.0], 16_000);
        let bytes = encode_pcm16(&clip);

        assert_eq!(bytes.len(), HEADER_LEN + 8);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(u16::from_le_bytes([bytes[22], bytes[23]]), 1);
        assert_eq!(
            u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]),
            16_000
        );
        assert_eq!(
            u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]),
            8
        );
    }

    #[test]
    fn samples_are_clamped() {
        let clip = AudioClip::new(vec![2.0, -2.0], 8_000);
        let bytes = encode_pcm16(&clip);
        assert_eq!(i16::from_le_bytes([bytes[44], bytes[45]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([bytes[46], bytes[47]]), -i16::MAX);
    }
}
