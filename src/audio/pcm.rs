// src/audio/pcm.rs — Base64 PCM payloads to float sample buffers
//
// Narration arrives as base64 16-bit little-endian mono PCM, optionally
// wrapped in a data URI (`data:audio/L16;rate=24000;base64,....`).

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use std::time::Duration;

use crate::infra::errors::ChronosError;

/// Sample rate of the narration the simulation service produces.
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

const BYTES_PER_SAMPLE: usize = 2;

/// Standard alphabet, `=` padding optional.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Interleaved f32 samples ready for an output device.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    sample_rate: u32,
    channels: u16,
    samples: Vec<f32>,
}

impl PcmBuffer {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            channels: channels.max(1),
            samples,
        }
    }

    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self::new(sample_rate, 1, samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }
}

/// Decode a base64 payload, ignoring everything up to the first comma when
/// the payload is a data URI. ASCII whitespace anywhere (line-wrapped files)
/// and missing padding are accepted.
pub fn decode(payload: &str) -> Result<Vec<u8>, ChronosError> {
    let data = match payload.split_once(',') {
        Some((_, rest)) => rest,
        None => payload,
    };
    let compact: Vec<u8> = data
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    Ok(LENIENT.decode(compact)?)
}

/// Interpret raw bytes as signed 16-bit LE mono samples scaled into [-1, 1).
/// A trailing odd byte is not a sample and is dropped.
pub fn to_playable_buffer(bytes: &[u8], sample_rate: u32) -> PcmBuffer {
    let samples = bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32768.0)
        .collect();
    PcmBuffer::mono(sample_rate, samples)
}
