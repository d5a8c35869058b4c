//! Deterministic WAV file writer.
//!
//! Rendered buffers are written as mono 16-bit PCM with no timestamps or
//! optional chunks, so identical buffers always produce identical files. The
//! BLAKE3 hash of the PCM payload identifies a rendering.

use std::io::{self, Write};
use std::path::Path;

use crate::error::SynthResult;

/// Writes a mono 16-bit PCM WAV file to a writer.
///
/// # Arguments
/// * `writer` - Output writer
/// * `sample_rate` - Sample rate in Hz
/// * `pcm_data` - Little-endian 16-bit samples
pub fn write_wav<W: Write>(writer: &mut W, sample_rate: u32, pcm_data: &[u8]) -> io::Result<()> {
    const CHANNELS: u16 = 1;
    const BITS_PER_SAMPLE: u16 = 16;
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let byte_rate = sample_rate * block_align as u32;
    let data_size = pcm_data.len() as u32;

    // RIFF header
    writer.write_all(b"RIFF")?;
    writer.write_all(&(36 + data_size).to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    // fmt chunk
    writer.write_all(b"fmt ")?;
    writer.write_all(&16u32.to_le_bytes())?;
    writer.write_all(&1u16.to_le_bytes())?; // PCM
    writer.write_all(&CHANNELS.to_le_bytes())?;
    writer.write_all(&sample_rate.to_le_bytes())?;
    writer.write_all(&byte_rate.to_le_bytes())?;
    writer.write_all(&block_align.to_le_bytes())?;
    writer.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;

    // data chunk
    writer.write_all(b"data")?;
    writer.write_all(&data_size.to_le_bytes())?;
    writer.write_all(pcm_data)?;

    Ok(())
}

/// Converts samples to 16-bit PCM bytes, clipping to [-1.0, 1.0].
pub fn samples_to_pcm16(samples: &[f64]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        pcm.extend_from_slice(&value.to_le_bytes());
    }
    pcm
}

/// Largest absolute sample value.
pub fn peak(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0_f64, |acc, s| acc.max(s.abs()))
}

/// Scales samples in place so the peak equals `target`. Silent buffers are left alone.
pub fn normalize(samples: &mut [f64], target: f64) {
    let max = peak(samples);
    if max > 0.0 {
        let gain = target / max;
        for s in samples.iter_mut() {
            *s *= gain;
        }
    }
}

/// An encoded rendering.
#[derive(Debug)]
pub struct WavResult {
    /// Complete WAV file bytes.
    pub wav_data: Vec<u8>,
    /// BLAKE3 hash of the PCM payload, hex encoded.
    pub pcm_hash: String,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of samples.
    pub num_samples: usize,
    /// Peak absolute value of the samples before clipping.
    pub peak: f64,
}

impl WavResult {
    /// Encodes mono samples.
    pub fn from_samples(samples: &[f64], sample_rate: u32) -> Self {
        let pcm = samples_to_pcm16(samples);
        let pcm_hash = blake3::hash(&pcm).to_hex().to_string();
        let mut wav_data = Vec::with_capacity(44 + pcm.len());
        write_wav(&mut wav_data, sample_rate, &pcm).expect("writing to Vec should not fail");

        Self {
            wav_data,
            pcm_hash,
            sample_rate,
            num_samples: samples.len(),
            peak: peak(samples),
        }
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.num_samples as f64 / self.sample_rate as f64
    }

    /// Writes the WAV bytes to `path`.
    ///
    /// # Errors
    /// [`SynthError::Io`](crate::SynthError::Io) if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> SynthResult<()> {
        std::fs::write(path, &self.wav_data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let result = WavResult::from_samples(&[0.0, 0.5, -0.5, 1.0], 44100);
        let data = &result.wav_data;
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"WAVE");
        assert_eq!(&data[12..16], b"fmt ");
        assert_eq!(&data[36..40], b"data");
        assert_eq!(u32::from_le_bytes(data[40..44].try_into().unwrap()), 8);
        assert_eq!(u32::from_le_bytes(data[24..28].try_into().unwrap()), 44100);
        assert_eq!(data.len(), 44 + 8);
    }

    #[test]
    fn test_pcm_conversion_clips() {
        let pcm = samples_to_pcm16(&[2.0, -2.0, 0.0]);
        assert_eq!(i16::from_le_bytes([pcm[0], pcm[1]]), 32767);
        assert_eq!(i16::from_le_bytes([pcm[2], pcm[3]]), -32767);
        assert_eq!(i16::from_le_bytes([pcm[4], pcm[5]]), 0);
    }

    #[test]
    fn test_pcm_hash_is_deterministic() {
        let samples: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.01).sin()).collect();
        let a = WavResult::from_samples(&samples, 22050);
        let b = WavResult::from_samples(&samples, 22050);
        assert_eq!(a.pcm_hash, b.pcm_hash);
        assert_eq!(a.pcm_hash.len(), 64);
        assert!((a.duration_seconds() - 1000.0 / 22050.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize() {
        let mut samples = vec![0.1, -0.4, 0.2];
        normalize(&mut samples, 0.8);
        assert!((peak(&samples) - 0.8).abs() < 1e-12);
        assert!((samples[0] - 0.2).abs() < 1e-12);

        let mut silent = vec![0.0; 4];
        normalize(&mut silent, 1.0);
        assert_eq!(silent, vec![0.0; 4]);
    }
}
