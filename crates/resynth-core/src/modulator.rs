//! Noise modulators for bandwidth-enhanced oscillators.
//!
//! A bandwidth-enhanced partial mixes its sinusoid with a narrowband noise
//! component. The engine asks a [`NoiseModulator`] for that component once per
//! rendered sample, passing the carrier phase, and weights it by the square
//! root of the partial's bandwidth. Each partial gets its own modulator from a
//! [`ModulatorFactory`] when partials are loaded.

use rand::Rng;
use rand_pcg::Pcg32;

use crate::filter::{butterworth_noise_bandwidth, BiquadFilter};
use crate::params::SynthParams;
use crate::rng::{create_rng, derive_partial_seed};

/// Source of the noise component of one partial.
pub trait NoiseModulator {
    /// Returns the noise component for a carrier at `phase` radians.
    ///
    /// Called from the real-time path: must not allocate or block.
    fn modulate(&mut self, phase: f64) -> f64;

    /// Restores the modulator to the state it had when created.
    fn reset(&mut self);
}

/// Creates one modulator per loaded partial.
pub trait ModulatorFactory {
    /// Modulator type owned by each partial.
    type Modulator: NoiseModulator;

    /// Creates the modulator for the partial at `partial_index` in the loaded set.
    fn create(&self, params: &SynthParams, partial_index: u32) -> Self::Modulator;
}

/// Lowpass-filtered white noise riding on the carrier.
///
/// The filtered noise is scaled to unit variance, so the modulated carrier
/// carries the same mean power as the plain sinusoid it replaces.
#[derive(Debug, Clone)]
pub struct FilteredNoise {
    seed: u32,
    rng: Pcg32,
    filter: BiquadFilter,
    gain: f64,
}

impl FilteredNoise {
    /// Creates a noise modulator.
    ///
    /// # Arguments
    /// * `seed` - Seed of the noise stream
    /// * `cutoff` - Lowpass cutoff in Hz
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(seed: u32, cutoff: f64, sample_rate: f64) -> Self {
        // Uniform noise on [-1, 1) has variance 1/3
        let filtered_variance = 2.0 * butterworth_noise_bandwidth(cutoff) / sample_rate / 3.0;
        Self {
            seed,
            rng: create_rng(seed),
            filter: BiquadFilter::butterworth_lowpass(cutoff, sample_rate),
            gain: 1.0 / filtered_variance.sqrt(),
        }
    }

    /// Seed of the noise stream.
    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl NoiseModulator for FilteredNoise {
    #[inline]
    fn modulate(&mut self, phase: f64) -> f64 {
        let white: f64 = self.rng.gen_range(-1.0..1.0);
        self.gain * self.filter.process(white) * phase.cos()
    }

    fn reset(&mut self) {
        self.rng = create_rng(self.seed);
        self.filter.reset();
    }
}

/// Builds a [`FilteredNoise`] per partial, seeded from the engine seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilteredNoiseFactory;

impl ModulatorFactory for FilteredNoiseFactory {
    type Modulator = FilteredNoise;

    fn create(&self, params: &SynthParams, partial_index: u32) -> FilteredNoise {
        FilteredNoise::new(
            derive_partial_seed(params.noise_seed, partial_index),
            params.noise_cutoff,
            params.sample_rate,
        )
    }
}

/// Modulator that contributes nothing; bandwidth only attenuates the sinusoid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silence;

impl NoiseModulator for Silence {
    #[inline]
    fn modulate(&mut self, _phase: f64) -> f64 {
        0.0
    }

    fn reset(&mut self) {}
}

/// Builds [`Silence`] for every partial.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilenceFactory;

impl ModulatorFactory for SilenceFactory {
    type Modulator = Silence;

    fn create(&self, _params: &SynthParams, _partial_index: u32) -> Silence {
        Silence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filtered_noise_has_unit_variance() {
        let mut noise = FilteredNoise::new(42, 500.0, 44100.0);
        // Phase 0 leaves the raw filtered noise
        let samples: Vec<f64> = (0..88200).map(|_| noise.modulate(0.0)).collect();
        let settled = &samples[4410..];
        let variance = settled.iter().map(|s| s * s).sum::<f64>() / settled.len() as f64;
        assert!(variance > 0.7 && variance < 1.3, "variance {variance}");
    }

    #[test]
    fn test_reset_replays_stream() {
        let mut noise = FilteredNoise::new(7, 500.0, 44100.0);
        let first: Vec<f64> = (0..64).map(|i| noise.modulate(i as f64 * 0.1)).collect();
        noise.reset();
        let second: Vec<f64> = (0..64).map(|i| noise.modulate(i as f64 * 0.1)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_factory_gives_each_partial_its_own_stream() {
        let params = SynthParams::default().with_noise_seed(3);
        let mut a = FilteredNoiseFactory.create(&params, 0);
        let mut b = FilteredNoiseFactory.create(&params, 1);
        assert_ne!(a.seed(), b.seed());
        let va: Vec<f64> = (0..16).map(|_| a.modulate(0.0)).collect();
        let vb: Vec<f64> = (0..16).map(|_| b.modulate(0.0)).collect();
        assert_ne!(va, vb);
    }

    #[test]
    fn test_silence() {
        let mut silence = SilenceFactory.create(&SynthParams::default(), 0);
        assert_eq!(silence.modulate(1.0), 0.0);
    }
}
