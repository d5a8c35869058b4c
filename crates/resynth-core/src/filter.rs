//! Biquad lowpass used to band-limit bandwidth noise.
//!
//! Coefficients follow the Audio EQ Cookbook.

use std::f64::consts::PI;

/// Biquad filter coefficients, normalized so that `a0 == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Creates lowpass filter coefficients.
    ///
    /// # Arguments
    /// * `cutoff` - Cutoff frequency in Hz
    /// * `q` - Q factor, 0.707 is Butterworth
    /// * `sample_rate` - Audio sample rate in Hz
    pub fn lowpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        // Clamp Q to minimum safe value to prevent division by zero
        let q = q.max(0.5);
        let omega = 2.0 * PI * cutoff / sample_rate;
        let cos_omega = omega.cos();
        let alpha = omega.sin() / (2.0 * q);

        let a0 = 1.0 + alpha;
        let b1 = (1.0 - cos_omega) / a0;

        Self {
            b0: 0.5 * b1,
            b1,
            b2: 0.5 * b1,
            a1: -2.0 * cos_omega / a0,
            a2: (1.0 - alpha) / a0,
        }
    }
}

/// Equivalent noise bandwidth of a second-order Butterworth lowpass, in Hz.
///
/// White noise of variance `v` comes out of the filter with variance
/// `v * 2 * enbw / sample_rate`.
pub fn butterworth_noise_bandwidth(cutoff: f64) -> f64 {
    PI * cutoff / (4.0 * (PI / 4.0).sin())
}

/// Direct form I biquad.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    coeffs: BiquadCoeffs,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadFilter {
    /// Creates a biquad with the given coefficients and cleared history.
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Creates a Butterworth lowpass.
    pub fn butterworth_lowpass(cutoff: f64, sample_rate: f64) -> Self {
        Self::new(BiquadCoeffs::lowpass(
            cutoff,
            std::f64::consts::FRAC_1_SQRT_2,
            sample_rate,
        ))
    }

    /// Clears the filter history.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Filters one sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let c = &self.coeffs;
        let output = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowpass_unity_dc_gain() {
        let mut filter = BiquadFilter::butterworth_lowpass(500.0, 44100.0);
        let mut out = 0.0;
        for _ in 0..20000 {
            out = filter.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_lowpass_attenuates_high_frequencies() {
        let sample_rate = 44100.0;
        let mut filter = BiquadFilter::butterworth_lowpass(500.0, sample_rate);
        let mut peak: f64 = 0.0;
        for i in 0..44100 {
            let x = (2.0 * PI * 10000.0 * i as f64 / sample_rate).sin();
            let y = filter.process(x);
            if i > 4410 {
                peak = peak.max(y.abs());
            }
        }
        // Two poles, more than four octaves above cutoff
        assert!(peak < 0.01, "peak {peak}");
    }

    #[test]
    fn test_reset_clears_history() {
        let mut filter = BiquadFilter::butterworth_lowpass(500.0, 44100.0);
        let first = filter.process(1.0);
        filter.process(0.3);
        filter.reset();
        assert_eq!(filter.process(1.0), first);
    }

    #[test]
    fn test_noise_bandwidth_slightly_above_cutoff() {
        let enbw = butterworth_noise_bandwidth(500.0);
        assert!((enbw - 555.36).abs() < 0.1);
    }
}
