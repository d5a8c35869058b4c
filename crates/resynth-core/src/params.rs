//! Engine configuration.
//!
//! [`SynthParams`] collects everything the engine needs to turn partial
//! trajectories into samples. It deserializes from the `params` block of a
//! partial set document; missing fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// Default fade time in seconds (1 ms).
pub const DEFAULT_FADE_TIME: f64 = 0.001;

/// Default cutoff of the bandwidth noise lowpass in Hz.
pub const DEFAULT_NOISE_CUTOFF: f64 = 500.0;

/// Synthesis parameters shared by every partial of an engine.
///
/// When deserialized without a `noise_cutoff`, the cutoff follows the rules
/// of [`SynthParams::new`] for the given sample rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ParamsDocument")]
pub struct SynthParams {
    /// Output sample rate in Hz.
    pub sample_rate: f64,
    /// Length of the synthetic fade-in/fade-out ramps, in seconds.
    pub fade_time: f64,
    /// Base seed for the per-partial noise modulators.
    pub noise_seed: u32,
    /// Cutoff of the lowpass applied to bandwidth noise, in Hz.
    pub noise_cutoff: f64,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            fade_time: DEFAULT_FADE_TIME,
            noise_seed: 0,
            noise_cutoff: DEFAULT_NOISE_CUTOFF,
        }
    }
}

/// `params` block as written in a document; every field is optional.
#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ParamsDocument {
    sample_rate: f64,
    fade_time: f64,
    noise_seed: u32,
    noise_cutoff: Option<f64>,
}

impl Default for ParamsDocument {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            fade_time: DEFAULT_FADE_TIME,
            noise_seed: 0,
            noise_cutoff: None,
        }
    }
}

impl From<ParamsDocument> for SynthParams {
    fn from(doc: ParamsDocument) -> Self {
        let params = SynthParams::new(doc.sample_rate)
            .with_fade_time(doc.fade_time)
            .with_noise_seed(doc.noise_seed);
        match doc.noise_cutoff {
            Some(cutoff) => params.with_noise_cutoff(cutoff),
            None => params,
        }
    }
}

impl SynthParams {
    /// Creates parameters for the given sample rate with the default fade.
    ///
    /// The noise cutoff is [`DEFAULT_NOISE_CUTOFF`] or a quarter of the
    /// sample rate, whichever is lower.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            noise_cutoff: DEFAULT_NOISE_CUTOFF.min(0.25 * sample_rate),
            ..Self::default()
        }
    }

    /// Sets the fade time in seconds.
    pub fn with_fade_time(mut self, fade_time: f64) -> Self {
        self.fade_time = fade_time;
        self
    }

    /// Sets the noise seed.
    pub fn with_noise_seed(mut self, seed: u32) -> Self {
        self.noise_seed = seed;
        self
    }

    /// Sets the bandwidth noise cutoff in Hz.
    pub fn with_noise_cutoff(mut self, cutoff: f64) -> Self {
        self.noise_cutoff = cutoff;
        self
    }

    /// Checks every parameter.
    ///
    /// # Errors
    /// [`SynthError::InvalidConfiguration`] naming the first offending field.
    pub fn validate(&self) -> SynthResult<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(SynthError::config(
                "sample_rate",
                format!("must be positive, got {}", self.sample_rate),
            ));
        }
        if !self.fade_time.is_finite() || self.fade_time < 0.0 {
            return Err(SynthError::config(
                "fade_time",
                format!("must be non-negative, got {}", self.fade_time),
            ));
        }
        if !self.noise_cutoff.is_finite()
            || self.noise_cutoff <= 0.0
            || self.noise_cutoff >= self.nyquist()
        {
            return Err(SynthError::config(
                "noise_cutoff",
                format!(
                    "must lie between 0 and {} Hz, got {}",
                    self.nyquist(),
                    self.noise_cutoff
                ),
            ));
        }
        Ok(())
    }

    /// Half the sample rate.
    pub fn nyquist(&self) -> f64 {
        0.5 * self.sample_rate
    }

    /// Maps a partial time (seconds) onto the engine's sample clock.
    ///
    /// The clock starts one fade time before `t = 0`, so a partial beginning
    /// at zero still gets a complete fade-in. Times must be `>= -fade_time`.
    pub fn sample_offset(&self, time: f64) -> usize {
        ((time + self.fade_time) * self.sample_rate).round().max(0.0) as usize
    }
}
