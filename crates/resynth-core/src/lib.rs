//! Resynth Core
//!
//! Incremental synthesis of bandwidth-enhanced partials: time-varying
//! sinusoids with a narrowband noise component, described by sparse control
//! points of frequency, amplitude, bandwidth and phase.
//!
//! # Overview
//!
//! A partial set is loaded once with [`RealtimeSynthesizer::setup`], which
//! validates every trajectory, frames it with zero-amplitude fade points and
//! maps it onto the sample clock. Audio is then produced a block at a time
//! with [`RealtimeSynthesizer::synthesize_next`], which adds into a buffer the
//! caller owns and never allocates, so it can be driven from an audio
//! callback. [`RealtimeSynthesizer::prepare_for_note`] transposes the loaded
//! set without reloading it.
//!
//! # Determinism
//!
//! Bandwidth noise comes from one PCG32 stream per partial, seeded from
//! [`SynthParams::noise_seed`] and the partial's index via BLAKE3. Output does
//! not depend on the block size used for streaming.
//!
//! # Crate Structure
//!
//! - [`engine`] - Block scheduler and per-sample oscillator kernel
//! - [`snapshot`] - Partials quantized to the sample clock, with progress state
//! - [`partial`] - Raw control points and partial sets
//! - [`modulator`] - Noise modulators for bandwidth enhancement
//! - [`params`] - Engine configuration
//! - [`filter`] - Lowpass used to band-limit noise
//! - [`rng`] - Deterministic seeding
//! - [`wav`] - Deterministic WAV writer

pub mod engine;
pub mod error;
pub mod filter;
pub mod modulator;
pub mod params;
pub mod partial;
pub mod rng;
pub mod snapshot;
pub mod wav;

// Re-export main types at crate root
pub use engine::RealtimeSynthesizer;
pub use error::{SynthError, SynthResult};
pub use modulator::{
    FilteredNoise, FilteredNoiseFactory, ModulatorFactory, NoiseModulator, Silence,
    SilenceFactory,
};
pub use params::SynthParams;
pub use partial::{wrap_pi, ControlPoint, Partial, PartialSet, NEGLIGIBLE_AMPLITUDE};
pub use snapshot::{PartialSnapshot, SynthesisState};
pub use wav::WavResult;
