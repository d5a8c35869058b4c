//! Incremental, block-based synthesis of partial sets.
//!
//! [`RealtimeSynthesizer`] renders a loaded set of partials a block at a time
//! into a buffer owned by the caller. Loading ([`RealtimeSynthesizer::setup`])
//! does all the allocating work up front; streaming
//! ([`RealtimeSynthesizer::synthesize_next`]) only touches preallocated state
//! and the caller's buffer, so it can run inside an audio callback.
//!
//! # Example
//!
//! ```
//! use resynth_core::{ControlPoint, Partial, RealtimeSynthesizer, SynthParams};
//!
//! let partial = Partial::new(vec![
//!     ControlPoint::sinusoidal(0.0, 440.0, 0.5),
//!     ControlPoint::sinusoidal(0.25, 440.0, 0.5),
//! ]);
//!
//! let mut synth = RealtimeSynthesizer::new(SynthParams::new(44100.0)).unwrap();
//! synth.setup(&[partial]).unwrap();
//!
//! let mut buffer = vec![0.0; synth.required_len()];
//! while !synth.is_finished() {
//!     synth.synthesize_next(&mut buffer, 64);
//! }
//! assert!(buffer.iter().any(|s| s.abs() > 0.4));
//! ```

mod kernel;


use std::collections::VecDeque;
use std::fmt;

use log::debug;

use crate::error::{SynthError, SynthResult};
use crate::modulator::{FilteredNoiseFactory, ModulatorFactory, NoiseModulator};
use crate::params::SynthParams;
use crate::partial::Partial;
use crate::snapshot::PartialSnapshot;

use self::kernel::{render_partial, KernelClock};

/// Renders bandwidth-enhanced partials into a caller-owned buffer, one block
/// per call.
///
/// The buffer is never resized by the synthesizer; size it with
/// [`required_len`](Self::required_len) after loading partials.
pub struct RealtimeSynthesizer<F: ModulatorFactory = FilteredNoiseFactory> {
    params: SynthParams,
    factory: F,
    partials: Vec<PartialSnapshot<F::Modulator>>,
    /// First partial not yet admitted to `processing`.
    next_partial: usize,
    /// Indices into `partials` of partials that have started but not finished.
    processing: VecDeque<usize>,
    processed_samples: usize,
}

impl<F: ModulatorFactory> fmt::Debug for RealtimeSynthesizer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeSynthesizer")
            .field("params", &self.params)
            .field("partials", &self.partials.len())
            .field("next_partial", &self.next_partial)
            .field("processing", &self.processing)
            .field("processed_samples", &self.processed_samples)
            .finish()
    }
}

impl RealtimeSynthesizer<FilteredNoiseFactory> {
    /// Creates a synthesizer using filtered-noise bandwidth enhancement.
    ///
    /// # Errors
    /// [`SynthError::InvalidConfiguration`] if `params` do not validate.
    pub fn new(params: SynthParams) -> SynthResult<Self> {
        Self::with_modulators(params, FilteredNoiseFactory)
    }
}

impl<F: ModulatorFactory> RealtimeSynthesizer<F> {
    /// Creates a synthesizer whose partials get their noise modulators from `factory`.
    ///
    /// # Errors
    /// [`SynthError::InvalidConfiguration`] if `params` do not validate.
    pub fn with_modulators(params: SynthParams, factory: F) -> SynthResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            factory,
            partials: Vec::new(),
            next_partial: 0,
            processing: VecDeque::new(),
            processed_samples: 0,
        })
    }

    /// Loads a new partial set, replacing the previous one.
    ///
    /// Every partial is validated, framed with fade points and quantized to
    /// the sample clock; partials are then ordered by start sample. Playback
    /// restarts at sample zero.
    ///
    /// Allocates; call it between streams, never from the audio callback.
    ///
    /// # Errors
    /// [`SynthError::InvalidInput`] for the first malformed partial. The whole
    /// set is rejected and the previously loaded set stays in place.
    pub fn setup(&mut self, partials: &[Partial]) -> SynthResult<()> {
        self.params.validate()?;

        let mut snapshots = Vec::with_capacity(partials.len());
        for (index, partial) in partials.iter().enumerate() {
            let modulator = self.factory.create(&self.params, index as u32);
            snapshots.push(PartialSnapshot::build(partial, index, &self.params, modulator)?);
        }
        snapshots.sort_by_key(|p| p.start_offset());

        self.partials = snapshots;
        self.processing = VecDeque::with_capacity(self.partials.len());
        self.next_partial = 0;
        self.processed_samples = 0;

        debug!(
            "loaded {} partials, {} samples at {} Hz",
            self.partials.len(),
            self.required_len(),
            self.params.sample_rate
        );
        Ok(())
    }

    /// Renders the next `samples` samples, adding them into `buffer` starting
    /// at [`processed_samples`](Self::processed_samples).
    ///
    /// Partials whose first sample falls before the end of this block are
    /// admitted, every admitted partial renders its share of the block, and
    /// partials that reached their last sample are retired.
    ///
    /// Does not allocate, block or log.
    ///
    /// # Panics
    /// If `buffer` is shorter than the samples partials write in this block.
    /// A buffer of [`required_len`](Self::required_len) samples is always
    /// long enough.
    pub fn synthesize_next(&mut self, buffer: &mut [f64], samples: usize) {
        if samples == 0 {
            return;
        }
        let window_start = self.processed_samples;
        let window_end = window_start + samples;

        while self.next_partial < self.partials.len()
            && self.partials[self.next_partial].start_offset() < window_end
        {
            self.processing.push_back(self.next_partial);
            self.next_partial += 1;
        }

        let clock = KernelClock {
            one_over_srate: 1.0 / self.params.sample_rate,
            nyquist: self.params.nyquist(),
        };
        for &index in self.processing.iter() {
            render_partial(
                &mut self.partials[index],
                buffer,
                window_start,
                window_end,
                clock,
            );
        }

        let partials = &self.partials;
        self.processing.retain(|&index| !partials[index].is_complete());
        self.processed_samples = window_end;
    }

    /// Transposes every loaded partial by `freq_scale`.
    ///
    /// The scale applies to the frequencies as loaded and replaces any earlier
    /// scale; it does not compound, so calling this twice with 2.0 still
    /// sounds one octave up. Progress is left alone; call it
    /// between notes, typically followed by [`rewind`](Self::rewind).
    ///
    /// # Errors
    /// [`SynthError::InvalidConfiguration`] unless `freq_scale` is finite and positive.
    pub fn prepare_for_note(&mut self, freq_scale: f64) -> SynthResult<()> {
        if !freq_scale.is_finite() || freq_scale <= 0.0 {
            return Err(SynthError::config(
                "freq_scale",
                format!("must be positive, got {freq_scale}"),
            ));
        }
        for partial in &mut self.partials {
            partial.frequency_scale = freq_scale;
        }
        debug!(
            "prepared {} partials with frequency scale {freq_scale}",
            self.partials.len()
        );
        Ok(())
    }

    /// Restarts playback of the loaded set from sample zero.
    ///
    /// Progress, modulators and the processing queue are reset; nothing is
    /// reallocated and the frequency scale is kept.
    pub fn rewind(&mut self) {
        for partial in &mut self.partials {
            partial.state = Default::default();
            partial.modulator.reset();
        }
        self.processing.clear();
        self.next_partial = 0;
        self.processed_samples = 0;
    }

    /// Changes the sample rate and re-quantizes the loaded partials.
    ///
    /// Playback restarts at sample zero and modulators are rebuilt for the
    /// new rate.
    ///
    /// # Errors
    /// [`SynthError::InvalidConfiguration`] if the resulting parameters do not
    /// validate; the synthesizer is left unchanged.
    pub fn set_sample_rate(&mut self, sample_rate: f64) -> SynthResult<()> {
        let params = SynthParams {
            sample_rate,
            ..self.params.clone()
        };
        params.validate()?;

        for partial in &mut self.partials {
            let modulator = self.factory.create(&params, partial.source_index as u32);
            partial.requantize(&params, modulator);
        }
        self.partials.sort_by_key(|p| p.start_offset());
        self.params = params;
        self.processing.clear();
        self.next_partial = 0;
        self.processed_samples = 0;

        debug!("sample rate set to {sample_rate} Hz");
        Ok(())
    }

    /// Drops every partial from the processing queue.
    ///
    /// Dropped partials are not resumed; partials not yet admitted still start
    /// when their block comes up.
    pub fn clear_partials_being_processed(&mut self) {
        self.processing.clear();
    }

    /// Loads `partials`, then renders them completely in blocks of `block_size`.
    ///
    /// Allocates the output buffer; meant for offline rendering and tests.
    ///
    /// # Errors
    /// Anything [`setup`](Self::setup) rejects, or a zero `block_size`.
    pub fn render(&mut self, partials: &[Partial], block_size: usize) -> SynthResult<Vec<f64>> {
        if block_size == 0 {
            return Err(SynthError::config("block_size", "must be at least 1"));
        }
        self.setup(partials)?;

        let mut buffer = vec![0.0; self.required_len()];
        while !self.is_finished() {
            self.synthesize_next(&mut buffer, block_size);
        }
        Ok(buffer)
    }

    /// Engine parameters.
    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    /// Samples produced since the last `setup`, `rewind` or sample rate change.
    pub fn processed_samples(&self) -> usize {
        self.processed_samples
    }

    /// Buffer length needed to hold every loaded partial.
    pub fn required_len(&self) -> usize {
        self.partials
            .iter()
            .map(|p| p.end_offset() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of loaded partials.
    pub fn partial_count(&self) -> usize {
        self.partials.len()
    }

    /// Number of partials currently in the processing queue.
    pub fn active_count(&self) -> usize {
        self.processing.len()
    }

    /// Returns true once every loaded partial has been admitted and retired.
    pub fn is_finished(&self) -> bool {
        self.next_partial == self.partials.len() && self.processing.is_empty()
    }

    /// Loaded partials, ordered by start sample.
    pub fn snapshots(&self) -> &[PartialSnapshot<F::Modulator>] {
        &self.partials
    }
}
