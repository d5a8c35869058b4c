//! Flattened partials ready for incremental synthesis.
//!
//! A [`PartialSnapshot`] stores a partial as `(sample offset, control point)`
//! pairs on the engine's sample clock, framed by zero-amplitude fade points,
//! together with the progress state that lets synthesis resume where the
//! previous block stopped.

use log::trace;

use crate::error::{SynthError, SynthResult};
use crate::partial::{ControlPoint, Partial};
use crate::params::SynthParams;

/// Where synthesis of one partial stands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisState {
    /// Next sample to render, counted from the partial's first offset.
    pub current_sample: usize,
    /// Index of the most recently passed control point, `None` before the first sample.
    pub last_point: Option<usize>,
    /// Instantaneous frequency (Hz) of the previously rendered sample.
    pub previous_frequency: f64,
    /// Oscillator phase of the previously rendered sample, in (-PI, PI].
    pub phase: f64,
}

impl Default for SynthesisState {
    fn default() -> Self {
        Self {
            current_sample: 0,
            last_point: None,
            previous_frequency: 0.0,
            phase: 0.0,
        }
    }
}

/// One partial, quantized to sample offsets, plus its synthesis progress.
#[derive(Debug, Clone)]
pub struct PartialSnapshot<M> {
    pub(crate) source_index: usize,
    pub(crate) label: Option<i32>,
    pub(crate) start_time: f64,
    pub(crate) end_time: f64,
    pub(crate) points: Vec<(usize, ControlPoint)>,
    pub(crate) frequency_scale: f64,
    pub(crate) state: SynthesisState,
    pub(crate) modulator: M,
}

impl<M> PartialSnapshot<M> {
    /// Builds a snapshot from a raw partial.
    ///
    /// Zero-amplitude points are added `fade_time` before the first and after
    /// the last control point unless that end is already negligible, and all
    /// times are mapped onto the engine sample clock.
    ///
    /// # Arguments
    /// * `partial` - Raw trajectory
    /// * `index` - Position of the partial in the loaded set, used in errors
    /// * `params` - Engine parameters (sample rate and fade time)
    /// * `modulator` - Noise modulator owned by this partial
    ///
    /// # Errors
    /// [`SynthError::InvalidConfiguration`] for bad parameters,
    /// [`SynthError::InvalidInput`] for a malformed trajectory.
    pub fn build(
        partial: &Partial,
        index: usize,
        params: &SynthParams,
        modulator: M,
    ) -> SynthResult<Self> {
        params.validate()?;
        if let Some(message) = partial.defect() {
            return Err(SynthError::partial(index, partial.label, message));
        }

        let (first, last) = match (partial.points.first(), partial.points.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(SynthError::partial(index, partial.label, "partial is empty")),
        };
        let fade = params.fade_time;

        let mut augmented = Vec::with_capacity(partial.len() + 2);
        if fade > 0.0 && !first.is_negligible() {
            augmented.push(first.silent_at(-fade));
        }
        augmented.extend_from_slice(&partial.points);
        if fade > 0.0 && !last.is_negligible() {
            augmented.push(last.silent_at(fade));
        }

        let points = quantize(&augmented, params, index);
        let (start_time, end_time) = time_span(&points);

        Ok(Self {
            source_index: index,
            label: partial.label,
            start_time,
            end_time,
            points,
            frequency_scale: 1.0,
            state: SynthesisState::default(),
            modulator,
        })
    }

    /// Label of the source partial.
    pub fn label(&self) -> Option<i32> {
        self.label
    }

    /// Position of the source partial in the set passed to `setup`.
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    /// Time of the first (fade) point in seconds.
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Time of the last (fade) point in seconds.
    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// Rendered span in seconds, fades included.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Sample offset of the first point.
    pub fn start_offset(&self) -> usize {
        self.points[0].0
    }

    /// Sample offset of the last point.
    pub fn end_offset(&self) -> usize {
        self.points[self.points.len() - 1].0
    }

    /// Number of samples this partial renders, both end points included.
    pub fn len_samples(&self) -> usize {
        self.end_offset() - self.start_offset() + 1
    }

    /// Quantized control points, fade points included.
    pub fn points(&self) -> &[(usize, ControlPoint)] {
        &self.points
    }

    /// Current synthesis progress.
    pub fn state(&self) -> &SynthesisState {
        &self.state
    }

    /// Factor applied to every stored frequency.
    pub fn frequency_scale(&self) -> f64 {
        self.frequency_scale
    }

    /// Returns true once every sample of the partial has been rendered.
    pub fn is_complete(&self) -> bool {
        self.state.current_sample >= self.len_samples()
    }

    /// Returns true if synthesis has started but not finished.
    pub fn is_sounding(&self) -> bool {
        self.state.last_point.is_some() && !self.is_complete()
    }

    /// The modulator owned by this partial.
    pub fn modulator(&self) -> &M {
        &self.modulator
    }

    /// Maps the stored control points onto a new sample clock.
    pub(crate) fn requantize(&mut self, params: &SynthParams, modulator: M) {
        let augmented: Vec<ControlPoint> = self.points.iter().map(|(_, p)| *p).collect();
        self.points = quantize(&augmented, params, self.source_index);
        let (start_time, end_time) = time_span(&self.points);
        self.start_time = start_time;
        self.end_time = end_time;
        self.modulator = modulator;
        self.state = SynthesisState::default();
    }
}

/// Converts times to sample offsets, keeping offsets strictly increasing.
///
/// When two consecutive points land on the same sample the later one wins,
/// except that a silent leading point is never replaced by an audible one:
/// the audible point moves to the next sample so the partial still starts
/// from zero amplitude.
fn quantize(
    points: &[ControlPoint],
    params: &SynthParams,
    index: usize,
) -> Vec<(usize, ControlPoint)> {
    let mut quantized: Vec<(usize, ControlPoint)> = Vec::with_capacity(points.len());
    for point in points {
        let offset = params.sample_offset(point.time);
        let leading_silence = quantized.len() == 1 && quantized[0].1.is_negligible();
        match quantized.last_mut() {
            Some(last) if last.0 >= offset && leading_silence && !point.is_negligible() => {
                let shifted = last.0 + 1;
                trace!("partial {index}: point at {} s moved to sample {shifted}", point.time);
                quantized.push((shifted, *point));
            }
            Some(last) if last.0 >= offset => {
                trace!(
                    "partial {index}: point at {} s shares sample {offset}, replacing point at {} s",
                    point.time,
                    last.1.time
                );
                last.1 = *point;
            }
            _ => quantized.push((offset, *point)),
        }
    }
    quantized
}

fn time_span(points: &[(usize, ControlPoint)]) -> (f64, f64) {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first.1.time, last.1.time),
        _ => (0.0, 0.0),
    }
}
