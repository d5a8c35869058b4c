//! Per-sample oscillator kernel.

use std::f64::consts::PI;

use crate::modulator::NoiseModulator;
use crate::partial::{wrap_pi, ControlPoint};
use crate::snapshot::PartialSnapshot;

/// Clock-dependent constants of one `synthesize_next` call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct KernelClock {
    pub one_over_srate: f64,
    pub nyquist: f64,
}

/// Renders the part of `partial` that falls in `[window_start, window_end)`,
/// adding it into `buffer` at absolute sample offsets.
///
/// Progress is stored back into the partial so the next call resumes exactly
/// where this one stopped.
pub(crate) fn render_partial<M: NoiseModulator>(
    partial: &mut PartialSnapshot<M>,
    buffer: &mut [f64],
    window_start: usize,
    window_end: usize,
    clock: KernelClock,
) {
    let start = partial.start_offset();
    let from = start + partial.state.current_sample;
    let stop = window_end.min(start + partial.len_samples());
    debug_assert!(from >= window_start);
    if from >= stop {
        return;
    }

    let scale = partial.frequency_scale;
    let points = &partial.points;
    let state = &mut partial.state;
    let modulator = &mut partial.modulator;

    let mut cursor = state.last_point.unwrap_or(0);
    let mut phase = state.phase;
    let mut previous_frequency = state.previous_frequency;

    for (n, out) in (from..stop).zip(buffer[from..stop].iter_mut()) {
        let starting = state.last_point.is_none();
        let mut entered = starting;
        while cursor + 1 < points.len() && points[cursor + 1].0 <= n {
            cursor += 1;
            entered = true;
        }

        let (offset, here) = points[cursor];
        let next = points.get(cursor + 1).copied();
        let (frequency, amplitude, bandwidth) = match next {
            Some((next_offset, there)) => {
                let alpha = (n - offset) as f64 / (next_offset - offset) as f64;
                (
                    lerp(here.frequency, there.frequency, alpha) * scale,
                    lerp(here.amplitude, there.amplitude, alpha),
                    lerp(here.bandwidth, there.bandwidth, alpha),
                )
            }
            None => (here.frequency * scale, here.amplitude, here.bandwidth),
        };

        phase = if entered && here.is_negligible() {
            // Silent point: free to jump so the phase lands on the next point.
            match next {
                Some((next_offset, there)) => {
                    arrival_phase(&here, &there, next_offset - offset, scale, clock)
                }
                None => here.phase,
            }
        } else if starting {
            wrap_pi(here.phase)
        } else {
            wrap_pi(phase + PI * (previous_frequency + frequency) * clock.one_over_srate)
        };

        let amplitude = if frequency >= clock.nyquist {
            0.0
        } else {
            amplitude
        };
        let noise = modulator.modulate(phase);
        *out += amplitude * ((1.0 - bandwidth).sqrt() * phase.cos() + bandwidth.sqrt() * noise);

        previous_frequency = frequency;
        state.current_sample += 1;
        state.last_point = Some(cursor);
    }

    state.phase = phase;
    state.previous_frequency = previous_frequency;
}

/// Phase at `here` such that trapezoidal integration of the linearly
/// interpolated frequency reaches `there.phase` after `samples` samples.
fn arrival_phase(
    here: &ControlPoint,
    there: &ControlPoint,
    samples: usize,
    scale: f64,
    clock: KernelClock,
) -> f64 {
    let travel =
        PI * (here.frequency + there.frequency) * scale * samples as f64 * clock.one_over_srate;
    wrap_pi(there.phase - travel)
}

#[inline]
fn lerp(a: f64, b: f64, alpha: f64) -> f64 {
    a + (b - a) * alpha
}
