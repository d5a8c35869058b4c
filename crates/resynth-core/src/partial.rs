//! Raw partial trajectories as supplied by an analysis front end.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::SynthResult;
use crate::params::SynthParams;

/// Amplitude at or below which a control point counts as silent.
pub const NEGLIGIBLE_AMPLITUDE: f64 = 1e-6;

/// One analyzed instant of a partial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlPoint {
    /// Time in seconds.
    pub time: f64,
    /// Frequency in Hz.
    pub frequency: f64,
    /// Linear amplitude.
    pub amplitude: f64,
    /// Fraction of the energy that is noise, 0.0 to 1.0.
    #[serde(default)]
    pub bandwidth: f64,
    /// Phase in radians.
    #[serde(default)]
    pub phase: f64,
}

impl ControlPoint {
    /// Creates a control point.
    pub fn new(time: f64, frequency: f64, amplitude: f64, bandwidth: f64, phase: f64) -> Self {
        Self {
            time,
            frequency,
            amplitude,
            bandwidth,
            phase,
        }
    }

    /// Creates a purely sinusoidal control point with zero phase.
    pub fn sinusoidal(time: f64, frequency: f64, amplitude: f64) -> Self {
        Self::new(time, frequency, amplitude, 0.0, 0.0)
    }

    /// Sets the bandwidth.
    pub fn with_bandwidth(mut self, bandwidth: f64) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    /// Sets the phase.
    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    /// Returns true if the amplitude is too small to be heard.
    pub fn is_negligible(&self) -> bool {
        self.amplitude <= NEGLIGIBLE_AMPLITUDE
    }

    /// Zero-amplitude copy of this point moved by `dt` seconds, with the
    /// phase carried along at this point's frequency.
    pub(crate) fn silent_at(&self, dt: f64) -> Self {
        Self {
            time: self.time + dt,
            amplitude: 0.0,
            phase: wrap_pi(self.phase + 2.0 * PI * self.frequency * dt),
            ..*self
        }
    }

    fn defect(&self) -> Option<String> {
        let fields = [
            ("time", self.time),
            ("frequency", self.frequency),
            ("amplitude", self.amplitude),
            ("bandwidth", self.bandwidth),
            ("phase", self.phase),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| !value.is_finite()) {
            return Some(format!("{name} is not finite"));
        }
        if self.frequency < 0.0 {
            return Some(format!("negative frequency {}", self.frequency));
        }
        if self.amplitude < 0.0 {
            return Some(format!("negative amplitude {}", self.amplitude));
        }
        if !(0.0..=1.0).contains(&self.bandwidth) {
            return Some(format!("bandwidth {} outside [0, 1]", self.bandwidth));
        }
        None
    }
}

/// Wraps a phase into (-PI, PI] by removing the nearest multiple of 2*PI.
#[inline]
pub fn wrap_pi(x: f64) -> f64 {
    let two_pi = 2.0 * PI;
    x + two_pi * (-x / two_pi + 0.5).floor()
}

/// A partial trajectory: control points in increasing time order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Partial {
    /// Optional label assigned by the analysis that produced the partial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<i32>,
    /// Control points, strictly increasing in time.
    pub points: Vec<ControlPoint>,
}

impl Partial {
    /// Creates a partial from its control points.
    pub fn new(points: Vec<ControlPoint>) -> Self {
        Self {
            label: None,
            points,
        }
    }

    /// Sets the label.
    pub fn with_label(mut self, label: i32) -> Self {
        self.label = Some(label);
        self
    }

    /// Appends a control point.
    pub fn with_point(mut self, point: ControlPoint) -> Self {
        self.points.push(point);
        self
    }

    /// Number of control points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the partial has no control points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time of the first control point.
    pub fn start_time(&self) -> Option<f64> {
        self.points.first().map(|p| p.time)
    }

    /// Time of the last control point.
    pub fn end_time(&self) -> Option<f64> {
        self.points.last().map(|p| p.time)
    }

    /// Span between the first and last control point, 0.0 when empty.
    pub fn duration(&self) -> f64 {
        match (self.start_time(), self.end_time()) {
            (Some(start), Some(end)) => end - start,
            _ => 0.0,
        }
    }

    /// Describes the first problem that makes this partial unrenderable.
    pub(crate) fn defect(&self) -> Option<String> {
        let first = match self.points.first() {
            Some(first) => first,
            None => return Some("partial has no control points".to_string()),
        };
        if let Some((i, msg)) = self
            .points
            .iter()
            .enumerate()
            .find_map(|(i, p)| p.defect().map(|msg| (i, msg)))
        {
            return Some(format!("control point {i}: {msg}"));
        }
        if first.time < 0.0 {
            return Some(format!("negative start time {}", first.time));
        }
        if let Some(i) = self
            .points
            .windows(2)
            .position(|pair| pair[1].time <= pair[0].time)
        {
            return Some(format!(
                "control point {} at {} s does not follow {} s",
                i + 1,
                self.points[i + 1].time,
                self.points[i].time
            ));
        }
        None
    }
}

/// A partial set document: engine parameters plus the partials to render.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialSet {
    /// Engine parameters.
    #[serde(default)]
    pub params: SynthParams,
    /// Partials, in any order.
    pub partials: Vec<Partial>,
}

impl PartialSet {
    /// Parses a partial set from JSON.
    pub fn from_json(json: &str) -> SynthResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the set to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> SynthResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// End time of the latest partial, in seconds.
    pub fn end_time(&self) -> f64 {
        self.partials
            .iter()
            .filter_map(Partial::end_time)
            .fold(0.0, f64::max)
    }
}
