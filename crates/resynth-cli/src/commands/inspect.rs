//! Inspect command implementation
//!
//! Loads a partial set into the synthesizer and reports how each partial
//! lands on the sample clock once fade points are added.

use anyhow::{Context, Result};
use colored::Colorize;
use resynth_core::{PartialSet, RealtimeSynthesizer, SilenceFactory};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

use crate::input::{load_partial_set, LoadResult};

/// One loaded partial, as placed on the sample clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialSummary {
    /// Position in the source document.
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<i32>,
    /// First rendered time in seconds, fade included.
    pub start_time: f64,
    /// Last rendered time in seconds, fade included.
    pub end_time: f64,
    pub duration: f64,
    pub start_sample: usize,
    pub end_sample: usize,
    /// Control points after fades are added and coincident points merged.
    pub points: usize,
}

/// Report for a whole set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectReport {
    pub sample_rate: f64,
    pub fade_time: f64,
    pub total_samples: usize,
    pub partials: Vec<PartialSummary>,
}

/// Builds the report for `set`, in start order.
pub fn inspect_set(set: &PartialSet) -> Result<InspectReport> {
    let mut synth = RealtimeSynthesizer::with_modulators(set.params.clone(), SilenceFactory)
        .context("Invalid synthesis parameters")?;
    synth.setup(&set.partials).context("Partial set rejected")?;

    let partials = synth
        .snapshots()
        .iter()
        .map(|p| PartialSummary {
            index: p.source_index(),
            label: p.label(),
            start_time: p.start_time(),
            end_time: p.end_time(),
            duration: p.duration(),
            start_sample: p.start_offset(),
            end_sample: p.end_offset(),
            points: p.points().len(),
        })
        .collect();

    Ok(InspectReport {
        sample_rate: synth.params().sample_rate,
        fade_time: synth.params().fade_time,
        total_samples: synth.required_len(),
        partials,
    })
}

/// Run the inspect command
///
/// # Arguments
/// * `input_path` - Path to the partial set (JSON)
/// * `json_output` - Whether to print the report as JSON
///
/// # Returns
/// Exit code: 0 on success
pub fn run(input_path: &str, json_output: bool) -> Result<ExitCode> {
    let LoadResult { set, .. } = load_partial_set(Path::new(input_path))
        .with_context(|| format!("Failed to load partial set: {}", input_path))?;
    let report = inspect_set(&set)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", "Inspecting:".cyan().bold(), input_path);
    println!(
        "{} {} Hz, fade {} s, {} samples",
        "Clock:".dimmed(),
        report.sample_rate,
        report.fade_time,
        report.total_samples
    );
    println!(
        "{:>6} {:>6} {:>10} {:>10} {:>10} {:>8}",
        "index", "label", "start", "end", "duration", "points"
    );
    for p in &report.partials {
        let label = p.label.map(|l| l.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:>6} {:>6} {:>10.4} {:>10.4} {:>10.4} {:>8}",
            p.index, label, p.start_time, p.end_time, p.duration, p.points
        );
    }
    println!("{} {} partials", "Loaded".green(), report.partials.len());

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use resynth_core::{ControlPoint, Partial, SynthParams};

    fn set() -> PartialSet {
        PartialSet {
            params: SynthParams::new(1000.0).with_fade_time(0.01),
            partials: vec![
                Partial::new(vec![
                    ControlPoint::sinusoidal(0.2, 100.0, 0.5),
                    ControlPoint::sinusoidal(0.3, 100.0, 0.5),
                ])
                .with_label(3),
                Partial::new(vec![
                    ControlPoint::sinusoidal(0.1, 50.0, 0.0),
                    ControlPoint::sinusoidal(0.15, 50.0, 0.5),
                    ControlPoint::sinusoidal(0.2, 50.0, 0.0),
                ]),
            ],
        }
    }

    #[test]
    fn test_report_in_start_order() {
        let report = inspect_set(&set()).unwrap();
        assert_eq!(report.total_samples, 321);

        let second = &report.partials[0];
        assert_eq!(second.index, 1);
        assert_eq!(second.label, None);
        assert_eq!((second.start_sample, second.end_sample), (110, 210));
        assert_eq!(second.points, 3);

        let first = &report.partials[1];
        assert_eq!(first.index, 0);
        assert_eq!(first.label, Some(3));
        assert_eq!((first.start_sample, first.end_sample), (200, 320));
        assert_eq!(first.points, 4);
        assert!((first.duration - 0.12).abs() < 1e-12);
    }

    #[test]
    fn test_report_serializes() {
        let report = inspect_set(&set()).unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["partials"][1]["label"], 3);
        assert!(value["partials"][0].get("label").is_none());
    }

    #[test]
    fn test_rejected_set() {
        let mut set = set();
        set.partials.push(Partial::default());
        let err = inspect_set(&set).unwrap_err();
        assert!(format!("{err:#}").contains("index 2"));
    }
}
