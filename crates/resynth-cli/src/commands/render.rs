//! Render command implementation
//!
//! Streams a partial set through the synthesizer block by block and writes
//! the result as a 16-bit WAV file.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use resynth_core::wav::{self, WavResult};
use resynth_core::{PartialSet, RealtimeSynthesizer, SynthParams};
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

use crate::input::{load_partial_set, LoadResult};

/// Peak level used by `--normalize`.
pub const NORMALIZE_PEAK: f64 = 0.99;

/// Command-line overrides for a render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Samples synthesized per block.
    pub block_size: usize,
    /// Sample rate override in Hz.
    pub sample_rate: Option<f64>,
    /// Fade time override in seconds.
    pub fade_time: Option<f64>,
    /// Noise seed override.
    pub seed: Option<u32>,
    /// Transposition in semitones.
    pub transpose: Option<f64>,
    /// Normalize the peak to [`NORMALIZE_PEAK`].
    pub normalize: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            block_size: 512,
            sample_rate: None,
            fade_time: None,
            seed: None,
            transpose: None,
            normalize: false,
        }
    }
}

impl RenderOptions {
    /// Applies the overrides to the parameters read from a document.
    pub fn apply(&self, params: &SynthParams) -> SynthParams {
        let mut params = params.clone();
        if let Some(sample_rate) = self.sample_rate {
            params.sample_rate = sample_rate;
        }
        if let Some(fade_time) = self.fade_time {
            params.fade_time = fade_time;
        }
        if let Some(seed) = self.seed {
            params.noise_seed = seed;
        }
        params
    }

    /// Frequency scale for the requested transposition, 1.0 if none.
    pub fn frequency_scale(&self) -> f64 {
        self.transpose
            .map(|semitones| 2f64.powf(semitones / 12.0))
            .unwrap_or(1.0)
    }
}

/// A rendered buffer and the parameters it was rendered with.
#[derive(Debug)]
pub struct Rendering {
    pub samples: Vec<f64>,
    pub params: SynthParams,
    pub partials: usize,
}

/// Renders `set` with `options` applied.
pub fn render_set(set: &PartialSet, options: &RenderOptions) -> Result<Rendering> {
    if options.block_size == 0 {
        bail!("block size must be at least 1");
    }
    let params = options.apply(&set.params);
    let mut synth =
        RealtimeSynthesizer::new(params.clone()).context("Invalid synthesis parameters")?;
    synth.setup(&set.partials).context("Partial set rejected")?;

    let scale = options.frequency_scale();
    if scale != 1.0 {
        synth
            .prepare_for_note(scale)
            .context("Invalid transposition")?;
    }

    let mut samples = vec![0.0; synth.required_len()];
    while !synth.is_finished() {
        synth.synthesize_next(&mut samples, options.block_size);
    }

    if options.normalize {
        wav::normalize(&mut samples, NORMALIZE_PEAK);
    }

    Ok(Rendering {
        samples,
        params,
        partials: synth.partial_count(),
    })
}

/// Run the render command
///
/// # Arguments
/// * `input_path` - Path to the partial set (JSON)
/// * `output_path` - Path of the WAV file to write
/// * `options` - Command-line overrides
///
/// # Returns
/// Exit code: 0 on success
pub fn run(input_path: &str, output_path: &str, options: &RenderOptions) -> Result<ExitCode> {
    let start = Instant::now();
    println!("{} {}", "Rendering:".cyan().bold(), input_path);

    let LoadResult { set, source_hash } = load_partial_set(Path::new(input_path))
        .with_context(|| format!("Failed to load partial set: {}", input_path))?;
    println!("{} {}", "Source hash:".dimmed(), source_hash);

    let rendering = render_set(&set, options)?;
    let sample_rate = rendering.params.sample_rate.round() as u32;
    let wav = WavResult::from_samples(&rendering.samples, sample_rate);
    wav.save(output_path)
        .with_context(|| format!("Failed to write WAV file: {}", output_path))?;

    println!(
        "{} {} partials, {} samples ({:.3} s at {} Hz)",
        "Rendered:".green().bold(),
        rendering.partials,
        wav.num_samples,
        wav.duration_seconds(),
        wav.sample_rate
    );
    println!("{} {:.4}", "Peak:".dimmed(), wav.peak);
    if wav.peak > 1.0 {
        println!("  {} output clips; rerun with --normalize", "!".yellow());
    }
    println!("{} {}", "PCM hash:".dimmed(), wav.pcm_hash);
    println!("{} {} in {:?}", "Wrote".green(), output_path, start.elapsed());

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use resynth_core::{ControlPoint, Partial};

    fn set() -> PartialSet {
        PartialSet {
            params: SynthParams::new(8000.0).with_fade_time(0.01),
            partials: vec![Partial::new(vec![
                ControlPoint::sinusoidal(0.0, 200.0, 0.5),
                ControlPoint::sinusoidal(0.2, 200.0, 0.5),
            ])],
        }
    }

    #[test]
    fn test_apply_overrides() {
        let options = RenderOptions {
            sample_rate: Some(44100.0),
            seed: Some(7),
            ..Default::default()
        };
        let params = options.apply(&SynthParams::new(8000.0).with_fade_time(0.02));
        assert_eq!(params.sample_rate, 44100.0);
        assert_eq!(params.noise_seed, 7);
        assert_eq!(params.fade_time, 0.02);
    }

    #[test]
    fn test_transpose_to_frequency_scale() {
        let octave_down = RenderOptions {
            transpose: Some(-12.0),
            ..Default::default()
        };
        assert!((octave_down.frequency_scale() - 0.5).abs() < 1e-12);
        assert_eq!(RenderOptions::default().frequency_scale(), 1.0);
    }

    #[test]
    fn test_render_set_length() {
        let rendering = render_set(&set(), &RenderOptions::default()).unwrap();
        // 0.2 s plus 10 ms fades, both end samples included
        assert_eq!(rendering.samples.len(), 1761);
        assert_eq!(rendering.partials, 1);
    }

    #[test]
    fn test_render_set_normalizes() {
        let options = RenderOptions {
            normalize: true,
            ..Default::default()
        };
        let rendering = render_set(&set(), &options).unwrap();
        assert!((wav::peak(&rendering.samples) - NORMALIZE_PEAK).abs() < 1e-12);
    }

    #[test]
    fn test_render_set_rejects_bad_options() {
        let zero_block = RenderOptions {
            block_size: 0,
            ..Default::default()
        };
        assert!(render_set(&set(), &zero_block).is_err());

        let bad_rate = RenderOptions {
            sample_rate: Some(-1.0),
            ..Default::default()
        };
        assert!(render_set(&set(), &bad_rate).is_err());
    }

    #[test]
    fn test_run_writes_wav() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("set.json");
        let output = tmp.path().join("out.wav");
        std::fs::write(&input, set().to_json_pretty().unwrap()).unwrap();

        run(
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            &RenderOptions::default(),
        )
        .unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(bytes.len(), 44 + 1761 * 2);
    }
}
