//! Error types for partial synthesis.

use thiserror::Error;

/// Result type for synthesis operations.
pub type SynthResult<T> = Result<T, SynthError>;

/// Errors raised while configuring the synthesizer or loading partials.
///
/// Streaming never produces errors; everything that can fail is checked when
/// the engine is built, when partials are loaded, or when a note is prepared.
#[derive(Debug, Error)]
pub enum SynthError {
    /// An engine parameter is out of range.
    #[error("invalid configuration '{name}': {message}")]
    InvalidConfiguration {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },

    /// A partial trajectory is malformed.
    #[error("invalid partial at index {index}: {message}")]
    InvalidInput {
        /// Position of the offending partial in the loaded set.
        index: usize,
        /// Label carried by the partial, if any.
        label: Option<i32>,
        /// Error message.
        message: String,
    },

    /// A partial set document could not be parsed.
    #[error("failed to parse partial set: {0}")]
    Parse(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynthError {
    /// Creates an invalid configuration error.
    pub fn config(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid input error for the partial at `index`.
    pub fn partial(index: usize, label: Option<i32>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            index,
            label,
            message: message.into(),
        }
    }

    /// Stable code identifying the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            SynthError::InvalidConfiguration { .. } => "SYNTH_001",
            SynthError::InvalidInput { .. } => "SYNTH_002",
            SynthError::Parse(_) => "SYNTH_003",
            SynthError::Io(_) => "SYNTH_004",
        }
    }
}
