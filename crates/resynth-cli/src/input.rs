//! Loading of partial set documents.
//!
//! Partial sets are JSON documents holding engine parameters and the partials
//! to render. The BLAKE3 hash of the file bytes is returned with the parsed
//! set so reports can identify the exact input.

use std::path::{Path, PathBuf};

use resynth_core::{PartialSet, SynthError};
use thiserror::Error;

/// Recognized partial set extensions.
pub const JSON_EXTENSIONS: &[&str] = &["json"];

/// Errors from loading a partial set.
#[derive(Debug, Error)]
pub enum InputError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid partial set document.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: SynthError,
    },

    /// The extension is not one we know how to load.
    #[error("unknown extension {extension:?} (expected .json)")]
    UnknownExtension { extension: Option<String> },
}

/// A parsed partial set and its provenance.
#[derive(Debug)]
pub struct LoadResult {
    /// The parsed document.
    pub set: PartialSet,
    /// BLAKE3 hash of the source bytes, hex encoded.
    pub source_hash: String,
}

/// Loads a partial set from a JSON file.
pub fn load_partial_set(path: &Path) -> Result<LoadResult, InputError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some(ext) if JSON_EXTENSIONS.contains(&ext) => {}
        _ => return Err(InputError::UnknownExtension { extension }),
    }

    let content = std::fs::read_to_string(path).map_err(|source| InputError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let source_hash = blake3::hash(content.as_bytes()).to_hex().to_string();
    let set = PartialSet::from_json(&content).map_err(|source| InputError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!(
        "loaded {} partials from {} ({})",
        set.partials.len(),
        path.display(),
        &source_hash[..12]
    );
    Ok(LoadResult { set, source_hash })
}
