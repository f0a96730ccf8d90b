//! Persistence of fitted preprocessors.
//!
//! The artifact is the serde representation of a fitted
//! [`ColumnTransformer`] encoded with bincode's standard configuration.
//! Floats are stored bit-for-bit, so a reloaded preprocessor produces
//! exactly the same output as the one that was saved.

use crate::error::{PreprocessingError, Result, ResultExt};
use crate::pipeline::ColumnTransformer;
use bincode::error::DecodeError;
use std::fs;
use std::path::Path;
use tracing::info;

/// Encode a fitted transformer.
pub fn encode_artifact(transformer: &ColumnTransformer) -> Result<Vec<u8>> {
    if !transformer.is_fitted() {
        return Err(PreprocessingError::NotFitted("save"));
    }
    Ok(bincode::serde::encode_to_vec(
        transformer,
        bincode::config::standard(),
    )?)
}

/// Decode a transformer, rejecting trailing bytes and unfitted payloads.
pub fn decode_artifact(bytes: &[u8]) -> Result<ColumnTransformer> {
    let (transformer, read): (ColumnTransformer, usize) =
        bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;

    if read != bytes.len() {
        return Err(DecodeError::Other("trailing bytes after preprocessor artifact").into());
    }
    if !transformer.is_fitted() {
        return Err(PreprocessingError::NotFitted("load"));
    }
    Ok(transformer)
}

impl ColumnTransformer {
    /// Write the fitted transformer to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = encode_artifact(self)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)
            .map_err(PreprocessingError::from)
            .context(format!("Failed to write artifact {}", path.display()))?;

        info!("Saved preprocessor ({} bytes) to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Read a fitted transformer previously written by [`ColumnTransformer::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(PreprocessingError::from)
            .context(format!("Failed to read artifact {}", path.display()))?;

        let transformer = decode_artifact(&bytes)?;
        info!("Loaded preprocessor from {}", path.display());
        Ok(transformer)
    }
}
