//! Model file I/O.
//!
//! Models are stored as JSON in `<root>.model.json`.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use super::Model;

/// Extension appended to a model root name.
pub const MODEL_EXTENSION: &str = "model.json";

/// Path of the model file for a root name.
pub fn model_path(root: &str) -> PathBuf {
    PathBuf::from(format!("{root}.{MODEL_EXTENSION}"))
}

/// Strips a trailing `.model.json` (or `.`) so that both `wind` and
/// `wind.model.json` refer to the same model root.
pub fn root_name(arg: &str) -> String {
    let trimmed = arg
        .strip_suffix(&format!(".{MODEL_EXTENSION}"))
        .unwrap_or(arg);
    trimmed.strip_suffix('.').unwrap_or(trimmed).to_string()
}

/// Writes a model to a JSON file.
pub fn write_model(path: &Path, model: &Model) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, model)
        .with_context(|| format!("Failed to serialize model to: {}", path.display()))?;

    Ok(())
}

/// Reads and validates a model from a JSON file.
pub fn read_model(path: &Path) -> Result<Model> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    let reader = BufReader::new(file);

    let model: Model = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to deserialize model from: {}", path.display()))?;
    model
        .validate()
        .with_context(|| format!("Invalid model in: {}", path.display()))?;

    Ok(model)
}

/// Deserializes and validates a model from a JSON string.
pub fn from_model_string(json: &str) -> Result<Model> {
    let model: Model = serde_json::from_str(json).context("Failed to deserialize model")?;
    model.validate().context("Invalid model")?;
    Ok(model)
}
