use crate::core::error::AppError;
use serde_yaml::Value;
use std::fs;
use std::path::Path;

/// Parse a YAML document. serde_yaml mappings preserve insertion order, so
/// key order survives the round trip without extra bookkeeping.
pub fn from_str(content: &str) -> Result<Value, AppError> {
    let value = serde_yaml::from_str(content)?;
    Ok(value)
}

pub fn read_file(path: &Path) -> Result<Value, AppError> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::from(e).with_context("path", path.display().to_string()))?;
    from_str(&content)
}

pub fn to_string(value: &Value) -> Result<String, AppError> {
    let rendered = serde_yaml::to_string(value)?;
    Ok(rendered)
}

pub fn write_file(path: &Path, value: &Value) -> Result<(), AppError> {
    let rendered = to_string(value)?;
    fs::write(path, rendered)
        .map_err(|e| AppError::from(e).with_context("path", path.display().to_string()))?;
    Ok(())
}
