use crate::core::error::{AppError, ErrorCategory};
use crate::core::expressions::converter::Dialect;
use crate::core::spec;
use crate::core::workflow::WorkflowConverter;
use crate::utils::yaml;
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::debug;

/// Convert one Mistral workflow document to its Orquesta rendition.
///
/// The Mistral file nests the workflow body under its name next to the
/// top-level `version` key; the converted document is the body alone. Both
/// sides are syntax-inspected, the input before and the output after.
pub fn convert_str(content: &str, dialect: Dialect, force: bool) -> Result<String, AppError> {
    let document = yaml::from_str(content)?;
    let (name, body) = locate_workflow_body(&document)?;
    debug!(workflow = name.as_str(), "converting workflow");

    if let Some(diagnostic) = spec::mistral::inspect_syntax(&Value::Mapping(body.clone())) {
        return Err(AppError::new(
            ErrorCategory::Validation,
            format!("Mistral workflow '{}' failed validation: {}", name, diagnostic),
        )
        .with_code("WFC-VALIDATE-001"));
    }

    let converted = WorkflowConverter::new().convert(&body, dialect.converter(), force)?;

    let converted_value = Value::Mapping(converted);
    if let Some(diagnostic) = spec::orquesta::inspect_syntax(&converted_value) {
        return Err(AppError::new(
            ErrorCategory::Validation,
            format!("Converted workflow '{}' failed validation: {}", name, diagnostic),
        )
        .with_code("WFC-VALIDATE-002"));
    }

    render_document(&converted_value)
}

pub fn convert_file(path: &Path, dialect: Dialect, force: bool) -> Result<String, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::from(e).with_context("path", path.display().to_string()))?;
    convert_str(&content, dialect, force)
        .map_err(|e| e.with_context("path", path.display().to_string()))
}

/// Inspect an already-converted Orquesta workflow file.
pub fn validate_file(path: &Path) -> Result<(), AppError> {
    let document = yaml::read_file(path)?;
    if let Some(diagnostic) = spec::orquesta::inspect_syntax(&document) {
        return Err(AppError::new(
            ErrorCategory::Validation,
            format!("Workflow '{}' failed validation: {}", path.display(), diagnostic),
        )
        .with_code("WFC-VALIDATE-003")
        .with_context("path", path.display().to_string()));
    }
    Ok(())
}

/// Serialize with an explicit document start marker, matching the format
/// StackStorm packs conventionally use for workflow files.
pub fn render_document(value: &Value) -> Result<String, AppError> {
    Ok(format!("---\n{}", yaml::to_string(value)?))
}

/// A Mistral workflow file holds `version` plus exactly one workflow,
/// keyed by its name.
fn locate_workflow_body(document: &Value) -> Result<(String, Mapping), AppError> {
    let top = document.as_mapping().ok_or_else(|| {
        AppError::new(ErrorCategory::Structural, "Workflow document is not a mapping")
            .with_code("WFC-DOC-001")
    })?;

    let mut workflows = top
        .iter()
        .filter(|(k, _)| k.as_str() != Some("version"))
        .collect::<Vec<_>>();

    if workflows.len() != 1 {
        return Err(AppError::new(
            ErrorCategory::Structural,
            format!(
                "Expected exactly one workflow next to 'version', found {}",
                workflows.len()
            ),
        )
        .with_code("WFC-DOC-002"));
    }

    let (name, body) = workflows.remove(0);
    let name = name.as_str().ok_or_else(|| {
        AppError::new(ErrorCategory::Structural, "Workflow name is not a string")
            .with_code("WFC-DOC-003")
    })?;
    let body = body.as_mapping().ok_or_else(|| {
        AppError::new(
            ErrorCategory::Structural,
            format!("Workflow '{}' is not a mapping", name),
        )
        .with_code("WFC-DOC-004")
    })?;

    Ok((name.to_string(), body.clone()))
}
