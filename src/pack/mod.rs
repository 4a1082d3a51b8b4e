use crate::core::convert;
use crate::core::error::{AppError, ErrorCategory};
use crate::core::expressions::converter::Dialect;
use crate::utils::yaml;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// Backups of the original workflow and action metadata files. Removed on
// both success and failure, though an interrupted run may leave them
// behind; a later run prefers an existing backup over re-creating one.
pub const BACKUP_EXTENSION: &str = "orquestaconvert.bak.yaml";
// Converted output is staged here before being promoted over the original.
pub const TMP_EXTENSION: &str = "orquesta.temp.yaml";

pub const MISTRAL_RUNNER_TYPE: &str = "mistral-v2";
pub const ORQUESTA_RUNNER_TYPE: &str = "orquesta";

#[derive(Debug, Deserialize)]
struct ActionMetadata {
    runner_type: Option<String>,
    entry_point: Option<String>,
}

/// An action metadata file paired with the workflow file its entry point
/// names, relative to the actions directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowFile {
    pub action_file: PathBuf,
    pub workflow_file: PathBuf,
}

/// Failures keyed by message, so identical errors across many files render
/// as one issue with an affected-file list.
#[derive(Debug, Default)]
pub struct ConversionReport {
    failures: IndexMap<String, Vec<PathBuf>>,
}

impl ConversionReport {
    pub fn record_failure(&mut self, error: &AppError, workflow_file: &Path) {
        self.failures
            .entry(error.to_string())
            .or_default()
            .push(workflow_file.to_path_buf());
    }

    /// Number of distinct issues; doubles as the process exit code.
    pub fn distinct_failures(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn render(&self) -> String {
        if self.failures.is_empty() {
            return String::new();
        }
        let mut out = String::from("ERROR: Unable to convert all Mistral workflows.\n");
        for (issue, files) in &self.failures {
            out.push_str(&format!("ISSUE: {}\n", issue));
            out.push_str("Affected files:\n");
            for file in files {
                out.push_str(&format!("  - {}\n", file.display()));
            }
            out.push('\n');
        }
        out
    }
}

/// Scan `<actions_dir>/*.yaml` for action metadata whose runner matches,
/// resolving each entry point relative to the actions directory. Results
/// are sorted by action file path so runs are deterministic.
pub fn workflow_files(
    actions_dir: &Path,
    runner_type: &str,
) -> Result<Vec<WorkflowFile>, AppError> {
    let entries = fs::read_dir(actions_dir).map_err(|e| {
        AppError::from(e).with_context("actions-dir", actions_dir.display().to_string())
    })?;

    let mut action_files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("yaml")
        })
        .collect();
    action_files.sort();

    let mut matches = Vec::new();
    for action_file in action_files {
        let content = fs::read_to_string(&action_file)
            .map_err(|e| AppError::from(e).with_context("path", action_file.display().to_string()))?;
        let metadata: ActionMetadata = match serde_yaml::from_str(&content) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %action_file.display(), error = %e, "skipping unreadable action metadata");
                continue;
            }
        };

        if metadata.runner_type.as_deref() != Some(runner_type) {
            continue;
        }
        let Some(entry_point) = metadata.entry_point else {
            warn!(path = %action_file.display(), "action has no entry_point, skipping");
            continue;
        };

        matches.push(WorkflowFile {
            workflow_file: actions_dir.join(entry_point),
            action_file,
        });
    }

    Ok(matches)
}

/// Convert every Mistral workflow in the pack, one file at a time. Each
/// file either converts fully (workflow rewritten, metadata runner updated)
/// or is rolled back to its pre-conversion state; failures are collected
/// rather than aborting the batch.
pub fn convert_pack(
    actions_dir: &Path,
    dialect: Dialect,
    force: bool,
) -> Result<ConversionReport, AppError> {
    let mut report = ConversionReport::default();

    for entry in workflow_files(actions_dir, MISTRAL_RUNNER_TYPE)? {
        debug!(workflow = %entry.workflow_file.display(), "converting pack workflow");
        if let Err(e) = convert_pack_entry(&entry, dialect, force) {
            report.record_failure(&e, &entry.workflow_file);
        }
    }

    Ok(report)
}

fn backup_path(path: &Path) -> PathBuf {
    append_extension(path, BACKUP_EXTENSION)
}

fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn convert_pack_entry(entry: &WorkflowFile, dialect: Dialect, force: bool) -> Result<(), AppError> {
    let workflow_backup = backup_path(&entry.workflow_file);
    let action_backup = backup_path(&entry.action_file);

    let result = promote_conversion(entry, &workflow_backup, &action_backup, dialect, force);

    match result {
        Ok(()) => {
            let _ = fs::remove_file(&workflow_backup);
            let _ = fs::remove_file(&action_backup);
            Ok(())
        }
        Err(e) => {
            restore_backup(&workflow_backup, &entry.workflow_file);
            restore_backup(&action_backup, &entry.action_file);
            Err(e)
        }
    }
}

fn promote_conversion(
    entry: &WorkflowFile,
    workflow_backup: &Path,
    action_backup: &Path,
    dialect: Dialect,
    force: bool,
) -> Result<(), AppError> {
    let converted = convert::convert_file(&entry.workflow_file, dialect, force)?;

    let temp_file = append_extension(&entry.workflow_file, TMP_EXTENSION);
    fs::write(&temp_file, &converted)
        .map_err(|e| AppError::from(e).with_context("path", temp_file.display().to_string()))?;

    // An existing backup comes from a previous interrupted run and is more
    // likely a valid Mistral workflow than the current file; keep it.
    if !workflow_backup.is_file() {
        fs::rename(&entry.workflow_file, workflow_backup).map_err(|e| {
            AppError::from(e).with_context("path", entry.workflow_file.display().to_string())
        })?;
    }
    if !action_backup.is_file() {
        fs::copy(&entry.action_file, action_backup).map_err(|e| {
            AppError::from(e).with_context("path", entry.action_file.display().to_string())
        })?;
    }

    let action_data = rewrite_runner_type(&entry.action_file)?;

    fs::rename(&temp_file, &entry.workflow_file).map_err(|e| {
        AppError::from(e).with_context("path", entry.workflow_file.display().to_string())
    })?;
    fs::write(&entry.action_file, action_data).map_err(|e| {
        AppError::from(e).with_context("path", entry.action_file.display().to_string())
    })?;

    Ok(())
}

fn rewrite_runner_type(action_file: &Path) -> Result<String, AppError> {
    let mut document = yaml::read_file(action_file)?;
    let map = document.as_mapping_mut().ok_or_else(|| {
        AppError::new(
            ErrorCategory::Structural,
            format!("Action metadata '{}' is not a mapping", action_file.display()),
        )
        .with_code("WFC-PACK-001")
    })?;
    map.insert(Value::from("runner_type"), Value::from(ORQUESTA_RUNNER_TYPE));
    convert::render_document(&document)
}

fn restore_backup(backup: &Path, original: &Path) {
    if !backup.is_file() {
        return;
    }
    if original.is_file() {
        let _ = fs::remove_file(original);
    }
    if let Err(e) = fs::rename(backup, original) {
        warn!(
            backup = %backup.display(),
            original = %original.display(),
            error = %e,
            "failed to restore backup"
        );
    }
}
