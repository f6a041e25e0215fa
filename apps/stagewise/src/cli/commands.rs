//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::TableFormat;
use crate::config::DisplayConfig;
use stagewise_core::{
    Classification, ComparisonOutcome, ProgressError, SaveSnapshot, StageTable, compare_saves,
    is_binary_table, table_from_bytes, table_from_json, table_to_bytes, table_to_json,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum save file size (16 MB).
///
/// Real saves are a few hundred KB; anything far larger is not a save.
pub const MAX_SAVE_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Maximum stage-table file size (1 MB).
pub const MAX_TABLE_FILE_SIZE: u64 = 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), ProgressError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| ProgressError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(ProgressError::Io(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path to a canonical regular file.
///
/// Canonicalizing resolves `..` and symlinks and fails for missing paths.
fn validate_file_path(path: &Path) -> Result<PathBuf, ProgressError> {
    let canonical = path.canonicalize().map_err(|e| {
        ProgressError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(ProgressError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path: the parent must be an existing directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, ProgressError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        ProgressError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(ProgressError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| ProgressError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Read a file after path and size validation.
fn read_validated(path: &Path, max_size: u64) -> Result<Vec<u8>, ProgressError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, max_size)?;
    std::fs::read(&validated).map_err(|e| ProgressError::Io(format!("Read file: {}", e)))
}

/// Load a save snapshot from a JSON file.
pub fn load_save(path: &Path) -> Result<SaveSnapshot, ProgressError> {
    tracing::debug!("Loading save from {:?}", path);
    let bytes = read_validated(path, MAX_SAVE_FILE_SIZE)?;
    SaveSnapshot::from_slice(&bytes)
}

/// Load a stage table, detecting binary or JSON from the first bytes.
pub fn load_table(path: &Path) -> Result<StageTable, ProgressError> {
    let bytes = read_validated(path, MAX_TABLE_FILE_SIZE)?;

    if is_binary_table(&bytes) {
        tracing::debug!("Detected binary stage table in {:?}", path);
        table_from_bytes(&bytes)
    } else {
        let text = std::str::from_utf8(&bytes).map_err(|_| {
            ProgressError::Deserialization(
                "Table file is neither a binary table nor UTF-8 JSON".to_string(),
            )
        })?;
        table_from_json(text)
    }
}

/// Sub-progress as shown to the user: clamped unless the config says raw.
fn shown_progress(result: &Classification, display: &DisplayConfig) -> String {
    let value = if display.clamp {
        result.display_progress()
    } else {
        result.sub_progress
    };
    display.format_progress(value)
}

/// A classification as JSON, with the clamped progress alongside the raw one.
///
/// Uses the same `stage_id` field that compare and catch-up output carry.
fn classification_json(result: &Classification) -> Result<serde_json::Value, ProgressError> {
    let mut output =
        serde_json::to_value(result).map_err(|e| ProgressError::Serialization(e.to_string()))?;
    if let Some(fields) = output.as_object_mut() {
        fields.insert(
            "display_progress".to_string(),
            serde_json::json!(result.display_progress()),
        );
    }
    Ok(output)
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// CLASSIFY COMMAND
// =============================================================================

/// Classify one save.
pub fn cmd_classify(
    file: &Path,
    json_mode: bool,
    display: &DisplayConfig,
) -> Result<(), ProgressError> {
    let save = load_save(file)?;
    let result = StageTable::standard()?.classify(&save)?;

    if json_mode {
        print_json(&classification_json(&result)?);
        return Ok(());
    }

    println!("Stagewise Classification");
    println!("========================");
    println!("Save: {:?}", file);
    println!();
    println!("Stage:        {}", result.stage);
    println!("Focus on:     {}", result.suggested_resource);
    println!("Progress:     {}", shown_progress(&result, display));
    println!(
        "Raw progress: {}",
        display.format_progress(result.sub_progress)
    );

    match result.stage.next() {
        Some(next) => println!("Next Stage:   {}", next),
        None => println!("Terminal stage reached"),
    }

    Ok(())
}

// =============================================================================
// COMPARE COMMAND
// =============================================================================

/// Compare a local save with a cloud save.
///
/// A save that parses but lacks required fields yields an "unavailable"
/// outcome, not an error.
pub fn cmd_compare(
    local: &Path,
    cloud: &Path,
    json_mode: bool,
    display: &DisplayConfig,
) -> Result<(), ProgressError> {
    let local_save = load_save(local)?;
    let cloud_save = load_save(cloud)?;
    let comparison = compare_saves(&StageTable::standard()?, &local_save, &cloud_save);

    if json_mode {
        let output = serde_json::to_value(&comparison)
            .map_err(|e| ProgressError::Serialization(e.to_string()))?;
        print_json(&output);
        return Ok(());
    }

    println!("Stagewise Save Comparison");
    println!("=========================");
    println!();

    for (label, result) in [("Local", &comparison.local), ("Cloud", &comparison.cloud)] {
        match result {
            Some(r) => println!(
                "{}: {} ({})",
                label,
                r.stage,
                shown_progress(r, display)
            ),
            None => println!("{}: cannot be classified", label),
        }
    }
    println!();

    match &comparison.outcome {
        ComparisonOutcome::LocalAhead => println!("Local save is further along"),
        ComparisonOutcome::CloudAhead => println!("Cloud save is further along"),
        ComparisonOutcome::Equivalent => println!("Saves are equivalent"),
        ComparisonOutcome::Unavailable { reason } => {
            println!("Cannot compare: {}", reason);
        }
    }

    Ok(())
}

// =============================================================================
// CATCHUP COMMAND
// =============================================================================

/// Show the catch-up summary for a save.
pub fn cmd_catchup(
    file: &Path,
    json_mode: bool,
    display: &DisplayConfig,
) -> Result<(), ProgressError> {
    let save = load_save(file)?;
    let summary = StageTable::standard()?.catch_up(&save)?;

    if json_mode {
        let output = serde_json::to_value(&summary)
            .map_err(|e| ProgressError::Serialization(e.to_string()))?;
        print_json(&output);
        return Ok(());
    }

    println!("Stagewise Catch-Up");
    println!("==================");
    println!();

    for milestone in &summary.milestones {
        let marker = if milestone.id == summary.current.stage {
            ">"
        } else {
            " "
        };
        println!(
            "{} {:>2}  {:<24} {}",
            marker,
            milestone.id.index(),
            milestone.name,
            milestone.suggested_resource
        );
    }

    println!();
    println!(
        "Current: {} ({})",
        summary.current.name,
        shown_progress(&summary.current, display)
    );

    Ok(())
}

// =============================================================================
// STAGES COMMAND
// =============================================================================

/// List the standard stage table.
pub fn cmd_stages(json_mode: bool) -> Result<(), ProgressError> {
    let table = StageTable::standard()?;

    if json_mode {
        let output = serde_json::to_value(&table)
            .map_err(|e| ProgressError::Serialization(e.to_string()))?;
        print_json(&output);
        return Ok(());
    }

    println!("Stagewise Stages");
    println!("================");
    println!();
    for stage in table.stages() {
        println!(
            "{:>2}  {:<24} {}",
            stage.id.index(),
            stage.name,
            stage.suggested_resource
        );
    }

    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Write the standard stage table to `output`.
pub fn cmd_export(
    output: &Path,
    format: TableFormat,
    json_mode: bool,
) -> Result<(), ProgressError> {
    let validated_output = validate_output_path(output)?;
    let table = StageTable::standard()?;

    let data = match format {
        TableFormat::Json => table_to_json(&table)?.into_bytes(),
        TableFormat::Binary => table_to_bytes(&table)?,
    };

    std::fs::write(&validated_output, &data)
        .map_err(|e| ProgressError::Io(format!("Write file: {}", e)))?;

    tracing::info!(stages = table.len(), bytes = data.len(), "exported stage table");

    if json_mode {
        print_json(&serde_json::json!({
            "path": validated_output.to_string_lossy(),
            "format": format!("{:?}", format).to_lowercase(),
            "bytes": data.len(),
            "stages": table.len()
        }));
    } else {
        println!("Exported {} bytes to {:?}", data.len(), validated_output);
    }

    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Read and validate a stage-table file.
pub fn cmd_import(input: &Path, json_mode: bool) -> Result<(), ProgressError> {
    let table = load_table(input)?;
    let matches_standard = table.descriptors() == StageTable::standard()?.descriptors();

    if json_mode {
        print_json(&serde_json::json!({
            "stages": table.len(),
            "matches_standard": matches_standard,
            "table": table.descriptors()
        }));
        return Ok(());
    }

    println!("Imported stage table: {} stages", table.len());
    if matches_standard {
        println!("Table matches the standard table");
    } else {
        for stage in table.stages() {
            println!("  {}", stage.id);
        }
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
