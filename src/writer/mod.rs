//! DFQ serializer - inspection plan → K-field text lines → .dfq file

use crate::core::InspectionPlan;
use crate::error::{DfqError, DfqResult};
use crate::types::{HeaderKey, HeaderRecord, ParameterKey, ParameterRecord};
use chrono::{DateTime, Local};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Parameter-count key, first line of every DFQ file
pub const COUNT_KEY: &str = "K0100";

/// Extension of generated files
pub const DFQ_EXTENSION: &str = "dfq";

/// Render the plan as DFQ lines.
///
/// With `selected_only`, parameters not marked for output are left out and
/// the remaining ones are numbered consecutively from 1.
pub fn render(plan: &InspectionPlan, selected_only: bool) -> Vec<String> {
    let parameters: Vec<&ParameterRecord> = if selected_only {
        plan.selected_parameters().collect()
    } else {
        plan.parameters().iter().collect()
    };
    render_parts(plan.header(), &parameters)
}

/// Render a header and an explicit parameter list
pub fn render_parts(header: &HeaderRecord, parameters: &[&ParameterRecord]) -> Vec<String> {
    debug!(parameters = parameters.len(), "Rendering DFQ content");
    let mut lines = Vec::with_capacity(1 + HeaderKey::EXPORT_ORDER.len() + parameters.len() * ParameterKey::EXPORT_ORDER.len());

    lines.push(format!("{} {}", COUNT_KEY, parameters.len()));
    for key in HeaderKey::EXPORT_ORDER {
        lines.push(format!("{} {}", key, header.get(key)));
    }

    for (i, param) in parameters.iter().enumerate() {
        let index = i + 1;
        for key in ParameterKey::EXPORT_ORDER {
            lines.push(format!("{}/{} {}", key, index, param.value(key)));
        }
    }

    lines
}

/// Replace every character that is not alphanumeric, '_' or '-' with '_'
pub fn sanitize_component(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `{K1001}_{K1002}_{K1086}_{K1091}_{YYYYMMDDHHMMSS}.dfq`
pub fn dfq_file_name(header: &HeaderRecord, timestamp: DateTime<Local>) -> String {
    format!(
        "{}_{}_{}_{}_{}.{}",
        sanitize_component(&header.part_number),
        sanitize_component(&header.part_name),
        sanitize_component(&header.station),
        sanitize_component(&header.line),
        timestamp.format("%Y%m%d%H%M%S"),
        DFQ_EXTENSION
    )
}

/// Write DFQ lines into `output_dir` under a header-derived, timestamped name.
///
/// The directory is created if needed. Content goes to a temporary file in
/// the same directory first and is then renamed into place.
pub fn write_dfq_file(output_dir: &Path, lines: &[String], header: &HeaderRecord) -> DfqResult<PathBuf> {
    if !output_dir.is_dir() {
        fs::create_dir_all(output_dir).map_err(|source| DfqError::DirectoryCreate {
            path: output_dir.to_path_buf(),
            source,
        })?;
        info!(dir = %output_dir.display(), "Output directory created");
    }

    let file_path = output_dir.join(dfq_file_name(header, Local::now()));
    debug!(path = %file_path.display(), "Writing DFQ file");

    let write_err = |source: std::io::Error| DfqError::FileWrite {
        path: file_path.clone(),
        source,
    };

    let mut temp = NamedTempFile::new_in(output_dir).map_err(write_err)?;
    for line in lines {
        temp.write_all(line.as_bytes()).map_err(write_err)?;
        temp.write_all(b"\n").map_err(write_err)?;
    }
    temp.flush().map_err(write_err)?;
    temp.persist(&file_path).map_err(|e| write_err(e.error))?;

    info!(path = %file_path.display(), lines = lines.len(), "DFQ file written");
    Ok(file_path)
}
