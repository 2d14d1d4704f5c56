//! Excel importer - measurement-plan spreadsheets (.xlsx/.xls) → parameter records

use crate::error::{DfqError, DfqResult};
use crate::types::{ParameterRecord, SourceRef};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Rows 0..HEADER_ROWS hold plan metadata and are never read as parameters
pub const HEADER_ROWS: usize = 13;

const COL_NAME: usize = 0;
const COL_NOMINAL: usize = 2;
const COL_UPPER_TOL: usize = 3;
const COL_LOWER_TOL: usize = 4;

/// First worksheet of one source, every cell already converted to text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRows {
    /// Display name of the source (file name)
    pub source: String,
    pub rows: Vec<Vec<String>>,
}

impl SheetRows {
    pub fn new(source: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            source: source.into(),
            rows,
        }
    }
}

/// Outcome of an import: deduplicated parameters plus per-source warnings
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub parameters: Vec<ParameterRecord>,
    pub warnings: Vec<String>,
}

/// Reads parameter rows from one or more measurement-plan workbooks
pub struct ExcelImporter {
    paths: Vec<PathBuf>,
}

impl ExcelImporter {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            paths: paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
        }
    }

    /// Read every source and convert the rows. Unreadable sources become
    /// warnings; the remaining sources are still processed.
    pub fn import(&self) -> ImportReport {
        info!(sources = self.paths.len(), "Importing Excel files");
        let sheets = self
            .paths
            .iter()
            .map(|path| read_first_sheet(path))
            .collect();
        import_sheets(sheets)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read the first worksheet of an .xlsx/.xls file as text rows.
///
/// Row and column positions are absolute: leading empty rows are kept as
/// empty rows so the fixed metadata offset still applies.
pub fn read_first_sheet(path: &Path) -> DfqResult<SheetRows> {
    let name = file_name(path);
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if extension != "xlsx" && extension != "xls" {
        return Err(DfqError::Import(format!(
            "Unsupported file type: {}. Only .xls and .xlsx are supported.",
            name
        )));
    }

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| DfqError::Import(format!("Failed to open '{}': {}", name, e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first_sheet = sheet_names
        .first()
        .ok_or_else(|| DfqError::Import(format!("'{}' contains no worksheets", name)))?;

    let range = workbook
        .worksheet_range(first_sheet)
        .map_err(|e| DfqError::Import(format!("Failed to read sheet '{}' of '{}': {}", first_sheet, name, e)))?;

    debug!(file = %name, sheet = %first_sheet, "Worksheet loaded");
    Ok(SheetRows::new(name, range_to_rows(&range)))
}

fn range_to_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    let Some((end_row, end_col)) = range.end() else {
        return Vec::new();
    };
    (0..=end_row)
        .map(|row| {
            (0..=end_col)
                .map(|col| range.get_value((row, col)).map(cell_text).unwrap_or_default())
                .collect()
        })
        .collect()
}

/// Cell → trimmed text; empty and error cells become ""
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Convert already-read sheets (or their read failures) into parameters.
///
/// Parameters are deduplicated on (name, description) across all sources;
/// the first occurrence wins.
pub fn import_sheets(sheets: Vec<DfqResult<SheetRows>>) -> ImportReport {
    let source_count = sheets.len();
    let mut report = ImportReport::default();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for sheet in sheets {
        match sheet {
            Ok(sheet) => import_rows(&sheet, &mut seen, &mut report),
            Err(e) => {
                let message = match e {
                    DfqError::Import(msg) => msg,
                    other => other.to_string(),
                };
                warn!(%message, "Source skipped");
                report.warnings.push(message);
            }
        }
    }

    if report.parameters.is_empty() && report.warnings.is_empty() && source_count > 0 {
        report.warnings.push(format!(
            "No parameter data found from row {} onwards in any selected file, or all parameter names are empty.",
            HEADER_ROWS + 1
        ));
    }

    info!(
        parameters = report.parameters.len(),
        warnings = report.warnings.len(),
        "Import finished"
    );
    report
}

fn import_rows(sheet: &SheetRows, seen: &mut HashSet<(String, String)>, report: &mut ImportReport) {
    if sheet.rows.len() < HEADER_ROWS {
        let message = format!(
            "File '{}' has only {} rows; parameter data starts at row {}.",
            sheet.source,
            sheet.rows.len(),
            HEADER_ROWS + 1
        );
        warn!(%message, "Source skipped");
        report.warnings.push(message);
        return;
    }

    for (row_idx, row) in sheet.rows.iter().enumerate().skip(HEADER_ROWS) {
        let excel_row = row_idx + 1;
        let cell = |col: usize| row.get(col).map(|s| s.trim()).unwrap_or("");

        let name = cell(COL_NAME);
        if name.is_empty() {
            debug!(file = %sheet.source, row = excel_row, "Empty parameter name, row skipped");
            continue;
        }

        let mut param = ParameterRecord::new(name)
            .with_nominal(cell(COL_NOMINAL))
            .with_tolerances(cell(COL_UPPER_TOL), cell(COL_LOWER_TOL));

        if !seen.insert((param.name.clone(), param.description.clone())) {
            debug!(file = %sheet.source, row = excel_row, name, "Duplicate parameter dropped");
            continue;
        }

        param.source = Some(SourceRef {
            file: sheet.source.clone(),
            row: excel_row,
        });
        report.parameters.push(param);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NaturalLimit;
    use pretty_assertions::assert_eq;

    /// Sheet with the metadata block filled with noise and the given data rows
    fn sheet(source: &str, data: &[&[&str]]) -> SheetRows {
        let mut rows: Vec<Vec<String>> = (0..HEADER_ROWS)
            .map(|i| vec![format!("meta {}", i), "x".to_string()])
            .collect();
        rows.extend(
            data.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect()),
        );
        SheetRows::new(source, rows)
    }

    #[test]
    fn test_positional_mapping_and_seeded_flags() {
        let report = import_sheets(vec![Ok(sheet(
            "plan.xlsx",
            &[&["Flatness", "ignored", "0.5", "", "0.1"]],
        ))]);

        assert!(report.warnings.is_empty());
        assert_eq!(report.parameters.len(), 1);
        let p = &report.parameters[0];
        assert_eq!(p.name, "Flatness");
        assert_eq!(p.description, "Flatness");
        assert_eq!(p.nominal_value, "0.5");
        assert_eq!(p.upper_tolerance, "");
        assert_eq!(p.lower_tolerance, "0.1");
        assert_eq!(p.upper_natural_limit, NaturalLimit::Inapplicable);
        assert_eq!(p.lower_natural_limit, NaturalLimit::Unchecked);
        assert_eq!(p.importance_class, "0");
        assert_eq!(p.tolerance_type_code, "0");
        assert!(p.selected_for_output);
        assert_eq!(
            p.source,
            Some(SourceRef {
                file: "plan.xlsx".to_string(),
                row: 14
            })
        );
    }

    #[test]
    fn test_metadata_rows_always_skipped() {
        let mut rows: Vec<Vec<String>> = (0..HEADER_ROWS)
            .map(|_| vec!["Looks like a name".to_string(), String::new(), "1".to_string()])
            .collect();
        rows.push(vec!["Real".to_string()]);
        let report = import_sheets(vec![Ok(SheetRows::new("a.xlsx", rows))]);
        assert_eq!(report.parameters.len(), 1);
        assert_eq!(report.parameters[0].name, "Real");
    }

    #[test]
    fn test_short_rows_map_to_empty_text() {
        let report = import_sheets(vec![Ok(sheet("a.xlsx", &[&["Width"]]))]);
        let p = &report.parameters[0];
        assert_eq!(p.nominal_value, "");
        assert_eq!(p.upper_natural_limit, NaturalLimit::Inapplicable);
        assert_eq!(p.lower_natural_limit, NaturalLimit::Inapplicable);
    }

    #[test]
    fn test_blank_names_skipped_silently() {
        let report = import_sheets(vec![Ok(sheet(
            "a.xlsx",
            &[&["", "", "1"], &["   ", "", "2"], &["Depth", "", "3"]],
        ))]);
        assert!(report.warnings.is_empty());
        assert_eq!(report.parameters.len(), 1);
        assert_eq!(report.parameters[0].source.as_ref().unwrap().row, 16);
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        let report = import_sheets(vec![
            Ok(sheet("a.xlsx", &[&["Length", "", "10", "0.1", "-0.1"]])),
            Ok(sheet(
                "b.xlsx",
                &[&["Length", "", "12", "0.2", "-0.2"], &["Height", "", "5"]],
            )),
        ]);
        assert_eq!(report.parameters.len(), 2);
        assert_eq!(report.parameters[0].nominal_value, "10");
        assert_eq!(report.parameters[0].source.as_ref().unwrap().file, "a.xlsx");
        assert_eq!(report.parameters[1].name, "Height");
    }

    #[test]
    fn test_failed_source_does_not_stop_batch() {
        let report = import_sheets(vec![
            Err(DfqError::Import("Unsupported file type: notes.txt".to_string())),
            Ok(sheet("a.xlsx", &[&["Length"]])),
        ]);
        assert_eq!(report.warnings, vec!["Unsupported file type: notes.txt"]);
        assert_eq!(report.parameters.len(), 1);
    }

    #[test]
    fn test_short_file_warning() {
        let report = import_sheets(vec![Ok(SheetRows::new(
            "tiny.xlsx",
            vec![vec!["a".to_string()]; 5],
        ))]);
        assert_eq!(report.parameters.len(), 0);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("tiny.xlsx"));
    }

    #[test]
    fn test_catch_all_warning_when_nothing_found() {
        let report = import_sheets(vec![Ok(sheet("empty.xlsx", &[&["", "", ""]]))]);
        assert_eq!(report.parameters.len(), 0);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("row 14"));
    }

    #[test]
    fn test_no_sources_no_warnings() {
        let report = import_sheets(Vec::new());
        assert!(report.parameters.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = read_first_sheet(Path::new("/tmp/plan.csv")).unwrap_err();
        assert!(err.to_string().contains("plan.csv"));
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("  A1 ".to_string())), "A1");
        assert_eq!(cell_text(&Data::Float(0.5)), "0.5");
        assert_eq!(cell_text(&Data::Float(5.0)), "5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
    }
}
