//! Excel import for measurement-plan spreadsheets
//!
//! - First worksheet only
//! - Rows 1-13 are plan metadata and are skipped
//! - Columns A, C, D, E carry name, nominal, upper and lower tolerance

mod importer;

pub use importer::{
    import_sheets, read_first_sheet, ExcelImporter, ImportReport, SheetRows, HEADER_ROWS,
};
