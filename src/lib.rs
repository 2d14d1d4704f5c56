//! DFQ Forge - measurement plans from Excel to DFQ
//!
//! This library reads inspection characteristics from measurement-plan
//! spreadsheets, lets them be edited as an inspection plan, and writes the
//! plan as a DFQ K-field text file.
//!
//! # Features
//!
//! - Excel import (first worksheet, 13 metadata rows skipped)
//! - Header presets persisted in a JSON settings file
//! - Catalog-checked importance and tolerance-type codes
//! - Natural-limit flags derived from tolerance values
//! - DFQ export with timestamped file names, and a DFQ reader
//!
//! # Example
//!
//! ```no_run
//! use dfq_forge::core::InspectionPlan;
//! use dfq_forge::excel::ExcelImporter;
//! use dfq_forge::types::HeaderRecord;
//! use dfq_forge::writer;
//! use std::path::Path;
//!
//! let header = HeaderRecord::new("P-100", "Housing", "OP10", "L1", "5");
//! let mut plan = InspectionPlan::new(header);
//!
//! let report = ExcelImporter::new(["plan.xlsx"]).import();
//! plan.import_parameters(report.parameters);
//!
//! let lines = writer::render(&plan, true);
//! let path = writer::write_dfq_file(Path::new("out"), &lines, plan.header())?;
//! println!("Wrote {}", path.display());
//! # Ok::<(), dfq_forge::error::DfqError>(())
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod parser;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use catalog::Catalog;
pub use config::{Settings, SettingsStore};
pub use core::InspectionPlan;
pub use error::{DfqError, DfqResult};
pub use types::{HeaderRecord, NaturalLimit, ParameterKey, ParameterRecord};
