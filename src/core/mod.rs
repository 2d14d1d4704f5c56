//! Core editing model

pub mod plan;

pub use plan::{Correction, FieldUpdate, InspectionPlan, MoveDirection, MoveOutcome};
