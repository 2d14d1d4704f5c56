//! CLI command handlers

pub mod commands;

pub use commands::{
    apply_edits, catalog, generate, inspect, prepare_plan, presets_add, presets_list,
    presets_remove, preview, PlanEdits, PreparedPlan,
};
