//! Settings store - header presets and remembered paths in `config.json`
//!
//! Loading never fails: a missing file is created with defaults, a malformed
//! file is reset to defaults, and missing or mistyped keys are back-filled.
//! Every such repair is reported in [`LoadedSettings::corrections`].

use crate::error::{DfqError, DfqResult};
use crate::types::{HeaderKey, HeaderRecord, DEFAULT_SAMPLE_COUNT};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Settings file name used when no path is configured
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

const KEY_OUTPUT_PATH: &str = "OutputPath";
const KEY_PRESETS: &str = "SystemSettings";
const KEY_LAST_IMPORT: &str = "LastExcelImportPath";

/// Persisted application settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    /// Last DFQ output directory
    #[serde(rename = "OutputPath")]
    pub output_path: String,
    /// Header presets
    #[serde(rename = "SystemSettings")]
    pub presets: Vec<HeaderRecord>,
    /// Directory of the last imported spreadsheet
    #[serde(rename = "LastExcelImportPath")]
    pub last_import_path: String,
    /// Keys written by other tools, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_path: String::new(),
            presets: default_presets(),
            last_import_path: String::new(),
            extra: Map::new(),
        }
    }
}

fn default_presets() -> Vec<HeaderRecord> {
    vec![HeaderRecord::new(
        "DefaultPartNumber",
        "DefaultPartName",
        "DefaultStation",
        "DefaultLine",
        DEFAULT_SAMPLE_COUNT,
    )]
}

impl Settings {
    /// Build settings from arbitrary JSON, repairing what is missing
    pub fn from_value(value: Value) -> (Self, Vec<String>) {
        let mut corrections = Vec::new();
        let Value::Object(mut root) = value else {
            corrections.push("settings root is not an object; defaults used".to_string());
            return (Self::default(), corrections);
        };

        let output_path = take_string(&mut root, KEY_OUTPUT_PATH, &mut corrections);
        let last_import_path = take_string(&mut root, KEY_LAST_IMPORT, &mut corrections);

        let presets = match root.remove(KEY_PRESETS) {
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .filter_map(|(i, item)| preset_from_value(i, item, &mut corrections))
                .collect(),
            Some(_) => {
                corrections.push(format!("{} is not a list; default presets used", KEY_PRESETS));
                default_presets()
            }
            None => {
                corrections.push(format!("{} missing; default presets used", KEY_PRESETS));
                default_presets()
            }
        };

        let settings = Self {
            output_path,
            presets,
            last_import_path,
            extra: root,
        };
        (settings, corrections)
    }

    /// Copy of a preset, ready to become a plan header
    pub fn preset(&self, index: usize) -> DfqResult<HeaderRecord> {
        self.presets.get(index).cloned().ok_or_else(|| {
            if self.presets.is_empty() {
                DfqError::Validation(
                    "No header presets configured. Add one with 'dfq presets add'.".to_string(),
                )
            } else {
                DfqError::Validation(format!(
                    "Preset {} does not exist ({} presets configured)",
                    index + 1,
                    self.presets.len()
                ))
            }
        })
    }

    /// Presets matching `term` in any field, with their indices
    pub fn search_presets(&self, term: &str) -> Vec<(usize, &HeaderRecord)> {
        self.presets
            .iter()
            .enumerate()
            .filter(|(_, p)| p.matches(term))
            .collect()
    }

    /// Replace the preset list using the preset-editor rules: rows with all
    /// four text fields blank are dropped, fields are trimmed and an empty
    /// sample count becomes the default.
    pub fn set_presets(&mut self, presets: Vec<HeaderRecord>) {
        self.presets = presets
            .into_iter()
            .map(|mut p| {
                for key in HeaderKey::EXPORT_ORDER {
                    let trimmed = p.get(key).trim().to_string();
                    p.set(key, trimmed);
                }
                p.normalize();
                p
            })
            .filter(|p| !p.is_blank())
            .collect();
    }

    pub fn add_preset(&mut self, preset: HeaderRecord) -> DfqResult<usize> {
        let mut presets = self.presets.clone();
        presets.push(preset);
        let before = presets.len();
        self.set_presets(presets);
        if self.presets.len() < before {
            return Err(DfqError::Validation(
                "Preset needs at least one of part number, part name, station or line".to_string(),
            ));
        }
        Ok(self.presets.len() - 1)
    }

    pub fn remove_preset(&mut self, index: usize) -> DfqResult<HeaderRecord> {
        self.preset(index)?;
        Ok(self.presets.remove(index))
    }
}

fn take_string(root: &mut Map<String, Value>, key: &str, corrections: &mut Vec<String>) -> String {
    match root.remove(key) {
        Some(Value::String(s)) => s,
        Some(other) => {
            corrections.push(format!("{} is not a string ({}); reset", key, other));
            String::new()
        }
        None => {
            corrections.push(format!("{} missing; set to empty", key));
            String::new()
        }
    }
}

fn preset_from_value(index: usize, item: Value, corrections: &mut Vec<String>) -> Option<HeaderRecord> {
    let Value::Object(fields) = item else {
        corrections.push(format!("preset {} is not an object; dropped", index));
        return None;
    };

    let mut preset = HeaderRecord::default();
    for key in HeaderKey::EXPORT_ORDER {
        let value = match fields.get(key.as_str()) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => {
                corrections.push(format!("preset {} {} has an unsupported type; cleared", index, key));
                String::new()
            }
            None => {
                corrections.push(format!("preset {} {} missing; back-filled", index, key));
                String::new()
            }
        };
        preset.set(key, value);
    }
    if preset.normalize() {
        corrections.push(format!(
            "preset {} K1004 empty; set to {}",
            index, DEFAULT_SAMPLE_COUNT
        ));
    }
    Some(preset)
}

/// Settings plus the repairs applied while loading them
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub corrections: Vec<String>,
}

/// JSON-file backed settings
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings. Never fails; see module docs.
    pub fn load(&self) -> LoadedSettings {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "Settings file not found, writing defaults");
                return self.reset(format!("{} not found; defaults written", self.path.display()));
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Settings file unreadable, using defaults");
                return self.reset(format!("{} unreadable ({}); reset to defaults", self.path.display(), e));
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(value) => {
                let (settings, corrections) = Settings::from_value(value);
                for c in &corrections {
                    debug!(correction = %c, "Settings repaired");
                }
                LoadedSettings {
                    settings,
                    corrections,
                }
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Malformed settings file, resetting");
                self.reset(format!("{} is malformed ({}); reset to defaults", self.path.display(), e))
            }
        }
    }

    fn reset(&self, reason: String) -> LoadedSettings {
        let settings = Settings::default();
        let mut corrections = vec![reason];
        if let Err(e) = self.save(&settings) {
            warn!(error = %e, "Could not write default settings");
            corrections.push(format!("defaults could not be saved: {}", e));
        }
        LoadedSettings {
            settings,
            corrections,
        }
    }

    /// Write settings as pretty-printed JSON
    pub fn save(&self, settings: &Settings) -> DfqResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Load, apply `change`, save. Returns the saved settings.
    pub fn update<F>(&self, change: F) -> DfqResult<Settings>
    where
        F: FnOnce(&mut Settings) -> DfqResult<()>,
    {
        let mut settings = self.load().settings;
        change(&mut settings)?;
        self.save(&settings)?;
        Ok(settings)
    }
}
