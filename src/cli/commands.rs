use crate::catalog::Catalog;
use crate::config::{Settings, SettingsStore};
use crate::core::{FieldUpdate, InspectionPlan, MoveDirection, MoveOutcome};
use crate::error::{DfqError, DfqResult};
use crate::excel::ExcelImporter;
use crate::parser;
use crate::types::{HeaderRecord, LimitSide, NaturalLimit, ParameterKey, ParameterRecord};
use crate::writer;
use colored::Colorize;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SET_PATTERN: &str = r"^(?:(\d+)|header)\.(\w+)=(.*)$";
const MOVE_PATTERN: &str = r"^(\d+):(up|down|-1|\+1)$";

/// Plan edits given on the command line. All indices are 1-based.
#[derive(Debug, Clone, Default)]
pub struct PlanEdits {
    /// `INDEX.KEY=VALUE` or `header.KEY=VALUE`
    pub set: Vec<String>,
    pub deselect: Vec<usize>,
    pub check_upper: Vec<usize>,
    pub check_lower: Vec<usize>,
    /// `INDEX:up` / `INDEX:down`
    pub moves: Vec<String>,
}

/// Where a `--set` edit goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetTarget {
    Header(String),
    Parameter { index: usize, key: ParameterKey },
}

/// Plan built from presets, spreadsheets and edits, plus what went wrong on the way
#[derive(Debug)]
pub struct PreparedPlan {
    pub plan: InspectionPlan,
    pub warnings: Vec<String>,
}

//==============================================================================
// Argument parsing
//==============================================================================

/// Convert a user-facing 1-based index into a list position
fn to_position(index: usize, what: &str) -> DfqResult<usize> {
    index
        .checked_sub(1)
        .ok_or_else(|| DfqError::Validation(format!("{} numbers start at 1", what)))
}

fn compile(pattern: &str) -> DfqResult<Regex> {
    Regex::new(pattern).map_err(|e| DfqError::Validation(format!("invalid pattern: {}", e)))
}

/// Compiled `--set` and `--move` argument patterns
#[derive(Debug, Clone)]
pub struct EditSyntax {
    set: Regex,
    moves: Regex,
}

impl EditSyntax {
    pub fn new() -> DfqResult<Self> {
        Ok(Self {
            set: compile(SET_PATTERN)?,
            moves: compile(MOVE_PATTERN)?,
        })
    }

    /// Parse `INDEX.KEY=VALUE` (parameter) or `header.KEY=VALUE`
    pub fn parse_set(&self, arg: &str) -> DfqResult<(SetTarget, String)> {
        let caps = self.set.captures(arg).ok_or_else(|| {
            DfqError::Validation(format!(
                "Invalid --set '{}'. Expected INDEX.KEY=VALUE or header.KEY=VALUE",
                arg
            ))
        })?;
        let key = &caps[2];
        let value = caps[3].to_string();

        let target = match caps.get(1) {
            Some(index) => {
                let index: usize = index
                    .as_str()
                    .parse()
                    .map_err(|_| DfqError::Validation(format!("Invalid index in '{}'", arg)))?;
                SetTarget::Parameter {
                    index: to_position(index, "Parameter")?,
                    key: key.parse()?,
                }
            }
            None => SetTarget::Header(key.to_string()),
        };
        Ok((target, value))
    }

    /// Parse `INDEX:up|down`
    pub fn parse_move(&self, arg: &str) -> DfqResult<(usize, MoveDirection)> {
        let caps = self.moves.captures(arg).ok_or_else(|| {
            DfqError::Validation(format!("Invalid --move '{}'. Expected INDEX:up or INDEX:down", arg))
        })?;
        let index: usize = caps[1]
            .parse()
            .map_err(|_| DfqError::Validation(format!("Invalid index in '{}'", arg)))?;
        Ok((to_position(index, "Parameter")?, caps[2].parse()?))
    }
}

//==============================================================================
// Plan assembly
//==============================================================================

/// Apply command-line edits in a fixed order: field values, natural-limit
/// checks, deselection, then moves.
pub fn apply_edits(plan: &mut InspectionPlan, edits: &PlanEdits) -> DfqResult<Vec<String>> {
    let mut notes = Vec::new();
    let syntax = EditSyntax::new()?;

    for arg in &edits.set {
        match syntax.parse_set(arg)? {
            (SetTarget::Header(key), value) => plan.set_header_field(&key, &value)?,
            (SetTarget::Parameter { index, key }, value) => {
                match plan.set_parameter_field(index, key, &value)? {
                    FieldUpdate::Substituted { requested, stored } => notes.push(format!(
                        "Parameter {}: {} '{}' is not a known code, stored '{}'",
                        index + 1,
                        key,
                        requested,
                        stored
                    )),
                    FieldUpdate::LimitRederived { side, flag } => {
                        debug!(index, ?side, %flag, "Limit flag after edit")
                    }
                    FieldUpdate::Written => {}
                }
            }
        }
    }

    for (indices, side) in [
        (&edits.check_upper, LimitSide::Upper),
        (&edits.check_lower, LimitSide::Lower),
    ] {
        for &index in indices {
            let position = to_position(index, "Parameter")?;
            let flag = plan.set_natural_limit_checked(position, side, true)?;
            if flag == NaturalLimit::Inapplicable {
                notes.push(format!(
                    "Parameter {}: {:?} tolerance is blank, natural limit stays inapplicable",
                    index, side
                ));
            }
        }
    }

    for &index in &edits.deselect {
        plan.toggle_selection(to_position(index, "Parameter")?, false)?;
    }

    for arg in &edits.moves {
        let (position, direction) = syntax.parse_move(arg)?;
        if plan.move_parameter(position, direction)? == MoveOutcome::AtBoundary {
            notes.push(format!("Parameter {} is already at the list boundary", position + 1));
        }
    }

    Ok(notes)
}

/// Header from the chosen preset, parameters from the spreadsheets, then edits
pub fn prepare_plan(
    settings: &Settings,
    files: &[PathBuf],
    preset: usize,
    edits: &PlanEdits,
) -> DfqResult<PreparedPlan> {
    let header = settings.preset(to_position(preset, "Preset")?)?;
    let mut plan = InspectionPlan::new(header);

    let report = ExcelImporter::new(files).import();
    let mut warnings = report.warnings;
    for c in plan.import_parameters(report.parameters) {
        warnings.push(format!(
            "Parameter {}: {} '{}' replaced by '{}'",
            c.index + 1,
            c.key,
            c.from,
            c.to
        ));
    }

    warnings.extend(apply_edits(&mut plan, edits)?);
    Ok(PreparedPlan { plan, warnings })
}

fn load_settings(config: &Path) -> (SettingsStore, Settings) {
    let store = SettingsStore::new(config);
    let loaded = store.load();
    for c in &loaded.corrections {
        eprintln!("{} {}", "⚠️  Settings:".yellow(), c);
    }
    (store, loaded.settings)
}

//==============================================================================
// Display helpers
//==============================================================================

fn limit_marker(flag: NaturalLimit) -> &'static str {
    match flag {
        NaturalLimit::Inapplicable => " ",
        NaturalLimit::Unchecked => "-",
        NaturalLimit::Checked => "N",
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

/// One table row: selection, number, name, nominal, tolerances, limit markers
fn format_parameter_row(number: usize, param: &ParameterRecord) -> String {
    format!(
        "[{}] {:>3}. {:<24} nominal {:<10} upper {:<8}{} lower {:<8}{} class {} type {}",
        if param.selected_for_output { "x" } else { " " },
        number,
        param.name,
        or_dash(&param.nominal_value),
        or_dash(&param.upper_tolerance),
        limit_marker(param.upper_natural_limit),
        or_dash(&param.lower_tolerance),
        limit_marker(param.lower_natural_limit),
        param.importance_class,
        param.tolerance_type_code,
    )
}

fn print_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    println!("{}", "⚠️  Warnings:".bold().yellow());
    for w in warnings {
        println!("   {}", w.yellow());
    }
    println!();
}

fn print_parameters(plan: &InspectionPlan, filter: Option<&str>) {
    let visible = plan.filter_by_text(filter.unwrap_or(""));
    println!(
        "{} {} of {} selected",
        "📐 Parameters:".bold().cyan(),
        plan.selected_count(),
        plan.len()
    );
    if let Some(term) = filter {
        println!("   Filter: '{}' ({} shown)", term.bright_yellow(), visible.len());
    }
    for i in visible {
        if let Ok(param) = plan.get(i) {
            let row = format_parameter_row(i + 1, param);
            if param.selected_for_output {
                println!("   {}", row);
            } else {
                println!("   {}", row.dimmed());
            }
        }
    }
    println!();
}

//==============================================================================
// Commands
//==============================================================================

/// Execute the preview command
pub fn preview(
    config: &Path,
    files: Vec<PathBuf>,
    preset: usize,
    edits: PlanEdits,
    filter: Option<String>,
    all: bool,
) -> DfqResult<()> {
    if files.is_empty() {
        return Err(DfqError::Validation("No Excel files given".to_string()));
    }
    let (_, settings) = load_settings(config);
    let prepared = prepare_plan(&settings, &files, preset, &edits)?;
    let plan = &prepared.plan;

    println!("{}", format!("📋 {}", plan.display_label()).bold().green());
    println!("   Header: {}", plan.header().summary());
    println!();

    print_warnings(&prepared.warnings);
    print_parameters(plan, filter.as_deref());

    println!("{}", "📄 DFQ content:".bold().cyan());
    for line in writer::render(plan, !all) {
        println!("   {}", line);
    }
    Ok(())
}

/// Execute the generate command
pub fn generate(
    config: &Path,
    files: Vec<PathBuf>,
    preset: usize,
    edits: PlanEdits,
    output: Option<PathBuf>,
) -> DfqResult<()> {
    if files.is_empty() {
        return Err(DfqError::Validation("No Excel files given".to_string()));
    }
    let (store, settings) = load_settings(config);

    let output_dir = match output {
        Some(dir) => dir,
        None if !settings.output_path.trim().is_empty() => PathBuf::from(settings.output_path.trim()),
        None => {
            return Err(DfqError::Validation(
                "No output directory. Pass --output or set one with a previous generate".to_string(),
            ))
        }
    };

    let prepared = prepare_plan(&settings, &files, preset, &edits)?;
    let plan = &prepared.plan;
    print_warnings(&prepared.warnings);

    if plan.selected_count() == 0 {
        return Err(DfqError::Validation(
            "No parameters selected for output".to_string(),
        ));
    }

    let lines = writer::render(plan, true);
    let path = writer::write_dfq_file(&output_dir, &lines, plan.header())?;

    let import_dir = files
        .first()
        .and_then(|f| f.parent())
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    store.update(|s| {
        s.output_path = output_dir.display().to_string();
        s.last_import_path = import_dir;
        Ok(())
    })?;
    info!(path = %path.display(), "Generated DFQ file");

    println!(
        "{} {} ({} parameters)",
        "✅ DFQ file written:".bold().green(),
        path.display(),
        plan.selected_count()
    );
    Ok(())
}

/// Execute `presets list`
pub fn presets_list(config: &Path, search: Option<String>) -> DfqResult<()> {
    let (_, settings) = load_settings(config);
    let hits = settings.search_presets(search.as_deref().unwrap_or(""));

    println!("{}", "🗂  Header presets".bold().green());
    if hits.is_empty() {
        println!("   {}", "No presets match".yellow());
    }
    for (i, preset) in hits {
        println!("   {:>3}. {}", i + 1, preset.summary());
    }
    Ok(())
}

/// Execute `presets add`
pub fn presets_add(config: &Path, preset: HeaderRecord) -> DfqResult<()> {
    let (store, mut settings) = load_settings(config);
    let index = settings.add_preset(preset)?;
    store.save(&settings)?;
    println!(
        "{} {}. {}",
        "✅ Preset added:".bold().green(),
        index + 1,
        settings.presets[index].summary()
    );
    Ok(())
}

/// Execute `presets remove`
pub fn presets_remove(config: &Path, number: usize) -> DfqResult<()> {
    let (store, mut settings) = load_settings(config);
    let removed = settings.remove_preset(to_position(number, "Preset")?)?;
    store.save(&settings)?;
    println!("{} {}", "🗑  Preset removed:".bold().green(), removed.summary());
    Ok(())
}

/// Execute the catalog command
pub fn catalog(catalog: Catalog) -> DfqResult<()> {
    println!("{}", format!("📚 {} catalog", catalog).bold().green());
    for (code, label) in catalog.entries() {
        let line = format!("{:>4}  {}", code, label);
        if *code == catalog.default_code() {
            println!("   {} {}", line, "(default)".dimmed());
        } else {
            println!("   {}", line);
        }
    }
    Ok(())
}

/// Execute the inspect command
pub fn inspect(file: PathBuf) -> DfqResult<()> {
    let doc = parser::parse_dfq_file(&file)?;

    println!("{}", "🔍 DFQ file".bold().green());
    println!("   File: {}", file.display());
    println!("   Header: {}", doc.header.summary());
    match doc.declared_count {
        Some(n) if doc.count_matches() => println!("   Parameters: {}", n),
        Some(n) => println!(
            "   Parameters: {} {}",
            doc.parameters.len(),
            format!("(K0100 declares {})", n).yellow()
        ),
        None => println!(
            "   Parameters: {} {}",
            doc.parameters.len(),
            "(K0100 missing)".yellow()
        ),
    }
    println!();

    for (i, param) in doc.parameters.iter().enumerate() {
        println!("   {}", format_parameter_row(i + 1, param));
    }
    if !doc.extra.is_empty() {
        println!();
        println!("   {} {} other records", "ℹ️ ".cyan(), doc.extra.len());
    }
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
