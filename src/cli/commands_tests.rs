use super::*;
use crate::config::SettingsStore;
use pretty_assertions::assert_eq;
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;

/// Workbook with 13 metadata rows followed by (name, nominal, upper, lower) rows
fn write_plan_workbook(path: &Path, rows: &[(&str, &str, &str, &str)]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Measurement plan").unwrap();
    for (i, (name, nominal, upper, lower)) in rows.iter().enumerate() {
        let row = (13 + i) as u32;
        sheet.write_string(row, 0, *name).unwrap();
        sheet.write_string(row, 2, *nominal).unwrap();
        sheet.write_string(row, 3, *upper).unwrap();
        sheet.write_string(row, 4, *lower).unwrap();
    }
    workbook.save(path).unwrap();
}

fn settings_with_preset() -> Settings {
    let mut settings = Settings::default();
    settings.presets = vec![HeaderRecord::new("P1", "Part One", "St1", "L1", "5")];
    settings
}

// =========================================================================
// Argument parsing
// =========================================================================

#[test]
fn test_parse_set_arg_parameter() {
    let (target, value) = EditSyntax::new().unwrap().parse_set("2.K2101=10.5").unwrap();
    assert_eq!(
        target,
        SetTarget::Parameter {
            index: 1,
            key: ParameterKey::Nominal
        }
    );
    assert_eq!(value, "10.5");
}

#[test]
fn test_parse_set_arg_header_and_empty_value() {
    let (target, value) = EditSyntax::new().unwrap().parse_set("header.K1001=").unwrap();
    assert_eq!(target, SetTarget::Header("K1001".to_string()));
    assert_eq!(value, "");
}

#[test]
fn test_parse_set_arg_rejects_bad_input() {
    let syntax = EditSyntax::new().unwrap();
    assert!(syntax.parse_set("K2101=1").is_err());
    assert!(syntax.parse_set("0.K2101=1").is_err());
    assert!(syntax.parse_set("1.K9999=1").is_err());
}

#[test]
fn test_parse_move_arg() {
    let syntax = EditSyntax::new().unwrap();
    assert_eq!(syntax.parse_move("3:up").unwrap(), (2, MoveDirection::Up));
    assert_eq!(syntax.parse_move("1:+1").unwrap(), (0, MoveDirection::Down));
    assert!(syntax.parse_move("1:left").is_err());
    assert!(syntax.parse_move("0:up").is_err());
}

// =========================================================================
// Edits
// =========================================================================

#[test]
fn test_apply_edits_in_order() {
    let mut plan = InspectionPlan::new(HeaderRecord::default());
    plan.import_parameters(vec![
        ParameterRecord::new("A").with_tolerances("0.1", ""),
        ParameterRecord::new("B"),
    ]);
    let edits = PlanEdits {
        set: vec!["1.K2005=9".to_string(), "header.K1001=PX".to_string()],
        check_upper: vec![1],
        check_lower: vec![1],
        deselect: vec![2],
        moves: vec!["2:up".to_string(), "1:up".to_string()],
    };

    let notes = apply_edits(&mut plan, &edits).unwrap();

    assert_eq!(plan.header().part_number, "PX");
    assert_eq!(plan.get(0).unwrap().name, "B");
    assert!(!plan.get(0).unwrap().selected_for_output);
    let a = plan.get(1).unwrap();
    assert_eq!(a.importance_class, "0");
    assert_eq!(a.upper_natural_limit, NaturalLimit::Checked);
    assert_eq!(a.lower_natural_limit, NaturalLimit::Inapplicable);
    assert_eq!(notes.len(), 3, "{:?}", notes);
}

#[test]
fn test_apply_edits_blank_sample_count_falls_back() {
    let mut plan = InspectionPlan::new(HeaderRecord::new("P1", "", "", "", "7"));
    let edits = PlanEdits {
        set: vec!["header.K1004=".to_string()],
        ..Default::default()
    };
    apply_edits(&mut plan, &edits).unwrap();
    assert_eq!(plan.header().sample_count, "5");
    assert!(writer::render(&plan, true).contains(&"K1004 5".to_string()));
}

#[test]
fn test_apply_edits_index_out_of_range() {
    let mut plan = InspectionPlan::new(HeaderRecord::default());
    let edits = PlanEdits {
        deselect: vec![1],
        ..Default::default()
    };
    assert!(matches!(
        apply_edits(&mut plan, &edits),
        Err(DfqError::IndexOutOfRange { .. })
    ));
}

// =========================================================================
// Plan assembly
// =========================================================================

#[test]
fn test_prepare_plan_from_workbook() {
    let dir = TempDir::new().unwrap();
    let book = dir.path().join("plan.xlsx");
    write_plan_workbook(
        &book,
        &[("Flatness", "0.5", "", "0.1"), ("Diameter", "10", "0.02", "0.02")],
    );

    let prepared = prepare_plan(
        &settings_with_preset(),
        &[book],
        1,
        &PlanEdits::default(),
    )
    .unwrap();

    assert!(prepared.warnings.is_empty(), "{:?}", prepared.warnings);
    let plan = prepared.plan;
    assert_eq!(plan.header().part_number, "P1");
    assert_eq!(plan.len(), 2);
    let flatness = plan.get(0).unwrap();
    assert_eq!(flatness.upper_natural_limit, NaturalLimit::Inapplicable);
    assert_eq!(flatness.lower_natural_limit, NaturalLimit::Unchecked);
    assert_eq!(plan.get(1).unwrap().nominal_value, "10");
}

#[test]
fn test_prepare_plan_bad_preset() {
    let err = prepare_plan(&settings_with_preset(), &[], 2, &PlanEdits::default()).unwrap_err();
    assert!(matches!(err, DfqError::Validation(_)));
    let err = prepare_plan(&settings_with_preset(), &[], 0, &PlanEdits::default()).unwrap_err();
    assert!(err.to_string().contains("start at 1"));
}

#[test]
fn test_prepare_plan_unreadable_file_is_warning() {
    let dir = TempDir::new().unwrap();
    let prepared = prepare_plan(
        &settings_with_preset(),
        &[dir.path().join("missing.xlsx")],
        1,
        &PlanEdits::default(),
    )
    .unwrap();
    assert!(prepared.plan.is_empty());
    assert!(!prepared.warnings.is_empty());
}

// =========================================================================
// Commands
// =========================================================================

#[test]
fn test_generate_writes_file_and_remembers_paths() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    let book = dir.path().join("plan.xlsx");
    let out = dir.path().join("out");
    write_plan_workbook(&book, &[("Runout", "0", "0.05", "")]);

    generate(
        &config,
        vec![book],
        1,
        PlanEdits::default(),
        Some(out.clone()),
    )
    .unwrap();

    let written: Vec<_> = std::fs::read_dir(&out).unwrap().collect();
    assert_eq!(written.len(), 1);
    let settings = SettingsStore::new(&config).load().settings;
    assert_eq!(settings.output_path, out.display().to_string());
    assert_eq!(settings.last_import_path, dir.path().display().to_string());
}

#[test]
fn test_generate_requires_output_and_selection() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    let book = dir.path().join("plan.xlsx");
    write_plan_workbook(&book, &[("Runout", "0", "0.05", "")]);

    let err = generate(&config, vec![book.clone()], 1, PlanEdits::default(), None).unwrap_err();
    assert!(err.to_string().contains("No output directory"));

    let edits = PlanEdits {
        deselect: vec![1],
        ..Default::default()
    };
    let err = generate(&config, vec![book], 1, edits, Some(dir.path().join("out"))).unwrap_err();
    assert!(err.to_string().contains("No parameters selected"));
    assert!(!dir.path().join("out").exists());

    let err = generate(&config, vec![], 1, PlanEdits::default(), None).unwrap_err();
    assert!(err.to_string().contains("No Excel files"));
}

#[test]
fn test_presets_add_and_remove() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");

    presets_add(&config, HeaderRecord::new("P9", "Cover", "OP20", "L3", "")).unwrap();
    let settings = SettingsStore::new(&config).load().settings;
    assert_eq!(settings.presets.len(), 2);
    assert_eq!(settings.presets[1].sample_count, "5");

    presets_remove(&config, 1).unwrap();
    let settings = SettingsStore::new(&config).load().settings;
    assert_eq!(settings.presets.len(), 1);
    assert_eq!(settings.presets[0].part_number, "P9");

    assert!(presets_remove(&config, 0).is_err());
    assert!(presets_add(&config, HeaderRecord::default()).is_err());
}

#[test]
fn test_inspect_reads_generated_content() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("x.dfq");
    std::fs::write(&file, "K0100 1\nK1001 P1\nK2001/1 Bore\n").unwrap();
    inspect(file).unwrap();
    assert!(inspect(dir.path().join("missing.dfq")).is_err());
}

#[test]
fn test_format_parameter_row_markers() {
    let mut param = ParameterRecord::new("Bore").with_tolerances("0.02", "");
    param.upper_natural_limit = NaturalLimit::Checked;
    let row = format_parameter_row(4, &param);
    assert!(row.starts_with("[x]   4. Bore"));
    assert!(row.contains("upper 0.02    N"));
    assert!(row.contains("lower -        "));
}
