//! DFQ reader - K-field text lines → header + parameter blocks
//!
//! Accepts what [`crate::writer`] produces: one `KEY value` or
//! `KEY/index value` record per line. Keys this crate does not model are
//! kept in [`DfqDocument::extra`] instead of being rejected.

use crate::error::{DfqError, DfqResult};
use crate::types::{HeaderKey, HeaderRecord, NaturalLimit, ParameterKey, ParameterRecord};
use crate::writer::COUNT_KEY;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Parsed content of a DFQ file
#[derive(Debug, Clone, Default)]
pub struct DfqDocument {
    /// Value of K0100, if present
    pub declared_count: Option<usize>,
    pub header: HeaderRecord,
    /// Parameter blocks in index order
    pub parameters: Vec<ParameterRecord>,
    /// Records with keys outside the modelled set, in file order
    pub extra: Vec<(String, String)>,
}

impl DfqDocument {
    /// True when K0100 is present and agrees with the number of blocks
    pub fn count_matches(&self) -> bool {
        self.declared_count == Some(self.parameters.len())
    }
}

pub fn parse_dfq_file(path: &Path) -> DfqResult<DfqDocument> {
    let content = fs::read_to_string(path)?;
    parse_dfq(&content)
}

pub fn parse_dfq(text: &str) -> DfqResult<DfqDocument> {
    let mut doc = DfqDocument::default();
    let mut blocks: BTreeMap<usize, ParameterRecord> = BTreeMap::new();

    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        if raw.trim().is_empty() {
            continue;
        }

        let (key_part, value) = raw.split_once(' ').unwrap_or((raw, ""));
        let parse_err = |message: String| DfqError::Parse {
            line: line_no,
            message,
        };

        match key_part.split_once('/') {
            None if key_part == COUNT_KEY => {
                let count = value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| parse_err(format!("invalid parameter count '{}'", value)))?;
                doc.declared_count = Some(count);
            }
            None => match key_part.parse::<HeaderKey>() {
                Ok(key) => doc.header.set(key, value),
                Err(_) => doc.extra.push((key_part.to_string(), value.to_string())),
            },
            Some((key, index)) => {
                let index = index
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n >= 1)
                    .ok_or_else(|| parse_err(format!("invalid parameter index in '{}'", key_part)))?;
                let Ok(key) = key.parse::<ParameterKey>() else {
                    doc.extra.push((key_part.to_string(), value.to_string()));
                    continue;
                };
                let param = blocks.entry(index).or_default();
                set_raw(param, key, value).map_err(parse_err)?;
            }
        }
    }

    doc.parameters = blocks.into_values().collect();
    Ok(doc)
}

/// Store a value exactly as read, without plan-level normalization
fn set_raw(param: &mut ParameterRecord, key: ParameterKey, value: &str) -> Result<(), String> {
    let value = value.to_string();
    match key {
        ParameterKey::Name => param.name = value,
        ParameterKey::Description => param.description = value,
        ParameterKey::MeasurementFrequency => param.measurement_frequency = value,
        ParameterKey::Importance => param.importance_class = value,
        ParameterKey::ToleranceType => param.tolerance_type_code = value,
        ParameterKey::Nominal => param.nominal_value = value,
        ParameterKey::UpperTolerance => param.upper_tolerance = value,
        ParameterKey::LowerTolerance => param.lower_tolerance = value,
        ParameterKey::InspectionMethod => param.inspection_method = value,
        ParameterKey::UpperNaturalLimit | ParameterKey::LowerNaturalLimit => {
            let flag = NaturalLimit::from_code(&value)
                .ok_or_else(|| format!("invalid natural limit flag '{}' for {}", value, key))?;
            if key == ParameterKey::UpperNaturalLimit {
                param.upper_natural_limit = flag;
            } else {
                param.lower_natural_limit = flag;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_header_only() {
        let doc = parse_dfq("K0100 0\nK1001 P1\nK1002 Part One\nK1004 5\nK1086 St1\nK1091 L1\n")
            .unwrap();
        assert_eq!(doc.declared_count, Some(0));
        assert_eq!(doc.header, HeaderRecord::new("P1", "Part One", "St1", "L1", "5"));
        assert!(doc.parameters.is_empty());
        assert!(doc.count_matches());
    }

    #[test]
    fn test_parse_blocks_in_index_order() {
        let doc = parse_dfq("K0100 2\nK2001/2 Second\nK2001/1 First\nK2121/1 2\nK2003/1 \n").unwrap();
        assert_eq!(doc.parameters.len(), 2);
        assert_eq!(doc.parameters[0].name, "First");
        assert_eq!(doc.parameters[0].upper_natural_limit, NaturalLimit::Checked);
        assert_eq!(doc.parameters[0].measurement_frequency, "");
        assert_eq!(doc.parameters[1].name, "Second");
    }

    #[test]
    fn test_parse_keeps_unknown_keys() {
        let doc = parse_dfq("K1005 Product\nK2022/1 4\nK1001 P1\r\n").unwrap();
        assert_eq!(
            doc.extra,
            vec![
                ("K1005".to_string(), "Product".to_string()),
                ("K2022/1".to_string(), "4".to_string())
            ]
        );
        assert_eq!(doc.header.part_number, "P1");
        assert_eq!(doc.declared_count, None);
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = parse_dfq("K0100 x").unwrap_err();
        assert!(matches!(err, DfqError::Parse { line: 1, .. }));

        let err = parse_dfq("K0100 1\nK2001/0 A").unwrap_err();
        assert!(matches!(err, DfqError::Parse { line: 2, .. }));

        let err = parse_dfq("\nK2120/1 7").unwrap_err();
        assert!(matches!(err, DfqError::Parse { line: 2, .. }));
    }
}
