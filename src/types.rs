use crate::error::DfqError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Sample count used when a header has none
pub const DEFAULT_SAMPLE_COUNT: &str = "5";

//==============================================================================
// Header
//==============================================================================

/// Header K-fields (one value per plan)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKey {
    /// K1001 - part number
    PartNumber,
    /// K1002 - part name
    PartName,
    /// K1004 - SPC sample count
    SampleCount,
    /// K1086 - station
    Station,
    /// K1091 - line
    Line,
}

impl HeaderKey {
    /// Export order of the header block
    pub const EXPORT_ORDER: [HeaderKey; 5] = [
        HeaderKey::PartNumber,
        HeaderKey::PartName,
        HeaderKey::SampleCount,
        HeaderKey::Station,
        HeaderKey::Line,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderKey::PartNumber => "K1001",
            HeaderKey::PartName => "K1002",
            HeaderKey::SampleCount => "K1004",
            HeaderKey::Station => "K1086",
            HeaderKey::Line => "K1091",
        }
    }
}

impl fmt::Display for HeaderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeaderKey {
    type Err = DfqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "K1001" | "PART_NUMBER" => Ok(HeaderKey::PartNumber),
            "K1002" | "PART_NAME" => Ok(HeaderKey::PartName),
            "K1004" | "SAMPLE_COUNT" => Ok(HeaderKey::SampleCount),
            "K1086" | "STATION" => Ok(HeaderKey::Station),
            "K1091" | "LINE" => Ok(HeaderKey::Line),
            _ => Err(DfqError::InvalidHeaderKey(s.to_string())),
        }
    }
}

fn default_sample_count() -> String {
    DEFAULT_SAMPLE_COUNT.to_string()
}

/// Inspection-plan header, also the shape of a saved header preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderRecord {
    #[serde(rename = "K1001")]
    pub part_number: String,
    #[serde(rename = "K1002")]
    pub part_name: String,
    #[serde(rename = "K1086")]
    pub station: String,
    #[serde(rename = "K1091")]
    pub line: String,
    #[serde(rename = "K1004")]
    pub sample_count: String,
}

impl Default for HeaderRecord {
    fn default() -> Self {
        Self {
            part_number: String::new(),
            part_name: String::new(),
            station: String::new(),
            line: String::new(),
            sample_count: default_sample_count(),
        }
    }
}

impl HeaderRecord {
    pub fn new(
        part_number: impl Into<String>,
        part_name: impl Into<String>,
        station: impl Into<String>,
        line: impl Into<String>,
        sample_count: impl Into<String>,
    ) -> Self {
        let mut header = Self {
            part_number: part_number.into(),
            part_name: part_name.into(),
            station: station.into(),
            line: line.into(),
            sample_count: sample_count.into(),
        };
        header.normalize();
        header
    }

    pub fn get(&self, key: HeaderKey) -> &str {
        match key {
            HeaderKey::PartNumber => &self.part_number,
            HeaderKey::PartName => &self.part_name,
            HeaderKey::SampleCount => &self.sample_count,
            HeaderKey::Station => &self.station,
            HeaderKey::Line => &self.line,
        }
    }

    pub fn set(&mut self, key: HeaderKey, value: impl Into<String>) {
        let value = value.into();
        match key {
            HeaderKey::PartNumber => self.part_number = value,
            HeaderKey::PartName => self.part_name = value,
            HeaderKey::SampleCount => self.sample_count = value,
            HeaderKey::Station => self.station = value,
            HeaderKey::Line => self.line = value,
        }
    }

    /// Back-fill an empty sample count. Returns true if anything changed.
    pub fn normalize(&mut self) -> bool {
        if self.sample_count.trim().is_empty() {
            self.sample_count = default_sample_count();
            return true;
        }
        false
    }

    /// True when all four text fields are blank (sample count ignored)
    pub fn is_blank(&self) -> bool {
        [&self.part_number, &self.part_name, &self.station, &self.line]
            .iter()
            .all(|v| v.trim().is_empty())
    }

    /// Case-insensitive substring match over all five fields
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        HeaderKey::EXPORT_ORDER
            .iter()
            .any(|key| self.get(*key).to_lowercase().contains(&term))
    }

    /// One-line summary for preset listings
    pub fn summary(&self) -> String {
        fn or_none(v: &str) -> &str {
            if v.is_empty() {
                "-"
            } else {
                v
            }
        }
        format!(
            "Part: {} / {} | Station: {} | Line: {} | Samples: {}",
            or_none(&self.part_number),
            or_none(&self.part_name),
            or_none(&self.station),
            or_none(&self.line),
            or_none(&self.sample_count),
        )
    }
}

//==============================================================================
// Natural limits
//==============================================================================

/// Which tolerance bound a natural-limit flag belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitSide {
    Upper,
    Lower,
}

impl FromStr for LimitSide {
    type Err = DfqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "upper" | "k2121" => Ok(LimitSide::Upper),
            "lower" | "k2120" => Ok(LimitSide::Lower),
            other => Err(DfqError::Validation(format!(
                "Unknown limit side '{}' (expected upper or lower)",
                other
            ))),
        }
    }
}

/// Natural-limit flag (K2121 / K2120)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NaturalLimit {
    /// "0" - tolerance is blank, the flag does not apply
    #[default]
    Inapplicable,
    /// "1" - tolerance present, limit not marked as natural
    Unchecked,
    /// "2" - tolerance present, limit marked as natural
    Checked,
}

impl NaturalLimit {
    pub fn code(&self) -> &'static str {
        match self {
            NaturalLimit::Inapplicable => "0",
            NaturalLimit::Unchecked => "1",
            NaturalLimit::Checked => "2",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(NaturalLimit::Inapplicable),
            "1" => Some(NaturalLimit::Unchecked),
            "2" => Some(NaturalLimit::Checked),
            _ => None,
        }
    }

    /// Import-time seed: "1" for a non-blank tolerance, else "0"
    pub fn seed(tolerance: &str) -> Self {
        if is_blank(tolerance) {
            NaturalLimit::Inapplicable
        } else {
            NaturalLimit::Unchecked
        }
    }

    /// Re-derive the flag after the tolerance text changed.
    ///
    /// A blank tolerance forces `Inapplicable`; a non-blank one promotes
    /// `Inapplicable` to `Unchecked` and otherwise keeps the current state.
    pub fn derive(self, tolerance: &str) -> Self {
        if is_blank(tolerance) {
            NaturalLimit::Inapplicable
        } else if self == NaturalLimit::Inapplicable {
            NaturalLimit::Unchecked
        } else {
            self
        }
    }

    pub fn is_applicable(&self) -> bool {
        *self != NaturalLimit::Inapplicable
    }
}

impl fmt::Display for NaturalLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

pub(crate) fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

//==============================================================================
// Parameters
//==============================================================================

/// Parameter K-fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKey {
    /// K2001 - characteristic name
    Name,
    /// K2002 - description
    Description,
    /// K2003 - measurement frequency
    MeasurementFrequency,
    /// K2005 - importance class (catalog)
    Importance,
    /// K2009 - tolerance type (catalog)
    ToleranceType,
    /// K2101 - nominal value
    Nominal,
    /// K2113 - upper tolerance
    UpperTolerance,
    /// K2112 - lower tolerance
    LowerTolerance,
    /// K2121 - upper natural limit flag
    UpperNaturalLimit,
    /// K2120 - lower natural limit flag
    LowerNaturalLimit,
    /// K2142 - inspection method
    InspectionMethod,
}

impl ParameterKey {
    /// Export order of a parameter block
    pub const EXPORT_ORDER: [ParameterKey; 11] = [
        ParameterKey::Name,
        ParameterKey::Description,
        ParameterKey::MeasurementFrequency,
        ParameterKey::Importance,
        ParameterKey::ToleranceType,
        ParameterKey::Nominal,
        ParameterKey::UpperTolerance,
        ParameterKey::LowerTolerance,
        ParameterKey::UpperNaturalLimit,
        ParameterKey::LowerNaturalLimit,
        ParameterKey::InspectionMethod,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKey::Name => "K2001",
            ParameterKey::Description => "K2002",
            ParameterKey::MeasurementFrequency => "K2003",
            ParameterKey::Importance => "K2005",
            ParameterKey::ToleranceType => "K2009",
            ParameterKey::Nominal => "K2101",
            ParameterKey::UpperTolerance => "K2113",
            ParameterKey::LowerTolerance => "K2112",
            ParameterKey::UpperNaturalLimit => "K2121",
            ParameterKey::LowerNaturalLimit => "K2120",
            ParameterKey::InspectionMethod => "K2142",
        }
    }

    /// Short human-readable field name
    pub fn label(&self) -> &'static str {
        match self {
            ParameterKey::Name => "name",
            ParameterKey::Description => "description",
            ParameterKey::MeasurementFrequency => "measurement frequency",
            ParameterKey::Importance => "importance",
            ParameterKey::ToleranceType => "tolerance type",
            ParameterKey::Nominal => "nominal",
            ParameterKey::UpperTolerance => "upper tolerance",
            ParameterKey::LowerTolerance => "lower tolerance",
            ParameterKey::UpperNaturalLimit => "upper natural limit",
            ParameterKey::LowerNaturalLimit => "lower natural limit",
            ParameterKey::InspectionMethod => "inspection method",
        }
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterKey {
    type Err = DfqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_uppercase();
        ParameterKey::EXPORT_ORDER
            .iter()
            .copied()
            .find(|k| k.as_str() == key || k.label().replace(' ', "_").to_ascii_uppercase() == key)
            .ok_or_else(|| DfqError::InvalidParameterKey(s.to_string()))
    }
}

/// Stable identifier of a parameter, independent of its position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterId(Uuid);

impl ParameterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ParameterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an imported parameter came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// File name (without directory)
    pub file: String,
    /// 1-based spreadsheet row
    pub row: usize,
}

/// One measured characteristic of the inspection plan
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRecord {
    pub id: ParameterId,
    pub name: String,
    pub description: String,
    pub measurement_frequency: String,
    pub importance_class: String,
    pub tolerance_type_code: String,
    pub nominal_value: String,
    pub upper_tolerance: String,
    pub lower_tolerance: String,
    pub upper_natural_limit: NaturalLimit,
    pub lower_natural_limit: NaturalLimit,
    pub inspection_method: String,
    pub selected_for_output: bool,
    pub source: Option<SourceRef>,
}

impl Default for ParameterRecord {
    fn default() -> Self {
        Self {
            id: ParameterId::new(),
            name: String::new(),
            description: String::new(),
            measurement_frequency: String::new(),
            importance_class: "0".to_string(),
            tolerance_type_code: "0".to_string(),
            nominal_value: String::new(),
            upper_tolerance: String::new(),
            lower_tolerance: String::new(),
            upper_natural_limit: NaturalLimit::Inapplicable,
            lower_natural_limit: NaturalLimit::Inapplicable,
            inspection_method: String::new(),
            selected_for_output: true,
            source: None,
        }
    }
}

impl ParameterRecord {
    /// New parameter with the given name; description starts equal to the name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: name.clone(),
            name,
            ..Default::default()
        }
    }

    /// Builder: set both tolerances and seed the natural-limit flags
    pub fn with_tolerances(mut self, upper: impl Into<String>, lower: impl Into<String>) -> Self {
        self.upper_tolerance = upper.into();
        self.lower_tolerance = lower.into();
        self.upper_natural_limit = NaturalLimit::seed(&self.upper_tolerance);
        self.lower_natural_limit = NaturalLimit::seed(&self.lower_tolerance);
        self
    }

    pub fn with_nominal(mut self, nominal: impl Into<String>) -> Self {
        self.nominal_value = nominal.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Current value of a K-field as it is exported
    pub fn value(&self, key: ParameterKey) -> &str {
        match key {
            ParameterKey::Name => &self.name,
            ParameterKey::Description => &self.description,
            ParameterKey::MeasurementFrequency => &self.measurement_frequency,
            ParameterKey::Importance => &self.importance_class,
            ParameterKey::ToleranceType => &self.tolerance_type_code,
            ParameterKey::Nominal => &self.nominal_value,
            ParameterKey::UpperTolerance => &self.upper_tolerance,
            ParameterKey::LowerTolerance => &self.lower_tolerance,
            ParameterKey::UpperNaturalLimit => self.upper_natural_limit.code(),
            ParameterKey::LowerNaturalLimit => self.lower_natural_limit.code(),
            ParameterKey::InspectionMethod => &self.inspection_method,
        }
    }

    pub fn tolerance(&self, side: LimitSide) -> &str {
        match side {
            LimitSide::Upper => &self.upper_tolerance,
            LimitSide::Lower => &self.lower_tolerance,
        }
    }

    pub fn natural_limit(&self, side: LimitSide) -> NaturalLimit {
        match side {
            LimitSide::Upper => self.upper_natural_limit,
            LimitSide::Lower => self.lower_natural_limit,
        }
    }

    pub(crate) fn natural_limit_mut(&mut self, side: LimitSide) -> &mut NaturalLimit {
        match side {
            LimitSide::Upper => &mut self.upper_natural_limit,
            LimitSide::Lower => &mut self.lower_natural_limit,
        }
    }

    /// Re-derive both natural-limit flags from the tolerance texts
    pub fn refresh_natural_limits(&mut self) {
        self.upper_natural_limit = self.upper_natural_limit.derive(&self.upper_tolerance);
        self.lower_natural_limit = self.lower_natural_limit.derive(&self.lower_tolerance);
    }

    /// Case-insensitive match of name or description; `term` must already be lowercase
    pub(crate) fn matches_lowercase(&self, term: &str) -> bool {
        term.is_empty()
            || self.name.to_lowercase().contains(term)
            || self.description.to_lowercase().contains(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_defaults() {
        let header = HeaderRecord::default();
        assert_eq!(header.part_number, "");
        assert_eq!(header.sample_count, "5");
    }

    #[test]
    fn test_header_new_backfills_sample_count() {
        let header = HeaderRecord::new("P1", "Part One", "St1", "L1", "  ");
        assert_eq!(header.sample_count, "5");
    }

    #[test]
    fn test_header_key_parse() {
        assert_eq!("K1001".parse::<HeaderKey>().unwrap(), HeaderKey::PartNumber);
        assert_eq!("k1091".parse::<HeaderKey>().unwrap(), HeaderKey::Line);
        assert_eq!("station".parse::<HeaderKey>().unwrap(), HeaderKey::Station);
        assert!(matches!(
            "K0100".parse::<HeaderKey>(),
            Err(DfqError::InvalidHeaderKey(_))
        ));
    }

    #[test]
    fn test_header_matches() {
        let header = HeaderRecord::new("P-100", "Housing", "OP20", "Line A", "5");
        assert!(header.matches("housing"));
        assert!(header.matches("op2"));
        assert!(header.matches(""));
        assert!(!header.matches("bracket"));
    }

    #[test]
    fn test_header_is_blank_ignores_sample_count() {
        assert!(HeaderRecord::default().is_blank());
        assert!(!HeaderRecord::new("", "", "St", "", "5").is_blank());
    }

    #[test]
    fn test_natural_limit_codes() {
        for flag in [
            NaturalLimit::Inapplicable,
            NaturalLimit::Unchecked,
            NaturalLimit::Checked,
        ] {
            assert_eq!(NaturalLimit::from_code(flag.code()), Some(flag));
        }
        assert_eq!(NaturalLimit::from_code("3"), None);
    }

    #[test]
    fn test_natural_limit_derive() {
        use NaturalLimit::*;
        assert_eq!(Checked.derive("  "), Inapplicable);
        assert_eq!(Inapplicable.derive("0.1"), Unchecked);
        assert_eq!(Unchecked.derive("0.1"), Unchecked);
        assert_eq!(Checked.derive("0.1"), Checked);
    }

    #[test]
    fn test_parameter_key_parse() {
        assert_eq!("K2113".parse::<ParameterKey>().unwrap(), ParameterKey::UpperTolerance);
        assert_eq!(
            "inspection_method".parse::<ParameterKey>().unwrap(),
            ParameterKey::InspectionMethod
        );
        assert!("K9999".parse::<ParameterKey>().is_err());
    }

    #[test]
    fn test_parameter_value_uses_flag_codes() {
        let param = ParameterRecord::new("Flatness").with_tolerances("", "0.1");
        assert_eq!(param.value(ParameterKey::UpperNaturalLimit), "0");
        assert_eq!(param.value(ParameterKey::LowerNaturalLimit), "1");
        assert_eq!(param.value(ParameterKey::Description), "Flatness");
        assert_eq!(param.value(ParameterKey::Importance), "0");
    }

    #[test]
    fn test_parameter_ids_are_unique() {
        let a = ParameterRecord::new("A");
        let b = ParameterRecord::new("A");
        assert_ne!(a.id, b.id);
    }
}
