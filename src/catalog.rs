//! Field catalogs for coded K-field enumerations
//!
//! Two fixed tables map DFQ codes to human-readable labels:
//! - `Importance` (K2005): characteristic class, codes "0".."4"
//! - `ToleranceType` (K2009): characteristic type, codes from the
//!   measurement-type table ("0" = undefined)
//!
//! Tables are ordered; the first entry of each table is its default code.

use crate::error::{DfqError, DfqResult};
use std::fmt;
use std::str::FromStr;

const IMPORTANCE: &[(&str, &str)] = &[
    ("0", "Minor"),
    ("1", "Slightly important"),
    ("2", "Important"),
    ("3", "Very important"),
    ("4", "Critical"),
];

const TOLERANCE_TYPE: &[(&str, &str)] = &[
    ("0", "Undefined"),
    ("100", "Straightness"),
    ("101", "Flatness"),
    ("102", "Roundness"),
    ("103", "Cylindricity"),
    ("104", "Profile of a line"),
    ("105", "Profile of a surface"),
    ("106", "Angularity"),
    ("107", "Perpendicularity"),
    ("108", "Parallelism"),
    ("109", "Position"),
    ("110", "Concentricity"),
    ("111", "Symmetry"),
    ("112", "Runout"),
    ("113", "Total runout"),
    ("114", "Composite coaxiality"),
    ("115", "Composite pattern position"),
    ("117", "Coordinate"),
    ("118", "Surface runout"),
    ("120", "X coordinate"),
    ("121", "Y coordinate"),
    ("122", "Z coordinate"),
    ("125", "Offset"),
    ("132", "Ovality"),
    ("140", "Angular zone evaluation"),
    ("145", "Surface finish"),
    ("149", "Pit depth"),
    ("150", "Maximum profile height Rz"),
    ("151", "Total profile height Rt"),
    ("152", "Arithmetic mean deviation Ra"),
    ("153", "Maximum primary profile height Pt"),
    ("154", "Profile peak height Rk"),
    ("155", "Reduced peak height"),
    ("156", "Reduced valley depth"),
    ("157", "Waviness depth Wt"),
    ("158", "Maximum waviness depth Wz"),
    ("159", "Maximum roughness depth Rmax"),
    ("160", "Material ratio Pmr"),
    ("161", "Material ratio Mr1"),
    ("162", "Material ratio Mr2"),
    ("170", "Oil groove depth"),
    ("171", "Oil groove angle"),
    ("172", "Oil groove pitch"),
    ("180", "Mean dominant waviness"),
    ("181", "Maximum dominant waviness"),
    ("182", "Dominant waviness length"),
    ("190", "Mean depth of roughness motifs"),
    ("191", "Maximum depth of profile irregularity"),
    ("192", "Mean width of roughness motifs"),
    ("193", "Material ratio Rmr"),
    ("194", "Material ratio tp"),
    ("200", "Distance"),
    ("201", "Radius"),
    ("202", "Diameter"),
    ("203", "Angle"),
    ("204", "Ellipse minor axis"),
    ("205", "Ellipse major axis"),
    ("206", "Cone angle"),
    ("207", "Inner diameter"),
    ("208", "Outer diameter"),
    ("210", "Ball measuring pin"),
    ("211", "Tooth height"),
    ("212", "Tooth thickness at reference cylinder"),
    ("214", "Tooth thickness deviation at reference cylinder"),
    ("215", "Tooth thickness variation"),
    ("216", "Span measurement over k teeth"),
    ("220", "Spring rate"),
    ("230", "Width"),
    ("231", "Squareness"),
    ("232", "Maximum diameter"),
    ("233", "Minimum diameter"),
    ("234", "Mean diameter"),
    ("250", "Temperature [°C]"),
    ("251", "Temperature [F]"),
    ("255", "Pressure [bar]"),
    ("260", "Coating thickness"),
    ("270", "Volume"),
    ("280", "Mass"),
    ("282", "Force"),
    ("285", "Hardness"),
    ("290", "Viscosity"),
    ("300", "Unbalance"),
    ("301", "Torque"),
    ("302", "Tightening torque"),
    ("303", "Additional torque"),
    ("310", "2D coordinate system (annotation)"),
    ("311", "3D coordinate system (annotation)"),
    ("320", "Rotation angle"),
    ("350", "Rotational speed"),
    ("360", "Angle error"),
    ("362", "Contour error"),
    ("364", "Velocity error"),
    ("370", "Form deviation"),
    ("372", "Form increment"),
    ("380", "Cam height"),
    ("501", "Resistance"),
    ("502", "Capacitance"),
    ("503", "Inductance"),
    ("504", "Phase shift"),
    ("505", "Frequency"),
    ("506", "Current"),
    ("507", "Voltage"),
    ("508", "Power"),
    ("509", "Field strength"),
    ("601", "Pitch"),
    ("602", "Pitch error"),
    ("604", "Cumulative pitch deviation"),
    ("605", "Cumulative pitch error"),
    ("606", "Pitch variation"),
    ("607", "Total pitch error"),
    ("608", "Base pitch deviation"),
    ("609", "Axial pitch deviation"),
    ("610", "Tip diameter"),
    ("612", "Root diameter"),
    ("617", "Space width at reference cylinder"),
    ("620", "Helix"),
    ("621", "Helix form error"),
    ("630", "Profile"),
    ("631", "Profile form error"),
    ("632", "Profile angle deviation"),
    ("633", "Profile twist"),
    ("640", "Tip relief"),
    ("641", "Profile crowning"),
    ("642", "Crowning amount"),
    ("643", "Crowning height"),
    ("651", "Helix angle deviation"),
    ("652", "Helix twist"),
    ("660", "Radial runout deviation"),
    ("661", "Eccentricity"),
    ("662", "Wobble"),
    ("663", "Coaxiality"),
    ("670", "Total radial composite deviation"),
    ("671", "Tooth-to-tooth radial composite deviation"),
    ("672", "Contact runout deviation"),
    ("673", "Radial dimension over two balls"),
    ("674", "Radial dimension over two rollers"),
    ("675", "Radial dimension over one ball"),
    ("676", "Radial dimension over one roller"),
    ("800", "Time"),
    ("805", "Quantity"),
    ("820", "Noise"),
    ("910", "Leak rate"),
    ("950", "Part cleanliness"),
    ("955", "Residual particles"),
];

/// One of the coded enumeration tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Catalog {
    /// K2005 - characteristic importance class
    Importance,
    /// K2009 - characteristic (tolerance) type
    ToleranceType,
}

impl Catalog {
    /// Catalog name used in messages and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Catalog::Importance => "importance",
            Catalog::ToleranceType => "tolerance-type",
        }
    }

    /// Ordered (code, label) pairs
    pub fn entries(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Catalog::Importance => IMPORTANCE,
            Catalog::ToleranceType => TOLERANCE_TYPE,
        }
    }

    /// First-defined code, used when a stored code is unknown
    pub fn default_code(&self) -> &'static str {
        self.entries()[0].0
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries().iter().any(|(c, _)| *c == code)
    }

    /// Resolve a code to its label
    pub fn label_for(&self, code: &str) -> DfqResult<&'static str> {
        self.entries()
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| *label)
            .ok_or_else(|| DfqError::UnknownCode {
                catalog: self.name(),
                code: code.to_string(),
            })
    }

    /// Resolve a label back to its code (exact match)
    pub fn code_for(&self, label: &str) -> DfqResult<&'static str> {
        self.entries()
            .iter()
            .find(|(_, l)| *l == label)
            .map(|(code, _)| *code)
            .ok_or_else(|| DfqError::UnknownLabel {
                catalog: self.name(),
                label: label.to_string(),
            })
    }

    /// Return `code` if it is defined, else the default code.
    /// The flag is true when a substitution happened.
    pub fn normalize(&self, code: &str) -> (&'static str, bool) {
        match self.entries().iter().find(|(c, _)| *c == code) {
            Some((c, _)) => (*c, false),
            None => (self.default_code(), true),
        }
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Catalog {
    type Err = DfqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "importance" | "k2005" => Ok(Catalog::Importance),
            "tolerance-type" | "tolerance_type" | "k2009" => Ok(Catalog::ToleranceType),
            other => Err(DfqError::Validation(format!(
                "Unknown catalog '{}' (expected importance or tolerance-type)",
                other
            ))),
        }
    }
}
