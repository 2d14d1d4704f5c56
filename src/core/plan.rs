//! Inspection plan: active header plus the ordered parameter list
//!
//! Every mutation of plan state goes through a method on [`InspectionPlan`],
//! which keeps the derived values consistent:
//! - natural-limit flags follow their tolerance text
//! - enumeration codes always exist in their catalog
//! - the selected count is computed from the live list

use crate::catalog::Catalog;
use crate::error::{DfqError, DfqResult};
use crate::types::{
    is_blank, HeaderKey, HeaderRecord, LimitSide, NaturalLimit, ParameterId, ParameterKey,
    ParameterRecord,
};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Direction of a one-step reorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

impl MoveDirection {
    /// -1 = up, +1 = down
    pub fn from_offset(offset: i32) -> DfqResult<Self> {
        match offset {
            -1 => Ok(MoveDirection::Up),
            1 => Ok(MoveDirection::Down),
            other => Err(DfqError::Validation(format!(
                "Move direction must be -1 or +1, got {}",
                other
            ))),
        }
    }
}

impl FromStr for MoveDirection {
    type Err = DfqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "-1" => Ok(MoveDirection::Up),
            "down" | "+1" | "1" => Ok(MoveDirection::Down),
            other => Err(DfqError::Validation(format!(
                "Unknown move direction '{}' (expected up or down)",
                other
            ))),
        }
    }
}

/// Result of [`InspectionPlan::move_parameter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The parameter now sits at this index
    Moved { to: usize },
    /// Already first (moving up) or last (moving down); nothing changed
    AtBoundary,
}

/// Observable side effect of [`InspectionPlan::set_parameter_field`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    /// Value stored as given
    Written,
    /// Enumeration code was unknown; the catalog default was stored instead
    Substituted {
        requested: String,
        stored: &'static str,
    },
    /// A tolerance changed and its natural-limit flag was re-derived
    LimitRederived { side: LimitSide, flag: NaturalLimit },
}

/// A value the model corrected while taking in parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub index: usize,
    pub key: ParameterKey,
    pub from: String,
    pub to: String,
}

/// Header plus ordered parameter records, owned by one editing session
#[derive(Debug, Clone, Default)]
pub struct InspectionPlan {
    header: HeaderRecord,
    parameters: Vec<ParameterRecord>,
}

impl InspectionPlan {
    /// New plan with a copy of the given header and no parameters
    pub fn new(header: HeaderRecord) -> Self {
        Self {
            header,
            parameters: Vec::new(),
        }
    }

    pub fn header(&self) -> &HeaderRecord {
        &self.header
    }

    /// Replace the active header (e.g. another preset was selected)
    pub fn set_header(&mut self, mut header: HeaderRecord) {
        header.normalize();
        info!(part_number = %header.part_number, "Active header replaced");
        self.header = header;
    }

    /// Update one header field by K-key. An empty sample count falls back
    /// to the default.
    pub fn set_header_field(&mut self, key: &str, value: &str) -> DfqResult<()> {
        let key: HeaderKey = key.parse()?;
        debug!(%key, value, "Header field updated");
        self.header.set(key, value);
        if self.header.normalize() {
            info!(sample_count = %self.header.sample_count, "Empty K1004 back-filled");
        }
        Ok(())
    }

    /// Title of the plan, derived from the current part number
    pub fn display_label(&self) -> String {
        let part = if self.header.part_number.is_empty() {
            "N/A"
        } else {
            self.header.part_number.as_str()
        };
        format!("Inspection plan: {}", part)
    }

    pub fn parameters(&self) -> &[ParameterRecord] {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn get(&self, index: usize) -> DfqResult<&ParameterRecord> {
        self.parameters.get(index).ok_or(DfqError::IndexOutOfRange {
            index,
            len: self.parameters.len(),
        })
    }

    fn get_mut(&mut self, index: usize) -> DfqResult<&mut ParameterRecord> {
        let len = self.parameters.len();
        self.parameters
            .get_mut(index)
            .ok_or(DfqError::IndexOutOfRange { index, len })
    }

    /// Current position of a parameter
    pub fn index_of(&self, id: ParameterId) -> Option<usize> {
        self.parameters.iter().position(|p| p.id == id)
    }

    pub fn get_by_id(&self, id: ParameterId) -> Option<&ParameterRecord> {
        self.parameters.iter().find(|p| p.id == id)
    }

    /// Replace the parameter list.
    ///
    /// Each record is normalized on its own: natural-limit flags follow the
    /// tolerance text, unknown enumeration codes fall back to the catalog
    /// default. Every correction is returned.
    pub fn import_parameters(&mut self, records: Vec<ParameterRecord>) -> Vec<Correction> {
        let mut corrections = Vec::new();
        self.parameters = records;
        for (index, param) in self.parameters.iter_mut().enumerate() {
            normalize_record(index, param, &mut corrections);
        }
        info!(
            parameters = self.parameters.len(),
            corrections = corrections.len(),
            "Parameters imported"
        );
        corrections
    }

    /// Append a parameter; returns its index and any corrections
    pub fn add_parameter(&mut self, mut record: ParameterRecord) -> (usize, Vec<Correction>) {
        let index = self.parameters.len();
        let mut corrections = Vec::new();
        normalize_record(index, &mut record, &mut corrections);
        debug!(index, name = %record.name, "Parameter added");
        self.parameters.push(record);
        (index, corrections)
    }

    pub fn remove_parameter(&mut self, index: usize) -> DfqResult<ParameterRecord> {
        self.get(index)?;
        let removed = self.parameters.remove(index);
        debug!(index, name = %removed.name, "Parameter removed");
        Ok(removed)
    }

    /// Write one parameter field.
    ///
    /// Tolerance edits re-derive the matching natural-limit flag; enumeration
    /// keys go through the catalog. Natural-limit flags are not writable here,
    /// use [`InspectionPlan::set_natural_limit_checked`].
    pub fn set_parameter_field(
        &mut self,
        index: usize,
        key: ParameterKey,
        value: &str,
    ) -> DfqResult<FieldUpdate> {
        match key {
            ParameterKey::Importance => {
                return self.set_enumeration_update(index, Catalog::Importance, value)
            }
            ParameterKey::ToleranceType => {
                return self.set_enumeration_update(index, Catalog::ToleranceType, value)
            }
            ParameterKey::UpperNaturalLimit | ParameterKey::LowerNaturalLimit => {
                return Err(DfqError::InvalidParameterKey(key.as_str().to_string()))
            }
            _ => {}
        }

        let param = self.get_mut(index)?;
        let value = value.to_string();
        let side = match key {
            ParameterKey::Name => {
                param.name = value;
                None
            }
            ParameterKey::Description => {
                param.description = value;
                None
            }
            ParameterKey::MeasurementFrequency => {
                param.measurement_frequency = value;
                None
            }
            ParameterKey::Nominal => {
                param.nominal_value = value;
                None
            }
            ParameterKey::InspectionMethod => {
                param.inspection_method = value;
                None
            }
            ParameterKey::UpperTolerance => {
                param.upper_tolerance = value;
                Some(LimitSide::Upper)
            }
            ParameterKey::LowerTolerance => {
                param.lower_tolerance = value;
                Some(LimitSide::Lower)
            }
            ParameterKey::Importance
            | ParameterKey::ToleranceType
            | ParameterKey::UpperNaturalLimit
            | ParameterKey::LowerNaturalLimit => {
                return Err(DfqError::InvalidParameterKey(key.as_str().to_string()))
            }
        };
        debug!(index, %key, "Parameter field updated");

        match side {
            Some(side) => {
                let tolerance = param.tolerance(side).to_string();
                let flag = param.natural_limit_mut(side);
                *flag = flag.derive(&tolerance);
                let flag = *flag;
                debug!(index, ?side, %flag, "Natural limit re-derived");
                Ok(FieldUpdate::LimitRederived { side, flag })
            }
            None => Ok(FieldUpdate::Written),
        }
    }

    /// Set a catalog-coded field. Unknown codes are replaced by the catalog
    /// default; the return value is true when that happened.
    pub fn set_parameter_enumeration(
        &mut self,
        index: usize,
        catalog: Catalog,
        code: &str,
    ) -> DfqResult<bool> {
        let update = self.set_enumeration_update(index, catalog, code)?;
        Ok(matches!(update, FieldUpdate::Substituted { .. }))
    }

    fn set_enumeration_update(
        &mut self,
        index: usize,
        catalog: Catalog,
        code: &str,
    ) -> DfqResult<FieldUpdate> {
        let param = self.get_mut(index)?;
        let (stored, substituted) = catalog.normalize(code.trim());
        match catalog {
            Catalog::Importance => param.importance_class = stored.to_string(),
            Catalog::ToleranceType => param.tolerance_type_code = stored.to_string(),
        }
        if substituted {
            warn!(
                index,
                %catalog,
                requested = code,
                stored,
                "Unknown code replaced by catalog default"
            );
            Ok(FieldUpdate::Substituted {
                requested: code.to_string(),
                stored,
            })
        } else {
            debug!(index, %catalog, code = stored, "Enumeration updated");
            Ok(FieldUpdate::Written)
        }
    }

    /// Check or uncheck a natural limit. With a blank tolerance the flag is
    /// forced to inapplicable and `checked` is ignored.
    pub fn set_natural_limit_checked(
        &mut self,
        index: usize,
        side: LimitSide,
        checked: bool,
    ) -> DfqResult<NaturalLimit> {
        let param = self.get_mut(index)?;
        let flag = if is_blank(param.tolerance(side)) {
            NaturalLimit::Inapplicable
        } else if checked {
            NaturalLimit::Checked
        } else {
            NaturalLimit::Unchecked
        };
        *param.natural_limit_mut(side) = flag;
        debug!(index, ?side, %flag, "Natural limit set");
        Ok(flag)
    }

    pub fn toggle_selection(&mut self, index: usize, selected: bool) -> DfqResult<()> {
        let param = self.get_mut(index)?;
        param.selected_for_output = selected;
        debug!(index, selected, "Selection changed");
        Ok(())
    }

    /// Number of parameters marked for output (K0100 in the preview)
    pub fn selected_count(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| p.selected_for_output)
            .count()
    }

    pub fn selected_parameters(&self) -> impl Iterator<Item = &ParameterRecord> {
        self.parameters.iter().filter(|p| p.selected_for_output)
    }

    /// Move a parameter one step. Other parameters keep their relative order.
    pub fn move_parameter(
        &mut self,
        index: usize,
        direction: MoveDirection,
    ) -> DfqResult<MoveOutcome> {
        self.get(index)?;
        let target = match direction {
            MoveDirection::Up if index == 0 => None,
            MoveDirection::Up => Some(index - 1),
            MoveDirection::Down if index + 1 == self.parameters.len() => None,
            MoveDirection::Down => Some(index + 1),
        };
        match target {
            Some(to) => {
                self.parameters.swap(index, to);
                info!(from = index, to, name = %self.parameters[to].name, "Parameter moved");
                Ok(MoveOutcome::Moved { to })
            }
            None => {
                debug!(index, ?direction, "Parameter already at list boundary");
                Ok(MoveOutcome::AtBoundary)
            }
        }
    }

    /// Indices of parameters whose name or description contains `term`
    /// (case-insensitive). An empty term matches everything.
    pub fn filter_by_text(&self, term: &str) -> Vec<usize> {
        let term = term.trim().to_lowercase();
        self.parameters
            .iter()
            .enumerate()
            .filter(|(_, p)| p.matches_lowercase(&term))
            .map(|(i, _)| i)
            .collect()
    }
}

fn normalize_record(index: usize, param: &mut ParameterRecord, corrections: &mut Vec<Correction>) {
    for (key, catalog) in [
        (ParameterKey::Importance, Catalog::Importance),
        (ParameterKey::ToleranceType, Catalog::ToleranceType),
    ] {
        let field = match catalog {
            Catalog::Importance => &mut param.importance_class,
            Catalog::ToleranceType => &mut param.tolerance_type_code,
        };
        let (stored, substituted) = catalog.normalize(field.trim());
        if substituted {
            warn!(index, %key, value = %field, stored, "Code not in catalog, using default");
            corrections.push(Correction {
                index,
                key,
                from: std::mem::replace(field, stored.to_string()),
                to: stored.to_string(),
            });
        } else if field != stored {
            debug!(index, %key, value = %field, stored, "Code trimmed");
            corrections.push(Correction {
                index,
                key,
                from: std::mem::replace(field, stored.to_string()),
                to: stored.to_string(),
            });
        }
    }

    for (key, side) in [
        (ParameterKey::UpperNaturalLimit, LimitSide::Upper),
        (ParameterKey::LowerNaturalLimit, LimitSide::Lower),
    ] {
        let before = param.natural_limit(side);
        let after = before.derive(param.tolerance(side));
        if before != after {
            *param.natural_limit_mut(side) = after;
            corrections.push(Correction {
                index,
                key,
                from: before.code().to_string(),
                to: after.code().to_string(),
            });
        }
    }
}
