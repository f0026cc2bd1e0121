use crate::grid::SheetGrid;
use crate::model::{CellRange, FieldValue, RangeShape, SourceKind};
use crate::normalize::NormalizedRule;
use crate::utils::cell_address;
use tracing::{debug, warn};

/// Whether a rule contributes a vector of values (range) or a single value
/// broadcast across the record set (cell, direct, formula).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleClass {
    Range,
    Scalar,
}

/// A rule carrying a resolved range is always a range rule, whatever its
/// declared `sourceType` says; older rule data relies on this.
pub fn classify(rule: &NormalizedRule) -> RuleClass {
    if rule.range.is_some() {
        RuleClass::Range
    } else {
        RuleClass::Scalar
    }
}

/// Partition one sheet's rules into range and scalar buckets, preserving
/// relative authoring order inside each bucket.
pub fn partition_rules<'a>(
    rules: &'a [NormalizedRule],
) -> (Vec<&'a NormalizedRule>, Vec<&'a NormalizedRule>) {
    rules
        .iter()
        .partition(|rule| classify(rule) == RuleClass::Range)
}

/// Extracted values for one output field. Scalar rules produce exactly one
/// slot; range rules produce their natural-length slot list, where `None`
/// marks a positional placeholder that must not materialize in records.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSeries {
    pub target_field: String,
    pub class: RuleClass,
    pub slots: Vec<Option<FieldValue>>,
}

impl FieldSeries {
    /// Count of positions that actually carry a value.
    pub fn populated(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

pub fn extract_field(grid: &SheetGrid, rule: &NormalizedRule) -> FieldSeries {
    let slots = match rule.range.as_ref() {
        Some(range) => extract_range(grid, rule, range),
        None => vec![extract_scalar(grid, rule)],
    };
    FieldSeries {
        target_field: rule.target_field.clone(),
        class: classify(rule),
        slots,
    }
}

/// Source a single value for a scalar rule. `None` means the field
/// contributes nothing to the record set.
fn extract_scalar(grid: &SheetGrid, rule: &NormalizedRule) -> Option<FieldValue> {
    match rule.source {
        SourceKind::Cell => {
            let position = match rule.cell {
                Some(position) if position.is_usable() => position,
                Some(position) => {
                    warn!(
                        rule = %rule.name,
                        row = position.row,
                        column = position.column,
                        "cell position is incomplete; falling back to default value"
                    );
                    return rule.default_value.clone();
                }
                None => return rule.default_value.clone(),
            };
            match grid.value_at(position.row, position.column) {
                Some(value) => {
                    debug!(
                        rule = %rule.name,
                        cell = %cell_address(position.row, position.column),
                        value = %value,
                        "cell value sourced"
                    );
                    Some(value.clone())
                }
                None => rule.default_value.clone(),
            }
        }
        // An explicit empty string is an intentional value; only a missing
        // directValue falls back to the default.
        SourceKind::Direct => rule
            .direct_value
            .clone()
            .map(FieldValue::Text)
            .or_else(|| rule.default_value.clone()),
        // Formula text passes through verbatim; it is never evaluated.
        SourceKind::Formula => rule.formula.clone().map(FieldValue::Text),
        // A range-kinded rule without a resolved range has nothing to read.
        SourceKind::Range => None,
    }
}

/// Walk a range according to its shape. The empty-handling asymmetry between
/// single-column and single-row ranges is inherited behavior that existing
/// rules depend on for their record counts; see the shape tests.
fn extract_range(
    grid: &SheetGrid,
    rule: &NormalizedRule,
    range: &CellRange,
) -> Vec<Option<FieldValue>> {
    match range.shape() {
        // One field value per generated record: blank rows are dropped so
        // they cannot produce spurious records.
        RangeShape::SingleColumn => {
            let mut slots = Vec::new();
            for row in range.start_row..=range.end_row {
                if !grid.has_row(row) {
                    continue;
                }
                if let Some(value) = grid.value_at(row, range.start_column) {
                    debug!(
                        rule = %rule.name,
                        cell = %cell_address(row, range.start_column),
                        value = %value,
                        "column range value"
                    );
                    slots.push(Some(value.clone()));
                }
            }
            slots
        }
        // Sibling fields read positionally: blanks stay as placeholders so
        // alignment with the other fields survives.
        RangeShape::SingleRow => {
            if !grid.has_row(range.start_row) {
                return Vec::new();
            }
            (range.start_column..=range.end_column)
                .map(|column| grid.value_at(range.start_row, column).cloned())
                .collect()
        }
        // Each populated row becomes one grouped element; rows past the
        // populated extent are skipped entirely.
        RangeShape::Rectangular => {
            let mut slots = Vec::new();
            for row in range.start_row..=range.end_row {
                if !grid.has_row(row) {
                    continue;
                }
                let group: Vec<FieldValue> = (range.start_column..=range.end_column)
                    .map(|column| {
                        grid.value_at(row, column)
                            .cloned()
                            .unwrap_or_else(|| FieldValue::Text(String::new()))
                    })
                    .collect();
                slots.push(Some(FieldValue::List(group)));
            }
            slots
        }
    }
}
