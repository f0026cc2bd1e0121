use crate::extract::{FieldSeries, RuleClass};
use crate::model::GeneratedRecord;
use tracing::debug;

/// Zip one sheet's extracted field series into output records.
///
/// Range series set the record cardinality: the longest non-empty range
/// series defines `max_len`, shorter range series simply stop contributing,
/// and scalar series repeat their single value at every position. When no
/// range series produced any data, scalar values collapse into at most one
/// record. Positions where every field is absent yield no record at all, so
/// blank trailing rows never cascade into empty output rows.
pub fn assemble_records(series: &[FieldSeries]) -> Vec<GeneratedRecord> {
    let max_range_len = series
        .iter()
        .filter(|s| s.class == RuleClass::Range && !s.slots.is_empty())
        .map(|s| s.slots.len())
        .max();

    let max_len = match max_range_len {
        Some(len) => len,
        None => {
            let any_scalar_value = series
                .iter()
                .any(|s| s.class == RuleClass::Scalar && s.populated() > 0);
            usize::from(any_scalar_value)
        }
    };

    if max_len == 0 {
        debug!("no field produced values; emitting no records");
        return Vec::new();
    }

    let mut records = Vec::new();
    for index in 0..max_len {
        let mut record = GeneratedRecord::new();
        // Series arrive in authoring order, which fixes field order within
        // the record.
        for field in series {
            let slot = match field.class {
                RuleClass::Range => field.slots.get(index).cloned().flatten(),
                RuleClass::Scalar => field.slots.first().cloned().flatten(),
            };
            if let Some(value) = slot {
                record.insert(field.target_field.clone(), value);
            }
        }
        if !record.is_empty() {
            records.push(record);
        }
    }

    debug!(
        fields = series.len(),
        cardinality = max_len,
        records = records.len(),
        "assembled records"
    );
    records
}
