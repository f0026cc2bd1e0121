use crate::assemble::assemble_records;
use crate::error::EngineError;
use crate::extract::{FieldSeries, extract_field, partition_rules};
use crate::model::{ExtractionRule, GeneratedRecord, ProcessingResult, SheetRule};
use crate::normalize::normalize_rules;
use crate::workbook::WorkbookData;
use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Run one rule against one workbook. This is the sole entry point of the
/// extraction pipeline: a pure function of (workbook, rule, sheet override)
/// that never returns an error. Fatal conditions are folded into the
/// result per the all-or-nothing contract, and anything softer is absorbed
/// upstream.
pub fn process_rule(
    workbook: &WorkbookData,
    file_name: &str,
    rule: &ExtractionRule,
    selected_sheet: Option<&str>,
) -> ProcessingResult {
    let file_id = Uuid::new_v4().to_string();
    let processed_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    info!(
        rule_id = %rule.id,
        rule = %rule.name,
        sheet_rules = rule.sheet_rules.len(),
        file = file_name,
        "processing rule"
    );

    let mut records: Vec<GeneratedRecord> = Vec::new();
    for sheet_rule in &rule.sheet_rules {
        match process_sheet_rule(workbook, sheet_rule, selected_sheet) {
            Ok(mut sheet_records) => records.append(&mut sheet_records),
            Err(error) => {
                // One fatal sheet error sinks the whole invocation; records
                // from earlier sheet rules are discarded rather than
                // returned as silent partial data.
                warn!(rule = %rule.name, sheet_rule = %sheet_rule.name, %error, "rule failed");
                return ProcessingResult {
                    file_id,
                    file_name: file_name.to_string(),
                    rule_id: rule.id.clone(),
                    rule_name: rule.name.clone(),
                    processed_at,
                    records: Vec::new(),
                    success: false,
                    error_message: Some(error.to_string()),
                };
            }
        }
    }

    info!(rule = %rule.name, records = records.len(), "rule processed");
    ProcessingResult {
        file_id,
        file_name: file_name.to_string(),
        rule_id: rule.id.clone(),
        rule_name: rule.name.clone(),
        processed_at,
        records,
        success: true,
        error_message: None,
    }
}

/// Normalize, classify, extract, and assemble one sheet rule's mappings.
pub fn process_sheet_rule(
    workbook: &WorkbookData,
    sheet_rule: &SheetRule,
    selected_sheet: Option<&str>,
) -> Result<Vec<GeneratedRecord>, EngineError> {
    let sheet_name = resolve_sheet_name(workbook, sheet_rule, selected_sheet)?;
    let grid = workbook
        .sheet_grid(&sheet_name)
        .ok_or_else(|| EngineError::SheetNotFound {
            name: sheet_name.clone(),
        })?;

    let normalized = normalize_rules(&sheet_rule.mapping_rules);
    let (range_rules, scalar_rules) = partition_rules(&normalized);
    debug!(
        sheet = %sheet_name,
        range_rules = range_rules.len(),
        scalar_rules = scalar_rules.len(),
        "classified mapping rules"
    );

    let series: Vec<FieldSeries> = normalized
        .iter()
        .map(|rule| extract_field(&grid, rule))
        .collect();

    let records = assemble_records(&series);
    debug!(sheet = %sheet_name, records = records.len(), "sheet rule processed");
    Ok(records)
}

/// Sheet resolution priority: the caller's explicit override, then the
/// sheet rule's own sheet name, then positional index into the workbook's
/// sheet list.
fn resolve_sheet_name(
    workbook: &WorkbookData,
    sheet_rule: &SheetRule,
    selected_sheet: Option<&str>,
) -> Result<String, EngineError> {
    if let Some(name) = selected_sheet {
        return Ok(name.to_string());
    }
    if let Some(name) = sheet_rule.sheet_name.as_ref().filter(|n| !n.is_empty()) {
        return Ok(name.clone());
    }

    let names = workbook.sheet_names();
    let index = sheet_rule.sheet_index;
    if index < 0 || index as usize >= names.len() {
        return Err(EngineError::SheetIndexOutOfRange {
            index,
            count: names.len(),
        });
    }
    Ok(names[index as usize].clone())
}

/// Per-rule progress for batch callers; `current` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress<'a> {
    pub current: usize,
    pub total: usize,
    pub rule_name: &'a str,
}

/// Run several rules sequentially against one workbook. Each rule gets its
/// own independent result; a failed rule is recorded inline and never
/// aborts the rules after it.
pub fn process_batch<F>(
    workbook: &WorkbookData,
    file_name: &str,
    rules: &[ExtractionRule],
    selected_sheet: Option<&str>,
    mut on_progress: F,
) -> Vec<ProcessingResult>
where
    F: FnMut(BatchProgress<'_>),
{
    let total = rules.len();
    rules
        .iter()
        .enumerate()
        .map(|(index, rule)| {
            on_progress(BatchProgress {
                current: index + 1,
                total,
                rule_name: &rule.name,
            });
            let result = process_rule(workbook, file_name, rule, selected_sheet);
            if !result.success {
                warn!(
                    rule = %rule.name,
                    error = result.error_message.as_deref().unwrap_or("unknown"),
                    "batch rule failed; continuing with remaining rules"
                );
            }
            result
        })
        .collect()
}
