#![allow(dead_code)]

use std::path::{Path, PathBuf};

use cellmap::grid::SheetGrid;
use cellmap::model::{
    CellPosition, CellRange, ExtractionRule, FieldValue, MappingRule, MaybeEncoded, SheetRule,
    SourceKind,
};
use tempfile::tempdir;
use umya_spreadsheet::{self, Spreadsheet};

pub fn build_workbook<F>(f: F) -> PathBuf
where
    F: FnOnce(&mut Spreadsheet),
{
    let tmp = tempdir().expect("tempdir");
    let path = tmp.path().join("fixture.xlsx");
    write_workbook_to_path(&path, f);
    std::mem::forget(tmp);
    path
}

pub fn write_workbook_to_path<F>(path: &Path, f: F)
where
    F: FnOnce(&mut Spreadsheet),
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create dir");
    }
    let mut book = umya_spreadsheet::new_file();
    f(&mut book);
    umya_spreadsheet::writer::xlsx::write(&book, path).expect("write workbook");
}

pub fn spreadsheet<F>(f: F) -> Spreadsheet
where
    F: FnOnce(&mut Spreadsheet),
{
    let mut book = umya_spreadsheet::new_file();
    f(&mut book);
    book
}

/// Text-only grid where `""` marks an empty cell.
pub fn text_grid(rows: &[&[&str]]) -> SheetGrid {
    SheetGrid::from_rows(
        rows.iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        if cell.is_empty() {
                            None
                        } else {
                            Some(FieldValue::Text(cell.to_string()))
                        }
                    })
                    .collect()
            })
            .collect(),
    )
}

pub fn range_rule(
    name: &str,
    start_row: i64,
    start_column: i64,
    end_row: i64,
    end_column: i64,
) -> MappingRule {
    MappingRule {
        id: format!("rule-{name}"),
        name: name.to_string(),
        source_type: Some(SourceKind::Range),
        range: Some(MaybeEncoded::Value(CellRange {
            start_row,
            start_column,
            end_row,
            end_column,
        })),
        ..Default::default()
    }
}

pub fn cell_rule(name: &str, row: i64, column: i64) -> MappingRule {
    MappingRule {
        id: format!("rule-{name}"),
        name: name.to_string(),
        source_type: Some(SourceKind::Cell),
        cell: Some(MaybeEncoded::Value(CellPosition { row, column })),
        ..Default::default()
    }
}

pub fn direct_rule(name: &str, value: &str) -> MappingRule {
    MappingRule {
        id: format!("rule-{name}"),
        name: name.to_string(),
        source_type: Some(SourceKind::Direct),
        direct_value: Some(value.to_string()),
        ..Default::default()
    }
}

pub fn formula_rule(name: &str, formula: &str) -> MappingRule {
    MappingRule {
        id: format!("rule-{name}"),
        name: name.to_string(),
        source_type: Some(SourceKind::Formula),
        formula: Some(formula.to_string()),
        ..Default::default()
    }
}

pub fn sheet_rule(mapping_rules: Vec<MappingRule>) -> SheetRule {
    SheetRule {
        id: "sheet-rule-1".to_string(),
        name: "first sheet".to_string(),
        sheet_index: 0,
        sheet_name: None,
        mapping_rules,
    }
}

pub fn extraction_rule(name: &str, sheet_rules: Vec<SheetRule>) -> ExtractionRule {
    ExtractionRule {
        id: format!("rule-{name}"),
        name: name.to_string(),
        description: String::new(),
        sheet_rules,
        ..Default::default()
    }
}
