use crate::grid::SheetGrid;
use crate::model::FieldValue;
use anyhow::{Context, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use umya_spreadsheet::reader::xlsx;
use umya_spreadsheet::{Cell, Spreadsheet, Worksheet};

/// A parsed workbook plus lazily built per-sheet grids. The spreadsheet is
/// read-only for the lifetime of the context; grids are cached on first
/// access so repeated rule invocations against the same sheet reuse one
/// materialization.
pub struct WorkbookData {
    spreadsheet: Spreadsheet,
    grid_cache: RwLock<HashMap<String, Arc<SheetGrid>>>,
}

impl WorkbookData {
    pub fn load(path: &Path) -> Result<Self> {
        let spreadsheet =
            xlsx::read(path).with_context(|| format!("failed to parse workbook {:?}", path))?;
        Ok(Self::from_spreadsheet(spreadsheet))
    }

    pub fn from_spreadsheet(spreadsheet: Spreadsheet) -> Self {
        Self {
            spreadsheet,
            grid_cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.spreadsheet
            .get_sheet_collection()
            .iter()
            .map(|sheet| sheet.get_name().to_string())
            .collect()
    }

    pub fn sheet_count(&self) -> usize {
        self.spreadsheet.get_sheet_collection().len()
    }

    /// Grid for the named sheet, or `None` when the sheet does not exist.
    pub fn sheet_grid(&self, sheet_name: &str) -> Option<Arc<SheetGrid>> {
        if let Some(grid) = self.grid_cache.read().get(sheet_name) {
            return Some(grid.clone());
        }

        let mut writer = self.grid_cache.write();
        if let Some(grid) = writer.get(sheet_name) {
            return Some(grid.clone());
        }

        let sheet = self.spreadsheet.get_sheet_by_name(sheet_name)?;
        let grid = Arc::new(build_grid(sheet));
        writer.insert(sheet_name.to_string(), grid.clone());
        Some(grid)
    }
}

/// Dense row-major grid over the sheet's populated extent.
fn build_grid(sheet: &Worksheet) -> SheetGrid {
    let (max_column, max_row) = sheet.get_highest_column_and_row();
    let mut rows = Vec::with_capacity(max_row as usize);
    for row in 1..=max_row {
        let mut cells = Vec::with_capacity(max_column as usize);
        for column in 1..=max_column {
            cells.push(sheet.get_cell((column, row)).and_then(cell_to_value));
        }
        rows.push(cells);
    }
    SheetGrid::from_rows(rows)
}

/// Typed view of one cell's raw value: numeric parse first, boolean
/// literals next, text as the fallback. Blank cells are `None`.
pub fn cell_to_value(cell: &Cell) -> Option<FieldValue> {
    let raw = cell.get_value();
    if raw.is_empty() {
        return None;
    }
    if let Ok(number) = raw.parse::<f64>() {
        return Some(FieldValue::Number(number));
    }

    let lower = raw.to_ascii_lowercase();
    if lower == "true" {
        return Some(FieldValue::Bool(true));
    }
    if lower == "false" {
        return Some(FieldValue::Bool(false));
    }

    Some(FieldValue::Text(raw.to_string()))
}
