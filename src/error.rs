use thiserror::Error;

/// Fatal per-sheet conditions. Everything softer (unparseable rule fields,
/// out-of-bounds reads, missing defaults) is absorbed inside the pipeline
/// and never surfaces as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("sheet \"{name}\" not found in workbook")]
    SheetNotFound { name: String },

    #[error("sheet index {index} is out of range (workbook has {count} sheets)")]
    SheetIndexOutOfRange { index: i64, count: usize },
}
