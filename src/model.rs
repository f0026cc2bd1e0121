use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// A value extracted from a sheet or authored into a rule. `List` carries
/// the row groups produced by rectangular ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Bool(bool),
    Text(String),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(value) => write!(f, "{}", value),
            FieldValue::Bool(value) => write!(f, "{}", value),
            FieldValue::Text(value) => write!(f, "{}", value),
            FieldValue::List(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// One cell location, 1-indexed (row 1 / column 1 = "A1"). Legacy rule data
/// may carry zero or missing coordinates; those deserialize but are unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(default)]
pub struct CellPosition {
    pub row: i64,
    pub column: i64,
}

impl CellPosition {
    pub fn is_usable(&self) -> bool {
        self.row >= 1 && self.column >= 1
    }
}

/// An inclusive rectangle of cells, 1-indexed on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CellRange {
    pub start_row: i64,
    pub start_column: i64,
    pub end_row: i64,
    pub end_column: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeShape {
    SingleColumn,
    SingleRow,
    Rectangular,
}

impl CellRange {
    /// Single-column wins the tie for a 1x1 range, matching extraction order.
    pub fn shape(&self) -> RangeShape {
        if self.start_column == self.end_column {
            RangeShape::SingleColumn
        } else if self.start_row == self.end_row {
            RangeShape::SingleRow
        } else {
            RangeShape::Rectangular
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Cell,
    Range,
    Formula,
    Direct,
}

impl SourceKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "cell" => Some(SourceKind::Cell),
            "range" => Some(SourceKind::Range),
            "formula" => Some(SourceKind::Formula),
            "direct" => Some(SourceKind::Direct),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Cell => write!(f, "cell"),
            SourceKind::Range => write!(f, "range"),
            SourceKind::Formula => write!(f, "formula"),
            SourceKind::Direct => write!(f, "direct"),
        }
    }
}

/// A rule sub-structure that may arrive either as a native object or as the
/// JSON-encoded string an intermediate storage layer left behind.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum MaybeEncoded<T> {
    Value(T),
    Encoded(String),
}

impl<T> MaybeEncoded<T>
where
    T: DeserializeOwned + Clone,
{
    /// Resolve to the structured value, decoding the legacy string shape
    /// when needed.
    pub fn decode(&self) -> Result<T, serde_json::Error> {
        match self {
            MaybeEncoded::Value(value) => Ok(value.clone()),
            MaybeEncoded::Encoded(raw) => serde_json::from_str(raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ConditionKind {
    Equals,
    Contains,
    NotEquals,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
}

/// Authored filter condition. Carried through normalization for wire
/// fidelity with the rule editor; the engine does not evaluate conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    #[serde(default)]
    pub value: Option<FieldValue>,
}

/// One field definition within a sheet rule: how to source one output
/// field's value. This is the wire shape produced by the rule editor and
/// tolerated from older persisted data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MappingRule {
    pub id: String,
    pub name: String,
    pub target_field: Option<String>,
    #[serde(deserialize_with = "lenient_source_kind")]
    pub source_type: Option<SourceKind>,
    pub cell: Option<MaybeEncoded<CellPosition>>,
    pub range: Option<MaybeEncoded<CellRange>>,
    pub formula: Option<String>,
    pub direct_value: Option<String>,
    pub default_value: Option<FieldValue>,
    pub conditions: Option<MaybeEncoded<Vec<Condition>>>,
}

/// Older rule data carries `sourceType` values outside the four valid
/// kinds; those resolve to "absent" so the normalizer infers instead.
fn lenient_source_kind<'de, D>(deserializer: D) -> Result<Option<SourceKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(SourceKind::parse))
}

/// The subset of a rule applied against one sheet of the workbook.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SheetRule {
    pub id: String,
    pub name: String,
    pub sheet_index: i64,
    pub sheet_name: Option<String>,
    pub mapping_rules: Vec<MappingRule>,
}

/// Top-level user-authored rule. `folder_id` is organizational metadata for
/// the authoring layer; the engine never reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionRule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub sheet_rules: Vec<SheetRule>,
    pub folder_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// One output record. Field order is the authoring order of the mapping
/// rules that produced values; empty fields are omitted, never null.
pub type GeneratedRecord = IndexMap<String, FieldValue>;

/// Outcome of one rule invocation against one workbook. Plain data so it
/// survives a serialize round trip when cached for later display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub file_id: String,
    pub file_name: String,
    pub rule_id: String,
    pub rule_name: String,
    pub processed_at: String,
    pub records: Vec<GeneratedRecord>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ProcessingResult {
    pub fn summary(&self) -> ProcessedFileSummary {
        ProcessedFileSummary {
            id: self.file_id.clone(),
            name: self.file_name.clone(),
            processed_at: self.processed_at.clone(),
            rule_id: self.rule_id.clone(),
            rule_name: self.rule_name.clone(),
            records_generated: self.records.len(),
        }
    }
}

/// Result-history entry kept alongside full results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFileSummary {
    pub id: String,
    pub name: String,
    pub processed_at: String,
    pub rule_id: String,
    pub rule_name: String,
    pub records_generated: usize,
}
