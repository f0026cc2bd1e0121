use crate::model::{
    CellPosition, CellRange, Condition, FieldValue, MappingRule, MaybeEncoded, SourceKind,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// A mapping rule after normalization: legacy string-encoded sub-structures
/// decoded, the source kind resolved once, and the target field settled.
/// Downstream stages read only this shape and never re-derive the kind from
/// field presence.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRule {
    pub id: String,
    pub name: String,
    pub target_field: String,
    pub source: SourceKind,
    pub cell: Option<CellPosition>,
    pub range: Option<CellRange>,
    pub formula: Option<String>,
    pub direct_value: Option<String>,
    pub default_value: Option<FieldValue>,
    pub conditions: Vec<Condition>,
}

pub fn normalize_rules(rules: &[MappingRule]) -> Vec<NormalizedRule> {
    rules.iter().map(normalize_rule).collect()
}

pub fn normalize_rule(raw: &MappingRule) -> NormalizedRule {
    let cell = decode_field(raw.cell.as_ref(), "cell", &raw.name);
    let range = decode_field(raw.range.as_ref(), "range", &raw.name);
    let conditions: Vec<Condition> =
        decode_field(raw.conditions.as_ref(), "conditions", &raw.name).unwrap_or_default();

    let source = resolve_source_kind(raw, cell.as_ref(), range.as_ref());
    let target_field = raw
        .target_field
        .clone()
        .filter(|field| !field.is_empty())
        .unwrap_or_else(|| raw.name.clone());

    debug!(
        rule = %raw.name,
        source = %source,
        target_field = %target_field,
        has_cell = cell.is_some(),
        has_range = range.is_some(),
        "normalized mapping rule"
    );

    NormalizedRule {
        id: raw.id.clone(),
        name: raw.name.clone(),
        target_field,
        source,
        cell,
        range,
        formula: raw.formula.clone(),
        direct_value: raw.direct_value.clone(),
        default_value: raw.default_value.clone(),
        conditions,
    }
}

/// The single parse-if-string step shared by every dynamic sub-structure.
/// Malformed JSON is never fatal: the field is dropped and the rest of the
/// rule keeps normalizing.
fn decode_field<T>(field: Option<&MaybeEncoded<T>>, what: &str, rule_name: &str) -> Option<T>
where
    T: DeserializeOwned + Clone,
{
    let encoded = field?;
    match encoded.decode() {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(
                rule = %rule_name,
                field = what,
                %error,
                "dropping unparseable rule field"
            );
            None
        }
    }
}

/// Explicit `sourceType` wins when valid; otherwise the kind is inferred
/// from field presence with priority direct > range > cell > formula. The
/// order is load-bearing for older rule data and must not change.
fn resolve_source_kind(
    raw: &MappingRule,
    cell: Option<&CellPosition>,
    range: Option<&CellRange>,
) -> SourceKind {
    if let Some(kind) = raw.source_type {
        return kind;
    }
    if raw.direct_value.is_some() {
        SourceKind::Direct
    } else if range.is_some() {
        SourceKind::Range
    } else if cell.is_some() {
        SourceKind::Cell
    } else if raw.formula.is_some() {
        SourceKind::Formula
    } else {
        // Nothing to source from; direct is the terminal fallback.
        SourceKind::Direct
    }
}
