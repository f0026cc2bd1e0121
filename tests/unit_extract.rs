use cellmap::extract::{RuleClass, classify, extract_field, partition_rules};
use cellmap::model::{CellPosition, FieldValue, MaybeEncoded, SourceKind};
use cellmap::normalize::{normalize_rule, normalize_rules};

mod support;

#[test]
fn single_column_range_skips_empty_rows() {
    // A2:A5 with row 3 blank: three values, no placeholder for the blank.
    let grid = support::text_grid(&[
        &["Name"],
        &["Alice"],
        &[""],
        &["Bob"],
        &["Carol"],
    ]);
    let rule = normalize_rule(&support::range_rule("name", 2, 1, 5, 1));
    let series = extract_field(&grid, &rule);
    assert_eq!(
        series.slots,
        vec![
            Some(FieldValue::text("Alice")),
            Some(FieldValue::text("Bob")),
            Some(FieldValue::text("Carol")),
        ]
    );
}

#[test]
fn single_row_range_preserves_empty_cells_positionally() {
    // A1:D1 with C1 blank: four slots, placeholder kept at the C position.
    let grid = support::text_grid(&[&["a", "b", "", "d"]]);
    let rule = normalize_rule(&support::range_rule("row", 1, 1, 1, 4));
    let series = extract_field(&grid, &rule);
    assert_eq!(series.slots.len(), 4);
    assert_eq!(series.slots[0], Some(FieldValue::text("a")));
    assert_eq!(series.slots[2], None);
    assert_eq!(series.slots[3], Some(FieldValue::text("d")));
}

#[test]
fn single_row_range_beyond_extent_is_empty() {
    let grid = support::text_grid(&[&["a"]]);
    let rule = normalize_rule(&support::range_rule("row", 4, 1, 4, 3));
    assert!(extract_field(&grid, &rule).slots.is_empty());
}

#[test]
fn rectangular_range_groups_rows_and_keeps_inner_blanks() {
    let grid = support::text_grid(&[&["a", "b"], &["c", ""], &["e", "f"]]);
    let rule = normalize_rule(&support::range_rule("block", 1, 1, 3, 2));
    let series = extract_field(&grid, &rule);
    assert_eq!(series.slots.len(), 3);
    assert_eq!(
        series.slots[1],
        Some(FieldValue::List(vec![
            FieldValue::text("c"),
            FieldValue::text(""),
        ]))
    );
}

#[test]
fn rectangular_range_skips_rows_past_the_populated_extent() {
    let grid = support::text_grid(&[&["a", "b"], &["c", "d"]]);
    let rule = normalize_rule(&support::range_rule("block", 1, 1, 10, 2));
    assert_eq!(extract_field(&grid, &rule).slots.len(), 2);
}

#[test]
fn column_range_beyond_extent_produces_no_slots() {
    let grid = support::text_grid(&[&["a"], &["b"], &["c"]]);
    let rule = normalize_rule(&support::range_rule("tail", 5, 1, 6, 1));
    assert!(extract_field(&grid, &rule).slots.is_empty());
}

#[test]
fn reversed_range_bounds_iterate_to_nothing() {
    let grid = support::text_grid(&[&["a"], &["b"], &["c"]]);
    let rule = normalize_rule(&support::range_rule("upside down", 3, 1, 1, 1));
    assert!(extract_field(&grid, &rule).slots.is_empty());
}

#[test]
fn one_by_one_range_reads_as_a_column() {
    let grid = support::text_grid(&[&["only"]]);
    let rule = normalize_rule(&support::range_rule("single", 1, 1, 1, 1));
    assert_eq!(
        extract_field(&grid, &rule).slots,
        vec![Some(FieldValue::text("only"))]
    );
}

#[test]
fn cell_rule_reads_the_addressed_cell() {
    let grid = support::text_grid(&[&["Name", "Dept"], &["Alice", "Ops"]]);
    let rule = normalize_rule(&support::cell_rule("dept", 2, 2));
    assert_eq!(
        extract_field(&grid, &rule).slots,
        vec![Some(FieldValue::text("Ops"))]
    );
}

#[test]
fn empty_cell_falls_back_to_default_value() {
    let grid = support::text_grid(&[&["x", ""]]);
    let mut raw = support::cell_rule("status", 1, 2);
    raw.default_value = Some(FieldValue::text("unknown"));
    let rule = normalize_rule(&raw);
    assert_eq!(
        extract_field(&grid, &rule).slots,
        vec![Some(FieldValue::text("unknown"))]
    );
}

#[test]
fn empty_cell_without_default_contributes_nothing() {
    let grid = support::text_grid(&[&["x", ""]]);
    let rule = normalize_rule(&support::cell_rule("status", 1, 2));
    assert_eq!(extract_field(&grid, &rule).slots, vec![None]);
}

#[test]
fn out_of_bounds_cell_read_uses_default_not_panic() {
    let grid = support::text_grid(&[&["x"]]);
    let mut raw = support::cell_rule("status", 40, 40);
    raw.default_value = Some(FieldValue::text("fallback"));
    let rule = normalize_rule(&raw);
    assert_eq!(
        extract_field(&grid, &rule).slots,
        vec![Some(FieldValue::text("fallback"))]
    );
}

#[test]
fn incomplete_cell_position_uses_default() {
    let grid = support::text_grid(&[&["x"]]);
    let raw = cellmap::model::MappingRule {
        name: "status".to_string(),
        source_type: Some(SourceKind::Cell),
        cell: Some(MaybeEncoded::Value(CellPosition { row: 0, column: 0 })),
        default_value: Some(FieldValue::text("fallback")),
        ..Default::default()
    };
    let rule = normalize_rule(&raw);
    assert_eq!(
        extract_field(&grid, &rule).slots,
        vec![Some(FieldValue::text("fallback"))]
    );
}

#[test]
fn direct_empty_string_is_a_present_value() {
    let grid = support::text_grid(&[&["x"]]);
    let mut raw = support::direct_rule("marker", "");
    raw.default_value = Some(FieldValue::text("should not be used"));
    let rule = normalize_rule(&raw);
    assert_eq!(
        extract_field(&grid, &rule).slots,
        vec![Some(FieldValue::text(""))]
    );
}

#[test]
fn missing_direct_value_falls_back_to_default() {
    let grid = support::text_grid(&[&["x"]]);
    let raw = cellmap::model::MappingRule {
        name: "marker".to_string(),
        source_type: Some(SourceKind::Direct),
        default_value: Some(FieldValue::text("fallback")),
        ..Default::default()
    };
    let rule = normalize_rule(&raw);
    assert_eq!(
        extract_field(&grid, &rule).slots,
        vec![Some(FieldValue::text("fallback"))]
    );
}

#[test]
fn formula_text_passes_through_verbatim() {
    let grid = support::text_grid(&[&["x"]]);
    let rule = normalize_rule(&support::formula_rule("calc", "=SUM(A1:A9)"));
    assert_eq!(
        extract_field(&grid, &rule).slots,
        vec![Some(FieldValue::text("=SUM(A1:A9)"))]
    );
}

#[test]
fn range_kind_without_resolved_range_yields_nothing() {
    let grid = support::text_grid(&[&["x"]]);
    let raw = cellmap::model::MappingRule {
        name: "ghost".to_string(),
        source_type: Some(SourceKind::Range),
        ..Default::default()
    };
    let rule = normalize_rule(&raw);
    assert_eq!(classify(&rule), RuleClass::Scalar);
    assert_eq!(extract_field(&grid, &rule).slots, vec![None]);
}

#[test]
fn classification_follows_range_presence_not_declared_kind() {
    // A resolved range makes a range rule even under a cell sourceType.
    let mut raw = support::range_rule("sneaky", 1, 1, 3, 1);
    raw.source_type = Some(SourceKind::Cell);
    let rule = normalize_rule(&raw);
    assert_eq!(classify(&rule), RuleClass::Range);
}

#[test]
fn partition_keeps_relative_order_within_buckets() {
    let normalized = normalize_rules(&[
        support::direct_rule("s1", "a"),
        support::range_rule("r1", 1, 1, 2, 1),
        support::direct_rule("s2", "b"),
        support::range_rule("r2", 1, 2, 2, 2),
    ]);
    let (range_rules, scalar_rules) = partition_rules(&normalized);
    let range_names: Vec<&str> = range_rules.iter().map(|r| r.name.as_str()).collect();
    let scalar_names: Vec<&str> = scalar_rules.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(range_names, vec!["r1", "r2"]);
    assert_eq!(scalar_names, vec!["s1", "s2"]);
}
