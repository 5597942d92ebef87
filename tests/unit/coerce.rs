use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{json, Value};
use table_crafter::{
    coerce::{coerce, coerce_cell, normalize_temporal},
    schema::{ColumnKind, ColumnSet},
};

use crate::test_utils::fixtures::users_fields;

#[rstest]
#[case::empty_numeric_is_null("", ColumnKind::Numeric, Value::Null)]
#[case::numeric_text_is_kept("42", ColumnKind::Numeric, json!("42"))]
#[case::numeric_never_reformats_dates("2024-01-05T10:30:00", ColumnKind::Numeric, json!("2024-01-05T10:30:00"))]
#[case::empty_text_stays_empty("", ColumnKind::Text, json!(""))]
#[case::empty_temporal_stays_empty("", ColumnKind::Temporal, json!(""))]
#[case::iso_datetime_gets_storage_form("2024-01-05T10:30:00", ColumnKind::Temporal, json!("2024-01-05 10:30:00"))]
#[case::text_columns_normalize_dates_too("2024-01-05T10:30:00", ColumnKind::Text, json!("2024-01-05 10:30:00"))]
#[case::storage_date_is_untouched("2024-01-05", ColumnKind::Temporal, json!("2024-01-05"))]
#[case::storage_datetime_is_untouched("2024-01-05 10:30:00", ColumnKind::Other, json!("2024-01-05 10:30:00"))]
#[case::non_dates_pass_through("abc", ColumnKind::Text, json!("abc"))]
#[case::bare_numbers_are_not_dates("7", ColumnKind::Other, json!("7"))]
fn coerces_by_column_kind(#[case] raw: &str, #[case] kind: ColumnKind, #[case] expected: Value) {
    assert_eq!(coerce(raw, kind), expected);
}

#[rstest]
#[case("Jan 5, 2024", "2024-01-05")]
#[case("January 5, 2024", "2024-01-05")]
#[case("2024/01/05", "2024-01-05")]
#[case("2024/01/05 08:15", "2024-01-05 08:15:00")]
#[case("05/01/2024", "2024-05-01")]
#[case("2024-01-05T10:30:00.250", "2024-01-05 10:30:00")]
#[case("2024-01-05T10:30", "2024-01-05 10:30:00")]
fn lenient_dates_are_rewritten(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(normalize_temporal(raw), expected);
}

#[test]
fn storage_prefix_with_trailing_text_is_kept_verbatim() {
    assert_eq!(normalize_temporal("2024-01-05 anything goes"), "2024-01-05 anything goes");
}

#[test]
fn cells_are_coerced_by_their_described_column() {
    let columns: ColumnSet = users_fields().into_iter().collect();
    assert_eq!(coerce_cell(&columns, "age", ""), Value::Null);
    assert_eq!(coerce_cell(&columns, "name", ""), json!(""));
    assert_eq!(coerce_cell(&columns, "created", "2024-01-05T10:30:00"), json!("2024-01-05 10:30:00"));
}

#[test]
fn undescribed_columns_are_treated_as_untyped() {
    let columns = ColumnSet::default();
    assert_eq!(coerce_cell(&columns, "age", ""), json!(""));
    assert_eq!(coerce_cell(&columns, "age", "2024-01-05T10:30:00"), json!("2024-01-05 10:30:00"));
}
