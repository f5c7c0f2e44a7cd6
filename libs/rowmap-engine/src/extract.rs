use std::ops::Range;

use indexmap::IndexMap;
use rowmap_api::{RowSource, Value};

use crate::error::MapError;

/// One row's slice of columns, in source order, keyed by the verbatim
/// column name. Borrows from the row source until the next `next_row()`.
pub type ColumnValues<'r> = IndexMap<&'r str, Value<'r>>;

/// Read columns `range` of the current row.
///
/// The end is clamped to the field count. A name repeated within the range
/// keeps its first value.
pub fn extract_row<S: RowSource + ?Sized>(
    source: &S,
    range: Range<usize>,
) -> Result<ColumnValues<'_>, MapError> {
    let field_count = source.field_count();
    if field_count == 0 {
        return Err(MapError::EmptyResultShape);
    }

    let end = range.end.min(field_count);
    let mut row = IndexMap::with_capacity(end.saturating_sub(range.start));
    for index in range.start..end {
        let value = source
            .value(index)
            .map_err(|e| MapError::from(e).with_context(format_args!("column {index}")))?;
        row.entry(source.field_name(index)).or_insert(value);
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use rowmap_api::MemoryRows;

    use super::*;

    fn positioned(columns: &[&str], row: Vec<Value<'static>>) -> MemoryRows {
        let mut source = MemoryRows::new(columns.iter().copied()).with_row(row);
        source.next_row().unwrap();
        source
    }

    #[test]
    fn extracts_exactly_the_range() {
        let source = positioned(
            &["Id", "Name", "OrderId", "Qty"],
            vec![Value::Int64(1), Value::text("a"), Value::Int64(10), Value::Int64(3)],
        );

        let left = extract_row(&source, 0..2).unwrap();
        assert_eq!(left.keys().copied().collect::<Vec<_>>(), ["Id", "Name"]);

        let right = extract_row(&source, 2..4).unwrap();
        assert_eq!(right.keys().copied().collect::<Vec<_>>(), ["OrderId", "Qty"]);
        assert_eq!(right["Qty"], Value::Int64(3));
    }

    #[test]
    fn names_are_kept_verbatim() {
        let source = positioned(&["user_NAME"], vec![Value::text("x")]);
        let row = extract_row(&source, 0..1).unwrap();
        assert!(row.contains_key("user_NAME"));
        assert!(!row.contains_key("user_name"));
    }

    #[test]
    fn duplicate_names_keep_the_first_value() {
        let source = positioned(&["Id", "Id"], vec![Value::Int64(1), Value::Int64(2)]);
        let row = extract_row(&source, 0..2).unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row["Id"], Value::Int64(1));
    }

    #[test]
    fn range_end_is_clamped_and_empty_ranges_are_fine() {
        let source = positioned(&["A", "B"], vec![Value::Int64(1), Value::Int64(2)]);
        assert_eq!(extract_row(&source, 1..10).unwrap().len(), 1);
        assert!(extract_row(&source, 2..2).unwrap().is_empty());
    }

    #[test]
    fn zero_columns_is_an_empty_result_shape() {
        let source = MemoryRows::new(Vec::<String>::new());
        assert!(matches!(
            extract_row(&source, 0..0),
            Err(MapError::EmptyResultShape)
        ));
    }

    #[test]
    fn source_errors_carry_the_column() {
        let source = MemoryRows::new(["A"]).with_row(vec![Value::Int64(1)]);
        let err = extract_row(&source, 0..1).unwrap_err();
        match err {
            MapError::Source(e) => assert!(e.message.starts_with("column 0")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
