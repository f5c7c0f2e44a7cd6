use rowmap_api::RowSource;

use crate::error::MapError;

/// Column 0 of every remaining row, rendered as text, in row order.
/// Nulls become empty strings.
pub(crate) fn collect_scalars<S: RowSource + ?Sized>(source: &mut S) -> Result<Vec<String>, MapError> {
    let mut values = Vec::new();
    while source.next_row()? {
        let value = source
            .value(0)
            .map_err(|e| MapError::from(e).with_context(format_args!("row {}", values.len())))?;
        values.push(value.to_string());
    }
    Ok(values)
}
