use rowmap_api::{CoerceOptions, Entity};

use crate::error::MapError;
use crate::extract::ColumnValues;
use crate::resolve::{Resolution, ResolutionCache};

/// Build one `E` from one row's columns.
///
/// Starts from `E::default()` and assigns columns in row order. Columns with
/// no member, null values and composite members are skipped without a
/// signal; the result may have nothing populated at all. A value that does
/// not coerce fails the whole entity.
pub fn materialize<E: Entity>(
    row: &ColumnValues<'_>,
    cache: &ResolutionCache,
    opts: &CoerceOptions,
) -> Result<E, MapError> {
    let shape = E::shape();
    let mut entity = E::default();

    for (column, value) in row {
        let Resolution::Member(index) = cache.resolve::<E>(column) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        if shape.member(index).is_none_or(|m| m.target.is_composite()) {
            continue;
        }
        entity
            .assign(index, value, opts)
            .map_err(|e| e.with_column(shape.name, *column))?;
    }

    Ok(entity)
}
