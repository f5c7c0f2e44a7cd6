use rowmap_api::shape::names_equal;
use rowmap_api::{CoerceOptions, Entity, RowSource};

use crate::error::MapError;
use crate::extract::extract_row;
use crate::materialize::materialize;
use crate::resolve::ResolutionCache;

/// Index of the first column named `split_on` past column 0.
///
/// Falls back to the field count (no split) when the name is missing or
/// only appears first.
pub fn split_boundary<S: RowSource + ?Sized>(source: &S, split_on: &str, ignore_case: bool) -> usize {
    let field_count = source.field_count();
    (1..field_count)
        .find(|&index| {
            let name = source.field_name(index);
            if ignore_case {
                names_equal(name, split_on)
            } else {
                name == split_on
            }
        })
        .unwrap_or(field_count)
}

/// Map every remaining row into a `(P, D)` pair split at `split_on`, and
/// collect what `combine` makes of each pair.
pub(crate) fn split_rows<P, D, S, F>(
    source: &mut S,
    split_on: &str,
    ignore_case: bool,
    cache: &ResolutionCache,
    opts: &CoerceOptions,
    mut combine: F,
) -> Result<Vec<P>, MapError>
where
    P: Entity,
    D: Entity,
    S: RowSource + ?Sized,
    F: FnMut(P, D) -> P,
{
    let field_count = source.field_count();
    let mut results = Vec::new();

    while source.next_row()? {
        let boundary = split_boundary(&*source, split_on, ignore_case);
        tracing::trace!(split_on, boundary, row = results.len(), "split boundary");

        let primary = materialize::<P>(&extract_row(&*source, 0..boundary)?, cache, opts)?;
        let detail = materialize::<D>(&extract_row(&*source, boundary..field_count)?, cache, opts)?;
        results.push(combine(primary, detail));
    }

    Ok(results)
}
