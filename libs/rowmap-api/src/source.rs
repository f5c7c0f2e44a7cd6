use crate::error::SourceError;
use crate::value::Value;

/// Forward-only cursor over a tabular query result.
///
/// Lifecycle: `Unopened → Reading → Closed`. Field metadata is readable at
/// any time; `value()` is valid only after `next_row()` returned `true`.
///
/// The implementation owns the connection machinery. The engine only reads
/// through this trait and always calls `close()` when it is done, on error
/// paths too.
pub trait RowSource {
    /// Number of columns. Zero means there is nothing to map.
    fn field_count(&self) -> usize;

    /// Column name at `index`, stable for the life of the source.
    fn field_name(&self, index: usize) -> &str;

    /// Advance to the next row. `Ok(false)` once the result is exhausted.
    fn next_row(&mut self) -> Result<bool, SourceError>;

    /// Raw value at `index` in the current row. SQL NULL is `Value::Null`.
    fn value(&self, index: usize) -> Result<Value<'_>, SourceError>;

    /// Release the underlying result. Must be idempotent.
    fn close(&mut self);
}
