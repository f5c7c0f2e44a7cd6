use crate::error::SourceError;
use crate::source::RowSource;
use crate::value::Value;

/// In-memory `RowSource` over rows that are already materialized.
///
/// Keeps track of how often it was closed so callers can check the
/// close-exactly-once discipline.
#[derive(Debug, Clone, Default)]
pub struct MemoryRows {
    columns: Vec<String>,
    rows: Vec<Vec<Value<'static>>>,
    /// `None` before the first `next_row()`.
    cursor: Option<usize>,
    close_count: usize,
}

impl MemoryRows {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_row(mut self, row: Vec<Value<'static>>) -> Self {
        self.push_row(row);
        self
    }

    pub fn push_row(&mut self, row: Vec<Value<'static>>) {
        self.rows.push(row);
    }

    /// Build from a JSON array of row arrays, e.g. `[[1, "a"], [2, null]]`.
    pub fn from_json<I, S>(columns: I, rows: &serde_json::Value) -> Result<Self, SourceError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut source = Self::new(columns);
        let rows = rows
            .as_array()
            .ok_or_else(|| SourceError::format("expected an array of rows"))?;
        for (i, row) in rows.iter().enumerate() {
            let cells = row
                .as_array()
                .ok_or_else(|| SourceError::format(format!("row {i}: expected an array")))?;
            let values = cells
                .iter()
                .enumerate()
                .map(|(j, cell)| {
                    Value::from_json(cell).ok_or_else(|| {
                        SourceError::format(format!("row {i}, column {j}: nested JSON is not a column value"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            source.push_row(values);
        }
        Ok(source)
    }

    pub fn is_closed(&self) -> bool {
        self.close_count > 0
    }

    pub fn close_count(&self) -> usize {
        self.close_count
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn current(&self) -> Result<&[Value<'static>], SourceError> {
        if self.is_closed() {
            return Err(SourceError::closed("row source is closed"));
        }
        self.cursor
            .and_then(|i| self.rows.get(i))
            .map(Vec::as_slice)
            .ok_or_else(|| SourceError::not_positioned("no current row"))
    }
}

impl RowSource for MemoryRows {
    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn field_name(&self, index: usize) -> &str {
        self.columns.get(index).map_or("", String::as_str)
    }

    fn next_row(&mut self) -> Result<bool, SourceError> {
        if self.is_closed() {
            return Err(SourceError::closed("row source is closed"));
        }
        let next = self.cursor.map_or(0, |i| (i + 1).min(self.rows.len()));
        self.cursor = Some(next);
        Ok(next < self.rows.len())
    }

    fn value(&self, index: usize) -> Result<Value<'_>, SourceError> {
        let row = self.current()?;
        row.get(index)
            .map(Value::as_borrowed)
            .ok_or_else(|| SourceError::out_of_range(format!("field {index} of {}", row.len())))
    }

    fn close(&mut self) {
        self.close_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn walks_rows_in_order() {
        let mut rows = MemoryRows::new(["Id", "Name"])
            .with_row(vec![Value::Int64(1), Value::text("a")])
            .with_row(vec![Value::Int64(2), Value::Null]);

        assert_eq!(rows.field_count(), 2);
        assert_eq!(rows.field_name(1), "Name");

        assert!(rows.next_row().unwrap());
        assert_eq!(rows.value(0).unwrap(), Value::Int64(1));
        assert!(rows.next_row().unwrap());
        assert_eq!(rows.value(1).unwrap(), Value::Null);
        assert!(!rows.next_row().unwrap());
        assert!(!rows.next_row().unwrap());
    }

    #[test]
    fn value_requires_a_positioned_row() {
        let mut rows = MemoryRows::new(["A"]).with_row(vec![Value::Int64(1)]);
        assert_eq!(rows.value(0).unwrap_err().kind, ErrorKind::NotPositioned);

        rows.next_row().unwrap();
        assert_eq!(rows.value(3).unwrap_err().kind, ErrorKind::OutOfRange);

        rows.next_row().unwrap();
        assert_eq!(rows.value(0).unwrap_err().kind, ErrorKind::NotPositioned);
    }

    #[test]
    fn reads_fail_after_close() {
        let mut rows = MemoryRows::new(["A"]).with_row(vec![Value::Int64(1)]);
        rows.next_row().unwrap();
        rows.close();
        rows.close();

        assert_eq!(rows.close_count(), 2);
        assert_eq!(rows.value(0).unwrap_err().kind, ErrorKind::Closed);
        assert_eq!(rows.next_row().unwrap_err().kind, ErrorKind::Closed);
    }

    #[test]
    fn builds_from_json_rows() {
        let json = serde_json::json!([[1, "a", true], [2, null, false]]);
        let mut rows = MemoryRows::from_json(["Id", "Name", "Active"], &json).unwrap();
        assert_eq!(rows.row_count(), 2);

        rows.next_row().unwrap();
        assert_eq!(rows.value(1).unwrap(), Value::text("a"));

        let nested = serde_json::json!([[{"a": 1}]]);
        let err = MemoryRows::from_json(["A"], &nested).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Format);
    }
}
