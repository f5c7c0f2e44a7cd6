use std::fmt;

/// Error kind for row source failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    /// Read attempted after `close()`.
    Closed,
    /// `value()` called before the first `next_row()` or past the last row.
    NotPositioned,
    /// Field index outside the current row.
    OutOfRange,
    /// Source data could not be turned into rows.
    Format,
}

/// Row source error, returned by all `RowSource` read methods.
#[derive(Debug)]
pub struct SourceError {
    pub kind: ErrorKind,
    pub message: String,
}

impl SourceError {
    pub fn io(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Io, message: msg.into() }
    }

    pub fn closed(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Closed, message: msg.into() }
    }

    pub fn not_positioned(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::NotPositioned, message: msg.into() }
    }

    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::OutOfRange, message: msg.into() }
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Format, message: msg.into() }
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for SourceError {}

impl From<std::io::Error> for SourceError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e.to_string())
    }
}

/// A non-null raw value that cannot be converted to its member's type.
///
/// Raised by `Coerce` impls with the value kind and target type; the
/// materializer attaches the entity and column before it leaves the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionError {
    /// `Value::kind()` of the raw value.
    pub from: &'static str,
    /// `TargetType::name()` of the member.
    pub to: &'static str,
    pub entity: Option<&'static str>,
    pub column: Option<String>,
    pub detail: Option<String>,
}

impl CoercionError {
    pub fn new(from: &'static str, to: &'static str) -> Self {
        Self { from, to, entity: None, column: None, detail: None }
    }

    pub fn with_detail(mut self, detail: impl fmt::Display) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn with_column(mut self, entity: &'static str, column: impl Into<String>) -> Self {
        self.entity = Some(entity);
        self.column = Some(column.into());
        self
    }
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.entity, &self.column) {
            (Some(entity), Some(column)) => write!(f, "{entity}.{column}: ")?,
            (None, Some(column)) => write!(f, "{column}: ")?,
            _ => {}
        }
        write!(f, "cannot convert {} to {}", self.from, self.to)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

impl std::error::Error for CoercionError {}
