use rowmap_api::{CoercionError, SourceError};

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The row source reports zero columns; raised before any row is read.
    #[error("result has no columns to map")]
    EmptyResultShape,

    #[error("coercion error: {0}")]
    Coercion(#[from] CoercionError),

    #[error("row source error: {0}")]
    Source(#[from] SourceError),

    #[error("config error: {0}")]
    Config(String),
}

impl MapError {
    /// Add context to the error.
    ///
    /// For `Source` variant, context is added to the inner `SourceError`.
    /// For `Config`, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            MapError::Source(e) => MapError::Source(e.with_context(ctx)),
            MapError::Config(msg) => MapError::Config(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}
