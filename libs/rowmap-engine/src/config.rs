use std::path::Path;

use rowmap_api::CoerceOptions;
use serde::Deserialize;

use crate::error::MapError;

/// Mapper configuration, parsed from TOML.
///
/// Nothing here influences member resolution, so mappers with different
/// configs can share one resolution cache.
///
/// ```toml
/// split_on_ignore_case = true
///
/// [coercion]
/// date_formats = ["%d.%m.%Y"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Match the split boundary column case-insensitively.
    pub split_on_ignore_case: bool,

    /// Text formats for temporal coercion.
    pub coercion: CoerceOptions,
}

impl MapperConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| MapError::Config(format!("{}: {e}", path.display())))?;
        Self::parse(&content).map_err(|e| e.with_context(path.display()))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, MapError> {
        toml::from_str(toml_str).map_err(|e| MapError::Config(e.to_string()))
    }
}
