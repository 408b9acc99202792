//! Error types for statement matching

use thiserror::Error;

/// Statement matching result type
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Statement construction and evaluation errors
///
/// Only the pattern budget errors ([`PolicyError::OversizedPattern`],
/// [`PolicyError::ExpansionTooLarge`]) and [`PolicyError::MissingResolver`]
/// can come out of [`Statement::matches`](crate::Statement::matches). Every
/// other pattern anomaly is absorbed into a `false` match result.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// An expanded pattern alternative exceeds the length guard
    #[error("Pattern alternative too long: {length} characters (max {max})")]
    OversizedPattern { length: usize, max: usize },

    /// Brace expansion would exceed the alternative or byte budget
    #[error("Brace expansion too large: {alternatives} alternatives, {bytes} bytes")]
    ExpansionTooLarge { alternatives: usize, bytes: usize },

    /// A condition references a resolver that is not in the supplied table
    #[error("No condition resolver registered under '{0}'")]
    MissingResolver(String),

    /// Statement configuration is structurally invalid
    #[error("Invalid statement: {0}")]
    InvalidStatement(String),

    /// JSON statement config could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML statement config could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
