//! Error types for HistoMap

use thiserror::Error;

/// HistoMap error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Array shape does not fit a binning, or two binnings are incompatible
    #[error("Shape error: {0}")]
    Shape(String),

    /// Index component out of range or selecting no bins
    #[error("Index error: {0}")]
    Index(String),

    /// Operand or argument of an unsupported type
    #[error("Type error: {0}")]
    Type(String),

    /// Named map (or other item) not present
    #[error("Not found: {0}")]
    NotFound(String),

    /// Identity hash requested from a map that has none
    #[error("Missing hash: {0}")]
    MissingHash(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not implemented
    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl Error {
    /// Type error for a value whose type is named by `type_name`.
    pub fn unsupported_type(context: &str, type_name: &str) -> Self {
        Error::Type(format!("{}: type of argument not supported: \"{}\"", context, type_name))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_type_names_the_type() {
        let err = Error::unsupported_type("add", "str");
        let msg = err.to_string();
        assert!(msg.starts_with("Type error:"), "{}", msg);
        assert!(msg.contains("\"str\""), "{}", msg);
    }

    #[test]
    fn test_json_error_converts() {
        let err: Error = serde_json::from_str::<f64>("not json").unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }
}
