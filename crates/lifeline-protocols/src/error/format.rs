//! Serialization format errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Unsupported format: {0}")]
    Unsupported(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(String),

    #[error("TOML error: {0}")]
    Toml(String),

    #[error("Invalid encoding: {0}")]
    Encoding(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_error() {
        let err = FormatError::Unsupported("xml".to_string());
        assert!(err.to_string().contains("xml"));
        assert!(err.to_string().contains("Unsupported"));
    }

    #[test]
    fn test_json_error_from() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = FormatError::from(json_err);
        assert!(err.to_string().starts_with("JSON error"));
    }

    #[test]
    fn test_text_variants() {
        let errors = vec![
            FormatError::Yaml("bad indent".to_string()),
            FormatError::Toml("expected table".to_string()),
            FormatError::Encoding("invalid utf-8".to_string()),
        ];
        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}
