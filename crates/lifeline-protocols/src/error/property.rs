//! Property errors.

use thiserror::Error;

use super::FormatError;

#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Value rejected: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_error() {
        let err = PropertyError::Rejected("must be positive".to_string());
        assert_eq!(err.to_string(), "Value rejected: must be positive");
    }

    #[test]
    fn test_format_error_from() {
        let err = PropertyError::from(FormatError::Unsupported("ini".to_string()));
        assert!(err.to_string().contains("ini"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = PropertyError::from(io_err);
        assert!(err.to_string().contains("file not found"));
    }
}
