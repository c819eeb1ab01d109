//! Validation protocol.

use serde::{Deserialize, Serialize};

/// Outcome of a validation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub message: String,
    pub error: Option<String>,
}

impl ValidationResult {
    /// A passing result.
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: String::new(),
            error: None,
        }
    }

    /// A failing result with a human-readable message.
    pub fn invalid(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            is_valid: false,
            error: Some(message.clone()),
            message,
        }
    }

    /// Aggregate a list of failures under a header line.
    ///
    /// Returns a passing result when `failures` is empty, otherwise the
    /// header followed by every failure on its own line.
    pub fn from_failures(header: &str, failures: &[String]) -> Self {
        if failures.is_empty() {
            return Self::valid();
        }
        Self::invalid(format!("{}\n{}", header, failures.join("\n")))
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}

/// Pluggable predicate-with-diagnostics gating writes to a cell.
pub trait Validator<T: ?Sized>: Send + Sync {
    fn validate(&self, value: &T) -> ValidationResult;
}

/// Validator backed by a closure returning the rejection reason.
pub struct FnValidator<F> {
    check: F,
}

impl<F> FnValidator<F> {
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

impl<T, F> Validator<T> for FnValidator<F>
where
    T: ?Sized,
    F: Fn(&T) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, value: &T) -> ValidationResult {
        match (self.check)(value) {
            Ok(()) => ValidationResult::valid(),
            Err(reason) => ValidationResult::invalid(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_result() {
        let result = ValidationResult::valid();
        assert!(result.is_valid);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_invalid_result() {
        let result = ValidationResult::invalid("too small");
        assert!(!result.is_valid);
        assert_eq!(result.message, "too small");
        assert_eq!(result.error.as_deref(), Some("too small"));
    }

    #[test]
    fn test_from_failures_joins_lines() {
        let failures = vec!["A is nil".to_string(), "B is nil".to_string()];
        let result = ValidationResult::from_failures("Invalid:", &failures);
        assert!(!result.is_valid);
        assert_eq!(result.message, "Invalid:\nA is nil\nB is nil");
    }

    #[test]
    fn test_from_no_failures() {
        assert!(ValidationResult::from_failures("Invalid:", &[]).is_valid);
    }

    #[test]
    fn test_fn_validator() {
        let positive = FnValidator::new(|v: &i32| {
            if *v > 0 {
                Ok(())
            } else {
                Err(format!("{} is not positive", v))
            }
        });
        assert!(positive.validate(&3).is_valid);
        let rejected = positive.validate(&-1);
        assert!(!rejected.is_valid);
        assert!(rejected.message.contains("-1"));
    }
}
