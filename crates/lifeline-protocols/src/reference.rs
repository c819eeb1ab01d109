//! Identity carried by every runtime object.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier plus human-readable name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub id: Uuid,
    pub name: String,
}

impl Reference {
    /// Create a reference with a fresh random identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    /// A reference is usable when it has both an identifier and a name.
    pub fn is_valid(&self) -> bool {
        !self.id.is_nil() && !self.name.is_empty()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_reference_is_valid() {
        let reference = Reference::new("lifecycle");
        assert!(reference.is_valid());
        assert_eq!(reference.name, "lifecycle");
    }

    #[test]
    fn test_unique_ids() {
        assert_ne!(Reference::new("a").id, Reference::new("a").id);
    }

    #[test]
    fn test_invalid_reference() {
        let reference = Reference {
            id: Uuid::nil(),
            name: "x".to_string(),
        };
        assert!(!reference.is_valid());
        assert!(!Reference::new("").is_valid());
    }
}
