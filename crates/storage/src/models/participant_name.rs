use std::fmt;

use crate::error::StorageError;

pub const MAX_NAME_LENGTH: usize = 100;

/// A participant name that has been trimmed and checked for emptiness.
///
/// Comparison is exact: "Alice" and "alice" are different names, while
/// "Alice" and "  Alice " are the same one.
///
/// # Examples
///
/// ```
/// use storage::models::ParticipantName;
///
/// let name = ParticipantName::parse("  Alice ").unwrap();
/// assert_eq!(name.as_str(), "Alice");
/// assert!(ParticipantName::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantName(String);

impl ParticipantName {
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(StorageError::InvalidName("Name is required".to_string()));
        }

        if trimmed.chars().count() > MAX_NAME_LENGTH {
            return Err(StorageError::InvalidName(format!(
                "Name must be at most {} characters",
                MAX_NAME_LENGTH
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ParticipantName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
