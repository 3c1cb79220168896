use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::MAX_NAME_LENGTH;

/// Request payload for creating a new participant
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateParticipantRequest {
    /// Trimmed before use; must not be blank
    #[validate(custom(function = "validate_name_length"))]
    #[serde(default)]
    pub name: String,
}

// Surrounding whitespace does not count towards the limit
fn validate_name_length(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() <= MAX_NAME_LENGTH {
        Ok(())
    } else {
        Err(ValidationError::new("name_too_long")
            .with_message("Name must be at most 100 characters".into()))
    }
}
