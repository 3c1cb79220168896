use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One immutable entry of the award history.
///
/// `participant_name` is a snapshot taken when the award was granted and is
/// never rewritten afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AwardRecord {
    pub award_id: Uuid,
    pub participant_id: Uuid,
    pub participant_name: String,
    pub points_awarded: i32,
    pub awarded_at: DateTime<Utc>,
}
