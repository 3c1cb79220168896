use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Participant {
    pub participant_id: Uuid,
    pub name: String,
    pub total_points: i64,
    /// Dense position in the standings, 0 until the first reconciliation pass
    pub rank: i32,
    pub created_at: DateTime<Utc>,
}
