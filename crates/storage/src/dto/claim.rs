use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{AwardRecord, Participant};
use crate::services::leaderboard::Claim;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClaimRequest {
    pub participant_id: Option<Uuid>,
}

/// Result of a claim: the participant after reconciliation and the award
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClaimResponse {
    pub participant: Participant,
    pub points_awarded: i32,
    pub record: AwardRecord,
    pub message: String,
}

impl From<Claim> for ClaimResponse {
    fn from(claim: Claim) -> Self {
        let message = format!(
            "{} earned {} points!",
            claim.participant.name, claim.points_awarded
        );

        Self {
            participant: claim.participant,
            points_awarded: claim.points_awarded,
            record: claim.record,
            message,
        }
    }
}
