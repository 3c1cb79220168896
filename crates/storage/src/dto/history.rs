use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::services::leaderboard::{GLOBAL_HISTORY_LIMIT, PARTICIPANT_HISTORY_LIMIT};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct HistoryFilter {
    /// Restrict the feed to one participant
    pub participant_id: Option<Uuid>,
    /// Number of records, at most 50 globally or 20 per participant
    pub limit: Option<usize>,
}

impl HistoryFilter {
    pub fn validate(&self) -> Result<(), String> {
        let cap = match self.participant_id {
            Some(_) => PARTICIPANT_HISTORY_LIMIT,
            None => GLOBAL_HISTORY_LIMIT,
        };

        if let Some(limit) = self.limit
            && !(1..=cap).contains(&limit)
        {
            return Err(format!("limit must be between 1 and {}", cap));
        }

        Ok(())
    }
}
