use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::models::AwardRecord;

const AWARD_COLUMNS: &str =
    "award_id, participant_id, participant_name, points_awarded, awarded_at";

/// Append-only access to the award history. Nothing here updates or
/// deletes a record.
pub struct AwardRepository<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> AwardRepository<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn append(
        &mut self,
        award_id: Uuid,
        participant_id: Uuid,
        participant_name: &str,
        points_awarded: i32,
    ) -> Result<AwardRecord> {
        let record = sqlx::query_as::<_, AwardRecord>(&format!(
            r#"
            INSERT INTO award_records (award_id, participant_id, participant_name, points_awarded)
            VALUES ($1, $2, $3, $4)
            RETURNING {AWARD_COLUMNS}
            "#
        ))
        .bind(award_id)
        .bind(participant_id)
        .bind(participant_name)
        .bind(points_awarded)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(record)
    }

    pub async fn find_by_id(&mut self, award_id: Uuid) -> Result<Option<AwardRecord>> {
        let record = sqlx::query_as::<_, AwardRecord>(&format!(
            r#"
            SELECT {AWARD_COLUMNS}
            FROM award_records
            WHERE award_id = $1
            "#
        ))
        .bind(award_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(record)
    }

    /// Most recent awards across all participants, newest first
    pub async fn recent(&mut self, limit: i64) -> Result<Vec<AwardRecord>> {
        let records = sqlx::query_as::<_, AwardRecord>(&format!(
            r#"
            SELECT {AWARD_COLUMNS}
            FROM award_records
            ORDER BY awarded_at DESC, award_seq DESC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(records)
    }

    /// Most recent awards of one participant, newest first
    pub async fn recent_for(&mut self, participant_id: Uuid, limit: i64) -> Result<Vec<AwardRecord>> {
        let records = sqlx::query_as::<_, AwardRecord>(&format!(
            r#"
            SELECT {AWARD_COLUMNS}
            FROM award_records
            WHERE participant_id = $1
            ORDER BY awarded_at DESC, award_seq DESC
            LIMIT $2
            "#
        ))
        .bind(participant_id)
        .bind(limit)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(records)
    }

    pub async fn count(&mut self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM award_records")
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(count)
    }
}
