use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Participant, ParticipantName};

const PARTICIPANT_COLUMNS: &str = "participant_id, name, total_points, rank, created_at";

pub struct ParticipantRepository<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> ParticipantRepository<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }

    /// List all participants in standings order
    pub async fn list(&mut self) -> Result<Vec<Participant>> {
        let participants = sqlx::query_as::<_, Participant>(&format!(
            r#"
            SELECT {PARTICIPANT_COLUMNS}
            FROM participants
            ORDER BY total_points DESC, rank ASC, join_seq ASC
            "#
        ))
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(participants)
    }

    /// Find participant by ID
    pub async fn find_by_id(&mut self, id: Uuid) -> Result<Participant> {
        sqlx::query_as::<_, Participant>(&format!(
            r#"
            SELECT {PARTICIPANT_COLUMNS}
            FROM participants
            WHERE participant_id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or(StorageError::ParticipantNotFound(id))
    }

    pub async fn exists_with_name(&mut self, name: &ParticipantName) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM participants WHERE name = $1)",
        )
        .bind(name.as_str())
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(exists)
    }

    pub async fn count(&mut self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM participants")
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(count)
    }

    /// Insert a new participant with zero points and no rank yet
    pub async fn insert(&mut self, name: &ParticipantName) -> Result<Participant> {
        if self.exists_with_name(name).await? {
            return Err(StorageError::DuplicateName(name.to_string()));
        }

        let result = sqlx::query_as::<_, Participant>(&format!(
            r#"
            INSERT INTO participants (name)
            VALUES ($1)
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        ))
        .bind(name.as_str())
        .fetch_one(&mut *self.conn)
        .await
        .map_err(StorageError::from);

        match result {
            Err(e) if e.is_unique_violation() => Err(StorageError::DuplicateName(name.to_string())),
            other => other,
        }
    }

    /// Add `points` to the participant's total in place, so concurrent
    /// awards never overwrite each other.
    pub async fn apply_award(&mut self, id: Uuid, points: i32) -> Result<Participant> {
        sqlx::query_as::<_, Participant>(&format!(
            r#"
            UPDATE participants
            SET total_points = total_points + $2
            WHERE participant_id = $1
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(i64::from(points))
        .fetch_optional(&mut *self.conn)
        .await?
        .ok_or(StorageError::ParticipantNotFound(id))
    }
}
