use sqlx::PgConnection;

use crate::error::Result;

/// Advisory lock key shared by every transaction that writes totals or ranks
const LEADERBOARD_LOCK_KEY: i64 = 0x4c42_5244;

pub struct RankingRepository<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> RankingRepository<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }

    /// Serializes leaderboard writers until the current transaction ends.
    ///
    /// Must be taken before touching any participant row, otherwise a
    /// writer holding a row lock can deadlock against a running
    /// reconciliation.
    pub async fn lock_writers(&mut self) -> Result<()> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(LEADERBOARD_LOCK_KEY)
            .execute(&mut *self.conn)
            .await?;

        Ok(())
    }

    /// Recompute every rank from the current totals in a single statement.
    ///
    /// The window function reads one snapshot of all totals, so the result
    /// is always a permutation of 1..=N. The ORDER BY mirrors
    /// `services::ranking::standings_order`. Returns the number of
    /// participants whose rank changed.
    pub async fn reconcile(&mut self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE participants AS p
            SET rank = ranked.new_rank
            FROM (
                SELECT participant_id,
                       ROW_NUMBER() OVER (
                           ORDER BY total_points DESC, join_seq ASC, participant_id ASC
                       )::INTEGER AS new_rank
                FROM participants
            ) AS ranked
            WHERE p.participant_id = ranked.participant_id
              AND p.rank <> ranked.new_rank
            "#,
        )
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected())
    }
}
