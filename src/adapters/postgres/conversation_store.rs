//! PostgreSQL implementation of ConversationStore.
//!
//! Turns are ordered by a database sequence, so insertion order survives
//! equal timestamps and clock skew between app instances.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::conversation::{Role, SessionSummary, Turn, TurnErrorKind, TurnHistory};
use crate::domain::foundation::{HandlerId, SessionId, Timestamp, TurnId};
use crate::ports::{ClearOutcome, ConversationStore, StoreError};

/// PostgreSQL-backed conversation log.
#[derive(Clone)]
pub struct PostgresConversationStore {
    pool: PgPool,
}

impl PostgresConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn open_session(&self, session: &SessionId) -> Result<SessionSummary, StoreError> {
        // xmax = 0 only for a freshly inserted row
        let row = sqlx::query(
            r#"
            INSERT INTO support_sessions (id) VALUES ($1)
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id
            RETURNING created_at, last_activity_at, (xmax = 0) AS inserted
            "#,
        )
        .bind(session.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx("open session", e))?;

        let inserted: bool = row.get("inserted");
        let turn_count = count_turns(&self.pool, session).await?;
        Ok(summary_from_row(session, &row, inserted, turn_count))
    }

    async fn find_session(&self, session: &SessionId) -> Result<Option<SessionSummary>, StoreError> {
        let row = sqlx::query(
            "SELECT created_at, last_activity_at FROM support_sessions WHERE id = $1",
        )
        .bind(session.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx("find session", e))?;

        match row {
            Some(row) => {
                let turn_count = count_turns(&self.pool, session).await?;
                Ok(Some(summary_from_row(session, &row, false, turn_count)))
            }
            None => Ok(None),
        }
    }

    async fn append(&self, session: &SessionId, turn: &Turn) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx("start transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO support_sessions (id, last_activity_at) VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET last_activity_at = EXCLUDED.last_activity_at
            "#,
        )
        .bind(session.as_str())
        .bind(turn.timestamp().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx("touch session", e))?;

        sqlx::query(
            r#"
            INSERT INTO support_turns (id, session_id, role, content, handler_id, error_kind, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(turn.id().as_uuid())
        .bind(session.as_str())
        .bind(turn.role().as_str())
        .bind(turn.content())
        .bind(turn.handler().map(|h| h.as_str()))
        .bind(turn.error_kind().map(|k| k.as_str()))
        .bind(turn.timestamp().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx("insert turn", e))?;

        tx.commit().await.map_err(|e| map_sqlx("commit", e))?;
        Ok(())
    }

    async fn history(&self, session: &SessionId, limit: usize) -> Result<TurnHistory, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, role, content, handler_id, error_kind, created_at
            FROM (
                SELECT * FROM support_turns
                WHERE session_id = $1
                ORDER BY seq DESC
                LIMIT $2
            ) recent
            ORDER BY seq ASC
            "#,
        )
        .bind(session.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx("fetch history", e))?;

        let turns = rows
            .iter()
            .map(|row| turn_from_row(session, row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TurnHistory::new(turns))
    }

    async fn clear(&self, session: &SessionId, welcome: Option<&Turn>) -> Result<ClearOutcome, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx("start transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO support_sessions (id) VALUES ($1)
            ON CONFLICT (id) DO UPDATE SET last_activity_at = now()
            "#,
        )
        .bind(session.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx("touch session", e))?;

        let removed = sqlx::query("DELETE FROM support_turns WHERE session_id = $1")
            .bind(session.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx("delete turns", e))?
            .rows_affected() as usize;

        if let Some(turn) = welcome {
            sqlx::query(
                r#"
                INSERT INTO support_turns (id, session_id, role, content, handler_id, error_kind, created_at)
                VALUES ($1, $2, $3, $4, NULL, NULL, $5)
                "#,
            )
            .bind(turn.id().as_uuid())
            .bind(session.as_str())
            .bind(turn.role().as_str())
            .bind(turn.content())
            .bind(turn.timestamp().as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx("insert welcome", e))?;
        }

        tx.commit().await.map_err(|e| map_sqlx("commit", e))?;
        Ok(ClearOutcome {
            removed,
            welcome_seeded: welcome.is_some(),
        })
    }
}

async fn count_turns(pool: &PgPool, session: &SessionId) -> Result<usize, StoreError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM support_turns WHERE session_id = $1")
        .bind(session.as_str())
        .fetch_one(pool)
        .await
        .map_err(|e| map_sqlx("count turns", e))?;
    Ok(count as usize)
}

fn summary_from_row(session: &SessionId, row: &PgRow, is_new: bool, turn_count: usize) -> SessionSummary {
    let created_at: DateTime<Utc> = row.get("created_at");
    let last_activity_at: DateTime<Utc> = row.get("last_activity_at");
    SessionSummary {
        id: session.clone(),
        is_new,
        created_at: Timestamp::from_datetime(created_at),
        last_activity_at: Timestamp::from_datetime(last_activity_at),
        turn_count,
    }
}

fn turn_from_row(session: &SessionId, row: &PgRow) -> Result<Turn, StoreError> {
    let corrupted = |reason: String| StoreError::Corrupted {
        session: session.clone(),
        reason,
    };

    let id: uuid::Uuid = row.get("id");
    let role: String = row.get("role");
    let content: String = row.get("content");
    let handler_id: Option<String> = row.get("handler_id");
    let error_kind: Option<String> = row.get("error_kind");
    let created_at: DateTime<Utc> = row.get("created_at");

    let role: Role = role.parse().map_err(|e| corrupted(format!("{}", e)))?;
    let handler = handler_id
        .map(HandlerId::new)
        .transpose()
        .map_err(|e| corrupted(format!("{}", e)))?;
    let error_kind = error_kind
        .map(|k| k.parse::<TurnErrorKind>())
        .transpose()
        .map_err(|e| corrupted(format!("{}", e)))?;

    Ok(Turn::reconstitute(
        TurnId::from_uuid(id),
        role,
        content,
        Timestamp::from_datetime(created_at),
        handler,
        error_kind,
    ))
}

fn map_sqlx(context: &str, e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(format!("Failed to {}: {}", context, e))
        }
        other => StoreError::Database(format!("Failed to {}: {}", context, other)),
    }
}
