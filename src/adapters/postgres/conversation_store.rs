//! PostgreSQL implementation of ConversationStore.
//!
//! One row per session in `conversations`, turns in `turns` ordered by `seq`.
//! Every mutation runs in a transaction holding a row lock on the live
//! conversation, so concurrent writers for one key serialize in the database
//! as well as in-process.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;

use crate::domain::conversation::{
    AgentKind, Conversation, ConversationStatus, ConversationUpdate, SentimentScore,
    SentimentTrend, Speaker, Turn, TurnMarker,
};
use crate::domain::escalation::EscalationTicket;
use crate::domain::foundation::{
    Channel, ConversationId, CustomerId, SessionId, Timestamp, TurnId,
};
use crate::domain::routing::TaskCategory;
use crate::ports::{ConversationStore, StoreError};

const CONVERSATION_COLUMNS: &str = r#"
    session_id, customer_id, channel, status, language, category, ticket,
    created_at, last_activity_at
"#;

/// PostgreSQL implementation of ConversationStore.
#[derive(Clone)]
pub struct PostgresConversationStore {
    pool: PgPool,
    ttl: Duration,
    default_language: String,
}

impl PostgresConversationStore {
    /// Creates a new PostgresConversationStore.
    pub fn new(pool: PgPool, ttl: Duration, default_language: impl Into<String>) -> Self {
        Self {
            pool,
            ttl,
            default_language: default_language.into(),
        }
    }

    /// Applies pending migrations from `./migrations`.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Failed to run migrations: {}", e)))
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| StoreError::Database(format!("Failed to start transaction: {}", e)))
    }

    fn cutoff(&self, now: &Timestamp) -> Timestamp {
        now.minus_secs(i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn load(&self, id: &ConversationId, now: Timestamp) -> Result<Conversation, StoreError> {
        let mut tx = self.begin().await?;

        if let Some(mut existing) = fetch_live(&mut tx, id, true).await? {
            if !existing.is_closed() && existing.is_inactive_since(&self.cutoff(&now)) {
                let before = existing.clone();
                existing.close()?;
                write_changes(&mut tx, &before, &existing).await?;
                tracing::info!(conversation_id = %id, "closed expired conversation on load");
            }

            if !existing.is_closed() {
                commit_tx(tx).await?;
                return Ok(existing);
            }

            sqlx::query("UPDATE conversations SET archived = TRUE WHERE session_id = $1")
                .bind(existing.session_id().as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    StoreError::Database(format!("Failed to archive conversation: {}", e))
                })?;
        }

        let fresh = Conversation::open(id.clone(), self.default_language.clone(), now);
        sqlx::query(
            r#"
            INSERT INTO conversations (
                session_id, conversation_key, customer_id, channel, status, language,
                category, ticket, archived, created_at, last_activity_at
            ) VALUES ($1, $2, $3, $4, $5, $6, NULL, NULL, FALSE, $7, $8)
            ON CONFLICT (conversation_key) WHERE NOT archived DO NOTHING
            "#,
        )
        .bind(fresh.session_id().as_uuid())
        .bind(id.to_string())
        .bind(id.customer().as_str())
        .bind(id.channel().as_str())
        .bind(fresh.status().as_str())
        .bind(fresh.language())
        .bind(fresh.created_at().as_datetime())
        .bind(fresh.last_activity_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to insert conversation: {}", e)))?;

        // Another process may have won the insert race.
        let current = fetch_live(&mut tx, id, false)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        commit_tx(tx).await?;

        tracing::debug!(conversation_id = %id, session_id = %current.session_id(), "opened conversation");
        Ok(current)
    }

    async fn find(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        let mut tx = self.begin().await?;
        let found = fetch_live(&mut tx, id, false).await?;
        commit_tx(tx).await?;
        Ok(found)
    }

    async fn append(&self, id: &ConversationId, turn: Turn) -> Result<(), StoreError> {
        self.commit(id, ConversationUpdate::new().with_turn(turn))
            .await
            .map(|_| ())
    }

    async fn set_status(
        &self,
        id: &ConversationId,
        status: ConversationStatus,
    ) -> Result<(), StoreError> {
        let mut tx = self.begin().await?;
        let before = fetch_live(&mut tx, id, true)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let mut after = before.clone();
        after.apply_status(status)?;
        write_changes(&mut tx, &before, &after).await?;
        commit_tx(tx).await
    }

    async fn commit(
        &self,
        id: &ConversationId,
        update: ConversationUpdate,
    ) -> Result<Conversation, StoreError> {
        let mut tx = self.begin().await?;
        let before = fetch_live(&mut tx, id, true)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let after = update.applied_to(&before)?;
        write_changes(&mut tx, &before, &after).await?;
        commit_tx(tx).await?;
        Ok(after)
    }

    async fn expire(&self, now: Timestamp) -> Result<Vec<ConversationId>, StoreError> {
        let rows = sqlx::query(
            r#"
            UPDATE conversations SET status = 'closed'
            WHERE NOT archived AND status <> 'closed' AND last_activity_at < $1
            RETURNING customer_id, channel
            "#,
        )
        .bind(self.cutoff(&now).as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to expire conversations: {}", e)))?;

        let mut closed = rows
            .iter()
            .map(|row| {
                let customer: String = column(row, "customer_id")?;
                let channel: String = column(row, "channel")?;
                Ok(ConversationId::new(
                    CustomerId::new(customer).map_err(serialization)?,
                    channel.parse::<Channel>().map_err(serialization)?,
                ))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        closed.sort();
        Ok(closed)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Row access
// ════════════════════════════════════════════════════════════════════════════

async fn commit_tx(tx: Transaction<'static, Postgres>) -> Result<(), StoreError> {
    tx.commit()
        .await
        .map_err(|e| StoreError::Database(format!("Failed to commit transaction: {}", e)))
}

async fn fetch_live(
    tx: &mut Transaction<'static, Postgres>,
    id: &ConversationId,
    for_update: bool,
) -> Result<Option<Conversation>, StoreError> {
    let sql = format!(
        "SELECT {} FROM conversations WHERE conversation_key = $1 AND NOT archived{}",
        CONVERSATION_COLUMNS,
        if for_update { " FOR UPDATE" } else { "" }
    );
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to fetch conversation: {}", e)))?;

    let row = match row {
        Some(row) => row,
        None => return Ok(None),
    };

    let session_id: uuid::Uuid = column(&row, "session_id")?;
    let turn_rows = sqlx::query(
        r#"
        SELECT id, speaker, text, agent_kind, sentiment, category, marker, created_at
        FROM turns
        WHERE session_id = $1
        ORDER BY seq ASC
        "#,
    )
    .bind(session_id)
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| StoreError::Database(format!("Failed to fetch turns: {}", e)))?;

    let turns = turn_rows
        .iter()
        .map(row_to_turn)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(row_to_conversation(id.clone(), &row, turns)?))
}

/// Persists the difference between two versions of the same conversation.
/// Turns are append-only, so only the tail beyond `before` is inserted.
async fn write_changes(
    tx: &mut Transaction<'static, Postgres>,
    before: &Conversation,
    after: &Conversation,
) -> Result<(), StoreError> {
    let session_id = after.session_id().as_uuid();

    for (offset, turn) in after.turns()[before.turn_count()..].iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO turns (
                id, session_id, seq, speaker, text, agent_kind, sentiment, category,
                marker, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(turn.id().as_uuid())
        .bind(session_id)
        .bind((before.turn_count() + offset) as i32)
        .bind(turn.speaker().as_str())
        .bind(turn.text())
        .bind(turn.agent_kind().map(|k| k.as_str()))
        .bind(turn.sentiment().map(|s| s.value()))
        .bind(turn.category().map(|c| c.as_str()))
        .bind(turn.marker().map(marker_to_str))
        .bind(turn.timestamp().as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to insert turn: {}", e)))?;
    }

    sqlx::query(
        r#"
        UPDATE conversations SET
            status = $2,
            language = $3,
            category = $4,
            ticket = $5,
            last_activity_at = $6
        WHERE session_id = $1
        "#,
    )
    .bind(session_id)
    .bind(after.status().as_str())
    .bind(after.language())
    .bind(after.category().map(|c| c.as_str()))
    .bind(after.ticket().map(|t| Json(t.clone())))
    .bind(after.last_activity_at().as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| StoreError::Database(format!("Failed to update conversation: {}", e)))?;

    Ok(())
}

fn row_to_conversation(
    id: ConversationId,
    row: &PgRow,
    turns: Vec<Turn>,
) -> Result<Conversation, StoreError> {
    let session_id: uuid::Uuid = column(row, "session_id")?;
    let status: String = column(row, "status")?;
    let language: String = column(row, "language")?;
    let category: Option<String> = column(row, "category")?;
    let ticket: Option<Json<EscalationTicket>> = column(row, "ticket")?;
    let created_at: chrono::DateTime<chrono::Utc> = column(row, "created_at")?;
    let last_activity_at: chrono::DateTime<chrono::Utc> = column(row, "last_activity_at")?;

    // The trend is derived from the scored customer turns.
    let trend: Vec<SentimentScore> = turns
        .iter()
        .filter(|t| t.is_customer())
        .filter_map(|t| t.sentiment())
        .collect();

    Ok(Conversation::reconstitute(
        id,
        SessionId::from_uuid(session_id),
        status.parse().map_err(serialization)?,
        turns,
        SentimentTrend::from(trend),
        language,
        category
            .map(|c| c.parse::<TaskCategory>())
            .transpose()
            .map_err(serialization)?,
        ticket.map(|Json(t)| t),
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(last_activity_at),
    ))
}

fn row_to_turn(row: &PgRow) -> Result<Turn, StoreError> {
    let id: uuid::Uuid = column(row, "id")?;
    let speaker: String = column(row, "speaker")?;
    let text: String = column(row, "text")?;
    let agent_kind: Option<String> = column(row, "agent_kind")?;
    let sentiment: Option<f64> = column(row, "sentiment")?;
    let category: Option<String> = column(row, "category")?;
    let marker: Option<String> = column(row, "marker")?;
    let created_at: chrono::DateTime<chrono::Utc> = column(row, "created_at")?;

    Ok(Turn::reconstitute(
        TurnId::from_uuid(id),
        speaker.parse::<Speaker>().map_err(serialization)?,
        text,
        Timestamp::from_datetime(created_at),
        agent_kind
            .map(|k| k.parse::<AgentKind>())
            .transpose()
            .map_err(serialization)?,
        sentiment.map(SentimentScore::clamped),
        category
            .map(|c| c.parse::<TaskCategory>())
            .transpose()
            .map_err(serialization)?,
        marker.as_deref().map(str_to_marker).transpose()?,
    ))
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| StoreError::Serialization(format!("column {}: {}", name, e)))
}

fn serialization(err: impl std::fmt::Display) -> StoreError {
    StoreError::Serialization(err.to_string())
}

// ════════════════════════════════════════════════════════════════════════════
// Enum conversions
// ════════════════════════════════════════════════════════════════════════════

fn marker_to_str(marker: TurnMarker) -> &'static str {
    match marker {
        TurnMarker::Resolved => "resolved",
        TurnMarker::HandedOff => "handed_off",
    }
}

fn str_to_marker(s: &str) -> Result<TurnMarker, StoreError> {
    match s {
        "resolved" => Ok(TurnMarker::Resolved),
        "handed_off" => Ok(TurnMarker::HandedOff),
        other => Err(StoreError::Serialization(format!(
            "Unknown turn marker: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_strings_round_trip() {
        for marker in [TurnMarker::Resolved, TurnMarker::HandedOff] {
            assert_eq!(str_to_marker(marker_to_str(marker)).unwrap(), marker);
        }
    }

    #[test]
    fn unknown_marker_is_serialization_error() {
        assert!(matches!(
            str_to_marker("archived"),
            Err(StoreError::Serialization(_))
        ));
    }
}
