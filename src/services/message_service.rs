use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::message_dto::{MessageHistoryQuery, ModerationQuery};
use crate::error::{Error, Result};
use crate::models::conversation::{Conversation, ConversationRow};
use crate::models::message::{CreateMessage, Message};
use crate::models::user::UserRole;

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, is_read, created_at, \
     is_flagged, supervised_by, supervisor_notes, media_url, media_type";

#[derive(Clone)]
pub struct MessageService {
    pool: PgPool,
}

impl MessageService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Rejects self-addressed messages and unknown receivers before inserting.
    pub async fn ensure_can_message(&self, sender_id: Uuid, receiver_id: Uuid) -> Result<()> {
        if sender_id == receiver_id {
            return Err(Error::BadRequest("Cannot send a message to yourself".into()));
        }
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(receiver_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(Error::NotFound("Receiver not found".into()));
        }
        Ok(())
    }

    pub async fn create(&self, msg: CreateMessage) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(&format!(
            r#"
            INSERT INTO messages (sender_id, receiver_id, content, media_url, media_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(msg.sender_id)
        .bind(msg.receiver_id)
        .bind(&msg.content)
        .bind(&msg.media_url)
        .bind(msg.media_type)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            message_id = %message.id,
            sender = %message.sender_id,
            receiver = %message.receiver_id,
            media = message.media_type.is_some(),
            "message created"
        );
        Ok(message)
    }

    /// Newest messages of the pair older than the query cursor, returned oldest first.
    ///
    /// With `before_id` the cursor is the `(created_at, id)` position of the oldest message
    /// already seen, so rows sharing that timestamp are not skipped.
    pub async fn history(
        &self,
        user_id: Uuid,
        partner_id: Uuid,
        query: &MessageHistoryQuery,
    ) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT {cols} FROM (
                SELECT {cols} FROM messages
                WHERE LEAST(sender_id, receiver_id) = LEAST($1::uuid, $2::uuid)
                  AND GREATEST(sender_id, receiver_id) = GREATEST($1::uuid, $2::uuid)
                  AND (
                      $3::timestamptz IS NULL
                      OR ($4::uuid IS NULL AND created_at < $3)
                      OR ($4::uuid IS NOT NULL AND (created_at, id) < ($3, $4))
                  )
                ORDER BY created_at DESC, id DESC
                LIMIT $5
            ) page
            ORDER BY created_at ASC, id ASC
            "#,
            cols = MESSAGE_COLUMNS
        ))
        .bind(user_id)
        .bind(partner_id)
        .bind(query.before)
        .bind(query.before_id)
        .bind(query.effective_limit())
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    pub async fn mark_as_read(&self, reader_id: Uuid, partner_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = TRUE
            WHERE receiver_id = $1 AND sender_id = $2 AND is_read = FALSE
            "#,
        )
        .bind(reader_id)
        .bind(partner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE receiver_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>> {
        let rows = sqlx::query_as::<_, ConversationRow>(
            r#"
            WITH latest AS (
                SELECT DISTINCT ON (partner_id)
                    partner_id, id, sender_id, content, media_type, created_at
                FROM (
                    SELECT m.*,
                        CASE WHEN m.sender_id = $1 THEN m.receiver_id ELSE m.sender_id END AS partner_id
                    FROM messages m
                    WHERE m.sender_id = $1 OR m.receiver_id = $1
                ) mine
                ORDER BY partner_id, created_at DESC, id DESC
            )
            SELECT
                l.partner_id,
                u.name AS partner_name,
                u.role AS partner_role,
                u.avatar_url AS partner_avatar_url,
                u.freelancer_level AS partner_level,
                u.freelancer_type AS partner_type,
                l.id AS last_message_id,
                l.sender_id AS last_message_sender_id,
                l.content AS last_message_content,
                l.media_type AS last_message_media_type,
                l.created_at AS last_message_at,
                (
                    SELECT COUNT(*) FROM messages um
                    WHERE um.sender_id = l.partner_id AND um.receiver_id = $1 AND um.is_read = FALSE
                ) AS unread_count
            FROM latest l
            JOIN users u ON u.id = l.partner_id
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Conversation::from).collect())
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "SELECT {} FROM messages WHERE id = $1",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(message)
    }

    /// Sets the flag to the requested value; repeating the call is a no-op.
    pub async fn set_flag(&self, id: Uuid, is_flagged: bool) -> Result<Message> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "UPDATE messages SET is_flagged = $2 WHERE id = $1 RETURNING {}",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .bind(is_flagged)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(message_id = %id, is_flagged, "message flag updated");
        Ok(message)
    }

    /// Attaches supervisor notes. Supervision is never cleared, only re-annotated.
    pub async fn supervise(&self, id: Uuid, notes: &str, supervisor_id: Uuid) -> Result<Message> {
        let notes = notes.trim();
        if notes.is_empty() {
            return Err(Error::BadRequest("Supervisor notes must not be empty".into()));
        }
        let role: Option<UserRole> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(supervisor_id)
            .fetch_optional(&self.pool)
            .await?;
        match role {
            Some(UserRole::Admin) => {}
            Some(_) => return Err(Error::BadRequest("Supervisor must be an admin".into())),
            None => return Err(Error::NotFound("Supervisor not found".into())),
        }
        let message = sqlx::query_as::<_, Message>(&format!(
            r#"
            UPDATE messages
            SET supervisor_notes = $2, supervised_by = $3
            WHERE id = $1
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .bind(notes)
        .bind(supervisor_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(message_id = %id, supervisor = %supervisor_id, "message supervised");
        Ok(message)
    }

    pub async fn list_for_moderation(&self, query: &ModerationQuery) -> Result<Vec<Message>> {
        let limit = query.limit.unwrap_or(100).clamp(1, 500);
        let messages = sqlx::query_as::<_, Message>(&format!(
            r#"
            SELECT {} FROM messages
            WHERE ($1::boolean IS NULL OR is_flagged = $1)
              AND ($2::boolean IS NULL OR (supervised_by IS NOT NULL) = $2)
              AND ($3::uuid IS NULL OR sender_id = $3 OR receiver_id = $3)
            ORDER BY created_at DESC
            LIMIT $4
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(query.flagged)
        .bind(query.supervised)
        .bind(query.user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}
