use crate::error::Result;
use crate::models::audit_log::AuditLog;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct AuditService {
    pool: PgPool,
}

impl AuditService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn log(
        &self,
        user_id: Option<Uuid>,
        action: &str,
        entity_type: &str,
        entity_id: Uuid,
        changes: Option<JsonValue>,
    ) -> Result<AuditLog> {
        let row = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (user_id, action, entity_type, entity_id, changes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, action, entity_type, entity_id, changes, created_at
            "#,
        )
        .bind(user_id)
        .bind(action)
        .bind(entity_type)
        .bind(entity_id)
        .bind(changes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Audit failures never fail the admin action that triggered them.
    pub async fn record(
        &self,
        user_id: Uuid,
        action: &str,
        entity_type: &str,
        entity_id: Uuid,
        changes: JsonValue,
    ) {
        if let Err(e) = self
            .log(Some(user_id), action, entity_type, entity_id, Some(changes))
            .await
        {
            tracing::error!(error = ?e, action, entity_type, %entity_id, "failed to write audit log");
        }
    }

    pub async fn list(&self, entity_type: Option<&str>, limit: i64) -> Result<Vec<AuditLog>> {
        let rows = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, user_id, action, entity_type, entity_id, changes, created_at
            FROM audit_logs
            WHERE ($1::text IS NULL OR entity_type = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(entity_type)
        .bind(limit.clamp(1, 500))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
