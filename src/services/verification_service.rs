use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::verification_dto::SubmitVerificationPayload;
use crate::error::{Error, Result};
use crate::models::verification::{VerificationRequest, VerificationStatus};

const VERIFICATION_COLUMNS: &str = "id, user_id, document_type, document_url, additional_info, \
     status, reviewer_id, review_notes, submitted_at, reviewed_at";

#[derive(Clone)]
pub struct VerificationService {
    pool: PgPool,
}

impl VerificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn submit(
        &self,
        user_id: Uuid,
        payload: SubmitVerificationPayload,
    ) -> Result<VerificationRequest> {
        let pending: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM verification_requests WHERE user_id = $1 AND status = 'pending')",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        if pending {
            return Err(Error::Conflict(
                "A verification request is already awaiting review".into(),
            ));
        }

        let request = sqlx::query_as::<_, VerificationRequest>(&format!(
            r#"
            INSERT INTO verification_requests (user_id, document_type, document_url, additional_info)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            VERIFICATION_COLUMNS
        ))
        .bind(user_id)
        .bind(payload.document_type)
        .bind(&payload.document_url)
        .bind(&payload.additional_info)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match Error::from(e) {
            // idx_verification_one_pending catches a concurrent submit that passed the check above
            Error::Conflict(_) => {
                Error::Conflict("A verification request is already awaiting review".into())
            }
            other => other,
        })?;

        tracing::info!(verification_id = %request.id, user = %user_id, "verification submitted");
        Ok(request)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<VerificationRequest>> {
        let items = sqlx::query_as::<_, VerificationRequest>(&format!(
            "SELECT {} FROM verification_requests WHERE user_id = $1 ORDER BY submitted_at DESC",
            VERIFICATION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn list(&self, status: Option<VerificationStatus>) -> Result<Vec<VerificationRequest>> {
        let items = sqlx::query_as::<_, VerificationRequest>(&format!(
            r#"
            SELECT {} FROM verification_requests
            WHERE ($1::verification_status IS NULL OR status = $1)
            ORDER BY submitted_at ASC
            "#,
            VERIFICATION_COLUMNS
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Terminal review of a pending request; approval marks the user verified.
    pub async fn review(
        &self,
        id: Uuid,
        next: VerificationStatus,
        reviewer_id: Uuid,
        review_notes: Option<String>,
    ) -> Result<VerificationRequest> {
        if next == VerificationStatus::Pending {
            return Err(Error::BadRequest(
                "Review status must be approved or rejected".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let current: VerificationStatus =
            sqlx::query_scalar("SELECT status FROM verification_requests WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if !current.can_transition_to(next) {
            return Err(Error::Conflict(
                "Verification request has already been reviewed".into(),
            ));
        }

        let request = sqlx::query_as::<_, VerificationRequest>(&format!(
            r#"
            UPDATE verification_requests
            SET status = $2, reviewer_id = $3, review_notes = $4, reviewed_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            VERIFICATION_COLUMNS
        ))
        .bind(id)
        .bind(next)
        .bind(reviewer_id)
        .bind(&review_notes)
        .fetch_one(&mut *tx)
        .await?;

        if next == VerificationStatus::Approved {
            sqlx::query("UPDATE users SET is_verified = TRUE WHERE id = $1")
                .bind(request.user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(verification_id = %id, status = ?next, reviewer = %reviewer_id, "verification reviewed");
        Ok(request)
    }
}
