use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::wallet_dto::CreatePayoutAccountPayload;
use crate::error::{Error, Result};
use crate::models::payout_account::PayoutAccount;

#[derive(Clone)]
pub struct PayoutAccountService {
    pool: PgPool,
}

impl PayoutAccountService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<PayoutAccount>> {
        let accounts = sqlx::query_as::<_, PayoutAccount>(
            r#"
            SELECT id, user_id, method, account_details, label, is_default, created_at
            FROM payout_accounts
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    /// The user's first account always becomes the default.
    pub async fn create(
        &self,
        user_id: Uuid,
        payload: CreatePayoutAccountPayload,
    ) -> Result<PayoutAccount> {
        let mut tx = self.pool.begin().await?;

        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM payout_accounts WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;
        let make_default = payload.is_default || existing == 0;

        if make_default {
            sqlx::query("UPDATE payout_accounts SET is_default = FALSE WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let account = sqlx::query_as::<_, PayoutAccount>(
            r#"
            INSERT INTO payout_accounts (user_id, method, account_details, label, is_default)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, method, account_details, label, is_default, created_at
            "#,
        )
        .bind(user_id)
        .bind(payload.method)
        .bind(payload.account_details.trim())
        .bind(&payload.label)
        .bind(make_default)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(account_id = %account.id, user = %user_id, "payout account added");
        Ok(account)
    }

    pub async fn delete(&self, user_id: Uuid, account_id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM payout_accounts WHERE id = $1 AND user_id = $2")
            .bind(account_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Payout account not found".into()));
        }
        Ok(())
    }
}
