use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::dto::wallet_dto::{PayoutSettlement, PayoutTarget, SettlementStatus};
use crate::error::{Error, Result};
use crate::models::balance::{check_withdrawal, BalanceTotals, UserBalance};
use crate::models::payment::Payment;
use crate::models::payout_account::PayoutMethod;
use crate::models::withdrawal::{WithdrawalRequest, WithdrawalStatus};

const WITHDRAWAL_COLUMNS: &str = "id, user_id, amount, status, payment_method, account_details, \
     notes, admin_id, payment_id, requested_at, processed_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementDecision {
    Complete,
    AlreadySettled,
    RecordFailure,
}

/// What a processor callback means for a request in `status`.
pub fn decide_settlement(
    status: WithdrawalStatus,
    existing_payment_id: Option<&str>,
    settlement: &PayoutSettlement,
) -> Result<SettlementDecision> {
    match settlement.status {
        SettlementStatus::Failed => Ok(SettlementDecision::RecordFailure),
        SettlementStatus::Paid => match status {
            WithdrawalStatus::Completed
                if existing_payment_id == Some(settlement.payment_id.as_str()) =>
            {
                Ok(SettlementDecision::AlreadySettled)
            }
            current if current.can_transition_to(WithdrawalStatus::Completed) => {
                Ok(SettlementDecision::Complete)
            }
            current => Err(Error::Conflict(format!(
                "Withdrawal request is {} and cannot be settled",
                current.as_str()
            ))),
        },
    }
}

#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    Completed(WithdrawalRequest),
    AlreadySettled(WithdrawalRequest),
    FailureRecorded(WithdrawalRequest),
}

#[derive(Clone)]
pub struct WalletService {
    pool: PgPool,
    minimum_withdrawal: Decimal,
}

async fn load_totals<'e, E: PgExecutor<'e>>(executor: E, user_id: Uuid) -> Result<BalanceTotals> {
    let totals = sqlx::query_as::<_, BalanceTotals>(
        r#"
        SELECT
            COALESCE((SELECT SUM(amount) FROM payments
                      WHERE payee_id = $1 AND status = 'completed'), 0) AS total_earnings,
            COALESCE((SELECT SUM(amount) FROM withdrawal_requests
                      WHERE user_id = $1 AND status = 'completed'), 0) AS withdrawn,
            COALESCE((SELECT SUM(amount) FROM withdrawal_requests
                      WHERE user_id = $1 AND status::text = ANY($2)), 0) AS pending_withdrawals
        "#,
    )
    .bind(user_id)
    .bind(WithdrawalStatus::outstanding_names())
    .fetch_one(executor)
    .await?;
    Ok(totals)
}

impl WalletService {
    pub fn new(pool: PgPool, minimum_withdrawal: Decimal) -> Self {
        Self {
            pool,
            minimum_withdrawal,
        }
    }

    pub fn minimum_withdrawal(&self) -> Decimal {
        self.minimum_withdrawal
    }

    pub async fn balance(&self, user_id: Uuid) -> Result<UserBalance> {
        let totals = load_totals(&self.pool, user_id).await?;
        Ok(UserBalance::from_totals(totals))
    }

    pub async fn recent_payments(&self, user_id: Uuid, limit: i64) -> Result<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, payer_id, payee_id, amount, status, description, created_at
            FROM payments
            WHERE payee_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }

    /// Creates a pending request. The user row stays locked until commit so
    /// concurrent requests see each other's pending amounts.
    pub async fn request_withdrawal(
        &self,
        user_id: Uuid,
        amount: Decimal,
        target: PayoutTarget,
        notes: Option<String>,
    ) -> Result<WithdrawalRequest> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(Error::NotFound("User not found".into()));
        }

        let (method, account_details) = match target {
            PayoutTarget::Stored(account_id) => {
                let account: Option<(PayoutMethod, String)> = sqlx::query_as(
                    "SELECT method, account_details FROM payout_accounts WHERE id = $1 AND user_id = $2",
                )
                .bind(account_id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
                account.ok_or_else(|| Error::NotFound("Payout account not found".into()))?
            }
            PayoutTarget::Inline {
                method,
                account_details,
            } => (method, account_details),
        };

        let balance = UserBalance::from_totals(load_totals(&mut *tx, user_id).await?);
        if let Err(rejection) = check_withdrawal(&balance, amount, self.minimum_withdrawal) {
            tracing::info!(user = %user_id, %amount, available = %balance.available, "withdrawal rejected");
            return Err(Error::BadRequest(rejection.to_string()));
        }

        let request = sqlx::query_as::<_, WithdrawalRequest>(&format!(
            r#"
            INSERT INTO withdrawal_requests (user_id, amount, payment_method, account_details, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            WITHDRAWAL_COLUMNS
        ))
        .bind(user_id)
        .bind(amount)
        .bind(method)
        .bind(&account_details)
        .bind(&notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(withdrawal_id = %request.id, user = %user_id, %amount, "withdrawal requested");
        Ok(request)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<WithdrawalRequest>> {
        let items = sqlx::query_as::<_, WithdrawalRequest>(&format!(
            "SELECT {} FROM withdrawal_requests WHERE user_id = $1 ORDER BY requested_at DESC",
            WITHDRAWAL_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn list(&self, status: Option<WithdrawalStatus>) -> Result<Vec<WithdrawalRequest>> {
        let items = sqlx::query_as::<_, WithdrawalRequest>(&format!(
            r#"
            SELECT {} FROM withdrawal_requests
            WHERE ($1::withdrawal_status IS NULL OR status = $1)
            ORDER BY requested_at ASC
            "#,
            WITHDRAWAL_COLUMNS
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<WithdrawalRequest> {
        let item = sqlx::query_as::<_, WithdrawalRequest>(&format!(
            "SELECT {} FROM withdrawal_requests WHERE id = $1",
            WITHDRAWAL_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    /// Moves a request along its state machine. The update only applies if the
    /// status is still the one that was validated.
    pub async fn transition(
        &self,
        id: Uuid,
        next: WithdrawalStatus,
        admin_id: Option<Uuid>,
        notes: Option<String>,
        payment_id: Option<String>,
    ) -> Result<WithdrawalRequest> {
        let current = self.get_by_id(id).await?;
        if !current.status.can_transition_to(next) {
            return Err(Error::Conflict(format!(
                "Cannot move withdrawal request from {} to {}",
                current.status.as_str(),
                next.as_str()
            )));
        }

        let updated = sqlx::query_as::<_, WithdrawalRequest>(&format!(
            r#"
            UPDATE withdrawal_requests
            SET status = $2,
                admin_id = COALESCE($3, admin_id),
                notes = COALESCE($4, notes),
                payment_id = COALESCE($5, payment_id),
                processed_at = NOW()
            WHERE id = $1 AND status = $6
            RETURNING {}
            "#,
            WITHDRAWAL_COLUMNS
        ))
        .bind(id)
        .bind(next)
        .bind(admin_id)
        .bind(&notes)
        .bind(&payment_id)
        .bind(current.status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::Conflict("Withdrawal request was modified concurrently".into()))?;

        tracing::info!(
            withdrawal_id = %id,
            from = current.status.as_str(),
            to = next.as_str(),
            admin = ?admin_id,
            "withdrawal status changed"
        );
        Ok(updated)
    }

    pub async fn settle(&self, settlement: &PayoutSettlement) -> Result<SettlementOutcome> {
        let current = self.get_by_id(settlement.withdrawal_id).await?;
        match decide_settlement(current.status, current.payment_id.as_deref(), settlement)? {
            SettlementDecision::AlreadySettled => Ok(SettlementOutcome::AlreadySettled(current)),
            SettlementDecision::Complete => {
                let done = self
                    .transition(
                        current.id,
                        WithdrawalStatus::Completed,
                        None,
                        None,
                        Some(settlement.payment_id.clone()),
                    )
                    .await?;
                Ok(SettlementOutcome::Completed(done))
            }
            SettlementDecision::RecordFailure => {
                let note = format!(
                    "Payout {} failed: {}",
                    settlement.payment_id,
                    settlement.reason.as_deref().unwrap_or("no reason given")
                );
                let updated = sqlx::query_as::<_, WithdrawalRequest>(&format!(
                    r#"
                    UPDATE withdrawal_requests
                    SET notes = CONCAT_WS(E'\n', notes, $2)
                    WHERE id = $1
                    RETURNING {}
                    "#,
                    WITHDRAWAL_COLUMNS
                ))
                .bind(current.id)
                .bind(&note)
                .fetch_one(&self.pool)
                .await?;
                tracing::warn!(withdrawal_id = %current.id, payment_id = %settlement.payment_id, "payout failed");
                Ok(SettlementOutcome::FailureRecorded(updated))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settlement(status: SettlementStatus, payment_id: &str) -> PayoutSettlement {
        PayoutSettlement {
            withdrawal_id: Uuid::new_v4(),
            payment_id: payment_id.into(),
            status,
            reason: None,
        }
    }

    #[test]
    fn paid_completes_approved_request() {
        let s = settlement(SettlementStatus::Paid, "po_1");
        assert_eq!(
            decide_settlement(WithdrawalStatus::Approved, None, &s).unwrap(),
            SettlementDecision::Complete
        );
    }

    #[test]
    fn redelivery_is_idempotent() {
        let s = settlement(SettlementStatus::Paid, "po_1");
        assert_eq!(
            decide_settlement(WithdrawalStatus::Completed, Some("po_1"), &s).unwrap(),
            SettlementDecision::AlreadySettled
        );
        assert!(matches!(
            decide_settlement(WithdrawalStatus::Completed, Some("po_2"), &s),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn paid_cannot_skip_approval() {
        let s = settlement(SettlementStatus::Paid, "po_1");
        assert!(matches!(
            decide_settlement(WithdrawalStatus::Pending, None, &s),
            Err(Error::Conflict(_))
        ));
        assert!(matches!(
            decide_settlement(WithdrawalStatus::Rejected, None, &s),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn failure_never_changes_status() {
        let s = settlement(SettlementStatus::Failed, "po_1");
        for status in [
            WithdrawalStatus::Pending,
            WithdrawalStatus::Approved,
            WithdrawalStatus::Completed,
        ] {
            assert_eq!(
                decide_settlement(status, None, &s).unwrap(),
                SettlementDecision::RecordFailure
            );
        }
    }
}
