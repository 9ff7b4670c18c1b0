use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::payout_account::PayoutMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "withdrawal_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl WithdrawalStatus {
    pub const ALL: [WithdrawalStatus; 4] = [
        WithdrawalStatus::Pending,
        WithdrawalStatus::Approved,
        WithdrawalStatus::Rejected,
        WithdrawalStatus::Completed,
    ];

    /// `pending -> approved | rejected`, `approved -> completed`. Nothing leaves a terminal state.
    pub fn can_transition_to(self, next: WithdrawalStatus) -> bool {
        matches!(
            (self, next),
            (WithdrawalStatus::Pending, WithdrawalStatus::Approved)
                | (WithdrawalStatus::Pending, WithdrawalStatus::Rejected)
                | (WithdrawalStatus::Approved, WithdrawalStatus::Completed)
        )
    }

    /// Still holding funds out of the available balance.
    pub fn is_outstanding(self) -> bool {
        matches!(self, WithdrawalStatus::Pending | WithdrawalStatus::Approved)
    }

    /// Database names of the statuses counted against the available balance.
    pub fn outstanding_names() -> Vec<&'static str> {
        Self::ALL
            .into_iter()
            .filter(|status| status.is_outstanding())
            .map(WithdrawalStatus::as_str)
            .collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
            WithdrawalStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub status: WithdrawalStatus,
    pub payment_method: PayoutMethod,
    pub account_details: String,
    pub notes: Option<String>,
    pub admin_id: Option<Uuid>,
    pub payment_id: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}
