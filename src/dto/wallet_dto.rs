use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::balance::UserBalance;
use crate::models::payment::Payment;
use crate::models::payout_account::PayoutMethod;
use crate::models::withdrawal::WithdrawalStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsResponse {
    pub balance: UserBalance,
    pub minimum_withdrawal: Decimal,
    pub recent_payments: Vec<Payment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWithdrawalPayload {
    pub amount: Decimal,
    pub payout_account_id: Option<Uuid>,
    pub payment_method: Option<PayoutMethod>,
    #[validate(length(min = 1, max = 1000))]
    pub account_details: Option<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Where the money goes, resolved from a stored account or given inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutTarget {
    Stored(Uuid),
    Inline {
        method: PayoutMethod,
        account_details: String,
    },
}

impl CreateWithdrawalPayload {
    pub fn payout_target(&self) -> Option<PayoutTarget> {
        if let Some(id) = self.payout_account_id {
            return Some(PayoutTarget::Stored(id));
        }
        match (self.payment_method, self.account_details.as_ref()) {
            (Some(method), Some(details)) if !details.trim().is_empty() => {
                Some(PayoutTarget::Inline {
                    method,
                    account_details: details.trim().to_string(),
                })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWithdrawalStatusPayload {
    pub status: WithdrawalStatus,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub payment_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WithdrawalListQuery {
    pub status: Option<WithdrawalStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayoutAccountPayload {
    pub method: PayoutMethod,
    #[validate(length(min = 3, max = 1000))]
    pub account_details: String,
    #[validate(length(max = 100))]
    pub label: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Paid,
    Failed,
}

/// Callback body sent by the payout processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutSettlement {
    pub withdrawal_id: Uuid,
    pub payment_id: String,
    pub status: SettlementStatus,
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> CreateWithdrawalPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn stored_account_wins_over_inline_details() {
        let id = Uuid::new_v4();
        let p = payload(&format!(
            r#"{{"amount":"150","payoutAccountId":"{}","paymentMethod":"paypal","accountDetails":"x@y.z"}}"#,
            id
        ));
        assert_eq!(p.payout_target(), Some(PayoutTarget::Stored(id)));
    }

    #[test]
    fn inline_details_need_method_and_text() {
        let p = payload(r#"{"amount":150,"paymentMethod":"bank_transfer","accountDetails":"  DE89 3704  "}"#);
        assert_eq!(
            p.payout_target(),
            Some(PayoutTarget::Inline {
                method: PayoutMethod::BankTransfer,
                account_details: "DE89 3704".into()
            })
        );
        let p = payload(r#"{"amount":150,"paymentMethod":"paypal"}"#);
        assert_eq!(p.payout_target(), None);
        let p = payload(r#"{"amount":150,"paymentMethod":"paypal","accountDetails":"   "}"#);
        assert_eq!(p.payout_target(), None);
    }

    #[test]
    fn settlement_parses_processor_body() {
        let s: PayoutSettlement = serde_json::from_str(&format!(
            r#"{{"withdrawalId":"{}","paymentId":"po_123","status":"paid"}}"#,
            Uuid::new_v4()
        ))
        .unwrap();
        assert_eq!(s.status, SettlementStatus::Paid);
        assert_eq!(s.payment_id, "po_123");
    }
}
