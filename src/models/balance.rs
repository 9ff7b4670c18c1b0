use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Earnings and withdrawal sums as read from storage.
#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct BalanceTotals {
    pub total_earnings: Decimal,
    pub withdrawn: Decimal,
    pub pending_withdrawals: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBalance {
    pub total_earnings: Decimal,
    pub withdrawn: Decimal,
    pub pending_withdrawals: Decimal,
    pub available: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawalRejection {
    NotPositive,
    BelowMinimum { minimum: Decimal },
    ExceedsAvailable { available: Decimal },
}

impl std::fmt::Display for WithdrawalRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WithdrawalRejection::NotPositive => write!(f, "Withdrawal amount must be positive"),
            WithdrawalRejection::BelowMinimum { minimum } => {
                write!(f, "Minimum withdrawal amount is {}", minimum)
            }
            WithdrawalRejection::ExceedsAvailable { available } => {
                write!(f, "Insufficient balance: {} available", available)
            }
        }
    }
}

impl UserBalance {
    pub fn from_totals(totals: BalanceTotals) -> Self {
        let available =
            (totals.total_earnings - totals.withdrawn - totals.pending_withdrawals).max(Decimal::ZERO);
        Self {
            total_earnings: totals.total_earnings,
            withdrawn: totals.withdrawn,
            pending_withdrawals: totals.pending_withdrawals,
            available,
        }
    }
}

/// Bounds check that runs before any storage access.
pub fn check_minimum(amount: Decimal, minimum: Decimal) -> Result<(), WithdrawalRejection> {
    if amount <= Decimal::ZERO {
        return Err(WithdrawalRejection::NotPositive);
    }
    if amount < minimum {
        return Err(WithdrawalRejection::BelowMinimum { minimum });
    }
    Ok(())
}

pub fn check_withdrawal(
    balance: &UserBalance,
    amount: Decimal,
    minimum: Decimal,
) -> Result<(), WithdrawalRejection> {
    check_minimum(amount, minimum)?;
    if amount > balance.available {
        return Err(WithdrawalRejection::ExceedsAvailable {
            available: balance.available,
        });
    }
    Ok(())
}
