pub mod audit_log;
pub mod balance;
pub mod conversation;
pub mod message;
pub mod payment;
pub mod payout_account;
pub mod user;
pub mod verification;
pub mod withdrawal;
