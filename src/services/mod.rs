pub mod audit_service;
pub mod event_hub;
pub mod media_service;
pub mod message_service;
pub mod payout_account_service;
pub mod user_service;
pub mod verification_service;
pub mod video_service;
pub mod wallet_service;
