pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    audit_service::AuditService, event_hub::EventHub, media_service::MediaService,
    message_service::MessageService, payout_account_service::PayoutAccountService,
    user_service::UserService, verification_service::VerificationService,
    video_service::VideoService, wallet_service::WalletService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub user_service: UserService,
    pub message_service: MessageService,
    pub media_service: MediaService,
    pub wallet_service: WalletService,
    pub payout_account_service: PayoutAccountService,
    pub verification_service: VerificationService,
    pub audit_service: AuditService,
    pub video_service: VideoService,
    pub events: EventHub,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        Self {
            user_service: UserService::new(pool.clone()),
            message_service: MessageService::new(pool.clone()),
            media_service: MediaService::new(&config.uploads_dir, config.max_upload_bytes),
            wallet_service: WalletService::new(pool.clone(), config.min_withdrawal_amount),
            payout_account_service: PayoutAccountService::new(pool.clone()),
            verification_service: VerificationService::new(pool.clone()),
            audit_service: AuditService::new(pool.clone()),
            video_service: VideoService::new(
                config.video_sdk_key.clone(),
                config.video_sdk_secret.clone(),
            ),
            events: EventHub::new(config.event_buffer),
            pool,
        }
    }
}
