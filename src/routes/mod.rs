pub mod auth;
pub mod events;
pub mod health;
pub mod messages;
pub mod moderation;
pub mod verification;
pub mod video;
pub mod wallet;
pub mod webhook;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    config::get_config,
    middleware::{
        auth::{require_admin, require_bearer_auth},
        cors::cors_layer,
        rate_limit::{new_rps_state, rps_middleware},
    },
    AppState,
};

/// Slack on top of the media limit for multipart framing and the other fields.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let config = get_config();

    let public_api = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/webhooks/payouts", post(webhook::handle_payout_settlement));

    let user_api = Router::new()
        .route("/api/me", get(auth::me))
        .route("/api/conversations", get(messages::list_conversations))
        .route("/api/messages", post(messages::send_message))
        .route("/api/messages/media", post(messages::send_media))
        .route("/api/messages/unread", get(messages::unread_count))
        .route("/api/messages/:partner_id", get(messages::get_messages))
        .route("/api/messages/:partner_id/read", post(messages::mark_read))
        .route("/api/earnings", get(wallet::get_earnings))
        .route("/api/withdrawal-requests", post(wallet::create_withdrawal))
        .route("/api/withdrawal-requests/my", get(wallet::list_my_withdrawals))
        .route(
            "/api/payout-accounts",
            get(wallet::list_payout_accounts).post(wallet::create_payout_account),
        )
        .route("/api/payout-accounts/:id", delete(wallet::delete_payout_account))
        .route("/api/verification-requests", post(verification::submit_verification))
        .route(
            "/api/verification-requests/my",
            get(verification::list_my_verifications),
        )
        .route("/api/events", get(events::stream_events))
        .route("/api/video/sessions", post(video::create_session))
        .route_layer(from_fn(require_bearer_auth));

    let admin_api = Router::new()
        .route("/api/admin/messages", get(moderation::list_messages))
        .route("/api/admin/messages/:id/flag", patch(moderation::flag_message))
        .route(
            "/api/admin/messages/:id/supervise",
            patch(moderation::supervise_message),
        )
        .route("/api/admin/audit-logs", get(moderation::list_audit_logs))
        .route("/api/admin/withdrawal-requests", get(wallet::list_withdrawals))
        .route(
            "/api/admin/withdrawal-requests/:id/status",
            patch(wallet::update_withdrawal_status),
        )
        .route("/api/verification-requests", get(verification::list_verifications))
        .route(
            "/api/verification-requests/:id/status",
            patch(verification::review_verification),
        )
        .route_layer(from_fn(require_admin));

    let api = public_api
        .merge(user_api)
        .merge(admin_api)
        .layer(from_fn_with_state(
            new_rps_state(config.api_rps, &config.jwt_secret),
            rps_middleware,
        ));

    tracing::info!("Serving uploads from: {}", config.uploads_dir);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::readiness))
        .merge(api)
        .nest_service("/uploads", ServeDir::new(&config.uploads_dir))
        .fallback(health::not_found)
        .with_state(state)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config.max_upload_bytes + BODY_OVERHEAD_BYTES))
}
