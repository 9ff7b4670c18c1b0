use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::verification_dto::{
        ReviewVerificationPayload, SubmitVerificationPayload, VerificationListQuery,
    },
    error::Result,
    middleware::auth::Claims,
    services::event_hub::MarketEvent,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/verification-requests",
    request_body = SubmitVerificationPayload,
    responses(
        (status = 201, description = "Verification request submitted"),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "A request is already awaiting review")
    )
)]
#[axum::debug_handler]
pub async fn submit_verification(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitVerificationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let request = state
        .verification_service
        .submit(claims.user_id()?, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[axum::debug_handler]
pub async fn list_my_verifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let items = state
        .verification_service
        .list_for_user(claims.user_id()?)
        .await?;
    Ok(Json(items))
}

#[axum::debug_handler]
pub async fn list_verifications(
    State(state): State<AppState>,
    Query(query): Query<VerificationListQuery>,
) -> Result<impl IntoResponse> {
    let items = state.verification_service.list(query.status).await?;
    Ok(Json(items))
}

#[utoipa::path(
    patch,
    path = "/api/verification-requests/{id}/status",
    params(("id" = Uuid, Path, description = "Verification request id")),
    request_body = ReviewVerificationPayload,
    responses(
        (status = 200, description = "Request reviewed"),
        (status = 400, description = "Target status is not a review outcome"),
        (status = 404, description = "Verification request not found"),
        (status = 409, description = "Request was already reviewed")
    )
)]
#[axum::debug_handler]
pub async fn review_verification(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewVerificationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let admin_id = claims.user_id()?;

    let request = state
        .verification_service
        .review(id, payload.status, admin_id, payload.review_notes.clone())
        .await?;

    state
        .audit_service
        .record(
            admin_id,
            "verification_reviewed",
            "verification_request",
            request.id,
            json!({
                "status": payload.status,
                "reviewNotes": payload.review_notes,
            }),
        )
        .await;
    state.events.publish(MarketEvent::VerificationReviewed {
        request: request.clone(),
    });

    Ok(Json(request))
}
