use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};

use crate::{
    dto::video_dto::{CreateVideoSessionPayload, VideoSessionResponse},
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/video/sessions",
    request_body = CreateVideoSessionPayload,
    responses(
        (status = 200, description = "Signed session for the video SDK", body = Json<VideoSessionResponse>),
        (status = 400, description = "Partner is the caller"),
        (status = 404, description = "Partner not found"),
        (status = 503, description = "Video calling is not configured")
    )
)]
#[axum::debug_handler]
pub async fn create_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateVideoSessionPayload>,
) -> Result<impl IntoResponse> {
    let caller = claims.user_id()?;
    let session = state
        .video_service
        .issue_session(caller, payload.partner_id, true)?;
    state
        .message_service
        .ensure_can_message(caller, payload.partner_id)
        .await?;

    Ok(Json(VideoSessionResponse {
        topic: session.topic,
        signature: session.signature,
        expires_at: session.expires_at,
    }))
}
