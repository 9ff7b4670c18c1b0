use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::message_dto::{FlagMessagePayload, ModerationQuery, SuperviseMessagePayload},
    error::Result,
    middleware::auth::Claims,
    services::event_hub::MarketEvent,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuditLogQuery {
    pub entity_type: Option<String>,
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/admin/messages",
    params(
        ("flagged" = Option<bool>, Query, description = "Only flagged or unflagged messages"),
        ("supervised" = Option<bool>, Query, description = "Only supervised or unsupervised messages"),
        ("userId" = Option<Uuid>, Query, description = "Messages sent or received by this user")
    ),
    responses(
        (status = 200, description = "Messages for moderation, newest first"),
        (status = 403, description = "Caller is not an admin")
    )
)]
#[axum::debug_handler]
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<ModerationQuery>,
) -> Result<impl IntoResponse> {
    let messages = state.message_service.list_for_moderation(&query).await?;
    Ok(Json(messages))
}

#[axum::debug_handler]
pub async fn flag_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<FlagMessagePayload>,
) -> Result<impl IntoResponse> {
    let admin_id = claims.user_id()?;
    let message = state.message_service.set_flag(id, payload.is_flagged).await?;

    state
        .audit_service
        .record(
            admin_id,
            if payload.is_flagged { "message_flagged" } else { "message_unflagged" },
            "message",
            message.id,
            json!({ "isFlagged": payload.is_flagged }),
        )
        .await;
    state.events.publish(MarketEvent::MessageModerated {
        message: message.clone(),
    });

    Ok(Json(message))
}

#[utoipa::path(
    patch,
    path = "/api/admin/messages/{id}/supervise",
    request_body = SuperviseMessagePayload,
    params(("id" = Uuid, Path, description = "Message id")),
    responses(
        (status = 200, description = "Supervision notes stored"),
        (status = 400, description = "Notes are empty"),
        (status = 404, description = "Message not found")
    )
)]
#[axum::debug_handler]
pub async fn supervise_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SuperviseMessagePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let admin_id = claims.user_id()?;
    let supervisor_id = payload.supervised_by.unwrap_or(admin_id);

    let message = state
        .message_service
        .supervise(id, &payload.supervisor_notes, supervisor_id)
        .await?;

    state
        .audit_service
        .record(
            admin_id,
            "message_supervised",
            "message",
            message.id,
            json!({
                "supervisorNotes": payload.supervisor_notes,
                "supervisedBy": supervisor_id,
            }),
        )
        .await;
    state.events.publish(MarketEvent::MessageModerated {
        message: message.clone(),
    });

    Ok(Json(message))
}

#[axum::debug_handler]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<AuditLogQuery>,
) -> Result<impl IntoResponse> {
    let limit = query.limit.unwrap_or(100).clamp(1, 500);
    let logs = state
        .audit_service
        .list(query.entity_type.as_deref(), limit)
        .await?;
    Ok(Json(logs))
}
