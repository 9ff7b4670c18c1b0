use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::message_dto::{
        MarkReadResponse, MessageHistoryQuery, SendMessagePayload, UnreadCountResponse,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    models::message::CreateMessage,
    services::event_hub::MarketEvent,
    AppState,
};

const MAX_CAPTION_CHARS: usize = 5000;

#[utoipa::path(
    get,
    path = "/api/conversations",
    responses(
        (status = 200, description = "Conversations of the caller, newest first")
    )
)]
#[axum::debug_handler]
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let conversations = state
        .message_service
        .conversations(claims.user_id()?)
        .await?;
    Ok(Json(conversations))
}

#[utoipa::path(
    get,
    path = "/api/messages/{partner_id}",
    params(
        ("partner_id" = Uuid, Path, description = "Conversation partner"),
        ("before" = Option<String>, Query, description = "Only messages older than this RFC 3339 timestamp"),
        ("beforeId" = Option<Uuid>, Query, description = "Id of the oldest message already seen, breaks timestamp ties"),
        ("limit" = Option<i64>, Query, description = "Page size, at most 500")
    ),
    responses(
        (status = 200, description = "Messages ordered oldest first")
    )
)]
#[axum::debug_handler]
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(partner_id): Path<Uuid>,
    Query(query): Query<MessageHistoryQuery>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let messages = state
        .message_service
        .history(user_id, partner_id, &query)
        .await?;

    match state.message_service.mark_as_read(user_id, partner_id).await {
        Ok(0) => {}
        Ok(count) => state.events.publish(MarketEvent::MessagesRead {
            reader_id: user_id,
            partner_id,
            count,
        }),
        Err(e) => tracing::warn!(error = ?e, "failed to mark messages as read"),
    }

    Ok(Json(messages))
}

#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = SendMessagePayload,
    responses(
        (status = 201, description = "Message stored"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Receiver not found")
    )
)]
#[axum::debug_handler]
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let sender_id = claims.user_id()?;
    state
        .message_service
        .ensure_can_message(sender_id, payload.receiver_id)
        .await?;

    let message = state
        .message_service
        .create(CreateMessage {
            sender_id,
            receiver_id: payload.receiver_id,
            content: payload.content,
            media_url: None,
            media_type: None,
        })
        .await?;

    state.events.publish(MarketEvent::MessageCreated {
        message: message.clone(),
    });
    Ok((StatusCode::CREATED, Json(message)))
}

#[axum::debug_handler]
pub async fn send_media(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let sender_id = claims.user_id()?;
    let mut receiver_id: Option<Uuid> = None;
    let mut caption = String::new();
    let mut file: Option<(String, bytes::Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "receiverId" => {
                let raw = field.text().await?;
                receiver_id = Some(
                    Uuid::parse_str(raw.trim())
                        .map_err(|_| Error::BadRequest("receiverId must be a UUID".into()))?,
                );
            }
            "caption" => caption = field.text().await?.trim().to_string(),
            "file" => {
                let filename = field.file_name().unwrap_or("upload.bin").to_string();
                let data = field.bytes().await.map_err(|e| {
                    tracing::error!("Failed to read media bytes: {}", e);
                    Error::BadRequest("Failed to read file upload".into())
                })?;
                file = Some((filename, data));
            }
            other => tracing::debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    let receiver_id = receiver_id.ok_or_else(|| Error::BadRequest("receiverId is required".into()))?;
    let (filename, data) = file.ok_or_else(|| Error::BadRequest("file is required".into()))?;
    if caption.chars().count() > MAX_CAPTION_CHARS {
        return Err(Error::BadRequest("Caption is too long".into()));
    }

    state
        .message_service
        .ensure_can_message(sender_id, receiver_id)
        .await?;
    let stored = state.media_service.store(&filename, &data).await?;

    let created = state
        .message_service
        .create(CreateMessage {
            sender_id,
            receiver_id,
            content: caption,
            media_url: Some(stored.url.clone()),
            media_type: Some(stored.media_type),
        })
        .await;
    let message = match created {
        Ok(message) => message,
        Err(e) => {
            state.media_service.discard(&stored).await;
            return Err(e);
        }
    };

    state.events.publish(MarketEvent::MessageCreated {
        message: message.clone(),
    });
    Ok((StatusCode::CREATED, Json(message)))
}

#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(partner_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let updated = state.message_service.mark_as_read(user_id, partner_id).await?;
    if updated > 0 {
        state.events.publish(MarketEvent::MessagesRead {
            reader_id: user_id,
            partner_id,
            count: updated,
        });
    }
    Ok(Json(MarkReadResponse { updated }))
}

#[axum::debug_handler]
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let unread = state.message_service.unread_count(claims.user_id()?).await?;
    Ok(Json(UnreadCountResponse { unread }))
}
