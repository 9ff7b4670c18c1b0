use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::message::MediaType;
use crate::models::user::{FreelancerLevel, FreelancerType, Participant, UserRole};

/// Flat row produced by the conversation listing query.
#[derive(Debug, Clone, FromRow)]
pub struct ConversationRow {
    pub partner_id: Uuid,
    pub partner_name: String,
    pub partner_role: UserRole,
    pub partner_avatar_url: Option<String>,
    pub partner_level: Option<FreelancerLevel>,
    pub partner_type: Option<FreelancerType>,
    pub last_message_id: Uuid,
    pub last_message_sender_id: Uuid,
    pub last_message_content: String,
    pub last_message_media_type: Option<MediaType>,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub media_type: Option<MediaType>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub partner: Participant,
    pub last_message: LastMessage,
    pub unread_count: i64,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Self {
            partner: Participant::from_parts(
                row.partner_id,
                row.partner_name,
                row.partner_role,
                row.partner_avatar_url,
                row.partner_level,
                row.partner_type,
            ),
            last_message: LastMessage {
                id: row.last_message_id,
                sender_id: row.last_message_sender_id,
                content: row.last_message_content,
                media_type: row.last_message_media_type,
                created_at: row.last_message_at,
            },
            unread_count: row.unread_count,
        }
    }
}
