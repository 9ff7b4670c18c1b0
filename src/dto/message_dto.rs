use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub receiver_id: Uuid,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct MessageHistoryQuery {
    pub before: Option<DateTime<Utc>>,
    /// Tie-breaker for `before`: the id of the oldest message already seen.
    pub before_id: Option<Uuid>,
    pub limit: Option<i64>,
}

impl MessageHistoryQuery {
    pub fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(200).clamp(1, 500)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagMessagePayload {
    pub is_flagged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SuperviseMessagePayload {
    #[validate(length(min = 1, max = 2000))]
    pub supervisor_notes: String,
    pub supervised_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ModerationQuery {
    pub flagged: Option<bool>,
    pub supervised: Option<bool>,
    pub user_id: Option<Uuid>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    pub updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_limit_is_clamped() {
        assert_eq!(MessageHistoryQuery::default().effective_limit(), 200);
        let q = MessageHistoryQuery {
            before: None,
            before_id: None,
            limit: Some(10_000),
        };
        assert_eq!(q.effective_limit(), 500);
        let q = MessageHistoryQuery {
            before: None,
            before_id: None,
            limit: Some(0),
        };
        assert_eq!(q.effective_limit(), 1);
    }

    #[test]
    fn empty_content_fails_validation() {
        let payload = SendMessagePayload {
            receiver_id: Uuid::new_v4(),
            content: String::new(),
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn supervise_payload_uses_camel_case() {
        let payload: SuperviseMessagePayload =
            serde_json::from_str(r#"{"supervisorNotes":"spam link"}"#).unwrap();
        assert_eq!(payload.supervisor_notes, "spam link");
        assert!(payload.supervised_by.is_none());
    }
}
