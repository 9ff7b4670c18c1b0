use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::verification::{DocumentType, VerificationStatus};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVerificationPayload {
    pub document_type: DocumentType,
    #[validate(url)]
    pub document_url: String,
    #[validate(length(max = 2000))]
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewVerificationPayload {
    pub status: VerificationStatus,
    #[validate(length(max = 2000))]
    pub review_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VerificationListQuery {
    pub status: Option<VerificationStatus>,
}
