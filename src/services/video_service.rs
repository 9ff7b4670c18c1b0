use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

const SESSION_TTL_MINUTES: i64 = 120;

/// Claims understood by the hosted video SDK.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSdkClaims {
    pub app_key: String,
    pub tpc: String,
    pub role_type: u8,
    pub version: u8,
    pub user_identity: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct VideoSession {
    pub topic: String,
    pub signature: String,
    pub expires_at: DateTime<Utc>,
}

/// Same topic for both sides of a call regardless of who starts it.
pub fn session_topic(a: Uuid, b: Uuid) -> String {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    format!("call-{}-{}", low.simple(), high.simple())
}

#[derive(Clone)]
pub struct VideoService {
    credentials: Option<(String, String)>,
}

impl VideoService {
    pub fn new(sdk_key: Option<String>, sdk_secret: Option<String>) -> Self {
        Self {
            credentials: sdk_key.zip(sdk_secret),
        }
    }

    pub fn issue_session(&self, caller: Uuid, partner: Uuid, host: bool) -> Result<VideoSession> {
        let Some((key, secret)) = &self.credentials else {
            return Err(Error::Unavailable("Video calling is not configured".into()));
        };

        let now = Utc::now();
        let expires_at = now + Duration::minutes(SESSION_TTL_MINUTES);
        let topic = session_topic(caller, partner);
        let claims = VideoSdkClaims {
            app_key: key.clone(),
            tpc: topic.clone(),
            role_type: if host { 1 } else { 0 },
            version: 1,
            user_identity: caller.to_string(),
            iat: now.timestamp() - 30,
            exp: expires_at.timestamp(),
        };
        let signature = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| Error::Internal(format!("failed to sign video session: {}", e)))?;

        Ok(VideoSession {
            topic,
            signature,
            expires_at: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .unwrap_or(expires_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

    #[test]
    fn topic_is_symmetric() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(session_topic(a, b), session_topic(b, a));
        assert!(session_topic(a, b).starts_with("call-"));
    }

    #[test]
    fn unconfigured_service_is_unavailable() {
        let service = VideoService::new(Some("key".into()), None);
        let err = service
            .issue_session(Uuid::new_v4(), Uuid::new_v4(), true)
            .unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
    }

    #[test]
    fn signature_carries_sdk_claims() {
        let service = VideoService::new(Some("key".into()), Some("secret".into()));
        let (caller, partner) = (Uuid::new_v4(), Uuid::new_v4());
        let session = service.issue_session(caller, partner, true).unwrap();

        let data = decode::<VideoSdkClaims>(
            &session.signature,
            &DecodingKey::from_secret(b"secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(data.claims.app_key, "key");
        assert_eq!(data.claims.tpc, session.topic);
        assert_eq!(data.claims.role_type, 1);
        assert_eq!(data.claims.user_identity, caller.to_string());
        assert!(session.expires_at > Utc::now());
    }
}
