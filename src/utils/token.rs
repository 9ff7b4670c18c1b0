use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::models::user::UserRole;

pub fn issue_access_token(
    user_id: Uuid,
    role: UserRole,
    secret: &str,
    ttl_hours: i64,
) -> Result<String> {
    let exp = (Utc::now() + Duration::hours(ttl_hours)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
        role: Some(role.as_str().to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("failed to sign token: {}", e)))
}

pub fn decode_access_token(token: &str, secret: &str) -> Option<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_decodes_with_same_secret() {
        let id = Uuid::new_v4();
        let token = issue_access_token(id, UserRole::Freelancer, "s3cret", 1).unwrap();
        let claims = decode_access_token(&token, "s3cret").unwrap();
        assert_eq!(claims.user_id().unwrap(), id);
        assert_eq!(claims.role(), Some(UserRole::Freelancer));
        assert!(decode_access_token(&token, "other").is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_access_token(Uuid::new_v4(), UserRole::Client, "s3cret", -2).unwrap();
        assert!(decode_access_token(&token, "s3cret").is_none());
    }
}
