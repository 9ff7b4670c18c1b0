use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::user::UserRole;
use crate::utils::token::decode_access_token;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| Error::Unauthorized("token subject is not a user id".into()))
    }

    pub fn role(&self) -> Option<UserRole> {
        self.role.as_deref().and_then(UserRole::parse)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(UserRole::Admin)
    }
}

fn reject(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "error": code }))).into_response()
}

fn bearer_claims(req: &Request) -> std::result::Result<Claims, Response> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Err(reject(StatusCode::UNAUTHORIZED, "missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(reject(StatusCode::UNAUTHORIZED, "bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(reject(StatusCode::UNAUTHORIZED, "unsupported_scheme"));
    };

    let config = crate::config::get_config();
    let claims = decode_access_token(token.trim(), &config.jwt_secret)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "invalid_token"))?;
    if Uuid::parse_str(&claims.sub).is_err() {
        return Err(reject(StatusCode::UNAUTHORIZED, "invalid_subject"));
    }
    Ok(claims)
}

async fn authorize(mut req: Request, next: Next, allowed: &[UserRole]) -> Response {
    let claims = match bearer_claims(&req) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };
    if !allowed.is_empty() && !claims.role().is_some_and(|r| allowed.contains(&r)) {
        tracing::warn!(user = %claims.sub, role = ?claims.role, "role not permitted");
        return reject(StatusCode::FORBIDDEN, "forbidden");
    }
    req.extensions_mut().insert(claims);
    next.run(req).await
}

pub async fn require_bearer_auth(req: Request, next: Next) -> Response {
    authorize(req, next, &[]).await
}

pub async fn require_admin(req: Request, next: Next) -> Response {
    authorize(req, next, &[UserRole::Admin]).await
}
