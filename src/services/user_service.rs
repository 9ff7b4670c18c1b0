use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::auth_dto::RegisterPayload;
use crate::error::{Error, Result};
use crate::models::user::{User, UserRole};
use crate::utils::crypto::{hash_password, verify_password};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, freelancer_level, \
     freelancer_type, avatar_url, is_verified, created_at";

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn register(&self, payload: RegisterPayload) -> Result<User> {
        if payload.role == UserRole::Admin {
            return Err(Error::Forbidden("Admin accounts cannot self-register".into()));
        }
        let (level, kind) = match payload.role {
            UserRole::Freelancer => (payload.freelancer_level, payload.freelancer_type),
            _ => (None, None),
        };

        let email = payload.email.trim().to_lowercase();
        let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(&email)
            .fetch_one(&self.pool)
            .await?;
        if taken {
            return Err(Error::Conflict("Email is already registered".into()));
        }

        let password_hash = hash_password(&payload.password)?;
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role, freelancer_level, freelancer_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(payload.name.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(payload.role)
        .bind(level)
        .bind(kind)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match Error::from(e) {
            Error::Conflict(_) => Error::Conflict("Email is already registered".into()),
            other => other,
        })?;

        tracing::info!(user = %user.id, role = user.role.as_str(), "user registered");
        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        match user {
            Some(user) if verify_password(password, &user.password_hash) => Ok(user),
            _ => Err(Error::Unauthorized("Invalid email or password".into())),
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }
}
