use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Client,
    Freelancer,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Client => "client",
            UserRole::Freelancer => "freelancer",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "client" => Some(UserRole::Client),
            "freelancer" => Some(UserRole::Freelancer),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// Self-reported skill tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "freelancer_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FreelancerLevel {
    Beginner,
    Intermediate,
    Advanced,
}

/// Experts may run consultations; content creators may not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "freelancer_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FreelancerType {
    ContentCreator,
    Expert,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
    pub freelancer_level: Option<FreelancerLevel>,
    pub freelancer_type: Option<FreelancerType>,
    pub avatar_url: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Another user as seen from a conversation or moderation view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Participant {
    Client {
        id: Uuid,
        name: String,
        #[serde(rename = "avatarUrl")]
        avatar_url: Option<String>,
    },
    Freelancer {
        id: Uuid,
        name: String,
        #[serde(rename = "avatarUrl")]
        avatar_url: Option<String>,
        level: Option<FreelancerLevel>,
        #[serde(rename = "freelancerType")]
        freelancer_type: Option<FreelancerType>,
    },
    Admin {
        id: Uuid,
        name: String,
    },
}

impl Participant {
    pub fn from_parts(
        id: Uuid,
        name: String,
        role: UserRole,
        avatar_url: Option<String>,
        level: Option<FreelancerLevel>,
        freelancer_type: Option<FreelancerType>,
    ) -> Self {
        match role {
            UserRole::Client => Participant::Client {
                id,
                name,
                avatar_url,
            },
            UserRole::Freelancer => Participant::Freelancer {
                id,
                name,
                avatar_url,
                level,
                freelancer_type,
            },
            UserRole::Admin => Participant::Admin { id, name },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_is_tagged_by_role() {
        let id = Uuid::new_v4();
        let p = Participant::from_parts(
            id,
            "Dana".into(),
            UserRole::Freelancer,
            None,
            Some(FreelancerLevel::Advanced),
            Some(FreelancerType::Expert),
        );
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(value["role"], "freelancer");
        assert_eq!(value["level"], "advanced");
        assert_eq!(value["freelancerType"], "expert");
        assert_eq!(value["id"], serde_json::json!(id));
    }

    #[test]
    fn admin_participant_drops_freelancer_fields() {
        let p = Participant::from_parts(
            Uuid::new_v4(),
            "Root".into(),
            UserRole::Admin,
            Some("/a.png".into()),
            Some(FreelancerLevel::Beginner),
            None,
        );
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(value["role"], "admin");
        assert!(value.get("level").is_none());
        assert!(value.get("avatarUrl").is_none());
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            name: "A".into(),
            email: "a@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: UserRole::Client,
            freelancer_level: None,
            freelancer_type: None,
            avatar_url: None,
            is_verified: false,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["isVerified"], false);
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(UserRole::parse("ADMIN"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("hr"), None);
        assert_eq!(UserRole::Freelancer.as_str(), "freelancer");
    }
}
