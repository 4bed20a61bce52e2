use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::Profile;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub birth_date: Option<i64>, // unix seconds
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub email: String,
}

/// Profile as returned to clients, without the storage keys.
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub user_id: Uuid,
    pub name: String,
    pub birth_date: Option<i64>,
    pub gender: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Profile> for ProfileView {
    fn from(p: Profile) -> Self {
        Self {
            user_id: p.user_id,
            name: p.name,
            birth_date: p.birth_date,
            gender: p.gender,
            email: p.email,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub status: u16,
    pub message: String,
}
