use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    #[serde(rename = "PK")]
    pub pk: String, // USER#<user_id>
    #[serde(rename = "SK")]
    pub sk: String, // PROFILE#<user_id>
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
