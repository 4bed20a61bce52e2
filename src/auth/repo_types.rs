use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Credentials record stored in the accounts table, keyed by email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    #[serde(rename = "PK")]
    pub pk: String,                   // email at creation time
    pub id: Uuid,                     // stable user ID
    pub email: String,
    pub password_hash: String,        // Argon2 PHC string, never plaintext
    pub name: String,
    pub phone: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Account {
    pub fn new(email: &str, password_hash: String, name: String, phone: String) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            pk: email.to_string(),
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash,
            name,
            phone,
            created_at: now,
            updated_at: now,
        }
    }
}
