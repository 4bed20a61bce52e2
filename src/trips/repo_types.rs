use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub photo: String,
}

/// Trip record. Stored twice: under `TRIP#<id>` for direct reads and under
/// the creator's `USER#<id>` partition for per-user listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trip {
    #[serde(rename = "PK")]
    pub pk: String,
    #[serde(rename = "SK")]
    pub sk: String,
    pub id: Uuid,
    pub created_by: Uuid,
    pub name: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub from_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub to_date: OffsetDateTime,
    pub location: Location,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
