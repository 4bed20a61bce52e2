use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    repo::USER_PREFIX,
    repo_types::{Location, Participant, Trip},
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateTripRequest {
    pub name: String,
    pub description: String,
    pub from_date: String, // RFC 3339
    pub to_date: String,   // RFC 3339
    pub location: Location,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Serialize)]
pub struct TripView {
    pub id: Uuid,
    pub created_by: Uuid,
    pub name: String,
    pub description: String,
    #[serde(with = "time::serde::rfc3339")]
    pub from_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub to_date: OffsetDateTime,
    pub location: Location,
    pub participants: Vec<Participant>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Trip> for TripView {
    fn from(t: Trip) -> Self {
        Self {
            id: t.id,
            created_by: t.created_by,
            name: t.name,
            description: t.description,
            from_date: t.from_date,
            to_date: t.to_date,
            location: t.location,
            participants: t.participants,
            created_at: t.created_at,
        }
    }
}

/// One user linked to a trip through a `USER#<id>` record.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TripMember {
    pub user_id: String,
    pub trip_id: Uuid,
}

impl From<Trip> for TripMember {
    fn from(t: Trip) -> Self {
        let user_id = t
            .pk
            .strip_prefix(USER_PREFIX)
            .and_then(|rest| rest.strip_prefix('#'))
            .unwrap_or(&t.pk)
            .to_string();
        Self {
            user_id,
            trip_id: t.id,
        }
    }
}
