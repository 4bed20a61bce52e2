use std::sync::Arc;

use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    dto::{CreateTripRequest, TripMember, TripView},
    repo::{trip_key, trip_members, trip_partition, trips_of_user, user_partition},
    repo_types::Trip,
};
use crate::{
    database::{DatabaseError, Table},
    error::ServiceError,
};

pub const INVALID_DATES: &str = "Trip dates are invalid";
pub const TRIP_NOT_FOUND: &str = "Trip not found";

fn backend(op: &'static str) -> impl FnOnce(DatabaseError) -> ServiceError {
    move |e| {
        error!(error = %e, op, "trip store failed");
        ServiceError::from(e)
    }
}

/// Parse both bounds and require `now < from <= to`.
fn parse_dates(
    from: &str,
    to: &str,
    now: OffsetDateTime,
) -> Result<(OffsetDateTime, OffsetDateTime), ServiceError> {
    let parse = |raw: &str| {
        OffsetDateTime::parse(raw.trim(), &Rfc3339).map_err(|e| {
            warn!(error = %e, raw, "unparseable trip date");
            ServiceError::validation(INVALID_DATES)
        })
    };
    let (from, to) = (parse(from)?, parse(to)?);

    if from < now || to < now {
        warn!(%from, %to, "trip dates are in the past");
        return Err(ServiceError::validation(INVALID_DATES));
    }
    if from > to {
        warn!(%from, %to, "trip starts after it ends");
        return Err(ServiceError::validation(INVALID_DATES));
    }
    Ok((from, to))
}

#[derive(Clone)]
pub struct TripService {
    trips: Arc<dyn Table<Trip>>,
    index: String,
}

impl TripService {
    pub fn new(trips: Arc<dyn Table<Trip>>, index: impl Into<String>) -> Self {
        Self {
            trips,
            index: index.into(),
        }
    }

    /// Validate and store a trip together with its creator's listing record.
    pub async fn create_trip(
        &self,
        created_by: Uuid,
        req: CreateTripRequest,
    ) -> Result<TripView, ServiceError> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::validation("Trip name cannot be empty"));
        }
        let now = OffsetDateTime::now_utc();
        let (from_date, to_date) = parse_dates(&req.from_date, &req.to_date, now)?;

        let id = Uuid::new_v4();
        let trip = Trip {
            pk: trip_partition(id),
            sk: trip_partition(id),
            id,
            created_by,
            name,
            description: req.description,
            from_date,
            to_date,
            location: req.location,
            participants: req.participants,
            created_at: now,
        };
        let listing = Trip {
            pk: user_partition(created_by),
            ..trip.clone()
        };

        // TODO: delete the primary record when the batch reports a partial failure.
        self.trips
            .write(&[trip.clone(), listing])
            .await
            .map_err(backend("write"))?;

        info!(trip_id = %id, %created_by, "trip created");
        Ok(trip.into())
    }

    pub async fn get_trip(&self, trip_id: Uuid) -> Result<TripView, ServiceError> {
        self.trips
            .get(&trip_key(trip_id))
            .await
            .map_err(backend("get"))?
            .map(TripView::from)
            .ok_or_else(|| {
                warn!(%trip_id, "trip not found");
                ServiceError::not_found(TRIP_NOT_FOUND)
            })
    }

    pub async fn trips_by_user(&self, user_id: Uuid) -> Result<Vec<TripView>, ServiceError> {
        let trips = self
            .trips
            .query(&trips_of_user(user_id))
            .await
            .map_err(backend("query"))?;
        Ok(trips.into_iter().map(TripView::from).collect())
    }

    pub async fn trip_participants(&self, trip_id: Uuid) -> Result<Vec<TripMember>, ServiceError> {
        let (condition, filter) = trip_members(trip_id);
        let members = self
            .trips
            .query_with_index(&self.index, &condition, &filter)
            .await
            .map_err(backend("query_with_index"))?;
        Ok(members.into_iter().map(TripMember::from).collect())
    }
}
