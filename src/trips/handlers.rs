use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::dto::{CreateTripRequest, TripMember, TripView};
use crate::{
    auth::{handlers::json_body, AuthUser},
    error::ServiceError,
    state::AppState,
};

pub fn trip_routes() -> Router<AppState> {
    Router::new()
        .route("/trip", post(create_trip))
        .route("/trip/:trip_id", get(get_trip))
        .route("/trip/:trip_id/participants", get(get_participants))
        .route("/trips/user/me", get(my_trips))
        .route("/trips/user/:user_id", get(user_trips))
}

fn path_id(path: Result<Path<Uuid>, PathRejection>, what: &str) -> Result<Uuid, ServiceError> {
    path.map(|Path(id)| id).map_err(|e| {
        warn!(error = %e, "malformed path id");
        ServiceError::validation(format!("Invalid {what} id"))
    })
}

#[instrument(skip(state, payload))]
pub async fn create_trip(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreateTripRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TripView>), ServiceError> {
    let payload = json_body(payload)?;
    let trip = state.trips.create_trip(user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

#[instrument(skip(state, trip_id))]
pub async fn get_trip(
    State(state): State<AppState>,
    trip_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TripView>, ServiceError> {
    let trip_id = path_id(trip_id, "trip")?;
    Ok(Json(state.trips.get_trip(trip_id).await?))
}

#[instrument(skip(state, trip_id))]
pub async fn get_participants(
    State(state): State<AppState>,
    trip_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<TripMember>>, ServiceError> {
    let trip_id = path_id(trip_id, "trip")?;
    Ok(Json(state.trips.trip_participants(trip_id).await?))
}

#[instrument(skip(state))]
pub async fn my_trips(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<TripView>>, ServiceError> {
    Ok(Json(state.trips.trips_by_user(user_id).await?))
}

#[instrument(skip(state, user_id))]
pub async fn user_trips(
    State(state): State<AppState>,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<TripView>>, ServiceError> {
    let user_id = path_id(user_id, "user")?;
    Ok(Json(state.trips.trips_by_user(user_id).await?))
}
