use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{DeletedResponse, ProfileRequest, ProfileView};
use crate::{
    auth::{handlers::json_body, AuthUser},
    error::ServiceError,
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route(
        "/profile",
        get(get_profile).post(put_profile).delete(delete_profile),
    )
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileView>, ServiceError> {
    Ok(Json(state.profiles.get_profile(user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn put_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileView>, ServiceError> {
    let payload = json_body(payload)?;
    Ok(Json(state.profiles.put_profile(user_id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<DeletedResponse>, ServiceError> {
    state.profiles.delete_profile(user_id).await?;
    Ok(Json(DeletedResponse {
        status: 200,
        message: "Deleted".into(),
    }))
}
