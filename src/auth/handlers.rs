use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use super::dto::{LoginRequest, RefreshRequest, SignupRequest, SignupResponse, TokenPair};
use crate::{error::ServiceError, profile::dto::ProfileRequest, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

/// Unwrap a JSON body, answering malformed input with a plain 400.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    payload.map(|Json(body)| body).map_err(|e| {
        warn!(error = %e, "malformed request body");
        ServiceError::validation("Bad Request")
    })
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), ServiceError> {
    let payload = json_body(payload)?;
    let profile = ProfileRequest {
        name: payload.name.clone(),
        ..Default::default()
    };

    let user_id = state.auth.signup(payload).await?;
    state.profiles.put_profile(user_id, profile).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            status: StatusCode::CREATED.as_u16(),
            message: "Created".into(),
            user_id,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ServiceError> {
    let payload = json_body(payload)?;
    Ok(Json(state.auth.login(payload).await?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, ServiceError> {
    let payload = json_body(payload)?;
    Ok(Json(state.auth.refresh(&payload.refresh_token).await?))
}
