use axum::{Json, Router, extract::State, http::StatusCode, routing::{get, post}};
use axum_valid::Valid;

use crate::{
    auth::Actor,
    dto::auth::{AccountSummary, LoginRequest, LoginResponse},
    error::AppError,
    services::auth_service,
    state::SharedState,
};

/// Configure the authentication routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

/// Exchange credentials for a session token, revoking any previous session.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<LoginRequest>>,
) -> Result<Json<LoginResponse>, AppError> {
    Ok(Json(auth_service::login(&state, payload).await?))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    security(("jwt" = [])),
    responses((status = 204, description = "Session revoked"))
)]
pub async fn logout(
    State(state): State<SharedState>,
    actor: Actor,
) -> Result<StatusCode, AppError> {
    auth_service::logout(&state, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("jwt" = [])),
    responses((status = 200, description = "Current account", body = AccountSummary))
)]
pub async fn me(
    State(state): State<SharedState>,
    actor: Actor,
) -> Result<Json<AccountSummary>, AppError> {
    Ok(Json(auth_service::current_account(&state, &actor).await?))
}
