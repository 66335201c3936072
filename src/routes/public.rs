//! Unauthenticated read endpoints: contest clock and leaderboard.

use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

use crate::{
    dto::{
        contest::ContestStatusResponse,
        leaderboard::{LeaderboardQuery, LeaderboardResponse},
    },
    error::AppError,
    routes::extract::AppQuery,
    services::{leaderboard_service, lifecycle_service},
    state::SharedState,
};

/// Configure the public routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/contest/status", get(contest_status))
        .route("/leaderboard", get(leaderboard))
}

#[utoipa::path(
    get,
    path = "/contest/status",
    tag = "public",
    responses(
        (status = 200, description = "Contest status and server clock", body = ContestStatusResponse),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn contest_status(
    State(state): State<SharedState>,
) -> Result<Json<ContestStatusResponse>, AppError> {
    Ok(Json(lifecycle_service::contest_status(&state).await?))
}

/// Leaderboard page; serves the frozen snapshot while the contest is frozen.
#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "public",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Leaderboard page", body = LeaderboardResponse),
        (status = 400, description = "Invalid pagination")
    )
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    AppQuery(query): AppQuery<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(leaderboard_service::get_leaderboard(&state, query).await?))
}
