//! QR draw, question display and answer submission.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    auth::Actor,
    dto::participant::{DrawRequest, DrawResponse, QuestionView, SubmitRequest, SubmitResponse},
    error::{AppError, ServiceError},
    services::{draw_service, submission_service},
    state::SharedState,
};

/// Configure the participant routes subtree; every route needs a session.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/draw", post(draw))
        .route("/questions/{id}", get(question))
        .route("/submissions", post(submit))
}

/// Draw a random question the team has not submitted for yet.
#[utoipa::path(
    post,
    path = "/draw",
    tag = "participant",
    security(("jwt" = [])),
    request_body = DrawRequest,
    responses(
        (status = 200, description = "Drawn question, or `{exhausted: true}`", body = DrawResponse),
        (status = 404, description = "Team not found"),
        (status = 409, description = "Contest not running")
    )
)]
pub async fn draw(
    State(state): State<SharedState>,
    _actor: Actor,
    Valid(Json(payload)): Valid<Json<DrawRequest>>,
) -> Result<Json<DrawResponse>, AppError> {
    match draw_service::draw_question(&state, &payload.team_id).await {
        Ok(drawn) => Ok(Json(DrawResponse::Question {
            question_id: drawn.question_id,
            question: drawn.question,
        })),
        Err(ServiceError::Exhausted) => Ok(Json(DrawResponse::exhausted())),
        Err(err) => Err(err.into()),
    }
}

#[utoipa::path(
    get,
    path = "/questions/{id}",
    tag = "participant",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "Question id")),
    responses(
        (status = 200, description = "Question with answer options", body = QuestionView),
        (status = 404, description = "Question not found")
    )
)]
pub async fn question(
    State(state): State<SharedState>,
    _actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionView>, AppError> {
    Ok(Json(draw_service::question_details(&state, id).await?))
}

/// Record an answer attempt for the team.
#[utoipa::path(
    post,
    path = "/submissions",
    tag = "participant",
    security(("jwt" = [])),
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Submission recorded", body = SubmitResponse),
        (status = 404, description = "Team or question not found"),
        (status = 409, description = "Contest not running"),
        (status = 422, description = "Question has no correct answer configured")
    )
)]
pub async fn submit(
    State(state): State<SharedState>,
    _actor: Actor,
    Valid(Json(payload)): Valid<Json<SubmitRequest>>,
) -> Result<Json<SubmitResponse>, AppError> {
    let correct = submission_service::submit(
        &state,
        &payload.team_id,
        payload.question_id,
        payload.answer_id,
    )
    .await?;
    Ok(Json(SubmitResponse { correct }))
}
