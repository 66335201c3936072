use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{FromRequestParts, Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    auth::{ADMIN_ROLES, Actor, require_role},
    dto::{
        admin::{
            AnswerRecord, CreateAccountRequest, CreateAnswerRequest, CreateTeamRequest,
            MemberFilter, MemberInput, MemberRecord, QrPayload, QuestionInput, QuestionRecord,
            SchoolInput, SchoolRecord, ScoreAdjustmentRequest, TeamInput, TeamRecord,
            UpdateAccountRequest, UpdateAnswerRequest,
        },
        auth::AccountSummary,
        contest::{ContestRecord, StartContestRequest},
    },
    error::AppError,
    routes::extract::AppQuery,
    services::{admin_service, lifecycle_service},
    state::SharedState,
};

/// Admin-only endpoints: contest lifecycle control and data management.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/contest", get(get_contest))
        .route("/admin/contest/start", post(start_contest))
        .route("/admin/contest/pause", post(pause_contest))
        .route("/admin/contest/resume", post(resume_contest))
        .route("/admin/contest/freeze", post(freeze_contest))
        .route("/admin/contest/unfreeze", post(unfreeze_contest))
        .route("/admin/contest/end", post(end_contest))
        .route("/admin/schools", get(list_schools).post(create_school))
        .route(
            "/admin/schools/{id}",
            get(get_school).put(update_school).delete(delete_school),
        )
        .route("/admin/teams", get(list_teams).post(create_team))
        .route(
            "/admin/teams/{id}",
            get(get_team).put(update_team).delete(delete_team),
        )
        .route("/admin/teams/{id}/score", post(adjust_score))
        .route("/admin/teams/{id}/qr", get(team_qr))
        .route("/admin/members", get(list_members).post(create_member))
        .route(
            "/admin/members/{id}",
            put(update_member).delete(delete_member),
        )
        .route("/admin/questions", get(list_questions).post(create_question))
        .route(
            "/admin/questions/{id}",
            get(get_question).put(update_question).delete(delete_question),
        )
        .route("/admin/answers", post(create_answer))
        .route(
            "/admin/answers/{id}",
            put(update_answer).delete(delete_answer),
        )
        .route("/admin/accounts", get(list_accounts).post(create_account))
        .route(
            "/admin/accounts/{id}",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route_layer(middleware::from_fn_with_state(state, require_admin_session))
}

/// Resolve the bearer session, require an admin role and expose the [`Actor`]
/// to handlers as an extension.
async fn require_admin_session(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();
    let actor = Actor::from_request_parts(&mut parts, &state).await?;
    require_role(&actor, ADMIN_ROLES)?;
    parts.extensions.insert(actor);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

// Contest lifecycle

#[utoipa::path(
    get,
    path = "/admin/contest",
    tag = "admin",
    security(("jwt" = [])),
    responses((status = 200, description = "Full contest record", body = ContestRecord))
)]
pub async fn get_contest(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ContestRecord>, AppError> {
    let contest = lifecycle_service::current_contest(&state, &actor).await?;
    Ok(Json(contest.into()))
}

/// Start the contest for the given number of hours.
#[utoipa::path(
    post,
    path = "/admin/contest/start",
    tag = "admin",
    security(("jwt" = [])),
    request_body = StartContestRequest,
    responses(
        (status = 200, description = "Contest started", body = ContestRecord),
        (status = 400, description = "Invalid duration"),
        (status = 409, description = "Contest already started")
    )
)]
pub async fn start_contest(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
    Valid(Json(payload)): Valid<Json<StartContestRequest>>,
) -> Result<Json<ContestRecord>, AppError> {
    let contest = lifecycle_service::start(&state, &actor, payload.duration_hours).await?;
    Ok(Json(contest.into()))
}

#[utoipa::path(
    post,
    path = "/admin/contest/pause",
    tag = "admin",
    security(("jwt" = [])),
    responses(
        (status = 200, description = "Contest paused", body = ContestRecord),
        (status = 409, description = "Invalid transition")
    )
)]
pub async fn pause_contest(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ContestRecord>, AppError> {
    Ok(Json(lifecycle_service::pause(&state, &actor).await?.into()))
}

/// Resume a paused contest, pushing the end time back by the pause length.
#[utoipa::path(
    post,
    path = "/admin/contest/resume",
    tag = "admin",
    security(("jwt" = [])),
    responses(
        (status = 200, description = "Contest resumed", body = ContestRecord),
        (status = 409, description = "Invalid transition")
    )
)]
pub async fn resume_contest(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ContestRecord>, AppError> {
    Ok(Json(lifecycle_service::resume(&state, &actor).await?.into()))
}

/// Freeze the public leaderboard on the current standings.
#[utoipa::path(
    post,
    path = "/admin/contest/freeze",
    tag = "admin",
    security(("jwt" = [])),
    responses(
        (status = 200, description = "Leaderboard frozen", body = ContestRecord),
        (status = 409, description = "Invalid transition")
    )
)]
pub async fn freeze_contest(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ContestRecord>, AppError> {
    Ok(Json(lifecycle_service::freeze(&state, &actor).await?.into()))
}

#[utoipa::path(
    post,
    path = "/admin/contest/unfreeze",
    tag = "admin",
    security(("jwt" = [])),
    responses(
        (status = 200, description = "Leaderboard live again", body = ContestRecord),
        (status = 409, description = "Invalid transition")
    )
)]
pub async fn unfreeze_contest(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ContestRecord>, AppError> {
    Ok(Json(lifecycle_service::unfreeze(&state, &actor).await?.into()))
}

#[utoipa::path(
    post,
    path = "/admin/contest/end",
    tag = "admin",
    security(("jwt" = [])),
    responses(
        (status = 200, description = "Contest finished", body = ContestRecord),
        (status = 409, description = "Invalid transition")
    )
)]
pub async fn end_contest(
    State(state): State<SharedState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ContestRecord>, AppError> {
    Ok(Json(lifecycle_service::end(&state, &actor).await?.into()))
}

// Schools

#[utoipa::path(
    get,
    path = "/admin/schools",
    tag = "admin",
    security(("jwt" = [])),
    responses((status = 200, description = "List schools", body = [SchoolRecord]))
)]
pub async fn list_schools(
    State(state): State<SharedState>,
) -> Result<Json<Vec<SchoolRecord>>, AppError> {
    Ok(Json(admin_service::list_schools(&state).await?))
}

#[utoipa::path(
    get,
    path = "/admin/schools/{id}",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "School id")),
    responses((status = 200, description = "School", body = SchoolRecord))
)]
pub async fn get_school(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SchoolRecord>, AppError> {
    Ok(Json(admin_service::get_school(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/schools",
    tag = "admin",
    security(("jwt" = [])),
    request_body = SchoolInput,
    responses((status = 201, description = "School created", body = SchoolRecord))
)]
pub async fn create_school(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SchoolInput>>,
) -> Result<(StatusCode, Json<SchoolRecord>), AppError> {
    let school = admin_service::create_school(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(school)))
}

#[utoipa::path(
    put,
    path = "/admin/schools/{id}",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "School id")),
    request_body = SchoolInput,
    responses((status = 200, description = "School updated", body = SchoolRecord))
)]
pub async fn update_school(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<SchoolInput>>,
) -> Result<Json<SchoolRecord>, AppError> {
    Ok(Json(admin_service::update_school(&state, id, payload).await?))
}

/// Delete a school that no team belongs to.
#[utoipa::path(
    delete,
    path = "/admin/schools/{id}",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "School id")),
    responses(
        (status = 204, description = "School deleted"),
        (status = 409, description = "Teams still reference the school")
    )
)]
pub async fn delete_school(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    admin_service::delete_school(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Teams

#[utoipa::path(
    get,
    path = "/admin/teams",
    tag = "admin",
    security(("jwt" = [])),
    responses((status = 200, description = "List teams", body = [TeamRecord]))
)]
pub async fn list_teams(State(state): State<SharedState>) -> Result<Json<Vec<TeamRecord>>, AppError> {
    Ok(Json(admin_service::list_teams(&state).await?))
}

#[utoipa::path(
    get,
    path = "/admin/teams/{id}",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "Team id")),
    responses((status = 200, description = "Team", body = TeamRecord))
)]
pub async fn get_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TeamRecord>, AppError> {
    Ok(Json(admin_service::get_team(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/teams",
    tag = "admin",
    security(("jwt" = [])),
    request_body = CreateTeamRequest,
    responses((status = 201, description = "Team created", body = TeamRecord))
)]
pub async fn create_team(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateTeamRequest>>,
) -> Result<(StatusCode, Json<TeamRecord>), AppError> {
    let team = admin_service::create_team(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

#[utoipa::path(
    put,
    path = "/admin/teams/{id}",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "Team id")),
    request_body = TeamInput,
    responses((status = 200, description = "Team updated", body = TeamRecord))
)]
pub async fn update_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<TeamInput>>,
) -> Result<Json<TeamRecord>, AppError> {
    Ok(Json(admin_service::update_team(&state, id, payload).await?))
}

/// Delete a team and its members; linked accounts are unlinked.
#[utoipa::path(
    delete,
    path = "/admin/teams/{id}",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "Team id")),
    responses((status = 204, description = "Team deleted"))
)]
pub async fn delete_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    admin_service::delete_team(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Adjust the score of a team by a signed delta.
#[utoipa::path(
    post,
    path = "/admin/teams/{id}/score",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "Team id")),
    request_body = ScoreAdjustmentRequest,
    responses((status = 200, description = "Updated team", body = TeamRecord))
)]
pub async fn adjust_score(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScoreAdjustmentRequest>,
) -> Result<Json<TeamRecord>, AppError> {
    Ok(Json(
        admin_service::adjust_team_score(&state, id, payload.delta).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/admin/teams/{id}/qr",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "Team id")),
    responses((status = 200, description = "QR code payload", body = QrPayload))
)]
pub async fn team_qr(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QrPayload>, AppError> {
    Ok(Json(admin_service::team_qr_payload(&state, id).await?))
}

// Members

#[utoipa::path(
    get,
    path = "/admin/members",
    tag = "admin",
    security(("jwt" = [])),
    params(MemberFilter),
    responses((status = 200, description = "List members", body = [MemberRecord]))
)]
pub async fn list_members(
    State(state): State<SharedState>,
    AppQuery(filter): AppQuery<MemberFilter>,
) -> Result<Json<Vec<MemberRecord>>, AppError> {
    Ok(Json(admin_service::list_members(&state, filter.team_id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/members",
    tag = "admin",
    security(("jwt" = [])),
    request_body = MemberInput,
    responses((status = 201, description = "Member created", body = MemberRecord))
)]
pub async fn create_member(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<MemberInput>>,
) -> Result<(StatusCode, Json<MemberRecord>), AppError> {
    let member = admin_service::create_member(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    put,
    path = "/admin/members/{id}",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "Member id")),
    request_body = MemberInput,
    responses((status = 200, description = "Member updated", body = MemberRecord))
)]
pub async fn update_member(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<MemberInput>>,
) -> Result<Json<MemberRecord>, AppError> {
    Ok(Json(admin_service::update_member(&state, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/members/{id}",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "Member id")),
    responses((status = 204, description = "Member deleted"))
)]
pub async fn delete_member(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    admin_service::delete_member(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Questions and answers

#[utoipa::path(
    get,
    path = "/admin/questions",
    tag = "admin",
    security(("jwt" = [])),
    responses((status = 200, description = "Questions with their answers", body = [QuestionRecord]))
)]
pub async fn list_questions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<QuestionRecord>>, AppError> {
    Ok(Json(admin_service::list_questions(&state).await?))
}

#[utoipa::path(
    get,
    path = "/admin/questions/{id}",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "Question id")),
    responses((status = 200, description = "Question with its answers", body = QuestionRecord))
)]
pub async fn get_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionRecord>, AppError> {
    Ok(Json(admin_service::get_question(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/questions",
    tag = "admin",
    security(("jwt" = [])),
    request_body = QuestionInput,
    responses((status = 201, description = "Question created", body = QuestionRecord))
)]
pub async fn create_question(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<QuestionInput>>,
) -> Result<(StatusCode, Json<QuestionRecord>), AppError> {
    let question = admin_service::create_question(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

#[utoipa::path(
    put,
    path = "/admin/questions/{id}",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "Question id")),
    request_body = QuestionInput,
    responses((status = 200, description = "Question updated", body = QuestionRecord))
)]
pub async fn update_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<QuestionInput>>,
) -> Result<Json<QuestionRecord>, AppError> {
    Ok(Json(admin_service::update_question(&state, id, payload).await?))
}

/// Delete a question together with its answers.
#[utoipa::path(
    delete,
    path = "/admin/questions/{id}",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "Question id")),
    responses((status = 204, description = "Question deleted"))
)]
pub async fn delete_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    admin_service::delete_question(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add an answer option; flagging it correct clears the flag on the others.
#[utoipa::path(
    post,
    path = "/admin/answers",
    tag = "admin",
    security(("jwt" = [])),
    request_body = CreateAnswerRequest,
    responses((status = 201, description = "Answer created", body = AnswerRecord))
)]
pub async fn create_answer(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateAnswerRequest>>,
) -> Result<(StatusCode, Json<AnswerRecord>), AppError> {
    let answer = admin_service::create_answer(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(answer)))
}

#[utoipa::path(
    put,
    path = "/admin/answers/{id}",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "Answer id")),
    request_body = UpdateAnswerRequest,
    responses((status = 200, description = "Answer updated", body = AnswerRecord))
)]
pub async fn update_answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<UpdateAnswerRequest>>,
) -> Result<Json<AnswerRecord>, AppError> {
    Ok(Json(admin_service::update_answer(&state, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/answers/{id}",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "Answer id")),
    responses((status = 204, description = "Answer deleted"))
)]
pub async fn delete_answer(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    admin_service::delete_answer(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Accounts

#[utoipa::path(
    get,
    path = "/admin/accounts",
    tag = "admin",
    security(("jwt" = [])),
    responses((status = 200, description = "List accounts", body = [AccountSummary]))
)]
pub async fn list_accounts(
    State(state): State<SharedState>,
) -> Result<Json<Vec<AccountSummary>>, AppError> {
    Ok(Json(admin_service::list_accounts(&state).await?))
}

#[utoipa::path(
    get,
    path = "/admin/accounts/{id}",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "Account id")),
    responses((status = 200, description = "Account", body = AccountSummary))
)]
pub async fn get_account(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountSummary>, AppError> {
    Ok(Json(admin_service::get_account(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/accounts",
    tag = "admin",
    security(("jwt" = [])),
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = AccountSummary),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn create_account(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateAccountRequest>>,
) -> Result<(StatusCode, Json<AccountSummary>), AppError> {
    let account = admin_service::create_account(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

#[utoipa::path(
    put,
    path = "/admin/accounts/{id}",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "Account id")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = AccountSummary),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn update_account(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<UpdateAccountRequest>>,
) -> Result<Json<AccountSummary>, AppError> {
    Ok(Json(admin_service::update_account(&state, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/accounts/{id}",
    tag = "admin",
    security(("jwt" = [])),
    params(("id" = Uuid, Path, description = "Account id")),
    responses((status = 204, description = "Account deleted"))
)]
pub async fn delete_account(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    admin_service::delete_account(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
