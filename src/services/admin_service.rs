//! Business logic powering the admin CRUD routes. Role checks happen in the
//! admin router middleware; these helpers enforce referential rules and
//! cascades on top of the contest store.

use std::{sync::Arc, time::SystemTime};

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    auth::password::hash_password,
    dao::{
        contest_store::ContestStore,
        models::{
            AccountEntity, AnswerEntity, MemberEntity, QuestionEntity, SchoolEntity, TeamEntity,
        },
    },
    dto::{
        admin::{
            AnswerRecord, CreateAccountRequest, CreateAnswerRequest, CreateTeamRequest,
            MemberInput, MemberRecord, QrPayload, QuestionInput, QuestionRecord, SchoolInput,
            SchoolRecord, TeamInput, TeamRecord, UpdateAccountRequest, UpdateAnswerRequest,
        },
        auth::AccountSummary,
    },
    error::ServiceError,
    state::SharedState,
};

fn not_found(kind: &str, id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("{kind} `{id}`"))
}

async fn hash_blocking(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|err| ServiceError::Internal(format!("password hashing panicked: {err}")))?
        .map_err(Into::into)
}

async fn ensure_school(store: &dyn ContestStore, id: Uuid) -> Result<SchoolEntity, ServiceError> {
    store
        .find_school(id)
        .await?
        .ok_or_else(|| not_found("school", id))
}

async fn ensure_team(store: &dyn ContestStore, id: Uuid) -> Result<TeamEntity, ServiceError> {
    store.find_team(id).await?.ok_or_else(|| not_found("team", id))
}

async fn ensure_question(
    store: &dyn ContestStore,
    id: Uuid,
) -> Result<QuestionEntity, ServiceError> {
    store
        .find_question(id)
        .await?
        .ok_or_else(|| not_found("question", id))
}

async fn ensure_optional_team(
    store: &dyn ContestStore,
    team_id: Option<Uuid>,
) -> Result<(), ServiceError> {
    if let Some(team_id) = team_id {
        ensure_team(store, team_id).await?;
    }
    Ok(())
}

// Schools

pub async fn list_schools(state: &SharedState) -> Result<Vec<SchoolRecord>, ServiceError> {
    let store = state.require_store().await?;
    Ok(store
        .list_schools()
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

pub async fn get_school(state: &SharedState, id: Uuid) -> Result<SchoolRecord, ServiceError> {
    let store = state.require_store().await?;
    Ok(ensure_school(store.as_ref(), id).await?.into())
}

pub async fn create_school(
    state: &SharedState,
    input: SchoolInput,
) -> Result<SchoolRecord, ServiceError> {
    let store = state.require_store().await?;
    let school = SchoolEntity {
        id: Uuid::new_v4(),
        name: input.name.trim().to_string(),
        created_at: SystemTime::now(),
    };
    store.save_school(school.clone()).await?;
    info!(school_id = %school.id, "school created");
    Ok(school.into())
}

pub async fn update_school(
    state: &SharedState,
    id: Uuid,
    input: SchoolInput,
) -> Result<SchoolRecord, ServiceError> {
    let store = state.require_store().await?;
    let mut school = ensure_school(store.as_ref(), id).await?;
    school.name = input.name.trim().to_string();
    store.save_school(school.clone()).await?;
    Ok(school.into())
}

/// Delete a school; refused while any team still belongs to it.
pub async fn delete_school(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    ensure_school(store.as_ref(), id).await?;
    let attached = store
        .list_teams()
        .await?
        .into_iter()
        .filter(|team| team.school_id == id)
        .count();
    if attached > 0 {
        return Err(ServiceError::Conflict(format!(
            "school `{id}` still has {attached} team(s)"
        )));
    }
    store.delete_school(id).await?;
    info!(school_id = %id, "school deleted");
    Ok(())
}

// Teams

pub async fn list_teams(state: &SharedState) -> Result<Vec<TeamRecord>, ServiceError> {
    let store = state.require_store().await?;
    Ok(store.list_teams().await?.into_iter().map(Into::into).collect())
}

pub async fn get_team(state: &SharedState, id: Uuid) -> Result<TeamRecord, ServiceError> {
    let store = state.require_store().await?;
    Ok(ensure_team(store.as_ref(), id).await?.into())
}

/// Create a team and, when `member_name` is set, its first member.
pub async fn create_team(
    state: &SharedState,
    input: CreateTeamRequest,
) -> Result<TeamRecord, ServiceError> {
    let store = state.require_store().await?;
    ensure_school(store.as_ref(), input.school_id).await?;
    let now = SystemTime::now();
    let team = TeamEntity {
        id: Uuid::new_v4(),
        name: input.name.trim().to_string(),
        school_id: input.school_id,
        score: 0,
        created_at: now,
    };
    store.save_team(team.clone()).await?;
    if let Some(name) = input.member_name {
        store
            .save_member(MemberEntity {
                id: Uuid::new_v4(),
                name: name.trim().to_string(),
                team_id: team.id,
                created_at: now,
            })
            .await?;
    }
    info!(team_id = %team.id, "team created");
    Ok(team.into())
}

pub async fn update_team(
    state: &SharedState,
    id: Uuid,
    input: TeamInput,
) -> Result<TeamRecord, ServiceError> {
    let store = state.require_store().await?;
    let mut team = ensure_team(store.as_ref(), id).await?;
    ensure_school(store.as_ref(), input.school_id).await?;
    team.name = input.name.trim().to_string();
    team.school_id = input.school_id;
    store.save_team(team.clone()).await?;
    Ok(team.into())
}

/// Delete a team with its members; linked accounts are kept but unlinked.
pub async fn delete_team(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    if !store.delete_team(id).await? {
        return Err(not_found("team", id));
    }
    info!(team_id = %id, "team deleted");
    Ok(())
}

pub async fn adjust_team_score(
    state: &SharedState,
    id: Uuid,
    delta: i32,
) -> Result<TeamRecord, ServiceError> {
    let store = state.require_store().await?;
    let team = store
        .adjust_team_score(id, delta)
        .await?
        .ok_or_else(|| not_found("team", id))?;
    info!(team_id = %id, delta, score = team.score, "team score adjusted");
    Ok(team.into())
}

/// QR code content identifying a team at the draw station.
pub async fn team_qr_payload(state: &SharedState, id: Uuid) -> Result<QrPayload, ServiceError> {
    let store = state.require_store().await?;
    let team = ensure_team(store.as_ref(), id).await?;
    Ok(QrPayload {
        payload: team.id.to_string(),
    })
}

// Members

pub async fn list_members(
    state: &SharedState,
    team_id: Option<Uuid>,
) -> Result<Vec<MemberRecord>, ServiceError> {
    let store = state.require_store().await?;
    Ok(store
        .list_members(team_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

pub async fn create_member(
    state: &SharedState,
    input: MemberInput,
) -> Result<MemberRecord, ServiceError> {
    let store = state.require_store().await?;
    ensure_team(store.as_ref(), input.team_id).await?;
    let member = MemberEntity {
        id: Uuid::new_v4(),
        name: input.name.trim().to_string(),
        team_id: input.team_id,
        created_at: SystemTime::now(),
    };
    store.save_member(member.clone()).await?;
    Ok(member.into())
}

pub async fn update_member(
    state: &SharedState,
    id: Uuid,
    input: MemberInput,
) -> Result<MemberRecord, ServiceError> {
    let store = state.require_store().await?;
    let mut member = store
        .find_member(id)
        .await?
        .ok_or_else(|| not_found("member", id))?;
    ensure_team(store.as_ref(), input.team_id).await?;
    member.name = input.name.trim().to_string();
    member.team_id = input.team_id;
    store.save_member(member.clone()).await?;
    Ok(member.into())
}

pub async fn delete_member(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    if !store.delete_member(id).await? {
        return Err(not_found("member", id));
    }
    Ok(())
}

// Questions and answers

async fn question_record(
    store: &dyn ContestStore,
    question: QuestionEntity,
) -> Result<QuestionRecord, ServiceError> {
    let answers = store.list_answers(question.id).await?;
    Ok(QuestionRecord::new(question, answers))
}

pub async fn list_questions(state: &SharedState) -> Result<Vec<QuestionRecord>, ServiceError> {
    let store = state.require_store().await?;
    let questions = store.list_questions().await?;
    let mut records = Vec::with_capacity(questions.len());
    for question in questions {
        records.push(question_record(store.as_ref(), question).await?);
    }
    Ok(records)
}

pub async fn get_question(state: &SharedState, id: Uuid) -> Result<QuestionRecord, ServiceError> {
    let store = state.require_store().await?;
    let question = ensure_question(store.as_ref(), id).await?;
    question_record(store.as_ref(), question).await
}

/// Create a question; its display code follows the highest existing one.
pub async fn create_question(
    state: &SharedState,
    input: QuestionInput,
) -> Result<QuestionRecord, ServiceError> {
    let store = state.require_store().await?;
    let next_code = store
        .list_questions()
        .await?
        .iter()
        .map(|question| question.code)
        .max()
        .unwrap_or(0)
        .saturating_add(1);

    let question = QuestionEntity {
        id: Uuid::new_v4(),
        code: next_code,
        title: input.title.trim().to_string(),
        description: input.description,
        difficulty: input.difficulty,
        images: input.images,
        created_at: SystemTime::now(),
    };
    store.save_question(question.clone()).await?;
    info!(question_id = %question.id, code = question.code, "question created");
    Ok(QuestionRecord::new(question, Vec::new()))
}

pub async fn update_question(
    state: &SharedState,
    id: Uuid,
    input: QuestionInput,
) -> Result<QuestionRecord, ServiceError> {
    let store = state.require_store().await?;
    let mut question = ensure_question(store.as_ref(), id).await?;
    question.title = input.title.trim().to_string();
    question.description = input.description;
    question.difficulty = input.difficulty;
    question.images = input.images;
    store.save_question(question.clone()).await?;
    question_record(store.as_ref(), question).await
}

/// Delete a question and its answers. Submissions referencing it are kept.
pub async fn delete_question(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    if !store.delete_question(id).await? {
        return Err(not_found("question", id));
    }
    info!(question_id = %id, "question deleted");
    Ok(())
}

/// Keep at most one correct answer per question by clearing the flag elsewhere.
async fn clear_other_correct_answers(
    store: &Arc<dyn ContestStore>,
    question_id: Uuid,
    keep: Uuid,
) -> Result<(), ServiceError> {
    for mut answer in store.list_answers(question_id).await? {
        if answer.id != keep && answer.is_correct {
            debug!(answer_id = %answer.id, "clearing previous correct answer");
            answer.is_correct = false;
            store.save_answer(answer).await?;
        }
    }
    Ok(())
}

pub async fn create_answer(
    state: &SharedState,
    input: CreateAnswerRequest,
) -> Result<AnswerRecord, ServiceError> {
    let store = state.require_store().await?;
    ensure_question(store.as_ref(), input.question_id).await?;
    let answer = AnswerEntity {
        id: Uuid::new_v4(),
        question_id: input.question_id,
        content: input.content,
        is_correct: input.is_correct,
        created_at: SystemTime::now(),
    };
    store.save_answer(answer.clone()).await?;
    if answer.is_correct {
        clear_other_correct_answers(&store, answer.question_id, answer.id).await?;
    }
    Ok(answer.into())
}

pub async fn update_answer(
    state: &SharedState,
    id: Uuid,
    input: UpdateAnswerRequest,
) -> Result<AnswerRecord, ServiceError> {
    let store = state.require_store().await?;
    let mut answer = store
        .find_answer(id)
        .await?
        .ok_or_else(|| not_found("answer", id))?;
    answer.content = input.content;
    answer.is_correct = input.is_correct;
    store.save_answer(answer.clone()).await?;
    if answer.is_correct {
        clear_other_correct_answers(&store, answer.question_id, answer.id).await?;
    }
    Ok(answer.into())
}

pub async fn delete_answer(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    if !store.delete_answer(id).await? {
        return Err(not_found("answer", id));
    }
    Ok(())
}

// Accounts

pub async fn list_accounts(state: &SharedState) -> Result<Vec<AccountSummary>, ServiceError> {
    let store = state.require_store().await?;
    Ok(store
        .list_accounts()
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}

pub async fn get_account(state: &SharedState, id: Uuid) -> Result<AccountSummary, ServiceError> {
    let store = state.require_store().await?;
    store
        .find_account(id)
        .await?
        .map(Into::into)
        .ok_or_else(|| not_found("account", id))
}

/// Create an account; a taken username is a conflict.
pub async fn create_account(
    state: &SharedState,
    input: CreateAccountRequest,
) -> Result<AccountSummary, ServiceError> {
    let store = state.require_store().await?;
    ensure_optional_team(store.as_ref(), input.team_id).await?;

    let account = AccountEntity {
        id: Uuid::new_v4(),
        username: input.username,
        name: input.name,
        password_hash: hash_blocking(input.password).await?,
        role: input.role,
        team_id: input.team_id,
        session_token: None,
        created_at: SystemTime::now(),
    };
    store.insert_account(account.clone()).await?;
    info!(account_id = %account.id, role = ?account.role, "account created");
    Ok(account.into())
}

/// Update an account. A password change also revokes the active session.
pub async fn update_account(
    state: &SharedState,
    id: Uuid,
    input: UpdateAccountRequest,
) -> Result<AccountSummary, ServiceError> {
    let store = state.require_store().await?;
    let mut account = store
        .find_account(id)
        .await?
        .ok_or_else(|| not_found("account", id))?;
    ensure_optional_team(store.as_ref(), input.team_id).await?;

    account.username = input.username;
    account.name = input.name;
    account.role = input.role;
    account.team_id = input.team_id;
    if let Some(password) = input.password {
        account.password_hash = hash_blocking(password).await?;
        account.session_token = None;
    }

    store.save_account(account.clone()).await?;
    Ok(account.into())
}

pub async fn delete_account(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    if !store.delete_account(id).await? {
        return Err(not_found("account", id));
    }
    info!(account_id = %id, "account deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::models::{Difficulty, Role},
        test_support::{memory_state, seed_participant, seed_school, seed_team},
    };

    fn question_input(title: &str) -> QuestionInput {
        QuestionInput {
            title: title.into(),
            description: "Count the beavers".into(),
            difficulty: Difficulty::Medium,
            images: vec![],
        }
    }

    #[tokio::test]
    async fn school_with_teams_cannot_be_deleted() {
        let (state, store) = memory_state().await;
        let team = seed_team(&store, "Otters", 0).await;

        let err = delete_school(&state, team.school_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        delete_team(&state, team.id).await.unwrap();
        delete_school(&state, team.school_id).await.unwrap();
        assert!(matches!(
            get_school(&state, team.school_id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn team_requires_existing_school() {
        let (state, _store) = memory_state().await;
        let err = create_team(
            &state,
            CreateTeamRequest {
                name: "Ghosts".into(),
                school_id: Uuid::new_v4(),
                member_name: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn team_created_with_its_first_member() {
        let (state, store) = memory_state().await;
        let school = seed_school(&store, "North High").await;
        let team = create_team(
            &state,
            CreateTeamRequest {
                name: "Beavers".into(),
                school_id: school.id,
                member_name: Some(" Ada ".into()),
            },
        )
        .await
        .unwrap();

        let members = store.list_members(Some(team.id)).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "Ada");
    }

    #[tokio::test]
    async fn team_delete_cascades_members_and_unlinks_accounts() {
        let (state, store) = memory_state().await;
        let team = seed_team(&store, "Otters", 0).await;
        create_member(
            &state,
            MemberInput {
                name: "Ada".into(),
                team_id: team.id,
            },
        )
        .await
        .unwrap();
        let account = seed_participant(&store, "otter_1", Some(team.id)).await;

        delete_team(&state, team.id).await.unwrap();

        assert!(list_members(&state, None).await.unwrap().is_empty());
        assert_eq!(get_account(&state, account.id).await.unwrap().team_id, None);
    }

    #[tokio::test]
    async fn score_adjustment_and_qr_payload() {
        let (state, store) = memory_state().await;
        let team = seed_team(&store, "Otters", 10).await;

        let updated = adjust_team_score(&state, team.id, -4).await.unwrap();
        assert_eq!(updated.score, 6);

        let qr = team_qr_payload(&state, team.id).await.unwrap();
        assert_eq!(qr.payload, team.id.to_string());

        assert!(matches!(
            adjust_team_score(&state, Uuid::new_v4(), 1).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn question_codes_increase() {
        let (state, _store) = memory_state().await;
        let first = create_question(&state, question_input("Q1")).await.unwrap();
        let second = create_question(&state, question_input("Q2")).await.unwrap();
        assert_eq!(first.code, 1);
        assert_eq!(second.code, 2);

        delete_question(&state, second.id).await.unwrap();
        let third = create_question(&state, question_input("Q3")).await.unwrap();
        assert_eq!(third.code, 2);
    }

    #[tokio::test]
    async fn marking_answer_correct_clears_previous_one() {
        let (state, _store) = memory_state().await;
        let question = create_question(&state, question_input("Q1")).await.unwrap();
        let answer = |content: &str, is_correct| CreateAnswerRequest {
            question_id: question.id,
            content: content.into(),
            is_correct,
        };

        let first = create_answer(&state, answer("a", true)).await.unwrap();
        let second = create_answer(&state, answer("b", true)).await.unwrap();

        let record = get_question(&state, question.id).await.unwrap();
        let flags: Vec<_> = record
            .answers
            .iter()
            .map(|answer| (answer.id, answer.is_correct))
            .collect();
        assert_eq!(flags, vec![(first.id, false), (second.id, true)]);

        delete_question(&state, question.id).await.unwrap();
        assert!(matches!(
            update_answer(
                &state,
                first.id,
                UpdateAnswerRequest {
                    content: "a".into(),
                    is_correct: true,
                },
            )
            .await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let (state, _store) = memory_state().await;
        let request = || CreateAccountRequest {
            username: "judge_1".into(),
            password: "long-enough".into(),
            name: None,
            role: Role::Judge,
            team_id: None,
        };

        create_account(&state, request()).await.unwrap();
        assert!(matches!(
            create_account(&state, request()).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn password_change_revokes_session() {
        let (state, store) = memory_state().await;
        let account = seed_participant(&store, "otter_1", None).await;
        store
            .set_session_token(account.id, Some("sid".into()))
            .await
            .unwrap();

        update_account(
            &state,
            account.id,
            UpdateAccountRequest {
                username: "otter_one".into(),
                password: Some("new-password".into()),
                name: Some("Otter".into()),
                role: Role::User,
                team_id: None,
            },
        )
        .await
        .unwrap();

        let stored = store.find_account(account.id).await.unwrap().unwrap();
        assert_eq!(stored.username, "otter_one");
        assert_eq!(stored.session_token, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn update_keeping_username_changes_role_and_team() {
        let (state, store) = memory_state().await;
        let team = seed_team(&store, "Beavers", 0).await;
        let account = seed_participant(&store, "otter_1", None).await;

        let summary = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            update_account(
                &state,
                account.id,
                UpdateAccountRequest {
                    username: "otter_1".into(),
                    password: Some("new-password".into()),
                    name: None,
                    role: Role::Operator,
                    team_id: Some(team.id),
                },
            ),
        )
        .await
        .expect("update must not block")
        .unwrap();

        assert_eq!(summary.username, "otter_1");
        let stored = store.find_account(account.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Operator);
        assert_eq!(stored.team_id, Some(team.id));
    }
}
