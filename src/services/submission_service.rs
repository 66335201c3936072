use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::SubmissionEntity,
    error::ServiceError,
    services::draw_service::{ensure_contest_active, resolve_team},
    state::SharedState,
};

/// Record one answer attempt and report whether it was correct.
///
/// Every call appends a submission row, including repeated attempts on the
/// same question.
pub async fn submit(
    state: &SharedState,
    raw_team_id: &str,
    question_id: Uuid,
    answer_id: Uuid,
) -> Result<bool, ServiceError> {
    let store = state.require_store().await?;
    let team = resolve_team(store.as_ref(), raw_team_id).await?;
    if store.find_question(question_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("question `{question_id}`")));
    }
    ensure_contest_active(store.as_ref()).await?;

    let correct_answer = store
        .find_correct_answer(question_id)
        .await?
        .ok_or(ServiceError::NoCorrectAnswerConfigured(question_id))?;
    let correct = correct_answer.id == answer_id;

    store
        .insert_submission(SubmissionEntity {
            id: Uuid::new_v4(),
            team_id: team.id,
            question_id,
            answer_id,
            correct,
            created_at: SystemTime::now(),
        })
        .await?;

    info!(team_id = %team.id, %question_id, correct, "submission recorded");
    Ok(correct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::{contest_store::ContestStore, models::Role},
        services::lifecycle_service,
        test_support::{actor, memory_state, seed_question, seed_team},
    };

    #[tokio::test]
    async fn correctness_follows_flagged_answer() {
        let (state, store) = memory_state().await;
        lifecycle_service::start(&state, &actor(Role::Admin), 1.0)
            .await
            .unwrap();
        let team = seed_team(&store, "Otters", 0).await;
        let (question, answers) = seed_question(&store, "Q1", &[("a", false), ("b", true)]).await;
        let team_id = team.id.to_string();

        assert!(
            !submit(&state, &team_id, question.id, answers[0].id)
                .await
                .unwrap()
        );
        assert!(
            submit(&state, &team_id, question.id, answers[1].id)
                .await
                .unwrap()
        );

        let rows = store.list_submissions(team.id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows.iter().map(|row| row.correct).collect::<Vec<_>>(),
            vec![false, true]
        );
    }

    #[tokio::test]
    async fn missing_correct_answer_writes_nothing() {
        let (state, store) = memory_state().await;
        lifecycle_service::start(&state, &actor(Role::Admin), 1.0)
            .await
            .unwrap();
        let team = seed_team(&store, "Otters", 0).await;
        let (question, answers) = seed_question(&store, "Q1", &[("a", false)]).await;

        let err = submit(&state, &team.id.to_string(), question.id, answers[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoCorrectAnswerConfigured(id) if id == question.id));
        assert!(store.list_submissions(team.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_team_and_question_are_rejected() {
        let (state, store) = memory_state().await;
        lifecycle_service::start(&state, &actor(Role::Admin), 1.0)
            .await
            .unwrap();
        let team = seed_team(&store, "Otters", 0).await;
        let (question, answers) = seed_question(&store, "Q1", &[("a", true)]).await;

        assert!(matches!(
            submit(&state, &Uuid::new_v4().to_string(), question.id, answers[0].id).await,
            Err(ServiceError::TeamNotFound)
        ));
        assert!(matches!(
            submit(&state, &team.id.to_string(), Uuid::new_v4(), answers[0].id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn submissions_are_refused_outside_running_contest() {
        let (state, store) = memory_state().await;
        let team = seed_team(&store, "Otters", 0).await;
        let (question, answers) = seed_question(&store, "Q1", &[("a", true)]).await;

        assert!(matches!(
            submit(&state, &team.id.to_string(), question.id, answers[0].id).await,
            Err(ServiceError::ContestNotActive)
        ));
    }
}
