//! Random unsolved-question draw for a team scanning its QR code.

use rand::Rng;
use tracing::debug;
use uuid::Uuid;

use crate::{
    dao::{
        contest_store::ContestStore,
        models::{ContestStatus, QuestionEntity, TeamEntity},
    },
    dto::participant::QuestionView,
    error::ServiceError,
    state::SharedState,
};

/// A question served to a team, with its answer options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawnQuestion {
    pub question_id: Uuid,
    pub question: QuestionView,
}

/// Draws and submissions are only accepted while the contest clock runs.
pub(crate) async fn ensure_contest_active(store: &dyn ContestStore) -> Result<(), ServiceError> {
    match store.load_contest().await?.status {
        ContestStatus::Running | ContestStatus::Frozen => Ok(()),
        _ => Err(ServiceError::ContestNotActive),
    }
}

/// Resolve a QR payload into an existing team.
pub(crate) async fn resolve_team(
    store: &dyn ContestStore,
    raw_team_id: &str,
) -> Result<TeamEntity, ServiceError> {
    let team_id = Uuid::parse_str(raw_team_id.trim()).map_err(|_| ServiceError::TeamNotFound)?;
    store
        .find_team(team_id)
        .await?
        .ok_or(ServiceError::TeamNotFound)
}

/// Serve `raw_team_id` a uniformly random question it has not submitted for.
///
/// Nothing is reserved: two draws may return the same unsolved question.
pub async fn draw_question(
    state: &SharedState,
    raw_team_id: &str,
) -> Result<DrawnQuestion, ServiceError> {
    let store = state.require_store().await?;
    let team = resolve_team(store.as_ref(), raw_team_id).await?;
    ensure_contest_active(store.as_ref()).await?;

    let excluded = store.submitted_question_ids(team.id).await?;
    let remaining = store.count_questions_excluding(excluded.clone()).await?;
    if remaining == 0 {
        debug!(team_id = %team.id, "team has no unsolved question left");
        return Err(ServiceError::Exhausted);
    }

    let offset = rand::rng().random_range(0..remaining);
    let question = store
        .question_at_excluding(excluded, offset)
        .await?
        .ok_or(ServiceError::Exhausted)?;

    debug!(team_id = %team.id, question_id = %question.id, remaining, "question drawn");
    with_answers(store.as_ref(), question).await
}

/// Participant view of one question, answers included.
pub async fn question_details(
    state: &SharedState,
    question_id: Uuid,
) -> Result<QuestionView, ServiceError> {
    let store = state.require_store().await?;
    let question = store
        .find_question(question_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("question `{question_id}`")))?;
    Ok(with_answers(store.as_ref(), question).await?.question)
}

async fn with_answers(
    store: &dyn ContestStore,
    question: QuestionEntity,
) -> Result<DrawnQuestion, ServiceError> {
    let answers = store.list_answers(question.id).await?;
    Ok(DrawnQuestion {
        question_id: question.id,
        question: QuestionView::new(question, answers),
    })
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc};

    use super::*;
    use crate::{
        dao::{contest_store::memory::MemoryContestStore, models::Role},
        services::lifecycle_service,
        test_support::{actor, memory_state, record_submission, seed_question, seed_team},
    };

    async fn running_state() -> (SharedState, Arc<MemoryContestStore>) {
        let (state, store) = memory_state().await;
        lifecycle_service::start(&state, &actor(Role::Admin), 1.0)
            .await
            .unwrap();
        (state, store)
    }

    #[tokio::test]
    async fn unknown_or_malformed_team_is_not_found() {
        let (state, _store) = running_state().await;
        assert!(matches!(
            draw_question(&state, "not-a-uuid").await,
            Err(ServiceError::TeamNotFound)
        ));
        assert!(matches!(
            draw_question(&state, &Uuid::new_v4().to_string()).await,
            Err(ServiceError::TeamNotFound)
        ));
    }

    #[tokio::test]
    async fn draw_requires_running_contest() {
        let (state, store) = memory_state().await;
        let team = seed_team(&store, "Otters", 0).await;
        seed_question(&store, "Q1", &[("a", true)]).await;

        assert!(matches!(
            draw_question(&state, &team.id.to_string()).await,
            Err(ServiceError::ContestNotActive)
        ));
    }

    #[tokio::test]
    async fn draw_never_serves_submitted_questions() {
        let (state, store) = running_state().await;
        let team = seed_team(&store, "Otters", 0).await;
        let (solved, solved_answers) = seed_question(&store, "Q1", &[("a", true)]).await;
        let (open, _) = seed_question(&store, "Q2", &[("b", true), ("c", false)]).await;
        record_submission(&store, team.id, solved.id, solved_answers[0].id).await;

        for _ in 0..20 {
            let drawn = draw_question(&state, &team.id.to_string()).await.unwrap();
            assert_eq!(drawn.question_id, open.id);
            assert_eq!(drawn.question.answers.len(), 2);
        }
    }

    #[tokio::test]
    async fn draw_covers_every_unsolved_question() {
        let (state, store) = running_state().await;
        let team = seed_team(&store, "Otters", 0).await;
        let mut expected = HashSet::new();
        for title in ["Q1", "Q2", "Q3"] {
            let (question, _) = seed_question(&store, title, &[("a", true)]).await;
            expected.insert(question.id);
        }

        let mut seen = HashSet::new();
        for _ in 0..200 {
            let drawn = draw_question(&state, &team.id.to_string()).await.unwrap();
            seen.insert(drawn.question_id);
        }
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn draw_reports_exhaustion() {
        let (state, store) = running_state().await;
        let team = seed_team(&store, "Otters", 0).await;
        let (question, answers) = seed_question(&store, "Q1", &[("a", false)]).await;
        record_submission(&store, team.id, question.id, answers[0].id).await;

        assert!(matches!(
            draw_question(&state, &team.id.to_string()).await,
            Err(ServiceError::Exhausted)
        ));
    }

    #[tokio::test]
    async fn question_details_hides_nothing_but_correctness() {
        let (state, store) = memory_state().await;
        let (question, _) = seed_question(&store, "Q1", &[("a", true), ("b", false)]).await;

        let view = question_details(&state, question.id).await.unwrap();
        assert_eq!(view.title, "Q1");
        assert_eq!(view.answers.len(), 2);

        assert!(matches!(
            question_details(&state, Uuid::new_v4()).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
