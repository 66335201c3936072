//! Admin-driven contest lifecycle: start, pause, resume, freeze, unfreeze, end.

use std::time::SystemTime;

use crate::{
    auth::{ADMIN_ROLES, Actor, require_role},
    dao::models::ContestEntity,
    dto::contest::ContestStatusResponse,
    error::ServiceError,
    state::{
        ContestEvent, LifecycleAction, SharedState, lifecycle::duration_from_hours,
        transitions::run_transition_with_broadcast,
    },
};

/// Start the contest for `duration_hours` (fractional hours allowed).
pub async fn start(
    state: &SharedState,
    actor: &Actor,
    duration_hours: f64,
) -> Result<ContestEntity, ServiceError> {
    require_role(actor, ADMIN_ROLES)?;
    let duration = duration_from_hours(duration_hours).ok_or_else(|| {
        ServiceError::InvalidInput(format!(
            "durationHours must be a positive number (got {duration_hours})"
        ))
    })?;

    run_transition_with_broadcast(state, LifecycleAction::Start, |_| async move {
        Ok(ContestEvent::Start { duration })
    })
    .await
}

/// Freeze the public leaderboard on the standings at this instant.
pub async fn freeze(state: &SharedState, actor: &Actor) -> Result<ContestEntity, ServiceError> {
    require_role(actor, ADMIN_ROLES)?;
    run_transition_with_broadcast(state, LifecycleAction::Freeze, |store| async move {
        let standings = store.all_standings().await?;
        Ok(ContestEvent::Freeze { standings })
    })
    .await
}

pub async fn pause(state: &SharedState, actor: &Actor) -> Result<ContestEntity, ServiceError> {
    simple_transition(state, actor, ContestEvent::Pause).await
}

pub async fn resume(state: &SharedState, actor: &Actor) -> Result<ContestEntity, ServiceError> {
    simple_transition(state, actor, ContestEvent::Resume).await
}

pub async fn unfreeze(state: &SharedState, actor: &Actor) -> Result<ContestEntity, ServiceError> {
    simple_transition(state, actor, ContestEvent::Unfreeze).await
}

pub async fn end(state: &SharedState, actor: &Actor) -> Result<ContestEntity, ServiceError> {
    simple_transition(state, actor, ContestEvent::End).await
}

async fn simple_transition(
    state: &SharedState,
    actor: &Actor,
    event: ContestEvent,
) -> Result<ContestEntity, ServiceError> {
    require_role(actor, ADMIN_ROLES)?;
    run_transition_with_broadcast(state, event.action(), |_| async move { Ok(event) }).await
}

/// Full contest record for the admin panel.
pub async fn current_contest(
    state: &SharedState,
    actor: &Actor,
) -> Result<ContestEntity, ServiceError> {
    require_role(actor, ADMIN_ROLES)?;
    let store = state.require_store().await?;
    Ok(store.load_contest().await?)
}

/// Public timing view with the server clock, used by participant countdowns.
pub async fn contest_status(state: &SharedState) -> Result<ContestStatusResponse, ServiceError> {
    let store = state.require_store().await?;
    let contest = store.load_contest().await?;
    Ok(ContestStatusResponse::new(&contest, SystemTime::now()))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        dao::{
            contest_store::ContestStore,
            models::{ContestStatus, Role},
        },
        test_support::{actor, memory_state, seed_participant, seed_team},
    };

    #[tokio::test]
    async fn non_admin_cannot_transition() {
        let (state, store) = memory_state().await;
        for role in [Role::User, Role::Operator, Role::Judge] {
            let err = start(&state, &actor(role), 2.0).await.unwrap_err();
            assert!(matches!(err, ServiceError::Forbidden(_)));
        }
        assert_eq!(
            store.load_contest().await.unwrap().status,
            ContestStatus::Pending
        );
    }

    #[tokio::test]
    async fn start_validates_duration() {
        let (state, _store) = memory_state().await;
        let admin = actor(Role::Admin);
        for hours in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                start(&state, &admin, hours).await,
                Err(ServiceError::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn start_sets_window_and_broadcasts() {
        let (state, _store) = memory_state().await;
        let mut events = state.sse().subscribe();

        let contest = start(&state, &actor(Role::Master), 1.5).await.unwrap();
        assert_eq!(contest.status, ContestStatus::Running);
        let (start_time, end_time) = (contest.start_time.unwrap(), contest.end_time.unwrap());
        assert_eq!(
            end_time.duration_since(start_time).unwrap(),
            Duration::from_secs(5400)
        );

        let event = events.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("status-update"));
    }

    #[tokio::test]
    async fn start_twice_is_invalid_transition() {
        let (state, _store) = memory_state().await;
        let admin = actor(Role::Admin);
        start(&state, &admin, 1.0).await.unwrap();
        assert!(matches!(
            start(&state, &admin, 1.0).await,
            Err(ServiceError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn freeze_snapshots_live_standings() {
        let (state, store) = memory_state().await;
        let admin = actor(Role::Admin);
        let team = seed_team(&store, "Otters", 7).await;
        seed_participant(&store, "otter_1", Some(team.id)).await;

        start(&state, &admin, 1.0).await.unwrap();
        let frozen = freeze(&state, &admin).await.unwrap();
        assert_eq!(frozen.status, ContestStatus::Frozen);
        let snapshot = frozen.frozen_leaderboard.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].score, 7);

        let thawed = unfreeze(&state, &admin).await.unwrap();
        assert_eq!(thawed.status, ContestStatus::Running);
        assert!(thawed.frozen_leaderboard.is_none());
    }

    #[tokio::test]
    async fn pause_resume_and_end() {
        let (state, _store) = memory_state().await;
        let admin = actor(Role::Admin);
        start(&state, &admin, 1.0).await.unwrap();

        let paused = pause(&state, &admin).await.unwrap();
        assert_eq!(paused.status, ContestStatus::Paused);
        assert_eq!(paused.status_before_pause, Some(ContestStatus::Running));

        let resumed = resume(&state, &admin).await.unwrap();
        assert_eq!(resumed.status, ContestStatus::Running);
        assert!(resumed.paused_time.is_none());

        let ended = end(&state, &admin).await.unwrap();
        assert_eq!(ended.status, ContestStatus::Finished);
        assert!(matches!(
            end(&state, &admin).await,
            Err(ServiceError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn status_reports_server_time() {
        let (state, _store) = memory_state().await;
        let status = contest_status(&state).await.unwrap();
        assert_eq!(status.status, ContestStatus::Pending);
        assert!(status.start_time.is_none());
        assert!(!status.server_time.is_empty());
    }
}
