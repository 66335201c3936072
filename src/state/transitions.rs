use std::{future::Future, sync::Arc};

use crate::{
    dao::{contest_store::ContestStore, models::ContestEntity},
    error::ServiceError,
    services::sse_events::broadcast_status_update,
    state::{ContestEvent, LifecycleAction, SharedState},
};

/// Execute a lifecycle transition, then broadcast the updated contest record.
///
/// The broadcast is fire-and-forget: a failed delivery never rolls back the
/// persisted transition.
pub async fn run_transition_with_broadcast<F, Fut>(
    state: &SharedState,
    action: LifecycleAction,
    work: F,
) -> Result<ContestEntity, ServiceError>
where
    F: FnOnce(Arc<dyn ContestStore>) -> Fut,
    Fut: Future<Output = Result<ContestEvent, ServiceError>>,
{
    let (contest, _plan) = state.run_transition(action, work).await?;
    broadcast_status_update(state, &contest);
    Ok(contest)
}
