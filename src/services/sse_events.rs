use serde::Serialize;
use tracing::warn;

use crate::{
    dao::models::ContestEntity,
    dto::{
        contest::ContestRecord,
        sse::{ServerEvent, StatusUpdateEvent, SystemStatus},
    },
    state::AppState,
};

const EVENT_STATUS_UPDATE: &str = "status-update";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast the full contest record after a lifecycle transition.
pub fn broadcast_status_update(state: &AppState, contest: &ContestEntity) {
    let payload = StatusUpdateEvent(ContestRecord::from(contest.clone()));
    send_event(state, EVENT_STATUS_UPDATE, &payload);
}

/// Broadcast that the backend entered or left degraded mode.
pub fn broadcast_system_status(state: &AppState, degraded: bool) {
    send_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_event(state: &AppState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_state;

    #[tokio::test]
    async fn status_update_carries_contest_record() {
        let (state, _store) = memory_state().await;
        let mut receiver = state.sse().subscribe();

        let contest = ContestEntity::pending();
        broadcast_status_update(&state, &contest);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("status-update"));
        let json: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["id"], contest.id.to_string());
    }

    #[tokio::test]
    async fn degraded_toggle_broadcasts_system_status() {
        let (state, _store) = memory_state().await;
        let mut receiver = state.sse().subscribe();

        state.clear_store().await;

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("system.status"));
        assert_eq!(event.data, r#"{"degraded":true}"#);
    }
}
