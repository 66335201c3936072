//! Contest record and status payloads.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{ContestEntity, ContestStatus},
    dto::{format_system_time, leaderboard::LeaderboardRow},
};

/// Full contest record, returned by admin endpoints and `status-update` events.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContestRecord {
    pub id: Uuid,
    pub status: ContestStatus,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub paused_time: Option<String>,
    /// Accumulated pause time in seconds.
    pub total_paused_duration: u64,
    pub status_before_pause: Option<ContestStatus>,
    pub frozen_leaderboard: Option<Vec<LeaderboardRow>>,
    pub updated_at: String,
}

impl From<ContestEntity> for ContestRecord {
    fn from(value: ContestEntity) -> Self {
        Self {
            id: value.id,
            status: value.status,
            start_time: value.start_time.map(format_system_time),
            end_time: value.end_time.map(format_system_time),
            paused_time: value.paused_time.map(format_system_time),
            total_paused_duration: value.total_paused_duration,
            status_before_pause: value.status_before_pause,
            frozen_leaderboard: value
                .frozen_leaderboard
                .map(|rows| rows.into_iter().map(Into::into).collect()),
            updated_at: format_system_time(value.updated_at),
        }
    }
}

/// Public timing view used by participant clocks.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContestStatusResponse {
    pub status: ContestStatus,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub server_time: String,
}

impl ContestStatusResponse {
    pub fn new(contest: &ContestEntity, now: SystemTime) -> Self {
        Self {
            status: contest.status,
            start_time: contest.start_time.map(format_system_time),
            end_time: contest.end_time.map(format_system_time),
            server_time: format_system_time(now),
        }
    }
}

/// Body of `POST /admin/contest/start`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartContestRequest {
    /// Contest length in hours; fractions are rounded to whole seconds.
    #[validate(range(exclusive_min = 0.0))]
    pub duration_hours: f64,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn record_serializes_camel_case_and_nulls() {
        let contest = ContestEntity::pending();
        let json = serde_json::to_value(ContestRecord::from(contest)).unwrap();
        assert_eq!(json["status"], "PENDING");
        assert!(json["startTime"].is_null());
        assert!(json["frozenLeaderboard"].is_null());
        assert_eq!(json["totalPausedDuration"], 0);
    }

    #[test]
    fn status_response_includes_server_time() {
        let mut contest = ContestEntity::pending();
        contest.status = ContestStatus::Running;
        contest.start_time = Some(SystemTime::UNIX_EPOCH);
        contest.end_time = Some(SystemTime::UNIX_EPOCH + Duration::from_secs(3600));

        let response = ContestStatusResponse::new(&contest, SystemTime::UNIX_EPOCH);
        assert_eq!(response.start_time.as_deref(), Some("1970-01-01T00:00:00Z"));
        assert_eq!(response.end_time.as_deref(), Some("1970-01-01T01:00:00Z"));
        assert_eq!(response.server_time, "1970-01-01T00:00:00Z");
    }

    #[test]
    fn start_request_rejects_non_positive_duration() {
        assert!(
            StartContestRequest {
                duration_hours: 0.0
            }
            .validate()
            .is_err()
        );
        assert!(
            StartContestRequest {
                duration_hours: 1.5
            }
            .validate()
            .is_ok()
        );
    }
}
