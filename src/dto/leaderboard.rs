use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::dao::models::StandingEntity;

/// Pagination parameters of `GET /leaderboard`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// 1-based page number (default 1).
    pub page: Option<i64>,
    /// Rows per page (default from configuration).
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub account_id: Uuid,
    pub username: String,
    pub team_id: Uuid,
    pub team_name: String,
    pub score: i32,
}

impl From<StandingEntity> for LeaderboardRow {
    fn from(value: StandingEntity) -> Self {
        Self {
            account_id: value.account_id,
            username: value.username,
            team_id: value.team_id,
            team_name: value.team_name,
            score: value.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardMeta {
    pub total_users: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub is_frozen: bool,
}

/// One page of standings, live or frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub data: Vec<LeaderboardRow>,
    pub meta: LeaderboardMeta,
}
